//! Topology Graph Reporter
//!
//! Converts a finished topology into typed nodes and relationships, the
//! shape a CMDB expects. References that do not resolve to an object of the
//! same run are omitted without error.

use crate::cim::property::normalize_wwn;
use crate::domain::ports::TopologyReporter;
use crate::domain::topology::Topology;
use crate::error::Result;
use crate::smis::links::endpoint_id;
use indexmap::{IndexMap, IndexSet};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

// =============================================================================
// Graph Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    StorageSystem,
    StorageProcessor,
    IoGroup,
    StoragePool,
    PhysicalVolume,
    LogicalVolume,
    FcPort,
    StorageFabric,
    FcSwitch,
    RemoteEndpoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    Containment,
    Membership,
    Dependency,
    Realization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// Unique within the graph
    pub key: String,
    pub kind: NodeKind,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub kind: RelationshipKind,
    pub from: String,
    pub to: String,
    /// LUN for masking dependencies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopologyGraph {
    pub namespace: String,
    pub nodes: Vec<GraphNode>,
    pub relationships: Vec<Relationship>,
}

impl TopologyGraph {
    pub fn node(&self, key: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.key == key)
    }

    pub fn relationships_of(&self, kind: RelationshipKind) -> Vec<&Relationship> {
        self.relationships.iter().filter(|r| r.kind == kind).collect()
    }

    pub fn has_relationship(&self, kind: RelationshipKind, from: &str, to: &str) -> bool {
        self.relationships
            .iter()
            .any(|r| r.kind == kind && r.from == from && r.to == to)
    }
}

// =============================================================================
// Node Keys
// =============================================================================

pub fn system_key(id: &str) -> String {
    format!("system:{}", id)
}

pub fn processor_key(id: &str) -> String {
    format!("processor:{}", id)
}

pub fn iogroup_key(id: &str) -> String {
    format!("iogroup:{}", id)
}

pub fn pool_key(id: &str) -> String {
    format!("pool:{}", id)
}

pub fn physical_volume_key(container: &str, device_id: &str) -> String {
    format!("pv:{}/{}", container, device_id)
}

pub fn logical_volume_key(container: &str, object_id: &str) -> String {
    format!("lv:{}/{}", container, object_id)
}

pub fn port_key(container: Option<&str>, id: &str) -> String {
    format!("port:{}/{}", container.unwrap_or("-"), id)
}

pub fn fabric_key(wwn: &str) -> String {
    format!("fabric:{}", wwn)
}

pub fn switch_key(wwn: &str) -> String {
    format!("switch:{}", wwn)
}

pub fn endpoint_key(wwn: &str) -> String {
    format!("endpoint:{}", wwn)
}

// =============================================================================
// Graph Builder
// =============================================================================

#[derive(Default)]
struct GraphBuilder {
    nodes: IndexMap<String, GraphNode>,
    relationships: IndexSet<Relationship>,
}

impl GraphBuilder {
    fn node(&mut self, key: String, kind: NodeKind, name: &str) {
        self.nodes.entry(key.clone()).or_insert(GraphNode {
            key,
            kind,
            name: name.to_string(),
        });
    }

    /// Add a relationship if both ends exist
    fn link(&mut self, kind: RelationshipKind, from: Option<String>, to: Option<String>, label: Option<String>) {
        let (Some(from), Some(to)) = (from, to) else {
            return;
        };
        if !self.nodes.contains_key(&from) || !self.nodes.contains_key(&to) {
            debug!("Omitting {:?} {} -> {}: unresolved end", kind, from, to);
            return;
        }
        self.relationships.insert(Relationship { kind, from, to, label });
    }

    fn key_if_present(&self, key: String) -> Option<String> {
        self.nodes.contains_key(&key).then_some(key)
    }
}

/// Builds a [`TopologyGraph`] from a topology
#[derive(Debug, Clone, Default)]
pub struct GraphReporter;

impl GraphReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, topology: &Topology) -> TopologyGraph {
        let mut g = GraphBuilder::default();

        // Nodes first, so that every relationship can check both ends
        for s in &topology.storage_systems {
            g.node(system_key(&s.id), NodeKind::StorageSystem, &s.name);
        }
        for p in &topology.storage_processors {
            g.node(processor_key(&p.id), NodeKind::StorageProcessor, &p.name);
        }
        for group in &topology.iogroups {
            g.node(iogroup_key(&group.id), NodeKind::IoGroup, &group.name);
        }
        for pool in &topology.storage_pools {
            g.node(pool_key(&pool.id), NodeKind::StoragePool, &pool.name);
        }
        for pv in &topology.physical_volumes {
            let name = pv.name.as_deref().unwrap_or(&pv.device_id);
            g.node(physical_volume_key(&pv.container_id, &pv.device_id), NodeKind::PhysicalVolume, name);
        }
        for lv in &topology.logical_volumes {
            let name = lv.name.as_deref().unwrap_or(&lv.object_id);
            g.node(logical_volume_key(&lv.container_id, &lv.object_id), NodeKind::LogicalVolume, name);
        }
        for port in &topology.ports {
            let name = port.name.as_deref().unwrap_or(&port.id);
            g.node(port_key(port.container_id.as_deref(), &port.id), NodeKind::FcPort, name);
        }
        for fabric in &topology.storage_fabrics {
            g.node(fabric_key(&fabric.wwn), NodeKind::StorageFabric, &fabric.name);
        }
        for switch in &topology.fc_switches {
            g.node(switch_key(&switch.wwn), NodeKind::FcSwitch, &switch.name);
        }
        for ep in &topology.remote_endpoints {
            let name = ep.name.as_deref().unwrap_or(&ep.wwn);
            g.node(endpoint_key(&ep.wwn), NodeKind::RemoteEndpoint, name);
        }

        // Volumes are referenced by object/device id alone
        let volumes_by_id: IndexMap<&str, String> = topology
            .logical_volumes
            .iter()
            .rev()
            .map(|lv| (lv.object_id.as_str(), logical_volume_key(&lv.container_id, &lv.object_id)))
            .collect();
        let extents_by_id: IndexMap<&str, String> = topology
            .physical_volumes
            .iter()
            .rev()
            .map(|pv| (pv.device_id.as_str(), physical_volume_key(&pv.container_id, &pv.device_id)))
            .collect();

        // Ports are referenced by WWN or id
        let mut ports_by_endpoint: IndexMap<String, String> = IndexMap::new();
        for port in &topology.ports {
            let key = port_key(port.container_id.as_deref(), &port.id);
            if let Some(wwn) = &port.wwn {
                ports_by_endpoint.entry(wwn.clone()).or_insert_with(|| key.clone());
            }
            ports_by_endpoint.entry(endpoint_id(&port.id)).or_insert(key);
        }

        // Containment
        for p in &topology.storage_processors {
            let parent = p.system_id.as_deref().map(system_key);
            g.link(RelationshipKind::Containment, parent, Some(processor_key(&p.id)), None);
        }
        for group in &topology.iogroups {
            let parent = group.parent_id.as_deref().map(system_key);
            g.link(RelationshipKind::Containment, parent, Some(iogroup_key(&group.id)), None);
        }
        for pool in &topology.storage_pools {
            let parent = pool.system_id.as_deref().map(system_key);
            g.link(RelationshipKind::Containment, parent, Some(pool_key(&pool.id)), None);
        }
        for pv in &topology.physical_volumes {
            let key = physical_volume_key(&pv.container_id, &pv.device_id);
            g.link(RelationshipKind::Containment, Some(system_key(&pv.container_id)), Some(key), None);
        }
        for lv in &topology.logical_volumes {
            let key = logical_volume_key(&lv.container_id, &lv.object_id);
            g.link(RelationshipKind::Containment, Some(system_key(&lv.container_id)), Some(key), None);
        }
        for port in &topology.ports {
            let Some(container) = port.container_id.as_deref() else {
                continue;
            };
            let key = port_key(Some(container), &port.id);
            let parent = g
                .key_if_present(system_key(container))
                .or_else(|| normalize_wwn(container).and_then(|w| g.key_if_present(switch_key(&w))));
            g.link(RelationshipKind::Containment, parent, Some(key), None);
        }

        // Membership
        for switch in &topology.fc_switches {
            let fabric = switch.fabric_wwn.as_deref().map(fabric_key);
            g.link(RelationshipKind::Membership, fabric, Some(switch_key(&switch.wwn)), None);
        }
        for group in &topology.iogroups {
            for node in &group.node_ids {
                g.link(
                    RelationshipKind::Membership,
                    Some(iogroup_key(&group.id)),
                    Some(processor_key(node)),
                    None,
                );
            }
        }
        for pool in &topology.storage_pools {
            for child in &pool.child_pool_ids {
                g.link(RelationshipKind::Membership, Some(pool_key(&pool.id)), Some(pool_key(child)), None);
            }
        }

        // Dependency
        for pool in &topology.storage_pools {
            for volume in &pool.lvm_ids {
                let from = volumes_by_id.get(volume.as_str()).cloned();
                g.link(RelationshipKind::Dependency, from, Some(pool_key(&pool.id)), None);
            }
        }
        for lv in &topology.logical_volumes {
            let from = Some(logical_volume_key(&lv.container_id, &lv.object_id));
            g.link(RelationshipKind::Dependency, from, lv.pool_id.as_deref().map(pool_key), None);
        }
        for (device_id, pool_id) in &topology.physical_volumes_2_pool_links {
            let from = extents_by_id.get(device_id.as_str()).cloned();
            g.link(RelationshipKind::Dependency, from, Some(pool_key(pool_id)), None);
        }
        for view in &topology.lun_mappings {
            let to = volumes_by_id.get(view.volume_id.as_str()).cloned();
            g.link(
                RelationshipKind::Dependency,
                Some(endpoint_key(&view.endpoint_id)),
                to,
                view.lun.clone(),
            );
        }

        // Realization
        for (endpoint, volumes) in &topology.end_point_links {
            let from = ports_by_endpoint.get(endpoint).cloned();
            for volume in volumes {
                let to = volumes_by_id.get(volume.as_str()).cloned();
                g.link(RelationshipKind::Realization, from.clone(), to, None);
            }
        }

        TopologyGraph {
            namespace: topology.namespace.clone(),
            nodes: g.nodes.into_values().collect(),
            relationships: g.relationships.into_iter().collect(),
        }
    }
}

impl TopologyReporter for GraphReporter {
    type Output = TopologyGraph;

    fn report(&self, topology: &Topology) -> Result<TopologyGraph> {
        Ok(self.build(topology))
    }
}
