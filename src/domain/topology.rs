//! Topology Aggregate
//!
//! The in-memory result of one discovery run. A topology is created fresh per
//! invocation, written once per field by the discoverer registry, handed to a
//! reporter and then dropped.

use crate::domain::model::*;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Endpoint id to the logical volume ids reachable through it
pub type EndPointLinks = IndexMap<String, Vec<String>>;

/// Physical volume device id to the owning pool id
pub type PhysicalVolumePoolLinks = IndexMap<String, String>;

// =============================================================================
// Topology Fields
// =============================================================================

/// Addressable fields of the topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TopologyField {
    StorageSystems,
    StorageProcessors,
    StoragePools,
    PhysicalVolumes,
    LogicalVolumes,
    Ports,
    StorageFabrics,
    FcSwitches,
    RemoteEndpoints,
    LunMappings,
    EndPointLinks,
    PhysicalVolumes2PoolLinks,
    IoGroups,
}

impl std::fmt::Display for TopologyField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TopologyField::StorageSystems => "storage_systems",
            TopologyField::StorageProcessors => "storage_processors",
            TopologyField::StoragePools => "storage_pools",
            TopologyField::PhysicalVolumes => "physical_volumes",
            TopologyField::LogicalVolumes => "logical_volumes",
            TopologyField::Ports => "ports",
            TopologyField::StorageFabrics => "storage_fabrics",
            TopologyField::FcSwitches => "fc_switches",
            TopologyField::RemoteEndpoints => "remote_endpoints",
            TopologyField::LunMappings => "lun_mappings",
            TopologyField::EndPointLinks => "end_point_links",
            TopologyField::PhysicalVolumes2PoolLinks => "physical_volumes_2_pool_links",
            TopologyField::IoGroups => "iogroups",
        };
        write!(f, "{}", name)
    }
}

// =============================================================================
// Topology
// =============================================================================

/// Canonical, vendor-neutral discovery result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Topology {
    /// CIM namespace the topology was discovered from
    pub namespace: String,
    pub discovered_at: Option<DateTime<Utc>>,

    pub storage_systems: Vec<StorageSystem>,
    pub storage_processors: Vec<StorageProcessor>,
    pub storage_pools: Vec<StoragePool>,
    pub physical_volumes: Vec<PhysicalVolume>,
    pub logical_volumes: Vec<LogicalVolume>,
    pub ports: Vec<FcPort>,
    pub storage_fabrics: Vec<StorageFabric>,
    pub fc_switches: Vec<FcSwitch>,
    pub remote_endpoints: Vec<RemoteEndPoint>,
    pub lun_mappings: Vec<LunMaskingMappingView>,
    pub end_point_links: EndPointLinks,
    #[serde(alias = "physcial_volumes_2_pool_links")]
    pub physical_volumes_2_pool_links: PhysicalVolumePoolLinks,
    pub iogroups: Vec<IoGroup>,
}

impl Topology {
    /// Create an empty topology for one discovery run
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            discovered_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Write a discovered field value into its slot
    pub fn apply(&mut self, value: FieldValue) {
        match value {
            FieldValue::StorageSystems(v) => self.storage_systems = v,
            FieldValue::StorageProcessors(v) => self.storage_processors = v,
            FieldValue::StoragePools(v) => self.storage_pools = v,
            FieldValue::PhysicalVolumes(v) => self.physical_volumes = v,
            FieldValue::LogicalVolumes(v) => self.logical_volumes = v,
            FieldValue::Ports(v) => self.ports = v,
            FieldValue::StorageFabrics(v) => self.storage_fabrics = v,
            FieldValue::FcSwitches(v) => self.fc_switches = v,
            FieldValue::RemoteEndpoints(v) => self.remote_endpoints = v,
            FieldValue::LunMappings(v) => self.lun_mappings = v,
            FieldValue::EndPointLinks(v) => self.end_point_links = v,
            FieldValue::PhysicalVolumes2PoolLinks(v) => self.physical_volumes_2_pool_links = v,
            FieldValue::IoGroups(v) => self.iogroups = v,
        }
    }

    /// Number of entries held by a field
    pub fn field_len(&self, field: TopologyField) -> usize {
        match field {
            TopologyField::StorageSystems => self.storage_systems.len(),
            TopologyField::StorageProcessors => self.storage_processors.len(),
            TopologyField::StoragePools => self.storage_pools.len(),
            TopologyField::PhysicalVolumes => self.physical_volumes.len(),
            TopologyField::LogicalVolumes => self.logical_volumes.len(),
            TopologyField::Ports => self.ports.len(),
            TopologyField::StorageFabrics => self.storage_fabrics.len(),
            TopologyField::FcSwitches => self.fc_switches.len(),
            TopologyField::RemoteEndpoints => self.remote_endpoints.len(),
            TopologyField::LunMappings => self.lun_mappings.len(),
            TopologyField::EndPointLinks => self.end_point_links.len(),
            TopologyField::PhysicalVolumes2PoolLinks => self.physical_volumes_2_pool_links.len(),
            TopologyField::IoGroups => self.iogroups.len(),
        }
    }

    /// True when no field holds anything
    pub fn is_empty(&self) -> bool {
        FieldValue::ALL_FIELDS
            .iter()
            .all(|field| self.field_len(*field) == 0)
    }
}

// =============================================================================
// Field Values
// =============================================================================

/// A discovered value tagged with the field it belongs to
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    StorageSystems(Vec<StorageSystem>),
    StorageProcessors(Vec<StorageProcessor>),
    StoragePools(Vec<StoragePool>),
    PhysicalVolumes(Vec<PhysicalVolume>),
    LogicalVolumes(Vec<LogicalVolume>),
    Ports(Vec<FcPort>),
    StorageFabrics(Vec<StorageFabric>),
    FcSwitches(Vec<FcSwitch>),
    RemoteEndpoints(Vec<RemoteEndPoint>),
    LunMappings(Vec<LunMaskingMappingView>),
    EndPointLinks(EndPointLinks),
    PhysicalVolumes2PoolLinks(PhysicalVolumePoolLinks),
    IoGroups(Vec<IoGroup>),
}

impl FieldValue {
    pub const ALL_FIELDS: [TopologyField; 13] = [
        TopologyField::StorageSystems,
        TopologyField::StorageProcessors,
        TopologyField::StoragePools,
        TopologyField::PhysicalVolumes,
        TopologyField::LogicalVolumes,
        TopologyField::Ports,
        TopologyField::StorageFabrics,
        TopologyField::FcSwitches,
        TopologyField::RemoteEndpoints,
        TopologyField::LunMappings,
        TopologyField::EndPointLinks,
        TopologyField::PhysicalVolumes2PoolLinks,
        TopologyField::IoGroups,
    ];

    pub fn field(&self) -> TopologyField {
        match self {
            FieldValue::StorageSystems(_) => TopologyField::StorageSystems,
            FieldValue::StorageProcessors(_) => TopologyField::StorageProcessors,
            FieldValue::StoragePools(_) => TopologyField::StoragePools,
            FieldValue::PhysicalVolumes(_) => TopologyField::PhysicalVolumes,
            FieldValue::LogicalVolumes(_) => TopologyField::LogicalVolumes,
            FieldValue::Ports(_) => TopologyField::Ports,
            FieldValue::StorageFabrics(_) => TopologyField::StorageFabrics,
            FieldValue::FcSwitches(_) => TopologyField::FcSwitches,
            FieldValue::RemoteEndpoints(_) => TopologyField::RemoteEndpoints,
            FieldValue::LunMappings(_) => TopologyField::LunMappings,
            FieldValue::EndPointLinks(_) => TopologyField::EndPointLinks,
            FieldValue::PhysicalVolumes2PoolLinks(_) => TopologyField::PhysicalVolumes2PoolLinks,
            FieldValue::IoGroups(_) => TopologyField::IoGroups,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FieldValue::StorageSystems(v) => v.len(),
            FieldValue::StorageProcessors(v) => v.len(),
            FieldValue::StoragePools(v) => v.len(),
            FieldValue::PhysicalVolumes(v) => v.len(),
            FieldValue::LogicalVolumes(v) => v.len(),
            FieldValue::Ports(v) => v.len(),
            FieldValue::StorageFabrics(v) => v.len(),
            FieldValue::FcSwitches(v) => v.len(),
            FieldValue::RemoteEndpoints(v) => v.len(),
            FieldValue::LunMappings(v) => v.len(),
            FieldValue::EndPointLinks(v) => v.len(),
            FieldValue::PhysicalVolumes2PoolLinks(v) => v.len(),
            FieldValue::IoGroups(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Topology Slots
// =============================================================================

/// A discoverer output type that owns exactly one topology field
pub trait TopologySlot: Default + Send + 'static {
    const FIELD: TopologyField;

    fn into_value(self) -> FieldValue;
}

macro_rules! topology_slot {
    ($ty:ty, $variant:ident) => {
        impl TopologySlot for $ty {
            const FIELD: TopologyField = TopologyField::$variant;

            fn into_value(self) -> FieldValue {
                FieldValue::$variant(self)
            }
        }
    };
}

topology_slot!(Vec<StorageSystem>, StorageSystems);
topology_slot!(Vec<StorageProcessor>, StorageProcessors);
topology_slot!(Vec<StoragePool>, StoragePools);
topology_slot!(Vec<PhysicalVolume>, PhysicalVolumes);
topology_slot!(Vec<LogicalVolume>, LogicalVolumes);
topology_slot!(Vec<FcPort>, Ports);
topology_slot!(Vec<StorageFabric>, StorageFabrics);
topology_slot!(Vec<FcSwitch>, FcSwitches);
topology_slot!(Vec<RemoteEndPoint>, RemoteEndpoints);
topology_slot!(Vec<LunMaskingMappingView>, LunMappings);
topology_slot!(EndPointLinks, EndPointLinks);
topology_slot!(PhysicalVolumePoolLinks, PhysicalVolumes2PoolLinks);
topology_slot!(Vec<IoGroup>, IoGroups);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_topology_is_empty() {
        let topology = Topology::new("root/cimv2");
        assert!(topology.is_empty());
        assert!(topology.discovered_at.is_some());
        assert_eq!(topology.namespace, "root/cimv2");
    }

    #[test]
    fn test_apply_writes_matching_field() {
        let mut topology = Topology::new("root/tpd");
        let fabrics = vec![StorageFabric {
            name: "fab-a".into(),
            wwn: "100000051E0F1A2B".into(),
        }];

        let value = fabrics.clone().into_value();
        assert_eq!(value.field(), TopologyField::StorageFabrics);
        topology.apply(value);

        assert_eq!(topology.storage_fabrics, fabrics);
        assert_eq!(topology.field_len(TopologyField::StorageFabrics), 1);
        assert!(!topology.is_empty());
    }

    #[test]
    fn test_field_display_matches_serialized_names() {
        let topology = Topology::new("root/ibm");
        let json = serde_json::to_value(&topology).unwrap();

        for field in FieldValue::ALL_FIELDS {
            assert!(
                json.get(field.to_string()).is_some(),
                "missing serialized field {}",
                field
            );
        }
    }

    #[test]
    fn test_legacy_link_field_name_accepted() {
        let json = r#"{"namespace": "root/eva", "physcial_volumes_2_pool_links": {"D1": "P1"}}"#;
        let topology: Topology = serde_json::from_str(json).unwrap();
        assert_eq!(topology.physical_volumes_2_pool_links.get("D1"), Some(&"P1".to_string()));
    }
}
