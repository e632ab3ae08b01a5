//! Relationship Resolution
//!
//! SMI-S models parent/child relationships as separate association classes
//! whose two reference properties point at the related instances. These
//! helpers read such link classes into id maps. A link whose key cannot be
//! resolved on either side is dropped, never fatal.

use crate::cim::property::normalize_wwn;
use crate::cim::value::CimInstance;
use crate::domain::ports::CimClient;
use crate::error::Result;
use crate::smis::discoverer::query_optional;
use indexmap::IndexMap;
use tracing::debug;

// =============================================================================
// Link Specification
// =============================================================================

/// How to read one association class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSpec {
    pub class_name: &'static str,
    /// Reference property pointing at the parent
    pub parent_role: &'static str,
    /// Key of the parent object path used as its id
    pub parent_key: &'static str,
    /// Reference property pointing at the child
    pub child_role: &'static str,
    /// Key of the child object path used as its id
    pub child_key: &'static str,
}

impl LinkSpec {
    pub const fn new(
        class_name: &'static str,
        parent_role: &'static str,
        parent_key: &'static str,
        child_role: &'static str,
        child_key: &'static str,
    ) -> Self {
        Self {
            class_name,
            parent_role,
            parent_key,
            child_role,
            child_key,
        }
    }

    /// `CIM_Component`-style link: GroupComponent owns PartComponent
    pub const fn component(
        class_name: &'static str,
        parent_key: &'static str,
        child_key: &'static str,
    ) -> Self {
        Self::new(class_name, "GroupComponent", parent_key, "PartComponent", child_key)
    }

    /// `CIM_Dependency`-style link: Antecedent supports Dependent
    pub const fn dependency(
        class_name: &'static str,
        parent_key: &'static str,
        child_key: &'static str,
    ) -> Self {
        Self::new(class_name, "Antecedent", parent_key, "Dependent", child_key)
    }

    /// Resolve `(parent id, child id)` from one link instance
    pub fn endpoints(&self, instance: &CimInstance) -> Option<(String, String)> {
        let parent = instance.reference_key(self.parent_role, self.parent_key);
        let child = instance.reference_key(self.child_role, self.child_key);

        match (parent, child) {
            (Some(p), Some(c)) => Some((p, c)),
            _ => {
                debug!(
                    "Dropping unresolvable {} link ({} / {})",
                    self.class_name, self.parent_role, self.child_role
                );
                None
            }
        }
    }

    /// Query the link class; provider gaps yield no pairs
    pub async fn query(&self, client: &dyn CimClient) -> Result<Vec<(String, String)>> {
        let instances = query_optional(client, self.class_name).await?;
        Ok(self.pairs(&instances))
    }

    pub fn pairs(&self, instances: &[CimInstance]) -> Vec<(String, String)> {
        instances.iter().filter_map(|i| self.endpoints(i)).collect()
    }
}

// =============================================================================
// Map Builders
// =============================================================================

/// Child id to parent id; the first parent seen for a child wins
pub fn parents_by_child(pairs: &[(String, String)]) -> IndexMap<String, String> {
    let mut map = IndexMap::new();
    for (parent, child) in pairs {
        map.entry(child.clone()).or_insert_with(|| parent.clone());
    }
    map
}

/// Parent id to its children in enumeration order, without duplicates
pub fn children_by_parent(pairs: &[(String, String)]) -> IndexMap<String, Vec<String>> {
    let mut map: IndexMap<String, Vec<String>> = IndexMap::new();
    for (parent, child) in pairs {
        let children = map.entry(parent.clone()).or_default();
        if !children.contains(child) {
            children.push(child.clone());
        }
    }
    map
}

/// Canonical form of an endpoint id: a normalized WWN when it is one
pub fn endpoint_id(raw: &str) -> String {
    normalize_wwn(raw).unwrap_or_else(|| raw.trim().to_string())
}

// =============================================================================
// Pool Membership
// =============================================================================

/// Link classes describing what a pool is allocated to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolMembershipSpec {
    /// Classes whose Antecedent is a pool; the Dependent is a child pool or
    /// a volume
    pub link_classes: Vec<&'static str>,
    pub pool_key: &'static str,
    pub volume_key: &'static str,
}

impl PoolMembershipSpec {
    pub fn new(link_classes: Vec<&'static str>) -> Self {
        Self {
            link_classes,
            pool_key: "InstanceID",
            volume_key: "DeviceID",
        }
    }
}

/// Nested pool hierarchy and pool/volume membership
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolMembership {
    pub child_pools: IndexMap<String, Vec<String>>,
    pub volumes: IndexMap<String, Vec<String>>,
    /// Child pool to its first listed parent
    parent_by_pool: IndexMap<String, String>,
    /// Volume to its first listed pool
    pool_by_volume: IndexMap<String, String>,
}

impl PoolMembership {
    /// Query every membership class and fold them into one view
    pub async fn collect(client: &dyn CimClient, spec: &PoolMembershipSpec) -> Result<Self> {
        let mut instances = Vec::new();
        for class_name in &spec.link_classes {
            instances.extend(query_optional(client, class_name).await?);
        }
        Ok(Self::from_instances(&instances, spec))
    }

    /// Walk link instances; the Dependent's class decides pool vs volume
    pub fn from_instances(instances: &[CimInstance], spec: &PoolMembershipSpec) -> Self {
        let mut pool_pairs = Vec::new();
        let mut volume_pairs = Vec::new();

        for instance in instances {
            let Some(dependent) = instance.reference("Dependent") else {
                debug!("Dropping {} link without Dependent", instance.class_name);
                continue;
            };
            let Some(pool) = instance.reference_key("Antecedent", spec.pool_key) else {
                debug!("Dropping {} link without Antecedent pool", instance.class_name);
                continue;
            };

            if dependent.class_contains("Pool") {
                if let Some(child) = dependent.key_value(spec.pool_key) {
                    pool_pairs.push((pool, child));
                }
            } else if let Some(volume) = dependent.key_value(spec.volume_key) {
                volume_pairs.push((pool, volume));
            }
        }

        let child_pools = children_by_parent(&pool_pairs);
        let volumes = children_by_parent(&volume_pairs);
        Self {
            parent_by_pool: invert(&child_pools),
            pool_by_volume: invert(&volumes),
            child_pools,
            volumes,
        }
    }

    pub fn children_of(&self, pool_id: &str) -> Vec<String> {
        self.child_pools.get(pool_id).cloned().unwrap_or_default()
    }

    pub fn volumes_of(&self, pool_id: &str) -> Vec<String> {
        self.volumes.get(pool_id).cloned().unwrap_or_default()
    }

    pub fn parent_of(&self, pool_id: &str) -> Option<String> {
        self.parent_by_pool.get(pool_id).cloned()
    }

    pub fn pool_of_volume(&self, volume_id: &str) -> Option<String> {
        self.pool_by_volume.get(volume_id).cloned()
    }
}

/// Child to parent, keeping the first parent in map order
fn invert(children: &IndexMap<String, Vec<String>>) -> IndexMap<String, String> {
    let mut inverse = IndexMap::new();
    for (parent, kids) in children {
        for kid in kids {
            inverse.entry(kid.clone()).or_insert_with(|| parent.clone());
        }
    }
    inverse
}
