//! Storage Pool Discovery

use crate::cim::property::{bytes_to_mb, property_bool, property_f64, property_str, required_str};
use crate::cim::value::CimInstance;
use crate::domain::model::StoragePool;
use crate::domain::ports::CimClient;
use crate::error::{ParseError, Result};
use crate::smis::discoverer::{parse_each, query_classes, SmisDiscoverer};
use crate::smis::links::{parents_by_child, LinkSpec, PoolMembership, PoolMembershipSpec};
use async_trait::async_trait;
use indexmap::IndexMap;

pub const POOL_TYPE_PRIMORDIAL: &str = "Primordial";
pub const POOL_TYPE_CONCRETE: &str = "Concrete";

/// Links resolved before pools are parsed
#[derive(Debug, Clone, Default)]
pub struct PoolContext {
    pub membership: PoolMembership,
    /// Pool id to hosting system id
    pub systems: IndexMap<String, String>,
}

/// Discovers pools, their nesting and their member volumes
#[derive(Debug, Clone)]
pub struct StoragePoolDiscoverer {
    pub class_names: Vec<&'static str>,
    pub membership: PoolMembershipSpec,
    /// Parent is the system, child the pool
    pub system_link: Option<LinkSpec>,
    /// Vendor property carrying capacity not yet exported to hosts
    pub unexported_property: Option<&'static str>,
}

impl Default for StoragePoolDiscoverer {
    fn default() -> Self {
        Self {
            class_names: vec!["CIM_StoragePool"],
            membership: PoolMembershipSpec::new(vec!["CIM_AllocatedFromStoragePool"]),
            system_link: Some(LinkSpec::component("CIM_HostedStoragePool", "Name", "InstanceID")),
            unexported_property: None,
        }
    }
}

impl StoragePoolDiscoverer {
    pub fn new(
        class_names: Vec<&'static str>,
        membership: PoolMembershipSpec,
        system_link: Option<LinkSpec>,
    ) -> Self {
        Self {
            class_names,
            membership,
            system_link,
            unexported_property: None,
        }
    }

    pub fn with_unexported(mut self, property: &'static str) -> Self {
        self.unexported_property = Some(property);
        self
    }

    pub async fn resolve_context(&self, client: &dyn CimClient) -> Result<PoolContext> {
        let membership = PoolMembership::collect(client, &self.membership).await?;
        let systems = match &self.system_link {
            Some(link) => parents_by_child(&link.query(client).await?),
            None => IndexMap::new(),
        };
        Ok(PoolContext { membership, systems })
    }

    pub fn parse_pool(
        &self,
        instance: &CimInstance,
        ctx: &PoolContext,
    ) -> std::result::Result<StoragePool, ParseError> {
        let id = required_str(instance, "InstanceID")?;
        let space = |name: &str| property_f64(instance, name).map(bytes_to_mb);

        let pool_type = match property_bool(instance, "Primordial") {
            Some(true) => POOL_TYPE_PRIMORDIAL,
            _ => POOL_TYPE_CONCRETE,
        };

        Ok(StoragePool {
            name: property_str(instance, "ElementName")
                .or_else(|| property_str(instance, "PoolID"))
                .unwrap_or_else(|| id.clone()),
            system_id: ctx.systems.get(&id).cloned(),
            pool_type: Some(pool_type.to_string()),
            total_space_mb: space("TotalManagedSpace"),
            available_space_mb: space("RemainingManagedSpace"),
            unexported_space_mb: self.unexported_property.and_then(space),
            parent_pool_id: ctx.membership.parent_of(&id),
            child_pool_ids: ctx.membership.children_of(&id),
            lvm_ids: ctx.membership.volumes_of(&id),
            id,
        })
    }

    pub fn parse_with(&self, instances: &[CimInstance], ctx: &PoolContext) -> Vec<StoragePool> {
        parse_each(instances, |inst| self.parse_pool(inst, ctx))
    }
}

#[async_trait]
impl SmisDiscoverer for StoragePoolDiscoverer {
    type Output = Vec<StoragePool>;

    fn class_names(&self) -> &[&'static str] {
        &self.class_names
    }

    async fn discover(&self, client: &dyn CimClient) -> Result<Vec<StoragePool>> {
        let instances = query_classes(client, &self.class_names).await?;
        let ctx = self.resolve_context(client).await?;
        Ok(self.parse_with(&instances, &ctx))
    }

    fn parse(&self, instances: &[CimInstance]) -> Vec<StoragePool> {
        self.parse_with(instances, &PoolContext::default())
    }
}
