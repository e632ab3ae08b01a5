//! Brocade Fabric Binding
//!
//! A Brocade provider describes the SAN rather than an array: fabrics,
//! switches and switch ports. Every array profile area is a no-op.

use crate::cim::property::{
    first_property_str, identifying_info, instance_status, normalize_wwn, property_str, required_str,
};
use crate::cim::value::CimInstance;
use crate::domain::model::{
    FcSwitch, IoGroup, LogicalVolume, LunMaskingMappingView, PhysicalVolume, RemoteEndPoint,
    StoragePool, StorageProcessor, StorageSystem,
};
use crate::domain::ports::CimClient;
use crate::domain::topology::{EndPointLinks, PhysicalVolumePoolLinks};
use crate::error::{ParseError, Result};
use crate::smis::cimv2::{FcPortDiscoverer, StorageFabricDiscoverer, LABEL_IPV4};
use crate::smis::discoverer::{parse_each, query_classes, NoopDiscoverer, SmisDiscoverer};
use crate::smis::links::{endpoint_id, parents_by_child, LinkSpec};
use crate::smis::namespace::{SmisNamespace, Vendor};
use crate::smis::registry::DiscovererRegistry;
use async_trait::async_trait;
use indexmap::IndexMap;

pub const VENDOR_NAME: &str = "Brocade";

// =============================================================================
// Switches
// =============================================================================

#[derive(Debug, Clone)]
pub struct FcSwitchDiscoverer {
    pub class_names: Vec<&'static str>,
    /// Parent is the fabric, child the switch
    pub fabric_link: LinkSpec,
}

impl Default for FcSwitchDiscoverer {
    fn default() -> Self {
        Self {
            class_names: vec!["Brcd_Switch"],
            fabric_link: LinkSpec::component("Brcd_SwitchInFabric", "Name", "Name"),
        }
    }
}

impl FcSwitchDiscoverer {
    /// Switch to fabric, keyed by normalized switch WWN
    pub fn fabric_index(pairs: &[(String, String)]) -> IndexMap<String, String> {
        parents_by_child(pairs)
            .into_iter()
            .map(|(switch, fabric)| (endpoint_id(&switch), fabric))
            .collect()
    }

    /// `fabrics` is built by [`Self::fabric_index`]
    pub fn parse_switch(
        &self,
        instance: &CimInstance,
        fabrics: &IndexMap<String, String>,
    ) -> std::result::Result<FcSwitch, ParseError> {
        let name = required_str(instance, "Name")?;
        let wwn = normalize_wwn(&name).ok_or_else(|| ParseError::EmptyIdentity("Name".into()))?;

        Ok(FcSwitch {
            name: property_str(instance, "ElementName").unwrap_or_else(|| wwn.clone()),
            ip: property_str(instance, "IPAddress").or_else(|| identifying_info(instance, LABEL_IPV4)),
            vendor: property_str(instance, "Vendor").or_else(|| Some(VENDOR_NAME.to_string())),
            model: property_str(instance, "Model"),
            serial: property_str(instance, "SerialNumber"),
            os_version: first_property_str(instance, &["FirmwareVersion", "VersionString"]),
            status: instance_status(instance),
            fabric_wwn: fabrics.get(&wwn).and_then(|f| normalize_wwn(f)),
            wwn,
        })
    }
}

#[async_trait]
impl SmisDiscoverer for FcSwitchDiscoverer {
    type Output = Vec<FcSwitch>;

    fn class_names(&self) -> &[&'static str] {
        &self.class_names
    }

    async fn discover(&self, client: &dyn CimClient) -> Result<Vec<FcSwitch>> {
        let instances = query_classes(client, &self.class_names).await?;
        let fabrics = Self::fabric_index(&self.fabric_link.query(client).await?);
        Ok(parse_each(&instances, |inst| self.parse_switch(inst, &fabrics)))
    }

    fn parse(&self, instances: &[CimInstance]) -> Vec<FcSwitch> {
        let fabrics = IndexMap::new();
        parse_each(instances, |inst| self.parse_switch(inst, &fabrics))
    }
}

// =============================================================================
// Namespace
// =============================================================================

#[derive(Debug, Clone)]
pub struct BrocadeNamespace {
    namespace: String,
}

impl BrocadeNamespace {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

impl SmisNamespace for BrocadeNamespace {
    fn vendor(&self) -> Vendor {
        Vendor::Brocade
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn associate_discoverers(&self, registry: &mut DiscovererRegistry) -> Result<()> {
        registry.register(NoopDiscoverer::<Vec<StorageSystem>>::new())?;
        registry.register(NoopDiscoverer::<Vec<StorageProcessor>>::new())?;
        registry.register(NoopDiscoverer::<Vec<StoragePool>>::new())?;
        registry.register(NoopDiscoverer::<Vec<PhysicalVolume>>::new())?;
        registry.register(NoopDiscoverer::<Vec<LogicalVolume>>::new())?;
        registry.register(FcPortDiscoverer::new(vec!["Brcd_FCPort"]))?;
        registry.register(StorageFabricDiscoverer::new(vec!["Brcd_Fabric"]))?;
        registry.register(FcSwitchDiscoverer::default())?;
        registry.register(NoopDiscoverer::<Vec<RemoteEndPoint>>::new())?;
        registry.register(NoopDiscoverer::<Vec<LunMaskingMappingView>>::new())?;
        registry.register(NoopDiscoverer::<EndPointLinks>::new())?;
        registry.register(NoopDiscoverer::<PhysicalVolumePoolLinks>::new())?;
        registry.register(NoopDiscoverer::<Vec<IoGroup>>::new())?;
        Ok(())
    }
}
