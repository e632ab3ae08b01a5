//! Hitachi (HDS) Binding
//!
//! Hitachi providers publish `HITACHI_*` classes and encode model and serial
//! in the array name (`"AMS2100.83041234"`) instead of the identifying
//! side-table. Port system names carry the controller (`".CTL0"`, `".CL1-A"`).

use crate::cim::property::required_str;
use crate::cim::value::CimInstance;
use crate::domain::model::{FcSwitch, IoGroup, StorageFabric, StorageSystem};
use crate::domain::topology::EndPointLinks;
use crate::error::{ParseError, Result};
use crate::smis::cimv2::{
    FcPortDiscoverer, FreeSpace, LogicalVolumeDiscoverer, LunMaskingDiscoverer, MaskingSpec,
    PhysicalVolumeDiscoverer, PhysicalVolumeToPoolDiscoverer, RemoteEndpointDiscoverer,
    StoragePoolDiscoverer, StorageProcessorDiscoverer, StorageSystemDiscoverer,
};
use crate::smis::discoverer::{parse_each, NoopDiscoverer, SmisDiscoverer};
use crate::smis::links::{LinkSpec, PoolMembershipSpec};
use crate::smis::namespace::{SmisNamespace, Vendor};
use crate::smis::registry::DiscovererRegistry;

pub const VENDOR_NAME: &str = "Hitachi";
pub const PORT_SYSTEM_SUFFIX: &str = r"\.(CTL|CL)[0-9A-Z-]*$";

const POOL_LINKS: &[&str] = &["HITACHI_AllocatedFromStoragePool"];

// =============================================================================
// Storage System
// =============================================================================

/// Falls back to the `Model.Serial` array name when the side-table is absent
#[derive(Debug, Clone)]
pub struct HitachiSystemDiscoverer {
    base: StorageSystemDiscoverer,
}

impl Default for HitachiSystemDiscoverer {
    fn default() -> Self {
        Self {
            base: StorageSystemDiscoverer::new(vec!["HITACHI_StorageSystem"]),
        }
    }
}

impl HitachiSystemDiscoverer {
    pub fn parse_system(&self, instance: &CimInstance) -> std::result::Result<StorageSystem, ParseError> {
        let mut system = self.base.parse_system(instance)?;
        let name = required_str(instance, "Name")?;

        if let Some((model, serial)) = name.split_once('.') {
            if system.model.is_none() && !model.is_empty() {
                system.model = Some(model.to_string());
            }
            if system.serial.is_none() && !serial.is_empty() {
                system.serial = Some(serial.to_string());
            }
        }
        system.vendor.get_or_insert_with(|| VENDOR_NAME.to_string());

        Ok(system)
    }
}

impl SmisDiscoverer for HitachiSystemDiscoverer {
    type Output = Vec<StorageSystem>;

    fn class_names(&self) -> &[&'static str] {
        self.base.class_names()
    }

    fn parse(&self, instances: &[CimInstance]) -> Vec<StorageSystem> {
        parse_each(instances, |inst| self.parse_system(inst))
    }
}

// =============================================================================
// Namespace
// =============================================================================

#[derive(Debug, Clone)]
pub struct HitachiNamespace {
    namespace: String,
}

impl HitachiNamespace {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

impl SmisNamespace for HitachiNamespace {
    fn vendor(&self) -> Vendor {
        Vendor::Hitachi
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn associate_discoverers(&self, registry: &mut DiscovererRegistry) -> Result<()> {
        registry.register(HitachiSystemDiscoverer::default())?;
        registry.register(StorageProcessorDiscoverer::new(
            vec!["HITACHI_StorageProcessorSystem"],
            LinkSpec::component("HITACHI_ComponentCS", "Name", "Name"),
        ))?;
        registry.register(StoragePoolDiscoverer::new(
            vec!["HITACHI_StoragePool"],
            PoolMembershipSpec::new(POOL_LINKS.to_vec()),
            Some(LinkSpec::component("HITACHI_HostedStoragePool", "Name", "InstanceID")),
        ))?;
        registry.register(PhysicalVolumeDiscoverer::new(vec!["HITACHI_DiskExtent"]))?;
        registry.register(
            LogicalVolumeDiscoverer::new(vec!["HITACHI_StorageVolume"], FreeSpace::ConsumableBlocks)
                .with_membership(PoolMembershipSpec::new(POOL_LINKS.to_vec())),
        )?;
        registry.register(
            FcPortDiscoverer::new(vec!["HITACHI_FrontEndFCPort"]).with_system_suffix(PORT_SYSTEM_SUFFIX)?,
        )?;
        registry.register(NoopDiscoverer::<Vec<StorageFabric>>::new())?;
        registry.register(NoopDiscoverer::<Vec<FcSwitch>>::new())?;
        registry.register(RemoteEndpointDiscoverer::new(vec!["HITACHI_StorageHardwareID"]))?;
        registry.register(LunMaskingDiscoverer::new(MaskingSpec::new(
            "HITACHI_ProtocolControllerForUnit",
            "HITACHI_AuthorizedTarget",
            "HITACHI_AuthorizedSubject",
            "HITACHI_StorageHardwareID",
        )))?;
        registry.register(NoopDiscoverer::<EndPointLinks>::new())?;
        registry.register(PhysicalVolumeToPoolDiscoverer::new("HITACHI_ConcreteComponent"))?;
        registry.register(NoopDiscoverer::<Vec<IoGroup>>::new())?;
        Ok(())
    }
}
