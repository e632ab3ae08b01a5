//! HP EVA Binding

use crate::domain::model::{FcSwitch, IoGroup, StorageFabric};
use crate::domain::topology::EndPointLinks;
use crate::error::Result;
use crate::smis::cimv2::{
    FcPortDiscoverer, FreeSpace, LogicalVolumeDiscoverer, LunMaskingDiscoverer, MaskingSpec,
    PhysicalVolumeDiscoverer, PhysicalVolumeToPoolDiscoverer, RemoteEndpointDiscoverer,
    StoragePoolDiscoverer, StorageProcessorDiscoverer, StorageSystemDiscoverer,
};
use crate::smis::discoverer::NoopDiscoverer;
use crate::smis::links::{LinkSpec, PoolMembershipSpec};
use crate::smis::namespace::{SmisNamespace, Vendor};
use crate::smis::registry::DiscovererRegistry;

/// EVA port system names end in `" : <controller>"`
pub const PORT_SYSTEM_SUFFIX: &str = r"\s*:.*$";
pub const UNEXPORTED_PROPERTY: &str = "UnexportedSpace";
pub const REMAINING_PROPERTY: &str = "RemainingManagedSpace";

const POOL_LINKS: &[&str] = &["HPEVA_AllocatedFromStoragePool"];

#[derive(Debug, Clone)]
pub struct EvaNamespace {
    namespace: String,
}

impl EvaNamespace {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

impl SmisNamespace for EvaNamespace {
    fn vendor(&self) -> Vendor {
        Vendor::Eva
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn associate_discoverers(&self, registry: &mut DiscovererRegistry) -> Result<()> {
        registry.register(StorageSystemDiscoverer::new(vec!["HPEVA_StorageSystem"]))?;
        registry.register(StorageProcessorDiscoverer::new(
            vec!["HPEVA_StorageProcessorSystem"],
            LinkSpec::component("HPEVA_ComponentCS", "Name", "Name"),
        ))?;
        registry.register(
            StoragePoolDiscoverer::new(
                vec!["HPEVA_StoragePool"],
                PoolMembershipSpec::new(POOL_LINKS.to_vec()),
                Some(LinkSpec::component("HPEVA_HostedStoragePool", "Name", "InstanceID")),
            )
            .with_unexported(UNEXPORTED_PROPERTY),
        )?;
        registry.register(PhysicalVolumeDiscoverer::new(vec!["HPEVA_DiskExtent"]))?;
        registry.register(
            LogicalVolumeDiscoverer::new(
                vec!["HPEVA_StorageVolume"],
                FreeSpace::RemainingBytes(REMAINING_PROPERTY),
            )
            .with_membership(PoolMembershipSpec::new(POOL_LINKS.to_vec())),
        )?;
        registry.register(FcPortDiscoverer::new(vec!["HPEVA_FCPort"]).with_system_suffix(PORT_SYSTEM_SUFFIX)?)?;
        registry.register(NoopDiscoverer::<Vec<StorageFabric>>::new())?;
        registry.register(NoopDiscoverer::<Vec<FcSwitch>>::new())?;
        registry.register(RemoteEndpointDiscoverer::new(vec!["HPEVA_StorageHardwareID"]))?;
        registry.register(LunMaskingDiscoverer::new(MaskingSpec::new(
            "HPEVA_ProtocolControllerForUnit",
            "HPEVA_AuthorizedTarget",
            "HPEVA_AuthorizedSubject",
            "HPEVA_StorageHardwareID",
        )))?;
        registry.register(NoopDiscoverer::<EndPointLinks>::new())?;
        registry.register(PhysicalVolumeToPoolDiscoverer::new("HPEVA_ConcreteComponent"))?;
        registry.register(NoopDiscoverer::<Vec<IoGroup>>::new())?;
        Ok(())
    }
}
