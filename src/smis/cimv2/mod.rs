//! Generic SMI-S Discoverers
//!
//! Implementations against the standard `CIM_*` classes. Every vendor
//! binding is built from these, overriding class names, relationship classes
//! or the parse step where its provider deviates.

pub mod associations;
pub mod endpoint;
pub mod fabric;
pub mod masking;
pub mod pool;
pub mod port;
pub mod system;
pub mod volume;

pub use associations::*;
pub use endpoint::*;
pub use fabric::*;
pub use masking::*;
pub use pool::*;
pub use port::*;
pub use system::*;
pub use volume::*;

use crate::domain::model::{FcSwitch, IoGroup};
use crate::error::Result;
use crate::smis::discoverer::NoopDiscoverer;
use crate::smis::namespace::{SmisNamespace, Vendor};
use crate::smis::registry::DiscovererRegistry;

/// Standard `root/cimv2` profile
#[derive(Debug, Clone)]
pub struct Cimv2Namespace {
    namespace: String,
}

impl Cimv2Namespace {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

impl Default for Cimv2Namespace {
    fn default() -> Self {
        Self::new(Vendor::Cimv2.default_namespace())
    }
}

impl SmisNamespace for Cimv2Namespace {
    fn vendor(&self) -> Vendor {
        Vendor::Cimv2
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn associate_discoverers(&self, registry: &mut DiscovererRegistry) -> Result<()> {
        registry.register(StorageSystemDiscoverer::default())?;
        registry.register(StorageProcessorDiscoverer::default())?;
        registry.register(StoragePoolDiscoverer::default())?;
        registry.register(PhysicalVolumeDiscoverer::default())?;
        registry.register(LogicalVolumeDiscoverer::default())?;
        registry.register(FcPortDiscoverer::default())?;
        registry.register(StorageFabricDiscoverer::default())?;
        registry.register(NoopDiscoverer::<Vec<FcSwitch>>::new())?;
        registry.register(RemoteEndpointDiscoverer::default())?;
        registry.register(LunMaskingDiscoverer::default())?;
        registry.register(EndPointToVolumeDiscoverer::default())?;
        registry.register(PhysicalVolumeToPoolDiscoverer::default())?;
        registry.register(NoopDiscoverer::<Vec<IoGroup>>::new())?;
        Ok(())
    }
}
