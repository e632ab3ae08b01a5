//! HP 3PAR (TPD) Binding
//!
//! Controllers are `TPD_NodeSystem` instances tied to the array through
//! `TPD_NodeComponentCS`. Pools are split across dynamic and delta-replica
//! classes, and volume usage is reported as provisioned blocks.

use crate::domain::model::{FcSwitch, IoGroup, StorageFabric};
use crate::error::Result;
use crate::smis::cimv2::{
    EndPointToVolumeDiscoverer, FcPortDiscoverer, FreeSpace, LogicalVolumeDiscoverer,
    LunMaskingDiscoverer, MaskingSpec, PhysicalVolumeDiscoverer, PhysicalVolumeToPoolDiscoverer,
    RemoteEndpointDiscoverer, StoragePoolDiscoverer, StorageProcessorDiscoverer,
    StorageSystemDiscoverer,
};
use crate::smis::discoverer::NoopDiscoverer;
use crate::smis::links::{LinkSpec, PoolMembershipSpec};
use crate::smis::namespace::{SmisNamespace, Vendor};
use crate::smis::registry::DiscovererRegistry;

pub const PORT_SYSTEM_SUFFIX: &str = r"-?node\d+$";
pub const USED_BLOCKS_PROPERTY: &str = "ProvisionedConsumableBlocks";

const POOL_CLASSES: &[&str] = &["TPD_DynamicStoragePool", "TPD_DeltaReplicaStoragePool"];
const POOL_LINKS: &[&str] = &["TPD_AllocatedFromStoragePool"];

#[derive(Debug, Clone)]
pub struct TpdNamespace {
    namespace: String,
}

impl TpdNamespace {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

impl SmisNamespace for TpdNamespace {
    fn vendor(&self) -> Vendor {
        Vendor::Tpd
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn associate_discoverers(&self, registry: &mut DiscovererRegistry) -> Result<()> {
        registry.register(StorageSystemDiscoverer::new(vec!["TPD_StorageSystem"]))?;
        registry.register(StorageProcessorDiscoverer::new(
            vec!["TPD_NodeSystem"],
            LinkSpec::component("TPD_NodeComponentCS", "Name", "Name"),
        ))?;
        registry.register(StoragePoolDiscoverer::new(
            POOL_CLASSES.to_vec(),
            PoolMembershipSpec::new(POOL_LINKS.to_vec()),
            Some(LinkSpec::component("TPD_HostedStoragePool", "Name", "InstanceID")),
        ))?;
        registry.register(PhysicalVolumeDiscoverer::new(vec!["TPD_DiskStorageExtent"]))?;
        registry.register(
            LogicalVolumeDiscoverer::new(
                vec!["TPD_StorageVolume"],
                FreeSpace::SizeMinusUsed(USED_BLOCKS_PROPERTY),
            )
            .with_membership(PoolMembershipSpec::new(POOL_LINKS.to_vec())),
        )?;
        registry.register(FcPortDiscoverer::new(vec!["TPD_FCPort"]).with_system_suffix(PORT_SYSTEM_SUFFIX)?)?;
        registry.register(NoopDiscoverer::<Vec<StorageFabric>>::new())?;
        registry.register(NoopDiscoverer::<Vec<FcSwitch>>::new())?;
        registry.register(RemoteEndpointDiscoverer::new(vec!["TPD_StorageHardwareID"]))?;
        registry.register(LunMaskingDiscoverer::new(MaskingSpec::new(
            "TPD_ProtocolControllerForUnit",
            "TPD_AuthorizedTarget",
            "TPD_AuthorizedSubject",
            "TPD_StorageHardwareID",
        )))?;
        registry.register(EndPointToVolumeDiscoverer::new("TPD_SAPAvailableForElement"))?;
        registry.register(PhysicalVolumeToPoolDiscoverer::new("TPD_ConcreteComponent"))?;
        registry.register(NoopDiscoverer::<Vec<IoGroup>>::new())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cim::snapshot::SnapshotClient;
    use crate::cim::value::{CimInstance, ObjectPath};
    use crate::smis::registry::{discover_topology, RegistryConfig};

    fn tpd_client() -> SnapshotClient {
        SnapshotClient::new("root/tpd")
            .missing_as_empty()
            .with_class(
                "TPD_DynamicStoragePool",
                vec![CimInstance::new("TPD_DynamicStoragePool").with("InstanceID", "TPD-CPG-1")],
            )
            .with_class(
                "TPD_DeltaReplicaStoragePool",
                vec![CimInstance::new("TPD_DeltaReplicaStoragePool").with("InstanceID", "TPD-SNAP-1")],
            )
            .with_class(
                "TPD_StorageVolume",
                vec![CimInstance::new("TPD_StorageVolume")
                    .with("DeviceID", "vv01")
                    .with("SystemName", "S1234")
                    .with("BlockSize", 512u64)
                    .with("NumberOfBlocks", 8192u64)
                    .with(USED_BLOCKS_PROPERTY, 2048u64)],
            )
            .with_class(
                "TPD_NodeSystem",
                vec![CimInstance::new("TPD_NodeSystem").with("Name", "S1234-node0")],
            )
            .with_class(
                "TPD_NodeComponentCS",
                vec![CimInstance::new("TPD_NodeComponentCS")
                    .with("GroupComponent", ObjectPath::new("TPD_StorageSystem").with_key("Name", "S1234"))
                    .with("PartComponent", ObjectPath::new("TPD_NodeSystem").with_key("Name", "S1234-node0"))],
            )
    }

    #[tokio::test]
    async fn test_tpd_pools_span_both_classes() {
        let namespace = TpdNamespace::new("root/tpd");
        let (topology, _) = discover_topology(&namespace, &tpd_client(), RegistryConfig::default())
            .await
            .unwrap();

        let ids: Vec<_> = topology.storage_pools.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["TPD-CPG-1", "TPD-SNAP-1"]);
    }

    #[tokio::test]
    async fn test_tpd_volume_free_space_and_node_parent() {
        let namespace = TpdNamespace::new("root/tpd");
        let (topology, _) = discover_topology(&namespace, &tpd_client(), RegistryConfig::default())
            .await
            .unwrap();

        let volume = &topology.logical_volumes[0];
        assert_eq!(volume.size_mb, Some(4.0));
        assert_eq!(volume.used_space_mb, Some(1.0));
        assert_eq!(volume.free_space_mb, Some(3.0));

        assert_eq!(topology.storage_processors[0].system_id.as_deref(), Some("S1234"));
    }
}
