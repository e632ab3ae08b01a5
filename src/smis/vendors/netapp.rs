//! NetApp E-Series (LSI SSI) Binding
//!
//! The LSI provider labels its identifying side-table differently from the
//! standard profile (`"IP Address"`, `"Serial Number"`).

use crate::cim::property::identifying_info;
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

pub const VENDOR_NAME: &str = "NetApp";
pub const LABEL_IP: &str = "IP Address";
pub const LABEL_SERIAL: &str = "Serial Number";

const POOL_LINKS: &[&str] = &["LSISSI_AllocatedFromStoragePool"];
const HARDWARE_ID_CLASS: &str = "LSISSI_StorageHardwareID";

#[derive(Debug, Clone)]
pub struct NetAppSystemDiscoverer {
    base: StorageSystemDiscoverer,
}

impl Default for NetAppSystemDiscoverer {
    fn default() -> Self {
        Self {
            base: StorageSystemDiscoverer::new(vec!["LSISSI_StorageSystem"]),
        }
    }
}

impl NetAppSystemDiscoverer {
    pub fn parse_system(&self, instance: &CimInstance) -> std::result::Result<StorageSystem, ParseError> {
        let mut system = self.base.parse_system(instance)?;

        if system.ip.is_none() {
            system.ip = identifying_info(instance, LABEL_IP);
        }
        if system.serial.is_none() {
            system.serial = identifying_info(instance, LABEL_SERIAL);
        }
        system.vendor.get_or_insert_with(|| VENDOR_NAME.to_string());

        Ok(system)
    }
}

impl SmisDiscoverer for NetAppSystemDiscoverer {
    type Output = Vec<StorageSystem>;

    fn class_names(&self) -> &[&'static str] {
        self.base.class_names()
    }

    fn parse(&self, instances: &[CimInstance]) -> Vec<StorageSystem> {
        parse_each(instances, |inst| self.parse_system(inst))
    }
}

#[derive(Debug, Clone)]
pub struct NetAppNamespace {
    namespace: String,
}

impl NetAppNamespace {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

impl SmisNamespace for NetAppNamespace {
    fn vendor(&self) -> Vendor {
        Vendor::NetApp
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn associate_discoverers(&self, registry: &mut DiscovererRegistry) -> Result<()> {
        registry.register(NetAppSystemDiscoverer::default())?;
        registry.register(StorageProcessorDiscoverer::new(
            vec!["LSISSI_StorageProcessorSystem"],
            LinkSpec::component("LSISSI_ComponentCS", "Name", "Name"),
        ))?;
        registry.register(StoragePoolDiscoverer::new(
            vec!["LSISSI_StoragePool"],
            PoolMembershipSpec::new(POOL_LINKS.to_vec()),
            Some(LinkSpec::component("LSISSI_HostedStoragePool", "Name", "InstanceID")),
        ))?;
        registry.register(PhysicalVolumeDiscoverer::new(vec!["LSISSI_DiskExtent"]))?;
        registry.register(
            LogicalVolumeDiscoverer::new(vec!["LSISSI_StorageVolume"], FreeSpace::ConsumableBlocks)
                .with_membership(PoolMembershipSpec::new(POOL_LINKS.to_vec())),
        )?;
        registry.register(FcPortDiscoverer::new(vec!["LSISSI_FCPort"]))?;
        registry.register(NoopDiscoverer::<Vec<StorageFabric>>::new())?;
        registry.register(NoopDiscoverer::<Vec<FcSwitch>>::new())?;
        // Same class the masking join resolves WWNs from
        registry.register(RemoteEndpointDiscoverer::new(vec![HARDWARE_ID_CLASS]))?;
        registry.register(LunMaskingDiscoverer::new(MaskingSpec::new(
            "LSISSI_ProtocolControllerForUnit",
            "LSISSI_AuthorizedTarget",
            "LSISSI_AuthorizedSubject",
            HARDWARE_ID_CLASS,
        )))?;
        registry.register(NoopDiscoverer::<EndPointLinks>::new())?;
        registry.register(PhysicalVolumeToPoolDiscoverer::new("LSISSI_ConcreteComponent"))?;
        registry.register(NoopDiscoverer::<Vec<IoGroup>>::new())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cim::snapshot::SnapshotClient;
    use crate::cim::value::ObjectPath;
    use crate::domain::ports::TopologyReporter;
    use crate::domain::topology::TopologyField;
    use crate::report::{endpoint_key, logical_volume_key, GraphReporter, RelationshipKind};
    use crate::smis::registry::{discover_topology, FieldStatus, RegistryConfig};

    #[test]
    fn test_lsi_labels_fill_ip_and_serial() {
        let inst = CimInstance::new("LSISSI_StorageSystem")
            .with("Name", "600A0B80002FC0A8")
            .with("ElementName", "e2700-lab")
            .with("IdentifyingDescriptions", vec![LABEL_IP, LABEL_SERIAL])
            .with("OtherIdentifyingInfo", vec!["192.168.10.4", "SN0042"]);

        let system = NetAppSystemDiscoverer::default().parse_system(&inst).unwrap();
        assert_eq!(system.ip.as_deref(), Some("192.168.10.4"));
        assert_eq!(system.serial.as_deref(), Some("SN0042"));
        assert_eq!(system.vendor.as_deref(), Some(VENDOR_NAME));
        assert_eq!(system.name, "e2700-lab");
    }

    fn masking_client() -> SnapshotClient {
        let controller = ObjectPath::new("LSISSI_SCSIProtocolController").with_key("DeviceID", "SPC-1");
        let privilege = ObjectPath::new("LSISSI_AuthorizedPrivilege").with_key("InstanceID", "PRIV-1");

        SnapshotClient::new("root/lsissi")
            .missing_as_empty()
            .with_class(
                "LSISSI_StorageVolume",
                vec![CimInstance::new("LSISSI_StorageVolume")
                    .with("DeviceID", "V1")
                    .with("SystemName", "600A0B80002FC0A8")
                    .with("BlockSize", 512u64)
                    .with("NumberOfBlocks", 2048u64)],
            )
            .with_class(
                "LSISSI_ProtocolControllerForUnit",
                vec![CimInstance::new("LSISSI_ProtocolControllerForUnit")
                    .with("Antecedent", controller.clone())
                    .with("Dependent", ObjectPath::new("LSISSI_StorageVolume").with_key("DeviceID", "V1"))
                    .with("DeviceNumber", 0u64)],
            )
            .with_class(
                "LSISSI_AuthorizedTarget",
                vec![CimInstance::new("LSISSI_AuthorizedTarget")
                    .with("Privilege", privilege.clone())
                    .with("TargetElement", controller)],
            )
            .with_class(
                "LSISSI_AuthorizedSubject",
                vec![CimInstance::new("LSISSI_AuthorizedSubject")
                    .with("Privilege", privilege)
                    .with(
                        "PrivilegedElement",
                        ObjectPath::new(HARDWARE_ID_CLASS).with_key("InstanceID", "HW-1"),
                    )],
            )
            .with_class(
                HARDWARE_ID_CLASS,
                vec![CimInstance::new(HARDWARE_ID_CLASS)
                    .with("InstanceID", "HW-1")
                    .with("StorageID", "21:00:00:24:ff:3d:7a:10")
                    .with("IDType", 2u64)],
            )
    }

    #[tokio::test]
    async fn test_masking_views_reach_the_graph() {
        let namespace = NetAppNamespace::new("root/lsissi");
        let (topology, report) = discover_topology(&namespace, &masking_client(), RegistryConfig::default())
            .await
            .unwrap();

        assert_eq!(topology.lun_mappings.len(), 1);
        assert_eq!(topology.remote_endpoints.len(), 1);
        assert_eq!(topology.remote_endpoints[0].wwn, "21000024FF3D7A10");
        assert_eq!(
            report.outcome(TopologyField::RemoteEndpoints).unwrap().status,
            FieldStatus::Discovered { count: 1 }
        );

        let graph = GraphReporter::new().report(&topology).unwrap();
        let masking = graph
            .relationships_of(RelationshipKind::Dependency)
            .into_iter()
            .find(|r| r.from == endpoint_key("21000024FF3D7A10"))
            .unwrap();
        assert_eq!(masking.to, logical_volume_key("600A0B80002FC0A8", "V1"));
        assert_eq!(masking.label.as_deref(), Some("0"));
    }
}
