//! Link Discoverers
//!
//! These return id maps instead of domain objects. Several vendor providers
//! do not implement the association at all, which yields an empty map.

use crate::cim::value::CimInstance;
use crate::domain::ports::CimClient;
use crate::domain::topology::{EndPointLinks, PhysicalVolumePoolLinks};
use crate::error::Result;
use crate::smis::discoverer::SmisDiscoverer;
use crate::smis::links::{children_by_parent, endpoint_id, parents_by_child, LinkSpec};
use async_trait::async_trait;

// =============================================================================
// Endpoint to Volume
// =============================================================================

/// Endpoint (port or SAP) to the volumes available through it
#[derive(Debug, Clone)]
pub struct EndPointToVolumeDiscoverer {
    pub link: LinkSpec,
    class_names: [&'static str; 1],
}

impl Default for EndPointToVolumeDiscoverer {
    fn default() -> Self {
        Self::new("CIM_SAPAvailableForElement")
    }
}

impl EndPointToVolumeDiscoverer {
    pub fn new(class_name: &'static str) -> Self {
        Self::with_link(LinkSpec::new(class_name, "AvailableSAP", "Name", "ManagedElement", "DeviceID"))
    }

    pub fn with_link(link: LinkSpec) -> Self {
        Self {
            class_names: [link.class_name],
            link,
        }
    }

    fn fold(&self, pairs: Vec<(String, String)>) -> EndPointLinks {
        let normalized: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(endpoint, volume)| (endpoint_id(&endpoint), volume))
            .collect();
        children_by_parent(&normalized)
    }
}

#[async_trait]
impl SmisDiscoverer for EndPointToVolumeDiscoverer {
    type Output = EndPointLinks;

    fn class_names(&self) -> &[&'static str] {
        &self.class_names
    }

    async fn discover(&self, client: &dyn CimClient) -> Result<EndPointLinks> {
        Ok(self.fold(self.link.query(client).await?))
    }

    fn parse(&self, instances: &[CimInstance]) -> EndPointLinks {
        self.fold(self.link.pairs(instances))
    }
}

// =============================================================================
// Physical Volume to Pool
// =============================================================================

/// Physical extent to the pool it is concretely part of
#[derive(Debug, Clone)]
pub struct PhysicalVolumeToPoolDiscoverer {
    pub link: LinkSpec,
    class_names: [&'static str; 1],
}

impl Default for PhysicalVolumeToPoolDiscoverer {
    fn default() -> Self {
        Self::new("CIM_ConcreteComponent")
    }
}

impl PhysicalVolumeToPoolDiscoverer {
    pub fn new(class_name: &'static str) -> Self {
        Self::with_link(LinkSpec::component(class_name, "InstanceID", "DeviceID"))
    }

    pub fn with_link(link: LinkSpec) -> Self {
        Self {
            class_names: [link.class_name],
            link,
        }
    }
}

#[async_trait]
impl SmisDiscoverer for PhysicalVolumeToPoolDiscoverer {
    type Output = PhysicalVolumePoolLinks;

    fn class_names(&self) -> &[&'static str] {
        &self.class_names
    }

    async fn discover(&self, client: &dyn CimClient) -> Result<PhysicalVolumePoolLinks> {
        Ok(parents_by_child(&self.link.query(client).await?))
    }

    fn parse(&self, instances: &[CimInstance]) -> PhysicalVolumePoolLinks {
        parents_by_child(&self.link.pairs(instances))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cim::snapshot::SnapshotClient;
    use crate::cim::value::ObjectPath;

    fn sap_link(endpoint: &str, volume: &str) -> CimInstance {
        CimInstance::new("CIM_SAPAvailableForElement")
            .with("AvailableSAP", ObjectPath::new("CIM_SCSIProtocolEndpoint").with_key("Name", endpoint))
            .with("ManagedElement", ObjectPath::new("CIM_StorageVolume").with_key("DeviceID", volume))
    }

    #[test]
    fn test_endpoint_links_group_volumes_by_normalized_endpoint() {
        let links = EndPointToVolumeDiscoverer::default().parse(&[
            sap_link("50:06:0e:80:10:49:cb:a0", "V1"),
            sap_link("50060E801049CBA0", "V2"),
            sap_link("ep-iscsi", "V3"),
        ]);

        assert_eq!(links["50060E801049CBA0"], vec!["V1", "V2"]);
        assert_eq!(links["ep-iscsi"], vec!["V3"]);
    }

    #[tokio::test]
    async fn test_absent_link_class_yields_empty_map() {
        let client = SnapshotClient::new("root/cimv2");
        let links = EndPointToVolumeDiscoverer::default().discover(&client).await.unwrap();
        assert!(links.is_empty());

        let pv_links = PhysicalVolumeToPoolDiscoverer::default().discover(&client).await.unwrap();
        assert!(pv_links.is_empty());
    }

    #[tokio::test]
    async fn test_physical_volume_pool_links() {
        let client = SnapshotClient::new("root/cimv2").with_class(
            "CIM_ConcreteComponent",
            vec![CimInstance::new("CIM_ConcreteComponent")
                .with("GroupComponent", ObjectPath::new("CIM_StoragePool").with_key("InstanceID", "P0"))
                .with("PartComponent", ObjectPath::new("CIM_StorageExtent").with_key("DeviceID", "D1"))],
        );

        let links = PhysicalVolumeToPoolDiscoverer::default().discover(&client).await.unwrap();
        assert_eq!(links.get("D1").map(String::as_str), Some("P0"));
    }
}
