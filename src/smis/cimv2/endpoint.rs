//! Remote Endpoint Discovery
//!
//! Host HBAs are known to an array only through the hardware ids registered
//! for masking (`CIM_StorageHardwareID`).

use crate::cim::property::{first_property_str, property_str, property_u64, required_str};
use crate::cim::value::CimInstance;
use crate::domain::model::RemoteEndPoint;
use crate::error::ParseError;
use crate::smis::discoverer::{parse_each, SmisDiscoverer};
use crate::smis::links::endpoint_id;
use indexmap::IndexSet;

/// `CIM_StorageHardwareID.IDType` for a port WWN
pub const ID_TYPE_PORT_WWN: u64 = 2;

#[derive(Debug, Clone)]
pub struct RemoteEndpointDiscoverer {
    pub class_names: Vec<&'static str>,
}

impl Default for RemoteEndpointDiscoverer {
    fn default() -> Self {
        Self::new(vec!["CIM_StorageHardwareID"])
    }
}

impl RemoteEndpointDiscoverer {
    pub fn new(class_names: Vec<&'static str>) -> Self {
        Self { class_names }
    }

    /// Hardware ids typed as anything but a port WWN are not endpoints
    fn is_port_wwn(instance: &CimInstance) -> bool {
        match instance.property_value("IDType") {
            None => true,
            Some(_) => property_u64(instance, "IDType") == Some(ID_TYPE_PORT_WWN),
        }
    }

    pub fn parse_endpoint(&self, instance: &CimInstance) -> std::result::Result<RemoteEndPoint, ParseError> {
        let wwn = endpoint_id(&required_str(instance, "StorageID")?);
        if wwn.is_empty() {
            return Err(ParseError::EmptyIdentity("StorageID".into()));
        }

        Ok(RemoteEndPoint {
            wwn,
            name: first_property_str(instance, &["ElementName", "HostName"]),
            ip: property_str(instance, "IPAddress"),
            port_index: property_str(instance, "PortNumber"),
        })
    }
}

impl SmisDiscoverer for RemoteEndpointDiscoverer {
    type Output = Vec<RemoteEndPoint>;

    fn class_names(&self) -> &[&'static str] {
        &self.class_names
    }

    fn parse(&self, instances: &[CimInstance]) -> Vec<RemoteEndPoint> {
        let typed: Vec<CimInstance> = instances
            .iter()
            .filter(|i| Self::is_port_wwn(i))
            .cloned()
            .collect();

        let mut seen = IndexSet::new();
        parse_each(&typed, |inst| self.parse_endpoint(inst))
            .into_iter()
            .filter(|ep| seen.insert(ep.wwn.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hardware_id(storage_id: &str, id_type: u64) -> CimInstance {
        CimInstance::new("CIM_StorageHardwareID")
            .with("InstanceID", format!("HWID-{}", storage_id))
            .with("StorageID", storage_id)
            .with("IDType", id_type)
            .with("ElementName", "host-01")
    }

    #[test]
    fn test_endpoints_are_port_wwns_deduped() {
        let instances = vec![
            hardware_id("21:00:00:24:ff:3d:7a:10", ID_TYPE_PORT_WWN),
            hardware_id("21000024FF3D7A10", ID_TYPE_PORT_WWN),
            hardware_id("iqn.1998-01.com.vmware:host-01", 5),
            hardware_id("21000024FF3D7A11", ID_TYPE_PORT_WWN),
        ];

        let endpoints = RemoteEndpointDiscoverer::default().parse(&instances);
        let wwns: Vec<_> = endpoints.iter().map(|e| e.wwn.as_str()).collect();
        assert_eq!(wwns, vec!["21000024FF3D7A10", "21000024FF3D7A11"]);
        assert_eq!(endpoints[0].name.as_deref(), Some("host-01"));
    }

    #[test]
    fn test_untyped_hardware_id_is_kept() {
        let inst = CimInstance::new("Vendor_HardwareID").with("StorageID", "21000024FF3D7A12");
        assert_eq!(RemoteEndpointDiscoverer::default().parse(&[inst]).len(), 1);
    }
}
