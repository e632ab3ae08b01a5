//! Fibre-Channel Port Discovery

use crate::cim::property::{
    bps_to_gbps, enabled_state, fc_port_type, instance_status, property_f64, property_str,
    property_u64, property_wwn, required_str,
};
use crate::cim::value::CimInstance;
use crate::domain::model::FcPort;
use crate::error::{Error, ParseError, Result};
use crate::smis::discoverer::{parse_each, SmisDiscoverer};
use regex::Regex;

/// Discovers FC ports on arrays and switches
///
/// Some providers fold the controller into `SystemName`
/// (`"ARRAY.CTL0"`, `"ARRAY-node1"`); an optional suffix pattern strips it
/// so the container resolves to the array itself.
#[derive(Debug, Clone)]
pub struct FcPortDiscoverer {
    pub class_names: Vec<&'static str>,
    system_name_suffix: Option<Regex>,
}

impl Default for FcPortDiscoverer {
    fn default() -> Self {
        Self::new(vec!["CIM_FCPort"])
    }
}

impl FcPortDiscoverer {
    pub fn new(class_names: Vec<&'static str>) -> Self {
        Self {
            class_names,
            system_name_suffix: None,
        }
    }

    /// Strip `pattern` from `SystemName` to obtain the container id
    pub fn with_system_suffix(mut self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| Error::Configuration(format!("Invalid SystemName pattern {}: {}", pattern, e)))?;
        self.system_name_suffix = Some(regex);
        Ok(self)
    }

    pub fn container_id(&self, system_name: &str) -> String {
        match &self.system_name_suffix {
            Some(suffix) => suffix.replace(system_name, "").trim().to_string(),
            None => system_name.trim().to_string(),
        }
    }

    pub fn parse_port(&self, instance: &CimInstance) -> std::result::Result<FcPort, ParseError> {
        let id = required_str(instance, "DeviceID")?;

        Ok(FcPort {
            wwn: property_wwn(instance, "PermanentAddress"),
            name: property_str(instance, "ElementName"),
            container_id: property_str(instance, "SystemName").map(|s| self.container_id(&s)),
            status: instance_status(instance),
            state: enabled_state(property_u64(instance, "EnabledState")).to_string(),
            speed_gbps: bps_to_gbps(property_f64(instance, "Speed")),
            max_speed_gbps: bps_to_gbps(property_f64(instance, "MaxSpeed")),
            port_type: fc_port_type(property_u64(instance, "PortType")).to_string(),
            id,
        })
    }
}

impl SmisDiscoverer for FcPortDiscoverer {
    type Output = Vec<FcPort>;

    fn class_names(&self) -> &[&'static str] {
        &self.class_names
    }

    fn parse(&self, instances: &[CimInstance]) -> Vec<FcPort> {
        parse_each(instances, |inst| self.parse_port(inst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn port(id: &str, system: &str) -> CimInstance {
        CimInstance::new("CIM_FCPort")
            .with("DeviceID", id)
            .with("SystemName", system)
            .with("PermanentAddress", "50060e801049cba0")
            .with("EnabledState", 2u64)
            .with("OperationalStatus", vec![2u64])
            .with("Speed", 8_000_000_000u64)
            .with("MaxSpeed", 16_000_000_000u64)
            .with("PortType", 15u64)
    }

    #[test]
    fn test_port_fields_are_normalized() {
        let parsed = FcPortDiscoverer::default().parse_port(&port("P0", "ARRAY")).unwrap();

        assert_eq!(parsed.wwn.as_deref(), Some("50060E801049CBA0"));
        assert_eq!(parsed.state, "Enabled");
        assert_eq!(parsed.status, "OK");
        assert_eq!(parsed.speed_gbps, Some(8.0));
        assert_eq!(parsed.max_speed_gbps, Some(16.0));
        assert_eq!(parsed.port_type, "F");
        assert_eq!(parsed.container_id.as_deref(), Some("ARRAY"));
    }

    #[test]
    fn test_unknown_port_type_maps_to_unknown() {
        let inst = port("P0", "ARRAY").with("PortType", 99u64).with("EnabledState", "weird");
        let parsed = FcPortDiscoverer::default().parse_port(&inst).unwrap();
        assert_eq!(parsed.port_type, "Unknown");
        assert_eq!(parsed.state, "Unknown");
    }

    #[test]
    fn test_system_name_suffix_is_stripped() {
        let discoverer = FcPortDiscoverer::default()
            .with_system_suffix(r"\.(CTL|CL)[0-9A-Z-]*$")
            .unwrap();

        let parsed = discoverer.parse_port(&port("P0", "AMS2100.83041234.CTL0")).unwrap();
        assert_eq!(parsed.container_id.as_deref(), Some("AMS2100.83041234"));
    }

    #[test]
    fn test_invalid_suffix_pattern_is_configuration_error() {
        assert_matches!(
            FcPortDiscoverer::default().with_system_suffix("(unclosed"),
            Err(Error::Configuration(_))
        );
    }

    #[test]
    fn test_port_without_device_id_is_skipped() {
        let instances = vec![port("P0", "A"), CimInstance::new("CIM_FCPort").with("SystemName", "A")];
        assert_eq!(FcPortDiscoverer::default().parse(&instances).len(), 1);
    }
}
