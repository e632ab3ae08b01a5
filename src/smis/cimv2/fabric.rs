//! Fabric Discovery

use crate::cim::property::{normalize_wwn, property_str, required_str};
use crate::cim::value::CimInstance;
use crate::domain::model::StorageFabric;
use crate::error::ParseError;
use crate::smis::discoverer::{parse_each, SmisDiscoverer};

/// `NameFormat` marking an admin domain as a fabric
pub const NAME_FORMAT_WWN: &str = "WWN";

/// Discovers SAN fabrics from admin domains named by WWN
#[derive(Debug, Clone)]
pub struct StorageFabricDiscoverer {
    pub class_names: Vec<&'static str>,
    /// Only instances with this `NameFormat` are fabrics
    pub name_format: Option<&'static str>,
}

impl Default for StorageFabricDiscoverer {
    fn default() -> Self {
        Self {
            class_names: vec!["CIM_AdminDomain"],
            name_format: Some(NAME_FORMAT_WWN),
        }
    }
}

impl StorageFabricDiscoverer {
    pub fn new(class_names: Vec<&'static str>) -> Self {
        Self {
            class_names,
            name_format: None,
        }
    }

    fn is_fabric(&self, instance: &CimInstance) -> bool {
        match self.name_format {
            Some(expected) => property_str(instance, "NameFormat")
                .map(|f| f.eq_ignore_ascii_case(expected))
                .unwrap_or(false),
            None => true,
        }
    }

    pub fn parse_fabric(&self, instance: &CimInstance) -> std::result::Result<StorageFabric, ParseError> {
        let raw = required_str(instance, "Name")?;
        let wwn = normalize_wwn(&raw).ok_or_else(|| ParseError::EmptyIdentity("Name".into()))?;

        Ok(StorageFabric {
            name: property_str(instance, "ElementName").unwrap_or_else(|| wwn.clone()),
            wwn,
        })
    }
}

impl SmisDiscoverer for StorageFabricDiscoverer {
    type Output = Vec<StorageFabric>;

    fn class_names(&self) -> &[&'static str] {
        &self.class_names
    }

    fn parse(&self, instances: &[CimInstance]) -> Vec<StorageFabric> {
        // Admin domains that are not fabrics are expected, not malformed
        let fabrics: Vec<CimInstance> = instances.iter().filter(|i| self.is_fabric(i)).cloned().collect();
        parse_each(&fabrics, |inst| self.parse_fabric(inst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(name: &str, format: &str) -> CimInstance {
        CimInstance::new("CIM_AdminDomain")
            .with("Name", name)
            .with("NameFormat", format)
    }

    #[test]
    fn test_only_wwn_named_domains_are_fabrics() {
        let instances = vec![
            domain("10:00:00:05:1e:0f:1a:2b", "WWN").with("ElementName", "fabric-a"),
            domain("site-admin", "Other"),
            domain("100000051e0f1a2c", "wwn"),
        ];

        let fabrics = StorageFabricDiscoverer::default().parse(&instances);
        assert_eq!(fabrics.len(), 2);
        assert_eq!(fabrics[0].name, "fabric-a");
        assert_eq!(fabrics[0].wwn, "100000051E0F1A2B");
        assert_eq!(fabrics[1].name, "100000051E0F1A2C");
    }

    #[test]
    fn test_fabric_with_invalid_wwn_is_skipped() {
        let fabrics = StorageFabricDiscoverer::new(vec!["Vendor_Fabric"])
            .parse(&[domain("not-a-wwn", "WWN")]);
        assert!(fabrics.is_empty());
    }
}
