//! Namespace Bindings
//!
//! A namespace binding pairs a CIM namespace with the discoverer set that
//! matches the vendor's SMI-S profile. Bindings are looked up from a static
//! table, never discovered at runtime.

use crate::error::{Error, Result};
use crate::smis::cimv2::Cimv2Namespace;
use crate::smis::registry::DiscovererRegistry;
use crate::smis::vendors::{
    BrocadeNamespace, EvaNamespace, HitachiNamespace, IbmNamespace, NetAppNamespace, TpdNamespace,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// =============================================================================
// Vendor
// =============================================================================

/// SMI-S provider families with a dedicated binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Cimv2,
    Hitachi,
    NetApp,
    Tpd,
    Eva,
    Ibm,
    Brocade,
}

impl Vendor {
    pub const ALL: [Vendor; 7] = [
        Vendor::Cimv2,
        Vendor::Hitachi,
        Vendor::NetApp,
        Vendor::Tpd,
        Vendor::Eva,
        Vendor::Ibm,
        Vendor::Brocade,
    ];

    pub fn default_namespace(&self) -> &'static str {
        match self {
            Vendor::Cimv2 => "root/cimv2",
            Vendor::Hitachi => "root/hitachi/smis",
            Vendor::NetApp => "root/lsissi",
            Vendor::Tpd => "root/tpd",
            Vendor::Eva => "root/eva",
            Vendor::Ibm => "root/ibm",
            Vendor::Brocade => "root/brocade1",
        }
    }

    /// Vendor whose default namespace is `namespace`
    pub fn for_namespace(namespace: &str) -> Option<Vendor> {
        let wanted = namespace.trim().trim_matches('/').to_ascii_lowercase();
        Vendor::ALL
            .into_iter()
            .find(|v| v.default_namespace() == wanted)
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Vendor::Cimv2 => "cimv2",
            Vendor::Hitachi => "hitachi",
            Vendor::NetApp => "netapp",
            Vendor::Tpd => "tpd",
            Vendor::Eva => "eva",
            Vendor::Ibm => "ibm",
            Vendor::Brocade => "brocade",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Vendor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cimv2" | "generic" | "smis" => Ok(Vendor::Cimv2),
            "hitachi" | "hds" => Ok(Vendor::Hitachi),
            "netapp" | "lsi" | "lsissi" | "engenio" => Ok(Vendor::NetApp),
            "tpd" | "3par" | "hp3par" => Ok(Vendor::Tpd),
            "eva" | "hpeva" => Ok(Vendor::Eva),
            "ibm" | "svc" | "ibmtssvc" => Ok(Vendor::Ibm),
            "brocade" | "brcd" => Ok(Vendor::Brocade),
            _ => Err(Error::UnknownVendor(s.to_string())),
        }
    }
}

// =============================================================================
// Namespace Contract
// =============================================================================

/// A CIM namespace bound to a vendor's discoverer set
pub trait SmisNamespace: Send + Sync {
    fn vendor(&self) -> Vendor;

    fn namespace(&self) -> &str;

    /// Register one discoverer per supported topology field
    ///
    /// Profile areas the vendor lacks are registered as no-ops so that the
    /// field is still accounted for.
    fn associate_discoverers(&self, registry: &mut DiscovererRegistry) -> Result<()>;
}

pub type SmisNamespaceRef = Arc<dyn SmisNamespace>;

// =============================================================================
// Factory
// =============================================================================

/// Factory for namespace bindings
pub struct NamespaceFactory;

impl NamespaceFactory {
    /// Binding for `vendor`, optionally on a non-default namespace
    pub fn create(vendor: Vendor, namespace: Option<&str>) -> Result<SmisNamespaceRef> {
        let ns = namespace
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| vendor.default_namespace())
            .to_string();

        let binding: SmisNamespaceRef = match vendor {
            Vendor::Cimv2 => Arc::new(Cimv2Namespace::new(ns)),
            Vendor::Hitachi => Arc::new(HitachiNamespace::new(ns)),
            Vendor::NetApp => Arc::new(NetAppNamespace::new(ns)),
            Vendor::Tpd => Arc::new(TpdNamespace::new(ns)),
            Vendor::Eva => Arc::new(EvaNamespace::new(ns)),
            Vendor::Ibm => Arc::new(IbmNamespace::new(ns)),
            Vendor::Brocade => Arc::new(BrocadeNamespace::new(ns)),
        };
        Ok(binding)
    }

    /// Binding for a vendor name
    pub fn for_vendor(name: &str, namespace: Option<&str>) -> Result<SmisNamespaceRef> {
        Self::create(name.parse()?, namespace)
    }

    /// Binding for one of the default namespaces
    pub fn for_namespace(namespace: &str) -> Result<SmisNamespaceRef> {
        let vendor = Vendor::for_namespace(namespace)
            .ok_or_else(|| Error::UnknownNamespace(namespace.to_string()))?;
        Self::create(vendor, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    impl fmt::Debug for dyn SmisNamespace {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("SmisNamespace")
                .field("vendor", &self.vendor())
                .field("namespace", &self.namespace())
                .finish()
        }
    }

    #[test]
    fn test_vendor_aliases() {
        assert_eq!("3PAR".parse::<Vendor>().unwrap(), Vendor::Tpd);
        assert_eq!("lsissi".parse::<Vendor>().unwrap(), Vendor::NetApp);
        assert_eq!(" Brcd ".parse::<Vendor>().unwrap(), Vendor::Brocade);
        assert_matches!("emc".parse::<Vendor>(), Err(Error::UnknownVendor(_)));
    }

    #[test]
    fn test_vendor_display_parses_back() {
        for vendor in Vendor::ALL {
            assert_eq!(vendor.to_string().parse::<Vendor>().unwrap(), vendor);
        }
    }

    #[test]
    fn test_for_namespace_uses_static_table() {
        let binding = NamespaceFactory::for_namespace("root/hitachi/smis").unwrap();
        assert_eq!(binding.vendor(), Vendor::Hitachi);

        let binding = NamespaceFactory::for_namespace("/root/IBM").unwrap();
        assert_eq!(binding.vendor(), Vendor::Ibm);
        assert_eq!(binding.namespace(), "root/ibm");

        assert_matches!(
            NamespaceFactory::for_namespace("root/emc"),
            Err(Error::UnknownNamespace(ns)) if ns == "root/emc"
        );
    }

    #[test]
    fn test_namespace_override() {
        let binding = NamespaceFactory::create(Vendor::Tpd, Some("root/tpd-lab")).unwrap();
        assert_eq!(binding.namespace(), "root/tpd-lab");

        let binding = NamespaceFactory::for_vendor("eva", Some("  ")).unwrap();
        assert_eq!(binding.namespace(), "root/eva");
    }
}
