//! SMI-S Discovery Engine
//!
//! Discoverers turn CIM class enumerations into canonical domain objects.
//! Namespace bindings select the discoverer set for a vendor profile, and the
//! registry runs that set against one client into a fresh topology.

pub mod cimv2;
pub mod discoverer;
pub mod links;
pub mod namespace;
pub mod registry;
pub mod vendors;

pub use discoverer::{FieldDiscoverer, NoopDiscoverer, SmisDiscoverer};
pub use namespace::{NamespaceFactory, SmisNamespace, SmisNamespaceRef, Vendor};
pub use registry::{
    discover_topology, DiscovererRegistry, DiscoveryReport, FieldOutcome, FieldStatus, RegistryConfig,
};
