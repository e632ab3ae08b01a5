//! SMI-S Topology - Storage discovery and normalization engine
//!
//! Discovers the physical and logical topology of SAN storage arrays and
//! fabric switches through their SMI-S (CIM/WBEM) providers and normalizes
//! every vendor's profile into one canonical, vendor-neutral model that a
//! CMDB adapter can consume.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────────┐   ┌──────────────────────┐
//! │  CimClient   │──▶│ DiscovererRegistry│──▶│      Topology        │
//! │ (WBEM/file)  │   │  one per field    │   │ systems, pools, ...  │
//! └──────────────┘   └─────────┬─────────┘   └──────────┬───────────┘
//!                              │                        │
//!                    ┌─────────┴─────────┐   ┌──────────┴───────────┐
//!                    │  SmisNamespace    │   │   TopologyReporter   │
//!                    │ cimv2 + 6 vendors │   │   (graph for CMDB)   │
//!                    └───────────────────┘   └──────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cim`]: CIM value model, property helpers and the snapshot client
//! - [`domain`]: Canonical model, topology aggregate and ports
//! - [`smis`]: Discoverers, namespace bindings and the registry
//! - [`report`]: Graph reporter for CMDB relationships
//! - [`error`]: Error types and handling

pub mod cim;
pub mod domain;
pub mod error;
pub mod report;
pub mod smis;

// Re-export commonly used types
pub use cim::{CimInstance, CimSnapshot, CimValue, ObjectPath, SnapshotClient, SnapshotConfig};

pub use domain::model::{
    Chassis, FcPort, FcSwitch, IoGroup, LogicalVolume, LunMaskingMappingView, PhysicalVolume,
    RemoteEndPoint, StorageFabric, StoragePool, StorageProcessor, StorageSystem,
};
pub use domain::ports::{CimClient, CimClientRef, TopologyReporter};
pub use domain::topology::{EndPointLinks, FieldValue, PhysicalVolumePoolLinks, Topology, TopologyField};

pub use error::{Error, ErrorAction, ParseError, Result};

pub use report::{GraphReporter, RelationshipKind, TopologyGraph};

pub use smis::{
    discover_topology, DiscovererRegistry, DiscoveryReport, FieldStatus, NamespaceFactory,
    RegistryConfig, SmisNamespace, SmisNamespaceRef, Vendor,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
