//! Vendor Bindings
//!
//! Each binding starts from the generic discoverers and overrides only what
//! its provider does differently:
//! - Hitachi: `HITACHI_*` classes, model/serial from the array name
//! - NetApp: LSI SSI classes and identifying labels
//! - TPD: HP 3PAR nodes, split pool classes, provisioned-block usage
//! - EVA: HP EVA disk groups with unexported capacity
//! - IBM: SVC clusters, nodes and I/O groups
//! - Brocade: fabrics, switches and switch ports only

pub mod brocade;
pub mod eva;
pub mod hitachi;
pub mod ibm;
pub mod netapp;
pub mod tpd;

pub use brocade::{BrocadeNamespace, FcSwitchDiscoverer};
pub use eva::EvaNamespace;
pub use hitachi::{HitachiNamespace, HitachiSystemDiscoverer};
pub use ibm::{IbmClusterDiscoverer, IbmNamespace, IbmNodeDiscoverer, IoGroupDiscoverer};
pub use netapp::{NetAppNamespace, NetAppSystemDiscoverer};
pub use tpd::TpdNamespace;
