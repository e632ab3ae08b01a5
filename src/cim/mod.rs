//! CIM Module
//!
//! Value model for CIM instances and object paths, the property helpers every
//! discoverer relies on, and a snapshot-backed client.

pub mod property;
pub mod snapshot;
pub mod value;

pub use snapshot::*;
pub use value::*;
