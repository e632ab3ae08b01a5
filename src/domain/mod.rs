//! Domain layer - Canonical storage model and port definitions
//!
//! This module defines the vendor-neutral entities, the topology aggregate
//! they are collected into, and the traits (ports) that adapters implement,
//! following hexagonal architecture principles.

pub mod model;
pub mod ports;
pub mod topology;

pub use model::*;
pub use ports::*;
pub use topology::*;
