//! Domain Ports - Core trait definitions for SMI-S discovery
//!
//! These traits define the boundaries between the normalization engine and
//! the systems around it: the WBEM client it queries and the reporter that
//! turns a finished topology into CMDB objects.

use crate::cim::value::CimInstance;
use crate::domain::topology::Topology;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

// =============================================================================
// CIM Client Port
// =============================================================================

/// Port for enumerating CIM instances
///
/// Namespace selection is part of the client's own configuration; the engine
/// never passes a namespace per call. Timeouts and transport retries are the
/// client's concern.
#[async_trait]
pub trait CimClient: Send + Sync {
    /// Namespace this client is bound to
    fn namespace(&self) -> &str;

    /// Enumerate all instances of `class_name`
    ///
    /// A provider that does not implement the class should answer with
    /// [`Error::ClassUnavailable`](crate::error::Error::ClassUnavailable).
    async fn get_instances(&self, class_name: &str) -> Result<Vec<CimInstance>>;
}

// =============================================================================
// Reporter Port
// =============================================================================

/// Port for consuming a finished topology
pub trait TopologyReporter {
    type Output;

    /// Convert a populated topology into the reporter's output
    fn report(&self, topology: &Topology) -> Result<Self::Output>;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type CimClientRef = Arc<dyn CimClient>;
