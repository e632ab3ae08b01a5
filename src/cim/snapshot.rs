//! Snapshot CIM Client
//!
//! An in-memory [`CimClient`] backed by a captured enumeration of a provider:
//! a namespace plus the instances of every class that was dumped. Snapshots
//! are read from JSON or YAML files, which makes offline discovery and tests
//! possible without a live WBEM endpoint.

use crate::cim::value::CimInstance;
use crate::domain::ports::CimClient;
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

// =============================================================================
// Snapshot Format
// =============================================================================

/// A captured provider enumeration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CimSnapshot {
    pub namespace: String,
    /// Instances keyed by CIM class name
    #[serde(default)]
    pub classes: BTreeMap<String, Vec<CimInstance>>,
}

impl CimSnapshot {
    /// Load a snapshot, choosing the format by file extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let snapshot: CimSnapshot = match ext.as_deref() {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("json") | None => serde_json::from_str(&content)?,
            Some(other) => {
                return Err(Error::SnapshotFormat(format!(
                    "unsupported snapshot extension: {}",
                    other
                )))
            }
        };

        if snapshot.namespace.trim().is_empty() {
            return Err(Error::SnapshotFormat(format!(
                "snapshot {} has no namespace",
                path.display()
            )));
        }

        Ok(snapshot)
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for the snapshot client
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Answer classes absent from the snapshot with zero instances instead
    /// of `ClassUnavailable`
    pub missing_class_as_empty: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            missing_class_as_empty: false,
        }
    }
}

// =============================================================================
// Snapshot Client
// =============================================================================

/// CIM client serving instances from a snapshot
pub struct SnapshotClient {
    snapshot: CimSnapshot,
    config: SnapshotConfig,
    /// Classes that answer with a transport failure
    failures: BTreeMap<String, String>,
    /// Every class name queried, in order
    queries: Mutex<Vec<String>>,
}

impl SnapshotClient {
    /// Create an empty client for a namespace
    pub fn new(namespace: impl Into<String>) -> Self {
        Self::from_snapshot(
            CimSnapshot {
                namespace: namespace.into(),
                classes: BTreeMap::new(),
            },
            SnapshotConfig::default(),
        )
    }

    pub fn from_snapshot(snapshot: CimSnapshot, config: SnapshotConfig) -> Self {
        Self {
            snapshot,
            config,
            failures: BTreeMap::new(),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Load a snapshot file into a client
    pub fn from_path(path: &Path, config: SnapshotConfig) -> Result<Self> {
        Ok(Self::from_snapshot(CimSnapshot::load(path)?, config))
    }

    /// Add instances of a class
    pub fn with_class(mut self, class_name: impl Into<String>, instances: Vec<CimInstance>) -> Self {
        self.snapshot
            .classes
            .entry(class_name.into())
            .or_default()
            .extend(instances);
        self
    }

    /// Make a class fail with a transport error
    pub fn with_failure(mut self, class_name: impl Into<String>, reason: impl Into<String>) -> Self {
        self.failures.insert(class_name.into(), reason.into());
        self
    }

    /// Answer every missing class with zero instances
    pub fn missing_as_empty(mut self) -> Self {
        self.config.missing_class_as_empty = true;
        self
    }

    /// Class names queried so far
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    fn find_class(&self, class_name: &str) -> Option<&Vec<CimInstance>> {
        self.snapshot.classes.get(class_name).or_else(|| {
            self.snapshot
                .classes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(class_name))
                .map(|(_, v)| v)
        })
    }
}

#[async_trait]
impl CimClient for SnapshotClient {
    fn namespace(&self) -> &str {
        &self.snapshot.namespace
    }

    async fn get_instances(&self, class_name: &str) -> Result<Vec<CimInstance>> {
        self.queries.lock().push(class_name.to_string());

        if let Some(reason) = self.failures.get(class_name) {
            return Err(Error::Transport(format!("{}: {}", class_name, reason)));
        }

        match self.find_class(class_name) {
            Some(instances) => {
                debug!("Snapshot served {} instances of {}", instances.len(), class_name);
                Ok(instances.clone())
            }
            None if self.config.missing_class_as_empty => Ok(Vec::new()),
            None => Err(Error::class_unavailable(
                class_name,
                format!("not present in snapshot of {}", self.snapshot.namespace),
            )),
        }
    }
}
