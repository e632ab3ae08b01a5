//! Discoverer Registry
//!
//! Binds topology fields to discoverers and drives one discovery run. This
//! is the failure-isolation boundary: a discoverer that fails leaves its
//! field at the empty default and the run carries on. Only wiring defects
//! (configuration errors) escape.

use crate::domain::ports::CimClient;
use crate::domain::topology::{FieldValue, Topology, TopologyField};
use crate::error::{Error, Result};
use crate::smis::discoverer::{FieldDiscoverer, SmisDiscoverer};
use crate::smis::namespace::SmisNamespace;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// =============================================================================
// Registry Configuration
// =============================================================================

/// Configuration for a discovery run
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Issue per-field queries concurrently; results are still applied in
    /// registration order
    pub concurrent: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { concurrent: false }
    }
}

// =============================================================================
// Run Report
// =============================================================================

/// Outcome of one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FieldStatus {
    Discovered { count: usize },
    /// A no-op stands in for a profile area the vendor lacks
    Unsupported,
    /// Left at the empty default
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldOutcome {
    pub field: TopologyField,
    pub classes: Vec<String>,
    pub status: FieldStatus,
}

/// Per-field summary returned alongside the topology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryReport {
    pub namespace: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<FieldOutcome>,
}

impl DiscoveryReport {
    pub fn outcome(&self, field: TopologyField) -> Option<&FieldOutcome> {
        self.outcomes.iter().find(|o| o.field == field)
    }

    pub fn failed(&self) -> Vec<&FieldOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, FieldStatus::Failed { .. }))
            .collect()
    }

    /// Total objects discovered across fields
    pub fn discovered_count(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o.status {
                FieldStatus::Discovered { count } => count,
                _ => 0,
            })
            .sum()
    }

    pub fn is_complete(&self) -> bool {
        self.failed().is_empty()
    }
}

// =============================================================================
// Discoverer Registry
// =============================================================================

/// Ordered table of `(field, discoverer)` bindings
pub struct DiscovererRegistry {
    config: RegistryConfig,
    entries: Vec<Box<dyn FieldDiscoverer>>,
}

impl Default for DiscovererRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl DiscovererRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
        }
    }

    /// Bind a discoverer to the field its output fills
    pub fn register<D>(&mut self, discoverer: D) -> Result<()>
    where
        D: SmisDiscoverer + 'static,
    {
        self.register_boxed(Box::new(discoverer))
    }

    /// A field may be bound once per namespace
    pub fn register_boxed(&mut self, discoverer: Box<dyn FieldDiscoverer>) -> Result<()> {
        let field = discoverer.field();
        if self.entries.iter().any(|e| e.field() == field) {
            return Err(Error::Configuration(format!(
                "Field {} already has a discoverer",
                field
            )));
        }

        debug!("Registered discoverer for {} ({:?})", field, discoverer.classes());
        self.entries.push(discoverer);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered fields in registration order
    pub fn fields(&self) -> Vec<TopologyField> {
        self.entries.iter().map(|e| e.field()).collect()
    }

    /// Fields no discoverer is bound to
    pub fn missing_fields(&self) -> Vec<TopologyField> {
        let registered = self.fields();
        FieldValue::ALL_FIELDS
            .into_iter()
            .filter(|f| !registered.contains(f))
            .collect()
    }

    /// Populate `topology` from every registered discoverer
    pub async fn run(&self, client: &dyn CimClient, topology: &mut Topology) -> Result<DiscoveryReport> {
        let started_at = Utc::now();
        info!(
            "Starting discovery of {} fields in {}",
            self.entries.len(),
            client.namespace()
        );

        let results = if self.config.concurrent {
            join_all(self.entries.iter().map(|e| e.discover_field(client))).await
        } else {
            let mut results = Vec::with_capacity(self.entries.len());
            for entry in &self.entries {
                results.push(entry.discover_field(client).await);
            }
            results
        };

        let mut outcomes = Vec::with_capacity(self.entries.len());

        for (entry, result) in self.entries.iter().zip(results) {
            let field = entry.field();
            let status = match result {
                Ok(value) if entry.is_noop() => {
                    topology.apply(value);
                    FieldStatus::Unsupported
                }
                Ok(value) => {
                    let count = value.len();
                    info!("Discovered {} {}", count, field);
                    topology.apply(value);
                    FieldStatus::Discovered { count }
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Discovery of {} failed: {}", field, e);
                    FieldStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            };

            outcomes.push(FieldOutcome {
                field,
                classes: entry.classes(),
                status,
            });
        }

        let report = DiscoveryReport {
            namespace: client.namespace().to_string(),
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };

        info!(
            "Discovery of {} finished: {} objects, {} failed fields",
            report.namespace,
            report.discovered_count(),
            report.failed().len()
        );

        Ok(report)
    }
}

// =============================================================================
// Entry Point
// =============================================================================

/// Discover a fresh topology through `namespace`'s discoverer set
pub async fn discover_topology(
    namespace: &dyn SmisNamespace,
    client: &dyn CimClient,
    config: RegistryConfig,
) -> Result<(Topology, DiscoveryReport)> {
    let mut registry = DiscovererRegistry::new(config);
    namespace.associate_discoverers(&mut registry)?;

    info!(
        "Discovering {} topology in {} ({} discoverers)",
        namespace.vendor(),
        namespace.namespace(),
        registry.len()
    );

    let mut topology = Topology::new(namespace.namespace());
    let report = registry.run(client, &mut topology).await?;
    Ok((topology, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cim::snapshot::SnapshotClient;
    use crate::cim::value::{CimInstance, ObjectPath};
    use crate::domain::model::{StorageFabric, StorageSystem};
    use crate::smis::cimv2::{FcPortDiscoverer, StorageSystemDiscoverer};
    use crate::smis::discoverer::NoopDiscoverer;
    use crate::smis::namespace::{NamespaceFactory, Vendor};
    use assert_matches::assert_matches;

    struct Unconfigured;

    impl SmisDiscoverer for Unconfigured {
        type Output = Vec<StorageFabric>;

        fn class_names(&self) -> &[&'static str] {
            &[]
        }

        fn parse(&self, _instances: &[CimInstance]) -> Vec<StorageFabric> {
            Vec::new()
        }
    }

    fn array(name: &str) -> CimInstance {
        CimInstance::new("CIM_ComputerSystem")
            .with("Name", name)
            .with("OperationalStatus", vec![2u64])
    }

    #[test]
    fn test_duplicate_field_is_rejected() {
        let mut registry = DiscovererRegistry::default();
        registry.register(StorageSystemDiscoverer::default()).unwrap();

        assert_matches!(
            registry.register(NoopDiscoverer::<Vec<StorageSystem>>::new()),
            Err(Error::Configuration(_))
        );
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_field_is_isolated() {
        let mut registry = DiscovererRegistry::default();
        registry.register(StorageSystemDiscoverer::default()).unwrap();
        registry.register(FcPortDiscoverer::default()).unwrap();
        registry.register(NoopDiscoverer::<Vec<StorageFabric>>::new()).unwrap();

        let client = SnapshotClient::new("root/cimv2")
            .with_class("CIM_ComputerSystem", vec![array("A1"), array("A2")])
            .with_failure("CIM_FCPort", "provider timeout");

        let mut topology = Topology::new("root/cimv2");
        let report = registry.run(&client, &mut topology).await.unwrap();

        assert_eq!(topology.storage_systems.len(), 2);
        assert!(topology.ports.is_empty());
        assert_eq!(
            report.outcome(TopologyField::StorageSystems).unwrap().status,
            FieldStatus::Discovered { count: 2 }
        );
        assert_matches!(
            &report.outcome(TopologyField::Ports).unwrap().status,
            FieldStatus::Failed { reason } if reason.contains("provider timeout")
        );
        assert_eq!(
            report.outcome(TopologyField::StorageFabrics).unwrap().status,
            FieldStatus::Unsupported
        );
        assert!(!report.is_complete());
        assert_eq!(report.discovered_count(), 2);
    }

    #[tokio::test]
    async fn test_configuration_error_propagates() {
        let mut registry = DiscovererRegistry::default();
        registry.register(StorageSystemDiscoverer::default()).unwrap();
        registry.register(Unconfigured).unwrap();

        let client = SnapshotClient::new("root/cimv2").missing_as_empty();
        let mut topology = Topology::new("root/cimv2");

        assert_matches!(
            registry.run(&client, &mut topology).await,
            Err(Error::Configuration(msg)) if msg.contains("CIM class name must be set")
        );
    }

    #[tokio::test]
    async fn test_every_vendor_registers_every_field() {
        for vendor in Vendor::ALL {
            let namespace = NamespaceFactory::create(vendor, None).unwrap();
            let mut registry = DiscovererRegistry::default();
            namespace.associate_discoverers(&mut registry).unwrap();

            assert!(
                registry.missing_fields().is_empty(),
                "{} is missing {:?}",
                vendor,
                registry.missing_fields()
            );
        }
    }

    #[tokio::test]
    async fn test_empty_provider_yields_empty_topology_for_every_vendor() {
        for vendor in Vendor::ALL {
            let namespace = NamespaceFactory::create(vendor, None).unwrap();
            let client = SnapshotClient::new(namespace.namespace()).missing_as_empty();

            let (topology, report) = discover_topology(namespace.as_ref(), &client, RegistryConfig::default())
                .await
                .unwrap();

            assert!(topology.is_empty(), "{} produced data from nothing", vendor);
            assert!(report.is_complete(), "{} failed {:?}", vendor, report.failed());
        }
    }

    #[tokio::test]
    async fn test_absent_classes_fail_fields_without_failing_run() {
        for vendor in Vendor::ALL {
            let namespace = NamespaceFactory::create(vendor, None).unwrap();
            let client = SnapshotClient::new(namespace.namespace());

            let (topology, _) = discover_topology(namespace.as_ref(), &client, RegistryConfig::default())
                .await
                .unwrap();
            assert!(topology.is_empty());
        }
    }

    #[tokio::test]
    async fn test_repeated_runs_are_structurally_equal() {
        let namespace = NamespaceFactory::create(Vendor::Cimv2, None).unwrap();
        let client = SnapshotClient::new("root/cimv2")
            .missing_as_empty()
            .with_class("CIM_ComputerSystem", vec![array("A1")])
            .with_class(
                "CIM_StorageVolume",
                vec![CimInstance::new("CIM_StorageVolume")
                    .with("DeviceID", "V1")
                    .with("SystemName", "A1")],
            )
            .with_class(
                "CIM_ConcreteComponent",
                vec![CimInstance::new("CIM_ConcreteComponent")
                    .with("GroupComponent", ObjectPath::new("CIM_StoragePool").with_key("InstanceID", "P0"))
                    .with("PartComponent", ObjectPath::new("CIM_StorageExtent").with_key("DeviceID", "D1"))],
            );

        let (mut first, _) = discover_topology(namespace.as_ref(), &client, RegistryConfig::default())
            .await
            .unwrap();
        let (mut second, _) = discover_topology(namespace.as_ref(), &client, RegistryConfig::default())
            .await
            .unwrap();

        first.discovered_at = None;
        second.discovered_at = None;
        assert_eq!(first, second);
        assert_eq!(first.storage_systems.len(), 1);
        assert_eq!(first.logical_volumes.len(), 1);
        assert_eq!(first.physical_volumes_2_pool_links.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_run_matches_sequential() {
        let namespace = NamespaceFactory::create(Vendor::Cimv2, None).unwrap();
        let client = SnapshotClient::new("root/cimv2")
            .missing_as_empty()
            .with_class("CIM_ComputerSystem", vec![array("A1"), array("A2")]);

        let (mut sequential, seq_report) =
            discover_topology(namespace.as_ref(), &client, RegistryConfig::default())
                .await
                .unwrap();
        let (mut concurrent, con_report) =
            discover_topology(namespace.as_ref(), &client, RegistryConfig { concurrent: true })
                .await
                .unwrap();

        sequential.discovered_at = None;
        concurrent.discovered_at = None;
        assert_eq!(sequential, concurrent);

        let fields = |r: &DiscoveryReport| r.outcomes.iter().map(|o| o.field).collect::<Vec<_>>();
        assert_eq!(fields(&seq_report), fields(&con_report));
    }
}
