//! Discoverer Contract
//!
//! A discoverer owns one CIM class family: it declares which class names to
//! enumerate and how to turn the returned instances into canonical domain
//! objects (or link maps). Vendor bindings reuse the generic discoverers and
//! override only the class names, the parse step, or the relationship class
//! used to resolve parents.

use crate::cim::value::CimInstance;
use crate::domain::ports::CimClient;
use crate::domain::topology::{FieldValue, TopologyField, TopologySlot};
use crate::error::{Error, ParseError, Result};
use async_trait::async_trait;
use std::marker::PhantomData;
use tracing::{debug, warn};

// =============================================================================
// Discoverer Trait
// =============================================================================

/// Contract for one CIM class family
#[async_trait]
pub trait SmisDiscoverer: Send + Sync {
    /// Topology slot this discoverer fills
    type Output: TopologySlot;

    /// CIM class names to enumerate
    fn class_names(&self) -> &[&'static str];

    /// Query every class and parse the result
    ///
    /// Discoverers that need a prerequisite relationship query override this
    /// and call their own context-aware parse.
    async fn discover(&self, client: &dyn CimClient) -> Result<Self::Output> {
        let instances = query_classes(client, self.class_names()).await?;
        Ok(self.parse(&instances))
    }

    /// Convert raw instances; malformed instances are skipped, never fatal
    fn parse(&self, instances: &[CimInstance]) -> Self::Output;

    /// Whether this discoverer stands in for an unsupported profile area
    fn is_noop(&self) -> bool {
        false
    }
}

// =============================================================================
// Field Discoverer (type-erased)
// =============================================================================

/// Object-safe view of a discoverer, bound to its topology field
#[async_trait]
pub trait FieldDiscoverer: Send + Sync {
    fn field(&self) -> TopologyField;

    fn classes(&self) -> Vec<String>;

    fn is_noop(&self) -> bool;

    async fn discover_field(&self, client: &dyn CimClient) -> Result<FieldValue>;
}

#[async_trait]
impl<D> FieldDiscoverer for D
where
    D: SmisDiscoverer,
{
    fn field(&self) -> TopologyField {
        <D::Output as TopologySlot>::FIELD
    }

    fn classes(&self) -> Vec<String> {
        self.class_names().iter().map(|c| c.to_string()).collect()
    }

    fn is_noop(&self) -> bool {
        SmisDiscoverer::is_noop(self)
    }

    async fn discover_field(&self, client: &dyn CimClient) -> Result<FieldValue> {
        Ok(self.discover(client).await?.into_value())
    }
}

// =============================================================================
// No-op Discoverer
// =============================================================================

/// Stand-in for a profile area the vendor does not implement
///
/// Registering it keeps the field accounted for in the run report while
/// leaving the topology slot at its empty default.
pub struct NoopDiscoverer<T> {
    _slot: PhantomData<fn() -> T>,
}

impl<T> NoopDiscoverer<T> {
    pub fn new() -> Self {
        Self { _slot: PhantomData }
    }
}

impl<T> Default for NoopDiscoverer<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: TopologySlot> SmisDiscoverer for NoopDiscoverer<T> {
    type Output = T;

    fn class_names(&self) -> &[&'static str] {
        &[]
    }

    async fn discover(&self, _client: &dyn CimClient) -> Result<T> {
        Ok(T::default())
    }

    fn parse(&self, _instances: &[CimInstance]) -> T {
        T::default()
    }

    fn is_noop(&self) -> bool {
        true
    }
}

// =============================================================================
// Query Helpers
// =============================================================================

/// Enumerate every class in `class_names` and concatenate the instances
///
/// With several classes, one unavailable class is tolerated as long as
/// another answers. An empty list is a wiring defect.
pub async fn query_classes(
    client: &dyn CimClient,
    class_names: &[&'static str],
) -> Result<Vec<CimInstance>> {
    if class_names.is_empty() {
        return Err(Error::Configuration(
            "CIM class name must be set in order to perform query".into(),
        ));
    }

    let mut instances = Vec::new();
    let mut answered = false;
    let mut last_err = None;

    for class_name in class_names {
        match client.get_instances(class_name).await {
            Ok(found) => {
                debug!("Enumerated {} instances of {}", found.len(), class_name);
                answered = true;
                instances.extend(found);
            }
            Err(e) if e.is_fatal() || class_names.len() == 1 => return Err(e),
            Err(e) => {
                warn!("Class {} unavailable: {}", class_name, e);
                last_err = Some(e);
            }
        }
    }

    match (answered, last_err) {
        (false, Some(e)) => Err(e),
        _ => Ok(instances),
    }
}

/// Enumerate a relationship class, treating provider gaps as "no data"
pub async fn query_optional(client: &dyn CimClient, class_name: &str) -> Result<Vec<CimInstance>> {
    match client.get_instances(class_name).await {
        Ok(found) => Ok(found),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!("Relationship class {} yielded no data: {}", class_name, e);
            Ok(Vec::new())
        }
    }
}

// =============================================================================
// Parse Boundary
// =============================================================================

/// Apply `parse_one` to every instance, skipping the ones that fail
///
/// Only [`ParseError`] is caught here; a failure on one instance is logged
/// and never aborts the rest of the class.
pub fn parse_each<T, F>(instances: &[CimInstance], mut parse_one: F) -> Vec<T>
where
    F: FnMut(&CimInstance) -> std::result::Result<T, ParseError>,
{
    let mut parsed = Vec::with_capacity(instances.len());

    for instance in instances {
        match parse_one(instance) {
            Ok(item) => parsed.push(item),
            Err(e) => {
                let err = e.into_partial(&instance.class_name);
                warn!("Skipping instance: {}", err);
            }
        }
    }

    parsed
}
