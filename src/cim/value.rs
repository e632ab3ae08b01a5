//! CIM Value Model
//!
//! Transport-neutral representation of what a WBEM provider hands back:
//! instances carrying named properties, where a property is a scalar, an
//! array, or a reference (object path) to another instance.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Values
// =============================================================================

/// A raw CIM property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CimValue {
    Null,
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Real(f64),
    Text(String),
    Reference(ObjectPath),
    Array(Vec<CimValue>),
}

impl CimValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CimValue::Null)
    }

    /// Borrow the referenced object path, if this is a reference
    pub fn as_reference(&self) -> Option<&ObjectPath> {
        match self {
            CimValue::Reference(path) => Some(path),
            _ => None,
        }
    }

    /// Borrow array elements; scalars behave as a one-element array
    pub fn elements(&self) -> Vec<&CimValue> {
        match self {
            CimValue::Null => Vec::new(),
            CimValue::Array(items) => items.iter().collect(),
            other => vec![other],
        }
    }
}

impl From<&str> for CimValue {
    fn from(s: &str) -> Self {
        CimValue::Text(s.to_string())
    }
}

impl From<String> for CimValue {
    fn from(s: String) -> Self {
        CimValue::Text(s)
    }
}

impl From<u64> for CimValue {
    fn from(v: u64) -> Self {
        CimValue::Unsigned(v)
    }
}

impl From<i64> for CimValue {
    fn from(v: i64) -> Self {
        CimValue::Integer(v)
    }
}

impl From<f64> for CimValue {
    fn from(v: f64) -> Self {
        CimValue::Real(v)
    }
}

impl From<bool> for CimValue {
    fn from(v: bool) -> Self {
        CimValue::Bool(v)
    }
}

impl From<ObjectPath> for CimValue {
    fn from(p: ObjectPath) -> Self {
        CimValue::Reference(p)
    }
}

impl<T: Into<CimValue>> From<Vec<T>> for CimValue {
    fn from(v: Vec<T>) -> Self {
        CimValue::Array(v.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for CimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CimValue::Null => Ok(()),
            CimValue::Bool(b) => write!(f, "{}", b),
            CimValue::Integer(i) => write!(f, "{}", i),
            CimValue::Unsigned(u) => write!(f, "{}", u),
            CimValue::Real(r) => write!(f, "{}", r),
            CimValue::Text(s) => write!(f, "{}", s),
            CimValue::Reference(p) => write!(f, "{}", p),
            CimValue::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(|v| v.to_string())
                    .collect();
                write!(f, "{}", parts.join(", "))
            }
        }
    }
}

// =============================================================================
// Object Paths
// =============================================================================

/// Reference to a CIM instance: class name plus key properties
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectPath {
    pub class_name: String,
    #[serde(default)]
    pub keys: BTreeMap<String, CimValue>,
}

impl ObjectPath {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            keys: BTreeMap::new(),
        }
    }

    /// Builder-style key insertion
    pub fn with_key(mut self, name: impl Into<String>, value: impl Into<CimValue>) -> Self {
        self.keys.insert(name.into(), value.into());
        self
    }

    /// Raw key component (case-insensitive)
    pub fn key(&self, name: &str) -> Option<&CimValue> {
        lookup_ci(&self.keys, name)
    }

    /// Key component as a normalized string
    pub fn key_value(&self, name: &str) -> Option<String> {
        crate::cim::property::stringify(self.key(name))
    }

    /// Whether the referenced class name contains `fragment` (case-insensitive)
    pub fn class_contains(&self, fragment: &str) -> bool {
        self.class_name
            .to_ascii_lowercase()
            .contains(&fragment.to_ascii_lowercase())
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.class_name)?;
        let mut sep = '.';
        for (name, value) in &self.keys {
            write!(f, "{}{}=\"{}\"", sep, name, value)?;
            sep = ',';
        }
        Ok(())
    }
}

// =============================================================================
// Instances
// =============================================================================

/// One enumerated CIM instance
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CimInstance {
    pub class_name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, CimValue>,
}

impl CimInstance {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style property insertion
    pub fn with(mut self, name: impl Into<String>, value: impl Into<CimValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Raw property value; `None` when absent or CIM null
    pub fn property_value(&self, name: &str) -> Option<&CimValue> {
        lookup_ci(&self.properties, name).filter(|v| !v.is_null())
    }

    /// Object path held by a reference-typed property
    pub fn reference(&self, name: &str) -> Option<&ObjectPath> {
        self.property_value(name).and_then(CimValue::as_reference)
    }

    /// Key component of a reference-typed property
    pub fn reference_key(&self, property: &str, key: &str) -> Option<String> {
        self.reference(property).and_then(|p| p.key_value(key))
    }
}

/// CIM property and key names are case-insensitive
fn lookup_ci<'a>(map: &'a BTreeMap<String, CimValue>, name: &str) -> Option<&'a CimValue> {
    map.get(name).or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    })
}
