//! Property Helpers
//!
//! Normalizes heterogeneous CIM property values into comparable strings and
//! numbers, and resolves the enumerated status codes of the CIM schema into
//! human-readable strings. Nothing in here fails on absent data: every helper
//! returns `None` (or `"Unknown"` for status lookups) instead.

use crate::cim::value::{CimInstance, CimValue};
use crate::error::ParseError;

// =============================================================================
// Constants
// =============================================================================

pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
pub const BITS_PER_GBIT: f64 = 1_000_000_000.0;

/// Status string used for any code missing from a lookup table
pub const UNKNOWN_STATUS: &str = "Unknown";

/// CIM_ManagedSystemElement.OperationalStatus
pub const OPERATIONAL_STATUS: &[(u64, &str)] = &[
    (0, "Unknown"),
    (1, "Other"),
    (2, "OK"),
    (3, "Degraded"),
    (4, "Stressed"),
    (5, "Predictive Failure"),
    (6, "Error"),
    (7, "Non-Recoverable Error"),
    (8, "Starting"),
    (9, "Stopping"),
    (10, "Stopped"),
    (11, "In Service"),
    (12, "No Contact"),
    (13, "Lost Communication"),
    (14, "Aborted"),
    (15, "Dormant"),
    (16, "Supporting Entity in Error"),
    (17, "Completed"),
    (18, "Power Mode"),
];

/// CIM_ManagedSystemElement.HealthState
pub const HEALTH_STATE: &[(u64, &str)] = &[
    (0, "Unknown"),
    (5, "OK"),
    (10, "Degraded/Warning"),
    (15, "Minor failure"),
    (20, "Major failure"),
    (25, "Critical failure"),
    (30, "Non-recoverable error"),
];

/// CIM_EnabledLogicalElement.EnabledState
pub const ENABLED_STATE: &[(u64, &str)] = &[
    (0, "Unknown"),
    (1, "Other"),
    (2, "Enabled"),
    (3, "Disabled"),
    (4, "Shutting Down"),
    (5, "Not Applicable"),
    (6, "Enabled but Offline"),
    (7, "In Test"),
    (8, "Deferred"),
    (9, "Quiesce"),
    (10, "Starting"),
];

/// CIM_FCPort.PortType
pub const FC_PORT_TYPE: &[(u64, &str)] = &[
    (0, "Unknown"),
    (1, "Other"),
    (10, "N"),
    (11, "NL"),
    (12, "F/NL"),
    (13, "Nx"),
    (14, "E"),
    (15, "F"),
    (16, "FL"),
    (17, "B"),
    (18, "G"),
];

// =============================================================================
// Stringification
// =============================================================================

/// Normalize a raw value to a trimmed, non-empty string
pub fn stringify(value: Option<&CimValue>) -> Option<String> {
    let value = value?;
    let text = match value {
        CimValue::Null => return None,
        CimValue::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(|v| stringify(Some(v))).collect();
            parts.join(", ")
        }
        other => other.to_string(),
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Property of an instance as a normalized string
pub fn property_str(instance: &CimInstance, name: &str) -> Option<String> {
    stringify(instance.property_value(name))
}

/// First property in `names` that carries a value
pub fn first_property_str(instance: &CimInstance, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| property_str(instance, name))
}

/// Property that must be present and non-empty
pub fn required_str(instance: &CimInstance, name: &str) -> Result<String, ParseError> {
    property_str(instance, name).ok_or_else(|| ParseError::MissingProperty(name.to_string()))
}

/// Array property as strings, keeping element positions
///
/// Null or blank elements become empty strings so that index-matched
/// parallel arrays stay aligned.
pub fn string_list(instance: &CimInstance, name: &str) -> Vec<String> {
    match instance.property_value(name) {
        None => Vec::new(),
        Some(value) => value
            .elements()
            .into_iter()
            .map(|v| stringify(Some(v)).unwrap_or_default())
            .collect(),
    }
}

// =============================================================================
// Numeric Coercion
// =============================================================================

/// Coerce a raw value to an unsigned integer
pub fn as_u64(value: Option<&CimValue>) -> Option<u64> {
    match value? {
        CimValue::Unsigned(u) => Some(*u),
        CimValue::Integer(i) => u64::try_from(*i).ok(),
        CimValue::Real(r) if r.is_finite() && *r >= 0.0 => Some(r.trunc() as u64),
        CimValue::Text(s) => s.trim().parse().ok(),
        CimValue::Array(items) => as_u64(items.first()),
        _ => None,
    }
}

/// Coerce a raw value to a float
pub fn as_f64(value: Option<&CimValue>) -> Option<f64> {
    match value? {
        CimValue::Unsigned(u) => Some(*u as f64),
        CimValue::Integer(i) => Some(*i as f64),
        CimValue::Real(r) if r.is_finite() => Some(*r),
        CimValue::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        CimValue::Array(items) => as_f64(items.first()),
        _ => None,
    }
}

pub fn property_u64(instance: &CimInstance, name: &str) -> Option<u64> {
    as_u64(instance.property_value(name))
}

pub fn property_f64(instance: &CimInstance, name: &str) -> Option<f64> {
    as_f64(instance.property_value(name))
}

/// Numeric property that, when present, must parse
///
/// Absent yields `Ok(None)`; present but malformed yields `InvalidNumber`.
pub fn strict_u64(instance: &CimInstance, name: &str) -> Result<Option<u64>, ParseError> {
    match instance.property_value(name) {
        None => Ok(None),
        Some(value) => as_u64(Some(value)).map(Some).ok_or_else(|| ParseError::InvalidNumber {
            property: name.to_string(),
            value: value.to_string(),
        }),
    }
}

pub fn property_bool(instance: &CimInstance, name: &str) -> Option<bool> {
    match instance.property_value(name)? {
        CimValue::Bool(b) => Some(*b),
        CimValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        other => as_u64(Some(other)).map(|v| v != 0),
    }
}

/// Bytes to megabytes
pub fn bytes_to_mb(bytes: f64) -> f64 {
    bytes / BYTES_PER_MB
}

/// `blocks × block_size` in megabytes; `None` when either side is missing
pub fn blocks_to_mb(blocks: Option<u64>, block_size: Option<u64>) -> Option<f64> {
    Some(bytes_to_mb(blocks? as f64 * block_size? as f64))
}

/// Bits per second to gigabits per second
pub fn bps_to_gbps(bps: Option<f64>) -> Option<f64> {
    bps.filter(|b| *b > 0.0).map(|b| b / BITS_PER_GBIT)
}

// =============================================================================
// Parallel Array Lookup
// =============================================================================

/// Look up `label` in `labels` and return the value at the same index
///
/// SMI-S exposes identifying metadata as two parallel arrays instead of named
/// fields. Arrays of different length cannot be trusted to be aligned, so a
/// length mismatch yields `None`.
pub fn lookup_by_label<S: AsRef<str>>(labels: &[S], values: &[S], label: &str) -> Option<String> {
    if labels.len() != values.len() {
        return None;
    }

    labels
        .iter()
        .position(|l| l.as_ref().trim().eq_ignore_ascii_case(label))
        .map(|idx| values[idx].as_ref().trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// `IdentifyingDescriptions` / `OtherIdentifyingInfo` lookup on an instance
pub fn identifying_info(instance: &CimInstance, label: &str) -> Option<String> {
    let labels = string_list(instance, "IdentifyingDescriptions");
    let values = string_list(instance, "OtherIdentifyingInfo");
    lookup_by_label(&labels, &values, label)
}

// =============================================================================
// Status Resolution
// =============================================================================

/// Resolve a code against a fixed table; unknown codes map to `"Unknown"`
pub fn lookup_code(table: &[(u64, &'static str)], code: Option<u64>) -> &'static str {
    code.and_then(|c| table.iter().find(|(k, _)| *k == c).map(|(_, v)| *v))
        .unwrap_or(UNKNOWN_STATUS)
}

pub fn operational_status(code: Option<u64>) -> &'static str {
    lookup_code(OPERATIONAL_STATUS, code)
}

pub fn health_state(code: Option<u64>) -> &'static str {
    lookup_code(HEALTH_STATE, code)
}

pub fn enabled_state(code: Option<u64>) -> &'static str {
    lookup_code(ENABLED_STATE, code)
}

pub fn fc_port_type(code: Option<u64>) -> &'static str {
    lookup_code(FC_PORT_TYPE, code)
}

/// Status of an instance from the first `OperationalStatus` entry
///
/// Falls back to `HealthState` when the provider only reports that.
pub fn instance_status(instance: &CimInstance) -> String {
    if instance.property_value("OperationalStatus").is_some() {
        return operational_status(property_u64(instance, "OperationalStatus")).to_string();
    }
    if instance.property_value("HealthState").is_some() {
        return health_state(property_u64(instance, "HealthState")).to_string();
    }
    UNKNOWN_STATUS.to_string()
}

// =============================================================================
// WWN Normalization
// =============================================================================

/// Strip separators from a World Wide Name and uppercase it
///
/// Returns `None` unless the result is 16 or 32 hex digits.
pub fn normalize_wwn(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | ' ' | '.'))
        .collect::<String>()
        .to_ascii_uppercase();
    let cleaned = cleaned.strip_prefix("0X").unwrap_or(&cleaned).to_string();

    let valid_len = cleaned.len() == 16 || cleaned.len() == 32;
    if valid_len && cleaned.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(cleaned)
    } else {
        None
    }
}

pub fn property_wwn(instance: &CimInstance, name: &str) -> Option<String> {
    property_str(instance, name).and_then(|s| normalize_wwn(&s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stringify_shapes() {
        assert_eq!(stringify(None), None);
        assert_eq!(stringify(Some(&CimValue::Null)), None);
        assert_eq!(stringify(Some(&CimValue::from("  "))), None);
        assert_eq!(stringify(Some(&CimValue::from(" ARRAY "))), Some("ARRAY".into()));
        assert_eq!(stringify(Some(&CimValue::Unsigned(42))), Some("42".into()));
        assert_eq!(stringify(Some(&CimValue::Real(2.0))), Some("2".into()));
        assert_eq!(
            stringify(Some(&CimValue::from(vec!["a", "", "b"]))),
            Some("a, b".into())
        );
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(as_u64(Some(&CimValue::from("2048"))), Some(2048));
        assert_eq!(as_u64(Some(&CimValue::Integer(-1))), None);
        assert_eq!(as_u64(Some(&CimValue::from("lots"))), None);
        assert_eq!(as_u64(Some(&CimValue::from(vec![2u64, 3]))), Some(2));
        assert_eq!(as_f64(Some(&CimValue::from("1.5"))), Some(1.5));
        assert_eq!(as_f64(Some(&CimValue::from("NaN"))), None);
    }

    #[test]
    fn test_strict_u64() {
        let inst = CimInstance::new("X").with("Good", 1u64).with("Bad", "x");
        assert_eq!(strict_u64(&inst, "Good"), Ok(Some(1)));
        assert_eq!(strict_u64(&inst, "Absent"), Ok(None));
        assert!(matches!(
            strict_u64(&inst, "Bad"),
            Err(ParseError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_blocks_to_mb() {
        let mb = blocks_to_mb(Some(2048), Some(512)).unwrap();
        assert!((mb - 1.0).abs() < f64::EPSILON);
        assert_eq!(blocks_to_mb(None, Some(512)), None);
    }

    #[test]
    fn test_lookup_by_label() {
        let labels = vec!["Ipv4 Address", "Node WWN"];
        let values = vec!["10.0.0.5", "50:06:0E:80"];
        assert_eq!(lookup_by_label(&labels, &values, "ipv4 address"), Some("10.0.0.5".into()));
        assert_eq!(lookup_by_label(&labels, &values, "Serial"), None);

        let short = vec!["10.0.0.5"];
        assert_eq!(lookup_by_label(&labels, &short, "Ipv4 Address"), None);
    }

    #[test]
    fn test_status_tables() {
        for (code, name) in OPERATIONAL_STATUS {
            assert_eq!(operational_status(Some(*code)), *name);
        }
        assert_eq!(operational_status(Some(32768)), "Unknown");
        assert_eq!(operational_status(None), "Unknown");
        assert_eq!(health_state(Some(25)), "Critical failure");
        assert_eq!(health_state(Some(7)), "Unknown");
        assert_eq!(fc_port_type(Some(15)), "F");
        assert_eq!(enabled_state(Some(99)), "Unknown");
    }

    #[test]
    fn test_instance_status_fallbacks() {
        let ok = CimInstance::new("X").with("OperationalStatus", vec![2u64, 32768]);
        assert_eq!(instance_status(&ok), "OK");

        let health = CimInstance::new("X").with("HealthState", 10u64);
        assert_eq!(instance_status(&health), "Degraded/Warning");

        let bogus = CimInstance::new("X").with("OperationalStatus", "garbage");
        assert_eq!(instance_status(&bogus), "Unknown");

        assert_eq!(instance_status(&CimInstance::new("X")), "Unknown");
    }

    #[test]
    fn test_normalize_wwn() {
        assert_eq!(
            normalize_wwn("50:06:0e:80:10:2a:3b:4c"),
            Some("50060E80102A3B4C".into())
        );
        assert_eq!(normalize_wwn("0x50060E80102A3B4C"), Some("50060E80102A3B4C".into()));
        assert_eq!(normalize_wwn("not-a-wwn"), None);
        assert_eq!(normalize_wwn("5006"), None);
    }
}
