//! Canonical Storage Model
//!
//! Vendor-neutral entities populated by the discoverers. Every vendor's SMI-S
//! profile is reconciled into these shapes before reporting.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// =============================================================================
// Systems and Processors
// =============================================================================

/// A storage array controller node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageSystem {
    /// Vendor CIM key, often compound
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Management IPv4 address
    pub ip: Option<String>,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub serial: Option<String>,
    /// Firmware or OS version
    pub os_version: Option<String>,
    pub node_wwn: Option<String>,
    pub status: String,
}

/// Physical enclosure metadata for a processor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Chassis {
    pub tag: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub version: Option<String>,
}

/// A controller or processing node within a storage system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageProcessor {
    /// Unique within the parent system
    pub id: String,
    pub name: String,
    pub node_wwn: Option<String>,
    pub ip: Option<String>,
    pub serial: Option<String>,
    pub version: Option<String>,
    pub status: String,
    /// Parent storage system id, resolved from a link class
    pub system_id: Option<String>,
    pub chassis: Option<Chassis>,
}

/// A grouping of processor nodes (IBM SVC)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IoGroup {
    pub id: String,
    pub name: String,
    /// Owning cluster id
    pub parent_id: Option<String>,
    pub node_ids: Vec<String>,
}

// =============================================================================
// Capacity
// =============================================================================

/// An allocation pool of capacity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoragePool {
    /// CIM InstanceID
    pub id: String,
    pub name: String,
    pub system_id: Option<String>,
    pub pool_type: Option<String>,
    pub total_space_mb: Option<f64>,
    pub available_space_mb: Option<f64>,
    pub unexported_space_mb: Option<f64>,
    pub parent_pool_id: Option<String>,
    pub child_pool_ids: Vec<String>,
    /// Member logical volume ids
    pub lvm_ids: Vec<String>,
}

/// A physical disk extent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalVolume {
    /// Container storage system id
    pub container_id: String,
    pub device_id: String,
    pub name: Option<String>,
    pub size_mb: Option<f64>,
    pub status: String,
}

/// A provisioned storage volume
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogicalVolume {
    /// Container storage system id
    pub container_id: String,
    pub object_id: String,
    pub name: Option<String>,
    pub size_mb: Option<f64>,
    pub free_space_mb: Option<f64>,
    pub used_space_mb: Option<f64>,
    pub status: String,
    pub pool_id: Option<String>,
}

// =============================================================================
// Connectivity
// =============================================================================

/// A fibre-channel port on a storage system or switch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FcPort {
    /// Port id or index
    pub id: String,
    pub wwn: Option<String>,
    pub name: Option<String>,
    /// Owning system or switch id
    pub container_id: Option<String>,
    pub status: String,
    pub state: String,
    pub speed_gbps: Option<f64>,
    pub max_speed_gbps: Option<f64>,
    pub port_type: String,
}

/// A SAN fabric
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageFabric {
    pub name: String,
    pub wwn: String,
}

/// A fibre-channel switch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FcSwitch {
    pub wwn: String,
    pub name: String,
    pub ip: Option<String>,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub os_version: Option<String>,
    pub status: String,
    pub fabric_wwn: Option<String>,
}

/// A host-side HBA known to the array through masking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEndPoint {
    pub wwn: String,
    /// Host name as recorded by the array
    pub name: Option<String>,
    pub ip: Option<String>,
    pub port_index: Option<String>,
}

/// A masking relation exposing a volume to a host endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LunMaskingMappingView {
    /// Remote endpoint WWN
    pub endpoint_id: String,
    /// Logical volume object id
    pub volume_id: String,
    pub lun: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_serializes_camel_case() {
        let pool = StoragePool {
            id: "P1".into(),
            name: "pool".into(),
            child_pool_ids: vec!["P2".into()],
            lvm_ids: vec!["V1".into()],
            ..Default::default()
        };

        let json = serde_json::to_value(&pool).unwrap();
        assert_eq!(json["childPoolIds"][0], "P2");
        assert_eq!(json["lvmIds"][0], "V1");
        assert!(json["parentPoolId"].is_null());
    }
}
