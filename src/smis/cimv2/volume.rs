//! Logical and Physical Volume Discovery
//!
//! Sizes are reported in blocks; every capacity is converted to megabytes as
//! `blocks × BlockSize`. Vendors disagree on how free space is exposed, so
//! the free-space source is a per-vendor choice ([`FreeSpace`]).

use crate::cim::property::{
    blocks_to_mb, bytes_to_mb, first_property_str, instance_status, property_f64, property_str,
    property_u64, required_str, strict_u64,
};
use crate::cim::value::CimInstance;
use crate::domain::model::{LogicalVolume, PhysicalVolume};
use crate::domain::ports::CimClient;
use crate::error::{ParseError, Result};
use crate::smis::discoverer::{parse_each, query_classes, SmisDiscoverer};
use crate::smis::links::{PoolMembership, PoolMembershipSpec};
use async_trait::async_trait;

// =============================================================================
// Free Space Strategy
// =============================================================================

/// Where a vendor reports unused capacity of a volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeSpace {
    /// `ConsumableBlocks × BlockSize`
    ConsumableBlocks,
    /// Size minus a used-blocks property
    SizeMinusUsed(&'static str),
    /// A property already expressed in bytes
    RemainingBytes(&'static str),
}

/// Capacity figures of one volume, in MB
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VolumeSpace {
    pub size_mb: Option<f64>,
    pub free_mb: Option<f64>,
    pub used_mb: Option<f64>,
}

impl FreeSpace {
    /// Compute capacity; a malformed numeric only blanks the figure it feeds
    pub fn compute(&self, instance: &CimInstance) -> VolumeSpace {
        let block_size = property_u64(instance, "BlockSize");
        let size_mb = blocks_to_mb(property_u64(instance, "NumberOfBlocks"), block_size);

        let (free_mb, used_mb) = match *self {
            FreeSpace::ConsumableBlocks => {
                let free = blocks_to_mb(property_u64(instance, "ConsumableBlocks"), block_size);
                (free, difference(size_mb, free))
            }
            FreeSpace::SizeMinusUsed(used_property) => {
                let used = blocks_to_mb(property_u64(instance, used_property), block_size);
                (difference(size_mb, used), used)
            }
            FreeSpace::RemainingBytes(property) => {
                let free = property_f64(instance, property).map(bytes_to_mb);
                (free, difference(size_mb, free))
            }
        };

        VolumeSpace {
            size_mb,
            free_mb,
            used_mb,
        }
    }
}

fn difference(total: Option<f64>, part: Option<f64>) -> Option<f64> {
    Some((total? - part?).max(0.0))
}

// =============================================================================
// Logical Volume Discoverer
// =============================================================================

#[derive(Debug, Clone)]
pub struct LogicalVolumeDiscoverer {
    pub class_names: Vec<&'static str>,
    pub free_space: FreeSpace,
    /// Pool membership used to set each volume's owning pool
    pub membership: Option<PoolMembershipSpec>,
}

impl Default for LogicalVolumeDiscoverer {
    fn default() -> Self {
        Self {
            class_names: vec!["CIM_StorageVolume"],
            free_space: FreeSpace::ConsumableBlocks,
            membership: Some(PoolMembershipSpec::new(vec!["CIM_AllocatedFromStoragePool"])),
        }
    }
}

impl LogicalVolumeDiscoverer {
    pub fn new(class_names: Vec<&'static str>, free_space: FreeSpace) -> Self {
        Self {
            class_names,
            free_space,
            membership: None,
        }
    }

    pub fn with_membership(mut self, membership: PoolMembershipSpec) -> Self {
        self.membership = Some(membership);
        self
    }

    pub fn parse_volume(
        &self,
        instance: &CimInstance,
        membership: &PoolMembership,
    ) -> std::result::Result<LogicalVolume, ParseError> {
        let object_id = required_str(instance, "DeviceID")?;
        let container_id = required_str(instance, "SystemName")?;
        let space = self.free_space.compute(instance);

        Ok(LogicalVolume {
            container_id,
            name: first_property_str(instance, &["ElementName", "Name"]),
            size_mb: space.size_mb,
            free_space_mb: space.free_mb,
            used_space_mb: space.used_mb,
            status: instance_status(instance),
            pool_id: membership.pool_of_volume(&object_id),
            object_id,
        })
    }

    pub fn parse_with(&self, instances: &[CimInstance], membership: &PoolMembership) -> Vec<LogicalVolume> {
        parse_each(instances, |inst| self.parse_volume(inst, membership))
    }
}

#[async_trait]
impl SmisDiscoverer for LogicalVolumeDiscoverer {
    type Output = Vec<LogicalVolume>;

    fn class_names(&self) -> &[&'static str] {
        &self.class_names
    }

    async fn discover(&self, client: &dyn CimClient) -> Result<Vec<LogicalVolume>> {
        let instances = query_classes(client, &self.class_names).await?;
        let membership = match &self.membership {
            Some(spec) => PoolMembership::collect(client, spec).await?,
            None => PoolMembership::default(),
        };
        Ok(self.parse_with(&instances, &membership))
    }

    fn parse(&self, instances: &[CimInstance]) -> Vec<LogicalVolume> {
        self.parse_with(instances, &PoolMembership::default())
    }
}

// =============================================================================
// Physical Volume Discoverer
// =============================================================================

#[derive(Debug, Clone)]
pub struct PhysicalVolumeDiscoverer {
    pub class_names: Vec<&'static str>,
}

impl Default for PhysicalVolumeDiscoverer {
    fn default() -> Self {
        Self::new(vec!["CIM_StorageExtent"])
    }
}

impl PhysicalVolumeDiscoverer {
    pub fn new(class_names: Vec<&'static str>) -> Self {
        Self { class_names }
    }

    pub fn parse_extent(&self, instance: &CimInstance) -> std::result::Result<PhysicalVolume, ParseError> {
        let device_id = required_str(instance, "DeviceID")?;
        let container_id = required_str(instance, "SystemName")?;
        let size_mb = blocks_to_mb(
            strict_u64(instance, "NumberOfBlocks")?,
            strict_u64(instance, "BlockSize")?,
        );

        Ok(PhysicalVolume {
            container_id,
            name: property_str(instance, "ElementName"),
            size_mb,
            status: instance_status(instance),
            device_id,
        })
    }
}

impl SmisDiscoverer for PhysicalVolumeDiscoverer {
    type Output = Vec<PhysicalVolume>;

    fn class_names(&self) -> &[&'static str] {
        &self.class_names
    }

    fn parse(&self, instances: &[CimInstance]) -> Vec<PhysicalVolume> {
        parse_each(instances, |inst| self.parse_extent(inst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cim::snapshot::SnapshotClient;
    use crate::cim::value::ObjectPath;

    fn volume(id: &str) -> CimInstance {
        CimInstance::new("CIM_StorageVolume")
            .with("DeviceID", id)
            .with("SystemName", "ARRAY")
            .with("BlockSize", 512u64)
            .with("NumberOfBlocks", 4096u64)
            .with("OperationalStatus", vec![2u64])
    }

    #[test]
    fn test_free_space_from_consumable_blocks() {
        let inst = volume("V1").with("ConsumableBlocks", 2048u64);
        let parsed = LogicalVolumeDiscoverer::default()
            .parse_volume(&inst, &PoolMembership::default())
            .unwrap();

        assert!((parsed.free_space_mb.unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(parsed.size_mb, Some(2.0));
        assert_eq!(parsed.used_space_mb, Some(1.0));
        assert_eq!(parsed.status, "OK");
    }

    #[test]
    fn test_non_numeric_consumable_blocks_keeps_size() {
        let inst = volume("V1").with("ConsumableBlocks", "n/a");
        let parsed = LogicalVolumeDiscoverer::default()
            .parse_volume(&inst, &PoolMembership::default())
            .unwrap();

        assert_eq!(parsed.free_space_mb, None);
        assert_eq!(parsed.size_mb, Some(2.0));
    }

    #[test]
    fn test_size_minus_used_and_remaining_bytes() {
        let inst = volume("V1")
            .with("ProvisionedConsumableBlocks", 1024u64)
            .with("RemainingManagedSpace", 1024u64 * 1024 * 3 / 2);

        let used = FreeSpace::SizeMinusUsed("ProvisionedConsumableBlocks").compute(&inst);
        assert_eq!(used.used_mb, Some(0.5));
        assert_eq!(used.free_mb, Some(1.5));

        let remaining = FreeSpace::RemainingBytes("RemainingManagedSpace").compute(&inst);
        assert_eq!(remaining.free_mb, Some(1.5));
        assert_eq!(remaining.used_mb, Some(0.5));
    }

    #[test]
    fn test_volumes_without_identity_are_skipped() {
        let instances = vec![
            volume("V1"),
            CimInstance::new("CIM_StorageVolume").with("SystemName", "ARRAY"),
            volume("V3"),
        ];
        let volumes = LogicalVolumeDiscoverer::default().parse(&instances);

        let ids: Vec<_> = volumes.iter().map(|v| v.object_id.as_str()).collect();
        assert_eq!(ids, vec!["V1", "V3"]);
    }

    #[tokio::test]
    async fn test_volume_pool_from_membership() {
        let client = SnapshotClient::new("root/cimv2")
            .with_class("CIM_StorageVolume", vec![volume("V1"), volume("V2")])
            .with_class(
                "CIM_AllocatedFromStoragePool",
                vec![CimInstance::new("CIM_AllocatedFromStoragePool")
                    .with("Antecedent", ObjectPath::new("CIM_StoragePool").with_key("InstanceID", "P"))
                    .with("Dependent", ObjectPath::new("CIM_StorageVolume").with_key("DeviceID", "V2"))],
            );

        let volumes = LogicalVolumeDiscoverer::default().discover(&client).await.unwrap();
        assert_eq!(volumes[0].pool_id, None);
        assert_eq!(volumes[1].pool_id.as_deref(), Some("P"));
    }

    #[test]
    fn test_physical_extent_with_bad_block_count_is_skipped() {
        let good = CimInstance::new("CIM_StorageExtent")
            .with("DeviceID", "D1")
            .with("SystemName", "ARRAY")
            .with("BlockSize", 512u64)
            .with("NumberOfBlocks", 2048u64);
        let bad = CimInstance::new("CIM_StorageExtent")
            .with("DeviceID", "D2")
            .with("SystemName", "ARRAY")
            .with("NumberOfBlocks", "garbage");

        let extents = PhysicalVolumeDiscoverer::default().parse(&[good, bad]);
        assert_eq!(extents.len(), 1);
        assert_eq!(extents[0].size_mb, Some(1.0));
    }
}
