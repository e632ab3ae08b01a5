//! LUN Masking Resolution
//!
//! A masking view is never exposed as one class. It is reassembled from four
//! identifier spaces:
//!
//! 1. controller to volume, carrying the LUN (`ProtocolControllerForUnit`)
//! 2. privilege to controller (`AuthorizedTarget`)
//! 3. privilege to hardware id (`AuthorizedSubject`)
//! 4. hardware id to WWN (`StorageHardwareID`)
//!
//! Any hop that fails to resolve drops the view silently.

use crate::cim::property::{property_str, property_u64};
use crate::cim::value::CimInstance;
use crate::domain::model::LunMaskingMappingView;
use crate::domain::ports::CimClient;
use crate::error::Result;
use crate::smis::cimv2::endpoint::ID_TYPE_PORT_WWN;
use crate::smis::discoverer::{query_optional, SmisDiscoverer};
use crate::smis::links::{children_by_parent, endpoint_id, LinkSpec};
use async_trait::async_trait;
use indexmap::{IndexMap, IndexSet};
use tracing::debug;

/// Class names of the four masking hops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskingSpec {
    pub controller_for_unit: &'static str,
    pub authorized_target: &'static str,
    pub authorized_subject: &'static str,
    pub hardware_id: &'static str,
}

impl MaskingSpec {
    pub const fn new(
        controller_for_unit: &'static str,
        authorized_target: &'static str,
        authorized_subject: &'static str,
        hardware_id: &'static str,
    ) -> Self {
        Self {
            controller_for_unit,
            authorized_target,
            authorized_subject,
            hardware_id,
        }
    }

    pub const fn cimv2() -> Self {
        Self::new(
            "CIM_ProtocolControllerForUnit",
            "CIM_AuthorizedTarget",
            "CIM_AuthorizedSubject",
            "CIM_StorageHardwareID",
        )
    }

    fn target_link(&self) -> LinkSpec {
        LinkSpec::new(self.authorized_target, "Privilege", "InstanceID", "TargetElement", "DeviceID")
    }

    fn subject_link(&self) -> LinkSpec {
        LinkSpec::new(self.authorized_subject, "Privilege", "InstanceID", "PrivilegedElement", "InstanceID")
    }
}

impl Default for MaskingSpec {
    fn default() -> Self {
        Self::cimv2()
    }
}

/// Volume exposed through a controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExposedUnit {
    pub volume_id: String,
    pub lun: Option<String>,
}

/// Everything the join needs besides the controller-for-unit rows
#[derive(Debug, Clone, Default)]
pub struct MaskingContext {
    /// Privilege id to controller ids
    pub targets: IndexMap<String, Vec<String>>,
    /// Privilege id to hardware-id instance ids
    pub subjects: IndexMap<String, Vec<String>>,
    /// Hardware-id instance id to endpoint WWN
    pub wwns: IndexMap<String, String>,
}

impl MaskingContext {
    pub fn from_instances(
        spec: &MaskingSpec,
        targets: &[CimInstance],
        subjects: &[CimInstance],
        hardware_ids: &[CimInstance],
    ) -> Self {
        let wwns = hardware_ids
            .iter()
            .filter(|i| {
                i.property_value("IDType").is_none()
                    || property_u64(i, "IDType") == Some(ID_TYPE_PORT_WWN)
            })
            .filter_map(|i| {
                let instance_id = property_str(i, "InstanceID")?;
                let storage_id = property_str(i, "StorageID")?;
                Some((instance_id, endpoint_id(&storage_id)))
            })
            .collect();

        Self {
            targets: children_by_parent(&spec.target_link().pairs(targets)),
            subjects: children_by_parent(&spec.subject_link().pairs(subjects)),
            wwns,
        }
    }
}

/// Controller id to the units it exposes
pub fn exposed_units(instances: &[CimInstance]) -> IndexMap<String, Vec<ExposedUnit>> {
    let mut units: IndexMap<String, Vec<ExposedUnit>> = IndexMap::new();

    for instance in instances {
        let controller = instance.reference_key("Antecedent", "DeviceID");
        let volume = instance.reference_key("Dependent", "DeviceID");
        let (Some(controller), Some(volume_id)) = (controller, volume) else {
            debug!("Dropping {} row without controller or volume", instance.class_name);
            continue;
        };

        units.entry(controller).or_default().push(ExposedUnit {
            volume_id,
            lun: property_str(instance, "DeviceNumber"),
        });
    }

    units
}

/// Join the four hops into masking views
pub fn join_views(
    units: &IndexMap<String, Vec<ExposedUnit>>,
    ctx: &MaskingContext,
) -> Vec<LunMaskingMappingView> {
    let mut views = IndexSet::new();

    for (privilege, controllers) in &ctx.targets {
        let Some(hardware_ids) = ctx.subjects.get(privilege) else {
            continue;
        };
        let endpoints: Vec<&String> = hardware_ids.iter().filter_map(|h| ctx.wwns.get(h)).collect();

        for controller in controllers {
            let Some(exposed) = units.get(controller) else {
                continue;
            };
            for endpoint in &endpoints {
                for unit in exposed {
                    views.insert(LunMaskingMappingView {
                        endpoint_id: (*endpoint).clone(),
                        volume_id: unit.volume_id.clone(),
                        lun: unit.lun.clone(),
                    });
                }
            }
        }
    }

    views.into_iter().collect()
}

#[derive(Debug, Clone)]
pub struct LunMaskingDiscoverer {
    pub spec: MaskingSpec,
    class_names: [&'static str; 1],
}

impl Default for LunMaskingDiscoverer {
    fn default() -> Self {
        Self::new(MaskingSpec::cimv2())
    }
}

impl LunMaskingDiscoverer {
    pub fn new(spec: MaskingSpec) -> Self {
        Self {
            class_names: [spec.controller_for_unit],
            spec,
        }
    }

    pub async fn resolve_context(&self, client: &dyn CimClient) -> Result<MaskingContext> {
        let targets = query_optional(client, self.spec.authorized_target).await?;
        let subjects = query_optional(client, self.spec.authorized_subject).await?;
        let hardware_ids = query_optional(client, self.spec.hardware_id).await?;
        Ok(MaskingContext::from_instances(&self.spec, &targets, &subjects, &hardware_ids))
    }
}

#[async_trait]
impl SmisDiscoverer for LunMaskingDiscoverer {
    type Output = Vec<LunMaskingMappingView>;

    fn class_names(&self) -> &[&'static str] {
        &self.class_names
    }

    /// Masking is a link area; a provider without it yields no views
    async fn discover(&self, client: &dyn CimClient) -> Result<Vec<LunMaskingMappingView>> {
        let rows = query_optional(client, self.spec.controller_for_unit).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ctx = self.resolve_context(client).await?;
        Ok(join_views(&exposed_units(&rows), &ctx))
    }

    fn parse(&self, instances: &[CimInstance]) -> Vec<LunMaskingMappingView> {
        join_views(&exposed_units(instances), &MaskingContext::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cim::snapshot::SnapshotClient;
    use crate::cim::value::ObjectPath;

    fn controller(id: &str) -> ObjectPath {
        ObjectPath::new("CIM_SCSIProtocolController").with_key("DeviceID", id)
    }

    fn privilege(id: &str) -> ObjectPath {
        ObjectPath::new("CIM_AuthorizedPrivilege").with_key("InstanceID", id)
    }

    fn hwid(id: &str) -> ObjectPath {
        ObjectPath::new("CIM_StorageHardwareID").with_key("InstanceID", id)
    }

    fn unit(ctrl: &str, volume: &str, lun: u64) -> CimInstance {
        CimInstance::new("CIM_ProtocolControllerForUnit")
            .with("Antecedent", controller(ctrl))
            .with("Dependent", ObjectPath::new("CIM_StorageVolume").with_key("DeviceID", volume))
            .with("DeviceNumber", lun)
    }

    fn masking_client() -> SnapshotClient {
        SnapshotClient::new("root/cimv2")
            .with_class(
                "CIM_ProtocolControllerForUnit",
                vec![unit("SPC-1", "V1", 0), unit("SPC-1", "V2", 1), unit("SPC-9", "V9", 5)],
            )
            .with_class(
                "CIM_AuthorizedTarget",
                vec![
                    CimInstance::new("CIM_AuthorizedTarget")
                        .with("Privilege", privilege("PRIV-1"))
                        .with("TargetElement", controller("SPC-1")),
                    CimInstance::new("CIM_AuthorizedTarget")
                        .with("Privilege", privilege("PRIV-2"))
                        .with("TargetElement", controller("SPC-1")),
                ],
            )
            .with_class(
                "CIM_AuthorizedSubject",
                vec![
                    CimInstance::new("CIM_AuthorizedSubject")
                        .with("Privilege", privilege("PRIV-1"))
                        .with("PrivilegedElement", hwid("HW-1")),
                    CimInstance::new("CIM_AuthorizedSubject")
                        .with("Privilege", privilege("PRIV-2"))
                        .with("PrivilegedElement", hwid("HW-1")),
                    CimInstance::new("CIM_AuthorizedSubject")
                        .with("Privilege", privilege("PRIV-1"))
                        .with("PrivilegedElement", hwid("HW-UNKNOWN")),
                ],
            )
            .with_class(
                "CIM_StorageHardwareID",
                vec![CimInstance::new("CIM_StorageHardwareID")
                    .with("InstanceID", "HW-1")
                    .with("StorageID", "21:00:00:24:ff:3d:7a:10")
                    .with("IDType", ID_TYPE_PORT_WWN)],
            )
    }

    #[tokio::test]
    async fn test_four_way_join_resolves_views() {
        let views = LunMaskingDiscoverer::default()
            .discover(&masking_client())
            .await
            .unwrap();

        // Duplicate privileges collapse; unresolved controller and hardware id drop out
        assert_eq!(
            views,
            vec![
                LunMaskingMappingView {
                    endpoint_id: "21000024FF3D7A10".into(),
                    volume_id: "V1".into(),
                    lun: Some("0".into()),
                },
                LunMaskingMappingView {
                    endpoint_id: "21000024FF3D7A10".into(),
                    volume_id: "V2".into(),
                    lun: Some("1".into()),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_masking_classes_yield_no_views() {
        let client = SnapshotClient::new("root/cimv2");
        let views = LunMaskingDiscoverer::default().discover(&client).await.unwrap();
        assert!(views.is_empty());
    }

    #[test]
    fn test_parse_without_context_drops_everything() {
        assert!(LunMaskingDiscoverer::default().parse(&[unit("SPC-1", "V1", 0)]).is_empty());
    }
}
