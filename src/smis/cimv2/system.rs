//! Storage System and Processor Discovery
//!
//! Arrays and their controllers are both `CIM_ComputerSystem` subclasses.
//! Identifying metadata (address, WWN, vendor/model/serial) arrives through
//! the parallel `IdentifyingDescriptions` / `OtherIdentifyingInfo` arrays.

use crate::cim::property::{
    first_property_str, identifying_info, instance_status, normalize_wwn, property_str,
    required_str,
};
use crate::cim::value::CimInstance;
use crate::domain::model::{Chassis, StorageProcessor, StorageSystem};
use crate::domain::ports::CimClient;
use crate::error::{ParseError, Result};
use crate::smis::discoverer::{parse_each, query_classes, query_optional, SmisDiscoverer};
use crate::smis::links::{parents_by_child, LinkSpec};
use async_trait::async_trait;
use indexmap::IndexMap;

// =============================================================================
// Identifying Labels
// =============================================================================

pub const LABEL_VENDOR_MODEL_SERIAL: &str = "Vendor+DisplayArrayType+Serial";
pub const LABEL_IPV4: &str = "Ipv4 Address";
pub const LABEL_NODE_WWN: &str = "Node WWN";

/// Vendor, model and serial packed into one `+`-separated identifying value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrayIdentity {
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub serial: Option<String>,
}

impl ArrayIdentity {
    /// Split `"Vendor+Model+Serial"`; anything but three parts yields nothing
    pub fn parse(packed: &str) -> Self {
        let parts: Vec<&str> = packed.split('+').map(str::trim).collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Self::default();
        }

        Self {
            vendor: Some(parts[0].to_string()),
            model: Some(parts[1].to_string()),
            serial: Some(parts[2].to_string()),
        }
    }

    pub fn from_instance(instance: &CimInstance) -> Self {
        identifying_info(instance, LABEL_VENDOR_MODEL_SERIAL)
            .map(|packed| Self::parse(&packed))
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.vendor.is_none() && self.model.is_none() && self.serial.is_none()
    }
}

// =============================================================================
// Storage System Discoverer
// =============================================================================

/// Discovers storage arrays
#[derive(Debug, Clone)]
pub struct StorageSystemDiscoverer {
    pub class_names: Vec<&'static str>,
}

impl Default for StorageSystemDiscoverer {
    fn default() -> Self {
        Self::new(vec!["CIM_ComputerSystem"])
    }
}

impl StorageSystemDiscoverer {
    pub fn new(class_names: Vec<&'static str>) -> Self {
        Self { class_names }
    }

    /// Generic parse shared by every vendor
    pub fn parse_system(&self, instance: &CimInstance) -> std::result::Result<StorageSystem, ParseError> {
        let id = required_str(instance, "Name")?;
        let identity = ArrayIdentity::from_instance(instance);

        Ok(StorageSystem {
            name: property_str(instance, "ElementName").unwrap_or_else(|| id.clone()),
            description: first_property_str(instance, &["Description", "Caption"]),
            ip: identifying_info(instance, LABEL_IPV4),
            vendor: identity.vendor,
            model: identity.model,
            serial: identity.serial,
            os_version: first_property_str(instance, &["FirmwareVersion", "VersionString"]),
            node_wwn: identifying_info(instance, LABEL_NODE_WWN).and_then(|w| normalize_wwn(&w)),
            status: instance_status(instance),
            id,
        })
    }
}

impl SmisDiscoverer for StorageSystemDiscoverer {
    type Output = Vec<StorageSystem>;

    fn class_names(&self) -> &[&'static str] {
        &self.class_names
    }

    fn parse(&self, instances: &[CimInstance]) -> Vec<StorageSystem> {
        parse_each(instances, |inst| self.parse_system(inst))
    }
}

// =============================================================================
// Chassis Resolution
// =============================================================================

/// Physical package class plus the link tying it to a processor
#[derive(Debug, Clone)]
pub struct ChassisSpec {
    pub class_name: &'static str,
    /// Parent is the package (by `Tag`), child is the processor
    pub link: LinkSpec,
}

impl ChassisSpec {
    pub fn cimv2() -> Self {
        Self {
            class_name: "CIM_Chassis",
            link: LinkSpec::new("CIM_ComputerSystemPackage", "Antecedent", "Tag", "Dependent", "Name"),
        }
    }

    /// Processor id to its chassis
    pub async fn resolve(&self, client: &dyn CimClient) -> Result<IndexMap<String, Chassis>> {
        let packages = query_optional(client, self.class_name).await?;
        let chassis_by_tag: IndexMap<String, Chassis> = packages
            .iter()
            .filter_map(parse_chassis)
            .map(|c| (c.tag.clone(), c))
            .collect();

        let pairs = self.link.query(client).await?;
        Ok(pairs
            .into_iter()
            .filter_map(|(tag, processor)| {
                chassis_by_tag.get(&tag).map(|c| (processor, c.clone()))
            })
            .collect())
    }
}

fn parse_chassis(instance: &CimInstance) -> Option<Chassis> {
    Some(Chassis {
        tag: property_str(instance, "Tag")?,
        manufacturer: property_str(instance, "Manufacturer"),
        model: property_str(instance, "Model"),
        serial: property_str(instance, "SerialNumber"),
        version: property_str(instance, "Version"),
    })
}

// =============================================================================
// Storage Processor Discoverer
// =============================================================================

/// Context resolved before processors are parsed
#[derive(Debug, Clone, Default)]
pub struct ProcessorContext {
    /// Processor id to parent system id
    pub parents: IndexMap<String, String>,
    /// Processor id to chassis
    pub chassis: IndexMap<String, Chassis>,
}

/// Discovers controllers, resolving their parent system from a link class
#[derive(Debug, Clone)]
pub struct StorageProcessorDiscoverer {
    pub class_names: Vec<&'static str>,
    /// Parent is the array, child the processor
    pub parent_link: Option<LinkSpec>,
    pub chassis: Option<ChassisSpec>,
}

impl Default for StorageProcessorDiscoverer {
    fn default() -> Self {
        Self {
            class_names: vec!["CIM_StorageProcessorSystem"],
            parent_link: Some(LinkSpec::component("CIM_ComponentCS", "Name", "Name")),
            chassis: Some(ChassisSpec::cimv2()),
        }
    }
}

impl StorageProcessorDiscoverer {
    pub fn new(class_names: Vec<&'static str>, parent_link: LinkSpec) -> Self {
        Self {
            class_names,
            parent_link: Some(parent_link),
            chassis: None,
        }
    }

    pub fn with_chassis(mut self, chassis: ChassisSpec) -> Self {
        self.chassis = Some(chassis);
        self
    }

    /// Run the prerequisite relationship queries
    pub async fn resolve_context(&self, client: &dyn CimClient) -> Result<ProcessorContext> {
        let parents = match &self.parent_link {
            Some(link) => parents_by_child(&link.query(client).await?),
            None => IndexMap::new(),
        };
        let chassis = match &self.chassis {
            Some(spec) => spec.resolve(client).await?,
            None => IndexMap::new(),
        };
        Ok(ProcessorContext { parents, chassis })
    }

    /// Generic parse shared by every vendor
    pub fn parse_processor(
        &self,
        instance: &CimInstance,
        ctx: &ProcessorContext,
    ) -> std::result::Result<StorageProcessor, ParseError> {
        let id = required_str(instance, "Name")?;

        Ok(StorageProcessor {
            name: property_str(instance, "ElementName").unwrap_or_else(|| id.clone()),
            node_wwn: identifying_info(instance, LABEL_NODE_WWN).and_then(|w| normalize_wwn(&w)),
            ip: identifying_info(instance, LABEL_IPV4),
            serial: first_property_str(instance, &["SerialNumber", "Serial"]),
            version: first_property_str(instance, &["FirmwareVersion", "VersionString"]),
            status: instance_status(instance),
            system_id: ctx.parents.get(&id).cloned(),
            chassis: ctx.chassis.get(&id).cloned(),
            id,
        })
    }

    pub fn parse_with(&self, instances: &[CimInstance], ctx: &ProcessorContext) -> Vec<StorageProcessor> {
        parse_each(instances, |inst| self.parse_processor(inst, ctx))
    }
}

#[async_trait]
impl SmisDiscoverer for StorageProcessorDiscoverer {
    type Output = Vec<StorageProcessor>;

    fn class_names(&self) -> &[&'static str] {
        &self.class_names
    }

    async fn discover(&self, client: &dyn CimClient) -> Result<Vec<StorageProcessor>> {
        let instances = query_classes(client, &self.class_names).await?;
        let ctx = self.resolve_context(client).await?;
        Ok(self.parse_with(&instances, &ctx))
    }

    fn parse(&self, instances: &[CimInstance]) -> Vec<StorageProcessor> {
        self.parse_with(instances, &ProcessorContext::default())
    }
}
