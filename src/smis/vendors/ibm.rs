//! IBM SAN Volume Controller Binding
//!
//! SVC models the array as a cluster of nodes grouped into I/O groups. The
//! cluster exposes its address and code level as plain properties, and nodes
//! carry their WWNN directly.

use crate::cim::property::{normalize_wwn, property_str, required_str};
use crate::cim::value::CimInstance;
use crate::domain::model::{FcSwitch, IoGroup, StorageFabric, StorageProcessor, StorageSystem};
use crate::domain::ports::CimClient;
use crate::error::{ParseError, Result};
use crate::smis::cimv2::{
    EndPointToVolumeDiscoverer, FcPortDiscoverer, FreeSpace, LogicalVolumeDiscoverer,
    LunMaskingDiscoverer, MaskingSpec, PhysicalVolumeDiscoverer, PhysicalVolumeToPoolDiscoverer,
    ProcessorContext, RemoteEndpointDiscoverer, StoragePoolDiscoverer,
    StorageProcessorDiscoverer, StorageSystemDiscoverer,
};
use crate::smis::discoverer::{parse_each, query_classes, NoopDiscoverer, SmisDiscoverer};
use crate::smis::links::{children_by_parent, parents_by_child, LinkSpec, PoolMembershipSpec};
use crate::smis::namespace::{SmisNamespace, Vendor};
use crate::smis::registry::DiscovererRegistry;
use async_trait::async_trait;
use indexmap::IndexMap;

pub const VENDOR_NAME: &str = "IBM";

const POOL_LINKS: &[&str] = &["IBMTSSVC_AllocatedFromStoragePool"];

// =============================================================================
// Cluster
// =============================================================================

#[derive(Debug, Clone)]
pub struct IbmClusterDiscoverer {
    base: StorageSystemDiscoverer,
}

impl Default for IbmClusterDiscoverer {
    fn default() -> Self {
        Self {
            base: StorageSystemDiscoverer::new(vec!["IBMTSSVC_Cluster"]),
        }
    }
}

impl IbmClusterDiscoverer {
    pub fn parse_cluster(&self, instance: &CimInstance) -> std::result::Result<StorageSystem, ParseError> {
        let mut system = self.base.parse_system(instance)?;

        if let Some(ip) = property_str(instance, "ConsoleIP") {
            system.ip = Some(strip_port(&ip));
        }
        if let Some(level) = property_str(instance, "CodeLevel") {
            system.os_version = Some(level);
        }
        system.vendor.get_or_insert_with(|| VENDOR_NAME.to_string());

        Ok(system)
    }
}

/// Drop a `:port` suffix from `host:port` or `[v6]:port`; bare IPv6 is kept
fn strip_port(address: &str) -> String {
    let address = address.trim();
    if let Some(rest) = address.strip_prefix('[') {
        if let Some((host, _)) = rest.split_once(']') {
            return host.to_string();
        }
    }
    match address.split_once(':') {
        Some((host, port)) if !port.contains(':') => host.to_string(),
        _ => address.to_string(),
    }
}

impl SmisDiscoverer for IbmClusterDiscoverer {
    type Output = Vec<StorageSystem>;

    fn class_names(&self) -> &[&'static str] {
        self.base.class_names()
    }

    fn parse(&self, instances: &[CimInstance]) -> Vec<StorageSystem> {
        parse_each(instances, |inst| self.parse_cluster(inst))
    }
}

// =============================================================================
// Nodes
// =============================================================================

#[derive(Debug, Clone)]
pub struct IbmNodeDiscoverer {
    base: StorageProcessorDiscoverer,
}

impl Default for IbmNodeDiscoverer {
    fn default() -> Self {
        Self {
            base: StorageProcessorDiscoverer::new(
                vec!["IBMTSSVC_Node"],
                LinkSpec::component("IBMTSSVC_NodeComponentOfCluster", "Name", "Name"),
            ),
        }
    }
}

impl IbmNodeDiscoverer {
    pub fn parse_node(
        &self,
        instance: &CimInstance,
        ctx: &ProcessorContext,
    ) -> std::result::Result<StorageProcessor, ParseError> {
        let mut node = self.base.parse_processor(instance, ctx)?;

        if let Some(wwnn) = property_str(instance, "WWNN").and_then(|w| normalize_wwn(&w)) {
            node.node_wwn = Some(wwnn);
        }
        if node.ip.is_none() {
            node.ip = property_str(instance, "IPAddress");
        }

        Ok(node)
    }
}

#[async_trait]
impl SmisDiscoverer for IbmNodeDiscoverer {
    type Output = Vec<StorageProcessor>;

    fn class_names(&self) -> &[&'static str] {
        self.base.class_names()
    }

    async fn discover(&self, client: &dyn CimClient) -> Result<Vec<StorageProcessor>> {
        let instances = query_classes(client, self.base.class_names()).await?;
        let ctx = self.base.resolve_context(client).await?;
        Ok(parse_each(&instances, |inst| self.parse_node(inst, &ctx)))
    }

    fn parse(&self, instances: &[CimInstance]) -> Vec<StorageProcessor> {
        let ctx = ProcessorContext::default();
        parse_each(instances, |inst| self.parse_node(inst, &ctx))
    }
}

// =============================================================================
// I/O Groups
// =============================================================================

/// Node membership and owning cluster of each I/O group
#[derive(Debug, Clone, Default)]
pub struct IoGroupContext {
    pub nodes: IndexMap<String, Vec<String>>,
    pub clusters: IndexMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct IoGroupDiscoverer {
    pub class_names: Vec<&'static str>,
    /// Parent is the I/O group, child the node
    pub node_link: LinkSpec,
    /// Parent is the cluster, child the I/O group
    pub cluster_link: LinkSpec,
}

impl Default for IoGroupDiscoverer {
    fn default() -> Self {
        Self {
            class_names: vec!["IBMTSSVC_IOGroup"],
            node_link: LinkSpec::component("IBMTSSVC_NodeComponentOfIOGroup", "InstanceID", "Name"),
            cluster_link: LinkSpec::component("IBMTSSVC_IOGroupComponentOfCluster", "Name", "InstanceID"),
        }
    }
}

impl IoGroupDiscoverer {
    pub fn parse_group(
        &self,
        instance: &CimInstance,
        ctx: &IoGroupContext,
    ) -> std::result::Result<IoGroup, ParseError> {
        let id = required_str(instance, "InstanceID")?;

        Ok(IoGroup {
            name: property_str(instance, "ElementName").unwrap_or_else(|| id.clone()),
            parent_id: ctx.clusters.get(&id).cloned(),
            node_ids: ctx.nodes.get(&id).cloned().unwrap_or_default(),
            id,
        })
    }
}

#[async_trait]
impl SmisDiscoverer for IoGroupDiscoverer {
    type Output = Vec<IoGroup>;

    fn class_names(&self) -> &[&'static str] {
        &self.class_names
    }

    async fn discover(&self, client: &dyn CimClient) -> Result<Vec<IoGroup>> {
        let instances = query_classes(client, &self.class_names).await?;
        let ctx = IoGroupContext {
            nodes: children_by_parent(&self.node_link.query(client).await?),
            clusters: parents_by_child(&self.cluster_link.query(client).await?),
        };
        Ok(parse_each(&instances, |inst| self.parse_group(inst, &ctx)))
    }

    fn parse(&self, instances: &[CimInstance]) -> Vec<IoGroup> {
        let ctx = IoGroupContext::default();
        parse_each(instances, |inst| self.parse_group(inst, &ctx))
    }
}

// =============================================================================
// Namespace
// =============================================================================

#[derive(Debug, Clone)]
pub struct IbmNamespace {
    namespace: String,
}

impl IbmNamespace {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

impl SmisNamespace for IbmNamespace {
    fn vendor(&self) -> Vendor {
        Vendor::Ibm
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn associate_discoverers(&self, registry: &mut DiscovererRegistry) -> Result<()> {
        registry.register(IbmClusterDiscoverer::default())?;
        registry.register(IbmNodeDiscoverer::default())?;
        registry.register(StoragePoolDiscoverer::new(
            vec!["IBMTSSVC_ConcreteStoragePool"],
            PoolMembershipSpec::new(POOL_LINKS.to_vec()),
            Some(LinkSpec::component("IBMTSSVC_HostedStoragePool", "Name", "InstanceID")),
        ))?;
        registry.register(PhysicalVolumeDiscoverer::new(vec!["IBMTSSVC_BackendVolume"]))?;
        registry.register(
            LogicalVolumeDiscoverer::new(vec!["IBMTSSVC_StorageVolume"], FreeSpace::ConsumableBlocks)
                .with_membership(PoolMembershipSpec::new(POOL_LINKS.to_vec())),
        )?;
        registry.register(FcPortDiscoverer::new(vec!["IBMTSSVC_FCPort"]))?;
        registry.register(NoopDiscoverer::<Vec<StorageFabric>>::new())?;
        registry.register(NoopDiscoverer::<Vec<FcSwitch>>::new())?;
        registry.register(RemoteEndpointDiscoverer::new(vec!["IBMTSSVC_StorageHardwareID"]))?;
        registry.register(LunMaskingDiscoverer::new(MaskingSpec::new(
            "IBMTSSVC_ProtocolControllerForUnit",
            "IBMTSSVC_AuthorizedTarget",
            "IBMTSSVC_AuthorizedSubject",
            "IBMTSSVC_StorageHardwareID",
        )))?;
        registry.register(EndPointToVolumeDiscoverer::new("IBMTSSVC_SAPAvailableForElement"))?;
        registry.register(PhysicalVolumeToPoolDiscoverer::new("IBMTSSVC_ConcreteComponent"))?;
        registry.register(IoGroupDiscoverer::default())?;
        Ok(())
    }
}
