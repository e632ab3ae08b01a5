//! Benchmark for instance parsing and full discovery runs
//!
//! Target: 100K volume instances/sec through the parse boundary

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use smis_topology::cim::{CimInstance, ObjectPath, SnapshotClient};
use smis_topology::smis::cimv2::{Cimv2Namespace, FcPortDiscoverer, LogicalVolumeDiscoverer};
use smis_topology::smis::SmisDiscoverer;
use smis_topology::{discover_topology, GraphReporter, RegistryConfig, TopologyReporter};

fn volumes(count: usize) -> Vec<CimInstance> {
    (0..count)
        .map(|i| {
            CimInstance::new("CIM_StorageVolume")
                .with("DeviceID", format!("{:05}", i))
                .with("SystemName", "ARRAY-01")
                .with("ElementName", format!("vol-{}", i))
                .with("BlockSize", 512u64)
                .with("NumberOfBlocks", 2_097_152u64)
                .with("ConsumableBlocks", 1_048_576u64)
                .with("OperationalStatus", vec![2u64])
        })
        .collect()
}

fn ports(count: usize) -> Vec<CimInstance> {
    (0..count)
        .map(|i| {
            CimInstance::new("CIM_FCPort")
                .with("DeviceID", format!("FC{}", i))
                .with("SystemName", "ARRAY-01")
                .with("PermanentAddress", format!("50:06:0e:80:10:49:{:02x}:{:02x}", i / 256 % 256, i % 256))
                .with("Speed", 8_000_000_000u64)
                .with("PortType", 15u64)
                .with("OperationalStatus", vec![2u64])
        })
        .collect()
}

fn snapshot(volume_count: usize) -> SnapshotClient {
    let memberships = (0..volume_count)
        .map(|i| {
            CimInstance::new("CIM_AllocatedFromStoragePool")
                .with("Antecedent", ObjectPath::new("CIM_StoragePool").with_key("InstanceID", "POOL-0"))
                .with("Dependent", ObjectPath::new("CIM_StorageVolume").with_key("DeviceID", format!("{:05}", i)))
        })
        .collect();

    SnapshotClient::new("root/cimv2")
        .missing_as_empty()
        .with_class(
            "CIM_ComputerSystem",
            vec![CimInstance::new("CIM_ComputerSystem")
                .with("Name", "ARRAY-01")
                .with("OperationalStatus", vec![2u64])],
        )
        .with_class(
            "CIM_StoragePool",
            vec![CimInstance::new("CIM_StoragePool")
                .with("InstanceID", "POOL-0")
                .with("ElementName", "pool0")
                .with("TotalManagedSpace", 1_099_511_627_776u64)],
        )
        .with_class("CIM_StorageVolume", volumes(volume_count))
        .with_class("CIM_AllocatedFromStoragePool", memberships)
        .with_class("CIM_FCPort", ports(16))
}

fn bench_parse_volumes(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    let instances = volumes(10_000);
    group.throughput(Throughput::Elements(instances.len() as u64));

    group.bench_function("logical_volumes_10k", |b| {
        let discoverer = LogicalVolumeDiscoverer::default();
        b.iter(|| discoverer.parse(black_box(&instances)));
    });

    group.finish();
}

fn bench_parse_ports(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    let instances = ports(1_000);
    group.throughput(Throughput::Elements(instances.len() as u64));

    group.bench_function("fc_ports_1k", |b| {
        let discoverer = FcPortDiscoverer::default();
        b.iter(|| discoverer.parse(black_box(&instances)));
    });

    group.finish();
}

fn bench_discovery_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("discovery");
    group.throughput(Throughput::Elements(1));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let client = snapshot(5_000);
    let namespace = Cimv2Namespace::default();

    group.bench_function("cimv2_run_5k_volumes", |b| {
        b.iter(|| {
            runtime
                .block_on(discover_topology(&namespace, &client, RegistryConfig::default()))
                .unwrap()
        });
    });

    let (topology, _) = runtime
        .block_on(discover_topology(&namespace, &client, RegistryConfig::default()))
        .unwrap();

    group.bench_function("graph_5k_volumes", |b| {
        let reporter = GraphReporter::new();
        b.iter(|| reporter.report(black_box(&topology)).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_parse_volumes, bench_parse_ports, bench_discovery_run);
criterion_main!(benches);
