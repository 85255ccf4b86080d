//! End-to-end integration tests for the Vessel runtime.
//!
//! Everything here runs unprivileged: the tests exercise the record
//! store, name derivation, address allocation, rollback behavior, and
//! the engine's error paths against scratch directories. Paths that need
//! real namespaces, cgroupfs, or iptables are covered by unit tests of
//! their pure logic instead.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashSet;
use std::net::Ipv4Addr;

use vessel_common::config::RuntimeConfig;
use vessel_common::types::{
    ContainerId, ContainerState, PortMapping, ResourceLimits, VolumeSpec,
};
use vessel_runtime::container::{ContainerRecord, ContainerSpec};
use vessel_runtime::engine::Engine;
use vessel_runtime::state::StateStore;
use vessel_runtime::{ipalloc, names, RuntimeError};

fn record(id: &str, address: Ipv4Addr, state: ContainerState, pid: u32) -> ContainerRecord {
    ContainerRecord {
        id: ContainerId::new(id),
        image: "alpine".into(),
        command: vec!["echo".into(), "hi".into()],
        volumes: vec!["/srv/data:/data".parse::<VolumeSpec>().expect("volume")],
        ports: vec![PortMapping {
            host_port: 8080,
            container_port: 80,
        }],
        address,
        pid,
        state,
        limits: ResourceLimits::default(),
        created_at: chrono::Utc::now().to_rfc3339(),
    }
}

// ── Record store ─────────────────────────────────────────────────────

#[test]
fn record_round_trip_preserves_identity_fields() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = StateStore::open(dir.path()).expect("open");
    let original = record("rt-1", Ipv4Addr::new(10, 67, 0, 2), ContainerState::Running, 99);
    store.save(&original).expect("save");

    let loaded = store.load(&original.id).expect("load");
    assert_eq!(loaded.id, original.id);
    assert_eq!(loaded.image, original.image);
    assert_eq!(loaded.command, original.command);
    assert_eq!(loaded.volumes, original.volumes);
    assert_eq!(loaded.ports, original.ports);
}

#[test]
fn records_survive_a_store_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    {
        let store = StateStore::open(dir.path()).expect("open");
        store
            .save(&record("persist", Ipv4Addr::new(10, 67, 0, 5), ContainerState::Running, 7))
            .expect("save");
    }
    // A fresh store over the same directory models an orchestrator restart.
    let reopened = StateStore::open(dir.path()).expect("reopen");
    let records = reopened.list().expect("list");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id.as_str(), "persist");
}

#[test]
fn delete_then_delete_again_is_silent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = StateStore::open(dir.path()).expect("open");
    let r = record("twice", Ipv4Addr::new(10, 67, 0, 9), ContainerState::Running, 7);
    store.save(&r).expect("save");

    store.delete(&r.id).expect("first delete");
    store.delete(&r.id).expect("second delete");
    assert!(store.list().expect("list").is_empty());
}

// ── Derived names ────────────────────────────────────────────────────

#[test]
fn derived_names_are_stable_and_unique_across_ids() {
    let mut veths = HashSet::new();
    let mut hostnames = HashSet::new();
    for _ in 0..64 {
        let id = ContainerId::generate();
        assert!(veths.insert(names::veth_host(&id)), "veth name collision");
        assert!(hostnames.insert(names::hostname(&id)), "hostname collision");
    }
}

#[test]
fn veth_names_respect_kernel_length_limit() {
    for _ in 0..16 {
        let id = ContainerId::generate();
        assert!(names::veth_host(&id).len() <= 15);
        assert!(names::veth_peer(&id).len() <= 15);
    }
}

// ── Address allocation ───────────────────────────────────────────────

#[test]
fn addresses_of_running_containers_are_never_reissued() {
    let subnet = Ipv4Addr::new(10, 67, 0, 0);
    let mut used = HashSet::new();
    let mut handed_out = Vec::new();
    for _ in 0..10 {
        let addr = ipalloc::allocate(subnet, 24, &used).expect("pool not exhausted");
        assert!(!handed_out.contains(&addr), "duplicate address");
        handed_out.push(addr);
        let _ = used.insert(addr);
    }
}

#[test]
fn address_freed_by_a_stopped_container_is_reusable() {
    let subnet = Ipv4Addr::new(10, 67, 0, 0);
    let mut used: HashSet<_> = [Ipv4Addr::new(10, 67, 0, 2)].into_iter().collect();
    let second = ipalloc::allocate(subnet, 24, &used).expect("allocate");
    assert_eq!(second, Ipv4Addr::new(10, 67, 0, 3));

    let _ = used.remove(&Ipv4Addr::new(10, 67, 0, 2));
    let reused = ipalloc::allocate(subnet, 24, &used).expect("allocate after free");
    assert_eq!(reused, Ipv4Addr::new(10, 67, 0, 2));
}

// ── Engine error paths ───────────────────────────────────────────────

fn scratch_engine() -> (tempfile::TempDir, Engine) {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = RuntimeConfig::with_data_dir(dir.path());
    let engine = Engine::with_config(config).expect("engine");
    (dir, engine)
}

#[test]
fn listing_a_fresh_runtime_shows_nothing() {
    let (_dir, engine) = scratch_engine();
    assert!(engine.list().expect("list").is_empty());
}

#[test]
fn stop_and_exec_on_unknown_ids_report_not_found() {
    let (_dir, engine) = scratch_engine();
    let ghost = ContainerId::new("no-such-container");
    assert!(matches!(
        engine.stop(&ghost),
        Err(RuntimeError::NotFound { .. })
    ));
    assert!(matches!(
        engine.exec(&ghost, &["ls".into()]),
        Err(RuntimeError::NotFound { .. })
    ));
}

#[test]
fn exec_on_a_dead_container_reports_not_found() {
    let (dir, engine) = scratch_engine();
    let store = StateStore::open(dir.path().join("containers")).expect("store");
    // A record whose pid can no longer exist.
    let dead = record(
        "dead",
        Ipv4Addr::new(10, 67, 0, 2),
        ContainerState::Running,
        0x7fff_fff0,
    );
    store.save(&dead).expect("save");

    assert!(matches!(
        engine.exec(&dead.id, &["ls".into()]),
        Err(RuntimeError::NotFound { .. })
    ));
}

#[test]
fn failed_create_leaves_no_container_state_behind() {
    let (dir, engine) = scratch_engine();
    let spec = ContainerSpec {
        image: "never-pulled".into(),
        command: vec!["true".into()],
        volumes: Vec::new(),
        ports: Vec::new(),
        limits: ResourceLimits::default(),
    };
    assert!(matches!(
        engine.create(&spec),
        Err(RuntimeError::ImagePreparation { .. })
    ));
    assert!(engine.list().expect("list").is_empty());
    let leftovers = std::fs::read_dir(dir.path().join("containers"))
        .expect("containers dir")
        .count();
    assert_eq!(leftovers, 0);
}

// ── Effective state ──────────────────────────────────────────────────

#[test]
fn unsupervised_death_is_reported_as_stopped() {
    let (dir, engine) = scratch_engine();
    let store = StateStore::open(dir.path().join("containers")).expect("store");
    store
        .save(&record(
            "zombie",
            Ipv4Addr::new(10, 67, 0, 2),
            ContainerState::Running,
            0x7fff_fff0,
        ))
        .expect("save");

    let records = engine.list().expect("list");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].effective_state(), ContainerState::Stopped);
}

#[test]
fn a_live_pid_keeps_the_record_running() {
    let (dir, engine) = scratch_engine();
    let store = StateStore::open(dir.path().join("containers")).expect("store");
    store
        .save(&record(
            "alive",
            Ipv4Addr::new(10, 67, 0, 2),
            ContainerState::Running,
            std::process::id(),
        ))
        .expect("save");

    let records = engine.list().expect("list");
    assert_eq!(records[0].effective_state(), ContainerState::Running);
}

// ── Image layout validation ──────────────────────────────────────────

#[test]
fn complete_oci_layout_passes_validation() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("index.json"), "{}").expect("index");
    std::fs::write(dir.path().join("oci-layout"), "{}").expect("marker");
    std::fs::create_dir_all(dir.path().join("blobs/sha256")).expect("blobs");
    vessel_image::store::validate_layout(dir.path()).expect("valid layout");
}

#[test]
fn layout_missing_the_marker_file_fails_validation() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("index.json"), "{}").expect("index");
    std::fs::create_dir_all(dir.path().join("blobs/sha256")).expect("blobs");
    assert!(vessel_image::store::validate_layout(dir.path()).is_err());
}
