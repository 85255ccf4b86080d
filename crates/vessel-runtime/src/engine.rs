//! The lifecycle orchestrator.
//!
//! Sequences rootfs preparation, namespaced spawn, cgroup attachment,
//! network wiring, port publication, and record persistence for `create`;
//! implements `stop` as four best-effort teardown steps that converge
//! under retry; and attaches extra commands to live containers for
//! `exec`.

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::time::Duration;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

use vessel_common::config::RuntimeConfig;
use vessel_common::constants::CONTAINER_IFACE;
use vessel_common::types::{ContainerId, ContainerState};
use vessel_core::cgroup::CgroupScope;
use vessel_core::network::{bridge, interface_exists, nat, veth};
use vessel_core::CoreError;
use vessel_image::{unpack, ImageStore};

use crate::container::{ContainerRecord, ContainerSpec};
use crate::error::{Result, RuntimeError};
use crate::rollback::Rollback;
use crate::state::StateStore;
use crate::{exec, ipalloc, names, process};

/// A container that has been admitted: spawned, limited, wired, and
/// persisted. Its main process keeps running after this value is
/// returned.
#[derive(Debug)]
pub struct CreatedContainer {
    /// The new container's id.
    pub id: ContainerId,
    /// Host-visible pid of the main process.
    pub pid: u32,
    /// Address assigned to the container's interface.
    pub address: Ipv4Addr,
}

/// The runtime engine coordinating all container operations.
pub struct Engine {
    config: RuntimeConfig,
    store: StateStore,
    images: ImageStore,
}

impl Engine {
    /// Creates an engine with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the state or image directories cannot be
    /// created.
    pub fn new() -> Result<Self> {
        Self::with_config(RuntimeConfig::default())
    }

    /// Creates an engine from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the state or image directories cannot be
    /// created.
    pub fn with_config(config: RuntimeConfig) -> Result<Self> {
        let store = StateStore::open(config.containers_dir())?;
        let images = ImageStore::open(config.images_dir())?;
        Ok(Self {
            config,
            store,
            images,
        })
    }

    /// The engine's configuration.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The engine's image store.
    #[must_use]
    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    /// Creates a container and returns once it is admitted and running.
    ///
    /// Steps, in order: generate the id, materialize the rootfs, spawn
    /// container-init inside fresh namespaces, create the cgroup scope
    /// and attach the child's pid, ensure the shared bridge and
    /// masquerade rule, allocate a unique address and wire the veth pair,
    /// install one DNAT rule per published port, persist the record.
    ///
    /// Every completed per-container step registers a compensating
    /// action; any failure unwinds them in reverse so no cgroup, veth
    /// pair, NAT rule, or record survives a failed create. The shared
    /// bridge and masquerade rule are host-wide and are never rolled
    /// back.
    ///
    /// # Errors
    ///
    /// Propagates the first failing step, classified per layer
    /// (image preparation, spawn, resource controller, network setup,
    /// port mapping).
    pub fn create(&self, spec: &ContainerSpec) -> Result<CreatedContainer> {
        let id = ContainerId::generate();
        let veth_host = names::veth_host(&id);
        let veth_peer = names::veth_peer(&id);
        if interface_exists(&veth_host) {
            return Err(RuntimeError::NameCollision { name: veth_host });
        }

        tracing::info!(id = %id, image = %spec.image, "creating container");
        let mut rollback = Rollback::new();

        let bundle = self.config.bundle_dir(&id);
        let _rootfs = unpack::prepare_rootfs(&self.images, &spec.image, &bundle)?;
        {
            let dir = self.config.container_dir(&id);
            rollback.push("remove container directory", move || {
                std::fs::remove_dir_all(&dir).map_err(|e| RuntimeError::Io {
                    path: dir.clone(),
                    source: e,
                })
            });
        }

        let pid = process::spawn_container_init(&id, &spec.command, &spec.volumes)?;
        let raw_pid = pid.as_raw();
        let pid_u32 = u32::try_from(raw_pid).map_err(|_| RuntimeError::Spawn {
            source: CoreError::InvalidArgument {
                message: format!("clone returned pid {raw_pid}"),
            },
        })?;
        rollback.push("kill container process", move || {
            let _ = kill(pid, Signal::SIGKILL);
            process::reap(pid);
            Ok(())
        });

        let scope_name = names::cgroup_scope(&id);
        let scope = CgroupScope::create(&scope_name, &spec.limits)?;
        scope.add_process(pid_u32)?;
        {
            let scope_name = scope_name.clone();
            rollback.push("destroy cgroup scope", move || {
                // The unwind reaches this before the kill action; the
                // scope only deletes once its member is gone.
                let _ = kill(pid, Signal::SIGKILL);
                process::reap(pid);
                destroy_cgroup_with_retry(&scope_name).map_err(Into::into)
            });
        }

        bridge::ensure_bridge(
            &self.config.bridge,
            self.config.gateway,
            self.config.subnet_prefix_len,
        )?;
        nat::ensure_masquerade(self.config.subnet, self.config.subnet_prefix_len)?;

        let address = ipalloc::allocate(
            self.config.subnet,
            self.config.subnet_prefix_len,
            &self.used_addresses()?,
        )?;
        let attachment = veth::Attachment {
            bridge: self.config.bridge.clone(),
            host_veth: veth_host.clone(),
            container_iface: CONTAINER_IFACE.to_owned(),
            address,
            prefix_len: self.config.subnet_prefix_len,
            gateway: self.config.gateway,
        };
        veth::attach(raw_pid, &attachment, &veth_peer)?;
        {
            let veth_host = veth_host.clone();
            rollback.push("remove veth pair", move || {
                veth::teardown(&veth_host).map_err(Into::into)
            });
        }

        for mapping in &spec.ports {
            nat::install_port_mapping(mapping.host_port, address, mapping.container_port)?;
            let mapping = *mapping;
            rollback.push("remove port mapping", move || {
                nat::remove_port_mapping(mapping.host_port, address, mapping.container_port)
                    .map_err(Into::into)
            });
        }

        let record = ContainerRecord {
            id: id.clone(),
            image: spec.image.clone(),
            command: spec.command.clone(),
            volumes: spec.volumes.clone(),
            ports: spec.ports.clone(),
            address,
            pid: pid_u32,
            state: ContainerState::Running,
            limits: spec.limits,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        self.store.save(&record)?;

        rollback.disarm();
        tracing::info!(id = %id, pid = raw_pid, %address, "container admitted");
        Ok(CreatedContainer {
            id,
            pid: pid_u32,
            address,
        })
    }

    /// Waits for the container's main process to exit and publishes the
    /// outcome into its record.
    ///
    /// Only the process that spawned the container can supervise it; the
    /// CLI calls this right after [`Engine::create`] unless running
    /// detached.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::NotFound`] for an unknown id, or a wait
    /// failure.
    pub fn supervise(&self, id: &ContainerId) -> Result<i32> {
        let record = self.store.load(id)?;
        let pid = pid_from_record(&record)?;
        let code = process::wait_for_exit(pid)?;
        tracing::info!(id = %id, code, "container main process exited");

        // The record may have been removed by a concurrent stop.
        match self.store.load(id) {
            Ok(mut current) => {
                current.state = ContainerState::Stopped;
                self.store.save(&current)?;
            }
            Err(RuntimeError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }
        Ok(code)
    }

    /// Stops a container: kill the process, delete the cgroup scope,
    /// tear down the veth pair and DNAT rules, remove the record and
    /// state directory.
    ///
    /// All four steps are attempted even if earlier ones fail; the first
    /// failure is reported. Every step tolerates already-absent
    /// resources, so retrying a partially-stopped container converges.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::NotFound`] for an unknown id, otherwise
    /// the first hard failure among the teardown steps.
    pub fn stop(&self, id: &ContainerId) -> Result<()> {
        let record = self.store.load(id)?;
        tracing::info!(id = %id, pid = record.pid, "stopping container");
        let mut first_failure: Option<RuntimeError> = None;

        if let Ok(raw_pid) = i32::try_from(record.pid) {
            let pid = Pid::from_raw(raw_pid);
            match kill(pid, Signal::SIGKILL) {
                Ok(()) => process::reap(pid),
                Err(nix::errno::Errno::ESRCH) => {}
                Err(e) => note_failure(
                    &mut first_failure,
                    "kill process",
                    RuntimeError::Signal {
                        pid: record.pid,
                        source: e,
                    },
                ),
            }
        }

        if let Err(e) = destroy_cgroup_with_retry(&names::cgroup_scope(id)) {
            note_failure(&mut first_failure, "destroy cgroup scope", e.into());
        }

        if let Err(e) = veth::teardown(&names::veth_host(id)) {
            note_failure(&mut first_failure, "remove veth pair", e.into());
        }
        for mapping in &record.ports {
            if let Err(e) =
                nat::remove_port_mapping(mapping.host_port, record.address, mapping.container_port)
            {
                note_failure(&mut first_failure, "remove port mapping", e.into());
            }
        }

        if let Err(e) = self.store.delete(id) {
            note_failure(&mut first_failure, "remove container state", e);
        }

        match first_failure {
            None => {
                tracing::info!(id = %id, "container stopped");
                Ok(())
            }
            Some(e) => Err(e),
        }
    }

    /// Runs an additional command inside a running container,
    /// propagating its exit status.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::NotFound`] if the id is unknown or the
    /// container's main process is no longer alive.
    pub fn exec(&self, id: &ContainerId, command: &[String]) -> Result<i32> {
        let record = self.store.load(id)?;
        if !record.pid_alive() {
            return Err(RuntimeError::NotFound { id: id.to_string() });
        }
        let pid = pid_from_record(&record)?;
        let rootfs = self.config.rootfs_dir(id);
        exec::exec_in_container(pid.as_raw(), &rootfs, command)
    }

    /// Loads every container record.
    ///
    /// # Errors
    ///
    /// Returns an error if the state directory cannot be read.
    pub fn list(&self) -> Result<Vec<ContainerRecord>> {
        self.store.list()
    }

    /// Addresses currently held by live containers.
    fn used_addresses(&self) -> Result<HashSet<Ipv4Addr>> {
        Ok(self
            .store
            .list()?
            .iter()
            .filter(|r| r.effective_state() == ContainerState::Running)
            .map(|r| r.address)
            .collect())
    }
}

fn pid_from_record(record: &ContainerRecord) -> Result<Pid> {
    i32::try_from(record.pid)
        .map(Pid::from_raw)
        .map_err(|_| RuntimeError::NotFound {
            id: record.id.to_string(),
        })
}

fn note_failure(first: &mut Option<RuntimeError>, step: &str, error: RuntimeError) {
    tracing::warn!(step, error = %error, "stop step failed, continuing");
    if first.is_none() {
        *first = Some(error);
    }
}

/// Deletes a cgroup scope, retrying briefly while the kernel still
/// counts the just-killed member process.
fn destroy_cgroup_with_retry(scope_name: &str) -> vessel_core::Result<()> {
    let scope = CgroupScope::open(scope_name);
    for _ in 0..20 {
        match scope.destroy() {
            Err(CoreError::ResourceBusy { .. }) => {
                std::thread::sleep(Duration::from_millis(50));
            }
            other => return other,
        }
    }
    scope.destroy()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_engine() -> (tempfile::TempDir, Engine) {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = RuntimeConfig::with_data_dir(dir.path());
        let engine = Engine::with_config(config).expect("engine");
        (dir, engine)
    }

    #[test]
    fn fresh_engine_lists_no_containers() {
        let (_dir, engine) = test_engine();
        assert!(engine.list().expect("list").is_empty());
    }

    #[test]
    fn stop_unknown_container_is_not_found() {
        let (_dir, engine) = test_engine();
        assert!(matches!(
            engine.stop(&ContainerId::new("ghost")),
            Err(RuntimeError::NotFound { .. })
        ));
    }

    #[test]
    fn exec_unknown_container_is_not_found() {
        let (_dir, engine) = test_engine();
        assert!(matches!(
            engine.exec(&ContainerId::new("ghost"), &["ls".into()]),
            Err(RuntimeError::NotFound { .. })
        ));
    }

    #[test]
    fn create_with_unpulled_image_fails_and_leaves_no_state() {
        let (dir, engine) = test_engine();
        let spec = ContainerSpec {
            image: "no-such-image".into(),
            command: vec!["true".into()],
            volumes: Vec::new(),
            ports: Vec::new(),
            limits: vessel_common::types::ResourceLimits::default(),
        };
        assert!(matches!(
            engine.create(&spec),
            Err(RuntimeError::ImagePreparation { .. })
        ));

        // Rollback completeness: nothing persisted for the failed id.
        assert!(engine.list().expect("list").is_empty());
        let containers = std::fs::read_dir(dir.path().join("containers"))
            .expect("containers dir")
            .count();
        assert_eq!(containers, 0);
    }
}
