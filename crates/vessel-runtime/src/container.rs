//! Container specification and persisted record types.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use vessel_common::types::{ContainerId, ContainerState, PortMapping, ResourceLimits, VolumeSpec};

/// Everything `run` needs to admit a new container.
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    /// Image reference to materialize the root filesystem from.
    pub image: String,
    /// Argument vector of the container's main process.
    pub command: Vec<String>,
    /// Bind-mount requests, applied in order.
    pub volumes: Vec<VolumeSpec>,
    /// Published ports.
    pub ports: Vec<PortMapping>,
    /// Resource ceilings for the container's cgroup scope.
    pub limits: ResourceLimits,
}

/// The persisted record of one container, written as the last step of a
/// successful creation and deleted as the last step of `stop`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerRecord {
    /// Unique identifier; namespace for all derived resource names.
    pub id: ContainerId,
    /// Image the root filesystem was prepared from.
    pub image: String,
    /// Argument vector of the main process.
    pub command: Vec<String>,
    /// Bind mounts applied at bootstrap.
    pub volumes: Vec<VolumeSpec>,
    /// Published ports; each produced one DNAT rule.
    pub ports: Vec<PortMapping>,
    /// Address assigned to the container's interface.
    pub address: Ipv4Addr,
    /// Host-visible pid of the main process; meaningful only while
    /// running.
    pub pid: u32,
    /// Last recorded lifecycle state.
    pub state: ContainerState,
    /// Resource ceilings applied to the cgroup scope.
    pub limits: ResourceLimits,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl ContainerRecord {
    /// Returns whether the recorded pid still refers to a live process.
    #[must_use]
    pub fn pid_alive(&self) -> bool {
        let Ok(pid) = i32::try_from(self.pid) else {
            return false;
        };
        nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), None).is_ok()
    }

    /// The state to report to users: a record that still claims `Running`
    /// but whose process has exited (an unsupervised death) is reported
    /// as stopped.
    #[must_use]
    pub fn effective_state(&self) -> ContainerState {
        if self.state == ContainerState::Running && !self.pid_alive() {
            return ContainerState::Stopped;
        }
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(state: ContainerState, pid: u32) -> ContainerRecord {
        ContainerRecord {
            id: ContainerId::new("test"),
            image: "alpine".into(),
            command: vec!["sh".into()],
            volumes: Vec::new(),
            ports: Vec::new(),
            address: Ipv4Addr::new(10, 67, 0, 2),
            pid,
            state,
            limits: ResourceLimits::default(),
            created_at: String::new(),
        }
    }

    #[test]
    fn running_record_with_dead_pid_reports_stopped() {
        // Pid values above the kernel's pid_max are never live.
        let r = record(ContainerState::Running, 0x7fff_fff0);
        assert_eq!(r.effective_state(), ContainerState::Stopped);
    }

    #[test]
    fn stopped_record_stays_stopped() {
        let r = record(ContainerState::Stopped, std::process::id());
        assert_eq!(r.effective_state(), ContainerState::Stopped);
    }

    #[test]
    fn running_record_with_live_pid_reports_running() {
        let r = record(ContainerState::Running, std::process::id());
        assert_eq!(r.effective_state(), ContainerState::Running);
    }
}
