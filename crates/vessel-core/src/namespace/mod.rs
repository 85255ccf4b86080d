//! Linux namespace management for container isolation.
//!
//! Containers are born inside fresh namespaces via `clone(2)` (see
//! [`spawn`]); `exec` joins the namespaces of a live container via
//! `setns(2)` (see [`enter`]).

pub mod enter;
pub mod spawn;

use std::path::PathBuf;

use nix::sched::CloneFlags;

/// One kernel namespace kind used by Vessel containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceKind {
    /// Process-id namespace.
    Pid,
    /// Mount namespace.
    Mount,
    /// Network namespace.
    Network,
    /// UTS (hostname) namespace.
    Uts,
}

impl NamespaceKind {
    /// The four namespaces every container gets, in the order they are
    /// joined during `exec` (pid first, so the later fork lands in the
    /// target pid namespace).
    pub const ALL: [Self; 4] = [Self::Pid, Self::Uts, Self::Mount, Self::Network];

    /// Name of this namespace under `/proc/<pid>/ns/`.
    #[must_use]
    pub const fn proc_name(self) -> &'static str {
        match self {
            Self::Pid => "pid",
            Self::Mount => "mnt",
            Self::Network => "net",
            Self::Uts => "uts",
        }
    }

    /// Clone/setns flag bit for this namespace.
    #[must_use]
    pub const fn flag(self) -> CloneFlags {
        match self {
            Self::Pid => CloneFlags::CLONE_NEWPID,
            Self::Mount => CloneFlags::CLONE_NEWNS,
            Self::Network => CloneFlags::CLONE_NEWNET,
            Self::Uts => CloneFlags::CLONE_NEWUTS,
        }
    }
}

/// Path of one namespace of a live process, as seen from the host.
#[must_use]
pub fn ns_path(pid: i32, kind: NamespaceKind) -> PathBuf {
    PathBuf::from(format!("/proc/{pid}/ns/{}", kind.proc_name()))
}

/// Combines the flag bits for a set of namespace kinds.
#[must_use]
pub fn clone_flags(kinds: &[NamespaceKind]) -> CloneFlags {
    kinds
        .iter()
        .fold(CloneFlags::empty(), |acc, kind| acc | kind.flag())
}
