use slotmap::new_key_type;

use crate::domain::assignment::ResourceAssignment;
use crate::domain::ids::{DemandId, NodeId};

new_key_type! {
    /// Generation-checked handle into the session's lightpath store.
    pub struct LightpathId;
}

/// Which of a protected lightpath's two assignments currently carries traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePath {
    Primary,
    Backup,
}

/// Operational lifecycle state of a lightpath.
///
/// Transitions: `Provisioning -> Up(primary) <-> Up(backup) -> Down`, with
/// `Rerouting` as the transient state while restoration searches for a new
/// route. `Removed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightpathState {
    /// Resources are being selected; no spectrum is committed yet.
    Provisioning,

    /// The lightpath carries its provisioned rate on the tagged assignment.
    Up { active: ActivePath },

    /// Restoration is searching for a replacement route after a failure.
    Rerouting,

    /// No assignment is currently usable; carried traffic is zero.
    Down,

    /// The lightpath has been removed and its resources released.
    Removed,
}

/// A live end-to-end optical connection owning one primary assignment and,
/// when 1+1 protection is configured, one spectrum-disjoint backup.
#[derive(Debug, Clone)]
pub struct Lightpath {
    pub demand: DemandId,
    pub ingress: NodeId,
    pub egress: NodeId,
    pub line_rate_gbps: f64,

    /// Index into the transponder catalog's priority-ordered type list.
    pub transponder_index: usize,

    pub primary: ResourceAssignment,
    pub backup: Option<ResourceAssignment>,
    pub state: LightpathState,

    /// False once a failed restoration has released the spectrum of
    /// `primary`; the assignment value is kept as a record only.
    pub holds_spectrum: bool,
}

impl Lightpath {
    /// The assignment currently selected to carry traffic, if the lightpath
    /// is up.
    pub fn active_assignment(&self) -> Option<&ResourceAssignment> {
        match self.state {
            LightpathState::Up { active: ActivePath::Primary } => Some(&self.primary),
            LightpathState::Up { active: ActivePath::Backup } => self.backup.as_ref(),
            _ => None,
        }
    }

    pub fn is_up(&self) -> bool {
        matches!(self.state, LightpathState::Up { .. })
    }

    /// Carried traffic equals the provisioned rate while up, zero otherwise.
    pub fn carried_gbps(&self) -> f64 {
        if self.is_up() { self.line_rate_gbps } else { 0.0 }
    }
}
