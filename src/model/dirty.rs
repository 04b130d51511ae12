//! Tri-state dirty indicator and the modification state callers observe.

/// Per-resource dirty marker. Absence (`None` in a cache lookup) is
/// treated as [`DirtyIndicator::Recompute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyIndicator {
    IsDirty,
    NotDirty,
    Recompute,
}

/// What a caller observes when asking about a resource's modification
/// state; `Unknown` means the caller should recompute by inspecting
/// children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModificationState {
    Dirty,
    Clean,
    Unknown,
}

impl DirtyIndicator {
    pub fn to_modification_state(self) -> ModificationState {
        match self {
            DirtyIndicator::IsDirty => ModificationState::Dirty,
            DirtyIndicator::NotDirty => ModificationState::Clean,
            DirtyIndicator::Recompute => ModificationState::Unknown,
        }
    }
}
