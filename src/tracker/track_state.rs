use serde::{Deserialize, Serialize};

/// Lifecycle status of a tracker slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackStatus {
    /// Free slot, or a slot seeded with its first measurement
    #[default]
    Prepare,
    /// Seeded; the next matched frame initialises the estimator
    Init,
    /// Estimator running
    Run,
}

/// Why a tracker went back to `Prepare`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetireReason {
    /// No region matched this frame
    Unmatched,
    /// Time since the previous update exceeded the bound
    TemporalGap,
    /// Lost a merge tie-break on judgement
    MergedLowerJudgement,
    /// Lost a merge tie-break on age
    MergedOlder,
    /// Forced by `clear_all`
    Cleared,
}
