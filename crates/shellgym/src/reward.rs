//! Reward and termination policy.
//!
//! The session core never decides rewards itself; it asks a policy after
//! each observation. The shipped [`ZeroReward`] policy pins reward to 0.0
//! and never terminates, which is the contract agent loops rely on today.

use crate::types::{BashAction, BashObs};

/// Strategy deciding the reward and terminal flag for one step.
pub trait RewardPolicy: Send + Sync {
    /// Judge one (action, observation) pair.
    fn judge(&self, action: &BashAction, obs: &BashObs) -> (f64, bool);
}

/// Default policy: reward 0.0, never done.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroReward;

impl RewardPolicy for ZeroReward {
    fn judge(&self, _action: &BashAction, _obs: &BashObs) -> (f64, bool) {
        (0.0, false)
    }
}
