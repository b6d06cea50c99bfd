//! Stake sizing for the seven staking strategies.

mod stake_sizer;

pub use stake_sizer::{payout_for_sum, StakeSizer};
