//! Instruction handlers for the Tier Staking program.
//!
//! This module contains all instruction implementations.

pub mod admin;
pub mod claim;
pub mod emergency_withdraw;
pub mod fund_vault;
pub mod initialize;
pub mod settle;
pub mod stake;
pub mod unstake;
pub mod views;

pub use admin::*;
pub use claim::*;
pub use emergency_withdraw::*;
pub use fund_vault::*;
pub use initialize::*;
pub use settle::*;
pub use stake::*;
pub use unstake::*;
pub use views::*;
