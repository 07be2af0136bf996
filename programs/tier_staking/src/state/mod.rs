//! State structures for the Tier Staking program.
//!
//! This module defines all account structures used to store program state.

pub mod investor;
pub mod order;
pub mod pool_catalog;
pub mod stake_pool;

pub use investor::*;
pub use order::*;
pub use pool_catalog::*;
pub use stake_pool::*;
