//! Error types for the Tier Staking program.
//!
//! This module defines all custom error codes that can be returned by the program.
//! Variants are grouped by failure kind; [`StakingError::kind`] exposes the grouping.
//!
//! ## Error Kinds
//! - Validation: malformed input, rejected before any mutation
//! - Authorization: caller is not allowed to act on the target
//! - State: the order or account is not in a state that permits the operation
//! - Solvency: the reserve ratio would be (or is) violated
//! - Transfer: the token vault failed to move funds as requested

use anchor_lang::prelude::*;

/// Custom error codes for the Tier Staking program.
///
/// Error codes start at 6000 (Anchor's custom error offset).
#[error_code]
pub enum StakingError {
    // ========== Validation Errors ==========
    /// New stakes are currently disabled by the authority.
    #[msg("Staking is currently disabled")]
    StakingDisabled,

    /// The specified tier is not in the catalog.
    #[msg("Invalid staking tier specified (must be 0..=4)")]
    InvalidTier,

    /// Cannot stake or fund with zero amount.
    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    /// Stake amount is above the accepted range.
    #[msg("Amount exceeds the maximum accepted stake")]
    AmountTooLarge,

    /// The order id was never issued, or belongs to another pool.
    #[msg("Stake order not found")]
    OrderNotFound,

    /// The investor already holds the maximum number of orders.
    #[msg("Investor order limit reached")]
    TooManyOrders,

    /// The per-claim payout cap must be non-zero.
    #[msg("Per-claim cap must be greater than zero")]
    ZeroClaimCap,

    /// Recipient is not a valid destination for this transfer.
    #[msg("Invalid transfer recipient")]
    InvalidRecipient,

    /// There is nothing above outstanding principal to withdraw.
    #[msg("No surplus available to withdraw")]
    NoSurplus,

    /// Timestamp is out of the accepted range.
    #[msg("Invalid timestamp detected")]
    InvalidTimestamp,

    /// Arithmetic overflow occurred during calculation.
    #[msg("Arithmetic overflow occurred during calculation")]
    MathOverflow,

    // ========== Authorization Errors ==========
    /// Caller is not the pool authority.
    #[msg("Unauthorized: caller is not the pool authority")]
    Unauthorized,

    /// Caller does not own the stake order.
    #[msg("Unauthorized: caller does not own this stake order")]
    NotOrderOwner,

    /// Caller is not the pending authority.
    #[msg("Unauthorized: caller is not the pending authority")]
    NotPendingAuthority,

    // ========== State Errors ==========
    /// The order has already been closed.
    #[msg("Stake order already claimed")]
    AlreadyClaimed,

    /// The lock period of the order has not ended.
    #[msg("Lock period has not ended")]
    LockPeriodNotEnded,

    /// The investor claimed too recently.
    #[msg("Claim cooldown has not elapsed")]
    ClaimCooldownActive,

    /// No reward has accrued on the order.
    #[msg("No rewards available to claim")]
    NoRewardsAvailable,

    /// Emergency exit is only available while reserves are insufficient.
    #[msg("Reserves are sufficient - emergency withdrawal not available")]
    ReservesSufficient,

    /// A mutating operation is already in progress.
    #[msg("Operation already in progress")]
    Reentrancy,

    // ========== Solvency Errors ==========
    /// Vault reserves would fall below the required ratio.
    #[msg("Insufficient reserves to honor obligations")]
    InsufficientReserves,

    // ========== Transfer Errors ==========
    /// Token transfer failed.
    #[msg("Token transfer failed")]
    TransferFailed,

    /// Vault balance moved by an unexpected amount.
    #[msg("Unexpected vault balance change after transfer")]
    UnexpectedTransferDelta,
}

/// Failure taxonomy of the staking engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authorization,
    State,
    Solvency,
    Transfer,
}

impl StakingError {
    pub fn kind(&self) -> ErrorKind {
        use StakingError::*;
        match self {
            StakingDisabled | InvalidTier | ZeroAmount | AmountTooLarge | OrderNotFound
            | TooManyOrders | ZeroClaimCap | InvalidRecipient | NoSurplus | InvalidTimestamp
            | MathOverflow => ErrorKind::Validation,
            Unauthorized | NotOrderOwner | NotPendingAuthority => ErrorKind::Authorization,
            AlreadyClaimed | LockPeriodNotEnded | ClaimCooldownActive | NoRewardsAvailable
            | ReservesSufficient | Reentrancy => ErrorKind::State,
            InsufficientReserves => ErrorKind::Solvency,
            TransferFailed | UnexpectedTransferDelta => ErrorKind::Transfer,
        }
    }
}
