//! Protocol Constants for the Complex-Operation Router
//!
//! This module centralizes the pallet ids and the protocol parameters shared by every chain
//! running the router, its collaborators and the off-chain fee service.
//!
//! These constants are the single source of truth and are re-used by pallet configurations
//! and tests via the primitives crate.

/// Balance type alias for consistency across the protocol
pub type Balance = u128;

/// Pallet identifiers for deriving pallet-owned accounts.
///
/// Used by `PalletId::into_account_truncating()`; the router account is the same on every
/// chain, which is what makes it usable as its own peer address.
pub mod pallet_ids {
  /// Complex router pallet ID (holds deferred proceeds between steps)
  pub const COMPLEX_ROUTER_PALLET_ID: &[u8; 8] = b"py/cxrtr";
}

/// Protocol parameters.
pub mod params {
  use super::Balance;
  use sp_arithmetic::{Rounding, helpers_128bit::multiply_by_rational_with_rounding};

  /// Precision scalar used by tests and tooling (10^12).
  pub const PRECISION: Balance = 1_000_000_000_000;

  /// Denominator of every basis-point fee (100% = 10_000 bps).
  pub const FEE_DENOMINATOR: Balance = 10_000;

  /// Maximum number of steps in one complex operation.
  ///
  /// Bounded so that a continuation index always fits in a `u8`.
  pub const MAX_OPERATIONS: u32 = 256;

  /// Maximum encoded length of the params of one step.
  pub const MAX_PARAMS_LEN: u32 = 512;

  /// Bridge fee for `amount` at `fee_bps`, rounded down.
  ///
  /// `None` when `fee_bps` exceeds `FEE_DENOMINATOR`: the fee is never more than `amount`.
  pub fn bridge_fee(amount: Balance, fee_bps: u32) -> Option<Balance> {
    let fee_bps = Balance::from(fee_bps);
    if fee_bps > FEE_DENOMINATOR {
      return None;
    }
    multiply_by_rational_with_rounding(amount, fee_bps, FEE_DENOMINATOR, Rounding::Down)
  }
}
