//! Operation vocabulary shared by the router, the bridge adapters and off-chain tooling.

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use core::fmt;
use scale_info::TypeInfo;
use serde::{Deserialize, Serialize};

/// Chain identifier as used by the message bridge.
pub type ChainId = u64;

/// Four-byte function selector carried by bridged calls.
pub type Selector = [u8; 4];

/// Selector of the router's `resume` entry point.
pub const RESUME_SELECTOR: Selector = *b"rsme";

/// Primitive step of a complex operation.
///
/// Each code has a fixed wire symbol and a fixed parameter schema; sequences of codes are the
/// keys of the operation registry.
#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  Hash,
  MaxEncodedLen,
  Ord,
  PartialEq,
  PartialOrd,
  TypeInfo,
  Serialize,
  Deserialize,
)]
pub enum OpCode {
  /// `P`: token permit for the router
  Permit,
  /// `LM`: lock on the origin chain, mint a synthetic on the destination
  LockMint,
  /// `BU`: burn a synthetic, unlock the original on its home chain
  BurnUnlock,
  /// `BM`: burn a synthetic, mint the synthetic of another chain
  BurnMint,
  /// `!U`: compensate a lock by unlocking it back
  EmergencyUnlock,
  /// `!M`: compensate a burn by minting it back
  EmergencyMint,
  /// `W`: wrap the native currency
  Wrap,
  /// `Uw`: unwrap into the native currency
  Unwrap,
  /// `S`: pool swap
  Swap,
  /// `A`: add liquidity
  AddLiquidity,
  /// `R`: remove liquidity
  RemoveLiquidity,
}

impl OpCode {
  pub const fn symbol(&self) -> &'static str {
    match self {
      OpCode::Permit => "P",
      OpCode::LockMint => "LM",
      OpCode::BurnUnlock => "BU",
      OpCode::BurnMint => "BM",
      OpCode::EmergencyUnlock => "!U",
      OpCode::EmergencyMint => "!M",
      OpCode::Wrap => "W",
      OpCode::Unwrap => "Uw",
      OpCode::Swap => "S",
      OpCode::AddLiquidity => "A",
      OpCode::RemoveLiquidity => "R",
    }
  }

  /// Steps whose second half runs on another chain.
  pub fn is_chain_crossing(&self) -> bool {
    matches!(
      self,
      OpCode::LockMint | OpCode::BurnUnlock | OpCode::BurnMint
    )
  }

  pub fn is_emergency(&self) -> bool {
    matches!(self, OpCode::EmergencyUnlock | OpCode::EmergencyMint)
  }

  /// Codes a `resume` may start from.
  pub fn is_continuation(&self) -> bool {
    self.is_chain_crossing() || self.is_emergency()
  }

  /// Chain-crossing codes an emergency code compensates.
  pub fn compensates(&self) -> &'static [OpCode] {
    match self {
      OpCode::EmergencyUnlock => &[OpCode::LockMint],
      OpCode::EmergencyMint => &[OpCode::BurnUnlock, OpCode::BurnMint],
      _ => &[],
    }
  }
}

impl fmt::Display for OpCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.symbol())
  }
}

/// Displays a sequence as its joined symbols, e.g. `LMS`.
pub struct OpSequence<'a>(pub &'a [OpCode]);

impl fmt::Display for OpSequence<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.iter().try_for_each(|code| f.write_str(code.symbol()))
  }
}

/// Resolution of a dispatched cross-chain leg on the chain it targets.
#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Default,
  Encode,
  Eq,
  MaxEncodedLen,
  PartialEq,
  TypeInfo,
  Serialize,
  Deserialize,
)]
pub enum CrossChainOpState {
  #[default]
  Unknown,
  Succeeded,
  Reverted,
}

impl CrossChainOpState {
  pub fn is_terminal(&self) -> bool {
    !matches!(self, CrossChainOpState::Unknown)
  }
}

/// How far a `start` or `resume` call got on the current chain.
#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  MaxEncodedLen,
  PartialEq,
  TypeInfo,
  Serialize,
  Deserialize,
)]
pub enum ExecutionResult {
  /// Every remaining step ran locally
  Completed,
  /// The remainder was handed to the bridge
  Dispatched,
}
