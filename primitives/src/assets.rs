use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use serde::{Deserialize, Serialize};

use crate::ecosystem::Balance;

/// Token identity as seen by a single chain.
///
/// The same variant can denote different tokens on different chains; a token is globally
/// identified by the pair `(AssetKind, home ChainId)`, which is what crosses the bridge.
///
/// - `Native`: The chain's native currency (managed by pallet-balances).
/// - `Local(u32)`: Tokens issued on this chain, including synthetic representations.
/// - `Foreign(u32)`: Tokens registered from elsewhere through an external registry.
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
  Ord,
  PartialEq,
  PartialOrd,
  TypeInfo,
  Serialize,
  Deserialize,
)]
pub enum AssetKind {
  /// Native token managed by pallet-balances
  #[default]
  Native,
  /// Local asset managed by pallet-assets
  Local(u32),
  /// Foreign asset managed by pallet-assets
  Foreign(u32),
}

impl From<u32> for AssetKind {
  fn from(asset_id: u32) -> Self {
    AssetKind::Local(asset_id)
  }
}

impl AssetKind {
  /// Underlying pallet-assets id, if any.
  pub fn local_id(&self) -> Option<u32> {
    match self {
      AssetKind::Local(id) | AssetKind::Foreign(id) => Some(*id),
      AssetKind::Native => None,
    }
  }
}

/// Identifier of a liquidity pool behind the pool adapter.
pub type PoolId = u32;

/// Whitelist entry for a token on the current chain.
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
pub struct TokenState {
  /// Smallest amount a chain-crossing step may move
  pub min_amount: Balance,
  /// Largest amount a chain-crossing step may move
  pub max_amount: Balance,
  /// Bridge fee in basis points of `FEE_DENOMINATOR`
  pub bridge_fee_bps: u32,
  pub enabled: bool,
}

impl TokenState {
  pub fn accepts(&self, amount: Balance) -> bool {
    self.enabled && amount >= self.min_amount && amount <= self.max_amount
  }
}
