use codec::{Decode, DecodeAll, DecodeWithMemTracking, Encode};
use polkadot_sdk::frame_support::pallet_prelude::*;
use polkadot_sdk::sp_core::H256;
use scale_info::prelude::vec::Vec;

// Re-export the shared vocabulary from primitives as the single source of truth
pub use primitives::{
  AssetKind, Balance, ChainId, CrossChainOpState, ExecutionResult, OpCode, PoolId,
  RESUME_SELECTOR, Selector, TokenState,
};

/// Parameters of `P`: a signed allowance granting the router access to `owner`'s tokens.
#[derive(Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo)]
pub struct PermitParams<AccountId> {
  pub token: AssetKind,
  pub owner: AccountId,
  pub amount: Balance,
  /// Unix timestamp after which the permit is void
  pub deadline: u64,
  pub v: u8,
  pub r: H256,
  pub s: H256,
}

/// Parameters shared by the chain-crossing steps `LM`, `BU` and `BM`.
///
/// `from: None` consumes the previous step's output held by the router. `to: None` keeps the
/// proceeds in the router account for the step that follows on the destination chain.
/// Once dispatched, `(token_in, token_in_chain_id_current)` is the canonical identity of the
/// transferred token: the original token and its home chain.
#[derive(Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo)]
pub struct SynthParams<AccountId> {
  pub token_in: AssetKind,
  pub amount_in: Balance,
  pub from: Option<AccountId>,
  pub to: Option<AccountId>,
  pub chain_id_to: ChainId,
  pub token_in_chain_id_current: ChainId,
  /// Receiver of any compensation if the leg never completes
  pub emergency_to: AccountId,
}

/// Parameters of `W` and `Uw`.
#[derive(Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo)]
pub struct WrapParams<AccountId> {
  pub token_in: AssetKind,
  pub amount_in: Balance,
  pub from: Option<AccountId>,
  pub to: Option<AccountId>,
}

/// Parameters of `A` and `R`.
#[derive(Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo)]
pub struct PoolParams<AccountId> {
  pub token_in: AssetKind,
  pub amount_in: Balance,
  pub from: Option<AccountId>,
  pub to: Option<AccountId>,
  pub pool: PoolId,
  pub min_amount_out: Balance,
  /// Index of the pool coin deposited or withdrawn
  pub i: u8,
  pub emergency_to: AccountId,
}

/// Parameters of `S`.
#[derive(Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo)]
pub struct SwapParams<AccountId> {
  pub token_in: AssetKind,
  pub amount_in: Balance,
  pub from: Option<AccountId>,
  pub to: Option<AccountId>,
  pub pool: PoolId,
  pub min_amount_out: Balance,
  pub i: u8,
  pub j: u8,
  pub emergency_to: AccountId,
}

/// Parameters of `!U` and `!M`.
///
/// `emergency_params` and `continuation_digest` must reproduce the started-ops digest recorded
/// by the chain that dispatched `request_id`.
#[derive(Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo)]
pub struct CancelParams<AccountId> {
  pub request_id: H256,
  /// Chain that dispatched the stuck leg
  pub chain_id_to: ChainId,
  /// Crossing params exactly as they were dispatched
  pub emergency_params: SynthParams<AccountId>,
  /// Digest of the ops that followed the stuck leg
  pub continuation_digest: H256,
}

/// A decoded step of a complex operation.
///
/// Parameter blobs are decoded once, when the sequence is validated, and never re-interpreted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Operation<AccountId> {
  Permit(PermitParams<AccountId>),
  LockMint(SynthParams<AccountId>),
  BurnUnlock(SynthParams<AccountId>),
  BurnMint(SynthParams<AccountId>),
  EmergencyUnlock(CancelParams<AccountId>),
  EmergencyMint(CancelParams<AccountId>),
  Wrap(WrapParams<AccountId>),
  Unwrap(WrapParams<AccountId>),
  Swap(SwapParams<AccountId>),
  AddLiquidity(PoolParams<AccountId>),
  RemoveLiquidity(PoolParams<AccountId>),
}

impl<AccountId> Operation<AccountId> {
  pub fn code(&self) -> OpCode {
    match self {
      Operation::Permit(_) => OpCode::Permit,
      Operation::LockMint(_) => OpCode::LockMint,
      Operation::BurnUnlock(_) => OpCode::BurnUnlock,
      Operation::BurnMint(_) => OpCode::BurnMint,
      Operation::EmergencyUnlock(_) => OpCode::EmergencyUnlock,
      Operation::EmergencyMint(_) => OpCode::EmergencyMint,
      Operation::Wrap(_) => OpCode::Wrap,
      Operation::Unwrap(_) => OpCode::Unwrap,
      Operation::Swap(_) => OpCode::Swap,
      Operation::AddLiquidity(_) => OpCode::AddLiquidity,
      Operation::RemoveLiquidity(_) => OpCode::RemoveLiquidity,
    }
  }

  /// Rebuilds a chain-crossing step from its params; any other code yields `BM`.
  pub fn crossing(code: OpCode, params: SynthParams<AccountId>) -> Self {
    match code {
      OpCode::LockMint => Operation::LockMint(params),
      OpCode::BurnUnlock => Operation::BurnUnlock(params),
      _ => Operation::BurnMint(params),
    }
  }

  /// Funds source, for steps that move value.
  pub fn source(&self) -> Option<&Option<AccountId>> {
    match self {
      Operation::LockMint(p) | Operation::BurnUnlock(p) | Operation::BurnMint(p) => Some(&p.from),
      Operation::Wrap(p) | Operation::Unwrap(p) => Some(&p.from),
      Operation::Swap(p) => Some(&p.from),
      Operation::AddLiquidity(p) | Operation::RemoveLiquidity(p) => Some(&p.from),
      Operation::Permit(_) | Operation::EmergencyUnlock(_) | Operation::EmergencyMint(_) => None,
    }
  }

  /// Recipient, for steps that deliver value.
  pub fn recipient(&self) -> Option<&Option<AccountId>> {
    match self {
      Operation::LockMint(p) | Operation::BurnUnlock(p) | Operation::BurnMint(p) => Some(&p.to),
      Operation::Wrap(p) | Operation::Unwrap(p) => Some(&p.to),
      Operation::Swap(p) => Some(&p.to),
      Operation::AddLiquidity(p) | Operation::RemoveLiquidity(p) => Some(&p.to),
      Operation::Permit(_) | Operation::EmergencyUnlock(_) | Operation::EmergencyMint(_) => None,
    }
  }

  pub fn emergency_to(&self) -> Option<&AccountId> {
    match self {
      Operation::LockMint(p) | Operation::BurnUnlock(p) | Operation::BurnMint(p) => {
        Some(&p.emergency_to)
      }
      Operation::Swap(p) => Some(&p.emergency_to),
      Operation::AddLiquidity(p) | Operation::RemoveLiquidity(p) => Some(&p.emergency_to),
      _ => None,
    }
  }
}

impl<AccountId: Encode + Decode> Operation<AccountId> {
  /// Decodes `blob` with the schema of `code`. The whole blob must be consumed.
  pub fn decode_params(code: OpCode, blob: &[u8]) -> Option<Self> {
    let input = &mut &blob[..];
    let op = match code {
      OpCode::Permit => Operation::Permit(DecodeAll::decode_all(input).ok()?),
      OpCode::LockMint => Operation::LockMint(DecodeAll::decode_all(input).ok()?),
      OpCode::BurnUnlock => Operation::BurnUnlock(DecodeAll::decode_all(input).ok()?),
      OpCode::BurnMint => Operation::BurnMint(DecodeAll::decode_all(input).ok()?),
      OpCode::EmergencyUnlock => Operation::EmergencyUnlock(DecodeAll::decode_all(input).ok()?),
      OpCode::EmergencyMint => Operation::EmergencyMint(DecodeAll::decode_all(input).ok()?),
      OpCode::Wrap => Operation::Wrap(DecodeAll::decode_all(input).ok()?),
      OpCode::Unwrap => Operation::Unwrap(DecodeAll::decode_all(input).ok()?),
      OpCode::Swap => Operation::Swap(DecodeAll::decode_all(input).ok()?),
      OpCode::AddLiquidity => Operation::AddLiquidity(DecodeAll::decode_all(input).ok()?),
      OpCode::RemoveLiquidity => Operation::RemoveLiquidity(DecodeAll::decode_all(input).ok()?),
    };
    Some(op)
  }

  pub fn encode_params(&self) -> Vec<u8> {
    match self {
      Operation::Permit(p) => p.encode(),
      Operation::LockMint(p) | Operation::BurnUnlock(p) | Operation::BurnMint(p) => p.encode(),
      Operation::EmergencyUnlock(p) | Operation::EmergencyMint(p) => p.encode(),
      Operation::Wrap(p) | Operation::Unwrap(p) => p.encode(),
      Operation::Swap(p) => p.encode(),
      Operation::AddLiquidity(p) | Operation::RemoveLiquidity(p) => p.encode(),
    }
  }
}

/// Payload carried by the message bridge to the peer router.
#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
pub struct ResumeCall {
  pub selector: Selector,
  pub request_id: H256,
  pub continuation_index: u8,
  pub op_codes: Vec<OpCode>,
  pub params: Vec<Vec<u8>>,
}

/// Accountant-signed authorization of the execution fee for one `start` call.
#[derive(Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo)]
pub struct FeeReceipt<BlockNumber, Signature> {
  /// Native currency transferred to the accountant
  pub execution_price: Balance,
  /// Last block at which the receipt is accepted
  pub deadline: BlockNumber,
  pub signature: Signature,
}

/// Message the accountant signs, bound to the sender's nonce at signing time.
#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
pub struct FeeReceiptPayload<AccountId, BlockNumber> {
  pub sender: AccountId,
  pub chain_id_from: ChainId,
  pub op_codes_hash: H256,
  pub params_hash: H256,
  pub execution_price: Balance,
  pub deadline: BlockNumber,
  pub nonce: u64,
}

/// Who drives an execution pass.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExecutionContext<AccountId> {
  /// A signed `start`
  Start { sender: AccountId },
  /// A bridged `resume` from a peer router
  Resume { chain_id_from: ChainId },
}

impl<AccountId> ExecutionContext<AccountId> {
  pub fn sender(&self) -> Option<&AccountId> {
    match self {
      ExecutionContext::Start { sender } => Some(sender),
      ExecutionContext::Resume { .. } => None,
    }
  }
}

/// Where an execution pass stopped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Outcome {
  pub result: ExecutionResult,
  pub chain_id_to: ChainId,
  pub next_request_id: H256,
  pub continuation_index: u8,
}

impl Outcome {
  pub fn completed() -> Self {
    Self {
      result: ExecutionResult::Completed,
      chain_id_to: 0,
      next_request_id: H256::zero(),
      continuation_index: 0,
    }
  }
}

/// Custody of original tokens on their home chain
pub trait CustodyVault<AccountId> {
  /// Lock `amount` from `from`; returns the amount actually locked
  fn lock(token: AssetKind, from: &AccountId, amount: Balance) -> Result<Balance, DispatchError>;

  fn unlock(token: AssetKind, to: &AccountId, amount: Balance) -> DispatchResult;

  /// Release a lock whose cross-chain leg was cancelled
  fn emergency_unlock(token: AssetKind, to: &AccountId, amount: Balance) -> DispatchResult;
}

/// Issuer of synthetic representations of tokens homed on other chains
pub trait SyntheticAuthority<AccountId> {
  /// Mint the synthetic of `(original, home)`; returns the synthetic token
  fn mint(
    original: AssetKind,
    home: ChainId,
    to: &AccountId,
    amount: Balance,
  ) -> Result<AssetKind, DispatchError>;

  /// Burn a synthetic; returns the original token and its home chain
  fn burn(
    synthetic: AssetKind,
    from: &AccountId,
    amount: Balance,
  ) -> Result<(AssetKind, ChainId), DispatchError>;

  /// Re-mint a synthetic whose burn was cancelled
  fn emergency_mint(
    original: AssetKind,
    home: ChainId,
    to: &AccountId,
    amount: Balance,
  ) -> DispatchResult;

  fn synth_of(original: AssetKind, home: ChainId) -> Option<AssetKind>;
}

/// Liquidity pools reachable by `S`, `A` and `R`
pub trait PoolAdapter<AccountId> {
  fn swap(
    pool: PoolId,
    token_in: AssetKind,
    amount_in: Balance,
    i: u8,
    j: u8,
    from: &AccountId,
    to: &AccountId,
  ) -> Result<Balance, DispatchError>;

  /// Returns the LP amount minted
  fn add_liquidity(
    pool: PoolId,
    token_in: AssetKind,
    amount_in: Balance,
    i: u8,
    from: &AccountId,
    to: &AccountId,
  ) -> Result<Balance, DispatchError>;

  /// Returns the amount of coin `i` withdrawn
  fn remove_liquidity(
    pool: PoolId,
    lp_amount: Balance,
    i: u8,
    from: &AccountId,
    to: &AccountId,
  ) -> Result<Balance, DispatchError>;
}

/// Wrapped representation of the native currency
pub trait NativeWrapper<AccountId> {
  fn wrap(from: &AccountId, to: &AccountId, amount: Balance) -> Result<Balance, DispatchError>;

  fn unwrap(from: &AccountId, to: &AccountId, amount: Balance) -> Result<Balance, DispatchError>;
}

/// Signed token allowances
pub trait TokenPermit<AccountId> {
  fn permit(
    token: AssetKind,
    owner: &AccountId,
    spender: &AccountId,
    amount: Balance,
    deadline: u64,
    v: u8,
    r: H256,
    s: H256,
  ) -> DispatchResult;
}

/// Tokens and pools the router may touch on this chain
pub trait Whitelist {
  fn token_state(token: AssetKind) -> Option<TokenState>;

  fn is_pool_enabled(pool: PoolId) -> bool;
}

/// Outbound side of the message bridge
pub trait MessageBridge<AccountId> {
  /// Nonce the next `send_data` will consume
  fn nonce() -> u64;

  fn send_data(
    to_router: &AccountId,
    chain_id_to: ChainId,
    request_id: H256,
    payload: Vec<u8>,
  ) -> DispatchResult;
}

/// Inbound side of the message bridge, for bridges living in the same runtime
pub trait MessageReceiver<AccountId> {
  fn receive_message(from: &AccountId, chain_id_from: ChainId, payload: &[u8]) -> DispatchResult;
}

/// Helper for benchmarking
#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId, Signature> {
  /// Account whose signatures `sign` produces
  fn accountant() -> AccountId;
  fn sign(payload: &[u8]) -> Signature;
  fn fund(who: &AccountId, token: AssetKind, amount: Balance) -> DispatchResult;
  /// Make `(original, home)` mintable and whitelisted on this chain
  fn register_synthetic(original: AssetKind, home: ChainId) -> DispatchResult;
}
