use crate as pallet_complex_router;

use codec::{Decode, DecodeAll, DecodeWithMemTracking, Encode};
use polkadot_sdk::frame_support::traits::fungible::{
  Inspect as FungibleInspect, Mutate as FungibleMutate,
};
use polkadot_sdk::frame_support::traits::fungibles::{
  Inspect as FungiblesInspect, Mutate as FungiblesMutate,
};
use polkadot_sdk::frame_support::traits::tokens::{Fortitude, Precision, Preservation};
use polkadot_sdk::frame_support::{
  PalletId, construct_runtime, derive_impl, ord_parameter_types, parameter_types,
  traits::{ConstU32, ConstU64, ConstU128},
};
use polkadot_sdk::frame_system::{self, EnsureRoot, EnsureSignedBy};
use polkadot_sdk::sp_io::hashing::blake2_256;
use polkadot_sdk::sp_runtime::{
  BuildStorage, DispatchError, DispatchResult,
  testing::H256,
  traits::{AccountIdConversion, BlakeTwo256, IdentifyAccount, IdentityLookup, Lazy, Verify},
};
use primitives::ecosystem::{
  pallet_ids::COMPLEX_ROUTER_PALLET_ID,
  params::{MAX_OPERATIONS, MAX_PARAMS_LEN, PRECISION},
};
use scale_info::TypeInfo;

use crate::types::*;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::vec;

pub const ALICE: u64 = 1;
pub const BOB: u64 = 2;
pub const ACCOUNTANT: u64 = 10;
pub const TREASURY: u64 = 20;
pub const BRIDGE: u64 = 30;
pub const CUSTODY: u64 = 40;
pub const WRAPPER: u64 = 50;
pub const POOL_VAULT: u64 = 60;

pub const CHAIN_A: ChainId = 1;
pub const CHAIN_B: ChainId = 2;
pub const CHAIN_C: ChainId = 3;

pub const UNIT: u128 = PRECISION;
pub const EXECUTION_PRICE: u128 = UNIT / 100;
pub const INITIAL_BALANCE: u128 = 1_000 * UNIT;

/// Original token homed on chain A
pub const TOKEN_T: AssetKind = AssetKind::Local(1);
/// Pool coin on chain B
pub const TOKEN_X: AssetKind = AssetKind::Local(2);
/// Wrapped native currency
pub const WRAPPED: AssetKind = AssetKind::Local(99);
/// Synthetic of `(TOKEN_T, CHAIN_A)` on chains B and C
pub const SYNTH_T: AssetKind = AssetKind::Local(101);
/// LP token of `POOL`
pub const LP_TOKEN: AssetKind = AssetKind::Local(201);
/// `[SYNTH_T, TOKEN_X]` pool on chain B
pub const POOL: PoolId = 1;

/// Bridge fee of `TOKEN_T` on its home chain
pub const HOME_FEE_BPS: u32 = 50;
/// Bridge fee of `SYNTH_T`
pub const SYNTH_FEE_BPS: u32 = 30;

/// A message sitting in the bridge
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeMessage {
  pub chain_id_from: ChainId,
  pub chain_id_to: ChainId,
  pub from_router: u64,
  pub to_router: u64,
  pub request_id: H256,
  pub payload: Vec<u8>,
}

impl BridgeMessage {
  pub fn call(&self) -> ResumeCall {
    ResumeCall::decode_all(&mut &self.payload[..]).expect("router payload")
  }
}

#[derive(Clone, Debug)]
pub struct MockPool {
  pub coins: Vec<AssetKind>,
  pub lp: AssetKind,
  pub enabled: bool,
}

// State containers for stateful mocks, keyed by chain where the state is per chain
thread_local! {
    // Synthetics: (chain, original, home) -> synthetic
    pub static SYNTHETICS: RefCell<BTreeMap<(ChainId, AssetKind, ChainId), AssetKind>> = const { RefCell::new(BTreeMap::new()) };

    // Whitelisted tokens: (chain, token) -> state
    pub static WHITELIST: RefCell<BTreeMap<(ChainId, AssetKind), TokenState>> = const { RefCell::new(BTreeMap::new()) };

    // Pools: (chain, pool) -> pool
    pub static POOLS: RefCell<BTreeMap<(ChainId, PoolId), MockPool>> = const { RefCell::new(BTreeMap::new()) };

    // Bridge nonce per sending chain
    pub static BRIDGE_NONCES: RefCell<BTreeMap<ChainId, u64>> = const { RefCell::new(BTreeMap::new()) };

    // Messages sent and not yet delivered, oldest first
    pub static OUTBOX: RefCell<Vec<BridgeMessage>> = const { RefCell::new(Vec::new()) };

    // Permits seen: (token, owner, spender, amount)
    pub static PERMITS: RefCell<Vec<(AssetKind, u64, u64, u128)>> = const { RefCell::new(Vec::new()) };

    // Next pool call re-enters the router
    pub static REENTER: RefCell<bool> = const { RefCell::new(false) };
}

// Helper methods to setup state
pub fn set_synthetic(chain: ChainId, original: AssetKind, home: ChainId, synthetic: AssetKind) {
  SYNTHETICS.with(|s| s.borrow_mut().insert((chain, original, home), synthetic));
}

pub fn set_token_state(chain: ChainId, token: AssetKind, bridge_fee_bps: u32, enabled: bool) {
  WHITELIST.with(|w| {
    w.borrow_mut().insert(
      (chain, token),
      TokenState {
        min_amount: 10,
        max_amount: 1_000_000 * UNIT,
        bridge_fee_bps,
        enabled,
      },
    )
  });
}

pub fn set_pool(chain: ChainId, pool: PoolId, coins: Vec<AssetKind>, lp: AssetKind) {
  POOLS.with(|p| {
    p.borrow_mut().insert(
      (chain, pool),
      MockPool {
        coins,
        lp,
        enabled: true,
      },
    )
  });
}

pub fn set_reenter(enabled: bool) {
  REENTER.with(|r| *r.borrow_mut() = enabled);
}

pub fn permits() -> Vec<(AssetKind, u64, u64, u128)> {
  PERMITS.with(|p| p.borrow().clone())
}

pub fn pending_messages() -> usize {
  OUTBOX.with(|o| o.borrow().len())
}

/// Pop the oldest undelivered message.
pub fn take_message() -> BridgeMessage {
  OUTBOX.with(|o| {
    let mut outbox = o.borrow_mut();
    assert!(!outbox.is_empty(), "bridge outbox is empty");
    outbox.remove(0)
  })
}

pub fn current_chain() -> ChainId {
  ChainIdCurrent::get()
}

pub fn router() -> u64 {
  RouterPalletId::get().into_account_truncating()
}

pub fn balance(token: AssetKind, who: u64) -> u128 {
  match token {
    AssetKind::Native => <Balances as FungibleInspect<u64>>::balance(&who),
    AssetKind::Local(id) | AssetKind::Foreign(id) => {
      <Assets as FungiblesInspect<u64>>::balance(id, &who)
    }
  }
}

fn mint(token: AssetKind, to: &u64, amount: u128) -> DispatchResult {
  match token {
    AssetKind::Native => <Balances as FungibleMutate<u64>>::mint_into(to, amount)?,
    AssetKind::Local(id) | AssetKind::Foreign(id) => {
      <Assets as FungiblesMutate<u64>>::mint_into(id, to, amount)?
    }
  };
  Ok(())
}

fn burn(token: AssetKind, from: &u64, amount: u128) -> DispatchResult {
  let id = token
    .local_id()
    .ok_or(DispatchError::Other("Native is not burnable"))?;
  <Assets as FungiblesMutate<u64>>::burn_from(
    id,
    from,
    amount,
    Preservation::Expendable,
    Precision::Exact,
    Fortitude::Polite,
  )?;
  Ok(())
}

fn transfer(token: AssetKind, from: &u64, to: &u64, amount: u128) -> DispatchResult {
  match token {
    AssetKind::Native => {
      <Balances as FungibleMutate<u64>>::transfer(from, to, amount, Preservation::Expendable)?
    }
    AssetKind::Local(id) | AssetKind::Foreign(id) => {
      <Assets as FungiblesMutate<u64>>::transfer(id, from, to, amount, Preservation::Expendable)?
    }
  };
  Ok(())
}

/// Signature over the blake2 digest of the signed message
#[derive(Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo)]
pub struct MockSignature {
  pub signer: u64,
  pub digest: [u8; 32],
}

impl MockSignature {
  pub fn sign(signer: u64, message: &[u8]) -> Self {
    Self {
      signer,
      digest: blake2_256(message),
    }
  }
}

impl Verify for MockSignature {
  type Signer = MockSigner;

  fn verify<L: Lazy<[u8]>>(&self, mut msg: L, signer: &u64) -> bool {
    self.signer == *signer && blake2_256(msg.get()) == self.digest
  }
}

#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
pub struct MockSigner(pub u64);

impl IdentifyAccount for MockSigner {
  type AccountId = u64;

  fn into_account(self) -> u64 {
    self.0
  }
}

type Block = frame_system::mocking::MockBlock<Test>;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Balances: polkadot_sdk::pallet_balances,
    Assets: polkadot_sdk::pallet_assets,
    ComplexRouter: pallet_complex_router,
  }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
  type Block = Block;
  type AccountId = u64;
  type Lookup = IdentityLookup<Self::AccountId>;
  type Hash = H256;
  type Hashing = BlakeTwo256;
  type AccountData = polkadot_sdk::pallet_balances::AccountData<u128>;
}

impl polkadot_sdk::pallet_balances::Config for Test {
  type MaxLocks = ();
  type MaxReserves = ();
  type ReserveIdentifier = [u8; 8];
  type Balance = u128;
  type DustRemoval = ();
  type RuntimeEvent = RuntimeEvent;
  type ExistentialDeposit = ConstU128<1>;
  type AccountStore = System;
  type WeightInfo = ();
  type FreezeIdentifier = ();
  type MaxFreezes = ();
  type RuntimeHoldReason = ();
  type RuntimeFreezeReason = ();
  type DoneSlashHandler = ();
}

impl polkadot_sdk::pallet_assets::Config for Test {
  type RuntimeEvent = RuntimeEvent;
  type Balance = u128;
  type AssetId = u32;
  type AssetIdParameter = u32;
  type Currency = Balances;
  type CreateOrigin = polkadot_sdk::frame_support::traits::AsEnsureOriginWithArg<
    frame_system::EnsureSigned<Self::AccountId>,
  >;
  type ForceOrigin = frame_system::EnsureRoot<Self::AccountId>;
  type AssetDeposit = ConstU128<1>;
  type AssetAccountDeposit = ConstU128<1>;
  type MetadataDepositBase = ConstU128<1>;
  type MetadataDepositPerByte = ConstU128<1>;
  type ApprovalDeposit = ConstU128<1>;
  type StringLimit = ConstU32<50>;
  type Freezer = ();
  type Extra = ();
  type ReserveData = ();
  type CallbackHandle = ();
  type WeightInfo = ();
  type RemoveItemsLimit = ConstU32<5>;
  type Holder = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = AssetBenchmarkHelper;
}

#[cfg(feature = "runtime-benchmarks")]
pub struct AssetBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl polkadot_sdk::pallet_assets::BenchmarkHelper<u32, ()> for AssetBenchmarkHelper {
  fn create_asset_id_parameter(id: u32) -> u32 {
    id
  }
  fn create_reserve_id_parameter(_id: u32) -> () {
    ()
  }
}

parameter_types! {
  pub const RouterPalletId: PalletId = PalletId(*COMPLEX_ROUTER_PALLET_ID);
  pub storage ChainIdCurrent: ChainId = CHAIN_A;
}

ord_parameter_types! {
  pub const BridgeAccount: u64 = BRIDGE;
}

// MOCK IMPLEMENTATIONS

/// Portal: locked tokens sit in the custody account
pub struct MockCustodyVault;
impl pallet_complex_router::types::CustodyVault<u64> for MockCustodyVault {
  fn lock(token: AssetKind, from: &u64, amount: u128) -> Result<u128, DispatchError> {
    transfer(token, from, &CUSTODY, amount)?;
    Ok(amount)
  }
  fn unlock(token: AssetKind, to: &u64, amount: u128) -> DispatchResult {
    transfer(token, &CUSTODY, to, amount)
  }
  fn emergency_unlock(token: AssetKind, to: &u64, amount: u128) -> DispatchResult {
    transfer(token, &CUSTODY, to, amount)
  }
}

/// Synthesis: synthetics are plain assets minted and burned by the router
pub struct MockSynthesis;
impl pallet_complex_router::types::SyntheticAuthority<u64> for MockSynthesis {
  fn mint(
    original: AssetKind,
    home: ChainId,
    to: &u64,
    amount: u128,
  ) -> Result<AssetKind, DispatchError> {
    let synthetic =
      Self::synth_of(original, home).ok_or(DispatchError::Other("Unknown synthetic"))?;
    mint(synthetic, to, amount)?;
    Ok(synthetic)
  }
  fn burn(
    synthetic: AssetKind,
    from: &u64,
    amount: u128,
  ) -> Result<(AssetKind, ChainId), DispatchError> {
    let chain = current_chain();
    let (original, home) = SYNTHETICS
      .with(|s| {
        s.borrow()
          .iter()
          .find(|((c, _, _), synth)| *c == chain && **synth == synthetic)
          .map(|((_, original, home), _)| (*original, *home))
      })
      .ok_or(DispatchError::Other("Not a synthetic"))?;
    burn(synthetic, from, amount)?;
    Ok((original, home))
  }
  fn emergency_mint(original: AssetKind, home: ChainId, to: &u64, amount: u128) -> DispatchResult {
    Self::mint(original, home, to, amount).map(|_| ())
  }
  fn synth_of(original: AssetKind, home: ChainId) -> Option<AssetKind> {
    let chain = current_chain();
    SYNTHETICS.with(|s| s.borrow().get(&(chain, original, home)).copied())
  }
}

/// Constant-price pools backed by the pool vault
pub struct MockPools;
impl MockPools {
  fn pool(pool: PoolId) -> Result<MockPool, DispatchError> {
    let chain = current_chain();
    POOLS
      .with(|p| p.borrow().get(&(chain, pool)).cloned())
      .ok_or(DispatchError::Other("Pool not found"))
  }

  fn coin(pool: &MockPool, index: u8) -> Result<AssetKind, DispatchError> {
    pool
      .coins
      .get(usize::from(index))
      .copied()
      .ok_or(DispatchError::Other("Coin index out of range"))
  }

  fn maybe_reenter() -> DispatchResult {
    if !REENTER.with(|r| r.replace(false)) {
      return Ok(());
    }
    let receipt = FeeReceipt {
      execution_price: 0,
      deadline: 0,
      signature: MockSignature::sign(ACCOUNTANT, &[]),
    };
    ComplexRouter::start(
      RuntimeOrigin::signed(ALICE),
      vec![OpCode::Wrap],
      vec![vec![]],
      receipt,
    )
  }
}

impl pallet_complex_router::types::PoolAdapter<u64> for MockPools {
  fn swap(
    pool: PoolId,
    token_in: AssetKind,
    amount_in: u128,
    i: u8,
    j: u8,
    from: &u64,
    to: &u64,
  ) -> Result<u128, DispatchError> {
    Self::maybe_reenter()?;
    let pool = Self::pool(pool)?;
    if Self::coin(&pool, i)? != token_in {
      return Err(DispatchError::Other("Wrong coin"));
    }
    let token_out = Self::coin(&pool, j)?;
    transfer(token_in, from, &POOL_VAULT, amount_in)?;
    transfer(token_out, &POOL_VAULT, to, amount_in)?;
    Ok(amount_in)
  }

  fn add_liquidity(
    pool: PoolId,
    token_in: AssetKind,
    amount_in: u128,
    i: u8,
    from: &u64,
    to: &u64,
  ) -> Result<u128, DispatchError> {
    let pool = Self::pool(pool)?;
    if Self::coin(&pool, i)? != token_in {
      return Err(DispatchError::Other("Wrong coin"));
    }
    transfer(token_in, from, &POOL_VAULT, amount_in)?;
    mint(pool.lp, to, amount_in)?;
    Ok(amount_in)
  }

  fn remove_liquidity(
    pool: PoolId,
    lp_amount: u128,
    i: u8,
    from: &u64,
    to: &u64,
  ) -> Result<u128, DispatchError> {
    let pool = Self::pool(pool)?;
    let token_out = Self::coin(&pool, i)?;
    burn(pool.lp, from, lp_amount)?;
    transfer(token_out, &POOL_VAULT, to, lp_amount)?;
    Ok(lp_amount)
  }
}

/// Native currency wrapped 1:1 into `WRAPPED`
pub struct MockWrapper;
impl pallet_complex_router::types::NativeWrapper<u64> for MockWrapper {
  fn wrap(from: &u64, to: &u64, amount: u128) -> Result<u128, DispatchError> {
    transfer(AssetKind::Native, from, &WRAPPER, amount)?;
    mint(WRAPPED, to, amount)?;
    Ok(amount)
  }
  fn unwrap(from: &u64, to: &u64, amount: u128) -> Result<u128, DispatchError> {
    burn(WRAPPED, from, amount)?;
    transfer(AssetKind::Native, &WRAPPER, to, amount)?;
    Ok(amount)
  }
}

pub struct MockPermit;
impl pallet_complex_router::types::TokenPermit<u64> for MockPermit {
  fn permit(
    token: AssetKind,
    owner: &u64,
    spender: &u64,
    amount: u128,
    _deadline: u64,
    _v: u8,
    _r: H256,
    _s: H256,
  ) -> DispatchResult {
    PERMITS.with(|p| p.borrow_mut().push((token, *owner, *spender, amount)));
    Ok(())
  }
}

pub struct MockWhitelist;
impl pallet_complex_router::types::Whitelist for MockWhitelist {
  fn token_state(token: AssetKind) -> Option<TokenState> {
    let chain = current_chain();
    WHITELIST.with(|w| w.borrow().get(&(chain, token)).copied())
  }
  fn is_pool_enabled(pool: PoolId) -> bool {
    let chain = current_chain();
    POOLS.with(|p| {
      p.borrow()
        .get(&(chain, pool))
        .is_some_and(|pool| pool.enabled)
    })
  }
}

/// Bridge gateway: queues messages in the shared outbox
pub struct MockBridge;
impl pallet_complex_router::types::MessageBridge<u64> for MockBridge {
  fn nonce() -> u64 {
    let chain = current_chain();
    BRIDGE_NONCES.with(|n| n.borrow().get(&chain).copied().unwrap_or_default())
  }
  fn send_data(
    to_router: &u64,
    chain_id_to: ChainId,
    request_id: H256,
    payload: Vec<u8>,
  ) -> DispatchResult {
    let chain = current_chain();
    BRIDGE_NONCES.with(|n| *n.borrow_mut().entry(chain).or_default() += 1);
    OUTBOX.with(|o| {
      o.borrow_mut().push(BridgeMessage {
        chain_id_from: chain,
        chain_id_to,
        from_router: ComplexRouter::account_id(),
        to_router: *to_router,
        request_id,
        payload,
      })
    });
    Ok(())
  }
}

impl pallet_complex_router::Config for Test {
  type NativeCurrency = Balances;
  type Signature = MockSignature;
  type Signer = MockSigner;
  type CustodyVault = MockCustodyVault;
  type SyntheticAuthority = MockSynthesis;
  type PoolAdapter = MockPools;
  type NativeWrapper = MockWrapper;
  type TokenPermit = MockPermit;
  type Whitelist = MockWhitelist;
  type Bridge = MockBridge;
  type BridgeOrigin = EnsureSignedBy<BridgeAccount, u64>;
  type AdminOrigin = EnsureRoot<u64>;
  type PalletId = RouterPalletId;
  type ChainIdCurrent = ChainIdCurrent;
  type TreasuryAccount = ConstU64<TREASURY>;
  type MaxOperations = ConstU32<MAX_OPERATIONS>;
  type MaxParamsLen = ConstU32<MAX_PARAMS_LEN>;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = ComplexRouterBenchmarkHelper;
}

#[cfg(feature = "runtime-benchmarks")]
pub struct ComplexRouterBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl crate::types::BenchmarkHelper<u64, MockSignature> for ComplexRouterBenchmarkHelper {
  fn accountant() -> u64 {
    ACCOUNTANT
  }

  fn sign(payload: &[u8]) -> MockSignature {
    MockSignature::sign(ACCOUNTANT, payload)
  }

  fn fund(who: &u64, token: AssetKind, amount: u128) -> DispatchResult {
    mint(token, who, amount)
  }

  fn register_synthetic(original: AssetKind, home: ChainId) -> DispatchResult {
    let chain = current_chain();
    set_synthetic(chain, original, home, SYNTH_T);
    set_token_state(chain, SYNTH_T, SYNTH_FEE_BPS, true);
    Ok(())
  }
}

/// Sequences every test chain accepts
pub fn registered_operations() -> Vec<Vec<OpCode>> {
  use OpCode::*;
  vec![
    vec![LockMint],
    vec![BurnUnlock],
    vec![BurnMint],
    vec![EmergencyUnlock],
    vec![EmergencyMint],
    vec![Permit, LockMint],
    vec![LockMint, Swap],
    vec![LockMint, BurnMint],
    vec![Wrap],
    vec![Wrap, Unwrap],
    vec![Swap],
    vec![AddLiquidity],
    vec![RemoveLiquidity],
  ]
}

fn reset_mocks() {
  SYNTHETICS.with(|s| s.borrow_mut().clear());
  WHITELIST.with(|w| w.borrow_mut().clear());
  POOLS.with(|p| p.borrow_mut().clear());
  BRIDGE_NONCES.with(|n| n.borrow_mut().clear());
  OUTBOX.with(|o| o.borrow_mut().clear());
  PERMITS.with(|p| p.borrow_mut().clear());
  set_reenter(false);

  // T lives on A; its synthetic lives on B and C
  set_token_state(CHAIN_A, TOKEN_T, HOME_FEE_BPS, true);
  for chain in [CHAIN_B, CHAIN_C] {
    set_synthetic(chain, TOKEN_T, CHAIN_A, SYNTH_T);
    set_token_state(chain, SYNTH_T, SYNTH_FEE_BPS, true);
  }
  set_pool(CHAIN_B, POOL, vec![SYNTH_T, TOKEN_X], LP_TOKEN);
}

/// Externalities of one chain of the test network.
pub fn chain_ext(chain: ChainId) -> polkadot_sdk::sp_io::TestExternalities {
  let mut storage = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();
  polkadot_sdk::pallet_balances::GenesisConfig::<Test> {
    balances: vec![
      (ALICE, INITIAL_BALANCE),
      (BOB, INITIAL_BALANCE),
      (ACCOUNTANT, UNIT),
      (WRAPPER, INITIAL_BALANCE),
    ],
    ..Default::default()
  }
  .assimilate_storage(&mut storage)
  .unwrap();
  pallet_complex_router::GenesisConfig::<Test> {
    operations: registered_operations(),
    peer_routers: [CHAIN_A, CHAIN_B, CHAIN_C]
      .into_iter()
      .filter(|peer| *peer != chain)
      .map(|peer| (peer, router()))
      .collect(),
    accountant: Some(ACCOUNTANT),
  }
  .assimilate_storage(&mut storage)
  .unwrap();

  let mut ext: polkadot_sdk::sp_io::TestExternalities = storage.into();
  ext.execute_with(|| {
    System::set_block_number(1);
    ChainIdCurrent::set(&chain);
    for asset in [TOKEN_T, TOKEN_X, WRAPPED, SYNTH_T, LP_TOKEN] {
      let id = asset.local_id().unwrap();
      Assets::force_create(RuntimeOrigin::root(), id, ALICE, true, 1).unwrap();
    }
    match chain {
      CHAIN_A => {
        mint(TOKEN_T, &ALICE, INITIAL_BALANCE).unwrap();
        mint(TOKEN_T, &BOB, INITIAL_BALANCE).unwrap();
      }
      CHAIN_B => {
        mint(TOKEN_X, &POOL_VAULT, INITIAL_BALANCE).unwrap();
        mint(SYNTH_T, &POOL_VAULT, INITIAL_BALANCE).unwrap();
      }
      _ => {}
    }
  });
  ext
}

/// Single chain (A) with fresh mocks.
pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  reset_mocks();
  chain_ext(CHAIN_A)
}

/// Chains A, B and C connected through the mock bridge.
pub struct TestNetwork {
  chains: BTreeMap<ChainId, polkadot_sdk::sp_io::TestExternalities>,
}

impl TestNetwork {
  pub fn new() -> Self {
    reset_mocks();
    let chains = [CHAIN_A, CHAIN_B, CHAIN_C]
      .into_iter()
      .map(|chain| (chain, chain_ext(chain)))
      .collect();
    Self { chains }
  }

  pub fn on<R>(&mut self, chain: ChainId, f: impl FnOnce() -> R) -> R {
    self
      .chains
      .get_mut(&chain)
      .expect("unknown chain")
      .execute_with(f)
  }

  /// Deliver `message` through the in-runtime receiver of its destination.
  pub fn deliver(&mut self, message: &BridgeMessage) -> DispatchResult {
    self.on(message.chain_id_to, || {
      <ComplexRouter as MessageReceiver<u64>>::receive_message(
        &message.from_router,
        message.chain_id_from,
        &message.payload,
      )
    })
  }

  /// Deliver the oldest undelivered message.
  pub fn relay(&mut self) -> DispatchResult {
    let message = take_message();
    self.deliver(&message)
  }
}

/// Fee receipt signed by the accountant for `sender`'s current nonce.
pub fn receipt(
  sender: u64,
  op_codes: &[OpCode],
  params: &[Vec<u8>],
  execution_price: u128,
) -> FeeReceipt<u64, MockSignature> {
  let deadline = System::block_number() + 10;
  let nonce = ComplexRouter::nonces(sender);
  let payload =
    ComplexRouter::receipt_payload(&sender, op_codes, params, execution_price, deadline, nonce);
  FeeReceipt {
    execution_price,
    deadline,
    signature: MockSignature::sign(ACCOUNTANT, &payload.encode()),
  }
}

/// `start` with a valid receipt at `EXECUTION_PRICE`.
pub fn start(sender: u64, ops: Vec<(OpCode, Vec<u8>)>) -> DispatchResult {
  let (op_codes, params): (Vec<OpCode>, Vec<Vec<u8>>) = ops.into_iter().unzip();
  let receipt = receipt(sender, &op_codes, &params, EXECUTION_PRICE);
  ComplexRouter::start(RuntimeOrigin::signed(sender), op_codes, params, receipt)
}
