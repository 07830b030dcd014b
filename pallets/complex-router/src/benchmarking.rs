extern crate alloc;

use crate::{types::BenchmarkHelper, *};
use alloc::{vec, vec::Vec};
use codec::Encode;
use polkadot_sdk::frame_benchmarking::v2::*;
use polkadot_sdk::frame_support::{BoundedVec, traits::EnsureOrigin};
use polkadot_sdk::frame_system::{self, RawOrigin};
use polkadot_sdk::sp_core::H256;
use primitives::ecosystem::params::PRECISION;

fn register<T: Config>(op_codes: Vec<OpCode>) {
  let key: BoundedVec<OpCode, T::MaxOperations> = op_codes
    .try_into()
    .expect("Sequence exceeds MaxOperations");
  Operations::<T>::insert(key, true);
}

#[benchmarks]
mod benches {
  use super::*;

  /// `W`, then `W Uw`
  #[benchmark]
  fn start(n: Linear<1, 2>) {
    let caller: T::AccountId = whitelisted_caller();
    let amount = 10 * PRECISION;
    let execution_price = PRECISION / 100;
    T::BenchmarkHelper::fund(&caller, AssetKind::Native, 1_000 * PRECISION)
      .expect("Failed to fund caller");
    Accountant::<T>::put(T::BenchmarkHelper::accountant());

    let mut ops = vec![Operation::Wrap(WrapParams {
      token_in: AssetKind::Native,
      amount_in: amount,
      from: Some(caller.clone()),
      to: (n == 1).then(|| caller.clone()),
    })];
    if n == 2 {
      ops.push(Operation::Unwrap(WrapParams {
        token_in: AssetKind::Native,
        amount_in: 0,
        from: None,
        to: Some(caller.clone()),
      }));
    }
    let op_codes: Vec<OpCode> = ops.iter().map(Operation::code).collect();
    let params: Vec<Vec<u8>> = ops.iter().map(Operation::encode_params).collect();
    register::<T>(op_codes.clone());

    let deadline = frame_system::Pallet::<T>::block_number() + 10u32.into();
    let payload = Pallet::<T>::receipt_payload(
      &caller,
      &op_codes,
      &params,
      execution_price,
      deadline,
      Nonces::<T>::get(&caller),
    );
    let receipt = FeeReceipt {
      execution_price,
      deadline,
      signature: T::BenchmarkHelper::sign(&payload.encode()),
    };

    #[extrinsic_call]
    start(RawOrigin::Signed(caller.clone()), op_codes, params, receipt);

    assert_eq!(Nonces::<T>::get(&caller), 1);
  }

  /// `LM` delivered from a peer, then `LM BM` forwarded to a third chain
  #[benchmark]
  fn resume(n: Linear<1, 2>) {
    let caller: T::AccountId = whitelisted_caller();
    let current = T::ChainIdCurrent::get();
    let chain_id_from = current.saturating_add(1);
    let router = Pallet::<T>::account_id();
    PeerRouters::<T>::insert(chain_id_from, &router);

    let original = AssetKind::Local(1);
    T::BenchmarkHelper::register_synthetic(original, chain_id_from)
      .expect("Failed to register synthetic");

    let mut ops = vec![Operation::LockMint(SynthParams {
      token_in: original,
      amount_in: 10 * PRECISION,
      from: Some(caller.clone()),
      to: (n == 1).then(|| caller.clone()),
      chain_id_to: current,
      token_in_chain_id_current: chain_id_from,
      emergency_to: caller.clone(),
    })];
    if n == 2 {
      let chain_id_next = current.saturating_add(2);
      PeerRouters::<T>::insert(chain_id_next, &router);
      let synthetic = T::SyntheticAuthority::synth_of(original, chain_id_from)
        .expect("Synthetic must be registered");
      ops.push(Operation::BurnMint(SynthParams {
        token_in: synthetic,
        amount_in: 0,
        from: None,
        to: Some(caller.clone()),
        chain_id_to: chain_id_next,
        token_in_chain_id_current: current,
        emergency_to: caller.clone(),
      }));
    }
    let op_codes: Vec<OpCode> = ops.iter().map(Operation::code).collect();
    let params: Vec<Vec<u8>> = ops.iter().map(Operation::encode_params).collect();
    register::<T>(op_codes.clone());

    let request_id = H256::repeat_byte(1);
    let origin =
      T::BridgeOrigin::try_successful_origin().expect("BridgeOrigin must have a successful origin");

    #[extrinsic_call]
    resume(
      origin,
      router,
      chain_id_from,
      request_id,
      0,
      op_codes,
      params,
    );

    assert_eq!(
      ProcessedOps::<T>::get(request_id),
      CrossChainOpState::Succeeded
    );
  }

  #[benchmark]
  fn set_operation() {
    let op_codes: BoundedVec<OpCode, T::MaxOperations> =
      vec![OpCode::LockMint, OpCode::BurnUnlock]
        .try_into()
        .expect("Sequence exceeds MaxOperations");
    let origin =
      T::AdminOrigin::try_successful_origin().expect("AdminOrigin must have a successful origin");

    #[extrinsic_call]
    set_operation(origin, op_codes.clone(), true);

    assert!(Operations::<T>::get(&op_codes));
  }

  #[benchmark]
  fn set_peer_router() {
    let chain_id = T::ChainIdCurrent::get().saturating_add(1);
    let router: T::AccountId = account("router", 0, 0);
    let origin =
      T::AdminOrigin::try_successful_origin().expect("AdminOrigin must have a successful origin");

    #[extrinsic_call]
    set_peer_router(origin, chain_id, Some(router.clone()));

    assert_eq!(PeerRouters::<T>::get(chain_id), Some(router));
  }

  #[benchmark]
  fn set_accountant() {
    let accountant: T::AccountId = account("accountant", 0, 0);
    let origin =
      T::AdminOrigin::try_successful_origin().expect("AdminOrigin must have a successful origin");

    #[extrinsic_call]
    set_accountant(origin, accountant.clone());

    assert_eq!(Accountant::<T>::get(), Some(accountant));
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
