#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use polkadot_sdk::frame_support::{traits::Get, weights::{Weight, constants::RocksDbWeight}};
use core::marker::PhantomData;

pub trait WeightInfo {
	fn start(n: u32) -> Weight;
	fn resume(n: u32) -> Weight;
	fn set_operation() -> Weight;
	fn set_peer_router() -> Weight;
	fn set_accountant() -> Weight;
}

/// Weights for `pallet_complex_router` using the Substrate node and recommended hardware.
pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
	/// Storage: `ComplexRouter::Accountant` (r:1 w:0)
	/// Storage: `ComplexRouter::Nonces` (r:1 w:1)
	/// Storage: `ComplexRouter::Operations` (r:1 w:0)
	/// Storage: `ComplexRouter::PeerRouters` (r:1 w:0)
	/// Storage: `ComplexRouter::StartedOps` (r:1 w:1)
	/// Storage: `ComplexRouter::Entered` (r:1 w:1)
	/// The range of component `n` is `[1, 2]`.
	fn start(n: u32) -> Weight {
		Weight::from_parts(85_000_000, 6000)
			.saturating_add(Weight::from_parts(25_000_000, 2600).saturating_mul(n.into()))
			.saturating_add(T::DbWeight::get().reads(6))
			.saturating_add(T::DbWeight::get().reads((2_u64).saturating_mul(n.into())))
			.saturating_add(T::DbWeight::get().writes(4))
			.saturating_add(T::DbWeight::get().writes((2_u64).saturating_mul(n.into())))
	}
	/// Storage: `ComplexRouter::Operations` (r:1 w:0)
	/// Storage: `ComplexRouter::ProcessedOps` (r:1 w:1)
	/// Storage: `ComplexRouter::StartedOps` (r:1 w:2)
	/// Storage: `ComplexRouter::PeerRouters` (r:2 w:0)
	/// Storage: `ComplexRouter::Entered` (r:1 w:1)
	/// The range of component `n` is `[1, 2]`.
	fn resume(n: u32) -> Weight {
		Weight::from_parts(70_000_000, 6000)
			.saturating_add(Weight::from_parts(25_000_000, 2600).saturating_mul(n.into()))
			.saturating_add(T::DbWeight::get().reads(6))
			.saturating_add(T::DbWeight::get().reads((2_u64).saturating_mul(n.into())))
			.saturating_add(T::DbWeight::get().writes(4))
			.saturating_add(T::DbWeight::get().writes((2_u64).saturating_mul(n.into())))
	}
	/// Storage: `ComplexRouter::Operations` (r:0 w:1)
	fn set_operation() -> Weight {
		Weight::from_parts(12_000_000, 1500)
			.saturating_add(T::DbWeight::get().writes(1))
	}
	/// Storage: `ComplexRouter::PeerRouters` (r:0 w:1)
	fn set_peer_router() -> Weight {
		Weight::from_parts(10_000_000, 1500)
			.saturating_add(T::DbWeight::get().writes(1))
	}
	/// Storage: `ComplexRouter::Accountant` (r:0 w:1)
	fn set_accountant() -> Weight {
		Weight::from_parts(9_000_000, 1500)
			.saturating_add(T::DbWeight::get().writes(1))
	}
}

// For backwards compatibility and tests.
impl WeightInfo for () {
	fn start(n: u32) -> Weight {
		Weight::from_parts(85_000_000, 6000)
			.saturating_add(Weight::from_parts(25_000_000, 2600).saturating_mul(n.into()))
			.saturating_add(RocksDbWeight::get().reads(6))
			.saturating_add(RocksDbWeight::get().writes(4))
	}
	fn resume(n: u32) -> Weight {
		Weight::from_parts(70_000_000, 6000)
			.saturating_add(Weight::from_parts(25_000_000, 2600).saturating_mul(n.into()))
			.saturating_add(RocksDbWeight::get().reads(6))
			.saturating_add(RocksDbWeight::get().writes(4))
	}
	fn set_operation() -> Weight {
		Weight::from_parts(12_000_000, 1500)
	}
	fn set_peer_router() -> Weight {
		Weight::from_parts(10_000_000, 1500)
	}
	fn set_accountant() -> Weight {
		Weight::from_parts(9_000_000, 1500)
	}
}
