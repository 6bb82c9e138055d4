//! Reference component catalogue
//!
//! One module per feature. Each component is a leaf implementation of the
//! `Component` contract, built from its typed config by the registry at
//! load time.

pub mod feature_pick;
pub mod reel_spin;
pub mod respin;
pub mod symbol_swap;
pub mod win_check;

pub use feature_pick::FeaturePick;
pub use reel_spin::ReelSpin;
pub use respin::Respin;
pub use symbol_swap::SymbolSwap;
pub use win_check::WinCheck;
