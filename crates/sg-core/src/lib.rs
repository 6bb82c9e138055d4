//! # sg-core — Shared primitives for SpinGraph
//!
//! Error taxonomy, symbol resolution and scalar values shared by the
//! engine and simulation crates.

pub mod error;
pub mod symbols;
pub mod value;

pub use error::{SgError, SgResult};
pub use symbols::{EMPTY_SYMBOL, SymbolDef, SymbolKind, SymbolTable};
pub use value::ScalarValue;
