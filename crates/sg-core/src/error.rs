//! Error types for SpinGraph
//!
//! One taxonomy for the whole engine. Configuration mistakes are hard
//! errors carrying the offending component/field; an exhausted weight
//! table is its own variant because it is a reachable game state with an
//! explicit caller-side fallback, not a bug.

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum SgError {
    #[error("unknown component: {0}")]
    UnknownComponent(String),

    #[error("unknown weight table: {0}")]
    UnknownWeightTable(String),

    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("component {component}: {message}")]
    Config { component: String, message: String },

    #[error("component {component}: no {link} link configured")]
    MissingLink { component: String, link: String },

    #[error("weight table {0} is exhausted")]
    ExhaustedDistribution(String),

    #[error("random source error: {0}")]
    Random(String),

    #[error("replay tape exhausted at draw {0}")]
    ReplayExhausted(usize),

    #[error("step limit of {limit} exceeded at component {component}")]
    StepLimit { component: String, limit: u32 },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SgError {
    /// Shorthand for a component configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Result type alias
pub type SgResult<T> = Result<T, SgError>;
