//! # Veil Quoter
//!
//! Expected-output quoting over the bridge client registry. The query engine
//! keeps a published quote in step with evolving inputs: every input change
//! starts a fresh computation, and results that no longer correspond to the
//! current inputs are discarded rather than published.
//!
//! ## Inputs:
//! 1. **bridge-data**: client registry, asset catalog, bridge deployments
//! 2. **caller**: bridge name + swap parameters
//!
//! ## Output:
//! - **ExpectedOutputState**: loading / ready / failed, over a watch channel

pub mod config;
pub mod error;
pub mod query;

pub use config::QuoterConfig;
pub use error::{QueryError, QueryErrorKind, QuoterError, Result};
pub use query::{
    ExpectedOutput, ExpectedOutputArgs, ExpectedOutputQuery, ExpectedOutputState, QueryInput,
};

/// Version of the quoter
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
