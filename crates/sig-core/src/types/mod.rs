//! Domain types for the sigscan tool.
//!
//! # Module Organization
//!
//! - [`signature`] - Signature records held by the catalog
//! - [`match_result`] - Files found by a scan
//!
//! All public types are re-exported here and at the crate root:
//!
//! ```
//! use sig_core::{MatchResult, SignatureRecord};
//! ```

pub mod match_result;
pub mod signature;

pub use match_result::MatchResult;
pub use signature::SignatureRecord;
