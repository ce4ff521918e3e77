//! # gommit
//!
//! Generates git commit messages for staged changes with an LLM.
//!
//! The pipeline collects the staged diff ([`git`]), shapes each file's
//! diff to a bounded size ([`diff`]), composes the request ([`prompt`]),
//! and sends it to one of the providers in the catalog ([`provider`],
//! [`ai`]). [`generate::generate_commit_message`] runs the whole pass.
//!
//! ```rust
//! use gommit::diff::shape_diff;
//!
//! let diff = "+one\n+two\n";
//! assert_eq!(shape_diff(diff, 3, 300), diff);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod ai;
pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod generate;
pub mod git;
pub mod prompt;
pub mod provider;

pub use crate::cli::Cli;
pub use crate::error::GommitError;
pub use crate::generate::generate_commit_message;

/// The current version of gommit.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
