// Production-quality lints
#![warn(clippy::todo, clippy::unimplemented, clippy::dbg_macro)]
// Deny truly dangerous patterns
#![deny(clippy::mem_forget)]
// Allow common patterns in library code
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! # callsweep
//!
//! Parsing, analysis, and refactoring services for error-call work in
//! EnergyPlus-style C++ source trees.
//!
//! ## Core Concept
//!
//! Large simulation codebases report problems through a family of
//! error-reporting routines (`ShowSevereError`, `ShowContinueError`,
//! `ShowFatalError`, ...). callsweep scans a source tree for those call
//! sites, parses each one into its argument list, groups calls that sit on
//! adjacent lines, and from that can:
//!
//! - **Report** every call and group as JSON and CSV summaries
//! - **Measure** how calls are distributed across each file
//! - **Compare** rewritten messages pairwise to surface near-duplicates
//! - **Rewrite** whole severe/continue/fatal chains in place into a
//!   consolidated `emitErrorMessages` interface carrying a numeric error code
//!
//! The parser is line-based and leans on the host codebase's enforced style
//! (clang-format, no block comments inside calls); it is not a general C++
//! parser.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use callsweep::actions;
//! use std::path::Path;
//!
//! let action = actions::action_by_name("error_call_refactor")?;
//! action.run(Path::new("/path/to/repo"), Path::new("/tmp/out"), false)?;
//! ```

pub mod actions;
pub mod call;
pub mod codes;
pub mod error;
pub mod group;
pub mod logging;
pub mod reports;
pub mod source_file;
pub mod source_folder;

pub use call::{FunctionCall, MAX_LINES_FOR_SINGLE_CALL};
pub use error::{Error, Result};
pub use group::CallGroup;
pub use source_file::{CallMatcher, SourceFile};
pub use source_folder::SourceFolder;

/// Crate version, reported by the CLI and stamped into JSON results.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
