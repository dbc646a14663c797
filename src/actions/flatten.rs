//! Single-line call normalization action
//!
//! The earliest refactor pass this tool supported: every matched call is
//! rewritten onto one normalized line. The result round-trips cleanly
//! through clang-format, which makes follow-up refactor diffs easy to read.

use crate::actions::error_calls::ERROR_CALL_FUNCTIONS;
use crate::actions::RefactorAction;

/// Flattens every matched error call onto a single line.
pub struct ErrorCallFlatten;

impl RefactorAction for ErrorCallFlatten {
    fn function_calls(&self) -> &[&'static str] {
        ERROR_CALL_FUNCTIONS
    }

    fn file_names_to_ignore(&self) -> Vec<String> {
        // the file defining the error call family would match everywhere
        vec!["UtilityRoutines.cc".to_string()]
    }
}
