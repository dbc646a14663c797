//! Error call consolidation action
//!
//! Rewrites whole severe/continue/fatal chains into the consolidated
//! `emitErrorMessage(s)` / `emitWarningMessage(s)` interface, stamping each
//! rewritten group with an error code classified against the known-wordings
//! catalog. Groups that do not fit a recognized shape are re-emitted
//! unchanged in meaning, one call per line.

use crate::actions::{rewrite_group_verbatim, RefactorAction};
use crate::codes::{CodeCatalog, TermVector, ERROR_CODE_UNCLASSIFIED};
use crate::error::Result;
use crate::group::CallGroup;
use crate::logging::Progress;
use crate::source_folder::SourceFolder;
use std::fs;
use std::path::Path;
use std::time::Instant;

/// The error-reporting function family matched by this action.
pub const ERROR_CALL_FUNCTIONS: &[&str] = &[
    "ShowFatalError",
    "ShowSevereError",
    "ShowSevereMessage",
    "ShowContinueError",
    "ShowContinueErrorTimeStamp",
    "ShowMessage",
    "ShowWarningError",
    "ShowWarningMessage",
    "ShowRecurringSevereErrorAtEnd",
    "ShowRecurringWarningErrorAtEnd",
    "ShowRecurringContinueErrorAtEnd",
    "StoreRecurringErrorMessage",
    "SummarizeErrors",
    "ShowRecurringErrors",
    "ShowSevereDuplicateName",
    "ShowSevereItemNotFound",
    "ShowSevereInvalidKey",
    "ShowSevereInvalidBool",
    "ShowSevereEmptyField",
    "ShowWarningInvalidKey",
    "ShowWarningInvalidBool",
    "ShowWarningEmptyField",
    "ShowWarningItemNotFound",
];

/// Call type indices (positions in [`ERROR_CALL_FUNCTIONS`]) the
/// consolidation rules reason about.
pub mod call_symbols {
    pub const SHOW_FATAL_ERROR: usize = 0;
    pub const SHOW_SEVERE_ERROR: usize = 1;
    pub const SHOW_SEVERE_MESSAGE: usize = 2;
    pub const SHOW_CONTINUE_ERROR: usize = 3;
    pub const SHOW_WARNING_ERROR: usize = 6;
    pub const SHOW_WARNING_MESSAGE: usize = 7;
}

/// Lines written to the similarity listing at most.
const MAX_COMPARISON_LINES: usize = 10_000;

/// The consolidation action.
pub struct ErrorCallRefactor {
    catalog: CodeCatalog,
}

impl ErrorCallRefactor {
    /// Build the action with the catalog shipped in the binary.
    pub fn new() -> Result<Self> {
        Ok(Self {
            catalog: CodeCatalog::builtin()?,
        })
    }

    /// Build the action with a caller-supplied catalog.
    pub fn with_catalog(catalog: CodeCatalog) -> Self {
        Self { catalog }
    }

    /// Rewrite a group into the consolidated interface where its shape
    /// allows, otherwise fall back to the functionally equivalent per-line
    /// form.
    fn consolidated_group_text(&self, group: &CallGroup) -> String {
        use call_symbols::*;

        if group
            .function_calls
            .iter()
            .any(|call| !call.preceding_text.is_empty())
        {
            // meaningful text outside the calls themselves; leave the group alone
            return rewrite_group_verbatim(group);
        }
        let calls = &group.function_calls;
        let (Some(first), Some(last)) = (calls.first(), calls.last()) else {
            return String::new();
        };

        let parsed: Vec<Vec<String>> = calls.iter().map(|c| c.parse_arguments()).collect();
        if parsed.iter().any(|args| args.len() < 2) {
            return rewrite_group_verbatim(group);
        }
        let state = parsed[0][0].as_str();
        let messages: Vec<&str> = parsed.iter().map(|args| args[1].as_str()).collect();
        let argument_listing = format!("{{{}}}", messages.join(", "));
        let argument_one = messages[0];

        let one_liner = calls.len() == 1;
        let valid_middle = calls.len() <= 2
            || calls[1..calls.len() - 1]
                .iter()
                .all(|c| c.call_type == SHOW_CONTINUE_ERROR);
        let starts_with_fatal = first.call_type == SHOW_FATAL_ERROR;
        let starts_with_severe = first.call_type == SHOW_SEVERE_ERROR;
        let starts_with_warning = first.call_type == SHOW_WARNING_MESSAGE;
        let starts_with_warning_error = first.call_type == SHOW_WARNING_ERROR;
        let ends_with_fatal = last.call_type == SHOW_FATAL_ERROR;
        let ends_with_continue = last.call_type == SHOW_CONTINUE_ERROR;

        let template = |code: i32| -> Option<String> {
            if starts_with_severe && valid_middle && ends_with_fatal {
                Some(format!("emitErrorMessages({state}, {code}, {argument_listing}, true);"))
            } else if starts_with_severe && valid_middle && ends_with_continue {
                Some(format!("emitErrorMessages({state}, {code}, {argument_listing}, false);"))
            } else if starts_with_warning && valid_middle && ends_with_continue {
                Some(format!("emitWarningMessages({state}, {code}, {argument_listing});"))
            } else if starts_with_warning_error && valid_middle && ends_with_continue {
                Some(format!("emitWarningMessages({state}, {code}, {argument_listing}, true);"))
            } else if one_liner && starts_with_warning {
                Some(format!("emitWarningMessage({state}, {code}, {argument_one});"))
            } else if one_liner && starts_with_warning_error {
                Some(format!("emitWarningMessage({state}, {code}, {argument_one}, true);"))
            } else if one_liner && starts_with_severe {
                Some(format!("emitErrorMessage({state}, {code}, {argument_one}, false);"))
            } else if one_liner && starts_with_fatal {
                Some(format!("emitErrorMessage({state}, {code}, {argument_one}, true);"))
            } else {
                None
            }
        };

        let Some(unclassified) = template(ERROR_CODE_UNCLASSIFIED) else {
            return rewrite_group_verbatim(group);
        };
        let code = self.catalog.classify(&unclassified);
        if code == ERROR_CODE_UNCLASSIFIED {
            return unclassified;
        }
        template(code).unwrap_or(unclassified)
    }

    /// Pairwise similarity of every rewritten group text, most similar
    /// first. A review aid for spotting near-duplicate wordings that should
    /// share a code. The pair count is quadratic, so this is skipped on CI.
    fn write_similarity_listing(&self, texts: &[String], output_dir: &Path) -> Result<()> {
        if std::env::var_os("CI").is_some() {
            tracing::debug!("CI environment detected, skipping similarity listing");
            return Ok(());
        }
        let vectors: Vec<TermVector> = texts.iter().map(|t| TermVector::build(t)).collect();
        let pair_count = texts.len().saturating_mul(texts.len().saturating_sub(1)) / 2;
        tracing::info!(
            messages = texts.len(),
            pairs = pair_count,
            "comparing rewritten messages pairwise"
        );

        let progress = Progress::new(pair_count);
        let started = Instant::now();
        let mut compares: Vec<(f64, usize, usize)> = Vec::with_capacity(pair_count);
        let mut counter = 0usize;
        for i in 0..vectors.len() {
            for j in (i + 1)..vectors.len() {
                compares.push((vectors[i].cosine(&vectors[j]), i, j));
                counter += 1;
                if counter % 200 == 0 {
                    let elapsed = started.elapsed().as_secs_f64();
                    let remaining = (elapsed / counter as f64) * (pair_count - counter) as f64;
                    progress.update(counter, &format!("estimated time remaining: {remaining:.1}s"));
                }
            }
        }
        progress.done();
        compares.sort_by(|a, b| b.0.total_cmp(&a.0));

        fs::create_dir_all(output_dir)?;
        let mut listing = String::new();
        for (score, i, j) in compares.iter().take(MAX_COMPARISON_LINES) {
            listing.push_str(&format!("{} 😊 {} 😊 {}\n", texts[*i], texts[*j], score));
        }
        fs::write(output_dir.join("comparisons.txt"), listing)?;
        Ok(())
    }
}

impl RefactorAction for ErrorCallRefactor {
    fn function_calls(&self) -> &[&'static str] {
        ERROR_CALL_FUNCTIONS
    }

    fn file_names_to_ignore(&self) -> Vec<String> {
        // the file defining the error call family would match everywhere
        vec!["UtilityRoutines.cc".to_string()]
    }

    fn visits_each_group(&self) -> bool {
        true
    }

    fn visit_group(&self, group: &CallGroup) -> String {
        self.consolidated_group_text(group)
    }

    fn run(&self, source_repo: &Path, output_dir: &Path, in_place: bool) -> Result<()> {
        let root = self.analysis_root(source_repo);
        let folder = SourceFolder::new(&root, self.function_calls())?;
        let files = folder.find_files(&self.file_names_to_ignore())?;
        let processed = folder.analyze(&files)?;

        let mut rewritten: Vec<String> = Vec::new();
        for source_file in &processed {
            for group in &source_file.groups {
                rewritten.push(self.visit_group(group).replace('\n', " "));
            }
        }
        self.write_similarity_listing(&rewritten, output_dir)?;

        folder.generate_reports(&processed, output_dir)?;
        if in_place {
            folder.rewrite_files_in_place(&processed, self)?;
        }
        Ok(())
    }
}
