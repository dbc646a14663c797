//! Refactor actions and their registry
//!
//! An action bundles everything one refactor pass needs: which function
//! names to match, which files to skip, where analysis starts in the
//! repository, and how matched calls or groups get rewritten. The CLI looks
//! actions up by name.

pub mod error_calls;
pub mod flatten;

pub use error_calls::ErrorCallRefactor;
pub use flatten::ErrorCallFlatten;

use crate::call::FunctionCall;
use crate::error::{Error, Result};
use crate::group::CallGroup;
use crate::source_folder::SourceFolder;
use std::path::{Path, PathBuf};

/// Names accepted as the CLI action argument.
pub const ACTION_NAMES: &[&str] = &["error_call_flatten", "error_call_refactor"];

/// Look up an action by its registry name.
pub fn action_by_name(name: &str) -> Result<Box<dyn RefactorAction>> {
    match name {
        "error_call_flatten" => Ok(Box::new(ErrorCallFlatten)),
        "error_call_refactor" => Ok(Box::new(ErrorCallRefactor::new()?)),
        _ => Err(Error::UnknownAction(name.to_string())),
    }
}

/// One refactor pass over a repository.
pub trait RefactorAction {
    /// Function names this action matches in the source.
    fn function_calls(&self) -> &[&'static str];

    /// File names excluded from analysis.
    fn file_names_to_ignore(&self) -> Vec<String> {
        Vec::new()
    }

    /// Where analysis starts, relative to the repository root.
    fn analysis_root(&self, repo_root: &Path) -> PathBuf {
        repo_root.join("src").join("EnergyPlus")
    }

    /// Whether rewriting visits whole groups (true) or single calls.
    fn visits_each_group(&self) -> bool {
        false
    }

    /// Rewrite one call. The default normalizes it onto a single line.
    fn visit_call(&self, call: &FunctionCall) -> String {
        call.rewrite()
    }

    /// Rewrite one group. The default keeps each call on its own line.
    fn visit_group(&self, group: &CallGroup) -> String {
        rewrite_group_verbatim(group)
    }

    /// Drive a full pass: analyze, report, and optionally rewrite in place.
    fn run(&self, source_repo: &Path, output_dir: &Path, in_place: bool) -> Result<()> {
        let root = self.analysis_root(source_repo);
        let folder = SourceFolder::new(&root, self.function_calls())?;
        let files = folder.find_files(&self.file_names_to_ignore())?;
        let processed = folder.analyze(&files)?;
        folder.generate_reports(&processed, output_dir)?;
        if in_place {
            folder.rewrite_files_in_place(&processed, self)?;
        }
        Ok(())
    }
}

/// Functionally equivalent rendering of a group: every call rewritten on its
/// own line, with the preceding text of calls after the first re-emitted
/// (the first call's preceding text stays in the file, ahead of the
/// replacement span).
pub fn rewrite_group_verbatim(group: &CallGroup) -> String {
    group
        .function_calls
        .iter()
        .enumerate()
        .map(|(i, call)| {
            if i > 0 {
                format!("{}{}", call.preceding_text, call.rewrite())
            } else {
                call.rewrite()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_every_listed_action() {
        for name in ACTION_NAMES {
            let action = action_by_name(name).unwrap();
            assert!(!action.function_calls().is_empty());
        }
    }

    #[test]
    fn registry_rejects_unknown_names() {
        assert!(matches!(
            action_by_name("something_else"),
            Err(Error::UnknownAction(_))
        ));
    }

    #[test]
    fn default_analysis_root_points_into_the_repo() {
        let action = ErrorCallFlatten;
        let root = action.analysis_root(Path::new("repo"));
        assert!(root.ends_with("src/EnergyPlus"));
    }
}
