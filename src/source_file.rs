//! Single source file scanning and rewriting
//!
//! Finds every configured call in one file, derives the contiguous groups
//! and per-line distributions, and can produce the file text with calls (or
//! whole groups) replaced by visitor output.

use crate::call::{FunctionCall, MAX_LINES_FOR_SINGLE_CALL};
use crate::error::{Error, Result};
use crate::group::CallGroup;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Compiled matchers for a configured function list.
///
/// Each name becomes `\bNAME\s*\(`, so a name never matches inside a longer
/// identifier (`ShowContinueError` does not claim
/// `ShowContinueErrorTimeStamp(`). First match in list order wins.
#[derive(Debug, Clone)]
pub struct CallMatcher {
    names: Vec<String>,
    patterns: Vec<Regex>,
}

impl CallMatcher {
    pub fn new(function_names: &[&str]) -> Result<Self> {
        let mut names = Vec::with_capacity(function_names.len());
        let mut patterns = Vec::with_capacity(function_names.len());
        for name in function_names {
            let pattern = Regex::new(&format!(r"\b{}\s*\(", regex::escape(name)))
                .map_err(|e| Error::Parse(format!("bad function name {name:?}: {e}")))?;
            names.push((*name).to_string());
            patterns.push(pattern);
        }
        Ok(Self { names, patterns })
    }

    /// Search a source line for one of the configured calls, returning the
    /// call type and the offset of the name within the line.
    pub fn find_in_line(&self, line: &str) -> Option<(usize, usize)> {
        for (call_type, pattern) in self.patterns.iter().enumerate() {
            if let Some(found) = pattern.find(line) {
                return Some((call_type, found.start()));
            }
        }
        None
    }

    /// Name of a call type.
    pub fn name(&self, call_type: usize) -> &str {
        self.names.get(call_type).map_or("", |n| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One parsed source file: its text, every matched call, and the groups.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub original_text: String,
    pub lines: Vec<String>,
    pub found_functions: Vec<FunctionCall>,
    pub groups: Vec<CallGroup>,
}

impl SourceFile {
    /// Read and scan a file on disk.
    pub fn parse(path: &Path, matcher: &CallMatcher) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_text(path, text, matcher))
    }

    /// Scan already-loaded text. `path` is only used for naming in reports.
    pub fn from_text(path: &Path, text: String, matcher: &CallMatcher) -> Self {
        let lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        let found_functions = find_functions(&lines, matcher);
        let groups = build_groups(&found_functions);
        Self {
            path: path.to_path_buf(),
            original_text: text,
            lines,
            found_functions,
            groups,
        }
    }

    /// File name for report keys.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string()
    }

    /// Per-line call coverage: 1 where the line is part of a call, else 0.
    pub fn function_distribution(&self) -> Vec<usize> {
        let mut rows = vec![0; self.lines.len()];
        for call in &self.found_functions {
            for line in call.line_start..=call.line_end.min(self.lines.len()) {
                rows[line - 1] = 1;
            }
        }
        rows
    }

    /// Per-line call types: `call_type + 1` where the line is part of a
    /// call, 0 where it is not. Overlaps keep the highest type.
    pub fn advanced_function_distribution(&self) -> Vec<usize> {
        let mut rows = vec![0; self.lines.len()];
        for call in &self.found_functions {
            for line in call.line_start..=call.line_end.min(self.lines.len()) {
                rows[line - 1] = rows[line - 1].max(call.call_type + 1);
            }
        }
        rows
    }

    /// The file text with every successfully parsed call replaced by the
    /// visitor's output. Replacements run back to front so earlier offsets
    /// stay valid.
    pub fn text_with_calls_replaced<F>(&self, visitor: F) -> String
    where
        F: Fn(&FunctionCall) -> String,
    {
        let mut text = self.original_text.clone();
        for call in self.found_functions.iter().rev() {
            if !call.appears_successful {
                continue;
            }
            text.replace_range(call.char_start_in_file..=call.char_end_in_file, &visitor(call));
        }
        text
    }

    /// The file text with every group replaced by the visitor's output. The
    /// replaced span runs from the first call's start through the last
    /// call's terminating semicolon; groups containing a failed parse are
    /// left untouched.
    pub fn text_with_groups_replaced<F>(&self, visitor: F) -> String
    where
        F: Fn(&CallGroup) -> String,
    {
        let mut text = self.original_text.clone();
        for group in self.groups.iter().rev() {
            let (Some(first), Some(last)) =
                (group.function_calls.first(), group.function_calls.last())
            else {
                continue;
            };
            if group.function_calls.iter().any(|c| !c.appears_successful) {
                continue;
            }
            text.replace_range(first.char_start_in_file..=last.char_end_in_file, &visitor(group));
        }
        text
    }

    /// Overwrite the file on disk with rewritten text.
    pub fn write_text(&self, new_text: &str) -> Result<()> {
        fs::write(&self.path, new_text)?;
        Ok(())
    }

    /// Human-readable listing of every call found in this file.
    pub fn preview(&self) -> String {
        self.found_functions
            .iter()
            .enumerate()
            .map(|(i, call)| format!("#{i:04}: {call}\n"))
            .collect()
    }
}

/// Offset of the semicolon that terminates a statement on this line, if the
/// line (comment tail removed) ends one.
fn terminal_semicolon(cleaned: &str) -> Option<usize> {
    if cleaned.trim_end().ends_with(';') {
        cleaned.rfind(';')
    } else {
        None
    }
}

fn find_functions(lines: &[String], matcher: &CallMatcher) -> Vec<FunctionCall> {
    let mut found = Vec::new();
    let mut pending: Option<FunctionCall> = None;
    let mut line_start_offset = 0usize;

    for (index, raw_line) in lines.iter().enumerate() {
        let line_number = index + 1;
        // The marker may in principle sit inside a string literal.
        let cleaned = match raw_line.find("//") {
            Some(comment) => &raw_line[..comment],
            None => raw_line.as_str(),
        };

        if let Some(mut call) = pending.take() {
            call.push_line(raw_line);
            if call.line_count() > MAX_LINES_FOR_SINGLE_CALL {
                call.finalize(line_start_offset + raw_line.len(), false);
                found.push(call);
            } else if let Some(semi) = terminal_semicolon(cleaned) {
                call.finalize(line_start_offset + semi, true);
                found.push(call);
            } else {
                pending = Some(call);
            }
        } else if let Some((call_type, offset)) = matcher.find_in_line(cleaned) {
            let mut call = FunctionCall::new(
                call_type,
                matcher.name(call_type),
                line_number,
                line_start_offset + offset,
                offset,
                raw_line,
            );
            if let Some(semi) = terminal_semicolon(cleaned) {
                call.finalize(line_start_offset + semi, true);
                found.push(call);
            } else {
                pending = Some(call);
            }
        }

        line_start_offset += raw_line.len() + 1;
    }

    if let Some(call) = pending {
        // ran off the end of the file mid-call; drop it rather than guess
        tracing::debug!(
            function = %call.function_name,
            line = call.line_start,
            "call still open at end of file, dropping"
        );
    }

    found
}

fn build_groups(calls: &[FunctionCall]) -> Vec<CallGroup> {
    let mut groups = Vec::new();
    let mut current = CallGroup::new();
    let mut last_end_line: Option<usize> = None;

    for call in calls {
        match last_end_line {
            Some(end) if call.line_start == end + 1 => current.add(call.clone()),
            _ => {
                if !current.is_empty() {
                    groups.push(std::mem::take(&mut current));
                }
                current = CallGroup::with_initial(call.clone());
            }
        }
        last_end_line = Some(call.line_end);
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::error_calls::ERROR_CALL_FUNCTIONS;
    use pretty_assertions::assert_eq;

    fn matcher() -> CallMatcher {
        CallMatcher::new(ERROR_CALL_FUNCTIONS).unwrap()
    }

    #[test]
    fn matcher_finds_call_type_and_offset() {
        let (call_type, offset) = matcher()
            .find_in_line("Something - ShowContinueError(blah,")
            .unwrap();
        assert_eq!(call_type, 3);
        assert_eq!(offset, 12);
        assert_eq!(matcher().find_in_line("Nothing here!"), None);
    }

    #[test]
    fn matcher_does_not_let_prefixes_shadow_longer_names() {
        let (call_type, _) = matcher()
            .find_in_line("    ShowContinueErrorTimeStamp(state, \"now\");")
            .unwrap();
        assert_eq!(ERROR_CALL_FUNCTIONS[call_type], "ShowContinueErrorTimeStamp");
    }

    #[test]
    fn matcher_ignores_longer_identifiers_containing_a_name() {
        assert_eq!(matcher().find_in_line("MyShowFatalErrorHelper(state);"), None);
    }

    #[test]
    fn distributions_cover_call_lines() {
        let text = "void f() {\n    ShowSevereError(s, \"a\");\n    int x = 1;\n    ShowContinueError(s,\n        \"b\");\n}\n";
        let sf = SourceFile::from_text(Path::new("demo.cc"), text.to_string(), &matcher());
        assert_eq!(sf.found_functions.len(), 2);
        assert_eq!(sf.function_distribution(), vec![0, 1, 0, 1, 1, 0, 0]);
        // severe is call type 1, continue is call type 3; lines carry type + 1
        assert_eq!(sf.advanced_function_distribution(), vec![0, 2, 0, 4, 4, 0, 0]);
    }

    #[test]
    fn trailing_group_is_flushed() {
        let text = "void f() {\nShowSevereError(s, \"a\");\nint i = 1;\nShowSevereError(s, \"b\");\nShowSevereError(s, \"c\");\n}\n";
        let sf = SourceFile::from_text(Path::new("demo.cc"), text.to_string(), &matcher());
        assert_eq!(sf.found_functions.len(), 3);
        assert_eq!(sf.groups.len(), 2);
        assert_eq!(sf.groups[0].len(), 1);
        assert_eq!(sf.groups[1].len(), 2);
    }

    #[test]
    fn unterminated_call_at_eof_is_dropped() {
        let text = "ShowSevereError(s,\n    \"never closed\"\n";
        let sf = SourceFile::from_text(Path::new("demo.cc"), text.to_string(), &matcher());
        assert!(sf.found_functions.is_empty());
    }
}
