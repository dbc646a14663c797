//! A single matched call site
//!
//! The parsing here relies on EnergyPlus source style assumptions (enforced
//! clang-format, no block comments inside call expressions) and is not a
//! general C++ parser.

use std::fmt;

/// Calls spanning more lines than this are assumed to be parser confusion
/// and are finalized unsuccessfully.
pub const MAX_LINES_FOR_SINGLE_CALL: usize = 13;

/// One matched function call in a source file, possibly spanning lines.
///
/// A call is built incrementally: constructed from the first line where the
/// match occurred, extended with continuation lines, then finalized once the
/// terminating semicolon (or the line cap) is reached. All offsets are byte
/// offsets into the original file text.
#[derive(Debug, Clone)]
pub struct FunctionCall {
    /// Index of the matched function name in the active function list.
    pub call_type: usize,
    /// The matched function name.
    pub function_name: String,
    /// 1-based line where the call starts.
    pub line_start: usize,
    /// 1-based line where the call ends.
    pub line_end: usize,
    /// Offset of the call start in the file text.
    pub char_start_in_file: usize,
    /// Offset of the call start within its first line.
    pub char_start_first_line: usize,
    /// Offset of the terminating semicolon in the file text.
    pub char_end_in_file: usize,
    /// Source text ahead of the call on its first line, trimmed.
    pub preceding_text: String,
    /// Whether the parse looked sane when the call was finalized.
    pub appears_successful: bool,
    lines: Vec<String>,
}

impl FunctionCall {
    /// Start a new call from the line where the function name matched.
    pub fn new(
        call_type: usize,
        function_name: &str,
        line_start: usize,
        char_start_in_file: usize,
        char_start_first_line: usize,
        first_line: &str,
    ) -> Self {
        let preceding_text = first_line
            .get(..char_start_first_line)
            .unwrap_or("")
            .trim()
            .to_string();
        Self {
            call_type,
            function_name: function_name.to_string(),
            line_start,
            line_end: line_start,
            char_start_in_file,
            char_start_first_line,
            char_end_in_file: 0,
            preceding_text,
            appears_successful: true,
            lines: vec![first_line.to_string()],
        }
    }

    /// Append a continuation line of a multi-line call.
    pub fn push_line(&mut self, line: &str) {
        self.line_end += 1;
        self.lines.push(line.to_string());
    }

    /// Number of source lines gathered so far.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Mark the call complete, recording where it ends and whether the
    /// parse appeared successful.
    pub fn finalize(&mut self, char_end_in_file: usize, appears_successful: bool) {
        self.char_end_in_file = char_end_in_file;
        self.appears_successful = appears_successful;
    }

    /// The call text as sanitized lines: the first line sliced from the call
    /// start, every line trimmed.
    pub fn as_cleaned_multiline(&self) -> Vec<String> {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                if i == 0 {
                    line.get(self.char_start_first_line..).unwrap_or("")
                } else {
                    line.as_str()
                }
                .trim()
                .to_string()
            })
            .collect()
    }

    /// The call text collapsed onto a single line.
    pub fn as_single_line(&self) -> String {
        self.as_cleaned_multiline().join("").trim().to_string()
    }

    /// Split the call into its argument strings.
    ///
    /// A small state machine walks the cleaned call text: it waits for the
    /// opening parenthesis, tracks nested parentheses and string/char/raw
    /// literals on a grouping stack, honors backslash escapes, skips `//`
    /// comments through end of line, eats newlines, and splits on top-level
    /// commas. Unbalanced parentheses indicate a parser problem and yield an
    /// empty list.
    pub fn parse_arguments(&self) -> Vec<String> {
        let source = self.as_cleaned_multiline().join("\n");
        let chars: Vec<char> = source.chars().collect();
        let mut args: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut stack: Vec<Group> = Vec::new();
        let mut ignore_next = false;
        let mut reached_args = false;
        let mut entering_raw = false;
        let mut in_line_comment = false;

        for i in 0..chars.len() {
            let c = chars[i];
            if !reached_args {
                // nothing interesting until the opening parenthesis
                if c == '(' {
                    stack.push(Group::Paren);
                    reached_args = true;
                }
            } else if in_line_comment {
                if c == '\n' {
                    in_line_comment = false;
                }
            } else if matches!(stack.last(), Some(Group::Raw)) {
                current.push(c);
                if c == '"' && i > 0 && chars[i - 1] == ')' {
                    stack.pop();
                }
            } else if ignore_next {
                current.push(c);
                ignore_next = false;
            } else if matches!(stack.last(), Some(Group::Double | Group::Single)) && c == '\\' {
                current.push(c);
                ignore_next = true;
            } else if matches!(stack.last(), Some(Group::Single)) {
                current.push(c);
                if c == '\'' {
                    stack.pop();
                }
            } else if c == '"' {
                current.push(c);
                if matches!(stack.last(), Some(Group::Double)) {
                    stack.pop();
                } else if entering_raw {
                    stack.push(Group::Raw);
                    entering_raw = false;
                } else {
                    stack.push(Group::Double);
                }
            } else if matches!(stack.last(), Some(Group::Double)) {
                current.push(c);
            } else if c == '\'' {
                current.push(c);
                stack.push(Group::Single);
            } else if c == '(' {
                current.push(c);
                stack.push(Group::Paren);
            } else if c == ')' {
                if !matches!(stack.last(), Some(Group::Paren)) {
                    tracing::warn!(
                        function = %self.function_name,
                        line = self.line_start,
                        "unbalanced parentheses; probably a parser problem"
                    );
                    return Vec::new();
                }
                stack.pop();
                if stack.is_empty() {
                    args.push(std::mem::take(&mut current));
                    break;
                }
                current.push(c);
            } else if c == ',' && stack.len() == 1 {
                args.push(std::mem::take(&mut current));
            } else if c == 'R' && chars.get(i + 1) == Some(&'"') && chars.get(i + 2) == Some(&'(') {
                entering_raw = true;
                current.push(c);
            } else if c == '/' && chars.get(i + 1) == Some(&'/') {
                in_line_comment = true;
            } else if c == '\n' {
                // newlines between arguments carry no meaning
            } else {
                current.push(c);
            }
        }

        args.iter().map(|a| a.trim().to_string()).collect()
    }

    /// The call rewritten in a functionally equivalent single-line form.
    pub fn rewrite(&self) -> String {
        format!("{}({});", self.function_name, self.parse_arguments().join(", "))
    }
}

/// Grouping constructs the argument parser tracks.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Group {
    Paren,
    Double,
    Single,
    Raw,
}

impl fmt::Display for FunctionCall {
    /// One-line summary of the call, for previews and JSON listings.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let single = self.as_single_line();
        let head: String = single.chars().take(35).collect();
        write!(f, "{} - {} : {}", self.line_start, self.line_end, head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn call_from(full_text: &str) -> FunctionCall {
        let name_end = full_text.find('(').unwrap_or(0);
        let mut lines = full_text.split('\n');
        let first_line = lines.next().unwrap_or("");
        let mut call = FunctionCall::new(0, &full_text[..name_end], 1, 0, 0, first_line);
        for line in lines {
            call.push_line(line);
        }
        call.finalize(full_text.len(), true);
        call
    }

    #[rstest]
    #[case::normal_single_line(
        "ShowContinueError(state, \"Something happened\", DummyArgument);",
        3
    )]
    #[case::embedded_quote("ShowContinueError(state, \"Something happened\");", 2)]
    #[case::apostrophe_char_arg("ShowContinueError(state, 'x');", 2)]
    #[case::complex_escapes(
        "ShowSevereMessage(state, format(\"{} \\\"{}\\\":\",\n            DataPlant::PlantEquipTypeNames[static_cast<int>(this->EIRHPType)], this->name));",
        2
    )]
    #[case::normal_multiline(
        "ShowContinueError(state,\n        format(\n            \"It might be this: {} or that: {}, or even that: {}\",\n            state.data->Node(1).Temp,\n            state.data->CoolVector[x].attributeY\n        )\n    );",
        2
    )]
    #[case::comment_inside_call(
        "ShowWarningError( // RecurringWarningErrorAtEnd(\n                            state,\n                            format(\"{} \\\"{}\\\": HP evaporator DeltaTemp = 0 in mass flow calculation continues...\",\n                                   DataPlant::PlantEquipTypeNames[static_cast<int>(this->EIRHPType)],\n                                   this->name));",
        2
    )]
    #[case::trailing_comment(
        "ShowSevereError(state,\n                        \"Standard Ratings: Coil:Cooling:DX \" + this->name + // TODO: Use dynamic COIL name later\n                            \" has zero rated total cooling capacity. Standard ratings cannot be calculated.\");",
        2
    )]
    #[case::apostrophe_char_literal("ShowContinueError(s, \"(\" + c + ')');", 2)]
    #[case::weird_apostrophes(
        "ShowSevereError(s, \"='\" + a + \"' invalid \" + name + \"='\" + arr);",
        2
    )]
    #[case::raw_literal("ShowContinueError(state, R\"(Extra \"Argument\" (right) Here)\");", 2)]
    fn parses_expected_argument_count(#[case] text: &str, #[case] expected: usize) {
        assert_eq!(call_from(text).parse_arguments().len(), expected);
    }

    #[test]
    fn keeps_embedded_apostrophes_intact() {
        let call = call_from("ShowContinueError(s, \"comp='{}', type='{}', key='{}'.\");");
        let args = call.parse_arguments();
        assert_eq!(args.len(), 2);
        assert_eq!(args[1], "\"comp='{}', type='{}', key='{}'.\"");
    }

    #[test]
    fn keeps_raw_literal_intact() {
        let call = call_from("ShowContinueError(state, R\"(Extra \"Argument\" (right) Here)\");");
        let args = call.parse_arguments();
        assert_eq!(args[1], "R\"(Extra \"Argument\" (right) Here)\"");
    }

    #[test]
    fn rewrite_produces_single_line() {
        let call = call_from("ShowContinueError(state,\n    \"spread\",\n    over);");
        assert_eq!(call.rewrite(), "ShowContinueError(state, \"spread\", over);");
    }

    #[test]
    fn display_summarizes_the_call() {
        let call = call_from("ShowContinueError(state, \"Something happened\", DummyArgument);");
        let shown = call.to_string();
        assert!(shown.starts_with("1 - 1 : "));
        assert!(shown.contains("ShowContinueError"));
    }

    #[test]
    fn preceding_text_is_trimmed_first_line_prefix() {
        let call = FunctionCall::new(0, "ShowFatalError", 1, 4, 4, "Hi; ShowFatalError(s, \"bar\");");
        assert_eq!(call.preceding_text, "Hi;");
        let indented = FunctionCall::new(1, "ShowSevereError", 3, 40, 8, "        ShowSevereError(s, \"x\");");
        assert_eq!(indented.preceding_text, "");
    }
}
