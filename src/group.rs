//! Contiguous chunks of matched calls
//!
//! A group is a maximal run of calls sitting on adjacent source lines.
//! Groups are the unit the consolidation actions reason about: a
//! severe/continue/fatal chain only makes sense as a whole.

use crate::call::FunctionCall;
use crate::reports::{GroupJson, GroupSummary};

/// A contiguous chunk of function calls within one source file.
#[derive(Debug, Clone, Default)]
pub struct CallGroup {
    /// The member calls, in source order.
    pub function_calls: Vec<FunctionCall>,
}

impl CallGroup {
    /// An empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// A group seeded with its first call.
    pub fn with_initial(call: FunctionCall) -> Self {
        Self {
            function_calls: vec![call],
        }
    }

    /// Append a call to this chunk.
    pub fn add(&mut self, call: FunctionCall) {
        self.function_calls.push(call);
    }

    pub fn is_empty(&self) -> bool {
        self.function_calls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.function_calls.len()
    }

    /// Summarize the chunk: call counts, type sequence, line span, and the
    /// member messages concatenated for quick scanning.
    pub fn summary(&self) -> GroupSummary {
        let call_types: Vec<usize> = self.function_calls.iter().map(|c| c.call_type).collect();
        let mut cleaned_call_types = call_types.clone();
        cleaned_call_types.dedup();
        let messages: Vec<String> = self
            .function_calls
            .iter()
            .map(|c| c.parse_arguments().get(1).cloned().unwrap_or_default())
            .collect();
        GroupSummary {
            num_calls_in_this_chunk: self.function_calls.len(),
            call_types,
            cleaned_call_types,
            chunk_start_line: self.function_calls.first().map_or(0, |c| c.line_start),
            chunk_end_line: self.function_calls.last().map_or(0, |c| c.line_end),
            concatenated_messages: messages.join(" *** "),
        }
    }

    /// The JSON form written into `results.json`.
    pub fn to_json(&self) -> GroupJson {
        GroupJson {
            summary: self.summary(),
            original: self.function_calls.iter().map(|c| c.to_string()).collect(),
        }
    }
}
