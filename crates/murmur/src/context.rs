//! Document-level parse context shared by the stream, tokenizer and tree
//! builder.

use std::collections::VecDeque;

use crate::atom::AtomTable;
use crate::errors::{ErrorOrigin, ErrorPolicy, ParseError, ParseErrorCode};

/// Callback invoked for every recoverable parse error: `(line, col, code)`.
pub type ErrorHandler = Box<dyn FnMut(u32, u32, ParseErrorCode)>;

/// Instrumentation counters.
#[derive(Clone, Copy, Debug, Default)]
pub struct Counters {
    pub tokens_emitted: u64,
    pub parse_errors: u64,
    pub errors_dropped: u64,
}

/// Document-scoped resources: atom interning, error recording, counters.
pub struct ParseContext {
    pub atoms: AtomTable,
    pub counters: Counters,
    pub error_policy: ErrorPolicy,
    errors: VecDeque<ParseError>,
    error_handler: Option<ErrorHandler>,
}

impl Default for ParseContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseContext {
    pub fn new() -> Self {
        Self {
            atoms: AtomTable::new(),
            counters: Counters::default(),
            error_policy: ErrorPolicy::default(),
            errors: VecDeque::new(),
            error_handler: None,
        }
    }

    pub fn set_error_handler(&mut self, handler: ErrorHandler) {
        self.error_handler = Some(handler);
    }

    /// Record a recoverable parse error. Never panics on malformed input.
    pub fn record_error(&mut self, origin: ErrorOrigin, code: ParseErrorCode, line: u32, col: u32) {
        if self.error_policy.track_counters {
            self.counters.parse_errors = self.counters.parse_errors.saturating_add(1);
        }
        log::trace!(
            target: "murmur.errors",
            "parse error {:?} at {line}:{col} ({:?})",
            code,
            origin
        );
        if let Some(handler) = self.error_handler.as_mut() {
            handler(line, col, code);
        }
        if !self.error_policy.track || self.error_policy.max_stored == 0 {
            return;
        }
        if self.errors.len() >= self.error_policy.max_stored {
            self.errors.pop_front();
            self.counters.errors_dropped = self.counters.errors_dropped.saturating_add(1);
        }
        self.errors.push_back(ParseError {
            origin,
            code,
            line,
            col,
        });
    }

    /// Stored errors, oldest first.
    pub fn errors(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }

    pub fn take_errors(&mut self) -> Vec<ParseError> {
        self.errors.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn record_error_respects_bounded_storage() {
        let mut ctx = ParseContext::new();
        ctx.error_policy.max_stored = 2;
        for _ in 0..5 {
            ctx.record_error(
                ErrorOrigin::Tokenizer,
                ParseErrorCode::UnexpectedNullCharacter,
                1,
                1,
            );
        }
        assert_eq!(ctx.errors().count(), 2);
        assert_eq!(ctx.counters.parse_errors, 5);
        assert_eq!(ctx.counters.errors_dropped, 3);
    }

    #[test]
    fn error_handler_sees_every_error() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut ctx = ParseContext::new();
        ctx.set_error_handler(Box::new(move |line, col, code| {
            sink.borrow_mut().push((line, col, code));
        }));
        ctx.record_error(ErrorOrigin::Stream, ParseErrorCode::InvalidByteSequence, 3, 7);
        assert_eq!(
            seen.borrow().as_slice(),
            &[(3, 7, ParseErrorCode::InvalidByteSequence)]
        );
    }
}
