use std::{borrow::Cow, cell::RefCell, fmt::Display};

/// A tolerated problem found while reading source bytes, anchored to the
/// byte offset it was found at. Only ill-formed UTF-8 produces these;
/// everything else the front-end trips over is fatal.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Diagnostic {
    pub offset: u32,
    pub message: Cow<'static, str>,
}

/// Sink for tolerated diagnostics. Interior mutability lets the scanner
/// report through a shared reference while it holds the codepoint cursor;
/// the driver drains the sink once per phase with [`Diagnostics::take`].
#[derive(Default)]
pub struct Diagnostics {
    entries: RefCell<Vec<Diagnostic>>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    pub fn report(&self, offset: u32, message: impl Into<Cow<'static, str>>) {
        self.entries.borrow_mut().push(Diagnostic {
            offset,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Hand over everything reported so far, leaving the sink empty.
    pub fn take(&self) -> Vec<Diagnostic> {
        self.entries.take()
    }
}

/// Fatal tokenizer error. `offset` is a byte offset into the source.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ScanError {
    pub offset: usize,
    pub message: Cow<'static, str>,
}

impl ScanError {
    pub fn new(offset: usize, message: impl Into<Cow<'static, str>>) -> ScanError {
        ScanError {
            offset,
            message: message.into(),
        }
    }
}

impl Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "byte {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for ScanError {}

/// Fatal meta-parse error. `offset` indexes the token sequence handed to the
/// parser; the driver maps it back to a source position through the token's
/// span. Meta-parse errors abort the compilation, there is no recovery.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ParseError {
    pub offset: usize,
    pub message: Cow<'static, str>,
}

impl ParseError {
    pub fn new(offset: usize, message: impl Into<Cow<'static, str>>) -> ParseError {
        ParseError {
            offset,
            message: message.into(),
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "token {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for ParseError {}
