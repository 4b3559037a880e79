use std::error::Error;
use std::{fmt, io};

/// Broad family an [`FfsError`](crate::error::FfsError) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Errors found while compiling the source text.
    Syntax,
    /// Errors raised by the virtual machine while running a program.
    Runtime,
    /// File or stream errors.
    Io,
    /// Bad command line arguments.
    Argument,
    /// Broken internal invariants.
    Internal
}

impl ErrorCategory {

    /// Short tag used in diagnostics.
    pub fn name(self) -> &'static str {
        use ErrorCategory::*;
        match self {
            Syntax   => "syntax",
            Runtime  => "runtime",
            Io       => "io",
            Argument => "argument",
            Internal => "internal"
        }
    }

}

/// The specific kind of an [`FfsError`](crate::error::FfsError).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnmatchedBracket,
    MismatchedLabels,
    InvalidNumber,
    EmptyNumber,
    OutOfRange,
    PointerOverflow,
    PointerUnderflow,
    MemoryLimitExceeded,
    InvalidJumpTarget,
    InstructionLimitExceeded,
    StreamError,
    FileNotFound,
    FileReadError,
    InvalidArgumentValue,
    MissingArgumentValue,
    UnknownArgument,
    InternalError
}

impl ErrorKind {

    /// Short tag used in diagnostics.
    pub fn name(self) -> &'static str {
        use ErrorKind::*;
        match self {
            UnmatchedBracket         => "unmatched-bracket",
            MismatchedLabels         => "mismatched-labels",
            InvalidNumber            => "invalid-number",
            EmptyNumber              => "empty-number",
            OutOfRange               => "out-of-range",
            PointerOverflow          => "pointer-overflow",
            PointerUnderflow         => "pointer-underflow",
            MemoryLimitExceeded      => "memory-limit",
            InvalidJumpTarget        => "invalid-jump",
            InstructionLimitExceeded => "instruction-limit",
            StreamError              => "stream-error",
            FileNotFound             => "file-not-found",
            FileReadError            => "file-read-error",
            InvalidArgumentValue     => "invalid-value",
            MissingArgumentValue     => "missing-value",
            UnknownArgument          => "unknown-argument",
            InternalError            => "internal"
        }
    }

}

/// Where in the source text an error was detected.
///
/// `line` and `column` are 1-based. A `line` of zero means only the raw byte offset is known.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    pub filename: Option<String>
}

impl SourceLocation {

    /// A location that only knows its byte offset.
    pub fn at(offset: usize) -> SourceLocation {
        SourceLocation {
            offset,
            ..SourceLocation::default()
        }
    }

    /// Computes line and column of `offset` inside `source`.
    pub fn resolve(offset: usize, source: &str, filename: Option<&str>) -> SourceLocation {
        let mut line = 1;
        let mut column = 1;
        for b in source.bytes().take(offset) {
            if b == b'\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        SourceLocation {
            offset,
            line,
            column,
            filename: filename.map(str::to_owned)
        }
    }

}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.filename.as_ref().map(String::as_str).unwrap_or("input"))?;
        if self.line > 0 {
            write!(f, ":{}:{}", self.line, self.column)
        } else {
            write!(f, " at position {}", self.offset)
        }
    }
}

/// Every failure the compiler, the virtual machine or the command line can produce.
#[derive(Debug)]
pub struct FfsError {
    pub category: ErrorCategory,
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<SourceLocation>,
    pub note: Option<String>,
    pub suggestion: Option<String>
}

impl FfsError {

    pub fn new(category: ErrorCategory, kind: ErrorKind, message: impl Into<String>) -> FfsError {
        FfsError {
            category,
            kind,
            message: message.into(),
            location: None,
            note: None,
            suggestion: None
        }
    }

    pub fn syntax(kind: ErrorKind, message: impl Into<String>) -> FfsError {
        FfsError::new(ErrorCategory::Syntax, kind, message)
    }

    pub fn runtime(kind: ErrorKind, message: impl Into<String>) -> FfsError {
        FfsError::new(ErrorCategory::Runtime, kind, message)
    }

    pub fn io(kind: ErrorKind, message: impl Into<String>) -> FfsError {
        FfsError::new(ErrorCategory::Io, kind, message)
    }

    pub fn argument(kind: ErrorKind, message: impl Into<String>) -> FfsError {
        FfsError::new(ErrorCategory::Argument, kind, message)
    }

    pub fn internal(message: impl Into<String>) -> FfsError {
        FfsError::new(ErrorCategory::Internal, ErrorKind::InternalError, message)
    }

    pub fn with_location(mut self, location: SourceLocation) -> FfsError {
        self.location = Some(location);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> FfsError {
        self.note = Some(note.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> FfsError {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Turns a bare byte offset into a full line/column location inside `source`.
    /// Locations that are already resolved are left untouched.
    pub fn locate(mut self, source: &str, filename: Option<&str>) -> FfsError {
        self.location = match self.location.take() {
            Some(ref loc) if loc.line == 0 => Some(SourceLocation::resolve(loc.offset, source, filename)),
            other => other
        };
        self
    }

    /// Wraps an I/O failure on one of the virtual machine byte streams.
    pub fn stream(what: &str, e: io::Error) -> FfsError {
        FfsError::io(ErrorKind::StreamError, format!("Failed to {}: {}", what, e))
    }

}

impl Error for FfsError {}

impl fmt::Display for FfsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}:{}] {}", self.category.name(), self.kind.name(), self.message)?;
        if let Some(ref loc) = self.location {
            write!(f, " ({})", loc)?;
        }
        Ok(())
    }
}

impl From<io::Error> for FfsError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => {
                FfsError::io(ErrorKind::FileNotFound, format!("File not found: {}", e))
                    .with_suggestion("Check that the path is spelled correctly")
            },
            _ => {
                FfsError::io(ErrorKind::FileReadError, format!("I/O error: {}", e))
            }
        }
    }
}
