//! Diagnostic collection, shared by every compiler phase.
//!
//! Mirrors the reference `ErrorCollector`: each phase appends its findings
//! here rather than failing fast, and the driver only halts between phases
//! once a phase leaves the collector non-empty.

use std::fmt;

use ocl_core::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexer,
    Parser,
    TypeChecker,
    Runtime,
}

impl ErrorKind {
    fn label(&self) -> &'static str {
        match self {
            ErrorKind::Lexer => "LEXER ERROR",
            ErrorKind::Parser => "PARSE ERROR",
            ErrorKind::TypeChecker => "TYPE ERROR",
            ErrorKind::Runtime => "RUNTIME ERROR",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{}: {} [{}]", self.kind.label(), self.message, loc),
            None => write!(f, "{}: {}", self.kind.label(), self.message),
        }
    }
}

#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Vec<Diagnostic>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        ErrorCollector::default()
    }

    pub fn add(&mut self, kind: ErrorKind, message: impl Into<String>, location: Option<SourceLocation>) {
        self.errors.push(Diagnostic { kind, message: message.into(), location });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    /// Print every collected diagnostic to stderr, one per line, in the
    /// exact `KIND: message [file:line:column]` wire format.
    pub fn print_all(&self) {
        for err in &self.errors {
            eprintln!("{}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn formats_with_location() {
        let loc = SourceLocation::new(3, 7, Rc::from("a.ocl"));
        let d = Diagnostic { kind: ErrorKind::Parser, message: "unexpected token".into(), location: Some(loc) };
        assert_eq!(d.to_string(), "PARSE ERROR: unexpected token [a.ocl:3:7]");
    }

    #[test]
    fn formats_without_location() {
        let d = Diagnostic { kind: ErrorKind::TypeChecker, message: "bad".into(), location: None };
        assert_eq!(d.to_string(), "TYPE ERROR: bad");
    }

    #[test]
    fn collector_tracks_has_errors() {
        let mut c = ErrorCollector::new();
        assert!(!c.has_errors());
        c.add(ErrorKind::Lexer, "oops", None);
        assert!(c.has_errors());
        assert_eq!(c.errors().len(), 1);
    }
}
