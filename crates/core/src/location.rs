use std::fmt;
use std::rc::Rc;

/// Where a token, AST node, or bytecode instruction came from.
///
/// `line` and `column` are 1-indexed, matching the lexer's starting state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    pub file: Rc<str>,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32, file: Rc<str>) -> Self {
        SourceLocation { line, column, file }
    }

    /// A placeholder location for synthesized instructions (e.g. the
    /// trailing `Halt` emitted at the end of a program).
    pub fn synthetic(file: Rc<str>) -> Self {
        SourceLocation { line: 1, column: 1, file }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}
