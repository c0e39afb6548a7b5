//! Compiler-facing configuration, independent of the CLI surface.

/// Builder-pattern configuration for a single compile. Constructed with
/// [`CompilerConfig::default`] and refined with the `with_*` methods.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// When `true`, referencing an undeclared variable is a hard
    /// `ErrorKind::TypeChecker` diagnostic. When `false` (the default),
    /// codegen falls back to the original interpreter's lenient behavior:
    /// print a warning and treat the reference as slot 0.
    pub undefined_variable_is_error: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig { undefined_variable_is_error: false }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        CompilerConfig::default()
    }

    pub fn with_undefined_variable_is_error(mut self, strict: bool) -> Self {
        self.undefined_variable_is_error = strict;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_lenient() {
        assert!(!CompilerConfig::default().undefined_variable_is_error);
    }

    #[test]
    fn builder_sets_strict_mode() {
        let cfg = CompilerConfig::new().with_undefined_variable_is_error(true);
        assert!(cfg.undefined_variable_is_error);
    }
}
