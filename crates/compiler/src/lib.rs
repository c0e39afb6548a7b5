//! OCL Compiler: lexing, parsing, type checking, and bytecode generation.
//!
//! # Modules
//!
//! - `token` / `lexer`: turn source text into a token stream
//! - `ast`: the syntax tree
//! - `parser`: Pratt expression parsing + recursive-descent statements
//! - `symtab`: the scope-aware symbol table shared by `typechecker` and `codegen`
//! - `typechecker`: declaration/usage validation
//! - `codegen`: two-pass bytecode generation
//! - `bytecode`: the `Bytecode` container produced by codegen
//! - `builtins`: compiler-side view of the shared builtin catalogue
//! - `diagnostics`: the `ErrorCollector` and its wire-format diagnostics
//! - `config`: compiler-facing knobs independent of the CLI

pub mod ast;
pub mod builtins;
pub mod bytecode;
pub mod codegen;
pub mod config;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod symtab;
pub mod token;
pub mod typechecker;

use std::rc::Rc;

pub use bytecode::Bytecode;
pub use config::CompilerConfig;
pub use diagnostics::{Diagnostic, ErrorCollector, ErrorKind};

use lexer::Lexer;
use parser::Parser;
use token::TokenType;
use typechecker::TypeChecker;

/// The outcome of a full compile: either bytecode ready to execute, or the
/// collector holding every diagnostic gathered before the halting phase.
pub enum CompileOutcome {
    Ok(Bytecode),
    Err(ErrorCollector),
}

/// Run the lex -> parse -> typecheck -> codegen pipeline, halting between
/// phases exactly as the reference driver does: a phase's errors are
/// surfaced immediately rather than let later phases run over a broken
/// tree.
pub fn compile_source(source: &str, filename: &str, config: &CompilerConfig) -> CompileOutcome {
    let file: Rc<str> = Rc::from(filename);
    let mut errors = ErrorCollector::new();

    let tokens = Lexer::new(source, file.clone()).tokenize_all();
    for t in &tokens {
        if t.ttype == TokenType::Error {
            errors.add(ErrorKind::Lexer, format!("unrecognized character '{}'", t.lexeme), Some(t.location.clone()));
        }
    }
    if errors.has_errors() {
        return CompileOutcome::Err(errors);
    }

    let program = {
        let parser = Parser::new(tokens, &mut errors);
        parser.parse_program()
    };
    if errors.has_errors() {
        return CompileOutcome::Err(errors);
    }

    {
        let mut checker = TypeChecker::new(&mut errors);
        checker.check(&program);
    }
    if errors.has_errors() {
        return CompileOutcome::Err(errors);
    }

    let bytecode = {
        let gen = codegen::CodeGenerator::new(config, &mut errors);
        gen.generate(&program, file)
    };
    if errors.has_errors() {
        return CompileOutcome::Err(errors);
    }

    CompileOutcome::Ok(bytecode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_simple_program() {
        let config = CompilerConfig::default();
        match compile_source("Let x = 1 + 2", "t.ocl", &config) {
            CompileOutcome::Ok(bc) => assert!(!bc.instructions.is_empty()),
            CompileOutcome::Err(errors) => panic!("unexpected errors: {:?}", errors.errors()),
        }
    }

    #[test]
    fn lexer_errors_halt_before_parsing() {
        let config = CompilerConfig::default();
        match compile_source("Let x = @", "t.ocl", &config) {
            CompileOutcome::Err(errors) => assert!(errors.has_errors()),
            CompileOutcome::Ok(_) => panic!("expected lexer error to halt the pipeline"),
        }
    }
}
