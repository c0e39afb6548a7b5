//! OCL Core: shared runtime primitives for the OCL toolchain.
//!
//! This crate provides the language-agnostic types shared by the compiler
//! and the virtual machine:
//!
//! - `value`: the `Value` enum and its owned/borrowed string representation
//! - `location`: `SourceLocation`, the line/column/file triple attached to
//!   every token, AST node, and bytecode instruction

pub mod builtins;
pub mod location;
pub mod value;

pub use location::SourceLocation;
pub use value::{OclString, Value, ValueType};
