//! OCL VM: the stack-based bytecode interpreter.
//!
//! # Modules
//!
//! - `frame`: the `CallFrame` pushed/popped by `Call`/`Return`
//! - `vm`: the `Vm` struct and its instruction dispatch loop
//! - `builtins`: the builtin dispatch table, matching `ocl_core::builtins`'
//!   numeric ids to their runtime behavior

pub mod builtins;
pub mod frame;
pub mod vm;

pub use vm::{Vm, FRAMES_MAX, STACK_MAX};
