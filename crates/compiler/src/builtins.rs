//! Compiler-side view of the shared builtin catalogue (`ocl_core::builtins`).

use ocl_core::builtins::{lookup_by_name, Arity};

/// The arity a builtin call must satisfy, if `name` names a builtin at all.
pub fn builtin_arity(name: &str) -> Option<Arity> {
    lookup_by_name(name).map(|b| b.arity)
}

/// The builtin's numeric id, used by codegen to emit `CallBuiltin`.
pub fn builtin_id(name: &str) -> Option<u32> {
    lookup_by_name(name).map(|b| b.id)
}
