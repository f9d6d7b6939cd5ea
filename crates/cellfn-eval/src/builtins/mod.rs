//! Builtin functions and operators, registered into the static table in
//! [`crate::function_registry`].

use crate::function_registry::FunctionTable;

pub mod info;
pub mod logical;
pub mod math;
pub mod operators;
pub mod reference_fns;
pub mod text;
mod utils;

/// Namespace of prefix/postfix operators (`-x`, `x%`).
pub const UNARY_OP_NS: &str = "#unary";
/// Namespace of infix operators (`a+b`, `a<>b`).
pub const BINARY_OP_NS: &str = "#binary";

pub fn load_builtins(table: &mut FunctionTable) {
    operators::register_builtins(table);
    logical::register_builtins(table);
    math::register_builtins(table);
    text::register_builtins(table);
    info::register_builtins(table);
    reference_fns::register_builtins(table);
}
