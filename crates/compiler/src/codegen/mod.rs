//! Two-pass bytecode code generator.
//!
//! Pass 1 walks every top-level `FuncDecl` and reserves its slot in the
//! function table (name, parameter count) before a single instruction is
//! emitted. A `Call` therefore always encodes the callee's function-table
//! index, known immediately regardless of declaration order — a function
//! defined further down the source can still be called from code above it.
//! Pass 2 emits the real instruction stream: every function's body first
//! (each recording its real `start_ip` into the table entry reserved in
//! pass 1 the moment its first instruction is emitted), guarded by a
//! leading jump over the whole function-bodies section so that a body is
//! only ever entered through an explicit `Call`; then the top-level
//! statements; then, if a function named `main` exists, an implicit
//! `Call` into it (the program's entry point once any top-level globals
//! have run); then `Halt`.
//!
//! `break`/`continue` are resolved the same way: a `LoopContext` stack
//! records the patch sites for pending `break`/`continue` jumps emitted
//! inside the loop body, and they are all backpatched to their real
//! targets once the loop's code generation finishes.

pub mod error;

use std::collections::HashMap;
use std::rc::Rc;

use ocl_core::{SourceLocation, Value};

use crate::ast::{Expr, Param, Program, Stmt};
use crate::builtins::builtin_id;
use crate::bytecode::{Bytecode, FuncEntry, OpCode};
use crate::config::CompilerConfig;
use crate::diagnostics::{ErrorCollector, ErrorKind};

pub use error::CodeGenError;

#[derive(Debug, Clone, Copy)]
struct VarBinding {
    slot: u32,
    scope_level: u32,
    is_global: bool,
}

struct LoopContext {
    break_patches: Vec<usize>,
    continue_patches: Vec<usize>,
}

pub struct CodeGenerator<'a> {
    bytecode: Bytecode,
    vars: HashMap<String, Vec<VarBinding>>,
    scope_level: u32,
    local_slot_counter: u32,
    global_slot_counter: u32,
    in_function: bool,
    function_index: HashMap<String, u32>,
    loop_stack: Vec<LoopContext>,
    config: &'a CompilerConfig,
    errors: &'a mut ErrorCollector,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(config: &'a CompilerConfig, errors: &'a mut ErrorCollector) -> Self {
        CodeGenerator {
            bytecode: Bytecode::new(),
            vars: HashMap::new(),
            scope_level: 0,
            local_slot_counter: 0,
            global_slot_counter: 0,
            in_function: false,
            function_index: HashMap::new(),
            loop_stack: Vec::new(),
            config,
            errors,
        }
    }

    pub fn generate(mut self, program: &Program, file: Rc<str>) -> Bytecode {
        self.register_functions(program);

        let leading_jump = self.bytecode.emit(OpCode::Jump, 0, 0, SourceLocation::synthetic(file.clone()));

        for stmt in &program.statements {
            if let Stmt::FuncDecl { name, params, body, location } = stmt {
                self.gen_function_body(name, params, body, location);
            }
        }

        let top_level_start = self.bytecode.next_ip();
        self.bytecode.patch_operand1(leading_jump, top_level_start);

        for stmt in &program.statements {
            if !matches!(stmt, Stmt::FuncDecl { .. }) {
                self.gen_stmt(stmt);
            }
        }

        // Implicit entry point: once top-level globals have run, call
        // `main` if the program declares one, then halt on its return
        // value (or on 0 if there's no `main` at all).
        if let Some(&main_idx) = self.function_index.get("main") {
            self.bytecode.emit(OpCode::Call, main_idx, 0, SourceLocation::synthetic(file.clone()));
        }
        self.bytecode.emit(OpCode::Halt, 0, 0, SourceLocation::synthetic(file.clone()));

        self.bytecode
    }

    fn register_functions(&mut self, program: &Program) {
        for stmt in &program.statements {
            if let Stmt::FuncDecl { name, params, .. } = stmt {
                let idx = self.bytecode.add_function(FuncEntry {
                    name: name.clone(),
                    start_ip: 0,
                    param_count: params.len() as u32,
                    local_count: 0,
                });
                self.function_index.insert(name.clone(), idx);
            }
        }
    }

    fn gen_function_body(&mut self, name: &str, params: &[Param], body: &[Stmt], location: &SourceLocation) {
        let start_ip = self.bytecode.next_ip();

        let saved_vars = self.vars.clone();
        self.vars.clear();
        self.in_function = true;
        self.scope_level += 1;
        self.local_slot_counter = 0;

        // Parameters occupy the first slots, in declaration order, laid
        // out by the VM's calling convention before the body's own locals.
        for p in params {
            self.declare_var(&p.name);
        }

        for stmt in body {
            self.gen_stmt(stmt);
        }

        // Implicit `return null` if the body doesn't end with an explicit
        // return, so every function leaves exactly one value for its
        // caller regardless of how it falls off the end.
        let const_idx = self.bytecode.add_constant(Value::Null);
        self.bytecode.emit(OpCode::PushConst, const_idx, 0, location.clone());
        self.bytecode.emit(OpCode::Return, 0, 0, location.clone());

        let local_count = self.local_slot_counter;
        self.scope_level -= 1;
        self.in_function = false;
        self.vars = saved_vars;

        if let Some(&idx) = self.function_index.get(name) {
            let entry = &mut self.bytecode.functions[idx as usize];
            entry.start_ip = start_ip;
            entry.local_count = local_count;
        }
    }

    fn enter_scope(&mut self) {
        self.scope_level += 1;
    }

    fn exit_scope(&mut self) {
        let level = self.scope_level;
        for bindings in self.vars.values_mut() {
            bindings.retain(|b| b.scope_level != level);
        }
        self.scope_level -= 1;
    }

    fn declare_var(&mut self, name: &str) -> VarBinding {
        let is_global = !self.in_function;
        let slot = if is_global {
            let s = self.global_slot_counter;
            self.global_slot_counter += 1;
            s
        } else {
            let s = self.local_slot_counter;
            self.local_slot_counter += 1;
            s
        };
        let binding = VarBinding { slot, scope_level: self.scope_level, is_global };
        self.vars.entry(name.to_string()).or_default().push(binding);
        binding
    }

    fn resolve_var(&mut self, name: &str, location: &SourceLocation) -> VarBinding {
        if let Some(bindings) = self.vars.get(name) {
            if let Some(b) = bindings.last() {
                return *b;
            }
        }
        if self.config.undefined_variable_is_error {
            self.errors.add(ErrorKind::TypeChecker, format!("undefined variable '{}'", name), Some(location.clone()));
        } else {
            tracing::warn!(variable = name, %location, "undefined variable, defaulting to slot 0");
        }
        VarBinding { slot: 0, scope_level: 0, is_global: true }
    }

    fn gen_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl { name, initializer, location, .. } => {
                if let Some(expr) = initializer {
                    self.gen_expr(expr);
                } else {
                    let idx = self.bytecode.add_constant(Value::Int(0));
                    self.bytecode.emit(OpCode::PushConst, idx, 0, location.clone());
                }
                let binding = self.declare_var(name);
                self.emit_store(binding, location.clone());
            }
            Stmt::FuncDecl { .. } => {
                // Generated in the dedicated function-bodies section.
            }
            Stmt::Block { statements, .. } => {
                self.enter_scope();
                for s in statements {
                    self.gen_stmt(s);
                }
                self.exit_scope();
            }
            Stmt::If { condition, then_block, else_block, location } => {
                self.gen_expr(condition);
                let jump_false = self.bytecode.emit(OpCode::JumpIfFalse, 0, 0, location.clone());

                self.enter_scope();
                for s in then_block {
                    self.gen_stmt(s);
                }
                self.exit_scope();

                if let Some(else_stmts) = else_block {
                    let jump_end = self.bytecode.emit(OpCode::Jump, 0, 0, location.clone());
                    let else_start = self.bytecode.next_ip();
                    self.bytecode.patch_operand1(jump_false, else_start);

                    self.enter_scope();
                    for s in else_stmts {
                        self.gen_stmt(s);
                    }
                    self.exit_scope();

                    let end = self.bytecode.next_ip();
                    self.bytecode.patch_operand1(jump_end, end);
                } else {
                    let end = self.bytecode.next_ip();
                    self.bytecode.patch_operand1(jump_false, end);
                }
            }
            Stmt::Loop { is_for, init, condition, increment, body, location } => {
                self.enter_scope();
                if let Some(init) = init {
                    self.gen_stmt(init);
                }

                let loop_start = self.bytecode.next_ip();
                let mut exit_patches = Vec::new();
                if let Some(cond) = condition {
                    self.gen_expr(cond);
                    exit_patches.push(self.bytecode.emit(OpCode::JumpIfFalse, 0, 0, location.clone()));
                }

                self.loop_stack.push(LoopContext { break_patches: Vec::new(), continue_patches: Vec::new() });

                for s in body {
                    self.gen_stmt(s);
                }

                let continue_target = self.bytecode.next_ip();
                if *is_for {
                    if let Some(incr) = increment {
                        self.gen_stmt(incr);
                    }
                }
                self.bytecode.emit(OpCode::Jump, loop_start, 0, location.clone());

                let exit_ip = self.bytecode.next_ip();
                let ctx = self.loop_stack.pop().expect("loop context pushed above");
                for p in exit_patches {
                    self.bytecode.patch_operand1(p, exit_ip);
                }
                for p in ctx.break_patches {
                    self.bytecode.patch_operand1(p, exit_ip);
                }
                for p in ctx.continue_patches {
                    self.bytecode.patch_operand1(p, continue_target);
                }

                self.exit_scope();
            }
            Stmt::Return { value, location } => {
                if let Some(v) = value {
                    self.gen_expr(v);
                } else {
                    let idx = self.bytecode.add_constant(Value::Null);
                    self.bytecode.emit(OpCode::PushConst, idx, 0, location.clone());
                }
                self.bytecode.emit(OpCode::Return, 0, 0, location.clone());
            }
            Stmt::Break { location } => {
                let idx = self.bytecode.emit(OpCode::Jump, 0, 0, location.clone());
                match self.loop_stack.last_mut() {
                    Some(ctx) => ctx.break_patches.push(idx),
                    None => self.errors.add(ErrorKind::TypeChecker, "'break' outside of a loop", Some(location.clone())),
                }
            }
            Stmt::Continue { location } => {
                let idx = self.bytecode.emit(OpCode::Jump, 0, 0, location.clone());
                match self.loop_stack.last_mut() {
                    Some(ctx) => ctx.continue_patches.push(idx),
                    None => {
                        self.errors.add(ErrorKind::TypeChecker, "'continue' outside of a loop", Some(location.clone()))
                    }
                }
            }
            Stmt::ExprStmt { expr, location } => {
                self.gen_expr(expr);
                self.bytecode.emit(OpCode::Pop, 0, 0, location.clone());
            }
            Stmt::Import { .. } => {}
            Stmt::Declare { name, location, .. } => {
                self.declare_var(name);
                let _ = location;
            }
        }
    }

    fn emit_store(&mut self, binding: VarBinding, location: SourceLocation) {
        if binding.is_global {
            self.bytecode.emit(OpCode::StoreGlobal, binding.slot, 0, location);
        } else {
            self.bytecode.emit(OpCode::StoreVar, binding.slot, 0, location);
        }
    }

    fn emit_load(&mut self, binding: VarBinding, location: SourceLocation) {
        if binding.is_global {
            self.bytecode.emit(OpCode::LoadGlobal, binding.slot, 0, location);
        } else {
            self.bytecode.emit(OpCode::LoadVar, binding.slot, 0, location);
        }
    }

    fn gen_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal { value, location } => {
                let idx = self.bytecode.add_constant(value.clone());
                self.bytecode.emit(OpCode::PushConst, idx, 0, location.clone());
            }
            Expr::Identifier { name, location } => {
                let binding = self.resolve_var(name, location);
                self.emit_load(binding, location.clone());
            }
            Expr::BinOp { op, left, right, location } => {
                if op == "=" {
                    self.gen_expr(right);
                    if let Expr::Identifier { name, .. } = left.as_ref() {
                        let binding = self.resolve_var(name, location);
                        self.emit_store(binding, location.clone());
                    }
                    return;
                }

                self.gen_expr(left);
                self.gen_expr(right);
                let opcode = match op.as_str() {
                    "+" => OpCode::Add,
                    "-" => OpCode::Subtract,
                    "*" => OpCode::Multiply,
                    "/" => OpCode::Divide,
                    "%" => OpCode::Modulo,
                    "==" => OpCode::Equal,
                    "!=" => OpCode::NotEqual,
                    "<" => OpCode::Less,
                    "<=" => OpCode::LessEqual,
                    ">" => OpCode::Greater,
                    ">=" => OpCode::GreaterEqual,
                    "&&" => OpCode::And,
                    "||" => OpCode::Or,
                    other => {
                        self.errors.add(ErrorKind::TypeChecker, format!("unknown operator '{}'", other), Some(location.clone()));
                        return;
                    }
                };
                self.bytecode.emit(opcode, 0, 0, location.clone());
            }
            Expr::UnaryOp { op, operand, location } => {
                self.gen_expr(operand);
                let opcode = match op.as_str() {
                    "-" => OpCode::Negate,
                    "!" => OpCode::Not,
                    other => {
                        self.errors.add(ErrorKind::TypeChecker, format!("unknown unary operator '{}'", other), Some(location.clone()));
                        return;
                    }
                };
                self.bytecode.emit(opcode, 0, 0, location.clone());
            }
            Expr::Call { name, args, location } => {
                for a in args {
                    self.gen_expr(a);
                }
                if let Some(id) = builtin_id(name) {
                    self.bytecode.emit(OpCode::CallBuiltin, id, args.len() as u32, location.clone());
                } else if let Some(&idx) = self.function_index.get(name) {
                    self.bytecode.emit(OpCode::Call, idx, args.len() as u32, location.clone());
                } else {
                    self.errors.add(
                        ErrorKind::TypeChecker,
                        format!("call to undefined function '{}'", name),
                        Some(location.clone()),
                    );
                }
            }
            Expr::IndexAccess { array, index, location } => {
                self.gen_expr(array);
                self.gen_expr(index);
                self.bytecode.emit(OpCode::ArrayGet, 0, 0, location.clone());
            }
            Expr::ArrayLiteral { elements, location } => {
                for e in elements {
                    self.gen_expr(e);
                }
                self.bytecode.emit(OpCode::ArrayNew, elements.len() as u32, 0, location.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::OpCode;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn compile(src: &str) -> Bytecode {
        let tokens = Lexer::new(src, "t.ocl").tokenize_all();
        let mut errors = ErrorCollector::new();
        let program = {
            let parser = Parser::new(tokens, &mut errors);
            parser.parse_program()
        };
        let config = CompilerConfig::default();
        let gen = CodeGenerator::new(&config, &mut errors);
        gen.generate(&program, Rc::from("t.ocl"))
    }

    #[test]
    fn leading_jump_skips_function_bodies() {
        let bc = compile("func Int f() { return 1 }\nLet x = 1");
        assert_eq!(bc.instructions[0].opcode, OpCode::Jump);
        let target = bc.instructions[0].operand1 as usize;
        // function bodies come before the jump target; the target is where
        // the top-level statements begin
        assert!((bc.functions[0].start_ip as usize) < target);
    }

    #[test]
    fn forward_call_resolves_to_correct_function_index() {
        let bc = compile("Let x = later()\nfunc Int later() { return 42 }");
        let call = bc.instructions.iter().find(|i| i.opcode == OpCode::Call).unwrap();
        assert_eq!(call.operand1, 0);
        assert_eq!(bc.functions[0].name, "later");
    }

    #[test]
    fn break_and_continue_patch_to_distinct_targets() {
        let bc = compile("while (true) { break }\nwhile (true) { continue }");
        // Every Jump's target must be a valid in-range instruction index.
        for instr in &bc.instructions {
            if instr.opcode == OpCode::Jump {
                assert!((instr.operand1 as usize) <= bc.instructions.len());
            }
        }
    }

    #[test]
    fn local_slots_reset_per_function() {
        let bc = compile("func Int a(x: Int) { Let y = 1\nreturn y }\nfunc Int b(x: Int) { Let z = 1\nreturn z }");
        // Both functions declare exactly one extra local beyond their
        // single parameter; slot numbering must not leak across functions.
        assert_eq!(bc.functions.len(), 2);
    }
}
