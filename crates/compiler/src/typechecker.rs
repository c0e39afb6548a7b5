//! Declaration and usage validation. Walks the tree once, recording
//! diagnostics rather than failing fast; it never rewrites the tree.

use std::collections::HashMap;

use crate::ast::{Expr, Program, Stmt};
use crate::builtins::builtin_arity;
use crate::diagnostics::{ErrorCollector, ErrorKind};
use crate::symtab::SymbolTable;

struct FuncSig {
    param_count: usize,
}

pub struct TypeChecker<'a> {
    symbols: SymbolTable,
    functions: HashMap<String, FuncSig>,
    loop_depth: u32,
    errors: &'a mut ErrorCollector,
}

impl<'a> TypeChecker<'a> {
    pub fn new(errors: &'a mut ErrorCollector) -> Self {
        TypeChecker { symbols: SymbolTable::new(), functions: HashMap::new(), loop_depth: 0, errors }
    }

    pub fn check(&mut self, program: &Program) {
        self.collect_function_signatures(program);
        for stmt in &program.statements {
            self.check_stmt(stmt);
        }
    }

    fn collect_function_signatures(&mut self, program: &Program) {
        for stmt in &program.statements {
            if let Stmt::FuncDecl { name, params, .. } = stmt {
                self.functions.insert(name.clone(), FuncSig { param_count: params.len() });
            }
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl { name, initializer, location, .. } => {
                if let Some(expr) = initializer {
                    self.check_expr(expr);
                }
                self.symbols.declare(name.clone(), None, self.symbols.scope_level() == 0);
                let _ = location;
            }
            Stmt::FuncDecl { params, body, .. } => {
                self.symbols.enter_scope();
                self.symbols.reset_slots();
                for p in params {
                    self.symbols.declare(p.name.clone(), p.type_node.clone(), false);
                }
                for s in body {
                    self.check_stmt(s);
                }
                self.symbols.exit_scope();
            }
            Stmt::Block { statements, .. } => {
                self.symbols.enter_scope();
                for s in statements {
                    self.check_stmt(s);
                }
                self.symbols.exit_scope();
            }
            Stmt::If { condition, then_block, else_block, .. } => {
                self.check_expr(condition);
                self.symbols.enter_scope();
                for s in then_block {
                    self.check_stmt(s);
                }
                self.symbols.exit_scope();
                if let Some(else_stmts) = else_block {
                    self.symbols.enter_scope();
                    for s in else_stmts {
                        self.check_stmt(s);
                    }
                    self.symbols.exit_scope();
                }
            }
            Stmt::Loop { init, condition, increment, body, .. } => {
                self.symbols.enter_scope();
                if let Some(init) = init {
                    self.check_stmt(init);
                }
                if let Some(cond) = condition {
                    self.check_expr(cond);
                }
                if let Some(incr) = increment {
                    self.check_stmt(incr);
                }
                self.loop_depth += 1;
                for s in body {
                    self.check_stmt(s);
                }
                self.loop_depth -= 1;
                self.symbols.exit_scope();
            }
            Stmt::Return { value, .. } => {
                // A top-level `return` is valid: the whole source file is
                // the implicit entry point, and returning there is how a
                // program signals its own exit code (mirrored by the VM
                // treating `Return` at frame depth 0 as program exit).
                if let Some(v) = value {
                    self.check_expr(v);
                }
            }
            Stmt::Break { location } | Stmt::Continue { location } => {
                if self.loop_depth == 0 {
                    self.errors.add(ErrorKind::TypeChecker, "'break'/'continue' outside of a loop", Some(location.clone()));
                }
            }
            Stmt::ExprStmt { expr, .. } => self.check_expr(expr),
            Stmt::Import { .. } => {}
            Stmt::Declare { name, type_node, .. } => {
                self.symbols.declare(name.clone(), type_node.clone(), self.symbols.scope_level() == 0);
            }
        }
    }

    fn check_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal { .. } => {}
            Expr::Identifier { name, location } => {
                if self.symbols.resolve(name).is_none() {
                    self.errors.add(
                        ErrorKind::TypeChecker,
                        format!("undefined variable '{}'", name),
                        Some(location.clone()),
                    );
                }
            }
            Expr::BinOp { op, left, right, location } => {
                if op == "=" {
                    if let Expr::Identifier { name, .. } = left.as_ref() {
                        if self.symbols.resolve(name).is_none() {
                            self.errors.add(
                                ErrorKind::TypeChecker,
                                format!("assignment to undefined variable '{}'", name),
                                Some(location.clone()),
                            );
                        }
                    }
                } else {
                    self.check_expr(left);
                }
                self.check_expr(right);
            }
            Expr::UnaryOp { operand, .. } => self.check_expr(operand),
            Expr::Call { name, args, location } => {
                for a in args {
                    self.check_expr(a);
                }
                if let Some(sig) = self.functions.get(name) {
                    if sig.param_count != args.len() {
                        self.errors.add(
                            ErrorKind::TypeChecker,
                            format!(
                                "function '{}' expects {} argument(s), got {}",
                                name,
                                sig.param_count,
                                args.len()
                            ),
                            Some(location.clone()),
                        );
                    }
                } else if builtin_arity(name).is_none() {
                    self.errors.add(
                        ErrorKind::TypeChecker,
                        format!("call to undefined function '{}'", name),
                        Some(location.clone()),
                    );
                }
            }
            Expr::IndexAccess { array, index, .. } => {
                self.check_expr(array);
                self.check_expr(index);
            }
            Expr::ArrayLiteral { elements, .. } => {
                for e in elements {
                    self.check_expr(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn check(src: &str) -> ErrorCollector {
        let tokens = Lexer::new(src, "test.ocl").tokenize_all();
        let mut errors = ErrorCollector::new();
        let program = {
            let parser = Parser::new(tokens, &mut errors);
            parser.parse_program()
        };
        let mut tc = TypeChecker::new(&mut errors);
        tc.check(&program);
        errors
    }

    #[test]
    fn undefined_variable_is_reported() {
        let errors = check("Let x = y");
        assert!(errors.has_errors());
    }

    #[test]
    fn declared_variable_is_fine() {
        let errors = check("Let x = 1\nLet y = x + 1");
        assert!(!errors.has_errors());
    }

    #[test]
    fn break_outside_loop_is_reported() {
        let errors = check("break");
        assert!(errors.has_errors());
    }

    #[test]
    fn break_inside_loop_is_fine() {
        let errors = check("while (true) { break }");
        assert!(!errors.has_errors());
    }

    #[test]
    fn wrong_arity_call_is_reported() {
        let errors = check("func Int add(a: Int, b: Int) { return a + b }\nLet x = add(1)");
        assert!(errors.has_errors());
    }

    #[test]
    fn builtin_call_does_not_need_a_declaration() {
        let errors = check(r#"print("hi")"#);
        assert!(!errors.has_errors());
    }
}
