//! Pratt (precedence-climbing) expression parser plus recursive-descent
//! statement parsing.

use ocl_core::{SourceLocation, Value};

use crate::ast::{BuiltinType, Expr, Param, Program, Stmt, TypeNode};
use crate::diagnostics::{ErrorCollector, ErrorKind};
use crate::token::{Literal, Token, TokenType};

/// Binding power of a binary operator token. Higher binds tighter.
fn infix_binding_power(ttype: TokenType) -> Option<(u8, u8)> {
    use TokenType::*;
    Some(match ttype {
        PipePipe => (1, 2),
        AmpAmp => (3, 4),
        EqualEqual | BangEqual => (5, 6),
        Less | LessEqual | Greater | GreaterEqual => (7, 8),
        Plus | Minus => (9, 10),
        Star | Slash | Percent => (11, 12),
        _ => return None,
    })
}

fn op_lexeme(ttype: TokenType) -> &'static str {
    use TokenType::*;
    match ttype {
        PipePipe => "||",
        AmpAmp => "&&",
        EqualEqual => "==",
        BangEqual => "!=",
        Less => "<",
        LessEqual => "<=",
        Greater => ">",
        GreaterEqual => ">=",
        Plus => "+",
        Minus => "-",
        Star => "*",
        Slash => "/",
        Percent => "%",
        _ => unreachable!("not a binary operator token"),
    }
}

/// Type names recognized for the "C-style" declaration shapes (`Int x`,
/// `func Int main()`), distinguishing a type-led declaration from a plain
/// expression statement or a `func` with no declared return type.
fn is_type_name(lexeme: &str) -> bool {
    matches!(
        lexeme,
        "int" | "Int" | "float" | "Float" | "string" | "String" | "bool" | "Bool" | "char" | "Char" | "void" | "Void"
    )
}

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    errors: &'a mut ErrorCollector,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, errors: &'a mut ErrorCollector) -> Self {
        // Statements are newline/semicolon terminated; stripping blank
        // lines up front keeps the recursive-descent statement loop simple.
        Parser { tokens, pos: 0, errors }
    }

    fn cur(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn check(&self, ttype: TokenType) -> bool {
        self.cur().ttype == ttype
    }

    fn peek_next(&self) -> &Token {
        let idx = (self.pos + 1).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    /// Detects the `TypeName identifier` lead-in shared by C-style var
    /// decls and C-style `for`-init, without consuming anything.
    fn looks_like_c_style_var_decl(&self) -> bool {
        self.check(TokenType::Identifier)
            && is_type_name(&self.cur().lexeme)
            && self.peek_next().ttype == TokenType::Identifier
    }

    fn at_end(&self) -> bool {
        self.check(TokenType::Eof)
    }

    fn advance(&mut self) -> Token {
        let t = self.cur().clone();
        if !self.at_end() {
            self.pos += 1;
        }
        t
    }

    fn skip_terminators(&mut self) {
        while self.check(TokenType::Newline) || self.check(TokenType::Semicolon) {
            self.advance();
        }
    }

    fn expect(&mut self, ttype: TokenType, what: &str) -> Token {
        if self.check(ttype) {
            self.advance()
        } else {
            let loc = self.cur().location.clone();
            self.errors.add(
                ErrorKind::Parser,
                format!("expected {}, found '{}'", what, self.cur().lexeme),
                Some(loc),
            );
            self.advance()
        }
    }

    fn expect_identifier(&mut self) -> (String, SourceLocation) {
        let loc = self.cur().location.clone();
        if self.check(TokenType::Identifier) {
            let t = self.advance();
            (t.lexeme, loc)
        } else {
            self.errors.add(
                ErrorKind::Parser,
                format!("expected identifier, found '{}'", self.cur().lexeme),
                Some(loc.clone()),
            );
            (String::new(), loc)
        }
    }

    pub fn parse_program(mut self) -> Program {
        let mut statements = Vec::new();
        self.skip_terminators();
        while !self.at_end() {
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            self.skip_terminators();
        }
        Program { statements }
    }

    fn parse_type(&mut self) -> Option<TypeNode> {
        let t = self.expect(TokenType::Identifier, "a type name");
        let builtin = match t.lexeme.as_str() {
            "Int" => BuiltinType::Int,
            "Float" => BuiltinType::Float,
            "String" => BuiltinType::String,
            "Bool" => BuiltinType::Bool,
            "Char" => BuiltinType::Char,
            "Void" => BuiltinType::Void,
            _ => BuiltinType::Unknown,
        };
        let mut node = TypeNode::simple(builtin);
        if self.check(TokenType::LBracket) {
            self.advance();
            self.expect(TokenType::RBracket, "']'");
            node = TypeNode { builtin: BuiltinType::Array, element_type: Some(Box::new(node)) };
        }
        Some(node)
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.cur().ttype {
            TokenType::Let => self.parse_var_decl(),
            TokenType::Func => self.parse_func_decl(),
            TokenType::If => self.parse_if(),
            TokenType::For => self.parse_for(),
            TokenType::While => self.parse_while(),
            TokenType::Return => self.parse_return(),
            TokenType::Break => {
                let loc = self.advance().location;
                Some(Stmt::Break { location: loc })
            }
            TokenType::Continue => {
                let loc = self.advance().location;
                Some(Stmt::Continue { location: loc })
            }
            TokenType::Import => self.parse_import(),
            TokenType::Declare => self.parse_declare(),
            TokenType::LBrace => Some(self.parse_block()),
            _ if self.looks_like_c_style_var_decl() => self.parse_c_style_var_decl(),
            _ => {
                let loc = self.cur().location.clone();
                let expr = self.parse_expr();
                Some(Stmt::ExprStmt { expr, location: loc })
            }
        }
    }

    /// `TypeName name (= expr)? ;?`, recognized when the leading
    /// identifier's lexeme is a type name and is itself followed by
    /// another identifier.
    fn parse_c_style_var_decl(&mut self) -> Option<Stmt> {
        let loc = self.cur().location.clone();
        let type_node = self.parse_type();
        let (name, _) = self.expect_identifier();
        let initializer = if self.check(TokenType::Equal) {
            self.advance();
            Some(self.parse_expr())
        } else {
            None
        };
        Some(Stmt::VarDecl { name, type_node, initializer, location: loc })
    }

    fn parse_block(&mut self) -> Stmt {
        let loc = self.expect(TokenType::LBrace, "'{'").location;
        self.skip_terminators();
        let mut statements = Vec::new();
        while !self.check(TokenType::RBrace) && !self.at_end() {
            if let Some(s) = self.parse_statement() {
                statements.push(s);
            }
            self.skip_terminators();
        }
        self.expect(TokenType::RBrace, "'}'");
        Stmt::Block { statements, location: loc }
    }

    fn block_statements(&mut self) -> Vec<Stmt> {
        match self.parse_block() {
            Stmt::Block { statements, .. } => statements,
            _ => unreachable!(),
        }
    }

    fn parse_var_decl(&mut self) -> Option<Stmt> {
        let loc = self.advance().location; // Let
        let (name, _) = self.expect_identifier();
        let type_node = if self.check(TokenType::Colon) {
            self.advance();
            self.parse_type()
        } else {
            None
        };
        let initializer = if self.check(TokenType::Equal) {
            self.advance();
            Some(self.parse_expr())
        } else {
            None
        };
        Some(Stmt::VarDecl { name, type_node, initializer, location: loc })
    }

    fn parse_params(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        self.expect(TokenType::LParen, "'('");
        if !self.check(TokenType::RParen) {
            loop {
                let loc = self.cur().location.clone();
                let (name, _) = self.expect_identifier();
                self.expect(TokenType::Colon, "':' after parameter name");
                let type_node = self.parse_type();
                params.push(Param { name, type_node, location: loc });
                if self.check(TokenType::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenType::RParen, "')'");
        params
    }

    fn parse_func_decl(&mut self) -> Option<Stmt> {
        let loc = self.advance().location; // func
        // Optional return type before the function name, distinguished
        // from the name itself by checking the allow-list; defaults to
        // Void when absent.
        let return_type = if self.check(TokenType::Identifier) && is_type_name(&self.cur().lexeme) {
            self.parse_type()
        } else {
            Some(TypeNode::simple(BuiltinType::Void))
        };
        let (name, _) = self.expect_identifier();
        let params = self.parse_params();
        let body = self.block_statements();
        Some(Stmt::FuncDecl { name, params, return_type, body, location: loc })
    }

    fn parse_if(&mut self) -> Option<Stmt> {
        let loc = self.advance().location; // if
        self.expect(TokenType::LParen, "'('");
        let condition = self.parse_expr();
        self.expect(TokenType::RParen, "')'");
        let then_block = self.block_statements();
        self.skip_terminators();
        let else_block = if self.check(TokenType::Else) {
            self.advance();
            Some(self.block_statements())
        } else {
            None
        };
        Some(Stmt::If { condition, then_block, else_block, location: loc })
    }

    fn parse_for(&mut self) -> Option<Stmt> {
        let loc = self.advance().location; // for
        self.expect(TokenType::LParen, "'('");
        let init = if self.check(TokenType::Semicolon) {
            None
        } else {
            self.parse_statement().map(Box::new)
        };
        self.expect(TokenType::Semicolon, "';'");
        let condition = if self.check(TokenType::Semicolon) { None } else { Some(self.parse_expr()) };
        self.expect(TokenType::Semicolon, "';'");
        let increment = if self.check(TokenType::RParen) {
            None
        } else {
            self.parse_statement().map(Box::new)
        };
        self.expect(TokenType::RParen, "')'");
        let body = self.block_statements();
        Some(Stmt::Loop { is_for: true, init, condition, increment, body, location: loc })
    }

    fn parse_while(&mut self) -> Option<Stmt> {
        let loc = self.advance().location; // while
        self.expect(TokenType::LParen, "'('");
        let condition = self.parse_expr();
        self.expect(TokenType::RParen, "')'");
        let body = self.block_statements();
        Some(Stmt::Loop { is_for: false, init: None, condition: Some(condition), increment: None, body, location: loc })
    }

    fn parse_return(&mut self) -> Option<Stmt> {
        let loc = self.advance().location; // return
        let value = if self.check(TokenType::Newline) || self.check(TokenType::Semicolon) || self.check(TokenType::RBrace) {
            None
        } else {
            Some(self.parse_expr())
        };
        Some(Stmt::Return { value, location: loc })
    }

    fn parse_import(&mut self) -> Option<Stmt> {
        let loc = self.advance().location; // Import
        self.expect(TokenType::Less, "'<' after Import");
        let (mut filename, _) = self.expect_identifier();
        if self.check(TokenType::Dot) {
            self.advance();
            let (ext, _) = self.expect_identifier();
            filename.push('.');
            filename.push_str(&ext);
        }
        self.expect(TokenType::Greater, "'>'");
        if self.check(TokenType::Semicolon) {
            self.advance();
        }
        Some(Stmt::Import { filename, location: loc })
    }

    fn parse_declare(&mut self) -> Option<Stmt> {
        let loc = self.advance().location; // declare
        let (name, _) = self.expect_identifier();
        let type_node = if self.check(TokenType::Colon) {
            self.advance();
            self.parse_type()
        } else {
            None
        };
        Some(Stmt::Declare { name, type_node, location: loc })
    }

    // ---- expressions ----

    fn parse_expr(&mut self) -> Expr {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Expr {
        let lhs = self.parse_binary(0);
        if self.check(TokenType::Equal) {
            let loc = self.advance().location;
            let rhs = self.parse_assignment();
            return Expr::BinOp { op: "=".to_string(), left: Box::new(lhs), right: Box::new(rhs), location: loc };
        }
        lhs
    }

    fn parse_binary(&mut self, min_bp: u8) -> Expr {
        let mut lhs = self.parse_unary();

        loop {
            let ttype = self.cur().ttype;
            let Some((left_bp, right_bp)) = infix_binding_power(ttype) else { break };
            if left_bp < min_bp {
                break;
            }
            let loc = self.advance().location;
            let rhs = self.parse_binary(right_bp);
            lhs = Expr::BinOp { op: op_lexeme(ttype).to_string(), left: Box::new(lhs), right: Box::new(rhs), location: loc };
        }
        lhs
    }

    fn parse_unary(&mut self) -> Expr {
        if self.check(TokenType::Minus) || self.check(TokenType::Bang) {
            let t = self.advance();
            let op = if t.ttype == TokenType::Minus { "-" } else { "!" };
            let operand = self.parse_unary();
            return Expr::UnaryOp { op: op.to_string(), operand: Box::new(operand), location: t.location };
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Expr {
        let mut expr = self.parse_primary();
        loop {
            if self.check(TokenType::LBracket) {
                let loc = self.advance().location;
                let index = self.parse_expr();
                self.expect(TokenType::RBracket, "']'");
                expr = Expr::IndexAccess { array: Box::new(expr), index: Box::new(index), location: loc };
            } else {
                break;
            }
        }
        expr
    }

    /// `print`/`printf` accept an alternative shape: after the first
    /// argument, a `:` opens a comma-separated continuation instead of a
    /// plain comma. Both shapes build the same flat argument list.
    fn parse_call_args(&mut self, callee: &str) -> Vec<Expr> {
        let mut args = Vec::new();
        if self.check(TokenType::RParen) {
            return args;
        }
        args.push(self.parse_expr());
        let is_printf = callee == "print" || callee == "printf";
        if is_printf && self.check(TokenType::Colon) {
            self.advance();
            while !self.check(TokenType::RParen) && !self.at_end() {
                args.push(self.parse_expr());
                if self.check(TokenType::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        } else {
            while self.check(TokenType::Comma) {
                self.advance();
                args.push(self.parse_expr());
            }
        }
        args
    }

    fn parse_primary(&mut self) -> Expr {
        let tok = self.cur().clone();
        match tok.ttype {
            TokenType::Int => {
                self.advance();
                let v = match tok.literal {
                    Some(Literal::Int(i)) => i,
                    _ => 0,
                };
                Expr::Literal { value: Value::Int(v), location: tok.location }
            }
            TokenType::Float => {
                self.advance();
                let v = match tok.literal {
                    Some(Literal::Float(f)) => f,
                    _ => 0.0,
                };
                Expr::Literal { value: Value::Float(v), location: tok.location }
            }
            TokenType::Str => {
                self.advance();
                let v = match tok.literal {
                    Some(Literal::Str(s)) => s,
                    _ => String::new(),
                };
                Expr::Literal { value: Value::str(v), location: tok.location }
            }
            TokenType::Char => {
                self.advance();
                let v = match tok.literal {
                    Some(Literal::Char(c)) => c,
                    _ => '\0',
                };
                Expr::Literal { value: Value::Char(v), location: tok.location }
            }
            TokenType::True => {
                self.advance();
                Expr::Literal { value: Value::Bool(true), location: tok.location }
            }
            TokenType::False => {
                self.advance();
                Expr::Literal { value: Value::Bool(false), location: tok.location }
            }
            TokenType::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(TokenType::RBracket) {
                    loop {
                        elements.push(self.parse_expr());
                        if self.check(TokenType::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.expect(TokenType::RBracket, "']'");
                Expr::ArrayLiteral { elements, location: tok.location }
            }
            TokenType::LParen => {
                self.advance();
                let inner = self.parse_expr();
                self.expect(TokenType::RParen, "')'");
                inner
            }
            TokenType::Identifier => {
                self.advance();
                if self.check(TokenType::LParen) {
                    self.advance();
                    let args = self.parse_call_args(&tok.lexeme);
                    self.expect(TokenType::RParen, "')'");
                    Expr::Call { name: tok.lexeme, args, location: tok.location }
                } else {
                    Expr::Identifier { name: tok.lexeme, location: tok.location }
                }
            }
            _ => {
                self.errors.add(
                    ErrorKind::Parser,
                    format!("unexpected token '{}'", tok.lexeme),
                    Some(tok.location.clone()),
                );
                self.advance();
                Expr::Literal { value: Value::Null, location: tok.location }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> (Program, ErrorCollector) {
        let tokens = Lexer::new(src, "test.ocl").tokenize_all();
        let mut errors = ErrorCollector::new();
        let program = {
            let parser = Parser::new(tokens, &mut errors);
            parser.parse_program()
        };
        (program, errors)
    }

    #[test]
    fn parses_var_decl_with_initializer() {
        let (program, errors) = parse("Let x = 1 + 2");
        assert!(!errors.has_errors());
        assert_eq!(program.statements.len(), 1);
        match &program.statements[0] {
            Stmt::VarDecl { name, initializer, .. } => {
                assert_eq!(name, "x");
                assert!(matches!(initializer, Some(Expr::BinOp { .. })));
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn precedence_multiplies_before_adds() {
        let (program, _) = parse("Let x = 1 + 2 * 3");
        match &program.statements[0] {
            Stmt::VarDecl { initializer: Some(Expr::BinOp { op, left, right, .. }), .. } => {
                assert_eq!(op, "+");
                assert!(matches!(**left, Expr::Literal { .. }));
                assert!(matches!(**right, Expr::BinOp { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_function_with_params_and_return_type() {
        let (program, errors) = parse("func Int add(a: Int, b: Int) { return a + b }");
        assert!(!errors.has_errors());
        match &program.statements[0] {
            Stmt::FuncDecl { name, params, body, return_type, .. } => {
                assert_eq!(name, "add");
                assert_eq!(params.len(), 2);
                assert_eq!(body.len(), 1);
                assert!(matches!(return_type, Some(TypeNode { builtin: BuiltinType::Int, .. })));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn func_decl_without_return_type_defaults_to_void() {
        let (program, errors) = parse("func main() { return 0 }");
        assert!(!errors.has_errors());
        match &program.statements[0] {
            Stmt::FuncDecl { name, return_type, .. } => {
                assert_eq!(name, "main");
                assert!(matches!(return_type, Some(TypeNode { builtin: BuiltinType::Void, .. })));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn c_style_var_decl_is_recognized() {
        let (program, errors) = parse("Int x = 5");
        assert!(!errors.has_errors());
        match &program.statements[0] {
            Stmt::VarDecl { name, initializer, .. } => {
                assert_eq!(name, "x");
                assert!(initializer.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn printf_colon_continuation_shape_matches_comma_shape() {
        let (program, errors) = parse(r#"printf("%d", 1)"#);
        assert!(!errors.has_errors());
        let (program2, errors2) = parse(r#"printf("%d" : 1)"#);
        assert!(!errors2.has_errors());
        match (&program.statements[0], &program2.statements[0]) {
            (Stmt::ExprStmt { expr: Expr::Call { args: a1, .. }, .. }, Stmt::ExprStmt { expr: Expr::Call { args: a2, .. }, .. }) => {
                assert_eq!(a1.len(), a2.len());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn import_statement_parses_angle_bracket_form() {
        let (program, errors) = parse("Import <math>");
        assert!(!errors.has_errors());
        match &program.statements[0] {
            Stmt::Import { filename, .. } => assert_eq!(filename, "math"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_if_else() {
        let (program, errors) = parse("if (true) { Let x = 1 } else { Let x = 2 }");
        assert!(!errors.has_errors());
        assert!(matches!(program.statements[0], Stmt::If { else_block: Some(_), .. }));
    }

    #[test]
    fn unexpected_token_is_collected_not_panicked() {
        let (_program, errors) = parse("Let x = )");
        assert!(errors.has_errors());
    }
}
