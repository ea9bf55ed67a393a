use std::fmt;

use log::trace;

use crate::ast::{AssignOp, BinaryOp, Expr, LogicalOp, Program, Stmt, UnaryOp, format_number};
use crate::lexer::{Token, TokenKind};

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub found: Token,
    pub expected: String,
}

impl std::error::Error for ParseError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expected {} but found {} at line {}",
            self.expected,
            self.found.describe(),
            self.found.line
        )
    }
}

/// Parses a complete token sequence into a program.
pub fn parse(tokens: Vec<Token>) -> Result<Program, ParseError> {
    let mut parser = Parser { tokens, current: 0 };
    let program = parser.parse_program()?;
    trace!(target: "parser", "Parsed {} top-level statements", program.body.len());
    Ok(program)
}

struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // The token vector always ends in Eof and `current` never passes it.
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.current < self.tokens.len() - 1 {
            self.current += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek().kind == *kind
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(expected))
        }
    }

    fn error(&self, expected: &str) -> ParseError {
        ParseError {
            found: self.peek().clone(),
            expected: expected.to_string(),
        }
    }

    fn expect_identifier(&mut self, expected: &str) -> Result<String, ParseError> {
        match self.peek().kind.clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.error(expected)),
        }
    }

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut body = Vec::new();
        while !self.check(&TokenKind::Eof) {
            body.push(self.parse_statement()?);
        }
        Ok(Program { body })
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.peek().kind {
            // At statement position a `{` is always a block.
            TokenKind::LeftBrace => self.parse_block(),
            TokenKind::Var => self.parse_variable_decl(),
            TokenKind::Semicolon => {
                self.advance();
                Ok(Stmt::Empty)
            }
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => {
                self.advance();
                self.matches(&TokenKind::Semicolon);
                Ok(Stmt::Break)
            }
            TokenKind::Continue => {
                self.advance();
                self.matches(&TokenKind::Semicolon);
                Ok(Stmt::Continue)
            }
            _ => {
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::Semicolon, "';' after expression")?;
                Ok(Stmt::Expression(expr))
            }
        }
    }

    fn parse_block(&mut self) -> Result<Stmt, ParseError> {
        self.expect(&TokenKind::LeftBrace, "'{'")?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.check(&TokenKind::Eof) {
            body.push(self.parse_statement()?);
        }
        self.expect(&TokenKind::RightBrace, "'}' to close block")?;
        Ok(Stmt::Block(body))
    }

    fn parse_variable_decl(&mut self) -> Result<Stmt, ParseError> {
        self.expect(&TokenKind::Var, "'var'")?;
        let mut decls = Vec::new();
        loop {
            let name = self.expect_identifier("variable name")?;
            let init = if self.matches(&TokenKind::Equals) {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            decls.push((name, init));
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Semicolon, "';' after variable declaration")?;
        Ok(Stmt::VariableDecl(decls))
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.expect(&TokenKind::If, "'if'")?;
        self.expect(&TokenKind::LeftParen, "'(' after 'if'")?;
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::RightParen, "')' after condition")?;
        let consequent = Box::new(self.parse_statement()?);
        // A dangling `else` binds to the nearest `if`.
        let alternate = if self.matches(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            condition,
            consequent,
            alternate,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        self.expect(&TokenKind::While, "'while'")?;
        self.expect(&TokenKind::LeftParen, "'(' after 'while'")?;
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::RightParen, "')' after condition")?;
        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::While { condition, body })
    }

    fn parse_do_while(&mut self) -> Result<Stmt, ParseError> {
        self.expect(&TokenKind::Do, "'do'")?;
        let body = Box::new(self.parse_statement()?);
        self.expect(&TokenKind::While, "'while' after do body")?;
        self.expect(&TokenKind::LeftParen, "'(' after 'while'")?;
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::RightParen, "')' after condition")?;
        self.expect(&TokenKind::Semicolon, "';' after do-while")?;
        Ok(Stmt::DoWhile { body, condition })
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        self.expect(&TokenKind::Return, "'return'")?;
        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon, "';' after return")?;
        Ok(Stmt::Return(value))
    }

    /// Full expression including the comma operator. Argument lists, array
    /// elements, and initializers start at [`Self::parse_assignment`]
    /// instead so their commas separate items.
    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_assignment()?;
        while self.matches(&TokenKind::Comma) {
            let right = self.parse_assignment()?;
            expr = Expr::Sequence {
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_conditional()?;
        let op = match self.peek().kind {
            TokenKind::Equals => AssignOp::Assign,
            TokenKind::PlusEquals => AssignOp::AddAssign,
            TokenKind::MinusEquals => AssignOp::SubAssign,
            TokenKind::StarEquals => AssignOp::MulAssign,
            TokenKind::SlashEquals => AssignOp::DivAssign,
            TokenKind::PercentEquals => AssignOp::ModAssign,
            _ => return Ok(expr),
        };
        if !is_assignment_target(&expr) {
            return Err(self.error("an assignable target before assignment operator"));
        }
        self.advance();
        // Right-associative: a = b = c parses as a = (b = c).
        let value = self.parse_assignment()?;
        Ok(Expr::Assign {
            op,
            target: Box::new(expr),
            value: Box::new(value),
        })
    }

    fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        let condition = self.parse_logical_or()?;
        if !self.matches(&TokenKind::Question) {
            return Ok(condition);
        }
        let consequent = self.parse_assignment()?;
        self.expect(&TokenKind::Colon, "':' in conditional expression")?;
        let alternate = self.parse_assignment()?;
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn parse_logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_logical_and()?;
        while self.matches(&TokenKind::DoublePipe) {
            let right = self.parse_logical_and()?;
            expr = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_equality()?;
        while self.matches(&TokenKind::DoubleAmpersand) {
            let right = self.parse_equality()?;
            expr = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_relational()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::DoubleEquals => BinaryOp::LooseEqual,
                TokenKind::NotEquals => BinaryOp::LooseNotEqual,
                TokenKind::TripleEquals => BinaryOp::StrictEqual,
                TokenKind::NotDoubleEquals => BinaryOp::StrictNotEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::LessThan => BinaryOp::LessThan,
                TokenKind::LessThanEquals => BinaryOp::LessThanEqual,
                TokenKind::GreaterThan => BinaryOp::GreaterThan,
                TokenKind::GreaterThanEquals => BinaryOp::GreaterThanEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Multiply,
                TokenKind::Slash => BinaryOp::Divide,
                TokenKind::Percent => BinaryOp::Modulo,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek().kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Negate,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::PlusPlus => UnaryOp::PreIncrement,
            TokenKind::MinusMinus => UnaryOp::PreDecrement,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        if matches!(op, UnaryOp::PreIncrement | UnaryOp::PreDecrement)
            && !is_assignment_target(&operand)
        {
            return Err(self.error("a variable or member after prefix operator"));
        }
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_call_or_member()?;
        let op = match self.peek().kind {
            TokenKind::PlusPlus => UnaryOp::PostIncrement,
            TokenKind::MinusMinus => UnaryOp::PostDecrement,
            _ => return Ok(expr),
        };
        if !is_assignment_target(&expr) {
            return Err(self.error("a variable or member before postfix operator"));
        }
        self.advance();
        Ok(Expr::Unary {
            op,
            operand: Box::new(expr),
        })
    }

    fn parse_call_or_member(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek().kind {
                TokenKind::LeftParen => {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RightParen) {
                        loop {
                            args.push(self.parse_assignment()?);
                            if !self.matches(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(&TokenKind::RightParen, "')' after arguments")?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_identifier("property name after '.'")?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: Box::new(Expr::String(name)),
                    };
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let property = self.parse_expression()?;
                    self.expect(&TokenKind::RightBracket, "']' after index")?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: Box::new(property),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let expr = match self.peek().kind.clone() {
            TokenKind::Number(value) => {
                self.advance();
                Expr::Number(value)
            }
            TokenKind::String(value) => {
                self.advance();
                Expr::String(value)
            }
            TokenKind::True => {
                self.advance();
                Expr::Boolean(true)
            }
            TokenKind::False => {
                self.advance();
                Expr::Boolean(false)
            }
            TokenKind::Null => {
                self.advance();
                Expr::Null
            }
            TokenKind::Undefined => {
                self.advance();
                Expr::Undefined
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Expr::Identifier(name)
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RightParen, "')' to close expression")?;
                expr
            }
            TokenKind::LeftBracket => return self.parse_array_literal(),
            TokenKind::LeftBrace => return self.parse_object_literal(),
            TokenKind::Function => return self.parse_function(),
            _ => return Err(self.error("an expression")),
        };
        Ok(expr)
    }

    fn parse_array_literal(&mut self) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LeftBracket, "'['")?;
        let mut elements = Vec::new();
        if !self.check(&TokenKind::RightBracket) {
            loop {
                elements.push(self.parse_assignment()?);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
                // Trailing comma.
                if self.check(&TokenKind::RightBracket) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightBracket, "']' to close array literal")?;
        Ok(Expr::Array(elements))
    }

    fn parse_object_literal(&mut self) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LeftBrace, "'{'")?;
        let mut entries = Vec::new();
        if !self.check(&TokenKind::RightBrace) {
            loop {
                let key = match self.peek().kind.clone() {
                    TokenKind::Identifier(name) => {
                        self.advance();
                        name
                    }
                    TokenKind::String(value) => {
                        self.advance();
                        value
                    }
                    TokenKind::Number(value) => {
                        self.advance();
                        format_number(value)
                    }
                    _ => return Err(self.error("a property key")),
                };
                self.expect(&TokenKind::Colon, "':' after property key")?;
                let value = self.parse_assignment()?;
                entries.push((key, value));
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
                if self.check(&TokenKind::RightBrace) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightBrace, "'}' to close object literal")?;
        Ok(Expr::Object(entries))
    }

    fn parse_function(&mut self) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::Function, "'function'")?;
        let name = match self.peek().kind.clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Some(name)
            }
            _ => None,
        };
        self.expect(&TokenKind::LeftParen, "'(' after function name")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                params.push(self.expect_identifier("parameter name")?);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightParen, "')' after parameters")?;
        let body = match self.parse_block()? {
            Stmt::Block(body) => body,
            _ => unreachable!(),
        };
        Ok(Expr::Function { name, params, body })
    }
}

fn is_assignment_target(expr: &Expr) -> bool {
    matches!(expr, Expr::Identifier(_) | Expr::Member { .. })
}
