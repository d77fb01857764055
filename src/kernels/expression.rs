//! Built-in expression evaluator for wrangle snippets
//!
//! # Syntax
//!
//! ```text
//! // Statements, separated by ';'
//! Py = Py + 0.5 * sin(Px);
//! mass *= 2;
//!
//! // Operators (precedence low to high)
//! a < b, a <= b, a > b, a >= b, a == b, a != b   // 1.0 or 0.0
//! a + b, a - b
//! a * b, a / b, a % b
//! a ^ b            // right associative
//! -a
//!
//! // Functions
//! sin cos tan asin acos atan sqrt abs floor ceil fract exp ln   (1 arg)
//! min max pow atan2 step                                       (2 args)
//! clamp lerp fit01 ... see `call_function`
//!
//! // Constants
//! pi, e
//! ```

use super::{ExpressionEvaluator, ExpressionFailure, VariableMap};
use parking_lot::Mutex;
use std::f64::consts::{E, PI};
use std::sync::Arc;

/// Deepest expression tree the parser builds. Evaluation recurses once per
/// level, so this also bounds the evaluator's stack use.
pub const MAX_NESTING: usize = 256;

// ============================================================================
// Lexer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
    Comma,
    Semicolon,
    Assign,
    CompoundAssign(BinOp),
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    Eof,
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.input[self.pos..].chars().nth(1)
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.next_char();
            } else if c == '/' && self.peek_second() == Some('/') {
                while let Some(c) = self.next_char() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) -> Result<f64, ExpressionFailure> {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() || c == '.' {
                self.next_char();
            } else if (c == 'e' || c == 'E')
                && matches!(self.peek_second(), Some(d) if d.is_ascii_digit() || d == '-' || d == '+')
            {
                self.next_char();
                self.next_char();
            } else {
                break;
            }
        }
        let s = &self.input[start..self.pos];
        s.parse()
            .map_err(|_| ExpressionFailure::new(format!("invalid number '{}'", s), start))
    }

    fn read_ident(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' {
                self.next_char();
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    /// Next token and the byte offset it starts at
    fn next_token(&mut self) -> Result<(Token, usize), ExpressionFailure> {
        self.skip_whitespace_and_comments();
        let start = self.pos;

        let Some(c) = self.peek_char() else {
            return Ok((Token::Eof, start));
        };

        let with_equals = |plain: Token, combined: Token, lexer: &mut Self| {
            lexer.next_char();
            if lexer.peek_char() == Some('=') {
                lexer.next_char();
                combined
            } else {
                plain
            }
        };

        let token = match c {
            '+' => with_equals(Token::Plus, Token::CompoundAssign(BinOp::Add), self),
            '-' => with_equals(Token::Minus, Token::CompoundAssign(BinOp::Sub), self),
            '*' => with_equals(Token::Star, Token::CompoundAssign(BinOp::Mul), self),
            '/' => with_equals(Token::Slash, Token::CompoundAssign(BinOp::Div), self),
            '%' => with_equals(Token::Percent, Token::CompoundAssign(BinOp::Rem), self),
            '<' => with_equals(Token::Less, Token::LessEqual, self),
            '>' => with_equals(Token::Greater, Token::GreaterEqual, self),
            '=' => with_equals(Token::Assign, Token::Equal, self),
            '!' => {
                self.next_char();
                if self.peek_char() == Some('=') {
                    self.next_char();
                    Token::NotEqual
                } else {
                    return Err(ExpressionFailure::new("unexpected character '!'", start));
                }
            }
            '^' => {
                self.next_char();
                Token::Caret
            }
            '(' => {
                self.next_char();
                Token::LParen
            }
            ')' => {
                self.next_char();
                Token::RParen
            }
            ',' => {
                self.next_char();
                Token::Comma
            }
            ';' => {
                self.next_char();
                Token::Semicolon
            }
            '0'..='9' | '.' => Token::Number(self.read_number()?),
            c if c.is_alphabetic() || c == '_' => Token::Ident(self.read_ident()),
            _ => {
                return Err(ExpressionFailure::new(
                    format!("unexpected character '{}'", c),
                    start,
                ))
            }
        };
        Ok((token, start))
    }
}

// ============================================================================
// AST
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
}

#[derive(Debug, Clone)]
enum Ast {
    Num(f64),
    /// Variable name and its offset in the source
    Var(String, usize),
    BinOp(BinOp, Box<Ast>, Box<Ast>),
    Neg(Box<Ast>),
    Call(String, Vec<Ast>, usize),
}

#[derive(Debug, Clone)]
struct Statement {
    target: String,
    /// `None` for plain assignment
    op: Option<BinOp>,
    value: Ast,
    position: usize,
}

// ============================================================================
// Parser
// ============================================================================

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    position: usize,
    /// Tree depth of the operand being parsed
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self, ExpressionFailure> {
        let mut lexer = Lexer::new(input);
        let (current, position) = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            position,
            depth: 0,
        })
    }

    /// Enter one more tree level
    fn descend(&mut self) -> Result<(), ExpressionFailure> {
        if self.depth >= MAX_NESTING {
            return Err(ExpressionFailure::new(
                format!("expression nested deeper than {} levels", MAX_NESTING),
                self.position,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn advance(&mut self) -> Result<(), ExpressionFailure> {
        let (token, position) = self.lexer.next_token()?;
        self.current = token;
        self.position = position;
        Ok(())
    }

    fn unexpected(&self) -> ExpressionFailure {
        match &self.current {
            Token::Eof => ExpressionFailure::new("unexpected end of expression", self.position),
            token => ExpressionFailure::new(format!("unexpected token {:?}", token), self.position),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), ExpressionFailure> {
        if self.current == expected {
            self.advance()
        } else {
            Err(self.unexpected())
        }
    }

    fn parse_program(&mut self) -> Result<Vec<Statement>, ExpressionFailure> {
        let mut statements = Vec::new();
        loop {
            while self.current == Token::Semicolon {
                self.advance()?;
            }
            if self.current == Token::Eof {
                return Ok(statements);
            }
            statements.push(self.parse_statement()?);
            match self.current {
                Token::Semicolon | Token::Eof => {}
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn parse_statement(&mut self) -> Result<Statement, ExpressionFailure> {
        let position = self.position;
        let Token::Ident(target) = self.current.clone() else {
            return Err(ExpressionFailure::new("expected an assignment target", position));
        };
        self.advance()?;
        let op = match self.current {
            Token::Assign => None,
            Token::CompoundAssign(op) => Some(op),
            _ => {
                return Err(ExpressionFailure::new(
                    format!("expected '=' after '{}'", target),
                    self.position,
                ))
            }
        };
        self.advance()?;
        let value = self.parse_expr()?;
        Ok(Statement {
            target,
            op,
            value,
            position,
        })
    }

    fn parse_expr(&mut self) -> Result<Ast, ExpressionFailure> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Ast, ExpressionFailure> {
        let entry = self.depth;
        let mut left = self.parse_add_sub()?;

        loop {
            let op = match self.current {
                Token::Less => BinOp::Less,
                Token::LessEqual => BinOp::LessEqual,
                Token::Greater => BinOp::Greater,
                Token::GreaterEqual => BinOp::GreaterEqual,
                Token::Equal => BinOp::Equal,
                Token::NotEqual => BinOp::NotEqual,
                _ => break,
            };
            self.advance()?;
            self.descend()?;
            let right = self.parse_add_sub()?;
            left = Ast::BinOp(op, Box::new(left), Box::new(right));
        }

        self.depth = entry;
        Ok(left)
    }

    fn parse_add_sub(&mut self) -> Result<Ast, ExpressionFailure> {
        let entry = self.depth;
        let mut left = self.parse_mul_div()?;

        loop {
            let op = match self.current {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance()?;
            self.descend()?;
            let right = self.parse_mul_div()?;
            left = Ast::BinOp(op, Box::new(left), Box::new(right));
        }

        self.depth = entry;
        Ok(left)
    }

    fn parse_mul_div(&mut self) -> Result<Ast, ExpressionFailure> {
        let entry = self.depth;
        let mut left = self.parse_power()?;

        loop {
            let op = match self.current {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Percent => BinOp::Rem,
                _ => break,
            };
            self.advance()?;
            self.descend()?;
            let right = self.parse_power()?;
            left = Ast::BinOp(op, Box::new(left), Box::new(right));
        }

        self.depth = entry;
        Ok(left)
    }

    fn parse_power(&mut self) -> Result<Ast, ExpressionFailure> {
        let base = self.parse_unary()?;

        if self.current == Token::Caret {
            self.advance()?;
            self.descend()?;
            let exp = self.parse_power()?; // Right associative
            self.depth -= 1;
            Ok(Ast::BinOp(BinOp::Pow, Box::new(base), Box::new(exp)))
        } else {
            Ok(base)
        }
    }

    fn parse_unary(&mut self) -> Result<Ast, ExpressionFailure> {
        self.descend()?;
        let ast = match self.current {
            Token::Minus => {
                self.advance()?;
                Ast::Neg(Box::new(self.parse_unary()?))
            }
            Token::Plus => {
                self.advance()?;
                self.parse_unary()?
            }
            _ => self.parse_primary()?,
        };
        self.depth -= 1;
        Ok(ast)
    }

    fn parse_primary(&mut self) -> Result<Ast, ExpressionFailure> {
        let position = self.position;
        match &self.current {
            Token::Number(n) => {
                let n = *n;
                self.advance()?;
                Ok(Ast::Num(n))
            }
            Token::Ident(name) => {
                let name = name.clone();
                self.advance()?;

                if self.current == Token::LParen {
                    self.advance()?;
                    let mut args = Vec::new();
                    if self.current != Token::RParen {
                        args.push(self.parse_expr()?);
                        while self.current == Token::Comma {
                            self.advance()?;
                            args.push(self.parse_expr()?);
                        }
                    }
                    self.expect(Token::RParen)?;
                    Ok(Ast::Call(name, args, position))
                } else {
                    match name.as_str() {
                        "pi" | "PI" => Ok(Ast::Num(PI)),
                        "e" | "E" => Ok(Ast::Num(E)),
                        _ => Ok(Ast::Var(name, position)),
                    }
                }
            }
            Token::LParen => {
                self.advance()?;
                let inner = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            _ => Err(self.unexpected()),
        }
    }
}

// ============================================================================
// Evaluation
// ============================================================================

fn truth(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn apply(op: BinOp, a: f64, b: f64) -> f64 {
    match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        BinOp::Rem => a % b,
        BinOp::Pow => a.powf(b),
        BinOp::Less => truth(a < b),
        BinOp::LessEqual => truth(a <= b),
        BinOp::Greater => truth(a > b),
        BinOp::GreaterEqual => truth(a >= b),
        BinOp::Equal => truth(a == b),
        BinOp::NotEqual => truth(a != b),
    }
}

fn call_function(name: &str, args: &[f64], position: usize) -> Result<f64, ExpressionFailure> {
    let arity = |expected: usize| {
        if args.len() == expected {
            Ok(())
        } else {
            Err(ExpressionFailure::new(
                format!("function '{}' expects {} args, got {}", name, expected, args.len()),
                position,
            ))
        }
    };

    let value = match name {
        "sin" | "cos" | "tan" | "asin" | "acos" | "atan" | "sqrt" | "abs" | "floor" | "ceil"
        | "round" | "fract" | "exp" | "ln" | "log10" | "sign" | "radians" | "degrees" => {
            arity(1)?;
            let a = args[0];
            match name {
                "sin" => a.sin(),
                "cos" => a.cos(),
                "tan" => a.tan(),
                "asin" => a.asin(),
                "acos" => a.acos(),
                "atan" => a.atan(),
                "sqrt" => a.sqrt(),
                "abs" => a.abs(),
                "floor" => a.floor(),
                "ceil" => a.ceil(),
                "round" => a.round(),
                "fract" => a.fract(),
                "exp" => a.exp(),
                "ln" => a.ln(),
                "log10" => a.log10(),
                "sign" => a.signum(),
                "radians" => a.to_radians(),
                _ => a.to_degrees(),
            }
        }
        "min" | "max" | "pow" | "atan2" | "step" => {
            arity(2)?;
            let (a, b) = (args[0], args[1]);
            match name {
                "min" => a.min(b),
                "max" => a.max(b),
                "pow" => a.powf(b),
                "atan2" => a.atan2(b),
                _ => truth(b >= a),
            }
        }
        "clamp" => {
            arity(3)?;
            args[0].max(args[1]).min(args[2])
        }
        "lerp" | "mix" => {
            arity(3)?;
            args[0] + (args[1] - args[0]) * args[2]
        }
        "fit01" => {
            arity(3)?;
            args[1] + (args[2] - args[1]) * args[0].clamp(0.0, 1.0)
        }
        _ => {
            return Err(ExpressionFailure::new(
                format!("unknown function '{}'", name),
                position,
            ))
        }
    };
    Ok(value)
}

fn eval(ast: &Ast, variables: &VariableMap) -> Result<f64, ExpressionFailure> {
    match ast {
        Ast::Num(n) => Ok(*n),
        Ast::Var(name, position) => variables
            .get(name)
            .copied()
            .ok_or_else(|| ExpressionFailure::new(format!("unknown variable '{}'", name), *position)),
        Ast::BinOp(op, a, b) => Ok(apply(*op, eval(a, variables)?, eval(b, variables)?)),
        Ast::Neg(inner) => Ok(-eval(inner, variables)?),
        Ast::Call(name, args, position) => {
            let values = args
                .iter()
                .map(|arg| eval(arg, variables))
                .collect::<Result<Vec<_>, _>>()?;
            call_function(name, &values, *position)
        }
    }
}

/// A parsed snippet ready to run against many variable sets
#[derive(Debug, Clone)]
pub struct Program {
    statements: Vec<Statement>,
}

impl Program {
    pub fn parse(snippet: &str) -> Result<Self, ExpressionFailure> {
        let statements = Parser::new(snippet)?.parse_program()?;
        Ok(Self { statements })
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Run every statement in order; assignments are visible to later ones
    pub fn run(&self, variables: &mut VariableMap) -> Result<(), ExpressionFailure> {
        for statement in &self.statements {
            let value = eval(&statement.value, variables)?;
            let result = match statement.op {
                None => value,
                Some(op) => {
                    let current = variables.get(&statement.target).copied().ok_or_else(|| {
                        ExpressionFailure::new(
                            format!("unknown variable '{}'", statement.target),
                            statement.position,
                        )
                    })?;
                    apply(op, current, value)
                }
            };
            if !result.is_finite() {
                return Err(ExpressionFailure::new(
                    format!("'{}' evaluated to {}", statement.target, result),
                    statement.position,
                ));
            }
            variables.insert(statement.target.clone(), result);
        }
        Ok(())
    }
}

/// The evaluator installed by [`Kernels::default`](super::Kernels)
///
/// Wrangle runs the same snippet once per point, so the last parsed
/// program is kept and reused while the snippet text is unchanged.
#[derive(Debug, Default)]
pub struct BasicEvaluator {
    last: Mutex<Option<(String, Arc<Program>)>>,
}

impl BasicEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parsed form of `snippet`, from the cache when possible
    pub fn program(&self, snippet: &str) -> Result<Arc<Program>, ExpressionFailure> {
        let mut last = self.last.lock();
        if let Some((text, program)) = last.as_ref() {
            if text == snippet {
                return Ok(program.clone());
            }
        }
        let program = Arc::new(Program::parse(snippet)?);
        *last = Some((snippet.to_string(), program.clone()));
        Ok(program)
    }
}

impl ExpressionEvaluator for BasicEvaluator {
    fn execute(&self, snippet: &str, variables: &mut VariableMap) -> Result<(), ExpressionFailure> {
        self.program(snippet)?.run(variables)
    }
}
