//! Line evaluator for the reversible shell
//!
//! A small integer language:
//! - `name = expr` binds a local, `global name = expr` binds a global
//! - `del name` removes a binding (local first)
//! - `print expr` or a bare `expr` yields a value to show
//! - `+ - * / %`, parentheses, unary minus, variables and `rand()` / `rand(n)`
//!
//! All interpreter state, the random generator included, lives in process
//! memory so that a rewind reverts it.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Exclusive upper bound of `rand()` without an argument
pub const RAND_DEFAULT_BOUND: i64 = 100;

/// Most operators and nesting levels one expression group may hold
///
/// Bounds the recursion of parsing, evaluating and dropping a line.
pub const MAX_NESTING: usize = 256;

const KEYWORDS: &[&str] = &["global", "del", "print", "undo"];

/// Errors reported for one line; they never end the session
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("unexpected end of line")]
    UnexpectedEnd,

    #[error("unexpected '{0}'")]
    UnexpectedToken(String),

    #[error("integer literal out of range: {0}")]
    LiteralOutOfRange(String),

    #[error("'{0}' is a reserved word")]
    Reserved(String),

    #[error("name '{0}' is not defined")]
    Undefined(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("{function}() takes at most {max} argument(s), got {got}")]
    Arity {
        function: String,
        max: usize,
        got: usize,
    },

    #[error("rand() bound must be positive, got {0}")]
    InvalidBound(i64),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,

    #[error("expression too deep (more than {0} nested operations)")]
    TooDeep(usize),
}

pub type EvalResult<T> = std::result::Result<T, EvalError>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Int(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    Comma,
    Assign,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Int(text) | Token::Ident(text) => f.write_str(text),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::Percent => f.write_str("%"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Comma => f.write_str(","),
            Token::Assign => f.write_str("="),
        }
    }
}

fn tokenize(line: &str) -> EvalResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c.is_ascii_digit() {
            let mut text = String::new();
            while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                text.push(d);
                chars.next();
            }
            tokens.push(Token::Int(text));
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let mut text = String::new();
            while let Some(&d) = chars.peek().filter(|d| d.is_alphanumeric() || **d == '_') {
                text.push(d);
                chars.next();
            }
            tokens.push(Token::Ident(text));
            continue;
        }

        let token = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            '=' => Token::Assign,
            other => return Err(EvalError::UnexpectedChar(other)),
        };
        tokens.push(token);
        chars.next();
    }

    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Int(i64),
    Var(String),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Statement {
    Assign {
        name: String,
        global: bool,
        value: Expr,
    },
    Delete(String),
    Print(Expr),
    Eval(Expr),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> EvalResult<Token> {
        let token = self.tokens.get(self.pos).cloned().ok_or(EvalError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, expected: Token) -> EvalResult<()> {
        let token = self.advance()?;
        if token == expected {
            Ok(())
        } else {
            Err(EvalError::UnexpectedToken(token.to_string()))
        }
    }

    fn enter(&mut self) -> EvalResult<()> {
        if self.depth >= MAX_NESTING {
            return Err(EvalError::TooDeep(MAX_NESTING));
        }
        self.depth += 1;
        Ok(())
    }

    fn finish(&self) -> EvalResult<()> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(EvalError::UnexpectedToken(token.to_string())),
        }
    }

    fn statement(&mut self) -> EvalResult<Statement> {
        let keyword = match self.peek() {
            Some(Token::Ident(word)) if KEYWORDS.contains(&word.as_str()) => Some(word.clone()),
            _ => None,
        };
        let assigns = matches!(
            (self.peek(), self.peek_at(1)),
            (Some(Token::Ident(_)), Some(Token::Assign))
        );

        let statement = match keyword.as_deref() {
            Some("global") => {
                self.pos += 1;
                let name = self.binding_name()?;
                self.expect(Token::Assign)?;
                Statement::Assign {
                    name,
                    global: true,
                    value: self.expr()?,
                }
            }
            Some("del") => {
                self.pos += 1;
                Statement::Delete(self.binding_name()?)
            }
            Some("print") => {
                self.pos += 1;
                Statement::Print(self.expr()?)
            }
            _ if assigns => {
                let name = self.binding_name()?;
                self.expect(Token::Assign)?;
                Statement::Assign {
                    name,
                    global: false,
                    value: self.expr()?,
                }
            }
            _ => Statement::Eval(self.expr()?),
        };
        self.finish()?;
        Ok(statement)
    }

    fn binding_name(&mut self) -> EvalResult<String> {
        match self.advance()? {
            Token::Ident(name) if KEYWORDS.contains(&name.as_str()) || name == "rand" => {
                Err(EvalError::Reserved(name))
            }
            Token::Ident(name) => Ok(name),
            other => Err(EvalError::UnexpectedToken(other.to_string())),
        }
    }

    fn expr(&mut self) -> EvalResult<Expr> {
        let outer = self.depth;
        self.enter()?;
        let expr = self.sum();
        self.depth = outer;
        expr
    }

    fn sum(&mut self) -> EvalResult<Expr> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            self.enter()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(self.term()?));
        }
    }

    fn term(&mut self) -> EvalResult<Expr> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            self.enter()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(self.unary()?));
        }
    }

    fn unary(&mut self) -> EvalResult<Expr> {
        if self.peek() == Some(&Token::Minus) {
            self.pos += 1;
            self.enter()?;
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> EvalResult<Expr> {
        match self.advance()? {
            Token::Int(text) => text
                .parse()
                .map(Expr::Int)
                .map_err(|_| EvalError::LiteralOutOfRange(text)),
            Token::Ident(name) if self.peek() == Some(&Token::LParen) => {
                self.pos += 1;
                let mut args = Vec::new();
                if self.peek() != Some(&Token::RParen) {
                    args.push(self.expr()?);
                    while self.peek() == Some(&Token::Comma) {
                        self.pos += 1;
                        args.push(self.expr()?);
                    }
                }
                self.expect(Token::RParen)?;
                Ok(Expr::Call(name, args))
            }
            Token::Ident(name) if KEYWORDS.contains(&name.as_str()) => {
                Err(EvalError::Reserved(name))
            }
            Token::Ident(name) => Ok(Expr::Var(name)),
            Token::LParen => {
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            other => Err(EvalError::UnexpectedToken(other.to_string())),
        }
    }
}

/// Local and global variable bindings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    locals: BTreeMap<String, i64>,
    globals: BTreeMap<String, i64>,
}

impl Scope {
    pub fn locals(&self) -> &BTreeMap<String, i64> {
        &self.locals
    }

    pub fn globals(&self) -> &BTreeMap<String, i64> {
        &self.globals
    }

    /// Resolve `name`, locals shadowing globals
    pub fn get(&self, name: &str) -> Option<i64> {
        self.locals.get(name).or_else(|| self.globals.get(name)).copied()
    }
}

/// Renders bindings as `{a: 1, b: 2}`
pub struct Bindings<'a>(pub &'a BTreeMap<String, i64>);

impl fmt::Display for Bindings<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        f.write_str("}")
    }
}

/// Evaluates shell lines against a persistent [`Scope`]
pub struct Interpreter {
    scope: Scope,
    rng: ChaCha8Rng,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_rng(ChaCha8Rng::from_entropy())
    }

    /// Deterministic `rand()` sequence
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(rng: ChaCha8Rng) -> Self {
        Self {
            scope: Scope::default(),
            rng,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Run one line, returning the value it prints, if any
    ///
    /// A failing line leaves the scope untouched.
    pub fn execute(&mut self, line: &str) -> EvalResult<Option<i64>> {
        let statement = Parser::new(tokenize(line)?).statement()?;

        match statement {
            Statement::Assign {
                name,
                global,
                value,
            } => {
                let value = self.eval(&value)?;
                if global {
                    self.scope.globals.insert(name, value);
                } else {
                    self.scope.locals.insert(name, value);
                }
                Ok(None)
            }
            Statement::Delete(name) => {
                if self.scope.locals.remove(&name).is_none()
                    && self.scope.globals.remove(&name).is_none()
                {
                    return Err(EvalError::Undefined(name));
                }
                Ok(None)
            }
            Statement::Print(expr) | Statement::Eval(expr) => self.eval(&expr).map(Some),
        }
    }

    fn eval(&mut self, expr: &Expr) -> EvalResult<i64> {
        match expr {
            Expr::Int(value) => Ok(*value),
            Expr::Var(name) => self
                .scope
                .get(name)
                .ok_or_else(|| EvalError::Undefined(name.clone())),
            Expr::Neg(inner) => self.eval(inner)?.checked_neg().ok_or(EvalError::Overflow),
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                apply(*op, lhs, rhs)
            }
            Expr::Call(function, args) => self.call(function, args),
        }
    }

    fn call(&mut self, function: &str, args: &[Expr]) -> EvalResult<i64> {
        if function != "rand" {
            return Err(EvalError::UnknownFunction(function.to_string()));
        }
        let bound = match args {
            [] => RAND_DEFAULT_BOUND,
            [bound] => self.eval(bound)?,
            _ => {
                return Err(EvalError::Arity {
                    function: function.to_string(),
                    max: 1,
                    got: args.len(),
                })
            }
        };
        if bound <= 0 {
            return Err(EvalError::InvalidBound(bound));
        }
        Ok(self.rng.gen_range(0..bound))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn apply(op: BinaryOp, lhs: i64, rhs: i64) -> EvalResult<i64> {
    let result = match op {
        BinaryOp::Add => lhs.checked_add(rhs),
        BinaryOp::Sub => lhs.checked_sub(rhs),
        BinaryOp::Mul => lhs.checked_mul(rhs),
        BinaryOp::Div | BinaryOp::Rem if rhs == 0 => return Err(EvalError::DivisionByZero),
        BinaryOp::Div => lhs.checked_div(rhs),
        BinaryOp::Rem => lhs.checked_rem(rhs),
    };
    result.ok_or(EvalError::Overflow)
}
