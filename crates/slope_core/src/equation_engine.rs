use crate::error::{CompileError, EvalError};
use crate::traits::{DynamicalSystem, Scalar};
use serde::{Deserialize, Serialize};
use std::f64::consts::{E, PI};

/// Point at which a freshly compiled expression is type-checked.
const PROBE: (f64, f64) = (1.0, 1.0);

/// Deepest nesting of parentheses, calls and unary or power operators.
pub const MAX_DEPTH: usize = 256;

/// Longest accepted expression, in tokens. Also bounds the height of the
/// syntax tree, and with it the recursion of evaluation.
pub const MAX_TOKENS: usize = 2048;

// --- Vocabulary ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    /// Floored modulo; the result takes the sign of the divisor.
    Rem,
    Pow,
}

/// The closed set of callable functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Arcsin,
    Arccos,
    Arctan,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(Function::Sin),
            "cos" => Some(Function::Cos),
            "tan" => Some(Function::Tan),
            "arcsin" => Some(Function::Arcsin),
            "arccos" => Some(Function::Arccos),
            "arctan" => Some(Function::Arctan),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Arcsin => "arcsin",
            Function::Arccos => "arccos",
            Function::Arctan => "arctan",
        }
    }

    fn apply<T: Scalar>(self, a: T) -> Result<T, EvalError> {
        let in_unit_interval = a >= -T::one() && a <= T::one();
        match self {
            Function::Sin => Ok(a.sin()),
            Function::Cos => Ok(a.cos()),
            Function::Tan => Ok(a.tan()),
            Function::Arcsin | Function::Arccos if !in_unit_interval => Err(EvalError::Domain {
                function: self.name(),
                argument: a.to_f64().unwrap_or(f64::NAN),
            }),
            Function::Arcsin => Ok(a.asin()),
            Function::Arccos => Ok(a.acos()),
            Function::Arctan => Ok(a.atan()),
        }
    }
}

fn constant(name: &str) -> Option<f64> {
    match name {
        "e" | "E" => Some(E),
        "pi" | "π" => Some(PI),
        _ => None,
    }
}

/// Which identifiers name the two free variables of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableNaming {
    /// `f(x, y)`
    #[default]
    Cartesian,
    /// `f(t, P)`, the naming some parametric front ends use.
    Parametric,
}

impl VariableNaming {
    pub fn names(self) -> [&'static str; 2] {
        match self {
            VariableNaming::Cartesian => ["x", "y"],
            VariableNaming::Parametric => ["t", "P"],
        }
    }
}

// --- AST & Parser ---

/// Abstract Syntax Tree nodes for expressions, as written by the user.
/// Identifiers are still unresolved names here.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    Neg(Box<Expr>),
    Call(Function, Box<Expr>),
}

/// Parses a string expression into an AST.
///
/// `^` and `**` both mean exponentiation; implicit multiplication is not
/// supported.
pub fn parse(input: &str) -> Result<Expr, CompileError> {
    let tokens = tokenize(input)?;
    if tokens.len() > MAX_TOKENS {
        return Err(syntax(tokens[MAX_TOKENS].1, "expression too long"));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input.len(),
        depth: 0,
    };
    if parser.peek().is_none() {
        return Err(syntax(0, "empty expression"));
    }
    let expr = parser.parse_expression()?;
    match parser.tokens.get(parser.pos) {
        None => Ok(expr),
        Some((token, at)) => Err(syntax(*at, format!("unexpected {}", token.describe()))),
    }
}

fn syntax(position: usize, message: impl Into<String>) -> CompileError {
    CompileError::SyntaxError {
        position,
        message: message.into(),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {n}"),
            Token::Identifier(name) => format!("identifier `{name}`"),
            Token::Plus => "`+`".into(),
            Token::Minus => "`-`".into(),
            Token::Star => "`*`".into(),
            Token::Slash => "`/`".into(),
            Token::Percent => "`%`".into(),
            Token::Caret => "`^`".into(),
            Token::LParen => "`(`".into(),
            Token::RParen => "`)`".into(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, CompileError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (at, c) = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() || c == '.' {
            let start = i;
            while i < chars.len() && (chars[i].1.is_ascii_digit() || chars[i].1 == '.') {
                i += 1;
            }
            // Exponent only when digits follow, so `2*e` style input still lexes `e`.
            if i < chars.len() && matches!(chars[i].1, 'e' | 'E') {
                let mut j = i + 1;
                if j < chars.len() && matches!(chars[j].1, '+' | '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].1.is_ascii_digit() {
                    i = j;
                    while i < chars.len() && chars[i].1.is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let stop = chars.get(i).map_or(input.len(), |(pos, _)| *pos);
            let literal = &input[chars[start].0..stop];
            let value: f64 = literal
                .parse()
                .map_err(|_| syntax(at, format!("invalid number `{literal}`")))?;
            tokens.push((Token::Number(value), at));
        } else if c.is_alphabetic() {
            let start = i;
            while i < chars.len() && (chars[i].1.is_alphanumeric() || chars[i].1 == '_') {
                i += 1;
            }
            let stop = chars.get(i).map_or(input.len(), |(pos, _)| *pos);
            tokens.push((Token::Identifier(input[chars[start].0..stop].to_string()), at));
        } else {
            let token = match c {
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' if chars.get(i + 1).map(|(_, n)| *n) == Some('*') => {
                    i += 1;
                    Token::Caret
                }
                '*' => Token::Star,
                '/' => Token::Slash,
                '%' => Token::Percent,
                '^' => Token::Caret,
                '(' => Token::LParen,
                ')' => Token::RParen,
                other => return Err(syntax(at, format!("unexpected character `{other}`"))),
            };
            tokens.push((token, at));
            i += 1;
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(_, at)| *at)
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn descend(&mut self) -> Result<(), CompileError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(syntax(self.position(), "expression nested too deeply"));
        }
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    fn expect_rparen(&mut self) -> Result<(), CompileError> {
        let at = self.position();
        match self.consume() {
            Some(Token::RParen) => Ok(()),
            _ => Err(syntax(at, "expected `)`")),
        }
    }

    fn parse_expression(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_term()?;

        while let Some(token) = self.peek() {
            let op = match token {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.consume();
            let right = self.parse_term()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_unary()?;

        while let Some(token) = self.peek() {
            let op = match token {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Rem,
                _ => break,
            };
            self.consume();
            let right = self.parse_unary()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.consume();
                self.descend()?;
                let expr = self.parse_unary()?;
                self.ascend();
                Ok(Expr::Neg(Box::new(expr)))
            }
            Some(Token::Plus) => {
                self.consume();
                self.descend()?;
                let expr = self.parse_unary()?;
                self.ascend();
                Ok(expr)
            }
            _ => self.parse_power(),
        }
    }

    /// Right associative, and the exponent may carry its own sign: `2^-x^2`.
    fn parse_power(&mut self) -> Result<Expr, CompileError> {
        let base = self.parse_primary()?;
        if let Some(Token::Caret) = self.peek() {
            self.consume();
            self.descend()?;
            let exponent = self.parse_unary()?;
            self.ascend();
            return Ok(Expr::Binary(Box::new(base), BinaryOp::Pow, Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        let at = self.position();
        match self.consume() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Identifier(name)) => {
                let is_call = matches!(self.peek(), Some(Token::LParen));
                match (Function::from_name(&name), is_call) {
                    (Some(func), true) => {
                        self.consume(); // eat '('
                        self.descend()?;
                        let arg = self.parse_expression()?;
                        self.expect_rparen()?;
                        self.ascend();
                        Ok(Expr::Call(func, Box::new(arg)))
                    }
                    (Some(func), false) => Err(syntax(
                        at,
                        format!("function `{}` must be called with an argument", func.name()),
                    )),
                    (None, true) => Err(CompileError::UnknownIdentifier(name)),
                    (None, false) => Ok(Expr::Variable(name)),
                }
            }
            Some(Token::LParen) => {
                self.descend()?;
                let expr = self.parse_expression()?;
                self.expect_rparen()?;
                self.ascend();
                Ok(expr)
            }
            Some(token) => Err(syntax(at, format!("unexpected {}", token.describe()))),
            None => Err(syntax(at, "unexpected end of expression")),
        }
    }
}

// --- Name resolution ---

/// Expression tree with every identifier resolved to a variable slot or a
/// constant. This is what gets evaluated.
#[derive(Debug, Clone, PartialEq)]
enum Node {
    Const(f64),
    Var(usize),
    Binary(Box<Node>, BinaryOp, Box<Node>),
    Neg(Box<Node>),
    Call(Function, Box<Node>),
}

/// Resolves the names in an `Expr` against the variable naming in use.
pub struct Compiler {
    names: [&'static str; 2],
}

impl Compiler {
    pub fn new(naming: VariableNaming) -> Self {
        Self {
            names: naming.names(),
        }
    }

    /// Resolves names and type-checks the expression at `(1, 1)`.
    pub fn compile(&self, expr: &Expr) -> Result<CompiledExpr, CompileError> {
        let compiled = CompiledExpr {
            root: self.resolve(expr)?,
        };
        match compiled.evaluate(PROBE.0, PROBE.1) {
            Ok(_) => Ok(compiled),
            Err(EvalError::NonFinite) => Err(CompileError::InvalidResult),
            Err(err) => Err(CompileError::EvaluationError(err)),
        }
    }

    fn resolve(&self, expr: &Expr) -> Result<Node, CompileError> {
        Ok(match expr {
            Expr::Number(n) => Node::Const(*n),
            Expr::Variable(name) => {
                if let Some(slot) = self.names.iter().position(|v| v == name) {
                    Node::Var(slot)
                } else if let Some(value) = constant(name) {
                    Node::Const(value)
                } else {
                    return Err(CompileError::UnknownIdentifier(name.clone()));
                }
            }
            Expr::Binary(left, op, right) => Node::Binary(
                Box::new(self.resolve(left)?),
                *op,
                Box::new(self.resolve(right)?),
            ),
            Expr::Neg(operand) => Node::Neg(Box::new(self.resolve(operand)?)),
            Expr::Call(func, arg) => Node::Call(*func, Box::new(self.resolve(arg)?)),
        })
    }
}

/// Parses and compiles `text` with the default `x`, `y` naming.
pub fn compile(text: &str) -> Result<CompiledExpr, CompileError> {
    compile_with(text, VariableNaming::Cartesian)
}

pub fn compile_with(text: &str, naming: VariableNaming) -> Result<CompiledExpr, CompileError> {
    let parsed = parse(text)?;
    let compiled = Compiler::new(naming).compile(&parsed);
    if let Err(err) = &compiled {
        tracing::debug!(expression = text, error = %err, "expression rejected");
    }
    compiled
}

// --- Evaluation ---

/// A validated bivariate function `f(x, y)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpr {
    root: Node,
}

impl CompiledExpr {
    pub fn evaluate(&self, x: f64, y: f64) -> Result<f64, EvalError> {
        self.evaluate_scalar(x, y)
    }

    /// Walks the tree. Any non-finite intermediate value is an error, so a
    /// successful result is always a finite number.
    pub fn evaluate_scalar<T: Scalar>(&self, x: T, y: T) -> Result<T, EvalError> {
        eval_node(&self.root, [x, y])
    }
}

fn eval_node<T: Scalar>(node: &Node, vars: [T; 2]) -> Result<T, EvalError> {
    let value = match node {
        Node::Const(n) => T::lit(*n),
        Node::Var(slot) => vars[*slot],
        Node::Neg(operand) => -eval_node(operand, vars)?,
        Node::Call(func, arg) => func.apply(eval_node(arg, vars)?)?,
        Node::Binary(left, op, right) => {
            let a = eval_node(left, vars)?;
            let b = eval_node(right, vars)?;
            match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div if b.is_zero() => return Err(EvalError::DivisionByZero),
                BinaryOp::Div => a / b,
                BinaryOp::Rem if b.is_zero() => return Err(EvalError::DivisionByZero),
                BinaryOp::Rem => a - b * (a / b).floor(),
                BinaryOp::Pow if a.is_zero() && b < T::zero() => {
                    return Err(EvalError::DivisionByZero)
                }
                BinaryOp::Pow => a.powf(b),
            }
        }
    };
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::NonFinite)
    }
}

// --- Equations ---

/// A user equation, identified by its literal source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    source: String,
    compiled: CompiledExpr,
}

impl Equation {
    pub fn compile(text: &str, naming: VariableNaming) -> Result<Self, CompileError> {
        Ok(Self {
            source: text.to_string(),
            compiled: compile_with(text, naming)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn compiled(&self) -> &CompiledExpr {
        &self.compiled
    }
}

/// The governing equations of either mode as a `DynamicalSystem`.
#[derive(Debug, Clone, Copy)]
pub enum EquationSystem<'a> {
    /// `dy/dx = f(x, y)`: time is `x` and the state is `[y]`.
    Slope(&'a CompiledExpr),
    /// `dx/dt = g(x, y)`, `dy/dt = f(x, y)`: the state is `[x, y]`.
    Planar {
        dx: &'a CompiledExpr,
        dy: &'a CompiledExpr,
    },
}

impl<T: Scalar> DynamicalSystem<T> for EquationSystem<'_> {
    fn dimension(&self) -> usize {
        match self {
            EquationSystem::Slope(_) => 1,
            EquationSystem::Planar { .. } => 2,
        }
    }

    fn apply(&self, t: T, x: &[T], out: &mut [T]) -> Result<(), EvalError> {
        match self {
            EquationSystem::Slope(f) => {
                out[0] = f.evaluate_scalar(t, x[0])?;
            }
            EquationSystem::Planar { dx, dy } => {
                out[0] = dx.evaluate_scalar(x[0], x[1])?;
                out[1] = dy.evaluate_scalar(x[0], x[1])?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        compile, compile_with, parse, BinaryOp, Expr, VariableNaming, MAX_DEPTH, MAX_TOKENS,
    };
    use crate::error::{CompileError, EvalError};
    use std::f64::consts::{E, PI};

    fn eval(text: &str, x: f64, y: f64) -> f64 {
        compile(text)
            .expect("expression should compile")
            .evaluate(x, y)
            .expect("expression should evaluate")
    }

    #[test]
    fn whitelisted_expressions_evaluate_finitely_at_probe() {
        let cases = [
            "x", "y", "x+y", "x*y - 3", "sin(x) + cos(y)", "tan(x/2)", "arcsin(y/2)",
            "arccos(0.5)", "arctan(x*y)", "e^x", "pi*y", "π", "2^-x", "x % 3", "E", "-(x)",
            "1.5e-3 * x", "x**2",
        ];
        for case in cases {
            let value = compile(case)
                .unwrap_or_else(|err| panic!("{case} should compile: {err}"))
                .evaluate(1.0, 1.0)
                .expect("probe evaluation");
            assert!(value.is_finite(), "{case} gave {value}");
        }
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(eval("2 + 3 * 4", 0.0, 0.0), 14.0);
        assert_eq!(eval("2 ^ 3 ^ 2", 0.0, 0.0), 512.0);
        assert_eq!(eval("-x^2", 3.0, 0.0), -9.0);
        assert_eq!(eval("(x - y) / 2", 5.0, 1.0), 2.0);
        assert_eq!(eval("10 - 4 - 3", 0.0, 0.0), 3.0);
        assert_eq!(eval("-7 % 3", 0.0, 0.0), 2.0);
        assert!((eval("e", 0.0, 0.0) - E).abs() < 1e-15);
        assert!((eval("sin(pi/2)", 0.0, 0.0) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn caret_and_double_star_are_the_same_operator() {
        assert_eq!(parse("x^2").expect("parse"), parse("x**2").expect("parse"));
        match parse("x^2").expect("parse") {
            Expr::Binary(_, op, _) => assert_eq!(op, BinaryOp::Pow),
            other => panic!("unexpected tree {other:?}"),
        }
    }

    #[test]
    fn rejects_identifiers_outside_whitelist() {
        for case in ["import os", "z", "x + missing", "exp(x)", "__import__(x)", "log(y)"] {
            let err = compile(case).expect_err("non-whitelisted identifier should fail");
            assert!(
                matches!(
                    err,
                    CompileError::UnknownIdentifier(_) | CompileError::SyntaxError { .. }
                ),
                "{case}: {err}"
            );
        }
        assert_eq!(
            compile("z * x"),
            Err(CompileError::UnknownIdentifier("z".to_string()))
        );
    }

    #[test]
    fn reports_syntax_errors_with_position() {
        let err = compile("x + * y").expect_err("should fail");
        assert_eq!(
            err,
            CompileError::SyntaxError {
                position: 4,
                message: "unexpected `*`".to_string()
            }
        );
        for case in ["", "   ", "(x + y", "x y", "2x", "sin", "x;y", "x = 1", "1.2.3"] {
            assert!(
                matches!(compile(case), Err(CompileError::SyntaxError { .. })),
                "{case:?} should be a syntax error"
            );
        }
    }

    #[test]
    fn deep_nesting_is_a_syntax_error() {
        let nested = format!("{}x{}", "(".repeat(10_000), ")".repeat(10_000));
        assert!(matches!(compile(&nested), Err(CompileError::SyntaxError { .. })));

        let err = compile(&format!("{}x{}", "(".repeat(300), ")".repeat(300)))
            .expect_err("too deep");
        let nested_too_deeply = CompileError::SyntaxError {
            position: 257,
            message: "expression nested too deeply".to_string(),
        };
        assert_eq!(err, nested_too_deeply);
        assert!(compile(&format!("{}x", "-".repeat(MAX_DEPTH + 1))).is_err());
        assert!(compile(&format!("{}x{}", "(".repeat(100), ")".repeat(100))).is_ok());
    }

    #[test]
    fn long_operator_chains_are_bounded() {
        let sum = vec!["x"; MAX_TOKENS].join("+");
        let err = compile(&sum).expect_err("too long");
        assert!(err.to_string().ends_with("expression too long"), "{err}");
        assert!(compile(&vec!["x"; 200].join("+")).is_ok());
    }

    #[test]
    fn probe_failures_are_classified() {
        assert_eq!(
            compile("x/0"),
            Err(CompileError::EvaluationError(EvalError::DivisionByZero))
        );
        assert_eq!(
            compile("1/(x - y)"),
            Err(CompileError::EvaluationError(EvalError::DivisionByZero))
        );
        assert!(matches!(
            compile("arcsin(2*x)"),
            Err(CompileError::EvaluationError(EvalError::Domain { function: "arcsin", .. }))
        ));
        assert_eq!(compile("e^(1000*x)"), Err(CompileError::InvalidResult));
        assert_eq!(compile("(-x)^0.5"), Err(CompileError::InvalidResult));
    }

    #[test]
    fn evaluation_errors_after_compilation() {
        let f = compile("1/x").expect("compiles at probe");
        assert_eq!(f.evaluate(0.0, 3.0), Err(EvalError::DivisionByZero));
        assert_eq!(f.evaluate(4.0, 3.0), Ok(0.25));
    }

    #[test]
    fn parametric_naming_uses_t_and_p() {
        let f = compile_with("t - 2*P", VariableNaming::Parametric).expect("compiles");
        assert_eq!(f.evaluate(5.0, 1.0), Ok(3.0));
        assert_eq!(
            compile_with("x", VariableNaming::Parametric),
            Err(CompileError::UnknownIdentifier("x".to_string()))
        );
    }

    #[test]
    fn constants_and_variables_are_resolved_before_evaluation() {
        let f = compile("x * pi + y * e").expect("compiles");
        let value = f.evaluate(2.0, 3.0).expect("evaluates");
        assert!((value - (2.0 * PI + 3.0 * E)).abs() < 1e-12);
    }
}
