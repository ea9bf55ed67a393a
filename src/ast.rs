use std::fmt;

/// An ordered list of top-level statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
    Plus,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    LooseEqual,
    LooseNotEqual,
    StrictEqual,
    StrictNotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
    Undefined,
    Identifier(String),
    Array(Vec<Expr>),
    /// Key/value pairs in source order, duplicates included.
    Object(Vec<(String, Expr)>),
    Function {
        name: Option<String>,
        params: Vec<String>,
        body: Vec<Stmt>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// The comma operator: evaluate left, discard, yield right.
    Sequence {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `obj.name` or `obj[expr]`, normalized to a computed key expression
    /// for dot access (`obj.name` stores `Expr::String("name")`).
    Member {
        object: Box<Expr>,
        property: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Block(Vec<Stmt>),
    /// One `var` statement; each entry is a name and optional initializer.
    VariableDecl(Vec<(String, Option<Expr>)>),
    Empty,
    Expression(Expr),
    If {
        condition: Expr,
        consequent: Box<Stmt>,
        alternate: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        condition: Expr,
    },
    Return(Option<Expr>),
    Break,
    Continue,
}

/// Collects every name declared with `var` in `body`, in source order,
/// without descending into nested function bodies. Function-level scoping
/// hoists these to the enclosing frame before the body runs.
pub fn declared_vars(body: &[Stmt]) -> Vec<String> {
    let mut names = Vec::new();
    for stmt in body {
        collect_vars(stmt, &mut names);
    }
    names
}

fn collect_vars(stmt: &Stmt, names: &mut Vec<String>) {
    match stmt {
        Stmt::VariableDecl(decls) => {
            for (name, _) in decls {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        Stmt::Block(body) => {
            for stmt in body {
                collect_vars(stmt, names);
            }
        }
        Stmt::If {
            consequent,
            alternate,
            ..
        } => {
            collect_vars(consequent, names);
            if let Some(alternate) = alternate {
                collect_vars(alternate, names);
            }
        }
        Stmt::While { body, .. } | Stmt::DoWhile { body, .. } => {
            collect_vars(body, names);
        }
        Stmt::Empty | Stmt::Expression(_) | Stmt::Return(_) | Stmt::Break | Stmt::Continue => {}
    }
}

// The printers below emit source that re-parses to the same tree. Every
// compound expression is parenthesized, so no precedence bookkeeping is
// needed, and expression statements are wrapped in parentheses so a
// leading `{` or `function` cannot be misread at statement position.

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.body {
            writeln!(f, "{stmt}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Block(body) => {
                write!(f, "{{ ")?;
                for stmt in body {
                    write!(f, "{stmt} ")?;
                }
                write!(f, "}}")
            }
            Stmt::VariableDecl(decls) => {
                write!(f, "var ")?;
                for (i, (name, init)) in decls.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match init {
                        Some(expr) => write!(f, "{name} = {expr}")?,
                        None => write!(f, "{name}")?,
                    }
                }
                write!(f, ";")
            }
            Stmt::Empty => write!(f, ";"),
            Stmt::Expression(expr) => write!(f, "({expr});"),
            Stmt::If {
                condition,
                consequent,
                alternate,
            } => {
                write!(f, "if ({condition}) {consequent}")?;
                if let Some(alternate) = alternate {
                    write!(f, " else {alternate}")?;
                }
                Ok(())
            }
            Stmt::While { condition, body } => write!(f, "while ({condition}) {body}"),
            Stmt::DoWhile { body, condition } => {
                write!(f, "do {body} while ({condition});")
            }
            Stmt::Return(value) => match value {
                Some(expr) => write!(f, "return {expr};"),
                None => write!(f, "return;"),
            },
            Stmt::Break => write!(f, "break;"),
            Stmt::Continue => write!(f, "continue;"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", format_number(*n)),
            Expr::String(s) => write!(f, "{}", quote_string(s)),
            Expr::Boolean(b) => write!(f, "{b}"),
            Expr::Null => write!(f, "null"),
            Expr::Undefined => write!(f, "undefined"),
            Expr::Identifier(name) => write!(f, "{name}"),
            Expr::Array(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, "]")
            }
            Expr::Object(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if is_identifier_name(key) {
                        write!(f, "{key}: {value}")?;
                    } else {
                        write!(f, "{}: {value}", quote_string(key))?;
                    }
                }
                write!(f, "}}")
            }
            Expr::Function { name, params, body } => {
                write!(f, "(function")?;
                if let Some(name) = name {
                    write!(f, " {name}")?;
                }
                write!(f, "({}) {{ ", params.join(", "))?;
                for stmt in body {
                    write!(f, "{stmt} ")?;
                }
                write!(f, "}})")
            }
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not => write!(f, "(!{operand})"),
                UnaryOp::Negate => write!(f, "(-{operand})"),
                UnaryOp::Plus => write!(f, "(+{operand})"),
                UnaryOp::PreIncrement => write!(f, "(++{operand})"),
                UnaryOp::PreDecrement => write!(f, "(--{operand})"),
                UnaryOp::PostIncrement => write!(f, "({operand}++)"),
                UnaryOp::PostDecrement => write!(f, "({operand}--)"),
            },
            Expr::Binary { op, left, right } => {
                let symbol = match op {
                    BinaryOp::Add => "+",
                    BinaryOp::Subtract => "-",
                    BinaryOp::Multiply => "*",
                    BinaryOp::Divide => "/",
                    BinaryOp::Modulo => "%",
                    BinaryOp::LooseEqual => "==",
                    BinaryOp::LooseNotEqual => "!=",
                    BinaryOp::StrictEqual => "===",
                    BinaryOp::StrictNotEqual => "!==",
                    BinaryOp::LessThan => "<",
                    BinaryOp::LessThanEqual => "<=",
                    BinaryOp::GreaterThan => ">",
                    BinaryOp::GreaterThanEqual => ">=",
                };
                write!(f, "({left} {symbol} {right})")
            }
            Expr::Logical { op, left, right } => {
                let symbol = match op {
                    LogicalOp::And => "&&",
                    LogicalOp::Or => "||",
                };
                write!(f, "({left} {symbol} {right})")
            }
            Expr::Conditional {
                condition,
                consequent,
                alternate,
            } => write!(f, "({condition} ? {consequent} : {alternate})"),
            Expr::Assign { op, target, value } => {
                let symbol = match op {
                    AssignOp::Assign => "=",
                    AssignOp::AddAssign => "+=",
                    AssignOp::SubAssign => "-=",
                    AssignOp::MulAssign => "*=",
                    AssignOp::DivAssign => "/=",
                    AssignOp::ModAssign => "%=",
                };
                write!(f, "({target} {symbol} {value})")
            }
            Expr::Sequence { left, right } => write!(f, "({left}, {right})"),
            Expr::Call { callee, args } => {
                write!(f, "({callee}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, "))")
            }
            Expr::Member { object, property } => {
                write!(f, "({object}[{property}])")
            }
        }
    }
}

/// Prints a number the way the runtime displays it: shortest decimal
/// form, `NaN` and the infinities spelled out.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        // Negative zero prints as plain zero.
        "0".to_string()
    } else {
        format!("{n}")
    }
}

fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn is_identifier_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
