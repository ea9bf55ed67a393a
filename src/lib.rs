pub mod ast;
pub mod interpreter;
pub mod lexer;
pub mod logger;
pub mod parser;

use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use log::debug;

pub use interpreter::error::RuntimeError;
pub use interpreter::value::Value;
use interpreter::Interpreter;
use lexer::LexError;
use parser::ParseError;

/// Any failure from the pipeline, tagged by the stage that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Lex(LexError),
    Parse(ParseError),
    Runtime(RuntimeError),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Lex(e) => write!(f, "lex error: {e}"),
            Error::Parse(e) => write!(f, "parse error: {e}"),
            Error::Runtime(e) => write!(f, "runtime error: {e}"),
        }
    }
}

impl From<LexError> for Error {
    fn from(e: LexError) -> Self {
        Error::Lex(e)
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<RuntimeError> for Error {
    fn from(e: RuntimeError) -> Self {
        Error::Runtime(e)
    }
}

/// Runs source text through the whole pipeline. Global state persists
/// across `eval` calls on the same engine.
///
/// ```
/// use parvus::{Engine, Value};
///
/// let mut engine = Engine::new();
/// let result = engine.eval("var x = 2; x * 21;").unwrap();
/// assert_eq!(result, Value::Number(42.0));
/// ```
pub struct Engine {
    interpreter: Interpreter,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    /// An engine whose script output goes to `out`; used by tests to
    /// capture what `log` prints.
    pub fn with_output(out: Rc<RefCell<dyn Write>>) -> Self {
        Self {
            interpreter: Interpreter::with_output(out),
        }
    }

    /// Lexes, parses, and evaluates `source`, yielding the value of its
    /// last value-producing statement.
    pub fn eval(&mut self, source: &str) -> Result<Value, Error> {
        debug!(target: "engine", "Evaluating {} bytes of source", source.len());
        let tokens = lexer::tokenize(source)?;
        let program = parser::parse(tokens)?;
        Ok(self.interpreter.run(&program)?)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn each_stage_maps_to_its_error_variant() {
        let mut engine = Engine::new();
        assert!(matches!(engine.eval("@"), Err(Error::Lex(_))));
        assert!(matches!(engine.eval("var = 1;"), Err(Error::Parse(_))));
        assert!(matches!(engine.eval("nope();"), Err(Error::Runtime(_))));
    }

    #[test]
    fn globals_persist_across_eval_calls() {
        let mut engine = Engine::new();
        engine.eval("var total = 0;").expect("first eval failed");
        engine
            .eval("total = total + 40;")
            .expect("second eval failed");
        assert_eq!(engine.eval("total + 2;"), Ok(Value::Number(42.0)));
    }

    #[test]
    fn error_messages_name_the_stage() {
        let mut engine = Engine::new();
        let err = engine.eval("missing;").expect_err("expected an error");
        assert_eq!(
            err.to_string(),
            "runtime error: ReferenceError: missing is not declared"
        );
    }
}
