use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::{Stmt, format_number};

use super::env::EnvRef;

const MAX_RENDER_DEPTH: usize = 4;

/// A runtime value. Objects, arrays, and functions have reference
/// semantics: cloning a `Value` clones the handle, not the contents.
#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Object(Rc<RefCell<Object>>),
    Array(Rc<RefCell<Vec<Value>>>),
    Function(Rc<FunctionValue>),
    Native(NativeFunction),
}

/// Insertion-ordered string-keyed map. Overwriting a key keeps its
/// original position.
#[derive(Debug, Default)]
pub struct Object {
    entries: Vec<(String, Value)>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn set(&mut self, key: &str, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }
}

/// A user-defined function: parameter names, body, the frame it closed
/// over, and its own name when the function expression was named.
pub struct FunctionValue {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub env: EnvRef,
}

/// Host builtins callable from scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeFunction {
    Log,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) => "object",
            Value::Array(_) => "array",
            Value::Function(_) | Value::Native(_) => "function",
        }
    }

    /// `false`, `0`, `NaN`, `""`, `null`, and `undefined` are falsy;
    /// everything else, reference values included, is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Object(_) | Value::Array(_) | Value::Function(_) | Value::Native(_) => true,
        }
    }

    /// Numeric coercion for arithmetic and mixed comparison.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(true) => 1.0,
            Value::Boolean(false) => 0.0,
            Value::Number(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Object(_) | Value::Array(_) | Value::Function(_) | Value::Native(_) => f64::NAN,
        }
    }

    /// The string a value prints as: strings unquoted, structural forms
    /// rendered with quoted inner strings and a depth cap.
    pub fn display_string(&self) -> String {
        render(self, MAX_RENDER_DEPTH, false)
    }

    /// Strict equality: same variant, same content for primitives, same
    /// identity for reference values. `NaN` is never equal to itself.
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => a == b,
            _ => false,
        }
    }

    /// Loose equality: `null == undefined`, numbers/booleans/strings
    /// compare numerically across variants, reference values by identity.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
            (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
            (Value::String(a), Value::String(b)) => a == b,
            (
                Value::Object(_) | Value::Array(_) | Value::Function(_) | Value::Native(_),
                Value::Object(_) | Value::Array(_) | Value::Function(_) | Value::Native(_),
            ) => self.strict_eq(other),
            (Value::Object(_) | Value::Array(_) | Value::Function(_) | Value::Native(_), _)
            | (_, Value::Object(_) | Value::Array(_) | Value::Function(_) | Value::Native(_)) => {
                false
            }
            _ => self.to_number() == other.to_number(),
        }
    }
}

fn render(value: &Value, depth: usize, nested: bool) -> String {
    match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => {
            if nested {
                format!("{s:?}")
            } else {
                s.clone()
            }
        }
        Value::Array(elements) => {
            if depth == 0 {
                return "[...]".to_string();
            }
            let inner: Vec<String> = elements
                .borrow()
                .iter()
                .map(|v| render(v, depth - 1, true))
                .collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Object(object) => {
            if depth == 0 {
                return "{...}".to_string();
            }
            let inner: Vec<String> = object
                .borrow()
                .entries()
                .iter()
                .map(|(k, v)| format!("{k}: {}", render(v, depth - 1, true)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
        Value::Function(function) => match &function.name {
            Some(name) => format!("[function {name}]"),
            None => "[function]".to_string(),
        },
        Value::Native(_) => "[function]".to_string(),
    }
}

// Derived Debug would recurse forever on cyclic structures; render with
// the same depth cap the display form uses.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", render(self, MAX_RENDER_DEPTH, true))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_eq(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn truthiness() {
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
        assert!(Value::String(" ".to_string()).is_truthy());
        assert!(Value::Array(Rc::new(RefCell::new(Vec::new()))).is_truthy());
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(Value::Null.to_number(), 0.0);
        assert_eq!(Value::Boolean(true).to_number(), 1.0);
        assert_eq!(Value::String(" 2.5 ".to_string()).to_number(), 2.5);
        assert!(Value::Undefined.to_number().is_nan());
        assert!(Value::String("abc".to_string()).to_number().is_nan());
        assert!(
            Value::Object(Rc::new(RefCell::new(Object::new())))
                .to_number()
                .is_nan()
        );
    }

    #[test]
    fn object_overwrite_keeps_insertion_position() {
        let mut object = Object::new();
        object.set("a", Value::Number(1.0));
        object.set("b", Value::Number(2.0));
        object.set("a", Value::Number(3.0));
        let keys: Vec<&str> = object.entries().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(object.get("a"), Some(Value::Number(3.0)));
    }

    #[test]
    fn equality_rules() {
        assert!(Value::Null.loose_eq(&Value::Undefined));
        assert!(!Value::Null.strict_eq(&Value::Undefined));
        assert!(Value::Number(1.0).loose_eq(&Value::Boolean(true)));
        assert!(Value::Number(1.0).loose_eq(&Value::String("1".to_string())));
        assert!(!Value::Number(f64::NAN).strict_eq(&Value::Number(f64::NAN)));
        assert!(!Value::Number(f64::NAN).loose_eq(&Value::Number(f64::NAN)));
        assert!(!Value::Number(0.0).loose_eq(&Value::Null));

        let a = Value::Array(Rc::new(RefCell::new(vec![Value::Number(1.0)])));
        let b = Value::Array(Rc::new(RefCell::new(vec![Value::Number(1.0)])));
        assert!(!a.strict_eq(&b));
        assert!(!a.loose_eq(&b));
        assert!(a.strict_eq(&a.clone()));
    }

    #[test]
    fn display_strings() {
        assert_eq!(Value::String("hi".to_string()).display_string(), "hi");
        let mut object = Object::new();
        object.set("s", Value::String("hi".to_string()));
        object.set(
            "xs",
            Value::Array(Rc::new(RefCell::new(vec![
                Value::Number(1.0),
                Value::Undefined,
            ]))),
        );
        let value = Value::Object(Rc::new(RefCell::new(object)));
        assert_eq!(value.display_string(), "{s: \"hi\", xs: [1, undefined]}");
    }

    #[test]
    fn cyclic_structures_render_finitely() {
        let array = Rc::new(RefCell::new(Vec::new()));
        array.borrow_mut().push(Value::Array(Rc::clone(&array)));
        let rendered = Value::Array(array).display_string();
        assert_eq!(rendered, "[[[[[...]]]]]");
    }
}
