use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::error::RuntimeError;
use super::value::Value;

/// Shared handle to a frame. Closures hold one of these to their defining
/// frame, so bindings mutated after capture stay visible.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One frame in the scope chain: identifier bindings plus an optional link
/// to the enclosing frame.
#[derive(Debug)]
pub struct Environment {
    bindings: HashMap<String, Value>,
    parent: Option<EnvRef>,
}

impl Environment {
    pub fn global() -> EnvRef {
        Rc::new(RefCell::new(Environment {
            bindings: HashMap::new(),
            parent: None,
        }))
    }

    pub fn child_of(parent: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            bindings: HashMap::new(),
            parent: Some(Rc::clone(parent)),
        }))
    }

    /// Binds `name` in this frame, shadowing any outer binding.
    pub fn declare(&mut self, name: &str, value: Value) {
        self.bindings.insert(name.to_string(), value);
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Reads `name`, walking the chain outward.
    pub fn get(env: &EnvRef, name: &str) -> Result<Value, RuntimeError> {
        let mut frame = Rc::clone(env);
        loop {
            if let Some(value) = frame.borrow().bindings.get(name) {
                return Ok(value.clone());
            }
            let parent = frame.borrow().parent.clone();
            match parent {
                Some(parent) => frame = parent,
                None => {
                    return Err(RuntimeError::Reference(format!("{name} is not declared")));
                }
            }
        }
    }

    /// Writes through the nearest existing binding. Assigning a name that
    /// was never declared is an error; there are no implicit globals.
    pub fn set(env: &EnvRef, name: &str, value: Value) -> Result<(), RuntimeError> {
        let mut frame = Rc::clone(env);
        loop {
            if frame.borrow().has_own(name) {
                frame.borrow_mut().declare(name, value);
                return Ok(());
            }
            let parent = frame.borrow().parent.clone();
            match parent {
                Some(parent) => frame = parent,
                None => {
                    return Err(RuntimeError::Reference(format!("{name} is not declared")));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn get_walks_the_chain() {
        let global = Environment::global();
        global.borrow_mut().declare("x", Value::Number(1.0));
        let inner = Environment::child_of(&global);
        assert_eq!(Environment::get(&inner, "x"), Ok(Value::Number(1.0)));
    }

    #[test]
    fn declare_shadows_without_touching_the_outer_binding() {
        let global = Environment::global();
        global.borrow_mut().declare("x", Value::Number(1.0));
        let inner = Environment::child_of(&global);
        inner.borrow_mut().declare("x", Value::Number(2.0));
        assert_eq!(Environment::get(&inner, "x"), Ok(Value::Number(2.0)));
        assert_eq!(Environment::get(&global, "x"), Ok(Value::Number(1.0)));
    }

    #[test]
    fn set_mutates_the_nearest_binding() {
        let global = Environment::global();
        global.borrow_mut().declare("x", Value::Number(1.0));
        let inner = Environment::child_of(&global);
        Environment::set(&inner, "x", Value::Number(5.0)).expect("set failed");
        assert_eq!(Environment::get(&global, "x"), Ok(Value::Number(5.0)));
    }

    #[test]
    fn undeclared_names_are_reference_errors() {
        let global = Environment::global();
        assert!(matches!(
            Environment::get(&global, "missing"),
            Err(RuntimeError::Reference(_))
        ));
        assert!(matches!(
            Environment::set(&global, "missing", Value::Null),
            Err(RuntimeError::Reference(_))
        ));
    }

    #[test]
    fn sibling_frames_share_a_captured_parent() {
        let global = Environment::global();
        global.borrow_mut().declare("n", Value::Number(0.0));
        let a = Environment::child_of(&global);
        let b = Environment::child_of(&global);
        Environment::set(&a, "n", Value::Number(3.0)).expect("set failed");
        assert_eq!(Environment::get(&b, "n"), Ok(Value::Number(3.0)));
    }
}
