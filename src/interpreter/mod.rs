pub mod env;
pub mod error;
pub mod value;

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, trace};

use crate::ast::{
    AssignOp, BinaryOp, Expr, LogicalOp, Program, Stmt, UnaryOp, declared_vars, format_number,
};

use env::{EnvRef, Environment};
use error::RuntimeError;
use value::{FunctionValue, NativeFunction, Object, Value};

/// Interpreted calls nest host stack frames, so recursion is cut off well
/// before the host stack runs out.
const MAX_CALL_DEPTH: usize = 200;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Fell through; carries the statement's value, if it produced one.
    Normal(Option<Value>),
    Return(Value),
    Break,
    Continue,
}

/// Either a variable binding or an object/array slot, resolved once so
/// compound assignment and increment evaluate their target only once.
enum Place {
    Var(String),
    Member { object: Value, key: String },
}

/// Tree-walking evaluator. Holds the global frame, so consecutive `run`
/// calls share top-level state.
pub struct Interpreter {
    globals: EnvRef,
    out: Rc<RefCell<dyn Write>>,
    depth: usize,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Rc::new(RefCell::new(io::stdout())))
    }

    /// Builds an interpreter writing script output to `out` instead of
    /// stdout.
    pub fn with_output(out: Rc<RefCell<dyn Write>>) -> Self {
        let globals = Environment::global();
        {
            let mut frame = globals.borrow_mut();
            frame.declare("log", Value::Native(NativeFunction::Log));
            let mut console = Object::new();
            console.set("log", Value::Native(NativeFunction::Log));
            console.set("error", Value::Native(NativeFunction::Log));
            frame.declare("console", Value::Object(Rc::new(RefCell::new(console))));
        }
        Self {
            globals,
            out,
            depth: 0,
        }
    }

    /// Executes a program and yields the value of its last value-producing
    /// statement, or `undefined` when there is none.
    pub fn run(&mut self, program: &Program) -> Result<Value, RuntimeError> {
        trace!(target: "runtime", "Running {} top-level statements", program.body.len());
        for name in declared_vars(&program.body) {
            let already_bound = self.globals.borrow().has_own(&name);
            if !already_bound {
                self.globals.borrow_mut().declare(&name, Value::Undefined);
            }
        }
        let globals = Rc::clone(&self.globals);
        let mut last = None;
        for stmt in &program.body {
            match self.execute(stmt, &globals)? {
                Completion::Normal(Some(value)) => last = Some(value),
                Completion::Normal(None) => {}
                Completion::Return(_) => {
                    return Err(RuntimeError::Type(
                        "return outside of a function".to_string(),
                    ));
                }
                Completion::Break => {
                    return Err(RuntimeError::Type("break outside of a loop".to_string()));
                }
                Completion::Continue => {
                    return Err(RuntimeError::Type("continue outside of a loop".to_string()));
                }
            }
        }
        Ok(last.unwrap_or(Value::Undefined))
    }

    fn execute(&mut self, stmt: &Stmt, env: &EnvRef) -> Result<Completion, RuntimeError> {
        match stmt {
            Stmt::Empty => Ok(Completion::Normal(None)),
            Stmt::Block(body) => {
                let mut last = None;
                for stmt in body {
                    match self.execute(stmt, env)? {
                        Completion::Normal(Some(value)) => last = Some(value),
                        Completion::Normal(None) => {}
                        abrupt => return Ok(abrupt),
                    }
                }
                Ok(Completion::Normal(last))
            }
            Stmt::VariableDecl(decls) => {
                // Hoisting already bound every name in the enclosing
                // function/program frame; this only runs initializers.
                for (name, init) in decls {
                    if let Some(init) = init {
                        let value = self.evaluate(init, env)?;
                        Environment::set(env, name, value)?;
                    }
                }
                Ok(Completion::Normal(None))
            }
            Stmt::Expression(expr) => {
                let value = self.evaluate(expr, env)?;
                Ok(Completion::Normal(Some(value)))
            }
            Stmt::If {
                condition,
                consequent,
                alternate,
            } => {
                if self.evaluate(condition, env)?.is_truthy() {
                    self.execute(consequent, env)
                } else if let Some(alternate) = alternate {
                    self.execute(alternate, env)
                } else {
                    Ok(Completion::Normal(None))
                }
            }
            Stmt::While { condition, body } => self.execute_loop(condition, body, env, false),
            Stmt::DoWhile { body, condition } => self.execute_loop(condition, body, env, true),
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::Undefined,
                };
                Ok(Completion::Return(value))
            }
            Stmt::Break => Ok(Completion::Break),
            Stmt::Continue => Ok(Completion::Continue),
        }
    }

    /// Shared loop driver; `test_after` selects do-while ordering, where
    /// the body runs before the first test.
    fn execute_loop(
        &mut self,
        condition: &Expr,
        body: &Stmt,
        env: &EnvRef,
        test_after: bool,
    ) -> Result<Completion, RuntimeError> {
        let mut last = None;
        let mut first = true;
        loop {
            let skip_test = first && test_after;
            first = false;
            if !skip_test && !self.evaluate(condition, env)?.is_truthy() {
                break;
            }
            match self.run_loop_body(body, env)? {
                LoopStep::Next(Some(value)) => last = Some(value),
                LoopStep::Next(None) => {}
                LoopStep::Exit => break,
                LoopStep::Return(value) => return Ok(Completion::Return(value)),
            }
        }
        Ok(Completion::Normal(last))
    }

    /// One loop iteration in a fresh frame chained to the loop's scope.
    fn run_loop_body(&mut self, body: &Stmt, env: &EnvRef) -> Result<LoopStep, RuntimeError> {
        let frame = Environment::child_of(env);
        match self.execute(body, &frame)? {
            Completion::Normal(value) => Ok(LoopStep::Next(value)),
            Completion::Continue => Ok(LoopStep::Next(None)),
            Completion::Break => Ok(LoopStep::Exit),
            Completion::Return(value) => Ok(LoopStep::Return(value)),
        }
    }

    fn evaluate(&mut self, expr: &Expr, env: &EnvRef) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::String(s) => Ok(Value::String(s.clone())),
            Expr::Boolean(b) => Ok(Value::Boolean(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Undefined => Ok(Value::Undefined),
            Expr::Identifier(name) => Environment::get(env, name),
            Expr::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.evaluate(element, env)?);
                }
                Ok(Value::Array(Rc::new(RefCell::new(values))))
            }
            Expr::Object(entries) => {
                let mut object = Object::new();
                for (key, value) in entries {
                    let value = self.evaluate(value, env)?;
                    // Duplicate keys overwrite in place, keeping the first
                    // occurrence's position.
                    object.set(key, value);
                }
                Ok(Value::Object(Rc::new(RefCell::new(object))))
            }
            Expr::Function { name, params, body } => {
                Ok(Value::Function(Rc::new(FunctionValue {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                    env: Rc::clone(env),
                })))
            }
            Expr::Unary { op, operand } => self.evaluate_unary(*op, operand, env),
            Expr::Binary { op, left, right } => {
                let left = self.evaluate(left, env)?;
                let right = self.evaluate(right, env)?;
                Ok(apply_binary(*op, &left, &right))
            }
            Expr::Logical { op, left, right } => {
                let left = self.evaluate(left, env)?;
                let short_circuits = match op {
                    LogicalOp::And => !left.is_truthy(),
                    LogicalOp::Or => left.is_truthy(),
                };
                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right, env)
                }
            }
            Expr::Conditional {
                condition,
                consequent,
                alternate,
            } => {
                if self.evaluate(condition, env)?.is_truthy() {
                    self.evaluate(consequent, env)
                } else {
                    self.evaluate(alternate, env)
                }
            }
            Expr::Assign { op, target, value } => {
                let place = self.resolve_place(target, env)?;
                let value = match assign_binary_op(*op) {
                    None => self.evaluate(value, env)?,
                    Some(binary) => {
                        let old = self.read_place(&place, env)?;
                        let rhs = self.evaluate(value, env)?;
                        apply_binary(binary, &old, &rhs)
                    }
                };
                self.write_place(&place, env, value.clone())?;
                Ok(value)
            }
            Expr::Sequence { left, right } => {
                self.evaluate(left, env)?;
                self.evaluate(right, env)
            }
            Expr::Call { callee, args } => {
                let callee = self.evaluate(callee, env)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.evaluate(arg, env)?);
                }
                self.call(callee, values)
            }
            Expr::Member { object, property } => {
                let object = self.evaluate(object, env)?;
                let key = self.evaluate(property, env)?;
                Ok(read_member(&object, &property_key(&key)))
            }
        }
    }

    fn evaluate_unary(
        &mut self,
        op: UnaryOp,
        operand: &Expr,
        env: &EnvRef,
    ) -> Result<Value, RuntimeError> {
        match op {
            UnaryOp::Not => Ok(Value::Boolean(!self.evaluate(operand, env)?.is_truthy())),
            UnaryOp::Negate => Ok(Value::Number(-self.evaluate(operand, env)?.to_number())),
            UnaryOp::Plus => Ok(Value::Number(self.evaluate(operand, env)?.to_number())),
            UnaryOp::PreIncrement
            | UnaryOp::PreDecrement
            | UnaryOp::PostIncrement
            | UnaryOp::PostDecrement => {
                let place = self.resolve_place(operand, env)?;
                let old = self.read_place(&place, env)?.to_number();
                let step = match op {
                    UnaryOp::PreIncrement | UnaryOp::PostIncrement => 1.0,
                    _ => -1.0,
                };
                let new = old + step;
                self.write_place(&place, env, Value::Number(new))?;
                let yielded = match op {
                    UnaryOp::PostIncrement | UnaryOp::PostDecrement => old,
                    _ => new,
                };
                Ok(Value::Number(yielded))
            }
        }
    }

    fn resolve_place(&mut self, target: &Expr, env: &EnvRef) -> Result<Place, RuntimeError> {
        match target {
            Expr::Identifier(name) => Ok(Place::Var(name.clone())),
            Expr::Member { object, property } => {
                let object = self.evaluate(object, env)?;
                let key = self.evaluate(property, env)?;
                Ok(Place::Member {
                    object,
                    key: property_key(&key),
                })
            }
            // The parser only produces identifiers and members here.
            _ => Err(RuntimeError::Type("invalid assignment target".to_string())),
        }
    }

    fn read_place(&self, place: &Place, env: &EnvRef) -> Result<Value, RuntimeError> {
        match place {
            Place::Var(name) => Environment::get(env, name),
            Place::Member { object, key } => Ok(read_member(object, key)),
        }
    }

    fn write_place(
        &mut self,
        place: &Place,
        env: &EnvRef,
        value: Value,
    ) -> Result<(), RuntimeError> {
        match place {
            Place::Var(name) => Environment::set(env, name, value),
            Place::Member { object, key } => write_member(object, key, value),
        }
    }

    fn call(&mut self, callee: Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
        match callee {
            Value::Function(ref function) => {
                if self.depth >= MAX_CALL_DEPTH {
                    debug!(target: "runtime", "Call depth limit hit at {}", self.depth);
                    return Err(RuntimeError::StackOverflow);
                }
                let frame = Environment::child_of(&function.env);
                {
                    let mut bindings = frame.borrow_mut();
                    // A named function expression can refer to itself.
                    if let Some(name) = &function.name {
                        bindings.declare(name, callee.clone());
                    }
                    // Missing arguments bind undefined, extras are dropped,
                    // duplicate parameter names keep the last binding.
                    for (i, param) in function.params.iter().enumerate() {
                        bindings.declare(param, args.get(i).cloned().unwrap_or(Value::Undefined));
                    }
                    for name in declared_vars(&function.body) {
                        if !bindings.has_own(&name) {
                            bindings.declare(&name, Value::Undefined);
                        }
                    }
                }
                self.depth += 1;
                let result = self.run_function_body(&function.body, &frame);
                self.depth -= 1;
                result
            }
            Value::Native(NativeFunction::Log) => {
                let line = args
                    .iter()
                    .map(Value::display_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                trace!(target: "runtime", "script output: {line}");
                // Script output failures are not observable from scripts.
                let _ = writeln!(self.out.borrow_mut(), "{line}");
                Ok(Value::Undefined)
            }
            other => Err(RuntimeError::Type(format!(
                "{} is not a function",
                other.type_name()
            ))),
        }
    }

    fn run_function_body(&mut self, body: &[Stmt], frame: &EnvRef) -> Result<Value, RuntimeError> {
        for stmt in body {
            match self.execute(stmt, frame)? {
                Completion::Normal(_) => {}
                Completion::Return(value) => return Ok(value),
                Completion::Break => {
                    return Err(RuntimeError::Type("break outside of a loop".to_string()));
                }
                Completion::Continue => {
                    return Err(RuntimeError::Type("continue outside of a loop".to_string()));
                }
            }
        }
        Ok(Value::Undefined)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

enum LoopStep {
    Next(Option<Value>),
    Exit,
    Return(Value),
}

fn assign_binary_op(op: AssignOp) -> Option<BinaryOp> {
    match op {
        AssignOp::Assign => None,
        AssignOp::AddAssign => Some(BinaryOp::Add),
        AssignOp::SubAssign => Some(BinaryOp::Subtract),
        AssignOp::MulAssign => Some(BinaryOp::Multiply),
        AssignOp::DivAssign => Some(BinaryOp::Divide),
        AssignOp::ModAssign => Some(BinaryOp::Modulo),
    }
}

fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => {
            if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
                Value::String(left.display_string() + &right.display_string())
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOp::Subtract => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Multiply => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Divide => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Modulo => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::LooseEqual => Value::Boolean(left.loose_eq(right)),
        BinaryOp::LooseNotEqual => Value::Boolean(!left.loose_eq(right)),
        BinaryOp::StrictEqual => Value::Boolean(left.strict_eq(right)),
        BinaryOp::StrictNotEqual => Value::Boolean(!left.strict_eq(right)),
        BinaryOp::LessThan
        | BinaryOp::LessThanEqual
        | BinaryOp::GreaterThan
        | BinaryOp::GreaterThanEqual => Value::Boolean(compare(op, left, right)),
    }
}

/// Relational comparison: both strings lexicographic, otherwise numeric.
/// Any comparison involving `NaN` is false.
fn compare(op: BinaryOp, left: &Value, right: &Value) -> bool {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return match op {
            BinaryOp::LessThan => a < b,
            BinaryOp::LessThanEqual => a <= b,
            BinaryOp::GreaterThan => a > b,
            BinaryOp::GreaterThanEqual => a >= b,
            _ => false,
        };
    }
    let (a, b) = (left.to_number(), right.to_number());
    match op {
        BinaryOp::LessThan => a < b,
        BinaryOp::LessThanEqual => a <= b,
        BinaryOp::GreaterThan => a > b,
        BinaryOp::GreaterThanEqual => a >= b,
        _ => false,
    }
}

/// String form a value takes when used as a property key.
fn property_key(value: &Value) -> String {
    match value {
        Value::Number(n) => format_number(*n),
        Value::String(s) => s.clone(),
        other => other.display_string(),
    }
}

/// Member reads never fail: anything without the member yields undefined.
fn read_member(object: &Value, key: &str) -> Value {
    match object {
        Value::Object(object) => object.borrow().get(key).unwrap_or(Value::Undefined),
        Value::Array(elements) => {
            if key == "length" {
                return Value::Number(elements.borrow().len() as f64);
            }
            match key.parse::<usize>() {
                Ok(index) => elements
                    .borrow()
                    .get(index)
                    .cloned()
                    .unwrap_or(Value::Undefined),
                Err(_) => Value::Undefined,
            }
        }
        Value::String(s) => {
            if key == "length" {
                return Value::Number(s.encode_utf16().count() as f64);
            }
            match key.parse::<usize>() {
                Ok(index) => match s.encode_utf16().nth(index) {
                    Some(unit) => Value::String(String::from_utf16_lossy(&[unit])),
                    None => Value::Undefined,
                },
                Err(_) => Value::Undefined,
            }
        }
        _ => Value::Undefined,
    }
}

/// Member writes are stricter than reads: only objects and arrays accept
/// them.
fn write_member(object: &Value, key: &str, value: Value) -> Result<(), RuntimeError> {
    match object {
        Value::Object(object) => {
            object.borrow_mut().set(key, value);
            Ok(())
        }
        Value::Array(elements) => {
            let index: usize = key.parse().map_err(|_| {
                RuntimeError::Type(format!("{key:?} is not a valid array index"))
            })?;
            let mut elements = elements.borrow_mut();
            // Writing past the end leaves undefined holes behind.
            if index >= elements.len() {
                elements.resize(index + 1, Value::Undefined);
            }
            elements[index] = value;
            Ok(())
        }
        other => Err(RuntimeError::Type(format!(
            "cannot assign a member on a {}",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn eval(source: &str) -> Result<Value, RuntimeError> {
        let program = parse(tokenize(source).expect("lexing failed")).expect("parsing failed");
        Interpreter::new().run(&program)
    }

    fn eval_ok(source: &str) -> Value {
        eval(source).expect("evaluation failed")
    }

    fn capture(source: &str) -> String {
        let out = Rc::new(RefCell::new(Vec::<u8>::new()));
        let mut interpreter = Interpreter::with_output(Rc::clone(&out) as Rc<RefCell<dyn Write>>);
        let program = parse(tokenize(source).expect("lexing failed")).expect("parsing failed");
        interpreter.run(&program).expect("evaluation failed");
        let bytes = out.borrow().clone();
        String::from_utf8(bytes).expect("output was not utf-8")
    }

    #[test]
    fn program_result_is_the_last_value_produced() {
        assert_eq!(eval_ok("1; 2; 3;"), Value::Number(3.0));
        assert_eq!(eval_ok("{ 7; ; }"), Value::Number(7.0));
        assert_eq!(eval_ok("var x = 1;"), Value::Undefined);
        assert_eq!(eval_ok("5; ;"), Value::Number(5.0));
    }

    #[test]
    fn arithmetic_and_concatenation() {
        assert_eq!(eval_ok("1 + 1;"), Value::Number(2.0));
        assert_eq!(eval_ok("\"a\" + 1;"), Value::String("a1".to_string()));
        assert_eq!(eval_ok("1 + \"a\";"), Value::String("1a".to_string()));
        assert_eq!(eval_ok("\"3\" * \"2\";"), Value::Number(6.0));
        assert_eq!(eval_ok("7 % 3;"), Value::Number(1.0));
        assert!(matches!(eval_ok("0 / 0;"), Value::Number(n) if n.is_nan()));
        assert_eq!(eval_ok("1 / 0;"), Value::Number(f64::INFINITY));
    }

    #[test]
    fn equality_and_comparison() {
        assert_eq!(eval_ok("1 + 1 === 2;"), Value::Boolean(true));
        assert_eq!(eval_ok("(0 / 0) === (0 / 0);"), Value::Boolean(false));
        assert_eq!(eval_ok("null == undefined;"), Value::Boolean(true));
        assert_eq!(eval_ok("null === undefined;"), Value::Boolean(false));
        assert_eq!(eval_ok("1 == true;"), Value::Boolean(true));
        assert_eq!(eval_ok("\"b\" > \"a\";"), Value::Boolean(true));
        assert_eq!(eval_ok("\"10\" < 9;"), Value::Boolean(false));
        assert_eq!(eval_ok("[] == [];"), Value::Boolean(false));
        assert_eq!(eval_ok("var a = []; var b = a; a == b;"), Value::Boolean(true));
    }

    #[test]
    fn logical_operators_yield_the_deciding_operand() {
        assert_eq!(eval_ok("0 || \"x\";"), Value::String("x".to_string()));
        assert_eq!(eval_ok("1 && 2;"), Value::Number(2.0));
        assert_eq!(eval_ok("false && missing;"), Value::Boolean(false));
        assert_eq!(eval_ok("true || missing;"), Value::Boolean(true));
    }

    #[test]
    fn conditional_evaluates_only_the_taken_branch() {
        assert_eq!(eval_ok("true ? 1 : missing;"), Value::Number(1.0));
        assert_eq!(eval_ok("false ? missing : 2;"), Value::Number(2.0));
    }

    #[test]
    fn comma_operator() {
        assert_eq!(eval_ok("var x = 0; (x = 1, x + 1);"), Value::Number(2.0));
    }

    #[test]
    fn increment_and_compound_assignment() {
        assert_eq!(eval_ok("var x = 1; x++;"), Value::Number(1.0));
        assert_eq!(eval_ok("var x = 1; x++; x;"), Value::Number(2.0));
        assert_eq!(eval_ok("var x = 1; ++x;"), Value::Number(2.0));
        assert_eq!(eval_ok("var x = 5; x -= 2; x *= 3; x;"), Value::Number(9.0));
        assert_eq!(
            eval_ok("var s = \"a\"; s += 1; s;"),
            Value::String("a1".to_string())
        );
        assert_eq!(
            eval_ok("var o = {n: 1}; o.n++; o.n;"),
            Value::Number(2.0)
        );
    }

    #[test]
    fn hoisting_binds_undefined_before_the_declaration_runs() {
        assert_eq!(eval_ok("var seen = x; var x = 1; seen;"), Value::Undefined);
        assert_eq!(
            eval_ok(
                "var f = function () { return typeofish(); };
                 var typeofish = function () { return inner; var inner = 3; };
                 f();"
            ),
            Value::Undefined
        );
    }

    #[test]
    fn assignment_to_an_undeclared_name_is_a_reference_error() {
        assert!(matches!(
            eval("ghost = 1;"),
            Err(RuntimeError::Reference(_))
        ));
        assert!(matches!(eval("ghost;"), Err(RuntimeError::Reference(_))));
    }

    #[test]
    fn shadowing_inside_functions() {
        assert_eq!(
            eval_ok(
                "var x = 1;
                 var f = function () { var x = 2; return x; };
                 f() + x;"
            ),
            Value::Number(3.0)
        );
    }

    #[test]
    fn closures_share_their_defining_frame() {
        assert_eq!(
            eval_ok(
                "var makeCounter = function () {
                     var n = 0;
                     return function () { n = n + 1; return n; };
                 };
                 var c = makeCounter();
                 c(); c(); c();"
            ),
            Value::Number(3.0)
        );
    }

    #[test]
    fn named_function_expressions_can_recurse() {
        assert_eq!(
            eval_ok(
                "var fib = function fib(n) {
                     if (n <= 1) return n;
                     return fib(n - 1) + fib(n - 2);
                 };
                 fib(10);"
            ),
            Value::Number(55.0)
        );
    }

    #[test]
    fn parameter_binding_rules() {
        assert_eq!(
            eval_ok("var f = function (a, b) { return b; }; f(1);"),
            Value::Undefined
        );
        assert_eq!(
            eval_ok("var f = function (a) { return a; }; f(1, 2, 3);"),
            Value::Number(1.0)
        );
        assert_eq!(
            eval_ok("var f = function (a, a) { return a; }; f(1, 2);"),
            Value::Number(2.0)
        );
    }

    #[test]
    fn while_and_do_while() {
        assert_eq!(
            eval_ok("var i = 0; var n = 0; while (i < 5) { i = i + 1; n = n + i; } n;"),
            Value::Number(15.0)
        );
        assert_eq!(
            eval_ok("var i = 10; do { i = i + 1; } while (false); i;"),
            Value::Number(11.0)
        );
    }

    #[test]
    fn break_and_continue() {
        assert_eq!(
            eval_ok(
                "var i = 0; var n = 0;
                 while (true) {
                     i = i + 1;
                     if (i > 10) break;
                     if (i % 2) continue;
                     n = n + i;
                 }
                 n;"
            ),
            Value::Number(30.0)
        );
    }

    #[test]
    fn control_signals_outside_their_context_are_errors() {
        assert!(matches!(eval("return 1;"), Err(RuntimeError::Type(_))));
        assert!(matches!(eval("break;"), Err(RuntimeError::Type(_))));
        assert!(matches!(eval("continue;"), Err(RuntimeError::Type(_))));
        assert!(matches!(
            eval("var f = function () { break; }; f();"),
            Err(RuntimeError::Type(_))
        ));
    }

    #[test]
    fn return_escapes_nested_loops() {
        assert_eq!(
            eval_ok(
                "var f = function () {
                     while (true) { while (true) { return 42; } }
                 };
                 f();"
            ),
            Value::Number(42.0)
        );
    }

    #[test]
    fn member_reads_never_fail() {
        assert_eq!(eval_ok("(1).foo;"), Value::Undefined);
        assert_eq!(eval_ok("true.x;"), Value::Undefined);
        assert_eq!(eval_ok("undefined.x;"), Value::Undefined);
        assert_eq!(eval_ok("({a: 1}).b;"), Value::Undefined);
        assert_eq!(eval_ok("\"abc\".length;"), Value::Number(3.0));
        assert_eq!(eval_ok("\"abc\"[1];"), Value::String("b".to_string()));
        assert_eq!(eval_ok("\"abc\"[9];"), Value::Undefined);
    }

    #[test]
    fn member_writes_on_primitives_are_type_errors() {
        assert!(matches!(eval("(1).x = 2;"), Err(RuntimeError::Type(_))));
        assert!(matches!(
            eval("\"s\"[0] = \"t\";"),
            Err(RuntimeError::Type(_))
        ));
    }

    #[test]
    fn object_literals_and_mutation() {
        assert_eq!(
            eval_ok("var o = {a: 1, b: 2}; o.a = 10; o[\"c\"] = 3; o.a + o.b + o.c;"),
            Value::Number(15.0)
        );
        // Duplicate keys: last value wins, first position kept.
        assert_eq!(
            eval_ok("var o = {a: 1, b: 2, a: 3}; o;").display_string(),
            "{a: 3, b: 2}"
        );
    }

    #[test]
    fn arrays_grow_with_undefined_holes() {
        assert_eq!(
            eval_ok("var a = [1, 2, 3]; a[5] = 9; a.length;"),
            Value::Number(6.0)
        );
        assert_eq!(eval_ok("var a = [1, 2, 3]; a[5] = 9; a[4];"), Value::Undefined);
        assert_eq!(eval_ok("var a = []; a.length;"), Value::Number(0.0));
        assert!(matches!(
            eval("var a = []; a[-1] = 0;"),
            Err(RuntimeError::Type(_))
        ));
        assert!(matches!(
            eval("var a = []; a.x = 0;"),
            Err(RuntimeError::Type(_))
        ));
    }

    #[test]
    fn calling_a_non_function_is_a_type_error() {
        let err = eval("var x = 3; x();").expect_err("expected a type error");
        assert_eq!(err, RuntimeError::Type("number is not a function".to_string()));
    }

    #[test]
    fn runaway_recursion_hits_the_depth_cap() {
        assert_eq!(
            eval("var f = function f() { return f(); }; f();"),
            Err(RuntimeError::StackOverflow)
        );
    }

    #[test]
    fn log_writes_space_separated_lines() {
        assert_eq!(capture("log(\"a\", 1, true, [1, \"x\"]);"), "a 1 true [1, \"x\"]\n");
        assert_eq!(capture("log();"), "\n");
        assert_eq!(
            capture("console.log(\"hi\"); console.error(\"oops\");"),
            "hi\noops\n"
        );
    }
}
