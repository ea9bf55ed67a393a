use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use parvus::{Engine, Value};

fn run(source: &str) -> (Value, String) {
    let out = Rc::new(RefCell::new(Vec::<u8>::new()));
    let mut engine = Engine::with_output(Rc::clone(&out) as Rc<RefCell<dyn Write>>);
    let value = engine.eval(source).expect("script failed");
    let bytes = out.borrow().clone();
    (value, String::from_utf8(bytes).expect("output was not utf-8"))
}

#[test]
fn primes_by_trial_division() {
    let (_, output) = run(r#"
        var found = [];
        var n = 2;
        while (found.length < 8) {
            var isPrime = true;
            var d = 2;
            while (d * d <= n) {
                if (n % d === 0) {
                    isPrime = false;
                    break;
                }
                d++;
            }
            if (isPrime) {
                found[found.length] = n;
            }
            n++;
        }
        log(found);
    "#);
    assert_eq!(output, "[2, 3, 5, 7, 11, 13, 17, 19]\n");
}

#[test]
fn fibonacci_closure_factory() {
    let (value, output) = run(r#"
        var fibgen = function () {
            var a = 0;
            var b = 1;
            return function () {
                var current = a;
                var next = a + b;
                a = b;
                b = next;
                return current;
            };
        };
        var fib = fibgen();
        var line = "";
        var i = 0;
        while (i < 8) {
            line += fib() + " ";
            i++;
        }
        log(line);

        // A second generator starts from scratch.
        var fresh = fibgen();
        fresh();
    "#);
    assert_eq!(output, "0 1 1 2 3 5 8 13 \n");
    assert_eq!(value, Value::Number(0.0));
}

#[test]
fn two_closures_share_one_frame() {
    let (value, _) = run(r#"
        var makePair = function () {
            var n = 0;
            return {
                bump: function () { n++; return n; },
                read: function () { return n; }
            };
        };
        var pair = makePair();
        pair.bump();
        pair.bump();
        pair.read();
    "#);
    assert_eq!(value, Value::Number(2.0));
}

#[test]
fn object_mutation_and_display() {
    let (_, output) = run(r#"
        var point = {a: 1, b: 2};
        point.a = 10;
        point.c = point.a + point.b;
        log(point);
        log("sum:", point.a + point.b + point.c);
    "#);
    assert_eq!(output, "{a: 10, b: 2, c: 12}\nsum: 24\n");
}

#[test]
fn sparse_array_has_undefined_holes() {
    let (_, output) = run(r#"
        var arr = [1, 2, 3];
        arr[5] = 9;
        log(arr.length, arr[3], arr[4], arr[5]);
        log(arr);
    "#);
    assert_eq!(
        output,
        "6 undefined undefined 9\n[1, 2, 3, undefined, undefined, 9]\n"
    );
}

#[test]
fn do_while_and_compound_assignment() {
    let (value, _) = run(r#"
        var total = 0;
        var i = 1;
        do {
            total += i;
            i++;
        } while (i <= 10);
        total;
    "#);
    assert_eq!(value, Value::Number(55.0));
}

#[test]
fn string_building_with_coercion() {
    let (_, output) = run(r#"
        var tags = ["b", "i"];
        var open = "<" + tags[0] + ">";
        log(open + 1 + true + null + undefined);
        log("len:", "héllo".length);
    "#);
    assert_eq!(output, "<b>1truenullundefined\nlen: 5\n");
}

#[test]
fn deep_recursion_stays_within_the_cap() {
    let (value, _) = run(r#"
        var countdown = function countdown(n) {
            if (n === 0) return "done";
            return countdown(n - 1);
        };
        countdown(150);
    "#);
    assert_eq!(value, Value::String("done".to_string()));
}

#[test]
fn failures_report_through_the_engine_error() {
    let mut engine = Engine::new();
    let err = engine
        .eval("var f = function () { return obj.x; }; var obj = null; f(); missing;")
        .expect_err("expected a reference error");
    assert_eq!(
        err.to_string(),
        "runtime error: ReferenceError: missing is not declared"
    );
}
