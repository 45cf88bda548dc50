//! End-to-end scenarios driven through [`Interpreter::with_capture`]
//! rather than shelling out to a compiled binary — there is no
//! `test-utils`-style `Command::new(...)` path available here, since the
//! interpreter has no separate build artifact to invoke; constructing it
//! directly and reading back its capture buffer plays the same role.

use std::cell::RefCell;
use std::rc::Rc;

use tourmaline::value::Value;
use tourmaline::Interpreter;

fn run(source: &str) -> (Interpreter, String) {
    let sink = Rc::new(RefCell::new(Vec::new()));
    let mut interp = Interpreter::with_capture(sink.clone(), "");
    interp.run_source(source).expect("program should run without error");
    let output = String::from_utf8(sink.borrow().clone()).unwrap();
    (interp, output)
}

#[test]
fn arithmetic_precedence() {
    let (interp, _) = run("let x = 2 + 3 * 4");
    assert_eq!(interp.env.get("x"), Some(&Value::Int(14)));
}

#[test]
fn string_concatenation_and_print() {
    let (_, output) = run(r#"print("hello " + "world")"#);
    assert_eq!(output, "hello world\n");
}

#[test]
fn user_function_does_not_leak_its_locals_into_the_caller() {
    let (interp, _) = run(
        "function add(a, b)\n\
         let total = a + b\n\
         return total\n\
         end\n\
         let sum = add(2, 3)",
    );
    assert_eq!(interp.env.get("sum"), Some(&Value::Int(5)));
    assert_eq!(interp.env.get("total"), None);
    assert_eq!(interp.env.get("a"), None);
}

#[test]
fn import_random_and_call_a_deterministic_degenerate_range() {
    let (interp, _) = run(
        "import random\n\
         let n = random.randint(1, 1)",
    );
    assert_eq!(interp.env.get("n"), Some(&Value::Int(1)));
}

#[test]
fn try_except_catches_a_conversion_error() {
    let (interp, _) = run(
        "let ok = true\n\
         try\n\
         let y = int(\"not a number\")\n\
         except e\n\
         let ok = false\n\
         end",
    );
    assert_eq!(interp.env.get("ok"), Some(&Value::Bool(false)));
}

#[test]
fn while_loop_counts_to_three() {
    let (interp, _) = run(
        "let i = 0\n\
         while i < 3\n\
         i += 1\n\
         end",
    );
    assert_eq!(interp.env.get("i"), Some(&Value::Int(3)));
}

#[test]
fn append_mutates_the_shared_list_and_len_reflects_it() {
    let (interp, _) = run(
        "let items = []\n\
         append(items, 1)\n\
         append(items, 2)\n\
         let count = len(items)",
    );
    assert_eq!(interp.env.get("count"), Some(&Value::Int(2)));
}

#[test]
fn empty_list_is_falsy_and_a_for_loop_over_it_never_runs() {
    let (interp, _) = run(
        "let hits = 0\n\
         for item in []\n\
         hits += 1\n\
         end",
    );
    assert_eq!(interp.env.get("hits"), Some(&Value::Int(0)));
}

#[test]
fn nested_if_inside_a_function_still_restores_the_caller_scope_on_return() {
    let (interp, _) = run(
        "function classify(n)\n\
         if n < 0\n\
         return \"negative\"\n\
         else\n\
         return \"non-negative\"\n\
         end\n\
         end\n\
         let label = classify(-5)",
    );
    assert_eq!(interp.env.get("label"), Some(&Value::text("negative")));
    assert_eq!(interp.env.get("n"), None);
}

#[test]
fn or_short_circuits_which_value_wins_but_both_sides_are_already_resolved() {
    // Calls are spliced into the token stream by the resolver in one
    // left-to-right pass *before* `or`/`and` ever get evaluated, so a call
    // on the losing side of a short-circuit still runs — only the choice
    // of which already-computed value becomes the result is short-circuited.
    let (interp, _) = run(
        "let log = []\n\
         function mark(l)\n\
         append(l, 1)\n\
         return true\n\
         end\n\
         let result = true or mark(log)",
    );
    assert_eq!(interp.env.get("result"), Some(&Value::Bool(true)));
    let Some(Value::List(log)) = interp.env.get("log") else {
        panic!("expected log to be bound to a list")
    };
    assert_eq!(log.borrow().len(), 1, "mark() still runs despite losing the 'or'");
}
