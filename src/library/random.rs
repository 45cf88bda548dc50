//! The `random` library, the only one populated at interpreter
//! construction. Wraps the `rand` crate for a Python-compatible `random`
//! module surface.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::TourmalineError;
use crate::value::Value;

use super::LibraryFn;

pub fn members() -> Vec<(&'static str, LibraryFn)> {
    vec![
        ("randint", randint),
        ("random", random),
        ("choice", choice),
        ("shuffle", shuffle),
        ("uniform", uniform),
        ("randrange", randrange),
    ]
}

fn arity_error(name: &str, expected: &str, got: usize) -> TourmalineError {
    TourmalineError::Type(format!(
        "random.{name}() expects {expected}, got {got} argument(s)"
    ))
}

fn randint(args: &[Value]) -> Result<Value, TourmalineError> {
    let [a, b] = args else {
        return Err(arity_error("randint", "2 arguments", args.len()));
    };
    let (a, b) = (a.as_int()?, b.as_int()?);
    Ok(Value::Int(rand::thread_rng().gen_range(a..=b)))
}

fn random(args: &[Value]) -> Result<Value, TourmalineError> {
    if !args.is_empty() {
        return Err(arity_error("random", "no arguments", args.len()));
    }
    Ok(Value::Float(rand::thread_rng().gen_range(0.0..1.0)))
}

fn choice(args: &[Value]) -> Result<Value, TourmalineError> {
    let [list] = args else {
        return Err(arity_error("choice", "1 argument", args.len()));
    };
    let list = list.as_list()?;
    let list = list.borrow();
    list.choose(&mut rand::thread_rng())
        .cloned()
        .ok_or_else(|| TourmalineError::Index("choice() called on an empty list".into()))
}

fn shuffle(args: &[Value]) -> Result<Value, TourmalineError> {
    let [list] = args else {
        return Err(arity_error("shuffle", "1 argument", args.len()));
    };
    let list_ref = list.as_list()?;
    list_ref.borrow_mut().shuffle(&mut rand::thread_rng());
    Ok(Value::List(list_ref))
}

fn uniform(args: &[Value]) -> Result<Value, TourmalineError> {
    let [a, b] = args else {
        return Err(arity_error("uniform", "2 arguments", args.len()));
    };
    let (a, b) = (a.as_f64()?, b.as_f64()?);
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if lo == hi {
        return Ok(Value::Float(lo));
    }
    Ok(Value::Float(rand::thread_rng().gen_range(lo..hi)))
}

fn randrange(args: &[Value]) -> Result<Value, TourmalineError> {
    let (start, stop, step) = match args {
        [stop] => (0, stop.as_int()?, 1),
        [start, stop] => (start.as_int()?, stop.as_int()?, 1),
        [start, stop, step] => (start.as_int()?, stop.as_int()?, step.as_int()?),
        _ => return Err(arity_error("randrange", "1 to 3 arguments", args.len())),
    };
    if step == 0 {
        return Err(TourmalineError::Arithmetic(
            "randrange() step argument must not be zero".into(),
        ));
    }
    let count = if step > 0 {
        (stop - start + step - 1) / step
    } else {
        (start - stop - step - 1) / -step
    };
    if count <= 0 {
        return Err(TourmalineError::Arithmetic(
            "randrange() produced an empty range".into(),
        ));
    }
    let n = rand::thread_rng().gen_range(0..count);
    Ok(Value::Int(start + n * step))
}
