//! The fixed, globally-addressable built-in functions. This table is
//! closed over the interpreter itself rather than a registry of boxed
//! closures, since `print`/`input` need the interpreter's I/O seam (see
//! the interpreter module) and everything else is a pure function of its
//! arguments — a plain `match` over the name is simpler than an
//! indirection layer here.

use std::collections::HashSet;
use std::io::{BufRead, Write};

use once_cell::sync::Lazy;

use crate::error::TourmalineError;
use crate::interpreter::Interpreter;
use crate::value::Value;

static NAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "print", "input", "len", "str", "int", "float", "type", "abs", "sqrt", "pow", "sin",
        "cos", "tan", "floor", "ceil", "round", "min", "max", "append", "insert", "remove",
        "pop", "clear",
    ]
    .into_iter()
    .collect()
});

pub fn is_builtin(name: &str) -> bool {
    NAMES.contains(name)
}

pub fn call(
    interp: &mut Interpreter,
    name: &str,
    args: Vec<Value>,
) -> Result<Value, TourmalineError> {
    match name {
        "print" => builtin_print(interp, &args),
        "input" => builtin_input(interp, &args),
        "len" => Ok(Value::Int(one_arg(name, &args)?.len()? as i64)),
        "str" => Ok(Value::text(one_arg(name, &args)?.to_display())),
        "int" => to_int(one_arg(name, &args)?),
        "float" => to_float(one_arg(name, &args)?),
        "type" => Ok(Value::text(one_arg(name, &args)?.type_name())),
        "abs" => builtin_abs(one_arg(name, &args)?),
        "sqrt" => Ok(Value::Float(one_arg(name, &args)?.as_f64()?.sqrt())),
        "pow" => builtin_pow(&args),
        "sin" => Ok(Value::Float(one_arg(name, &args)?.as_f64()?.sin())),
        "cos" => Ok(Value::Float(one_arg(name, &args)?.as_f64()?.cos())),
        "tan" => Ok(Value::Float(one_arg(name, &args)?.as_f64()?.tan())),
        "floor" => Ok(Value::Int(one_arg(name, &args)?.as_f64()?.floor() as i64)),
        "ceil" => Ok(Value::Int(one_arg(name, &args)?.as_f64()?.ceil() as i64)),
        "round" => Ok(Value::Int(one_arg(name, &args)?.as_f64()?.round() as i64)),
        "min" => builtin_min_max(&args, std::cmp::Ordering::Less),
        "max" => builtin_min_max(&args, std::cmp::Ordering::Greater),
        "append" => builtin_append(&args),
        "insert" => builtin_insert(&args),
        "remove" => builtin_remove(&args),
        "pop" => builtin_pop(&args),
        "clear" => builtin_clear(&args),
        _ => Err(TourmalineError::Name(format!(
            "'{name}' is not a built-in function"
        ))),
    }
}

fn one_arg<'a>(name: &str, args: &'a [Value]) -> Result<&'a Value, TourmalineError> {
    match args {
        [only] => Ok(only),
        _ => Err(TourmalineError::Type(format!(
            "{name}() expects exactly 1 argument, got {}",
            args.len()
        ))),
    }
}

fn builtin_print(interp: &mut Interpreter, args: &[Value]) -> Result<Value, TourmalineError> {
    let rendered: Vec<String> = args.iter().map(Value::to_display).collect();
    writeln!(interp.out(), "{}", rendered.join(" "))
        .map_err(|e| TourmalineError::Io(e.to_string()))?;
    Ok(Value::Nil)
}

fn builtin_input(interp: &mut Interpreter, args: &[Value]) -> Result<Value, TourmalineError> {
    if let Some(prompt) = args.first() {
        write!(interp.out(), "{}", prompt.to_display())
            .map_err(|e| TourmalineError::Io(e.to_string()))?;
        interp.out().flush().map_err(|e| TourmalineError::Io(e.to_string()))?;
    }
    let mut line = String::new();
    interp
        .input()
        .read_line(&mut line)
        .map_err(|e| TourmalineError::Io(e.to_string()))?;
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Value::text(line))
}

fn to_int(value: &Value) -> Result<Value, TourmalineError> {
    match value {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(f) => Ok(Value::Int(*f as i64)),
        Value::Bool(b) => Ok(Value::Int(if *b { 1 } else { 0 })),
        Value::Text(s) => {
            let parsed = if s.contains('.') {
                s.parse::<f64>().map(|f| f as i64)
            } else {
                s.parse::<i64>()
            };
            parsed.map(Value::Int).map_err(|_| {
                TourmalineError::Type(format!("cannot convert '{s}' to integer"))
            })
        }
        other => Err(TourmalineError::Type(format!(
            "cannot convert {} to integer",
            other.type_name()
        ))),
    }
}

fn to_float(value: &Value) -> Result<Value, TourmalineError> {
    match value {
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Text(s) => s
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| TourmalineError::Type(format!("cannot convert '{s}' to float"))),
        other => Err(TourmalineError::Type(format!(
            "cannot convert {} to float",
            other.type_name()
        ))),
    }
}

fn builtin_abs(value: &Value) -> Result<Value, TourmalineError> {
    match value {
        Value::Int(n) => Ok(Value::Int(n.abs())),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        other => Err(TourmalineError::Type(format!(
            "abs() requires a number, found {}",
            other.type_name()
        ))),
    }
}

fn builtin_pow(args: &[Value]) -> Result<Value, TourmalineError> {
    let [base, exp] = args else {
        return Err(TourmalineError::Type(format!(
            "pow() expects exactly 2 arguments, got {}",
            args.len()
        )));
    };
    if let (Value::Int(b), Value::Int(e)) = (base, exp) {
        if *e >= 0 {
            return Ok(Value::Int(b.pow(*e as u32)));
        }
    }
    Ok(Value::Float(base.as_f64()?.powf(exp.as_f64()?)))
}

fn builtin_min_max(
    args: &[Value],
    keep_if: std::cmp::Ordering,
) -> Result<Value, TourmalineError> {
    let owned;
    let candidates: &[Value] = match args {
        [Value::List(list)] => {
            owned = list.borrow().clone();
            &owned
        }
        many => many,
    };

    let mut iter = candidates.iter();
    let mut best = iter
        .next()
        .ok_or_else(|| TourmalineError::Type("min()/max() needs at least one value".into()))?
        .clone();
    for candidate in iter {
        if candidate.compare(&best)? == keep_if {
            best = candidate.clone();
        }
    }
    Ok(best)
}

fn builtin_append(args: &[Value]) -> Result<Value, TourmalineError> {
    let [list, item] = args else {
        return Err(TourmalineError::Type(
            "append() requires a list and an item".into(),
        ));
    };
    let list_ref = list.as_list()?;
    list_ref.borrow_mut().push(item.clone());
    Ok(Value::List(list_ref))
}

fn builtin_insert(args: &[Value]) -> Result<Value, TourmalineError> {
    let [list, index, item] = args else {
        return Err(TourmalineError::Type(
            "insert() requires a list, an index, and an item".into(),
        ));
    };
    let list_ref = list.as_list()?;
    let idx = index.as_int()?;
    let mut contents = list_ref.borrow_mut();
    let len = contents.len() as i64;
    let clamped = idx.max(0).min(len) as usize;
    contents.insert(clamped, item.clone());
    drop(contents);
    Ok(Value::List(list_ref))
}

fn builtin_remove(args: &[Value]) -> Result<Value, TourmalineError> {
    let [list, item] = args else {
        return Err(TourmalineError::Type(
            "remove() requires a list and an item".into(),
        ));
    };
    let list_ref = list.as_list()?;
    let position = list_ref.borrow().iter().position(|v| v == item);
    match position {
        Some(idx) => {
            list_ref.borrow_mut().remove(idx);
            Ok(Value::List(list_ref))
        }
        None => Err(TourmalineError::Index(format!(
            "item '{}' not found in list",
            item.to_display()
        ))),
    }
}

fn builtin_pop(args: &[Value]) -> Result<Value, TourmalineError> {
    let (list, index) = match args {
        [list] => (list, -1),
        [list, index] => (list, index.as_int()?),
        _ => {
            return Err(TourmalineError::Type(
                "pop() requires a list and an optional index".into(),
            ))
        }
    };
    let list_ref = list.as_list()?;
    let mut contents = list_ref.borrow_mut();
    if contents.is_empty() {
        return Err(TourmalineError::Index("cannot pop from empty list".into()));
    }
    let len = contents.len() as i64;
    let resolved = if index < 0 { index + len } else { index };
    if resolved < 0 || resolved >= len {
        return Err(TourmalineError::Index(format!(
            "pop index {index} out of range"
        )));
    }
    Ok(contents.remove(resolved as usize))
}

fn builtin_clear(args: &[Value]) -> Result<Value, TourmalineError> {
    let [list] = args else {
        return Err(TourmalineError::Type("clear() requires a list".into()));
    };
    let list_ref = list.as_list()?;
    list_ref.borrow_mut().clear();
    Ok(Value::List(list_ref))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;

    fn interp() -> Interpreter {
        Interpreter::with_buffers()
    }

    #[test]
    fn append_mutates_and_returns_the_same_list() {
        let list = Value::list(vec![Value::Int(1)]);
        let result = call(&mut interp(), "append", vec![list.clone(), Value::Int(2)]).unwrap();
        let Value::List(inner) = result else { panic!() };
        assert_eq!(inner.borrow().len(), 2);
        assert_eq!(inner.borrow()[1], Value::Int(2));
    }

    #[test]
    fn int_parses_text_with_decimal_point() {
        assert_eq!(to_int(&Value::text("3.9")).unwrap(), Value::Int(3));
    }

    #[test]
    fn min_and_max_accept_either_a_list_or_varargs() {
        let vals = vec![Value::Int(3), Value::Int(1), Value::Int(2)];
        assert_eq!(
            builtin_min_max(&vals, std::cmp::Ordering::Less).unwrap(),
            Value::Int(1)
        );
        let list = vec![Value::list(vals.clone())];
        assert_eq!(
            builtin_min_max(&list, std::cmp::Ordering::Greater).unwrap(),
            Value::Int(3)
        );
    }

    #[test]
    fn pop_defaults_to_the_last_element() {
        let list = Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let popped = builtin_pop(&[list.clone()]).unwrap();
        assert_eq!(popped, Value::Int(3));
    }
}
