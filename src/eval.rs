//! The expression evaluator (component E). Runs the call resolver once
//! over a token slice, then evaluates the resolved stream with a
//! right-to-left scan per precedence level — at each level the *rightmost*
//! depth-0 operator is split on first, which is what makes a flat
//! left-to-right token scan produce left-associative results without a
//! pre-built tree (`a - b - c` finds the rightmost `-`, recurses on
//! `a - b`, giving `(a - b) - c`).

use crate::error::TourmalineError;
use crate::interpreter::Interpreter;
use crate::lexer;
use crate::literal;
use crate::resolver;
use crate::scan::find_matching_close;
use crate::value::Value;

/// Precedence levels, lowest first. `or`/`and` pick which already-resolved
/// operand becomes the result without evaluating the other side again —
/// but any call on the losing side has *already* run, since the resolver
/// splices every call in the expression before this function ever sees
/// it. They are handled separately from the generic binary apply below
/// only for that value-selection behaviour, not true short-circuiting.
const LEVEL_OR: &[&str] = &["or"];
const LEVEL_AND: &[&str] = &["and"];
const LEVEL_COMPARISON: &[&str] = &["==", "!=", "<", ">", "<=", ">="];
const LEVEL_ADDITIVE: &[&str] = &["+", "-"];
const LEVEL_MULTIPLICATIVE: &[&str] = &["*", "/", "%"];

const ALL_OPERATORS: &[&str] = &[
    "or", "and", "==", "!=", "<", ">", "<=", ">=", "+", "-", "*", "/", "%",
];

/// Evaluate a token slice: resolve calls, then evaluate the result.
/// Called for every standalone expression slice — a statement's
/// right-hand side, a call argument, a list/map literal element — each of
/// which needs its own resolver pass, since none of those slices were
/// visited by an outer resolver scan.
pub fn evaluate(interp: &mut Interpreter, tokens: &[String]) -> Result<Value, TourmalineError> {
    let resolved = resolver::resolve(interp, tokens)?;
    evaluate_resolved(interp, &resolved)
}

/// Like [`evaluate`], but first clears the interpreter's call-result
/// placeholder table — called once per top-level statement so a
/// placeholder from an earlier statement can never leak into this one.
pub fn evaluate_top(interp: &mut Interpreter, tokens: &[String]) -> Result<Value, TourmalineError> {
    interp.clear_placeholders();
    evaluate(interp, tokens)
}

/// Evaluate an already-resolved token slice. Sub-expressions found while
/// descending (parenthesised groups, binary operands, index expressions)
/// are already covered by the one resolver pass above, so they recurse
/// here directly rather than back through [`evaluate`].
fn evaluate_resolved(interp: &mut Interpreter, tokens: &[String]) -> Result<Value, TourmalineError> {
    if tokens.is_empty() {
        return Err(TourmalineError::Parse("expected an expression".into()));
    }

    if let Some(inner) = strip_redundant_parens(tokens)? {
        return evaluate_resolved(interp, inner);
    }

    if let Some(k) = rightmost_operator(tokens, LEVEL_OR, false) {
        let left = evaluate_resolved(interp, &tokens[..k])?;
        if left.is_truthy() {
            return Ok(left);
        }
        return evaluate_resolved(interp, &tokens[k + 1..]);
    }

    if let Some(k) = rightmost_operator(tokens, LEVEL_AND, false) {
        let left = evaluate_resolved(interp, &tokens[..k])?;
        if !left.is_truthy() {
            return Ok(left);
        }
        return evaluate_resolved(interp, &tokens[k + 1..]);
    }

    if let Some(k) = rightmost_operator(tokens, LEVEL_COMPARISON, false) {
        let left = evaluate_resolved(interp, &tokens[..k])?;
        let right = evaluate_resolved(interp, &tokens[k + 1..])?;
        return apply_comparison(&tokens[k], left, right);
    }

    if let Some(k) = rightmost_operator(tokens, LEVEL_ADDITIVE, true) {
        let left = evaluate_resolved(interp, &tokens[..k])?;
        let right = evaluate_resolved(interp, &tokens[k + 1..])?;
        return apply_arith(&tokens[k], left, right);
    }

    if let Some(k) = rightmost_operator(tokens, LEVEL_MULTIPLICATIVE, false) {
        let left = evaluate_resolved(interp, &tokens[..k])?;
        let right = evaluate_resolved(interp, &tokens[k + 1..])?;
        return apply_arith(&tokens[k], left, right);
    }

    evaluate_postfix_or_atom(interp, tokens)
}

/// `(` ... `)` spanning the whole slice gets stripped before any operator
/// search, so `(a + b) * c` isn't mistaken for two separate expressions.
fn strip_redundant_parens(tokens: &[String]) -> Result<Option<&[String]>, TourmalineError> {
    if tokens.first().map(String::as_str) != Some("(") {
        return Ok(None);
    }
    let close = find_matching_close(tokens, 0)?;
    if close == tokens.len() - 1 {
        Ok(Some(&tokens[1..close]))
    } else {
        Ok(None)
    }
}

/// True if `tokens[k]` is being used as a unary sign rather than a binary
/// operator: at the very start of the slice, or immediately after another
/// operator / opening bracket / separator.
fn is_unary_context(tokens: &[String], k: usize) -> bool {
    if k == 0 {
        return true;
    }
    let prev = tokens[k - 1].as_str();
    prev == "(" || prev == "[" || prev == "{" || prev == "," || prev == ":" || ALL_OPERATORS.contains(&prev)
}

fn rightmost_operator(tokens: &[String], ops: &[&str], skip_unary: bool) -> Option<usize> {
    let mut depth = 0i32;
    for i in (0..tokens.len()).rev() {
        match tokens[i].as_str() {
            ")" | "]" | "}" => depth += 1,
            "(" | "[" | "{" => depth -= 1,
            t if depth == 0 && ops.contains(&t) => {
                if skip_unary && is_unary_context(tokens, i) {
                    continue;
                }
                return Some(i);
            }
            _ => {}
        }
    }
    None
}

fn apply_comparison(op: &str, left: Value, right: Value) -> Result<Value, TourmalineError> {
    let result = match op {
        "==" => left == right,
        "!=" => left != right,
        "<" => left.compare(&right)?.is_lt(),
        ">" => left.compare(&right)?.is_gt(),
        "<=" => left.compare(&right)?.is_le(),
        ">=" => left.compare(&right)?.is_ge(),
        _ => unreachable!("not a comparison operator: {op}"),
    };
    Ok(Value::Bool(result))
}

/// Shared by the evaluator's `+ - * / %` level and the statement
/// executor's compound assignment (`i += 1`).
pub fn apply_arith(op: &str, left: Value, right: Value) -> Result<Value, TourmalineError> {
    match op {
        "+" => add(left, right),
        "-" => numeric_op(left, right, |a, b| a - b, |a, b| a - b),
        "*" => numeric_op(left, right, |a, b| a * b, |a, b| a * b),
        "/" => {
            let a = left.as_f64()?;
            let b = right.as_f64()?;
            if b == 0.0 {
                return Err(TourmalineError::Arithmetic("division by zero".into()));
            }
            Ok(Value::Float(a / b))
        }
        "%" => modulo(left, right),
        _ => Err(TourmalineError::Parse(format!("unknown operator '{op}'"))),
    }
}

fn add(left: Value, right: Value) -> Result<Value, TourmalineError> {
    if let (Value::Text(a), Value::Text(b)) = (&left, &right) {
        return Ok(Value::text(format!("{a}{b}")));
    }
    numeric_op(left, right, |a, b| a + b, |a, b| a + b)
}

fn modulo(left: Value, right: Value) -> Result<Value, TourmalineError> {
    if let (Value::Int(a), Value::Int(b)) = (&left, &right) {
        if *b == 0 {
            return Err(TourmalineError::Arithmetic("modulo by zero".into()));
        }
        return Ok(Value::Int(a % b));
    }
    let a = left.as_f64()?;
    let b = right.as_f64()?;
    if b == 0.0 {
        return Err(TourmalineError::Arithmetic("modulo by zero".into()));
    }
    Ok(Value::Float(a % b))
}

/// `Int op Int` stays an `Int`; any `Float` operand contaminates the
/// result to `Float`.
fn numeric_op(
    left: Value,
    right: Value,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, TourmalineError> {
    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(*a, *b))),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            Ok(Value::Float(float_op(left.as_f64()?, right.as_f64()?)))
        }
        _ => Err(TourmalineError::Type(format!(
            "unsupported operand types: {} and {}",
            left.type_name(),
            right.type_name()
        ))),
    }
}

/// Parse a leading primary (parenthesised group, literal, or single
/// token) then fold any trailing `.name` / `[index]` postfix chain onto
/// it, left-to-right (`a.b.c`, `a[0][1]`).
fn evaluate_postfix_or_atom(interp: &mut Interpreter, tokens: &[String]) -> Result<Value, TourmalineError> {
    match tokens[0].as_str() {
        "-" => return negate(evaluate_postfix_or_atom(interp, &tokens[1..])?),
        "+" => return evaluate_postfix_or_atom(interp, &tokens[1..]),
        _ => {}
    }

    let (mut value, mut pos) = parse_primary(interp, tokens, 0)?;
    while pos < tokens.len() {
        match tokens[pos].as_str() {
            "." => {
                let key = tokens.get(pos + 1).ok_or_else(|| {
                    TourmalineError::Parse("expected a name after '.'".into())
                })?;
                value = member_access(&value, key)?;
                pos += 2;
            }
            "[" => {
                let close = find_matching_close(tokens, pos)?;
                let index = evaluate_resolved(interp, &tokens[pos + 1..close])?;
                value = index_into(&value, &index)?;
                pos = close + 1;
            }
            other => {
                return Err(TourmalineError::Parse(format!(
                    "unexpected token '{other}' after expression"
                )))
            }
        }
    }
    Ok(value)
}

fn parse_primary(
    interp: &mut Interpreter,
    tokens: &[String],
    pos: usize,
) -> Result<(Value, usize), TourmalineError> {
    match tokens[pos].as_str() {
        "(" => {
            let close = find_matching_close(tokens, pos)?;
            let value = evaluate_resolved(interp, &tokens[pos + 1..close])?;
            Ok((value, close + 1))
        }
        "[" => {
            let close = find_matching_close(tokens, pos)?;
            let value = literal::parse_list(interp, &tokens[pos..=close])?;
            Ok((value, close + 1))
        }
        "{" => {
            let close = find_matching_close(tokens, pos)?;
            let value = literal::parse_map(interp, &tokens[pos..=close])?;
            Ok((value, close + 1))
        }
        _ => {
            let value = evaluate_single_token(interp, &tokens[pos])?;
            Ok((value, pos + 1))
        }
    }
}

fn evaluate_single_token(interp: &mut Interpreter, token: &str) -> Result<Value, TourmalineError> {
    if lexer::is_string_literal(token) {
        return Ok(Value::text(lexer::unquote(token)));
    }
    match token {
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        "nil" => return Ok(Value::Nil),
        _ => {}
    }
    if let Ok(n) = token.parse::<i64>() {
        return Ok(Value::Int(n));
    }
    if let Ok(f) = token.parse::<f64>() {
        return Ok(Value::Float(f));
    }
    if let Some(value) = interp.placeholder(token) {
        return Ok(value);
    }
    if let Some(value) = interp.env.get(token) {
        return Ok(value.clone());
    }
    if interp.functions.contains_key(token) || crate::builtins::is_builtin(token) {
        return Ok(Value::CallableName(token.into()));
    }
    Err(TourmalineError::Name(format!(
        "'{token}' is not defined"
    )))
}

fn negate(value: Value) -> Result<Value, TourmalineError> {
    match value {
        Value::Int(n) => Ok(Value::Int(-n)),
        Value::Float(f) => Ok(Value::Float(-f)),
        other => Err(TourmalineError::Type(format!(
            "cannot negate {}",
            other.type_name()
        ))),
    }
}

fn member_access(value: &Value, key: &str) -> Result<Value, TourmalineError> {
    if let Value::Text(name) = value {
        if let Some(library) = crate::library::lookup(name) {
            return if library.has_member(key) {
                Ok(Value::CallableName(format!("{name}.{key}").into()))
            } else {
                Err(TourmalineError::Name(format!(
                    "'{name}' has no member '{key}'"
                )))
            };
        }
    }
    let map = value.as_map()?;
    map.borrow()
        .get(key)
        .cloned()
        .ok_or_else(|| TourmalineError::Index(format!("key '{key}' not found")))
}

fn index_into(base: &Value, index: &Value) -> Result<Value, TourmalineError> {
    match base {
        Value::List(list) => {
            let list = list.borrow();
            let idx = resolve_index(index.as_int()?, list.len())?;
            Ok(list[idx].clone())
        }
        Value::Text(s) => {
            let chars: Vec<char> = s.chars().collect();
            let idx = resolve_index(index.as_int()?, chars.len())?;
            Ok(Value::text(chars[idx].to_string()))
        }
        Value::Map(map) => {
            let key = index.to_canonical_text();
            map.borrow()
                .get(&key)
                .cloned()
                .ok_or_else(|| TourmalineError::Index(format!("key '{key}' not found")))
        }
        other => Err(TourmalineError::Type(format!(
            "cannot index into {}",
            other.type_name()
        ))),
    }
}

fn resolve_index(idx: i64, len: usize) -> Result<usize, TourmalineError> {
    let resolved = if idx < 0 { idx + len as i64 } else { idx };
    if resolved < 0 || resolved as usize >= len {
        return Err(TourmalineError::Index(format!(
            "index {idx} out of range for length {len}"
        )));
    }
    Ok(resolved as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;
    use crate::lexer::lex;

    fn eval_str(interp: &mut Interpreter, src: &str) -> Value {
        evaluate_top(interp, &lex(src).unwrap()).unwrap()
    }

    #[test]
    fn left_associative_subtraction() {
        let mut interp = Interpreter::with_buffers();
        assert_eq!(eval_str(&mut interp, "10 - 2 - 3"), Value::Int(5));
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let mut interp = Interpreter::with_buffers();
        assert_eq!(eval_str(&mut interp, "2 + 3 * 4"), Value::Int(14));
    }

    #[test]
    fn division_always_produces_a_float() {
        let mut interp = Interpreter::with_buffers();
        assert_eq!(eval_str(&mut interp, "4 / 2"), Value::Float(2.0));
    }

    #[test]
    fn or_short_circuits_and_returns_first_truthy_operand() {
        let mut interp = Interpreter::with_buffers();
        assert_eq!(eval_str(&mut interp, "0 or 5"), Value::Int(5));
        assert_eq!(eval_str(&mut interp, "3 or (1 / 0)"), Value::Int(3));
    }

    #[test]
    fn and_short_circuits_on_first_falsy_operand() {
        let mut interp = Interpreter::with_buffers();
        assert_eq!(eval_str(&mut interp, "0 and (1 / 0)"), Value::Int(0));
    }

    #[test]
    fn unary_minus_binds_to_the_immediate_operand() {
        let mut interp = Interpreter::with_buffers();
        assert_eq!(eval_str(&mut interp, "3 * -2"), Value::Int(-6));
        assert_eq!(eval_str(&mut interp, "-2 + 3"), Value::Int(1));
    }

    #[test]
    fn parens_override_precedence() {
        let mut interp = Interpreter::with_buffers();
        assert_eq!(eval_str(&mut interp, "(2 + 3) * 4"), Value::Int(20));
    }

    #[test]
    fn list_indexing_supports_negative_indices() {
        let mut interp = Interpreter::with_buffers();
        assert_eq!(eval_str(&mut interp, "[1, 2, 3][-1]"), Value::Int(3));
    }

    #[test]
    fn map_member_access_by_dotted_name() {
        let mut interp = Interpreter::with_buffers();
        assert_eq!(eval_str(&mut interp, r#"{"a": 1}.a"#), Value::Int(1));
    }

    #[test]
    fn library_member_without_a_call_returns_a_callable() {
        let mut interp = Interpreter::with_buffers();
        interp.run_source("import random").unwrap();
        assert_eq!(
            eval_str(&mut interp, "random.choice"),
            Value::CallableName("random.choice".into())
        );
    }

    #[test]
    fn string_concatenation_with_plus() {
        let mut interp = Interpreter::with_buffers();
        assert_eq!(
            eval_str(&mut interp, r#""foo" + "bar""#),
            Value::text("foobar")
        );
    }
}
