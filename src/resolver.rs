//! The call resolver (component D): rewrites a token slice so every
//! `name(...)` or `library.member(...)` call is replaced by its result
//! *before* the expression evaluator's precedence-climbing scan ever runs.
//! This mirrors the original interpreter's `resolve_function_calls` pass —
//! calls are performed by a single left-to-right scan over the token
//! stream, splicing each call's result back in as either a re-quoted
//! scalar token or a placeholder token standing in for a container (see
//! the interpreter module's placeholder table).

use log::trace;

use crate::builtins;
use crate::error::TourmalineError;
use crate::eval;
use crate::interpreter::Interpreter;
use crate::library;
use crate::scan::{find_matching_close, split_top_level};
use crate::value::Value;

const OPERATORS: &[&str] = &[
    "or", "and", "==", "!=", "<", ">", "<=", ">=", "+", "-", "*", "/", "%",
];

/// True at the start of an expression, or immediately after something
/// that cannot itself be a complete value (an operator, an opening
/// bracket, a separator) — the position a list/map literal would open in,
/// as opposed to the position an index bracket follows a value in.
fn is_primary_position(out: &[String]) -> bool {
    match out.last().map(String::as_str) {
        None => true,
        Some(prev) => {
            prev == "(" || prev == "[" || prev == "{" || prev == "," || prev == ":"
                || OPERATORS.contains(&prev)
        }
    }
}

/// Resolve every call in `tokens`, returning a new token vector with calls
/// replaced by their results. Bracketed literal bodies (`[...]`, `{...}`)
/// are copied through untouched — nested calls inside a literal element
/// are resolved later, when that element's own slice reaches the
/// evaluator.
pub fn resolve(interp: &mut Interpreter, tokens: &[String]) -> Result<Vec<String>, TourmalineError> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;

    while i < tokens.len() {
        let tok = tokens[i].as_str();

        // A `[`/`{` opening a literal is skipped whole (its elements are
        // resolved later, per-element, once they reach the evaluator).
        // The same token used as postfix indexing (`list[i]`) follows a
        // value rather than starting one, so it is left to the ordinary
        // scan below, which walks straight through it and still resolves
        // any call inside.
        if (tok == "[" || tok == "{") && is_primary_position(&out) {
            let close = find_matching_close(tokens, i)?;
            out.extend_from_slice(&tokens[i..=close]);
            i = close + 1;
            continue;
        }

        if let Some(end) = try_library_call(interp, tokens, i, &mut out)? {
            i = end;
            continue;
        }

        if let Some(end) = try_plain_call(interp, tokens, i, &mut out)? {
            i = end;
            continue;
        }

        out.push(tokens[i].clone());
        i += 1;
    }

    Ok(out)
}

/// `library . member ( args )`. Returns the index to resume scanning from
/// if a call was recognised and spliced.
fn try_library_call(
    interp: &mut Interpreter,
    tokens: &[String],
    i: usize,
    out: &mut Vec<String>,
) -> Result<Option<usize>, TourmalineError> {
    if i + 3 >= tokens.len() || tokens[i + 1] != "." || tokens[i + 3] != "(" {
        return Ok(None);
    }
    let Some(lib) = library::lookup(&tokens[i]) else {
        return Ok(None);
    };
    let member = tokens[i + 2].as_str();
    if !lib.has_member(member) {
        return Ok(None);
    }

    let open = i + 3;
    let close = find_matching_close(tokens, open)?;
    let args = evaluate_args(interp, tokens, open, close)?;

    trace!("resolving library call {}.{member}({} args)", tokens[i], args.len());
    let func = lib.member(member).expect("checked has_member above");
    let result = func(&args)?;
    out.push(splice(interp, result));
    Ok(Some(close + 1))
}

/// `name ( args )` where `name` is either a declared user function or a
/// built-in.
fn try_plain_call(
    interp: &mut Interpreter,
    tokens: &[String],
    i: usize,
    out: &mut Vec<String>,
) -> Result<Option<usize>, TourmalineError> {
    if i + 1 >= tokens.len() || tokens[i + 1] != "(" {
        return Ok(None);
    }
    let name = tokens[i].as_str();
    let is_user_fn = interp.functions.contains_key(name);
    if !is_user_fn && !builtins::is_builtin(name) {
        return Ok(None);
    }

    let open = i + 1;
    let close = find_matching_close(tokens, open)?;
    let args = evaluate_args(interp, tokens, open, close)?;

    trace!("resolving call to '{name}' ({} args)", args.len());
    let result = if is_user_fn {
        interp.call_user_function(name, args)?
    } else {
        builtins::call(interp, name, args)?
    };
    out.push(splice(interp, result));
    Ok(Some(close + 1))
}

/// Evaluate a call's comma-separated argument list (`tokens[open+1..close]`,
/// `tokens[open]` being the opening paren and `tokens[close]` its match).
fn evaluate_args(
    interp: &mut Interpreter,
    tokens: &[String],
    open: usize,
    close: usize,
) -> Result<Vec<Value>, TourmalineError> {
    if open + 1 == close {
        return Ok(Vec::new());
    }
    let mut args = Vec::new();
    for (start, end) in split_top_level(tokens, open + 1, close, ",") {
        if start >= end {
            return Err(TourmalineError::Parse("empty argument in call".into()));
        }
        args.push(eval::evaluate(interp, &tokens[start..end])?);
    }
    Ok(args)
}

/// Turn a call's return value into the single token that replaces it.
/// Scalars are re-quoted/re-rendered as ordinary source text so the
/// evaluator's single-token parsing picks them straight back up; a list or
/// map is registered behind an opaque placeholder token instead, since it
/// cannot be losslessly round-tripped through text.
fn splice(interp: &mut Interpreter, value: Value) -> String {
    match value {
        Value::Text(s) => format!("\"{s}\""),
        scalar if scalar.is_scalar() => scalar.to_canonical_text(),
        container => interp.bind_placeholder(container),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;
    use crate::lexer::lex;

    #[test]
    fn resolves_builtin_call_to_a_scalar_token() {
        let mut interp = Interpreter::with_buffers();
        let tokens = lex("1 + len(\"abc\")").unwrap();
        let resolved = resolve(&mut interp, &tokens).unwrap();
        assert_eq!(resolved, vec!["1", "+", "3"]);
    }

    #[test]
    fn resolves_user_function_call() {
        let mut interp = Interpreter::with_buffers();
        interp.functions.insert(
            "double".to_string(),
            vec!["function double(x)", "return x * 2", "end"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        );
        let tokens = lex("double(21)").unwrap();
        let resolved = resolve(&mut interp, &tokens).unwrap();
        assert_eq!(resolved, vec!["42"]);
    }

    #[test]
    fn list_literal_bodies_are_left_untouched() {
        let mut interp = Interpreter::with_buffers();
        let tokens = lex("[1, len(\"ab\")]").unwrap();
        let resolved = resolve(&mut interp, &tokens).unwrap();
        assert_eq!(resolved, tokens);
    }

    #[test]
    fn container_result_is_spliced_as_a_placeholder_token() {
        let mut interp = Interpreter::with_buffers();
        let tokens = lex("append([1], 2)").unwrap();
        let resolved = resolve(&mut interp, &tokens).unwrap();
        assert_eq!(resolved.len(), 1);
        assert!(interp.placeholder(&resolved[0]).is_some());
    }
}
