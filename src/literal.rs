//! List and mapping literal parsers. Called once the evaluator has
//! identified that a token slice opens with `[` or `{`; the call resolver
//! deliberately leaves literal bodies untouched, so any calls nested
//! inside an element are resolved when that element's own slice reaches
//! the evaluator.

use indexmap::IndexMap;

use crate::error::TourmalineError;
use crate::eval;
use crate::interpreter::Interpreter;
use crate::scan::{find_matching_close, split_top_level};
use crate::value::Value;

/// `tokens[0]` must be `[`; parses up to its matching `]`.
pub fn parse_list(interp: &mut Interpreter, tokens: &[String]) -> Result<Value, TourmalineError> {
    let close = find_matching_close(tokens, 0)?;
    if close == 1 {
        return Ok(Value::list(vec![]));
    }

    let mut items = Vec::new();
    for (start, end) in split_top_level(tokens, 1, close, ",") {
        if start >= end {
            return Err(TourmalineError::Parse(
                "empty element in list literal".into(),
            ));
        }
        items.push(eval::evaluate(interp, &tokens[start..end])?);
    }
    Ok(Value::list(items))
}

/// `tokens[0]` must be `{`; parses up to its matching `}` as repeated
/// `key : value` pairs separated by commas at depth 1.
pub fn parse_map(interp: &mut Interpreter, tokens: &[String]) -> Result<Value, TourmalineError> {
    let close = find_matching_close(tokens, 0)?;
    if close == 1 {
        return Ok(Value::map(IndexMap::new()));
    }

    let mut entries = IndexMap::new();
    for (start, end) in split_top_level(tokens, 1, close, ",") {
        let colon = find_top_level_colon(tokens, start, end)?;
        if colon == start {
            return Err(TourmalineError::Parse("missing key before ':'".into()));
        }
        if colon + 1 >= end {
            return Err(TourmalineError::Parse(
                "missing value after ':' in map literal".into(),
            ));
        }
        let key = eval::evaluate(interp, &tokens[start..colon])?;
        let value = eval::evaluate(interp, &tokens[colon + 1..end])?;
        entries.insert(key.to_canonical_text(), value);
    }
    Ok(Value::map(entries))
}

fn find_top_level_colon(
    tokens: &[String],
    start: usize,
    end: usize,
) -> Result<usize, TourmalineError> {
    let mut depth = 0i32;
    for i in start..end {
        match tokens[i].as_str() {
            "(" | "[" | "{" => depth += 1,
            ")" | "]" | "}" => depth -= 1,
            ":" if depth == 0 => return Ok(i),
            _ => {}
        }
    }
    Err(TourmalineError::Parse(
        "expected ':' in map literal entry".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;
    use crate::lexer::lex;

    #[test]
    fn empty_list_literal_is_empty() {
        let mut interp = Interpreter::with_buffers();
        let tokens = lex("[]").unwrap();
        let value = parse_list(&mut interp, &tokens).unwrap();
        assert_eq!(value, Value::list(vec![]));
        assert!(!value.is_truthy());
    }

    #[test]
    fn list_literal_with_scalars_round_trips_structurally() {
        let mut interp = Interpreter::with_buffers();
        let tokens = lex("[1, 2, 3]").unwrap();
        let value = parse_list(&mut interp, &tokens).unwrap();
        assert_eq!(
            value,
            Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn map_literal_parses_key_value_pairs() {
        let mut interp = Interpreter::with_buffers();
        let tokens = lex(r#"{"a": 1, "b": 2}"#).unwrap();
        let value = parse_map(&mut interp, &tokens).unwrap();
        let Value::Map(m) = value else { panic!() };
        assert_eq!(m.borrow().get("a"), Some(&Value::Int(1)));
        assert_eq!(m.borrow().get("b"), Some(&Value::Int(2)));
    }

    #[test]
    fn nested_list_inside_map_value_is_skipped_correctly() {
        let mut interp = Interpreter::with_buffers();
        let tokens = lex(r#"{"a": [1, 2], "b": 3}"#).unwrap();
        let value = parse_map(&mut interp, &tokens).unwrap();
        let Value::Map(m) = value else { panic!() };
        assert_eq!(
            m.borrow().get("a"),
            Some(&Value::list(vec![Value::Int(1), Value::Int(2)]))
        );
    }
}
