//! The statement executor: a line-oriented driver that dispatches each
//! line on its leading keyword, and discovers nested block bodies on
//! demand by counting keyword/`end` depth rather than pre-parsing a block
//! tree.

use log::{debug, trace};

use crate::error::TourmalineError;
use crate::eval;
use crate::interpreter::Interpreter;
use crate::lexer;
use crate::value::Value;

const ASSIGN_OPS: &[&str] = &["=", "+=", "-=", "*=", "/="];

fn leading_keyword(tokens: &[String]) -> &str {
    tokens.first().map(String::as_str).unwrap_or("")
}

fn opens_block(keyword: &str) -> bool {
    matches!(keyword, "function" | "if" | "while" | "for" | "try")
}

/// `lines[header_idx]` opens a block; return the index of the `end` line
/// that closes it, skipping over any nested blocks opened in between.
fn find_block_end(lines: &[String], header_idx: usize) -> Result<usize, TourmalineError> {
    let mut depth = 1i32;
    let mut i = header_idx + 1;
    while i < lines.len() {
        let trimmed = lines[i].trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            let first = trimmed.split_whitespace().next().unwrap_or("");
            if opens_block(first) {
                depth += 1;
            } else if trimmed == "end" {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
        }
        i += 1;
    }
    Err(TourmalineError::Parse(
        "missing matching 'end' for block".into(),
    ))
}

/// Run a self-contained slice of raw source lines. Recursed into by
/// block-structured statements (no environment snapshot — only user
/// function calls snapshot, see the interpreter module) and stopped early
/// once `has_returned` is observed.
pub fn run_lines(interp: &mut Interpreter, lines: &[String]) -> Result<(), TourmalineError> {
    let mut i = 0;
    while i < lines.len() {
        if interp.has_returned {
            break;
        }

        let trimmed = lines[i].trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            i += 1;
            continue;
        }

        let result = run_statement(interp, lines, &mut i, trimmed);
        if let Err(err) = result {
            debug!("statement error before propagation: {err}");
            return Err(err);
        }
    }
    Ok(())
}

/// Dispatch a single statement. `i` is advanced past whatever lines this
/// statement consumed (1 for a plain line, the whole block for a
/// block-structured one).
fn run_statement(
    interp: &mut Interpreter,
    lines: &[String],
    i: &mut usize,
    trimmed: &str,
) -> Result<(), TourmalineError> {
    let tokens = lexer::lex(trimmed)?;
    if tokens.is_empty() {
        *i += 1;
        return Ok(());
    }

    match leading_keyword(&tokens) {
        "import" => {
            exec_import(interp, &tokens)?;
            *i += 1;
        }
        "let" => {
            exec_let(interp, &tokens)?;
            *i += 1;
        }
        "function" => {
            let end = find_block_end(lines, *i)?;
            let name = tokens
                .get(1)
                .cloned()
                .ok_or_else(|| TourmalineError::Parse("function declaration missing a name".into()))?;
            trace!("defining function '{name}'");
            interp.functions.insert(name, lines[*i..=end].to_vec());
            *i = end + 1;
        }
        "struct" => {
            let end = find_block_end(lines, *i)?;
            let name = tokens
                .get(1)
                .cloned()
                .ok_or_else(|| TourmalineError::Parse("struct declaration missing a name".into()))?;
            interp.structs.insert(name, lines[*i..=end].to_vec());
            *i = end + 1;
        }
        "try" => {
            let end = find_block_end(lines, *i)?;
            exec_try(interp, lines, *i, end)?;
            *i = end + 1;
        }
        "if" => {
            let end = find_block_end(lines, *i)?;
            exec_if(interp, lines, *i, end)?;
            *i = end + 1;
        }
        "while" => {
            let end = find_block_end(lines, *i)?;
            exec_while(interp, lines, *i, end, &tokens)?;
            *i = end + 1;
        }
        "for" => {
            let end = find_block_end(lines, *i)?;
            exec_for(interp, lines, *i, end, &tokens)?;
            *i = end + 1;
        }
        "return" => {
            exec_return(interp, &tokens)?;
            *i += 1;
        }
        _ if tokens.len() >= 3 && ASSIGN_OPS.contains(&tokens[1].as_str()) => {
            exec_assignment(interp, &tokens)?;
            *i += 1;
        }
        _ => {
            // Fallback: a bare expression statement. Errors here are
            // silently discarded, so a call kept only for its side effect
            // doesn't abort execution when its residual expression can't
            // be re-parsed.
            let _ = eval::evaluate_top(interp, &tokens);
            *i += 1;
        }
    }
    Ok(())
}

fn exec_import(interp: &mut Interpreter, tokens: &[String]) -> Result<(), TourmalineError> {
    let name = tokens
        .get(1)
        .ok_or_else(|| TourmalineError::Parse("import requires a library name".into()))?;
    if !crate::library::exists(name) {
        return Err(TourmalineError::Name(format!(
            "library '{name}' not found"
        )));
    }
    interp.env.declare(name, Value::text(name.as_str()));
    Ok(())
}

fn exec_let(interp: &mut Interpreter, tokens: &[String]) -> Result<(), TourmalineError> {
    if tokens.len() < 4 || tokens[2] != "=" {
        return Err(TourmalineError::Parse(
            "invalid 'let' declaration, expected: let <name> = <expr>".into(),
        ));
    }
    let name = tokens[1].clone();
    let value = eval::evaluate_top(interp, &tokens[3..])?;
    interp.env.declare(&name, value);
    Ok(())
}

fn exec_assignment(interp: &mut Interpreter, tokens: &[String]) -> Result<(), TourmalineError> {
    let name = tokens[0].clone();
    let op = tokens[1].as_str();
    let rhs = eval::evaluate_top(interp, &tokens[2..])?;

    let value = if op == "=" {
        rhs
    } else {
        let current = interp
            .env
            .get(&name)
            .cloned()
            .ok_or_else(|| TourmalineError::Name(format!("variable '{name}' is not declared")))?;
        let arith_op = &op[..1];
        eval::apply_arith(arith_op, current, rhs)?
    };

    interp.env.assign(&name, value)
}

fn exec_return(interp: &mut Interpreter, tokens: &[String]) -> Result<(), TourmalineError> {
    let value = if tokens.len() > 1 {
        eval::evaluate_top(interp, &tokens[1..])?
    } else {
        Value::Nil
    };
    interp.return_value = value;
    interp.has_returned = true;
    Ok(())
}

fn exec_while(
    interp: &mut Interpreter,
    lines: &[String],
    header_idx: usize,
    end_idx: usize,
    header_tokens: &[String],
) -> Result<(), TourmalineError> {
    let body = &lines[header_idx + 1..end_idx];
    let mut guard = 0u64;
    loop {
        let condition = eval::evaluate_top(interp, &header_tokens[1..])?;
        if !condition.is_truthy() {
            break;
        }
        run_lines(interp, body)?;
        if interp.has_returned {
            break;
        }
        guard += 1;
        trace!("while loop iteration {guard}");
    }
    Ok(())
}

fn exec_for(
    interp: &mut Interpreter,
    lines: &[String],
    header_idx: usize,
    end_idx: usize,
    header_tokens: &[String],
) -> Result<(), TourmalineError> {
    if header_tokens.len() < 4 || header_tokens[2] != "in" {
        return Err(TourmalineError::Parse(
            "invalid 'for' loop, expected: for <name> in <expr>".into(),
        ));
    }
    let var_name = header_tokens[1].clone();
    let iterable = eval::evaluate_top(interp, &header_tokens[3..])?;
    let body = &lines[header_idx + 1..end_idx];

    let items: Vec<Value> = match &iterable {
        Value::List(list) => list.borrow().clone(),
        Value::Map(map) => map.borrow().keys().map(|k| Value::text(k.as_str())).collect(),
        Value::Text(s) => s.chars().map(|c| Value::text(c.to_string())).collect(),
        other => {
            return Err(TourmalineError::Type(format!(
                "cannot iterate over {}",
                other.type_name()
            )))
        }
    };

    for item in items {
        if interp.has_returned {
            break;
        }
        interp.env.declare(&var_name, item);
        run_lines(interp, body)?;
    }
    Ok(())
}

/// Split an `if` block's body (between header and `end`, exclusive) into
/// its `if`/`elif`/`else` segments, ignoring markers that belong to a
/// nested block.
fn exec_if(
    interp: &mut Interpreter,
    lines: &[String],
    header_idx: usize,
    end_idx: usize,
) -> Result<(), TourmalineError> {
    struct Branch {
        condition: Option<Vec<String>>,
        start: usize,
        end: usize,
    }

    let header_tokens = lexer::lex(lines[header_idx].trim())?;
    let mut branches = Vec::new();
    let mut current_condition = Some(header_tokens[1..].to_vec());
    let mut segment_start = header_idx + 1;
    let mut depth = 0i32;

    let mut i = header_idx + 1;
    while i < end_idx {
        let trimmed = lines[i].trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            let first = trimmed.split_whitespace().next().unwrap_or("");
            if depth == 0 && first == "elif" {
                branches.push(Branch {
                    condition: current_condition.take(),
                    start: segment_start,
                    end: i,
                });
                let elif_tokens = lexer::lex(trimmed)?;
                current_condition = Some(elif_tokens[1..].to_vec());
                segment_start = i + 1;
            } else if depth == 0 && trimmed == "else" {
                branches.push(Branch {
                    condition: current_condition.take(),
                    start: segment_start,
                    end: i,
                });
                current_condition = None;
                segment_start = i + 1;
            } else if opens_block(first) {
                depth += 1;
            } else if trimmed == "end" {
                depth -= 1;
            }
        }
        i += 1;
    }
    branches.push(Branch {
        condition: current_condition.take(),
        start: segment_start,
        end: end_idx,
    });

    for branch in branches {
        let runs = match &branch.condition {
            Some(cond_tokens) => eval::evaluate_top(interp, cond_tokens)?.is_truthy(),
            None => true,
        };
        if runs {
            run_lines(interp, &lines[branch.start..branch.end])?;
            return Ok(());
        }
    }
    Ok(())
}

/// Split a `try` block's body into the `try` segment and the optional
/// `except [name]` segment.
fn exec_try(
    interp: &mut Interpreter,
    lines: &[String],
    header_idx: usize,
    end_idx: usize,
) -> Result<(), TourmalineError> {
    let mut except_var: Option<String> = None;
    let mut except_marker: Option<usize> = None;
    let mut depth = 0i32;

    let mut i = header_idx + 1;
    while i < end_idx {
        let trimmed = lines[i].trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            let first = trimmed.split_whitespace().next().unwrap_or("");
            if depth == 0 && first == "except" && except_marker.is_none() {
                let except_tokens = lexer::lex(trimmed)?;
                except_var = except_tokens.get(1).cloned();
                except_marker = Some(i);
            } else if opens_block(first) {
                depth += 1;
            } else if trimmed == "end" {
                depth -= 1;
            }
        }
        i += 1;
    }

    let try_end = except_marker.unwrap_or(end_idx);
    let try_body = &lines[header_idx + 1..try_end];

    match run_lines(interp, try_body) {
        Ok(()) => Ok(()),
        Err(err) => {
            if let Some(marker) = except_marker {
                if let Some(var) = &except_var {
                    interp.env.declare(var, Value::text(err.to_string()));
                }
                let except_body = &lines[marker + 1..end_idx];
                run_lines(interp, except_body)
            } else {
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;

    fn program_lines(src: &str) -> Vec<String> {
        src.lines().map(str::to_string).collect()
    }

    #[test]
    fn arithmetic_precedence_matches_left_associative_rules() {
        let mut interp = Interpreter::with_buffers();
        run_lines(&mut interp, &program_lines("let x = 2 + 3 * 4")).unwrap();
        assert_eq!(interp.env.get("x"), Some(&Value::Int(14)));
    }

    #[test]
    fn while_loop_terminates_on_condition() {
        let mut interp = Interpreter::with_buffers();
        run_lines(
            &mut interp,
            &program_lines("let i = 0\nwhile i < 3\ni += 1\nend"),
        )
        .unwrap();
        assert_eq!(interp.env.get("i"), Some(&Value::Int(3)));
    }

    #[test]
    fn try_except_binds_error_text() {
        let mut interp = Interpreter::with_buffers();
        run_lines(
            &mut interp,
            &program_lines("try\nlet y = int(\"nope\")\nexcept e\nlet caught = e\nend"),
        )
        .unwrap();
        let Some(Value::Text(caught)) = interp.env.get("caught") else {
            panic!("expected caught to be bound")
        };
        assert!(caught.contains("nope"));
    }

    #[test]
    fn if_elif_else_runs_exactly_one_branch() {
        let mut interp = Interpreter::with_buffers();
        run_lines(
            &mut interp,
            &program_lines(
                "let n = 2\nif n == 1\nlet r = \"one\"\nelif n == 2\nlet r = \"two\"\nelse\nlet r = \"other\"\nend",
            ),
        )
        .unwrap();
        assert_eq!(interp.env.get("r"), Some(&Value::text("two")));
    }

    #[test]
    fn assignment_to_undeclared_variable_is_an_error() {
        let mut interp = Interpreter::with_buffers();
        let err = run_lines(&mut interp, &program_lines("x = 1"));
        assert!(err.is_err());
    }

    #[test]
    fn bare_expression_errors_are_swallowed() {
        let mut interp = Interpreter::with_buffers();
        // `undefined_fn` is not a builtin or user function, so the whole
        // line is parsed as a single undefined identifier lookup, which
        // errors — and that error must not propagate.
        assert!(run_lines(&mut interp, &program_lines("undefined_fn")).is_ok());
    }
}
