//! Ties together the environment, the function/struct tables, and the
//! interpreter's I/O seam, and drives user function calls by a
//! snapshot/replace/restore scheme: no lexical closures, a user function
//! sees a brand-new environment on entry and the caller's environment is
//! restored verbatim on return.

use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, trace};

use crate::environment::Environment;
use crate::error::TourmalineError;
use crate::exec;
use crate::lexer;
use crate::value::Value;

pub struct Interpreter {
    pub env: Environment,
    pub functions: HashMap<String, Vec<String>>,
    pub structs: HashMap<String, Vec<String>>,
    pub has_returned: bool,
    pub return_value: Value,
    placeholders: HashMap<String, Value>,
    next_ref: u64,
    out: Box<dyn Write>,
    input: Box<dyn BufRead>,
}

impl Interpreter {
    /// Construct an interpreter wired to real process stdio, for the
    /// binary entry point.
    pub fn with_stdio() -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stdin().lock()))
    }

    /// Construct an interpreter over in-memory buffers, for tests: the
    /// shared-ownership `out` buffer lets a test read back what the
    /// program printed after running it.
    pub fn with_buffers() -> Self {
        Self::new(Box::new(io::sink()), Box::new(io::empty()))
    }

    /// Construct an interpreter whose output is captured into `sink` and
    /// whose input is drawn from `script` — used by the integration tests
    /// to drive a full program and inspect what it printed.
    pub fn with_capture(sink: Rc<RefCell<Vec<u8>>>, script: &str) -> Self {
        Self::new(
            Box::new(CaptureWriter { sink }),
            Box::new(io::Cursor::new(script.as_bytes().to_vec())),
        )
    }

    fn new(out: Box<dyn Write>, input: Box<dyn BufRead>) -> Self {
        Self {
            env: Environment::new(),
            functions: HashMap::new(),
            structs: HashMap::new(),
            has_returned: false,
            return_value: Value::Nil,
            placeholders: HashMap::new(),
            next_ref: 0,
            out,
            input,
        }
    }

    pub fn out(&mut self) -> &mut dyn Write {
        &mut self.out
    }

    pub fn input(&mut self) -> &mut dyn BufRead {
        &mut self.input
    }

    /// Register `value` under a fresh opaque token and return that token,
    /// so a container call result can be spliced back into a token stream
    /// without being serialised to text.
    pub fn bind_placeholder(&mut self, value: Value) -> String {
        let token = format!("\u{0}ref:{}\u{0}", self.next_ref);
        self.next_ref += 1;
        self.placeholders.insert(token.clone(), value);
        token
    }

    /// Look up a placeholder token without consuming it — a call result
    /// may be read more than once while its containing statement is still
    /// being evaluated (e.g. it also appears in a larger expression).
    pub fn placeholder(&self, token: &str) -> Option<Value> {
        self.placeholders.get(token).cloned()
    }

    /// Drop every placeholder minted so far. Called once per top-level
    /// statement (`eval::evaluate_top`) so placeholders never survive
    /// past the statement that produced them.
    pub fn clear_placeholders(&mut self) {
        self.placeholders.clear();
    }

    /// Run a user-defined function: snapshot the caller's environment,
    /// bind parameters in a fresh one, run the body, then restore the
    /// caller's environment regardless of how the call ended.
    pub fn call_user_function(
        &mut self,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Value, TourmalineError> {
        let body = self
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| TourmalineError::Name(format!("function '{name}' is not defined")))?;

        let params = extract_params(&body[0])?;
        trace!("calling '{name}' with {} of {} parameters bound", args.len().min(params.len()), params.len());

        let caller_env = std::mem::replace(&mut self.env, Environment::new());
        for (param, arg) in params.iter().zip(args.into_iter()) {
            self.env.declare(param, arg);
        }

        let had_returned = self.has_returned;
        let had_return_value = std::mem::replace(&mut self.return_value, Value::Nil);
        self.has_returned = false;

        let result = exec::run_lines(self, &body[1..body.len() - 1]);

        let return_value = std::mem::replace(&mut self.return_value, had_return_value);
        self.has_returned = had_returned;
        self.env = caller_env;

        result?;
        Ok(return_value)
    }

    /// Run a complete source file or REPL chunk: split into lines and
    /// hand them to the statement executor at the current (top-level)
    /// environment.
    pub fn run_source(&mut self, source: &str) -> Result<(), TourmalineError> {
        let lines: Vec<String> = source.lines().map(str::to_string).collect();
        debug!("running {} lines of source", lines.len());
        exec::run_lines(self, &lines)
    }
}

/// Extract parameter names from a `function name(a, b, c)` header line.
fn extract_params(header: &str) -> Result<Vec<String>, TourmalineError> {
    let tokens = lexer::lex(header.trim())?;
    let open = tokens
        .iter()
        .position(|t| t == "(")
        .ok_or_else(|| TourmalineError::Parse("function header missing '('".into()))?;
    let close = tokens
        .iter()
        .rposition(|t| t == ")")
        .ok_or_else(|| TourmalineError::Parse("function header missing ')'".into()))?;
    Ok(tokens[open + 1..close]
        .iter()
        .filter(|t| *t != ",")
        .cloned()
        .collect())
}

struct CaptureWriter {
    sink: Rc<RefCell<Vec<u8>>>,
}

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sink.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_environment_is_restored_after_a_call() {
        let mut interp = Interpreter::with_buffers();
        interp.env.declare("x", Value::Int(99));
        interp.functions.insert(
            "f".to_string(),
            vec!["function f(x)", "x = x + 1", "return x", "end"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        );
        let result = interp.call_user_function("f", vec![Value::Int(1)]).unwrap();
        assert_eq!(result, Value::Int(2));
        assert_eq!(interp.env.get("x"), Some(&Value::Int(99)));
    }

    #[test]
    fn missing_arguments_leave_trailing_parameters_unbound() {
        let mut interp = Interpreter::with_buffers();
        interp.functions.insert(
            "f".to_string(),
            vec!["function f(a, b)", "return a", "end"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        );
        let result = interp.call_user_function("f", vec![Value::Int(7)]).unwrap();
        assert_eq!(result, Value::Int(7));
    }

    #[test]
    fn extract_params_reads_names_between_parens() {
        assert_eq!(
            extract_params("function add(a, b)").unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert_eq!(extract_params("function noop()").unwrap(), Vec::<String>::new());
    }
}
