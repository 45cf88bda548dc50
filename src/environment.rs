use std::collections::HashMap;

use crate::error::TourmalineError;
use crate::value::Value;

/// A single flat mapping from identifier to `Value`. There is exactly one
/// of these live per interpreter at a time — user functions see it
/// replaced wholesale on entry and restored on exit (see the interpreter
/// module's call handling), so they never observe a caller's lexical
/// scope.
#[derive(Debug, Default, Clone)]
pub struct Environment {
    vars: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// `let`/`import`: bind unconditionally, replacing any prior value.
    pub fn declare(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_owned(), value);
    }

    /// Plain `=`: requires the name to already exist.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), TourmalineError> {
        if !self.vars.contains_key(name) {
            return Err(TourmalineError::Name(format!(
                "variable '{name}' is not declared"
            )));
        }
        self.vars.insert(name.to_owned(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_requires_prior_declaration() {
        let mut env = Environment::new();
        assert!(env.assign("x", Value::Int(1)).is_err());
        env.declare("x", Value::Int(1));
        assert!(env.assign("x", Value::Int(2)).is_ok());
        assert_eq!(env.get("x"), Some(&Value::Int(2)));
    }

    #[test]
    fn declare_replaces_on_redeclaration() {
        let mut env = Environment::new();
        env.declare("x", Value::Int(1));
        env.declare("x", Value::Int(2));
        assert_eq!(env.get("x"), Some(&Value::Int(2)));
    }
}
