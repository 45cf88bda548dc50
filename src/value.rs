use std::cell::RefCell;
use std::fmt::{self, Display};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::TourmalineError;

pub type ListRef = Rc<RefCell<Vec<Value>>>;
pub type MapRef = Rc<RefCell<IndexMap<String, Value>>>;

/// A dynamically-typed Tourmaline value.
///
/// `List` and `Map` wrap their contents in `Rc<RefCell<_>>` so that passing
/// one into a user function shares identity with the caller, per the
/// environment invariant that mutable containers are observed across a
/// call boundary (see the environment module).
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(Rc<str>),
    Nil,
    List(ListRef),
    Map(MapRef),
    CallableName(Rc<str>),
}

impl Value {
    pub fn text(value: impl Into<Rc<str>>) -> Self {
        Value::Text(value.into())
    }

    pub fn list(values: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(values)))
    }

    pub fn map(entries: IndexMap<String, Value>) -> Self {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    /// Falsy set: `false`, `nil`, `0`, `0.0`, empty text, empty list, empty map.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Bool(b) => *b,
            Value::Text(s) => !s.is_empty(),
            Value::Nil => false,
            Value::List(l) => !l.borrow().is_empty(),
            Value::Map(m) => !m.borrow().is_empty(),
            Value::CallableName(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Text(_) => "text",
            Value::Nil => "nil",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::CallableName(_) => "function",
        }
    }

    /// Is this value scalar (fits in a single re-lexed token) or a
    /// container that call resolution must splice back via a placeholder?
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::List(_) | Value::Map(_))
    }

    /// Canonical text form used both by the `str()` builtin and by the
    /// call resolver when splicing a scalar return value back into the
    /// token stream (strings are re-quoted by the caller, see the
    /// resolver module).
    pub fn to_canonical_text(&self) -> String {
        match self {
            Value::Int(n) => n.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Bool(b) => b.to_string(),
            Value::Text(s) => s.to_string(),
            Value::Nil => "nil".to_string(),
            Value::List(l) => {
                let items: Vec<String> = l.borrow().iter().map(Value::to_display).collect();
                format!("[{}]", items.join(", "))
            }
            Value::Map(m) => {
                let items: Vec<String> = m
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.to_display()))
                    .collect();
                format!("{{{}}}", items.join(", "))
            }
            Value::CallableName(name) => name.to_string(),
        }
    }

    /// Representation used by `print` and by text-embedding (`"a" + list`),
    /// identical to `to_canonical_text` except strings carry no quotes in
    /// either form; kept as a separate name so call sites read intent.
    pub fn to_display(&self) -> String {
        self.to_canonical_text()
    }

    pub fn as_int(&self) -> TourmalineResultValue<i64> {
        match self {
            Value::Int(n) => Ok(*n),
            other => Err(TourmalineError::Type(format!(
                "expected int, found {}",
                other.type_name()
            ))),
        }
    }

    pub fn as_f64(&self) -> TourmalineResultValue<f64> {
        match self {
            Value::Int(n) => Ok(*n as f64),
            Value::Float(f) => Ok(*f),
            other => Err(TourmalineError::Type(format!(
                "expected number, found {}",
                other.type_name()
            ))),
        }
    }

    pub fn as_list(&self) -> TourmalineResultValue<ListRef> {
        match self {
            Value::List(l) => Ok(l.clone()),
            other => Err(TourmalineError::Type(format!(
                "expected list, found {}",
                other.type_name()
            ))),
        }
    }

    pub fn as_map(&self) -> TourmalineResultValue<MapRef> {
        match self {
            Value::Map(m) => Ok(m.clone()),
            other => Err(TourmalineError::Type(format!(
                "expected map, found {}",
                other.type_name()
            ))),
        }
    }

    /// Ordering for `< > <= >=`: numeric kinds compare by value across
    /// `Int`/`Float`, text compares byte-exact lexicographically. Any
    /// other pairing is a type error.
    pub fn compare(&self, other: &Value) -> TourmalineResultValue<std::cmp::Ordering> {
        match (self, other) {
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                self.as_f64().unwrap().partial_cmp(&other.as_f64().unwrap()).ok_or_else(|| {
                    TourmalineError::Type("cannot compare NaN".into())
                })
            }
            (Value::Text(a), Value::Text(b)) => Ok(a.as_bytes().cmp(b.as_bytes())),
            _ => Err(TourmalineError::Type(format!(
                "cannot compare {} and {}",
                self.type_name(),
                other.type_name()
            ))),
        }
    }

    pub fn len(&self) -> TourmalineResultValue<usize> {
        match self {
            Value::Text(s) => Ok(s.chars().count()),
            Value::List(l) => Ok(l.borrow().len()),
            Value::Map(m) => Ok(m.borrow().len()),
            other => Err(TourmalineError::Type(format!(
                "object of type {} has no len()",
                other.type_name()
            ))),
        }
    }
}

type TourmalineResultValue<T> = Result<T, TourmalineError>;

/// `{:?}` keeps a trailing `.0` on whole floats (`3.0`), unlike `{}`
/// (`3`), which matters here: a float that round-trips through text must
/// still lex back as `Float`, not silently become an `Int`.
fn format_float(f: f64) -> String {
    if f.is_infinite() || f.is_nan() {
        return format!("{f}");
    }
    let text = format!("{f:?}");
    if text.contains('.') || text.contains('e') || text.contains('E') {
        text
    } else {
        format!("{text}.0")
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Int(_) | Float(_), Int(_) | Float(_)) => {
                self.as_f64().unwrap_or(f64::NAN) == other.as_f64().unwrap_or(f64::NAN)
            }
            (Bool(a), Bool(b)) => a == b,
            (Text(a), Text(b)) => a == b,
            (Nil, Nil) => true,
            (List(a), List(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Map(a), Map(b)) => Rc::ptr_eq(a, b) || map_eq(a, b),
            (CallableName(a), CallableName(b)) => a == b,
            _ => false,
        }
    }
}

fn map_eq(a: &MapRef, b: &MapRef) -> bool {
    let a = a.borrow();
    let b = b.borrow();
    a.len() == b.len() && a.iter().all(|(k, v)| b.get(k).is_some_and(|bv| bv == v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_matches_falsy_set() {
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::text("").is_truthy());
        assert!(!Value::list(vec![]).is_truthy());
        assert!(Value::Int(1).is_truthy());
        assert!(Value::text("a").is_truthy());
    }

    #[test]
    fn numeric_equality_crosses_int_and_float() {
        assert_eq!(Value::Int(2), Value::Float(2.0));
        assert_ne!(Value::Int(2), Value::Float(2.5));
    }

    #[test]
    fn whole_float_keeps_decimal_point_in_canonical_text() {
        assert_eq!(Value::Float(3.0).to_canonical_text(), "3.0");
        assert_eq!(Value::Int(3).to_canonical_text(), "3");
    }
}
