//! The process-wide library registry. Populated once at interpreter
//! construction and never mutated by user code — the registry is fixed,
//! so there is deliberately no `register_library` entry point.

mod random;

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::error::TourmalineError;
use crate::value::Value;

pub type LibraryFn = fn(&[Value]) -> Result<Value, TourmalineError>;

pub struct Library {
    members: HashMap<&'static str, LibraryFn>,
}

impl Library {
    pub fn member(&self, name: &str) -> Option<LibraryFn> {
        self.members.get(name).copied()
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }
}

static REGISTRY: Lazy<HashMap<&'static str, Library>> = Lazy::new(|| {
    let mut registry = HashMap::new();
    registry.insert(
        "random",
        Library {
            members: random::members().into_iter().collect(),
        },
    );
    registry
});

pub fn lookup(library: &str) -> Option<&'static Library> {
    REGISTRY.get(library)
}

pub fn exists(library: &str) -> bool {
    REGISTRY.contains_key(library)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_library_exposes_its_documented_members() {
        assert!(exists("random"));
        let lib = lookup("random").unwrap();
        for name in ["randint", "random", "choice", "shuffle", "uniform", "randrange"] {
            assert!(lib.has_member(name), "missing random.{name}");
        }
    }

    #[test]
    fn unknown_library_is_absent() {
        assert!(!exists("os"));
    }
}
