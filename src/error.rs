use std::fmt::{self, Display};

/// An error raised while lexing, parsing, or evaluating Tourmaline source.
///
/// Variants correspond to the error kinds of the language: a lexical error
/// (an unterminated string), a parse error (a malformed literal or
/// declaration), a name error (an undefined identifier), a type error (an
/// operator or builtin applied to incompatible kinds), an arithmetic error
/// (division by zero), an index error (an out-of-range list or text
/// index), and an I/O error (a missing source file).
#[derive(Debug, Clone, PartialEq)]
pub enum TourmalineError {
    Lexical(String),
    Parse(String),
    Name(String),
    Type(String),
    Arithmetic(String),
    Index(String),
    Io(String),
}

impl TourmalineError {
    pub fn kind(&self) -> &'static str {
        match self {
            TourmalineError::Lexical(_) => "LexicalError",
            TourmalineError::Parse(_) => "ParseError",
            TourmalineError::Name(_) => "NameError",
            TourmalineError::Type(_) => "TypeError",
            TourmalineError::Arithmetic(_) => "ArithmeticError",
            TourmalineError::Index(_) => "IndexError",
            TourmalineError::Io(_) => "IoError",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            TourmalineError::Lexical(m)
            | TourmalineError::Parse(m)
            | TourmalineError::Name(m)
            | TourmalineError::Type(m)
            | TourmalineError::Arithmetic(m)
            | TourmalineError::Index(m)
            | TourmalineError::Io(m) => m,
        }
    }
}

impl Display for TourmalineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind(), self.message())
    }
}

impl std::error::Error for TourmalineError {}

pub type TourmalineResult<T> = Result<T, TourmalineError>;
