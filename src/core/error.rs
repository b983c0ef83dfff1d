use thiserror::Error;

/// An error produced while scanning grammar source into tokens.
#[derive(Debug, Clone, Error)]
#[error("scan error at offset {pos}: {msg}")]
pub struct ScanError {
    pub pos: usize,
    pub msg: String,
}

impl ScanError {
    pub fn new(pos: usize, msg: impl Into<String>) -> Self {
        ScanError {
            pos,
            msg: msg.into(),
        }
    }
}

/// An error produced while lowering a token stream into a syntax graph.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("stray ')' found")]
    StrayCloseParen,
    #[error("unmatched '('")]
    UnmatchedOpenParen,
    #[error("multiple definitions for {0}")]
    DuplicateDefinition(String),
    #[error("definition of '{0}' not found")]
    MissingDefinition(String),
    #[error("negative probability found")]
    NegativeProbability,
    #[error("failed to parse probability '{0}'")]
    MalformedProbability(String),
    #[error("expected subject at start of statement")]
    ExpectedSubject,
    #[error("expected ':' after subject")]
    ExpectedColon,
    #[error("missing ';'")]
    MissingSemicolon,
    #[error("quantifier has no preceding atom to apply to")]
    QuantifierWithoutAtom,
}

/// Top-level error type for the crate's fallible, `Result`-returning APIs.
///
/// Per the error-handling policy, scan and parse errors are *collected*, not
/// raised per-token: [`ResrapError::Parse`] wraps the accumulated list
/// returned from a single `register_grammar` call. Generation itself never
/// fails (see [`crate::core::compiled::CompiledGrammar::generate`]).
#[derive(Debug, Error)]
pub enum ResrapError {
    #[error("{0}")]
    Scan(#[from] ScanError),
    #[error("{} parse error(s), first: {}", .0.len(), .0.first().map(|e| e.to_string()).unwrap_or_default())]
    Parse(Vec<ParseError>),
    #[error("failed to read grammar file: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown grammar '{0}'")]
    UnknownGrammar(String),
}
