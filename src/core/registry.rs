use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use log::{debug, warn};

use crate::core::compiled::CompiledGrammar;
use crate::core::error::ResrapError;
use crate::core::file::read_grammar_file;
use crate::core::prng::PRNG;

/// A `name -> CompiledGrammar` map, read-mostly: grammars are registered up
/// front and then only read by generation calls, so entries are held behind
/// an `Arc` and handed out by clone rather than by reference — the same
/// representation the worker pool needs to share a grammar across threads.
#[derive(Default)]
pub struct GrammarRegistry {
    grammars: HashMap<String, Arc<CompiledGrammar>>,
}

impl GrammarRegistry {
    pub fn new() -> Self {
        GrammarRegistry {
            grammars: HashMap::new(),
        }
    }

    /// Builds, normalizes, and stores `source` under `name`. Scan errors
    /// abort registration; parse errors are collected and returned, but the
    /// (possibly partial) grammar is still stored so generation from its
    /// defined rules keeps working.
    pub fn register(&mut self, name: impl Into<String>, source: &str) -> Result<(), ResrapError> {
        let name = name.into();
        let (grammar, scan_errors, parse_errors) = CompiledGrammar::build(source);
        if let Some(first) = scan_errors.into_iter().next() {
            warn!("grammar '{name}' failed to scan: {first}");
            return Err(ResrapError::Scan(first));
        }
        self.grammars.insert(name.clone(), Arc::new(grammar));
        if !parse_errors.is_empty() {
            warn!(
                "grammar '{name}' registered with {} parse error(s)",
                parse_errors.len()
            );
            return Err(ResrapError::Parse(parse_errors));
        }
        debug!("registered grammar '{name}'");
        Ok(())
    }

    pub fn register_from_file(
        &mut self,
        name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<(), ResrapError> {
        let source = read_grammar_file(path)?;
        self.register(name, &source)
    }

    pub fn get(&self, name: &str) -> Option<Arc<CompiledGrammar>> {
        self.grammars.get(name).cloned()
    }

    /// Generates from `name`/`start`, drawing a fresh non-deterministic
    /// PRNG. An unknown grammar name yields an empty string, matching the
    /// "generation never fails" policy (ScanError is unused by this path).
    pub fn generate_random(&self, name: &str, start: &str, tokens: usize) -> String {
        self.generate_seeded(name, start, 0, tokens)
    }

    pub fn generate_seeded(&self, name: &str, start: &str, seed: u64, tokens: usize) -> String {
        let Some(grammar) = self.get(name) else {
            return String::new();
        };
        let mut prng = PRNG::new(seed);
        grammar.generate(&mut prng, start, tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_generate() {
        let mut reg = GrammarRegistry::new();
        reg.register("a", "a : 'x' ;").unwrap();
        assert_eq!(reg.generate_seeded("a", "a", 1, 5), "x");
    }

    #[test]
    fn unknown_grammar_generates_empty_string() {
        let reg = GrammarRegistry::new();
        assert_eq!(reg.generate_seeded("nope", "a", 1, 5), "");
    }

    #[test]
    fn partial_grammar_still_registers_and_generates() {
        let mut reg = GrammarRegistry::new();
        let err = reg.register("partial", "a : b ;").unwrap_err();
        assert!(matches!(err, ResrapError::Parse(_)));
        // "a" is defined even though "b" is missing, so it still generates.
        assert_eq!(reg.generate_seeded("partial", "a", 1, 1), "");
    }
}
