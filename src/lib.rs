//! A context-free grammar compiler and weighted random walk text generator.
//!
//! Grammars are scanned, lowered into a [`core::graph::SyntaxGraph`], and
//! normalized once at registration; generation then walks the frozen graph
//! with a seedable PRNG and never itself fails (see [`core::error`]).

mod core;

use std::sync::Arc;

use log::warn;

pub use crate::core::builder::GraphBuilder;
pub use crate::core::compiled::CompiledGrammar;
pub use crate::core::error::{ParseError, ResrapError, ScanError};
pub use crate::core::pool::{GenerationPool, GenerationRequest, GenerationResult, PoolConfig};
pub use crate::core::prng::PRNG;
pub use crate::core::registry::GrammarRegistry;

/// The main access point for single-threaded use: a named collection of
/// grammars that can be generated from once parsed.
///
/// For concurrent generation against a shared, read-only set of grammars,
/// build a [`GrammarRegistry`] directly, wrap it in an `Arc`, and hand it to
/// [`GenerationPool::start`] instead.
#[derive(Default)]
pub struct Resrap {
    registry: GrammarRegistry,
}

impl Resrap {
    /// Creates a new `Resrap` instance with no loaded grammars.
    pub fn new() -> Self {
        Resrap {
            registry: GrammarRegistry::new(),
        }
    }

    /// Parses a grammar string and stores it under `name`.
    ///
    /// `name` is a unique identifier for this grammar (e.g. "C"). Scan
    /// errors abort registration; parse errors are reported but the grammar
    /// is still stored so its defined rules remain usable.
    pub fn register_grammar(&mut self, name: impl Into<String>, grammar: &str) -> Result<(), ResrapError> {
        self.registry.register(name, grammar)
    }

    /// Parses a grammar from a file and stores it under `name`.
    pub fn register_grammar_from_file(
        &mut self,
        name: impl Into<String>,
        location: impl AsRef<std::path::Path>,
    ) -> Result<(), ResrapError> {
        self.registry.register_from_file(name, location)
    }

    /// Generates content from the grammar identified by `name`, starting at
    /// `starting_node`, drawing a fresh non-deterministic seed.
    ///
    /// Returns an empty string if `name` is not a registered grammar — see
    /// the error-handling policy in [`core::error`] for why generation
    /// itself cannot fail.
    pub fn generate_random(&self, name: &str, starting_node: &str, tokens: usize) -> String {
        if self.registry.get(name).is_none() {
            warn!("generate_random called for unregistered grammar '{name}'");
        }
        self.registry.generate_random(name, starting_node, tokens)
    }

    /// Generates content from the grammar identified by `name`, starting at
    /// `starting_node`, using `seed` to make generation deterministic.
    pub fn generate_with_seeded(
        &self,
        name: &str,
        starting_node: &str,
        seed: u64,
        tokens: usize,
    ) -> String {
        if self.registry.get(name).is_none() {
            warn!("generate_with_seeded called for unregistered grammar '{name}'");
        }
        self.registry.generate_seeded(name, starting_node, seed, tokens)
    }

    /// Hands out an `Arc`-wrapped clone of the underlying registry, suitable
    /// for handing to [`GenerationPool::start`] without losing access to the
    /// grammars already registered on `self`.
    pub fn shared_registry(self) -> Arc<GrammarRegistry> {
        Arc::new(self.registry)
    }
}
