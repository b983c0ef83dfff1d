use std::collections::HashSet;

use crate::core::builder::GraphBuilder;
use crate::core::error::{ParseError, ResrapError, ScanError};
use crate::core::graph::SyntaxGraph;
use crate::core::node::NodeKind;
use crate::core::prng::PRNG;
use crate::core::scanner::extract_tokens;

/// An immutable, normalized [`SyntaxGraph`] ready for generation.
///
/// Built once per grammar name at registration and never mutated again, so
/// it can be shared across generator threads behind an `Arc` with no
/// synchronization once built.
pub struct CompiledGrammar {
    graph: SyntaxGraph,
    start_names: HashSet<String>,
}

impl CompiledGrammar {
    /// Scans, parses, and normalizes `source`. Non-fatal scan/parse errors
    /// are returned alongside the grammar (possibly partial) rather than
    /// aborting the build.
    pub fn build(source: &str) -> (Self, Vec<ScanError>, Vec<ParseError>) {
        let (tokens, scan_errors) = extract_tokens(source);
        let (mut graph, parse_errors) = GraphBuilder::new(tokens).build();
        graph.normalize();
        let start_names = graph.name_map().keys().cloned().collect();
        (
            CompiledGrammar { graph, start_names },
            scan_errors,
            parse_errors,
        )
    }

    pub fn has_start(&self, name: &str) -> bool {
        self.start_names.contains(name)
    }

    /// Walks the graph from `start` for up to `tokens` emitted CHAR/REGEX
    /// atoms. Returns an empty string if `start` is unknown or `tokens == 0`
    /// — generation never fails.
    pub fn generate(&self, prng: &mut PRNG, start: &str, tokens: usize) -> String {
        let Some(&start_id) = self.graph.name_map().get(start) else {
            return String::new();
        };
        if tokens == 0 {
            return String::new();
        }

        let mut output = String::new();
        let mut return_stack: Vec<u32> = Vec::new();
        let mut emitted = 0usize;
        let mut current_id = start_id;

        loop {
            if emitted >= tokens {
                return output;
            }
            let Some(current) = self.graph.node(current_id) else {
                return output;
            };

            match current.kind {
                NodeKind::Char => {
                    if let Some(text) = self.graph.char_map().get(&current.id) {
                        output.push_str(&unescape(text));
                        emitted += 1;
                    }
                }
                NodeKind::Regex => {
                    if let Some(class) = self.graph.char_map().get(&current.id) {
                        output.push_str(&self.graph.regex_cache().generate_string(class, prng));
                        emitted += 1;
                    }
                }
                NodeKind::Pointer => {
                    match current.next.first() {
                        Some(continuation) => {
                            return_stack.push(continuation.target);
                            current_id = current.pointer;
                        }
                        None => return output,
                    }
                    continue;
                }
                NodeKind::End => {
                    if let Some(ret) = return_stack.pop() {
                        current_id = ret;
                        continue;
                    }
                    // no pending return: an END can still carry an outgoing
                    // edge from an INFINITE (`^`) quantifier restart loop,
                    // so fall through to ordinary edge selection below.
                }
                _ => {}
            }

            if current.next.is_empty() {
                return output;
            }

            let x = prng.random() as f32;
            let idx = current
                .cf
                .iter()
                .position(|&cf| cf >= x)
                .unwrap_or(current.cf.len() - 1);
            current_id = current.next[idx].target;
        }
    }
}

/// Decodes `\n \t \r \\ \' \"`; any other backslash sequence is preserved
/// verbatim (including a trailing, unpaired backslash).
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Registers `source` under `name` via [`CompiledGrammar::build`], turning a
/// non-empty error list into a single [`ResrapError::Parse`] while still
/// returning the (possibly partial) grammar.
pub fn compile_named(source: &str) -> Result<CompiledGrammar, ResrapError> {
    let (grammar, scan_errors, parse_errors) = CompiledGrammar::build(source);
    if !scan_errors.is_empty() {
        return Err(ResrapError::Scan(scan_errors.into_iter().next().unwrap()));
    }
    if !parse_errors.is_empty() {
        return Err(ResrapError::Parse(parse_errors));
    }
    Ok(grammar)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar(src: &str) -> CompiledGrammar {
        let (g, scan, parse) = CompiledGrammar::build(src);
        assert!(scan.is_empty(), "{:?}", scan);
        assert!(parse.is_empty(), "{:?}", parse);
        g
    }

    #[test]
    fn e1_single_char_emission() {
        let g = grammar("a : 'x' ;");
        let mut prng = PRNG::new(1);
        assert_eq!(g.generate(&mut prng, "a", 5), "x");
    }

    #[test]
    fn e2_alternation_picks_one_branch() {
        let g = grammar("a : 'x' 'y' | 'z' ;");
        for seed in [1, 2, 3, 4, 5] {
            let mut prng = PRNG::new(seed);
            let out = g.generate(&mut prng, "a", 5);
            assert!(out == "xy" || out == "z", "unexpected output {out:?}");
        }
    }

    #[test]
    fn e3_nonterminal_call_and_return() {
        let g = grammar("a : b ; b : 'hi' ;");
        let mut prng = PRNG::new(1);
        assert_eq!(g.generate(&mut prng, "a", 1), "hi");
    }

    #[test]
    fn e4_one_or_more_bounded_by_budget() {
        let g = grammar("a : 'x'+ <0.8> ;");
        let mut total = 0usize;
        let runs = 1000;
        for seed in 1..=runs as u64 {
            let mut prng = PRNG::new(seed);
            let out = g.generate(&mut prng, "a", 10);
            assert!(!out.is_empty());
            assert!(out.len() <= 10);
            assert!(out.chars().all(|c| c == 'x'));
            total += out.len();
        }
        let mean = total as f64 / runs as f64;
        // The loop-back edge carries weight 0.8; the rule terminator (`;`)
        // always closes with a fixed weight of 1 (see `parse_alternatives`),
        // so after normalization the continuation probability is
        // 0.8 / (0.8 + 1) and the geometric mean length is 1 + 0.8 = 1.8,
        // not the raw annotated weight.
        let continuation = 0.8 / 1.8;
        let expected = 1.0 / (1.0 - continuation);
        assert!((mean - expected).abs() / expected < 0.2, "mean {mean} vs expected {expected}");
    }

    #[test]
    fn infinite_quantifier_restarts_instead_of_terminating() {
        // `^` has no alternative edge out of its `END` besides the restart
        // back to the rule's head, so the only way generation ever stops is
        // the token budget — if the restart edge never fired (an `END` with
        // an empty return stack bailing out immediately instead of falling
        // through to edge selection), this would emit a single 'x' and stop.
        let g = grammar("a : 'x' ^ ;");
        for seed in 1..=10u64 {
            let mut prng = PRNG::new(seed);
            let out = g.generate(&mut prng, "a", 6);
            assert_eq!(out, "xxxxxx", "restart loop did not run to the token budget");
        }
    }

    #[test]
    fn e5_char_class_digit() {
        // `0-9` is one of the digit-alias classes (see `regex::DIGIT_ALIASES`),
        // so generation short-circuits to a `DIGIT_WORDS` member rather than a
        // single sampled digit rune — a digit class either is a lone digit or
        // a member of the digit alias list.
        let g = grammar("a : [0-9] ;");
        for seed in 1..=20u64 {
            let mut prng = PRNG::new(seed);
            let out = g.generate(&mut prng, "a", 1);
            assert!(
                out.chars().all(|c| c.is_ascii_digit()) || crate::core::regex::DIGIT_WORDS.contains(&out.as_str()),
                "unexpected output {out:?}"
            );
        }
    }

    #[test]
    fn unknown_start_returns_empty() {
        let g = grammar("a : 'x' ;");
        let mut prng = PRNG::new(1);
        assert_eq!(g.generate(&mut prng, "nope", 5), "");
    }

    #[test]
    fn zero_token_budget_returns_empty() {
        let g = grammar("a : 'x' ;");
        let mut prng = PRNG::new(1);
        assert_eq!(g.generate(&mut prng, "a", 0), "");
    }

    #[test]
    fn determinism_across_runs() {
        let g = grammar("a : 'x'+ <0.5> | 'y' ;");
        let mut p1 = PRNG::new(123);
        let mut p2 = PRNG::new(123);
        assert_eq!(g.generate(&mut p1, "a", 20), g.generate(&mut p2, "a", 20));
    }

    #[test]
    fn escape_sequences_decode() {
        let g = grammar(r"a : 'line\n' ;");
        let mut prng = PRNG::new(1);
        assert_eq!(g.generate(&mut prng, "a", 1), "line\n");
    }
}
