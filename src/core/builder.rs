use crate::core::error::ParseError;
use crate::core::graph::SyntaxGraph;
use crate::core::scanner::{Token, TokenType};
use std::collections::HashMap;

/// Lowers a token stream for one grammar into a [`SyntaxGraph`].
///
/// Uses a two-cursor lowering scheme (`buffer`/`start_buffer`: the current
/// splice point and the start of the most recent atom, for quantifiers to
/// attach to) and walks node *ids* rather than pointer-linked nodes.
pub struct GraphBuilder {
    tokens: Vec<Token>,
    index: usize,
    graph: SyntaxGraph,
    def_check: HashMap<u32, bool>,
    errors: Vec<ParseError>,
}

impl GraphBuilder {
    pub fn new(tokens: Vec<Token>) -> Self {
        GraphBuilder {
            tokens,
            index: 0,
            graph: SyntaxGraph::new(),
            def_check: HashMap::new(),
            errors: Vec::new(),
        }
    }

    /// Parses every rule in the token stream, then validates that every
    /// referenced nonterminal was defined. Returns the (possibly partial)
    /// graph together with every error collected along the way.
    pub fn build(mut self) -> (SyntaxGraph, Vec<ParseError>) {
        while self.index < self.tokens.len() {
            self.parse_rule();
        }
        self.validate();
        (self.graph, self.errors)
    }

    fn curr(&self) -> Option<Token> {
        self.tokens.get(self.index).cloned()
    }

    /// Reads the probability literal that optionally follows the token at
    /// the current index, consuming the current token and (if present) the
    /// probability token after it. Defaults to 0.5 when no literal follows.
    fn get_probability(&mut self) -> f32 {
        let next = self.index + 1;
        if let Some(t) = self.tokens.get(next) {
            if t.typ == TokenType::Probability {
                let text = t.text.clone();
                self.index = next + 1;
                return match text.parse::<f32>() {
                    Ok(v) if v >= 0.0 => v,
                    Ok(_) => {
                        self.errors.push(ParseError::NegativeProbability);
                        0.0
                    }
                    Err(_) => {
                        self.errors.push(ParseError::MalformedProbability(text));
                        0.5
                    }
                };
            }
        }
        self.index += 1;
        0.5
    }

    fn parse_rule(&mut self) {
        let Some(subject) = self.curr() else { return };
        if subject.typ != TokenType::Identifier {
            self.errors.push(ParseError::ExpectedSubject);
            self.index += 1;
            return;
        }
        self.index += 1;

        match self.curr() {
            Some(t) if t.typ == TokenType::Colon => self.index += 1,
            _ => {
                self.errors.push(ParseError::ExpectedColon);
                return;
            }
        }

        let id = self.graph.name_id(&subject.text);
        let already_defined = *self.def_check.get(&id).unwrap_or(&false);
        if already_defined {
            self.errors.push(ParseError::DuplicateDefinition(subject.text.clone()));
        } else {
            self.graph.add_edge(SyntaxGraph::START_ID, id, 1.0);
        }
        self.def_check.insert(id, true);
        self.graph.ensure_header(id);

        self.parse_alternatives(id, false);
    }

    /// Parses `Alternatives` rooted at `root` (a `HEADER` for a top-level
    /// rule, or the enclosing buffer node for a parenthesized
    /// sub-expression). Returns the `END` node id for this block, or `None`
    /// if parsing aborted before reaching a terminator.
    fn parse_alternatives(&mut self, root: u32, is_nested: bool) -> Option<u32> {
        let end_id = self.graph.new_end();
        let mut buffer = root;
        let mut start_buffer: Option<u32> = None;

        loop {
            let Some(tok) = self.curr() else {
                if is_nested {
                    self.errors.push(ParseError::UnmatchedOpenParen);
                }
                return None;
            };

            match tok.typ {
                TokenType::Identifier => {
                    let target = self.graph.name_id(&tok.text);
                    let prob = self.get_probability();
                    let ptr = self.graph.new_pointer(target);
                    self.graph.add_edge(buffer, ptr, prob);
                    let jump = self.graph.new_jump();
                    self.graph.add_edge(ptr, jump, 1.0);
                    start_buffer = Some(buffer);
                    buffer = jump;
                }
                TokenType::Character | TokenType::Regex => {
                    let is_char = tok.typ == TokenType::Character;
                    let prob = self.get_probability();
                    let leaf = if is_char {
                        self.graph.new_char(tok.text)
                    } else {
                        self.graph.new_regex(tok.text)
                    };
                    self.graph.add_edge(buffer, leaf, prob);
                    let jump = self.graph.new_jump();
                    self.graph.add_edge(leaf, jump, 1.0);
                    start_buffer = Some(buffer);
                    buffer = jump;
                }
                TokenType::Maybe => {
                    let p = self.get_probability();
                    match start_buffer {
                        Some(sb) => self.graph.add_edge(sb, buffer, 1.0 - p),
                        None => self.errors.push(ParseError::QuantifierWithoutAtom),
                    }
                }
                TokenType::OneOrMore => {
                    let p = self.get_probability();
                    match start_buffer {
                        Some(sb) => self.graph.add_edge(buffer, sb, p),
                        None => self.errors.push(ParseError::QuantifierWithoutAtom),
                    }
                }
                TokenType::AnyNo => {
                    let p = self.get_probability();
                    match start_buffer {
                        Some(sb) => {
                            self.graph.add_edge(sb, buffer, 1.0 - p);
                            self.graph.add_edge(buffer, sb, p);
                        }
                        None => self.errors.push(ParseError::QuantifierWithoutAtom),
                    }
                }
                TokenType::Infinite => {
                    let p = self.get_probability();
                    let _ = p; // the restart edge always carries weight 1
                    match start_buffer {
                        Some(sb) => self.graph.add_edge(end_id, sb, 1.0),
                        None => self.errors.push(ParseError::QuantifierWithoutAtom),
                    }
                }
                TokenType::Option => {
                    let p = self.get_probability();
                    self.graph.add_edge(buffer, end_id, p);
                    buffer = root;
                    start_buffer = None;
                }
                TokenType::Padding => {
                    // unlike `|`, a bare rule terminator carries no weight
                    // literal of its own — it always closes with weight 1.
                    self.graph.add_edge(buffer, end_id, 1.0);
                    self.index += 1;
                    if is_nested {
                        self.errors.push(ParseError::UnmatchedOpenParen);
                    }
                    return Some(end_id);
                }
                TokenType::BracOpen => {
                    self.index += 1;
                    let sub_entry = buffer;
                    if let Some(exit) = self.parse_alternatives(sub_entry, true) {
                        start_buffer = Some(buffer);
                        buffer = exit;
                    }
                }
                TokenType::BracClose => {
                    if is_nested {
                        self.graph.add_edge(buffer, end_id, 1.0);
                        self.index += 1;
                        return Some(end_id);
                    }
                    self.errors.push(ParseError::StrayCloseParen);
                    self.index += 1;
                }
                TokenType::Colon => {
                    self.errors.push(ParseError::MissingSemicolon);
                    return None;
                }
                TokenType::Probability => {
                    // a stray probability literal with nothing to weigh
                    self.index += 1;
                }
            }
        }
    }

    fn validate(&mut self) {
        let mut missing: Vec<String> = self
            .graph
            .name_map()
            .iter()
            .filter(|(_, id)| !*self.def_check.get(id).unwrap_or(&false))
            .map(|(name, _)| name.clone())
            .collect();
        missing.sort();
        for name in missing {
            self.errors.push(ParseError::MissingDefinition(name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scanner::extract_tokens;

    fn build(src: &str) -> (SyntaxGraph, Vec<ParseError>) {
        let (tokens, scan_errs) = extract_tokens(src);
        assert!(scan_errs.is_empty(), "unexpected scan errors: {:?}", scan_errs);
        GraphBuilder::new(tokens).build()
    }

    #[test]
    fn simple_rule_has_no_errors() {
        let (_graph, errs) = build("a : 'x' ;");
        assert!(errs.is_empty(), "{:?}", errs);
    }

    #[test]
    fn undefined_reference_is_reported() {
        let (_graph, errs) = build("a : b ;");
        assert!(matches!(&errs[..], [ParseError::MissingDefinition(name)] if name == "b"));
    }

    #[test]
    fn duplicate_definition_is_reported() {
        let (_graph, errs) = build("a : 'x' ; a : 'y' ;");
        assert!(errs
            .iter()
            .any(|e| matches!(e, ParseError::DuplicateDefinition(n) if n == "a")));
    }

    #[test]
    fn stray_close_paren_is_reported() {
        let (_graph, errs) = build("a : 'x' ) ;");
        assert!(errs.iter().any(|e| matches!(e, ParseError::StrayCloseParen)));
    }

    #[test]
    fn leading_quantifier_is_reported() {
        let (_graph, errs) = build("a : + 'x' ;");
        assert!(errs.iter().any(|e| matches!(e, ParseError::QuantifierWithoutAtom)));
    }
}
