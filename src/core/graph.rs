use std::collections::HashMap;

use crate::core::node::{NodeKind, SyntaxNode};
use crate::core::regex::RegexCache;

/// The first structural (non-leaf) id handed out; ids `0..FIRST_STRUCT_ID`
/// are reserved (`0` is [`SyntaxGraph::START_ID`]).
const FIRST_STRUCT_ID: u32 = 1000;

/// A directed multigraph over a grammar's rules.
///
/// Ids are allocated from two disjoint ranges so a node's numeric id alone
/// tells you whether it is structural or a content leaf: call-site and
/// control-flow nodes (`HEADER`, `JUMP`, `END`, `POINTER`) grow upward from
/// [`FIRST_STRUCT_ID`]; `CHAR`/`REGEX` leaves grow downward from `u32::MAX`.
/// Edges everywhere are plain `u32` ids into `nodes`, never pointers, so the
/// whole graph can be normalized in place and then shared across generator
/// threads behind a single `Arc` with no per-node synchronization.
pub struct SyntaxGraph {
    nodes: HashMap<u32, SyntaxNode>,
    name_map: HashMap<String, u32>,
    char_map: HashMap<u32, String>,
    regex_cache: RegexCache,
    next_struct_id: u32,
    next_content_id: u32,
}

impl SyntaxGraph {
    pub const START_ID: u32 = 0;

    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(Self::START_ID, SyntaxNode::new(Self::START_ID, NodeKind::Start));
        SyntaxGraph {
            nodes,
            name_map: HashMap::new(),
            char_map: HashMap::new(),
            regex_cache: RegexCache::new(),
            next_struct_id: FIRST_STRUCT_ID,
            next_content_id: u32::MAX,
        }
    }

    fn alloc_struct_id(&mut self) -> u32 {
        self.next_struct_id += 1;
        self.next_struct_id
    }

    fn alloc_content_id(&mut self) -> u32 {
        self.next_content_id = self.next_content_id.wrapping_sub(1);
        self.next_content_id
    }

    /// Returns the id for a nonterminal `name`, allocating a fresh structural
    /// id (and recording the name) the first time it is seen. Does not by
    /// itself create the `HEADER` node — a name can be referenced before its
    /// rule is defined.
    pub fn name_id(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.name_map.get(name) {
            return id;
        }
        let id = self.alloc_struct_id();
        self.name_map.insert(name.to_string(), id);
        id
    }

    pub fn has_header(&self, id: u32) -> bool {
        matches!(self.nodes.get(&id), Some(n) if n.kind == NodeKind::Header)
    }

    pub fn ensure_header(&mut self, id: u32) {
        self.nodes
            .entry(id)
            .or_insert_with(|| SyntaxNode::new(id, NodeKind::Header));
    }

    pub fn new_jump(&mut self) -> u32 {
        let id = self.alloc_struct_id();
        self.nodes.insert(id, SyntaxNode::new(id, NodeKind::Jump));
        id
    }

    pub fn new_end(&mut self) -> u32 {
        let id = self.alloc_struct_id();
        self.nodes.insert(id, SyntaxNode::new(id, NodeKind::End));
        id
    }

    pub fn new_pointer(&mut self, target: u32) -> u32 {
        let id = self.alloc_struct_id();
        let mut node = SyntaxNode::new(id, NodeKind::Pointer);
        node.pointer = target;
        self.nodes.insert(id, node);
        id
    }

    pub fn new_char(&mut self, text: String) -> u32 {
        let id = self.alloc_content_id();
        self.char_map.insert(id, text);
        self.nodes.insert(id, SyntaxNode::new(id, NodeKind::Char));
        id
    }

    pub fn new_regex(&mut self, text: String) -> u32 {
        let id = self.alloc_content_id();
        self.regex_cache.cache_class(&text);
        self.char_map.insert(id, text);
        self.nodes.insert(id, SyntaxNode::new(id, NodeKind::Regex));
        id
    }

    pub fn add_edge(&mut self, from: u32, to: u32, weight: f32) {
        if let Some(node) = self.nodes.get_mut(&from) {
            node.add_edge(to, weight);
        }
    }

    pub fn name_map(&self) -> &HashMap<String, u32> {
        &self.name_map
    }

    pub fn char_map(&self) -> &HashMap<u32, String> {
        &self.char_map
    }

    pub fn regex_cache(&self) -> &RegexCache {
        &self.regex_cache
    }

    pub fn node(&self, id: u32) -> Option<&SyntaxNode> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.nodes.values()
    }

    /// Converts each node's sibling edge weights into a cumulative
    /// distribution. A node whose edges all sum to zero falls back to a
    /// uniform split rather than producing NaNs.
    pub fn normalize(&mut self) {
        for node in self.nodes.values_mut() {
            if node.next.is_empty() {
                continue;
            }
            let sum: f32 = node.next.iter().map(|e| e.weight).sum();
            let mut cf = Vec::with_capacity(node.next.len());
            let mut running = 0.0f32;
            if sum <= 0.0 {
                let share = 1.0 / node.next.len() as f32;
                for _ in &node.next {
                    running += share;
                    cf.push(running);
                }
            } else {
                for edge in &node.next {
                    running += edge.weight / sum;
                    cf.push(running);
                }
            }
            if let Some(last) = cf.last_mut() {
                *last = 1.0;
            }
            node.cf = cf;
        }
    }
}

impl Default for SyntaxGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_id_spaces() {
        let mut g = SyntaxGraph::new();
        let struct_id = g.new_jump();
        let content_id = g.new_char("x".into());
        assert_ne!(struct_id, content_id);
        assert!(struct_id >= FIRST_STRUCT_ID);
        assert!(content_id > u32::MAX - 10);
    }

    #[test]
    fn normalize_produces_nondecreasing_cf_summing_to_one() {
        let mut g = SyntaxGraph::new();
        let a = g.new_end();
        let b = g.new_jump();
        let c = g.new_jump();
        g.add_edge(a, b, 1.0);
        g.add_edge(a, c, 3.0);
        g.normalize();
        let node = g.node(a).unwrap();
        assert_eq!(node.cf.len(), 2);
        assert!(node.cf[0] <= node.cf[1]);
        assert!((node.cf[1] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn normalize_zero_sum_falls_back_to_uniform() {
        let mut g = SyntaxGraph::new();
        let a = g.new_end();
        let b = g.new_jump();
        let c = g.new_jump();
        g.add_edge(a, b, 0.0);
        g.add_edge(a, c, 0.0);
        g.normalize();
        let node = g.node(a).unwrap();
        assert!((node.cf[0] - 0.5).abs() < 1e-5);
        assert!((node.cf[1] - 1.0).abs() < 1e-5);
    }
}
