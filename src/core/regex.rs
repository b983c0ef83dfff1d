use std::collections::HashMap;

use crate::core::prng::PRNG;

/// A handful of common character-class bodies that short-circuit to a
/// predefined token list instead of the per-rune biased walk, to make
/// generated identifiers and numbers look more natural. A quality heuristic,
/// not a correctness requirement — grounded in the original
/// implementation's `parseCharClass` alias table.
const DIGIT_ALIASES: &[&str] = &["0-9", "\\d"];
const WORD_ALIASES: &[&str] = &["a-zA-Z", "a-zA-Z0-9", "\\w", "A-Z", "a-z"];

pub(crate) const DIGIT_WORDS: &[&str] =
    &["42", "123", "7", "999", "256", "1024", "88", "13", "77", "101"];
const ENGLISH_WORDS: &[&str] = &[
    "hello", "world", "test", "code", "function", "variable", "class", "method", "data", "user",
    "admin", "login", "password", "email", "server", "client", "database", "table", "query",
    "result", "error", "success", "failure", "debug",
];

#[derive(Debug, Clone)]
struct CachedClass {
    cdf: Vec<f32>,
    runes: Vec<char>,
}

/// Precomputes biased cumulative distributions for character-class bodies
/// referenced from a grammar, so generation never expands/weighs a class at
/// walk time.
#[derive(Debug, Clone, Default)]
pub struct RegexCache {
    classes: HashMap<String, CachedClass>,
}

impl RegexCache {
    pub fn new() -> Self {
        RegexCache {
            classes: HashMap::new(),
        }
    }

    /// Expands `class` into its rune set, weighs each rune by letter
    /// frequency, and stores the resulting CDF keyed by the class's literal
    /// text. A no-op for the aliased classes in [`DIGIT_ALIASES`]/
    /// [`WORD_ALIASES`], which are served from a fixed word list instead.
    pub fn cache_class(&mut self, class: &str) {
        if DIGIT_ALIASES.contains(&class) || WORD_ALIASES.contains(&class) {
            return;
        }
        if self.classes.contains_key(class) {
            return;
        }
        let runes = expand_class(class);
        if runes.is_empty() {
            return;
        }
        let weights: Vec<f32> = runes.iter().map(|&r| bias(r) as f32).collect();
        let sum: f32 = weights.iter().sum();
        let mut cdf = Vec::with_capacity(weights.len());
        let mut running = 0.0f32;
        for w in &weights {
            running += w / sum;
            cdf.push(running);
        }
        if let Some(last) = cdf.last_mut() {
            *last = 1.0;
        }
        self.classes.insert(class.to_string(), CachedClass { cdf, runes });
    }

    /// Samples one string for the character class `class`, drawing a length
    /// uniformly in `[3, 7)` and one rune per position from the cached CDF
    /// (or the alias word list, for classes that have one).
    pub fn generate_string(&self, class: &str, prng: &mut PRNG) -> String {
        if DIGIT_ALIASES.contains(&class) {
            let idx = prng.random_int(0, DIGIT_WORDS.len() as i64) as usize;
            return DIGIT_WORDS[idx].to_string();
        }
        if WORD_ALIASES.contains(&class) {
            let idx = prng.random_int(0, ENGLISH_WORDS.len() as i64) as usize;
            return ENGLISH_WORDS[idx].to_string();
        }

        let Some(cached) = self.classes.get(class) else {
            return String::new();
        };
        let len = prng.random_int(3, 7) as usize;
        let mut out = String::with_capacity(len);
        for _ in 0..len {
            let x = prng.random() as f32;
            let idx = closest_index(&cached.cdf, x);
            out.push(cached.runes[idx]);
        }
        out
    }
}

fn expand_class(class: &str) -> Vec<char> {
    let runes: Vec<char> = class.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < runes.len() {
        if i + 2 < runes.len() && runes[i + 1] == '-' {
            let (lo, hi) = (runes[i], runes[i + 2]);
            if lo <= hi {
                out.extend(lo..=hi);
            }
            i += 3;
        } else {
            out.push(runes[i]);
            i += 1;
        }
    }
    out
}

fn bias(r: char) -> i32 {
    let lower = r.to_ascii_lowercase();
    match lower {
        'e' => 12,
        'a' | 'i' | 'o' => 9,
        'n' | 'r' | 't' | 's' | 'l' => 6,
        'c' | 'd' | 'm' | 'u' | 'p' | 'b' | 'g' => 4,
        'f' | 'h' | 'v' | 'k' | 'w' | 'y' => 3,
        'j' | 'x' | 'q' | 'z' => 1,
        _ => {
            if r.is_ascii_uppercase() {
                bias(lower) / 2
            } else if r.is_ascii_digit() {
                3
            } else if r == '_' {
                5
            } else {
                1
            }
        }
    }
}

fn closest_index(cdf: &[f32], x: f32) -> usize {
    cdf.iter()
        .position(|&v| x <= v)
        .unwrap_or(cdf.len().saturating_sub(1))
}
