use rand::Rng;

/// A seedable xorshift64 pseudorandom source.
///
/// Two `PRNG`s constructed with the same nonzero seed produce identical
/// sequences from `random`/`random_int`; a seed of `0` draws a fresh seed
/// from the system entropy source instead, so concurrent callers asking for
/// non-deterministic output still get independent streams.
pub struct PRNG {
    seed: u64,
    state: u64,
}

impl PRNG {
    pub fn new(seed: u64) -> Self {
        let mut prng = PRNG { seed: 0, state: 0 };
        if seed == 0 {
            prng.generate_seed();
        } else {
            prng.set_seed(seed);
        }
        prng
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
        self.state = seed;
    }

    pub fn generate_seed(&mut self) {
        let mut rng = rand::rng();
        let value: u64 = rng.random();
        // xorshift64 can't recover from a zero state, and a literal zero
        // would also collide with the "0 means non-deterministic" convention.
        let value = if value == 0 { 1 } else { value };
        self.seed = value;
        self.state = value;
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// A uniform float in `[0, 1)` built from the top 53 bits of `next_u64`.
    pub fn random(&mut self) -> f64 {
        let top53 = self.next_u64() >> 11;
        top53 as f64 / (1u64 << 53) as f64
    }

    /// `lo` if `hi <= lo`, else `lo + floor(random() * (hi - lo))`.
    pub fn random_int(&mut self, lo: i64, hi: i64) -> i64 {
        if hi <= lo {
            return lo;
        }
        lo + (self.random() * (hi - lo) as f64).floor() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = PRNG::new(42);
        let mut b = PRNG::new(42);
        for _ in 0..100 {
            assert_eq!(a.random(), b.random());
        }
    }

    #[test]
    fn random_in_unit_interval() {
        let mut p = PRNG::new(7);
        for _ in 0..1000 {
            let x = p.random();
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn random_int_degenerate_range() {
        let mut p = PRNG::new(1);
        assert_eq!(p.random_int(5, 5), 5);
        assert_eq!(p.random_int(5, 2), 5);
    }

    #[test]
    fn random_int_within_range() {
        let mut p = PRNG::new(9);
        for _ in 0..1000 {
            let v = p.random_int(3, 7);
            assert!((3..7).contains(&v));
        }
    }

    #[test]
    fn zero_seed_is_nonzero_state() {
        let p = PRNG::new(0);
        assert_ne!(p.seed(), 0);
    }
}
