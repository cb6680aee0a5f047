/// Deterministic random numbers for scene placement

const FALLBACK_SEED: u32 = 0xDEAD_BEEF;

/// xorshift32 generator. The same seed always yields the same sequence.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    state: u32,
}

impl SeededRandom {
    pub fn new(seed: u32) -> Self {
        // xorshift never leaves the all-zero state
        let state = if seed == 0 { FALLBACK_SEED } else { seed };
        Self { state }
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 17;
        self.state ^= self.state << 5;
        self.state
    }

    /// Uniform in `[0, 1)`
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 * (1.0 / 16_777_216.0)
    }

    /// Uniform in `[-range / 2, range / 2]`
    pub fn float_spread(&mut self, range: f32) -> f32 {
        range * (0.5 - self.next_f32())
    }
}
