// Linear congruential generator parameters (Numerical Recipes)
const MUL: u32 = 1664525;
const INC: u32 = 1013904223;

/// Deterministic pseudo-random number stream.
///
/// A plain 32-bit linear congruential generator. All output is a pure
/// function of the seed: the same seed yields the same sequence of draws on
/// every platform, because state advancement uses only fixed-width integer
/// arithmetic with explicit wraparound and the float conversion is a single
/// exact multiply by `2^-32`.
#[derive(Clone, PartialEq, Eq)]
pub struct Rng {
    state: u32,
}

impl Rng {
    pub fn from_seed(seed: u64) -> Rng {
        // Spread the caller's seed over the whole 32-bit state space with a
        // splitmix64 finalizer, then fold the halves together. Nearby seeds
        // (0, 1, 2, ...) are the common case and must not produce correlated
        // streams.
        let mut z = seed.wrapping_add(0x9E3779B97F4A7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^= z >> 31;
        let state = ((z >> 32) ^ z) as u32;
        Rng { state }
    }

    /// Advances the state and returns it raw. Used to derive lattice-hash
    /// seeds for the noise field.
    pub fn bits(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(MUL).wrapping_add(INC);
        self.state
    }

    /// Picks a random value uniformly distributed between `0.0` (inclusive) and `1.0` (exclusive).
    pub fn rnd(&mut self) -> f64 {
        2.0f64.powi(-32) * f64::from(self.bits())
    }

    /// Picks a random value uniformly distributed between `min` (inclusive) and `max` (exclusive).
    pub fn uniform(&mut self, min: f64, max: f64) -> f64 {
        self.rnd() * (max - min) + min
    }

    /// Picks `true` with probability roughly `p`, or `false` otherwise.
    pub fn odds(&mut self, p: f64) -> bool {
        self.rnd() <= p
    }

    /// Chooses an item from `items` at a uniformly random index.
    ///
    /// # Panics
    ///
    /// Panics if `items.is_empty()`. Parameter validation rejects empty
    /// palettes before any renderer runs, so the public `draw` path never
    /// reaches this panic.
    pub fn choice<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        items
            .get((self.rnd() * items.len() as f64) as usize)
            .expect("no items")
    }

    /// Shuffles `xs` in place with a Fisher-Yates pass, consuming exactly
    /// `xs.len() - 1` uniform deviates (one per swap).
    pub fn shuffle<T>(&mut self, xs: &mut [T]) {
        for i in (1..xs.len()).rev() {
            let j = (self.rnd() * (i + 1) as f64) as usize;
            xs.swap(i, j);
        }
    }
}

impl std::fmt::Debug for Rng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rng {{ state: {:#010x} }}", self.state)
    }
}
