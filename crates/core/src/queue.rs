//! Piece queue - seeded 7-bag shape generation
//!
//! Every participant in a match runs the same queue from the same seed, so
//! the upcoming-shape sequence is identical on the server and on every
//! client without further coordination. The generator is a plain LCG rather
//! than an ambient RNG for exactly that reason.

use std::collections::VecDeque;

use gridfall_types::PieceKind;

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        self.next_u32() % max
    }

    /// Shuffle a slice using Fisher-Yates
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_range((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }
}

/// 7-bag piece generator with an arbitrarily deep preview window.
#[derive(Debug, Clone)]
pub struct PieceQueue {
    upcoming: VecDeque<PieceKind>,
    rng: SimpleRng,
}

impl PieceQueue {
    /// Create a new piece queue with the given seed
    pub fn new(seed: u32) -> Self {
        let mut queue = Self {
            upcoming: VecDeque::with_capacity(14),
            rng: SimpleRng::new(seed),
        };
        queue.push_bag();
        queue
    }

    /// Append one freshly shuffled bag of all seven shapes
    fn push_bag(&mut self) {
        let mut bag = PieceKind::BAG;
        self.rng.shuffle(&mut bag);
        self.upcoming.extend(bag);
    }

    /// Draw the next shape from the front of the queue
    pub fn draw(&mut self) -> PieceKind {
        if self.upcoming.is_empty() {
            self.push_bag();
        }
        self.upcoming
            .pop_front()
            .expect("queue was just refilled with a full bag")
    }

    /// The next `count` upcoming shapes, in draw order.
    ///
    /// Extends the generated sequence as needed, which is why this takes
    /// `&mut self`; peeking never changes what `draw` will return.
    pub fn preview(&mut self, count: usize) -> Vec<PieceKind> {
        while self.upcoming.len() < count {
            self.push_bag();
        }
        self.upcoming.iter().take(count).copied().collect()
    }
}
