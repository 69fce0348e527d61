//! Deterministic, portable pseudo-random number generator.
//!
//! Implements Mulberry32: a 32-bit additive counter scrambled by two
//! xorshift-multiply rounds. Every puzzle variant in a playthrough is drawn
//! from one `SeededRandom`, so identical seeds and identical call sequences
//! produce identical output on every platform. Nothing in this module may
//! read ambient entropy.

use serde::{Deserialize, Serialize};

/// Additive constant folded into the state on every draw.
const INCREMENT: u32 = 0x6D2B_79F5;

/// 2^32, used to normalize a `u32` into [0, 1).
const TWO_POW_32: f64 = 4_294_967_296.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeededRandom {
    state: u32,
}

impl SeededRandom {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Current internal state. Restoring it with [`SeededRandom::new`]
    /// resumes the sequence from this point.
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Generate the next raw `u32` in the sequence.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Generate a uniform `f64` in [0, 1).
    pub fn next(&mut self) -> f64 {
        f64::from(self.next_u32()) / TWO_POW_32
    }

    /// Uniform integer in `[min, max]`, inclusive on both ends.
    pub fn next_int(&mut self, min: i64, max: i64) -> i64 {
        (self.next() * (max - min + 1) as f64).floor() as i64 + min
    }

    /// Uniform `usize` in `[min, max]`, inclusive on both ends.
    pub fn next_usize(&mut self, min: usize, max: usize) -> usize {
        self.next_int(min as i64, max as i64) as usize
    }

    /// Uniform float in `[min, max)`.
    pub fn next_float(&mut self, min: f64, max: f64) -> f64 {
        self.next() * (max - min) + min
    }

    /// Index in `[0, len)`.
    fn index(&mut self, len: usize) -> usize {
        (self.next() * len as f64).floor() as usize
    }

    /// Fisher-Yates shuffle in place, walking from the last element down.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.index(i + 1);
            items.swap(i, j);
        }
    }

    /// Return a shuffled copy of `items`.
    pub fn shuffled<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        let mut out = items.to_vec();
        self.shuffle(&mut out);
        out
    }

    /// Pick one element uniformly.
    ///
    /// Panics if `items` is empty.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        assert!(!items.is_empty(), "pick: items must not be empty");
        &items[self.index(items.len())]
    }
}
