//! Winter Kindling: seeded puzzles and chapter progression for a two-role
//! branching narrative game.
//!
//! A playthrough derives one 32-bit seed at start. Every puzzle variant is
//! drawn from a single Mulberry32 stream seeded with it, so a stored seed
//! and the same sequence of level loads reproduce the same puzzles. The
//! story itself is a read-only RON table; the crate walks it chapter by
//! chapter, records choices and picks one of five endings.

pub mod core;
pub mod schema;

pub use crate::core::controller::{GameController, GameSettings, Phase};
pub use crate::core::generator::ProceduralGenerator;
pub use crate::core::progression::ProgressionState;
pub use crate::core::rng::SeededRandom;
pub use crate::schema::difficulty::{Difficulty, Position, Role};
pub use crate::schema::narrative::NarrativeTable;
pub use crate::schema::puzzle::{Archetype, PuzzleVariant};
