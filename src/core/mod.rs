pub mod achievements;
pub mod cipher;
pub mod clock;
pub mod controller;
pub mod ending;
pub mod events;
pub mod generator;
pub mod grid;
pub mod hints;
pub mod multiplayer;
pub mod persistence;
pub mod progression;
pub mod rng;
