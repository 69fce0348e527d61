pub mod choice;
pub mod difficulty;
pub mod narrative;
pub mod puzzle;
