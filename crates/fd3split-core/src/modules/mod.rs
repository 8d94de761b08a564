pub mod deck;
pub mod plan;
pub mod solver;
pub mod splits;
pub mod stitch;
