pub mod graph;
pub mod ids;
pub mod model;
pub mod rng;
