pub mod cli;
pub mod report;
pub mod rng;
pub mod runner;
pub mod scenes;
