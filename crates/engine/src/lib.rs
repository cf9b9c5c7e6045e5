pub mod cell;
pub mod dep_graph;
pub mod engine;
pub mod error;
pub mod events;
pub mod formula;
pub mod grid;
pub mod loc;
pub mod recalc;

#[cfg(test)]
pub mod harness;
