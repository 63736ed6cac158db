//! Fan demand and output shaping.

pub mod demand;
pub mod pid;
pub mod shaper;
