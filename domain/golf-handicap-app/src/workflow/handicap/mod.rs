pub mod audit;
pub mod recompute;
