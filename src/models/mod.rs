pub mod distribution;
pub mod shot;
pub mod trend;
pub mod zone;
