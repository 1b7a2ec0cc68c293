pub mod kernel;
pub mod schedule;
