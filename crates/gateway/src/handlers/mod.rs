//! API handlers module

pub mod articles;
pub mod conferences;
pub mod health;
pub mod metrics;
