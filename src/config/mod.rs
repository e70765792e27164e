//! Configuration models for pool sizing, elasticity, and timeouts.

pub mod pool;

pub use pool::PoolConfig;
