//! Fixtures for exercising the driver without a database.

mod memory_engine;

pub use memory_engine::MemoryEngine;
