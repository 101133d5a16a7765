// Module declarations
pub mod ids;
pub mod persistence;

// Re-export all implementations
pub use ids::ClockIdGenerator;
pub use persistence::{InMemoryStoreRepository, JsonFileStoreRepository};
