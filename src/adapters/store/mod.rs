//! Feature and job store adapters

pub mod factory;
pub mod memory;
pub mod postgres;
pub mod traits;

pub use factory::create_stores;
pub use memory::MemoryStore;
pub use traits::{FeatureStore, HeightUpdate, JobStore};
