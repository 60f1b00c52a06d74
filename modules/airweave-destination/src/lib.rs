//! The Destination Adapter component (spec §4.3 / C4): a pluggable sink
//! behind a uniform trait, plus the shrink-on-failure batching policy the
//! orchestrator drives it through.

pub mod adapter;
pub mod batch;
pub mod mock;
pub mod registry;
pub mod types;

pub use adapter::DestinationAdapter;
pub use batch::{bulk_insert_with_shrink, BulkInsertOutcome};
pub use mock::MockDestination;
pub use registry::{DestinationAdapterFactory, DestinationAdapterRegistry};
pub use types::{DecayConfig, SearchHit, VectorRecord};
