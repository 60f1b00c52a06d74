pub mod adapter;
pub mod adapters;
pub mod mock;
pub mod produced;
pub mod registry;

pub use adapter::{EntityStream, SourceAdapter};
pub use adapters::http_page::{HttpPageAdapter, HttpPageAdapterConfig};
pub use mock::MockSourceAdapter;
pub use produced::ProducedEntity;
pub use registry::{AdapterFactory, SourceAdapterRegistry};
