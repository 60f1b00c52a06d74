pub mod config;
pub mod error;
pub mod retry;

pub use config::{init_tracing, Config};
pub use error::{root_cause, AirweaveError};
