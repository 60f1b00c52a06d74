mod pubsub;
mod sse;
mod types;

pub use pubsub::{channel_name, ProgressPublisher};
pub use sse::sync_job_events;
pub use types::SyncProgressUpdate;
