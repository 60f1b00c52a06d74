//! SSE endpoint wrapping `ProgressPublisher::subscribe` (spec §4.8): each
//! JSON-encoded `SyncProgressUpdate` becomes one `data:` frame. Grounded in
//! the teacher pack's axum SSE handler shape
//! (`EffortlessMetrics-agent-backplane/crates/abp-daemon/src/lib.rs`'s
//! `cmd_run_events`), since the teacher itself has no SSE surface.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::StreamExt;

use crate::pubsub::ProgressPublisher;

pub async fn sync_job_events(
    publisher: Arc<ProgressPublisher>,
    sync_job_id: String,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let stream = match publisher.subscribe("sync_job", &sync_job_id).await {
        Ok(updates) => updates
            .map(|result| match result {
                Ok(update) => Event::default().json_data(&update).unwrap_or_else(|_| Event::default().data("{}")),
                Err(err) => Event::default().event("error").data(err.to_string()),
            })
            .map(Ok)
            .boxed(),
        Err(err) => {
            tracing::error!(sync_job_id = %sync_job_id, error = %err, "failed to subscribe to progress channel");
            futures::stream::once(async move { Ok(Event::default().event("error").data(err.to_string())) }).boxed()
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
