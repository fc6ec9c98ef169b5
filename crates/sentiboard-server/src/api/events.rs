//! Server-sent event stream of dashboard updates.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::future::ready;
use futures::stream::{self, Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;

use crate::publisher::DashboardEvent;

use super::AppState;

/// GET /api/v1/events
///
/// New subscribers first receive the current snapshot (and the startup error
/// when degraded), then every broadcast event.
pub(super) async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Subscribe before taking the snapshot so no broadcast falls in between.
    let rx = state.publisher.subscribe();

    let mut initial = vec![DashboardEvent::Update(Arc::new(state.aggregator.snapshot()))];
    if let Some(reason) = &state.init_error {
        initial.push(DashboardEvent::InitializationError(reason.to_string()));
    }
    tracing::debug!(
        subscribers = state.publisher.subscriber_count(),
        "SSE client connected"
    );

    let live = BroadcastStream::new(rx).filter_map(|result| {
        ready(match result {
            Ok(event) => encode(&event),
            Err(e) => {
                tracing::warn!(error = %e, "SSE subscriber lagged");
                None
            }
        })
    });
    let stream = stream::iter(initial)
        .filter_map(|event| ready(encode(&event)))
        .chain(live);

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn encode(event: &DashboardEvent) -> Option<Result<Event, Infallible>> {
    match event.to_sse() {
        Ok(frame) => Some(Ok(frame)),
        Err(e) => {
            tracing::warn!(event = event.name(), error = %e, "failed to encode SSE event");
            None
        }
    }
}
