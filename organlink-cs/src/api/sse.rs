//! Server-Sent Events endpoint

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures::stream::Stream;

use crate::AppState;

/// GET /api/events
///
/// Streams every `OrganLinkEvent` to the client as a tagged SSE event,
/// with a keep-alive so dashboards can hold the connection open.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    organlink_common::sse::create_event_sse_stream("organlink-cs", &state.event_bus)
}
