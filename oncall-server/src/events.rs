// oncall-server/src/events.rs
// ============================================================================
// Module: Live Log Stream
// Description: GET /events Server-Sent Events route.
// Purpose: Implement the §6 "live log stream" push channel.
// Dependencies: axum, tokio-stream, oncall-core
// ============================================================================

//! ## Overview
//! Delivery is at-most-once, per §6: a subscriber that misses events (either
//! by connecting late or lagging behind the broadcast channel's buffer)
//! simply resumes from whatever arrives next, and is expected to refresh its
//! view from `GET /incidents/:id` and the audit routes rather than replay
//! history through this stream.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::Sse;
use axum::response::sse::Event;
use axum::response::sse::KeepAlive;
use futures::Stream;
use futures::StreamExt;
use oncall_core::LiveLogEvent;
use tokio_stream::wrappers::BroadcastStream;

use crate::state::AppState;

// ============================================================================
// SECTION: Route
// ============================================================================

/// `GET /events`.
pub async fn stream(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.live_log.subscribe();
    let events = BroadcastStream::new(receiver).filter_map(render);
    Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

/// Renders one broadcast item as an SSE event, dropping lag notifications
/// (the subscriber already knows delivery is at-most-once).
async fn render(
    item: Result<LiveLogEvent, tokio_stream::wrappers::errors::BroadcastStreamRecvError>,
) -> Option<Result<Event, Infallible>> {
    let event = item.ok()?;
    serde_json::to_string(&event).ok().map(|payload| Ok(Event::default().event("live-log").data(payload)))
}
