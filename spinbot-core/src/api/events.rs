//! Live subscriber channel over Server-Sent Events.
//!
//! GET /api/events
//!
//! The first event is `initial-data` (recent lists and stats for all three
//! logs); every bus notification follows under its category name. There is
//! no replay: a client that reconnects gets a fresh snapshot and nothing in
//! between.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tracing::debug;

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::eventbus::BotEvent;

pub const INITIAL_DATA_EVENT: &str = "initial-data";

pub async fn events_handler(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    // Subscribe before taking the snapshot so nothing falls in between.
    let rx = state.event_bus.subscribe(None).await;
    let snapshot = state.donations.snapshot().await?;
    let initial = Event::default()
        .event(INITIAL_DATA_EVENT)
        .data(serde_json::to_string(&snapshot).map_err(crate::Error::from)?);
    debug!("Live subscriber connected");

    let updates = ReceiverStream::new(rx).map(|event| Ok::<_, Infallible>(to_sse_event(&event)));
    let stream = tokio_stream::once(Ok::<_, Infallible>(initial)).chain(updates);

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

pub fn to_sse_event(event: &BotEvent) -> Event {
    Event::default()
        .event(event.event_type())
        .data(event.payload().to_string())
}
