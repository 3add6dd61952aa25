use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::Stream;
use serde::Serialize;
use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
};
use turnstile_booking::{BoxOfficeEvent, RoomConnectionHandle};
use utoipa::ToSchema;

use crate::{
    context::ServerContext,
    errors::ServerResult,
    serialized::{SeatStatus, ToSerialized},
};

/// A single entry in a concert's real-time event stream.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum ServerEvent {
    /// A seat's status changed.
    #[serde(rename_all = "camelCase")]
    SeatUpdate {
        seat_id: String,
        status: SeatStatus,
        /// The session holding the seat, present while it is locked.
        #[serde(skip_serializing_if = "Option::is_none")]
        locked_by: Option<String>,
    },
    /// A booking was finalized.
    #[serde(rename_all = "camelCase")]
    BookingConfirmed {
        seat_ids: Vec<String>,
        reference: String,
    },
}

impl From<BoxOfficeEvent> for ServerEvent {
    fn from(value: BoxOfficeEvent) -> Self {
        match value {
            BoxOfficeEvent::SeatUpdate {
                seat_id,
                status,
                locked_by,
                ..
            } => Self::SeatUpdate {
                seat_id,
                status: status.to_serialized(),
                locked_by,
            },
            BoxOfficeEvent::BookingConfirmed {
                seat_ids,
                reference,
                ..
            } => Self::BookingConfirmed {
                seat_ids,
                reference,
            },
        }
    }
}

/// Adapts a room subscription into an SSE body. Dropping the stream, e.g.
/// when the client disconnects, drops the subscription with it.
pub struct EventStream {
    inner: RoomConnectionHandle,
}

impl Stream for EventStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let inner = &mut self.get_mut().inner;

        Pin::new(inner).poll_next(cx).map(|next| {
            next.map(|event| {
                let payload = serde_json::to_string(&ServerEvent::from(event))
                    .expect("serializes properly");

                Ok(Event::default().data(payload))
            })
        })
    }
}

#[utoipa::path(
    get,
    path = "/v1/concerts/{id}/events",
    tag = "concerts",
    params(
        ("id" = i32, Path, description = "The concert to subscribe to")
    ),
    responses(
        (
            status = 200,
            content_type = "text/event-stream",
            description = "A stream of seat updates for one concert",
            body = ServerEvent
        )
    )
)]
pub async fn event_stream(
    State(context): State<ServerContext>,
    Path(concert_id): Path<i32>,
) -> ServerResult<Sse<EventStream>> {
    let handle = context.box_office.rooms.join(concert_id)?;

    Ok(Sse::new(EventStream { inner: handle }).keep_alive(KeepAlive::default()))
}
