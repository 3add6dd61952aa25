use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json,
};
use turnstile_core::NewSeat;

use crate::{
    context::ServerContext,
    errors::ServerResult,
    schemas::{
        ConfirmBookingSchema, RegisterConcertSchema, SelectSeatsSchema, SessionQuery,
        ValidatedJson,
    },
    serialized::{Booking, Seat, ToSerialized},
    sse, Router,
};

#[utoipa::path(
    post,
    path = "/v1/concerts",
    tag = "concerts",
    request_body = RegisterConcertSchema,
    responses(
        (status = 200, description = "The concert's seat map was registered")
    )
)]
async fn register_concert(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<RegisterConcertSchema>,
) -> ServerResult<()> {
    let seats = body
        .seats
        .into_iter()
        .map(|seat| NewSeat {
            id: seat.id,
            row: seat.row,
            column: seat.column,
            tier: seat.tier.into(),
        })
        .collect();

    context.box_office.register_concert(body.concert_id, seats)?;

    Ok(())
}

#[utoipa::path(
    get,
    path = "/v1/concerts/{id}/seats",
    tag = "concerts",
    params(
        ("id" = i32, Path, description = "The concert to fetch seats for")
    ),
    responses(
        (status = 200, body = Vec<Seat>)
    )
)]
async fn seats(
    State(context): State<ServerContext>,
    Path(concert_id): Path<i32>,
) -> ServerResult<Json<Vec<Seat>>> {
    let seats = context.box_office.seats_of(concert_id)?;

    Ok(Json(seats.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/concerts/{id}/selection",
    tag = "concerts",
    request_body = SelectSeatsSchema,
    params(
        ("id" = i32, Path, description = "The concert to select seats in")
    ),
    responses(
        (status = 200, description = "Every requested seat is now held", body = Vec<Seat>),
        (status = 409, description = "A seat was taken, nothing is held")
    )
)]
async fn select_seats(
    State(context): State<ServerContext>,
    Path(concert_id): Path<i32>,
    ValidatedJson(body): ValidatedJson<SelectSeatsSchema>,
) -> ServerResult<Json<Vec<Seat>>> {
    let held =
        context
            .box_office
            .coordinator
            .select_seats(concert_id, body.seat_ids, &body.session_id)?;

    Ok(Json(held.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/v1/concerts/{id}/selection",
    tag = "concerts",
    params(
        ("id" = i32, Path, description = "The concert the selection belongs to"),
        ("sessionId" = String, Query, description = "The session cancelling its selection")
    ),
    responses(
        (status = 200, description = "All held seats were released")
    )
)]
async fn cancel_selection(
    State(context): State<ServerContext>,
    Path(concert_id): Path<i32>,
    Query(query): Query<SessionQuery>,
) -> ServerResult<()> {
    context
        .box_office
        .coordinator
        .cancel_selection(concert_id, &query.session_id)?;

    Ok(())
}

#[utoipa::path(
    post,
    path = "/v1/concerts/{id}/bookings",
    tag = "concerts",
    request_body = ConfirmBookingSchema,
    params(
        ("id" = i32, Path, description = "The concert to book seats in")
    ),
    responses(
        (status = 200, body = Booking),
        (status = 402, description = "Payment was declined, all holds released"),
        (status = 409, description = "A hold lapsed, the attempt was rolled back")
    )
)]
async fn confirm_booking(
    State(context): State<ServerContext>,
    Path(concert_id): Path<i32>,
    ValidatedJson(body): ValidatedJson<ConfirmBookingSchema>,
) -> ServerResult<Json<Booking>> {
    let booking = context
        .box_office
        .coordinator
        .confirm_booking(concert_id, &body.session_id, body.payment_ref)
        .await?;

    Ok(Json(booking.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/concerts/{id}/bookings",
    tag = "concerts",
    params(
        ("id" = i32, Path, description = "The concert to list bookings for")
    ),
    responses(
        (status = 200, body = Vec<Booking>)
    )
)]
async fn bookings(
    State(context): State<ServerContext>,
    Path(concert_id): Path<i32>,
) -> ServerResult<Json<Vec<Booking>>> {
    // 404 for unregistered concerts, an empty ledger otherwise
    context.box_office.seating().context().concert(concert_id)?;

    let bookings = context.box_office.coordinator.bookings_for(concert_id);

    Ok(Json(bookings.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/", post(register_concert))
        .route("/:id/seats", get(seats))
        .route("/:id/selection", post(select_seats))
        .route("/:id/selection", delete(cancel_selection))
        .route("/:id/bookings", post(confirm_booking))
        .route("/:id/bookings", get(bookings))
        .route("/:id/events", get(sse::event_stream))
}
