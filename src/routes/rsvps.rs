use chrono::Utc;
use rocket::{http::Status, response::status::Custom, serde::json::Json, Route};

use crate::{
  db_util::rsvps::{count_rsvps, create_rsvp, has_rsvped},
  error::{ApiError, ApiResult},
  models::{
    event::parse_event_datetime,
    rsvp::{CheckRsvpRequest, CreateRsvpRequest, RsvpCheck, RsvpCount, RsvpCreated, RsvpRejection},
    user::AuthenticatedUser,
  },
  EventBoardDbConn,
};

pub fn routes() -> Vec<Route> {
  routes![create, rsvp_count, check]
}

fn required_event_id(event_id: Option<i64>) -> ApiResult<i64> {
  event_id.ok_or_else(|| ApiError::validation("\"event_id\" is required"))
}

#[post("/", data = "<rsvp_request>")]
pub async fn create(
  conn: EventBoardDbConn,
  caller: Result<AuthenticatedUser, ApiError>,
  rsvp_request: Json<CreateRsvpRequest>,
) -> ApiResult<Custom<Json<RsvpCreated>>> {
  let AuthenticatedUser(caller) = caller?;
  let CreateRsvpRequest {
    event_id,
    registered_at,
  } = rsvp_request.into_inner();
  let event_id = required_event_id(event_id)?;
  let registered_at = match registered_at {
    Some(raw) => parse_event_datetime(&raw)
      .ok_or_else(|| ApiError::validation("\"registered_at\" must be a valid date"))?,
    None => Utc::now().naive_utc(),
  };

  let user_id = caller.id;
  let rsvp_id = conn
    .run(move |conn| create_rsvp(conn, user_id, event_id, registered_at))
    .await?
    .map_err(|rejection| match rejection {
      RsvpRejection::UnknownEvent => ApiError::not_found("Event not found."),
      RsvpRejection::AlreadyRegistered =>
        ApiError::validation("You have already RSVPed to this event."),
      RsvpRejection::AtCapacity => ApiError::validation("This event is fully booked."),
    })?;
  info!("User {} RSVPed to event {}", user_id, event_id);

  Ok(Custom(
    Status::Created,
    Json(RsvpCreated {
      rsvp_id,
      message: String::from("RSVP created successfully."),
    }),
  ))
}

#[get("/<event_id>")]
pub async fn rsvp_count(conn: EventBoardDbConn, event_id: i64) -> ApiResult<Json<RsvpCount>> {
  let rsvp_count = conn.run(move |conn| count_rsvps(conn, event_id)).await?;
  Ok(Json(RsvpCount {
    event_id,
    rsvp_count,
  }))
}

#[post("/check", data = "<check_request>")]
pub async fn check(
  conn: EventBoardDbConn,
  caller: Result<AuthenticatedUser, ApiError>,
  check_request: Json<CheckRsvpRequest>,
) -> ApiResult<Json<RsvpCheck>> {
  let AuthenticatedUser(caller) = caller?;
  let event_id = required_event_id(check_request.into_inner().event_id)?;

  let user_id = caller.id;
  let rsvped = conn
    .run(move |conn| has_rsvped(conn, user_id, event_id))
    .await?;
  Ok(Json(RsvpCheck { rsvped }))
}
