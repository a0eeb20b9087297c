use chrono::NaiveDateTime;

use crate::schema::rsvps;

#[derive(Insertable)]
#[diesel(table_name = rsvps)]
pub struct NewRsvp {
  pub user_id: i64,
  pub event_id: i64,
  pub registered_at: NaiveDateTime,
}

#[derive(Deserialize)]
pub struct CreateRsvpRequest {
  pub event_id: Option<i64>,
  pub registered_at: Option<String>,
}

#[derive(Deserialize)]
pub struct CheckRsvpRequest {
  pub event_id: Option<i64>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpCreated {
  pub rsvp_id: i64,
  pub message: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpCount {
  pub event_id: i64,
  pub rsvp_count: i64,
}

#[derive(Serialize, Deserialize)]
pub struct RsvpCheck {
  pub rsvped: bool,
}

/// Why an RSVP could not be recorded.
#[derive(Debug, PartialEq)]
pub enum RsvpRejection {
  UnknownEvent,
  AlreadyRegistered,
  AtCapacity,
}
