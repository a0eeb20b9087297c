use chrono::NaiveDateTime;
use diesel::{dsl::count_star, prelude::*, QueryResult, SqliteConnection};

use crate::{
  db_util::last_inserted_id,
  models::rsvp::{NewRsvp, RsvpRejection},
  schema::{events, rsvps},
};

pub fn count_rsvps(conn: &mut SqliteConnection, event_id: i64) -> QueryResult<i64> {
  rsvps::table
    .filter(rsvps::dsl::event_id.eq(event_id))
    .select(count_star())
    .get_result(conn)
}

pub fn has_rsvped(conn: &mut SqliteConnection, user_id: i64, event_id: i64) -> QueryResult<bool> {
  diesel::select(diesel::dsl::exists(
    rsvps::table
      .filter(rsvps::dsl::user_id.eq(user_id))
      .filter(rsvps::dsl::event_id.eq(event_id)),
  ))
  .get_result(conn)
}

/// Registers `user_id` for the event if it has room left. The capacity check and the insert run
/// in one transaction so concurrent registrations can't overfill an event.
pub fn create_rsvp(
  conn: &mut SqliteConnection,
  user_id: i64,
  event_id: i64,
  registered_at: NaiveDateTime,
) -> QueryResult<Result<i64, RsvpRejection>> {
  conn.immediate_transaction(|conn| {
    let max_capacity: Option<Option<i32>> = events::table
      .find(event_id)
      .select(events::dsl::max_capacity)
      .first(conn)
      .optional()?;
    let max_capacity = match max_capacity {
      Some(max_capacity) => max_capacity,
      None => return Ok(Err(RsvpRejection::UnknownEvent)),
    };

    if has_rsvped(conn, user_id, event_id)? {
      return Ok(Err(RsvpRejection::AlreadyRegistered));
    }
    if let Some(max_capacity) = max_capacity {
      if count_rsvps(conn, event_id)? >= i64::from(max_capacity) {
        return Ok(Err(RsvpRejection::AtCapacity));
      }
    }

    diesel::insert_into(rsvps::table)
      .values(NewRsvp {
        user_id,
        event_id,
        registered_at,
      })
      .execute(conn)?;
    last_inserted_id(conn).map(Ok)
  })
}
