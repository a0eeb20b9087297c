use diesel::prelude::*;
use rocket::{serde::json::Json, Route};

use crate::{
  db_util::{build_tags_with_counts, tags::tags_for_event},
  error::{ApiError, ApiResult},
  models::tags::{Tag, TagCount, TagId},
  EventBoardDbConn,
};

pub fn routes() -> Vec<Route> {
  routes![get_tags_with_counts, get_event_tags, get_tag_id_by_name]
}

#[get("/")]
pub async fn get_tags_with_counts(conn: EventBoardDbConn) -> ApiResult<Json<Vec<TagCount>>> {
  build_tags_with_counts(conn).await
}

#[get("/<event_id>")]
pub async fn get_event_tags(conn: EventBoardDbConn, event_id: i64) -> ApiResult<Json<Vec<Tag>>> {
  let tags = conn.run(move |conn| tags_for_event(conn, event_id)).await?;
  Ok(Json(tags))
}

#[get("/name/<tag_name>")]
pub async fn get_tag_id_by_name(
  conn: EventBoardDbConn,
  tag_name: String,
) -> ApiResult<Json<TagId>> {
  use crate::schema::tags;

  let id: Option<i64> = conn
    .run(move |conn| {
      tags::table
        .filter(tags::dsl::name.eq(tag_name))
        .select(tags::dsl::id)
        .first(conn)
        .optional()
    })
    .await?;
  id.map(|id| Json(TagId { id }))
    .ok_or_else(|| ApiError::not_found("Tag not found."))
}
