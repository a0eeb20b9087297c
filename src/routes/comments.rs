use diesel::prelude::*;
use rocket::{http::Status, response::status::Custom, serde::json::Json, Route};

use crate::{
  db_util::{last_inserted_id, reactions::record_reaction},
  error::{ApiError, ApiResult},
  models::{
    comment::{Comment, CreateCommentRequest},
    reaction::{Actor, ReactionKind, SubjectKind},
    SuccessResponse,
  },
  EventBoardDbConn,
};

pub fn routes() -> Vec<Route> {
  routes![
    create_comment,
    list_comments,
    comments_for_event,
    get_comment,
    like_comment,
    dislike_comment
  ]
}

#[post("/", data = "<create_comment_request>")]
pub async fn create_comment(
  conn: EventBoardDbConn,
  create_comment_request: Json<CreateCommentRequest>,
) -> ApiResult<Custom<Json<Comment>>> {
  use crate::schema::{comments, events};

  let new_comment = create_comment_request
    .into_inner()
    .into_new_comment()
    .ok_or_else(|| ApiError::validation("Event ID, user name, and content are required."))?;

  let comment = conn
    .run(move |conn| {
      conn.transaction::<_, ApiError, _>(|conn| {
        let event_exists: Option<i64> = events::table
          .find(new_comment.event_id)
          .select(events::dsl::id)
          .first(conn)
          .optional()?;
        if event_exists.is_none() {
          return Err(ApiError::not_found("Event not found."));
        }

        diesel::insert_into(comments::table)
          .values(&new_comment)
          .execute(conn)?;
        let comment_id = last_inserted_id(conn)?;
        Ok(comments::table.find(comment_id).first::<Comment>(conn)?)
      })
    })
    .await?;

  Ok(Custom(Status::Created, Json(comment)))
}

#[get("/")]
pub async fn list_comments(conn: EventBoardDbConn) -> ApiResult<Json<Vec<Comment>>> {
  use crate::schema::comments;

  let all_comments: Vec<Comment> = conn
    .run(|conn| comments::table.order(comments::dsl::id.asc()).load(conn))
    .await?;
  Ok(Json(all_comments))
}

#[get("/<event_id>")]
pub async fn comments_for_event(
  conn: EventBoardDbConn,
  event_id: i64,
) -> ApiResult<Json<Vec<Comment>>> {
  use crate::schema::comments;

  let event_comments: Vec<Comment> = conn
    .run(move |conn| {
      comments::table
        .filter(comments::dsl::event_id.eq(event_id))
        .order((comments::dsl::created_at.desc(), comments::dsl::id.desc()))
        .load(conn)
    })
    .await?;
  Ok(Json(event_comments))
}

#[get("/byId/<comment_id>")]
pub async fn get_comment(conn: EventBoardDbConn, comment_id: i64) -> ApiResult<Json<Comment>> {
  use crate::schema::comments;

  conn
    .run(move |conn| comments::table.find(comment_id).first(conn).optional())
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::not_found("Comment not found."))
}

async fn vote_on_comment(
  conn: EventBoardDbConn,
  actor: Actor,
  comment_id: i64,
  kind: ReactionKind,
) -> ApiResult<Json<SuccessResponse>> {
  let counted = conn
    .run(move |conn| record_reaction(conn, SubjectKind::Comment, comment_id, &actor, kind))
    .await?;
  if !counted {
    return Err(ApiError::forbidden("You have already voted on this comment."));
  }
  Ok(Json(SuccessResponse { success: true }))
}

#[patch("/like/<comment_id>")]
pub async fn like_comment(
  conn: EventBoardDbConn,
  actor: Actor,
  comment_id: i64,
) -> ApiResult<Json<SuccessResponse>> {
  vote_on_comment(conn, actor, comment_id, ReactionKind::Like).await
}

#[patch("/dislike/<comment_id>")]
pub async fn dislike_comment(
  conn: EventBoardDbConn,
  actor: Actor,
  comment_id: i64,
) -> ApiResult<Json<SuccessResponse>> {
  vote_on_comment(conn, actor, comment_id, ReactionKind::Dislike).await
}
