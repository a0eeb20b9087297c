use chrono::Utc;
use diesel::prelude::*;
use rocket::{http::Status, response::status::Custom, serde::json::Json, Route};

use crate::{
  db_util::{
    events::{
      count_events, create_event_with_tags, delete_event, find_event, load_event_page,
      related_events, top_reactions, trending_events, update_event_with_tags, EventFilter,
    },
    reactions::record_reaction,
  },
  error::{ApiError, ApiResult},
  models::{
    event::{
      CreateEventRequest, CreateEventResponse, Event, EventPage, ReactionTally, RelatedEvents,
      UpdateEventRequest,
    },
    reaction::{Actor, ReactionKind, SubjectKind},
    user::AuthenticatedUser,
    MessageResponse, PageWindow, SuccessResponse,
  },
  EventBoardDbConn,
};

const DEFAULT_PAGE_SIZE: i64 = 10;
const UNKNOWN_REFERENCE: &str = "\"author_id\" and \"category_id\" must refer to existing rows";

pub fn routes() -> Vec<Route> {
  routes![
    create_event,
    list_events,
    latest_events,
    trending,
    get_top_reactions,
    search_events,
    get_event,
    update_event,
    remove_event,
    like_event,
    dislike_event,
    view_event,
    events_by_category,
    events_by_tag,
    get_related_events
  ]
}

#[derive(FromForm)]
pub struct SearchQuery {
  #[field(name = "searchTerm")]
  search_term: Option<String>,
  page: Option<i64>,
  limit: Option<i64>,
}

async fn event_page(
  conn0: EventBoardDbConn,
  conn1: EventBoardDbConn,
  filter: EventFilter,
  window: PageWindow,
) -> ApiResult<Json<EventPage>> {
  let count_filter = filter.clone();
  let (events, total) = tokio::try_join!(
    conn0.run(move |conn| load_event_page(conn, &filter, window)),
    conn1.run(move |conn| count_events(conn, &count_filter)),
  )?;

  Ok(Json(EventPage {
    events,
    total,
    page: window.page,
    total_pages: window.total_pages(total),
  }))
}

#[post("/createEvent", data = "<create_event_request>")]
pub async fn create_event(
  conn: EventBoardDbConn,
  caller: Result<AuthenticatedUser, ApiError>,
  create_event_request: Json<CreateEventRequest>,
) -> ApiResult<Custom<Json<CreateEventResponse>>> {
  use crate::schema::categories;

  let AuthenticatedUser(caller) = caller?;
  let (new_event, tag_spec) = create_event_request.into_inner().into_new_event(caller.id)?;

  let (event_id, tags) = conn
    .run(move |conn| -> ApiResult<(i64, Vec<String>)> {
      let category_exists: Option<i64> = categories::table
        .find(new_event.category_id)
        .select(categories::dsl::id)
        .first(conn)
        .optional()?;
      if category_exists.is_none() {
        return Err(ApiError::validation(
          "\"category_id\" does not refer to an existing category",
        ));
      }

      create_event_with_tags(conn, new_event, &tag_spec).map_err(ApiError::from)
    })
    .await
    .map_err(|err| err.on_foreign_key_violation(UNKNOWN_REFERENCE))?;
  info!("User {} created event {} with tags {:?}", caller.id, event_id, tags);

  Ok(Custom(
    Status::Created,
    Json(CreateEventResponse {
      message: String::from("Event created successfully."),
      event_id,
      tags,
    }),
  ))
}

#[get("/")]
pub async fn list_events(conn: EventBoardDbConn) -> ApiResult<Json<Vec<Event>>> {
  use crate::schema::events;

  let all_events: Vec<Event> = conn
    .run(|conn| {
      events::table
        .order((events::dsl::created_at.desc(), events::dsl::id.desc()))
        .load(conn)
    })
    .await?;
  Ok(Json(all_events))
}

#[get("/latest?<page>&<limit>")]
pub async fn latest_events(
  conn0: EventBoardDbConn,
  conn1: EventBoardDbConn,
  page: Option<i64>,
  limit: Option<i64>,
) -> ApiResult<Json<EventPage>> {
  let window = PageWindow::zero_based(page, limit, DEFAULT_PAGE_SIZE);
  event_page(conn0, conn1, EventFilter::All, window).await
}

#[get("/trending")]
pub async fn trending(conn: EventBoardDbConn) -> ApiResult<Json<Vec<Event>>> {
  let now = Utc::now().naive_utc();
  let events = conn.run(move |conn| trending_events(conn, now)).await?;
  Ok(Json(events))
}

#[get("/top-reactions")]
pub async fn get_top_reactions(conn: EventBoardDbConn) -> ApiResult<Json<Vec<ReactionTally>>> {
  let tallies = conn.run(|conn| top_reactions(conn)).await?;
  Ok(Json(tallies))
}

#[get("/search?<query..>")]
pub async fn search_events(
  conn0: EventBoardDbConn,
  conn1: EventBoardDbConn,
  caller: Result<AuthenticatedUser, ApiError>,
  query: SearchQuery,
) -> ApiResult<Json<EventPage>> {
  caller?;
  let search_term = match query.search_term {
    Some(term) if !term.trim().is_empty() => term.trim().to_owned(),
    _ => return Err(ApiError::validation("Search term is required.")),
  };

  let window = PageWindow::one_based(query.page, query.limit, DEFAULT_PAGE_SIZE);
  event_page(conn0, conn1, EventFilter::Search(search_term), window).await
}

#[get("/<event_id>")]
pub async fn get_event(
  conn: EventBoardDbConn,
  caller: Result<AuthenticatedUser, ApiError>,
  event_id: i64,
) -> ApiResult<Json<Event>> {
  caller?;
  conn
    .run(move |conn| find_event(conn, event_id))
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::not_found("Event not found."))
}

#[patch("/update/<event_id>", data = "<update_request>")]
pub async fn update_event(
  conn: EventBoardDbConn,
  caller: Result<AuthenticatedUser, ApiError>,
  event_id: i64,
  update_request: Json<UpdateEventRequest>,
) -> ApiResult<Json<Event>> {
  let AuthenticatedUser(caller) = caller?;
  let (changeset, tag_spec) = update_request.into_inner().into_changeset()?;

  let event = conn
    .run(move |conn| -> ApiResult<Event> {
      update_event_with_tags(conn, event_id, changeset, tag_spec)?;
      find_event(conn, event_id)?.ok_or_else(|| ApiError::not_found("Event not found."))
    })
    .await
    .map_err(|err| err.on_foreign_key_violation(UNKNOWN_REFERENCE))?;
  info!("User {} updated event {}", caller.id, event_id);

  Ok(Json(event))
}

#[delete("/delete/<event_id>")]
pub async fn remove_event(
  conn: EventBoardDbConn,
  caller: Result<AuthenticatedUser, ApiError>,
  event_id: i64,
) -> ApiResult<Json<MessageResponse>> {
  let AuthenticatedUser(caller) = caller?;
  let deleted = conn.run(move |conn| delete_event(conn, event_id)).await?;
  if !deleted {
    return Err(ApiError::not_found("Event not found."));
  }
  info!("User {} deleted event {}", caller.id, event_id);

  Ok(Json(MessageResponse::new("Event deleted successfully.")))
}

async fn vote_on_event(
  conn: EventBoardDbConn,
  actor: Actor,
  event_id: i64,
  kind: ReactionKind,
) -> ApiResult<Json<SuccessResponse>> {
  let counted = conn
    .run(move |conn| record_reaction(conn, SubjectKind::Event, event_id, &actor, kind))
    .await?;
  if !counted {
    return Err(ApiError::forbidden("You have already voted on this event."));
  }
  Ok(Json(SuccessResponse { success: true }))
}

#[patch("/likes/<event_id>")]
pub async fn like_event(
  conn: EventBoardDbConn,
  actor: Actor,
  event_id: i64,
) -> ApiResult<Json<SuccessResponse>> {
  vote_on_event(conn, actor, event_id, ReactionKind::Like).await
}

#[patch("/dislikes/<event_id>")]
pub async fn dislike_event(
  conn: EventBoardDbConn,
  actor: Actor,
  event_id: i64,
) -> ApiResult<Json<SuccessResponse>> {
  vote_on_event(conn, actor, event_id, ReactionKind::Dislike).await
}

#[patch("/views/<event_id>")]
pub async fn view_event(
  conn: EventBoardDbConn,
  actor: Actor,
  event_id: i64,
) -> ApiResult<Json<Event>> {
  let event = conn
    .run(move |conn| -> ApiResult<Event> {
      record_reaction(conn, SubjectKind::Event, event_id, &actor, ReactionKind::View)?;
      find_event(conn, event_id)?.ok_or_else(|| ApiError::not_found("Event not found."))
    })
    .await?;
  Ok(Json(event))
}

#[get("/category/<category_id>?<page>&<limit>")]
pub async fn events_by_category(
  conn0: EventBoardDbConn,
  conn1: EventBoardDbConn,
  category_id: i64,
  page: Option<i64>,
  limit: Option<i64>,
) -> ApiResult<Json<EventPage>> {
  let window = PageWindow::one_based(page, limit, DEFAULT_PAGE_SIZE);
  event_page(conn0, conn1, EventFilter::Category(category_id), window).await
}

#[get("/tag/<tag_id>?<page>&<limit>")]
pub async fn events_by_tag(
  conn0: EventBoardDbConn,
  conn1: EventBoardDbConn,
  tag_id: i64,
  page: Option<i64>,
  limit: Option<i64>,
) -> ApiResult<Json<EventPage>> {
  let window = PageWindow::one_based(page, limit, DEFAULT_PAGE_SIZE);
  event_page(conn0, conn1, EventFilter::Tag(tag_id), window).await
}

#[get("/related/<event_id>")]
pub async fn get_related_events(
  conn: EventBoardDbConn,
  event_id: i64,
) -> ApiResult<Json<RelatedEvents>> {
  let related_events = conn
    .run(move |conn| -> ApiResult<Vec<Event>> {
      if find_event(conn, event_id)?.is_none() {
        return Err(ApiError::not_found("Event not found."));
      }
      Ok(related_events(conn, event_id)?)
    })
    .await?;
  Ok(Json(RelatedEvents { related_events }))
}
