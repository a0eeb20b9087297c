use chrono::{Duration, NaiveDateTime};
use diesel::{dsl::count_star, prelude::*, sqlite::Sqlite, QueryResult, SqliteConnection};

use crate::{
  db_util::{
    last_inserted_id,
    tags::{event_tag_ids, parse_tag_spec, reconcile_event_tags},
  },
  error::{ApiError, ApiResult},
  models::{
    event::{Event, EventChangeset, NewEvent, ReactionTally},
    reaction::SubjectKind,
    PageWindow,
  },
  schema::events,
};

pub const TRENDING_WINDOW_DAYS: i64 = 30;
pub const TRENDING_LIMIT: i64 = 10;
pub const TOP_REACTIONS_LIMIT: i64 = 3;
pub const RELATED_EVENTS_LIMIT: i64 = 3;

/// Which events a paginated listing covers.
#[derive(Clone, Debug)]
pub enum EventFilter {
  All,
  Category(i64),
  Tag(i64),
  Search(String),
}

impl EventFilter {
  pub fn apply<'a, ST: 'a>(
    &self,
    query: events::BoxedQuery<'a, Sqlite, ST>,
  ) -> events::BoxedQuery<'a, Sqlite, ST> {
    use crate::schema::event_tags;

    match self {
      EventFilter::All => query,
      EventFilter::Category(category_id) => query.filter(events::dsl::category_id.eq(*category_id)),
      EventFilter::Tag(tag_id) => query.filter(
        events::dsl::id.eq_any(
          event_tags::table
            .filter(event_tags::dsl::tag_id.eq(*tag_id))
            .select(event_tags::dsl::event_id),
        ),
      ),
      EventFilter::Search(term) => {
        let pattern = format!("%{}%", escape_like(term));
        query.filter(
          events::dsl::title
            .like(pattern.clone())
            .escape('\\')
            .or(events::dsl::description.like(pattern).escape('\\')),
        )
      },
    }
  }
}

/// Makes `%` and `_` in user input match literally inside a `LIKE` pattern.
fn escape_like(term: &str) -> String {
  let mut escaped = String::with_capacity(term.len());
  for c in term.chars() {
    if matches!(c, '%' | '_' | '\\') {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped
}

pub fn load_event_page(
  conn: &mut SqliteConnection,
  filter: &EventFilter,
  window: PageWindow,
) -> QueryResult<Vec<Event>> {
  filter
    .apply(events::table.into_boxed())
    .order((events::dsl::created_at.desc(), events::dsl::id.desc()))
    .limit(window.limit)
    .offset(window.offset)
    .load(conn)
}

pub fn count_events(conn: &mut SqliteConnection, filter: &EventFilter) -> QueryResult<i64> {
  filter
    .apply(events::table.select(count_star()).into_boxed())
    .get_result(conn)
}

pub fn find_event(conn: &mut SqliteConnection, event_id: i64) -> QueryResult<Option<Event>> {
  events::table.find(event_id).first(conn).optional()
}

/// Inserts the event and links its tags in one transaction. Returns the new id along with the
/// tag names as parsed.
pub fn create_event_with_tags(
  conn: &mut SqliteConnection,
  new_event: NewEvent,
  tag_spec: &str,
) -> QueryResult<(i64, Vec<String>)> {
  conn.transaction(|conn| {
    diesel::insert_into(events::table)
      .values(&new_event)
      .execute(conn)?;
    let event_id = last_inserted_id(conn)?;
    reconcile_event_tags(conn, event_id, Some(tag_spec))?;
    Ok((event_id, parse_tag_spec(tag_spec)))
  })
}

/// Applies the column changeset and then the tag reconciliation. Both happen in one
/// transaction; an unknown event id leaves the database untouched.
pub fn update_event_with_tags(
  conn: &mut SqliteConnection,
  event_id: i64,
  changeset: EventChangeset,
  tag_spec: Option<String>,
) -> ApiResult<()> {
  conn.transaction::<_, ApiError, _>(|conn| {
    let exists = find_event(conn, event_id)?.is_some();
    if !exists {
      return Err(ApiError::not_found("Event not found."));
    }

    if !changeset.is_empty() {
      diesel::update(events::table.find(event_id))
        .set(&changeset)
        .execute(conn)?;
    }
    reconcile_event_tags(conn, event_id, tag_spec.as_deref())?;
    Ok(())
  })
}

/// Deletes an event together with its comments, RSVPs, reactions and tag links. Tags that
/// were only used by this event are deleted as well. Returns `false` for an unknown id.
pub fn delete_event(conn: &mut SqliteConnection, event_id: i64) -> QueryResult<bool> {
  use crate::schema::{comments, reactions, rsvps};

  conn.transaction(|conn| {
    if find_event(conn, event_id)?.is_none() {
      return Ok(false);
    }

    reconcile_event_tags(conn, event_id, Some(""))?;

    let comment_ids: Vec<i64> = comments::table
      .filter(comments::dsl::event_id.eq(event_id))
      .select(comments::dsl::id)
      .load(conn)?;
    diesel::delete(
      reactions::table
        .filter(reactions::dsl::subject_kind.eq(SubjectKind::Comment.as_str()))
        .filter(reactions::dsl::subject_id.eq_any(comment_ids)),
    )
    .execute(conn)?;
    diesel::delete(
      reactions::table
        .filter(reactions::dsl::subject_kind.eq(SubjectKind::Event.as_str()))
        .filter(reactions::dsl::subject_id.eq(event_id)),
    )
    .execute(conn)?;
    diesel::delete(comments::table.filter(comments::dsl::event_id.eq(event_id))).execute(conn)?;
    diesel::delete(rsvps::table.filter(rsvps::dsl::event_id.eq(event_id))).execute(conn)?;
    diesel::delete(events::table.find(event_id)).execute(conn)?;
    Ok(true)
  })
}

/// Most viewed events happening no earlier than `TRENDING_WINDOW_DAYS` before `now`.
pub fn trending_events(conn: &mut SqliteConnection, now: NaiveDateTime) -> QueryResult<Vec<Event>> {
  let cutoff = now - Duration::days(TRENDING_WINDOW_DAYS);
  events::table
    .filter(events::dsl::event_datetime.ge(cutoff))
    .order((events::dsl::views.desc(), events::dsl::id.asc()))
    .limit(TRENDING_LIMIT)
    .load(conn)
}

pub fn top_reactions(conn: &mut SqliteConnection) -> QueryResult<Vec<ReactionTally>> {
  events::table
    .select((
      events::dsl::id,
      events::dsl::title,
      events::dsl::likes,
      events::dsl::dislikes,
    ))
    .order((
      (events::dsl::likes - events::dsl::dislikes).desc(),
      events::dsl::id.asc(),
    ))
    .limit(TOP_REACTIONS_LIMIT)
    .load(conn)
}

/// Other events sharing at least one tag with `event_id`.
pub fn related_events(conn: &mut SqliteConnection, event_id: i64) -> QueryResult<Vec<Event>> {
  use crate::schema::event_tags;

  let tag_ids = event_tag_ids(conn, event_id)?;
  if tag_ids.is_empty() {
    return Ok(Vec::new());
  }

  events::table
    .filter(
      events::dsl::id.eq_any(
        event_tags::table
          .filter(event_tags::dsl::tag_id.eq_any(tag_ids))
          .select(event_tags::dsl::event_id),
      ),
    )
    .filter(events::dsl::id.ne(event_id))
    .order(events::dsl::created_at.desc())
    .limit(RELATED_EVENTS_LIMIT)
    .load(conn)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    db_util::{
      insert_test_event,
      tags::{tag_names_for_event, tags_for_event},
      test_connection,
    },
    schema::tags,
  };

  fn new_event(title: &str, category_id: i64) -> NewEvent {
    NewEvent {
      title: title.to_owned(),
      description: String::from("An evening of things"),
      event_datetime: chrono::Utc::now().naive_utc(),
      location: String::from("Pier 4"),
      author_id: 1,
      category_id,
      max_capacity: None,
    }
  }

  #[test]
  fn create_links_parsed_tags() {
    let mut conn = test_connection();
    insert_test_event(&mut conn, "seed");

    let (event_id, tags) =
      create_event_with_tags(&mut conn, new_event("Jazz", 1), " jazz, music ,,").unwrap();
    assert_eq!(tags, vec!["jazz", "music"]);
    assert_eq!(tag_names_for_event(&mut conn, event_id).unwrap(), vec![
      "jazz", "music"
    ]);
  }

  #[test]
  fn update_without_tags_keeps_associations() {
    let mut conn = test_connection();
    insert_test_event(&mut conn, "seed");
    let (event_id, _) =
      create_event_with_tags(&mut conn, new_event("Jazz", 1), "jazz, music").unwrap();

    let changeset = EventChangeset {
      title: Some(String::from("Late jazz")),
      ..Default::default()
    };
    update_event_with_tags(&mut conn, event_id, changeset, None).unwrap();
    let event = find_event(&mut conn, event_id).unwrap().unwrap();
    assert_eq!(event.title, "Late jazz");
    assert_eq!(tag_names_for_event(&mut conn, event_id).unwrap(), vec![
      "jazz", "music"
    ]);

    update_event_with_tags(
      &mut conn,
      event_id,
      EventChangeset::default(),
      Some(String::new()),
    )
    .unwrap();
    assert!(tags_for_event(&mut conn, event_id).unwrap().is_empty());
  }

  #[test]
  fn update_unknown_event_is_not_found() {
    let mut conn = test_connection();
    let result = update_event_with_tags(
      &mut conn,
      404,
      EventChangeset::default(),
      Some(String::from("ghost")),
    );
    assert!(matches!(result, Err(ApiError::NotFound(_))));
    let tag_count: i64 = tags::table.count().get_result(&mut conn).unwrap();
    assert_eq!(tag_count, 0);
  }

  #[test]
  fn delete_removes_orphaned_tags_only() {
    let mut conn = test_connection();
    insert_test_event(&mut conn, "seed");
    let (doomed, _) =
      create_event_with_tags(&mut conn, new_event("Doomed", 1), "solo, shared").unwrap();
    let (survivor, _) =
      create_event_with_tags(&mut conn, new_event("Survivor", 1), "shared").unwrap();

    assert!(delete_event(&mut conn, doomed).unwrap());
    assert!(!delete_event(&mut conn, doomed).unwrap());

    let remaining: Vec<String> = tags::table.select(tags::dsl::name).load(&mut conn).unwrap();
    assert_eq!(remaining, vec!["shared"]);
    assert_eq!(tag_names_for_event(&mut conn, survivor).unwrap(), vec!["shared"]);
  }

  #[test]
  fn filters_and_counts() {
    let mut conn = test_connection();
    insert_test_event(&mut conn, "seed");
    let (jazz, _) = create_event_with_tags(&mut conn, new_event("Jazz night", 1), "music").unwrap();
    create_event_with_tags(&mut conn, new_event("Pottery class", 1), "craft").unwrap();

    let search = EventFilter::Search(String::from("jazz"));
    assert_eq!(count_events(&mut conn, &search).unwrap(), 1);
    assert_eq!(count_events(&mut conn, &EventFilter::All).unwrap(), 3);
    assert_eq!(count_events(&mut conn, &EventFilter::Category(1)).unwrap(), 3);
    assert_eq!(count_events(&mut conn, &EventFilter::Category(2)).unwrap(), 0);

    let music_id: i64 = tags::table
      .filter(tags::dsl::name.eq("music"))
      .select(tags::dsl::id)
      .first(&mut conn)
      .unwrap();
    let page = load_event_page(
      &mut conn,
      &EventFilter::Tag(music_id),
      PageWindow::one_based(None, None, 10),
    )
    .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, jazz);

    let newest_first = load_event_page(
      &mut conn,
      &EventFilter::All,
      PageWindow::zero_based(Some(0), Some(2), 10),
    )
    .unwrap();
    assert_eq!(newest_first.len(), 2);
    assert!(newest_first[0].id > newest_first[1].id);
  }

  #[test]
  fn search_treats_wildcards_literally() {
    let mut conn = test_connection();
    insert_test_event(&mut conn, "seed");
    create_event_with_tags(&mut conn, new_event("100% vinyl", 1), "music").unwrap();
    create_event_with_tags(&mut conn, new_event("snake_case meetup", 1), "code").unwrap();

    let count = |conn: &mut SqliteConnection, term: &str| {
      count_events(conn, &EventFilter::Search(term.to_owned())).unwrap()
    };
    assert_eq!(count(&mut conn, "%"), 1);
    assert_eq!(count(&mut conn, "_"), 1);
    assert_eq!(count(&mut conn, "0% v"), 1);
    assert_eq!(count(&mut conn, "e_c"), 1);
    assert_eq!(count(&mut conn, "a%e"), 0);
    assert_eq!(escape_like(r"50%_\"), r"50\%\_\\");
  }

  #[test]
  fn related_events_share_a_tag() {
    let mut conn = test_connection();
    insert_test_event(&mut conn, "seed");
    let (a, _) = create_event_with_tags(&mut conn, new_event("A", 1), "music, outdoor").unwrap();
    let (b, _) = create_event_with_tags(&mut conn, new_event("B", 1), "music").unwrap();
    let (c, _) = create_event_with_tags(&mut conn, new_event("C", 1), "outdoor, music").unwrap();
    create_event_with_tags(&mut conn, new_event("D", 1), "indoor").unwrap();

    let mut related: Vec<i64> = related_events(&mut conn, a)
      .unwrap()
      .into_iter()
      .map(|event| event.id)
      .collect();
    related.sort();
    assert_eq!(related, vec![b, c]);
    assert!(related_events(&mut conn, 1).unwrap().is_empty());
  }

  #[test]
  fn top_reactions_rank_by_net_votes() {
    let mut conn = test_connection();
    let a = insert_test_event(&mut conn, "A");
    let b = insert_test_event(&mut conn, "B");
    diesel::update(events::table.find(a))
      .set((events::dsl::likes.eq(5), events::dsl::dislikes.eq(4)))
      .execute(&mut conn)
      .unwrap();
    diesel::update(events::table.find(b))
      .set(events::dsl::likes.eq(2))
      .execute(&mut conn)
      .unwrap();

    let tallies = top_reactions(&mut conn).unwrap();
    assert_eq!(tallies[0].id, b);
    assert_eq!(tallies[1].id, a);
  }

  #[test]
  fn trending_ignores_old_events() {
    let mut conn = test_connection();
    let recent = insert_test_event(&mut conn, "Recent");
    let old = insert_test_event(&mut conn, "Old");
    let now = chrono::Utc::now().naive_utc();
    diesel::update(events::table.find(old))
      .set((
        events::dsl::event_datetime.eq(now - Duration::days(60)),
        events::dsl::views.eq(100_i64),
      ))
      .execute(&mut conn)
      .unwrap();

    let trending: Vec<i64> = trending_events(&mut conn, now)
      .unwrap()
      .into_iter()
      .map(|event| event.id)
      .collect();
    assert_eq!(trending, vec![recent]);
  }
}
