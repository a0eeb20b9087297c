use std::collections::HashMap;

use diesel::{
  connection::SimpleConnection, prelude::*, sql_types::BigInt, QueryResult, SqliteConnection,
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use fxhash::FxHashMap;
use itertools::Itertools;
use rocket::serde::json::Json;

use crate::{
  error::ApiResult,
  models::tags::{EntityIdTag, NewTag, Tag, TagCount},
  EventBoardDbConn,
};

pub mod events;
pub mod login;
pub mod reactions;
pub mod rsvps;
pub mod tags;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

// Facilitate getting the primary key of the last inserted item
define_sql_function! {
  fn last_insert_rowid() -> BigInt;
}

pub fn last_inserted_id(conn: &mut SqliteConnection) -> QueryResult<i64> {
  diesel::select(last_insert_rowid()).get_result(conn)
}

pub fn run_migrations(conn: &mut SqliteConnection) -> Result<(), String> {
  // WAL lets readers proceed while a request holds the write lock
  conn
    .batch_execute("PRAGMA journal_mode = WAL;")
    .map_err(|err| format!("Error enabling WAL journal mode: {}", err))?;

  let applied = conn
    .run_pending_migrations(MIGRATIONS)
    .map_err(|err| format!("Error running database migrations: {}", err))?;
  for version in applied {
    info!("Applied database migration {}", version);
  }
  Ok(())
}

fn load_tag_ids_by_name(
  conn: &mut SqliteConnection,
  tags: &[String],
) -> QueryResult<HashMap<String, i64>> {
  use crate::schema::tags;

  let existing_tags = tags::table
    .filter(tags::dsl::name.eq_any(tags))
    .load::<Tag>(conn)?;
  Ok(
    existing_tags
      .into_iter()
      .map(|tag| (tag.name, tag.id))
      .collect(),
  )
}

/// Resolves every name to a tag id, creating the tags that don't exist yet. The returned ids
/// line up with `tags`.
pub fn get_and_create_tag_ids(
  conn: &mut SqliteConnection,
  tags: &[String],
) -> QueryResult<Vec<i64>> {
  use crate::schema::tags;

  if tags.is_empty() {
    return Ok(Vec::new());
  }

  let mut tag_ids_by_name = load_tag_ids_by_name(conn, tags)?;

  let missing_tags: Vec<NewTag> = tags
    .iter()
    .filter(|t| !tag_ids_by_name.contains_key(*t))
    .unique()
    .map(|tag| NewTag { name: tag.clone() })
    .collect_vec();

  if !missing_tags.is_empty() {
    diesel::insert_or_ignore_into(tags::table)
      .values(&missing_tags)
      .execute(conn)?;
    tag_ids_by_name = load_tag_ids_by_name(conn, tags)?;
  }

  tags
    .iter()
    .map(|tag| {
      tag_ids_by_name
        .get(tag)
        .copied()
        .ok_or(diesel::result::Error::NotFound)
    })
    .collect()
}

pub fn count_tags(entity_tags: Vec<EntityIdTag>) -> Vec<TagCount> {
  let mut counts_by_tag: FxHashMap<String, i64> = FxHashMap::default();
  for entity_tag in entity_tags {
    let count = counts_by_tag.entry(entity_tag.tag).or_insert(0);
    *count += 1;
  }

  counts_by_tag
    .into_iter()
    .map(|(tag_name, count)| TagCount {
      name: tag_name,
      count,
    })
    .sorted_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)))
    .collect()
}

pub async fn build_tags_with_counts(conn: EventBoardDbConn) -> ApiResult<Json<Vec<TagCount>>> {
  use crate::schema::{event_tags, tags};

  let all_event_tags: Vec<EntityIdTag> = conn
    .run(|conn| {
      event_tags::table
        .inner_join(tags::table)
        .select((event_tags::dsl::event_id, tags::dsl::name))
        .load(conn)
    })
    .await?;

  Ok(Json(count_tags(all_event_tags)))
}

#[cfg(test)]
pub fn test_connection() -> SqliteConnection {
  let mut conn = SqliteConnection::establish(":memory:").unwrap();
  run_migrations(&mut conn).unwrap();
  conn
}

#[cfg(test)]
pub fn insert_test_event(conn: &mut SqliteConnection, title: &str) -> i64 {
  use crate::{
    models::{category::NewCategory, event::NewEvent, user::NewUser},
    schema::{categories, events, users},
  };

  diesel::insert_or_ignore_into(users::table)
    .values(NewUser {
      email: String::from("author@example.com"),
      first_name: String::from("Ada"),
      last_name: String::from("Author"),
      user_type: String::from("event_creator"),
      status: String::from("active"),
      password_hash: String::from("unused"),
    })
    .execute(conn)
    .unwrap();
  diesel::insert_or_ignore_into(categories::table)
    .values(NewCategory {
      name: String::from("General"),
      description: String::from("Everything else"),
    })
    .execute(conn)
    .unwrap();

  diesel::insert_into(events::table)
    .values(NewEvent {
      title: title.to_owned(),
      description: format!("About {}", title),
      event_datetime: chrono::Utc::now().naive_utc(),
      location: String::from("Town hall"),
      author_id: 1,
      category_id: 1,
      max_capacity: Some(2),
    })
    .execute(conn)
    .unwrap();
  last_inserted_id(conn).unwrap()
}

#[test]
fn test_get_and_create_tag_ids_reuses_existing() {
  let mut conn = test_connection();
  let first = get_and_create_tag_ids(&mut conn, &[String::from("music"), String::from("art")])
    .unwrap();
  let second = get_and_create_tag_ids(&mut conn, &[
    String::from("art"),
    String::from("food"),
    String::from("art"),
  ])
  .unwrap();

  assert_eq!(first.len(), 2);
  assert_eq!(second[0], first[1]);
  assert_eq!(second[2], first[1]);
  assert!(!first.contains(&second[1]));
}

#[test]
fn test_count_tags() {
  let counts = count_tags(vec![
    EntityIdTag {
      entity_id: 1,
      tag: String::from("music"),
    },
    EntityIdTag {
      entity_id: 2,
      tag: String::from("music"),
    },
    EntityIdTag {
      entity_id: 2,
      tag: String::from("art"),
    },
  ]);
  assert_eq!(counts, vec![
    TagCount {
      name: String::from("music"),
      count: 2
    },
    TagCount {
      name: String::from("art"),
      count: 1
    },
  ]);
}
