//! Keeps the tag vocabulary and the `event_tags` association rows in line with the
//! comma-separated tag string supplied on event create/update.

use std::collections::BTreeSet;

use diesel::{prelude::*, QueryResult, SqliteConnection};
use itertools::Itertools;

use crate::{
  db_util::get_and_create_tag_ids,
  models::tags::{NewEventTag, Tag},
};

/// Splits a raw tag string on `,`, trims every piece, and drops empty pieces and repeats. Names
/// are kept exactly as written otherwise; `Music` and `music` are different tags.
pub fn parse_tag_spec(tag_spec: &str) -> Vec<String> {
  tag_spec
    .split(',')
    .map(str::trim)
    .filter(|name| !name.is_empty())
    .unique()
    .map(str::to_owned)
    .collect()
}

pub fn event_tag_ids(conn: &mut SqliteConnection, event_id: i64) -> QueryResult<Vec<i64>> {
  use crate::schema::event_tags;

  event_tags::table
    .filter(event_tags::dsl::event_id.eq(event_id))
    .select(event_tags::dsl::tag_id)
    .load(conn)
}

pub fn tags_for_event(conn: &mut SqliteConnection, event_id: i64) -> QueryResult<Vec<Tag>> {
  use crate::schema::{event_tags, tags};

  tags::table
    .inner_join(event_tags::table)
    .filter(event_tags::dsl::event_id.eq(event_id))
    .select((tags::dsl::id, tags::dsl::name))
    .order(tags::dsl::name.asc())
    .load(conn)
}

pub fn tag_names_for_event(conn: &mut SqliteConnection, event_id: i64) -> QueryResult<Vec<String>> {
  Ok(
    tags_for_event(conn, event_id)?
      .into_iter()
      .map(|tag| tag.name)
      .collect(),
  )
}

#[derive(Debug, Default, PartialEq)]
pub struct ReconcileSummary {
  pub added: usize,
  pub removed: usize,
  pub orphans_deleted: usize,
}

/// Makes the tags of `event_id` equal the names in `tag_spec`.
///
/// `None` means the caller didn't mention tags and nothing is touched. `Some("")` (or any string
/// without names) removes every association. Tags left without any association are deleted.
/// Everything runs in one transaction, so a failure leaves the previous associations intact.
pub fn reconcile_event_tags(
  conn: &mut SqliteConnection,
  event_id: i64,
  tag_spec: Option<&str>,
) -> QueryResult<ReconcileSummary> {
  use crate::schema::{event_tags, tags};

  let desired_names = match tag_spec {
    Some(tag_spec) => parse_tag_spec(tag_spec),
    None => return Ok(ReconcileSummary::default()),
  };

  conn.transaction(|conn| {
    let desired: BTreeSet<i64> = get_and_create_tag_ids(conn, &desired_names)?
      .into_iter()
      .collect();
    let current: BTreeSet<i64> = event_tag_ids(conn, event_id)?.into_iter().collect();

    let to_remove = current.difference(&desired).copied().collect_vec();
    let to_add = desired.difference(&current).copied().collect_vec();
    let mut summary = ReconcileSummary {
      added: to_add.len(),
      removed: to_remove.len(),
      orphans_deleted: 0,
    };

    if !to_remove.is_empty() {
      diesel::delete(
        event_tags::table
          .filter(event_tags::dsl::event_id.eq(event_id))
          .filter(event_tags::dsl::tag_id.eq_any(to_remove.clone())),
      )
      .execute(conn)?;

      for tag_id in to_remove {
        let remaining_refs: i64 = event_tags::table
          .filter(event_tags::dsl::tag_id.eq(tag_id))
          .count()
          .get_result(conn)?;
        if remaining_refs == 0 {
          diesel::delete(tags::table.find(tag_id)).execute(conn)?;
          summary.orphans_deleted += 1;
        }
      }
    }

    if !to_add.is_empty() {
      let new_event_tags = to_add
        .into_iter()
        .map(|tag_id| NewEventTag { event_id, tag_id })
        .collect_vec();
      // a concurrent reconciliation may have linked the same pair already
      diesel::insert_or_ignore_into(event_tags::table)
        .values(&new_event_tags)
        .execute(conn)?;
    }

    if summary != ReconcileSummary::default() {
      info!(
        "Reconciled tags for event {}: {} added, {} removed, {} orphaned tags deleted",
        event_id, summary.added, summary.removed, summary.orphans_deleted
      );
    }
    Ok(summary)
  })
}
