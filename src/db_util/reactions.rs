use diesel::{prelude::*, SqliteConnection};

use crate::{
  error::{ApiError, ApiResult},
  models::reaction::{Actor, NewReaction, ReactionKind, SubjectKind},
  schema::{comments, events, reactions},
};

fn bump_event_counter(
  conn: &mut SqliteConnection,
  event_id: i64,
  kind: ReactionKind,
) -> QueryResult<usize> {
  let target = events::table.find(event_id);
  match kind {
    ReactionKind::Like => diesel::update(target)
      .set(events::dsl::likes.eq(events::dsl::likes + 1))
      .execute(conn),
    ReactionKind::Dislike => diesel::update(target)
      .set(events::dsl::dislikes.eq(events::dsl::dislikes + 1))
      .execute(conn),
    ReactionKind::View => diesel::update(target)
      .set(events::dsl::views.eq(events::dsl::views + 1))
      .execute(conn),
  }
}

fn bump_comment_counter(
  conn: &mut SqliteConnection,
  comment_id: i64,
  kind: ReactionKind,
) -> QueryResult<usize> {
  let target = comments::table.find(comment_id);
  match kind {
    ReactionKind::Like => diesel::update(target)
      .set(comments::dsl::likes.eq(comments::dsl::likes + 1))
      .execute(conn),
    ReactionKind::Dislike => diesel::update(target)
      .set(comments::dsl::dislikes.eq(comments::dsl::dislikes + 1))
      .execute(conn),
    ReactionKind::View => Ok(0),
  }
}

/// Records `kind` from `actor` against the subject and bumps the matching counter.
///
/// Returns `Ok(false)` when the actor already has a reaction in the same group for this
/// subject. An unknown subject is a `NotFound` error and the ledger entry is rolled back.
pub fn record_reaction(
  conn: &mut SqliteConnection,
  subject: SubjectKind,
  subject_id: i64,
  actor: &Actor,
  kind: ReactionKind,
) -> ApiResult<bool> {
  let reaction = NewReaction::new(subject, subject_id, actor, kind);

  conn.transaction::<_, ApiError, _>(|conn| {
    let inserted = diesel::insert_or_ignore_into(reactions::table)
      .values(&reaction)
      .execute(conn)?;
    if inserted == 0 {
      return Ok(false);
    }

    let updated = match subject {
      SubjectKind::Event => bump_event_counter(conn, subject_id, kind)?,
      SubjectKind::Comment => bump_comment_counter(conn, subject_id, kind)?,
    };
    if updated == 0 {
      return Err(match subject {
        SubjectKind::Event => ApiError::not_found("Event not found."),
        SubjectKind::Comment => ApiError::not_found("Comment not found."),
      });
    }
    Ok(true)
  })
}
