use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::{error::ApiError, schema::events};

#[derive(Queryable, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Event {
  pub id: i64,
  pub title: String,
  pub description: String,
  pub event_datetime: NaiveDateTime,
  pub location: String,
  pub author_id: i64,
  pub category_id: i64,
  pub max_capacity: Option<i32>,
  pub likes: i64,
  pub dislikes: i64,
  pub views: i64,
  pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = events)]
pub struct NewEvent {
  pub title: String,
  pub description: String,
  pub event_datetime: NaiveDateTime,
  pub location: String,
  pub author_id: i64,
  pub category_id: i64,
  pub max_capacity: Option<i32>,
}

/// Accepts RFC 3339 timestamps (converted to UTC) as well as the naive formats produced by
/// `<input type="datetime-local">` and by the database itself.
pub fn parse_event_datetime(raw: &str) -> Option<NaiveDateTime> {
  let raw = raw.trim();
  if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
    return Some(datetime.naive_utc());
  }

  const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
  ];
  NAIVE_FORMATS
    .iter()
    .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    .or_else(|| {
      NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    })
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
  match value {
    Some(value) if !value.trim().is_empty() => Ok(value),
    Some(_) => Err(ApiError::validation(format!(
      "\"{}\" is not allowed to be empty",
      field
    ))),
    None => Err(ApiError::validation(format!("\"{}\" is required", field))),
  }
}

fn non_blank(value: Option<String>, field: &str) -> Result<Option<String>, ApiError> {
  match value {
    Some(value) => required(Some(value), field).map(Some),
    None => Ok(None),
  }
}

fn check_max_capacity(max_capacity: Option<i32>) -> Result<(), ApiError> {
  match max_capacity {
    Some(capacity) if capacity < 1 => Err(ApiError::validation(
      "\"max_capacity\" must be greater than or equal to 1",
    )),
    _ => Ok(()),
  }
}

fn parse_datetime_field(raw: &str) -> Result<NaiveDateTime, ApiError> {
  parse_event_datetime(raw)
    .ok_or_else(|| ApiError::validation("\"event_datetime\" must be a valid date"))
}

#[derive(Deserialize, Default)]
pub struct CreateEventRequest {
  pub title: Option<String>,
  pub description: Option<String>,
  pub event_datetime: Option<String>,
  pub location: Option<String>,
  pub author_id: Option<i64>,
  pub category_id: Option<i64>,
  pub max_capacity: Option<i32>,
  pub tags: Option<String>,
}

impl CreateEventRequest {
  /// Validates the payload, returning the row to insert along with the raw tag string.
  /// `author_id` falls back to the calling user.
  pub fn into_new_event(self, caller_id: i64) -> Result<(NewEvent, String), ApiError> {
    let title = required(self.title, "title")?;
    let description = required(self.description, "description")?;
    let event_datetime = parse_datetime_field(&required(self.event_datetime, "event_datetime")?)?;
    let location = required(self.location, "location")?;
    let category_id = self
      .category_id
      .ok_or_else(|| ApiError::validation("\"category_id\" is required"))?;
    check_max_capacity(self.max_capacity)?;
    let tags = self
      .tags
      .ok_or_else(|| ApiError::validation("\"tags\" is required"))?;

    Ok((
      NewEvent {
        title,
        description,
        event_datetime,
        location,
        author_id: self.author_id.unwrap_or(caller_id),
        category_id,
        max_capacity: self.max_capacity,
      },
      tags,
    ))
  }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventResponse {
  pub message: String,
  pub event_id: i64,
  pub tags: Vec<String>,
}

/// Partial update of an event. `tags` is kept apart from the column changeset: `None` means the
/// caller did not mention tags at all, `Some("")` means the event should end up with no tags.
#[derive(Deserialize, Default)]
pub struct UpdateEventRequest {
  pub title: Option<String>,
  pub description: Option<String>,
  pub event_datetime: Option<String>,
  pub location: Option<String>,
  pub author_id: Option<i64>,
  pub category_id: Option<i64>,
  pub max_capacity: Option<i32>,
  pub tags: Option<String>,
}

#[derive(AsChangeset, Default, Debug, PartialEq)]
#[diesel(table_name = events)]
pub struct EventChangeset {
  pub title: Option<String>,
  pub description: Option<String>,
  pub event_datetime: Option<NaiveDateTime>,
  pub location: Option<String>,
  pub author_id: Option<i64>,
  pub category_id: Option<i64>,
  pub max_capacity: Option<i32>,
}

impl EventChangeset {
  pub fn is_empty(&self) -> bool {
    *self == EventChangeset::default()
  }
}

impl UpdateEventRequest {
  pub fn into_changeset(self) -> Result<(EventChangeset, Option<String>), ApiError> {
    check_max_capacity(self.max_capacity)?;
    let event_datetime = match self.event_datetime {
      Some(raw) => Some(parse_datetime_field(&raw)?),
      None => None,
    };

    let changeset = EventChangeset {
      title: non_blank(self.title, "title")?,
      description: non_blank(self.description, "description")?,
      event_datetime,
      location: non_blank(self.location, "location")?,
      author_id: self.author_id,
      category_id: self.category_id,
      max_capacity: self.max_capacity,
    };
    if changeset.is_empty() && self.tags.is_none() {
      return Err(ApiError::validation("No fields to update."));
    }
    Ok((changeset, self.tags))
  }
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
  pub events: Vec<Event>,
  pub total: i64,
  pub page: i64,
  pub total_pages: i64,
}

#[derive(Queryable, Serialize, Deserialize, Debug, PartialEq)]
pub struct ReactionTally {
  pub id: i64,
  pub title: String,
  pub likes: i64,
  pub dislikes: i64,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RelatedEvents {
  pub related_events: Vec<Event>,
}

#[test]
fn test_parse_event_datetime() {
  let expected = NaiveDate::from_ymd_opt(2024, 6, 1)
    .unwrap()
    .and_hms_opt(18, 30, 0)
    .unwrap();
  assert_eq!(parse_event_datetime("2024-06-01T18:30"), Some(expected));
  assert_eq!(parse_event_datetime("2024-06-01 18:30:00"), Some(expected));
  assert_eq!(parse_event_datetime("2024-06-01T20:30:00+02:00"), Some(expected));
  assert_eq!(parse_event_datetime("2024-06-01T18:30:00.000Z"), Some(expected));
  assert_eq!(
    parse_event_datetime("2024-06-01"),
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(0, 0, 0)
  );
  assert_eq!(parse_event_datetime("next tuesday"), None);
}

#[test]
fn test_update_request_distinguishes_absent_and_empty_tags() {
  let absent: UpdateEventRequest = serde_json::from_str(r#"{"title": "New title"}"#).unwrap();
  let (changeset, tags) = absent.into_changeset().unwrap();
  assert_eq!(changeset.title.as_deref(), Some("New title"));
  assert_eq!(tags, None);

  let empty: UpdateEventRequest = serde_json::from_str(r#"{"tags": ""}"#).unwrap();
  let (changeset, tags) = empty.into_changeset().unwrap();
  assert!(changeset.is_empty());
  assert_eq!(tags.as_deref(), Some(""));

  let nothing: UpdateEventRequest = serde_json::from_str("{}").unwrap();
  assert!(matches!(nothing.into_changeset(), Err(ApiError::Validation(_))));
}

#[test]
fn test_update_request_rejects_blank_text_fields() {
  for body in [
    r#"{"title": ""}"#,
    r#"{"description": " "}"#,
    r#"{"location": "   ", "tags": ""}"#,
  ] {
    let request: UpdateEventRequest = serde_json::from_str(body).unwrap();
    assert!(matches!(request.into_changeset(), Err(ApiError::Validation(_))));
  }
}

#[test]
fn test_create_request_validation() {
  let request = CreateEventRequest {
    title: Some(String::from("Jazz night")),
    description: Some(String::from("Live music")),
    event_datetime: Some(String::from("2024-06-01T18:30")),
    location: Some(String::from("Harbour stage")),
    category_id: Some(3),
    max_capacity: Some(0),
    tags: Some(String::from("music")),
    ..Default::default()
  };
  assert!(matches!(
    request.into_new_event(7),
    Err(ApiError::Validation(_))
  ));

  let request = CreateEventRequest {
    title: Some(String::from("Jazz night")),
    description: Some(String::from("Live music")),
    event_datetime: Some(String::from("2024-06-01T18:30")),
    location: Some(String::from("Harbour stage")),
    category_id: Some(3),
    tags: Some(String::from("music, jazz")),
    ..Default::default()
  };
  let (new_event, tags) = request.into_new_event(7).unwrap();
  assert_eq!(new_event.author_id, 7);
  assert_eq!(new_event.max_capacity, None);
  assert_eq!(tags, "music, jazz");
}
