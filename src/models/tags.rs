use crate::schema::{event_tags, tags};

#[derive(Insertable)]
#[diesel(table_name = tags)]
pub struct NewTag {
  pub name: String,
}

#[derive(Serialize, Queryable, Debug, Clone, PartialEq)]
pub struct Tag {
  pub id: i64,
  pub name: String,
}

#[derive(Insertable)]
#[diesel(table_name = event_tags)]
pub struct NewEventTag {
  pub event_id: i64,
  pub tag_id: i64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct TagCount {
  pub name: String,
  pub count: i64,
}

#[derive(Queryable)]
pub struct EntityIdTag {
  pub entity_id: i64,
  pub tag: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TagId {
  pub id: i64,
}
