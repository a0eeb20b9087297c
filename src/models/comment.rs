use chrono::NaiveDateTime;

use crate::schema::comments;

#[derive(Queryable, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
  pub id: i64,
  pub event_id: i64,
  pub author_name: String,
  pub content: String,
  pub likes: i64,
  pub dislikes: i64,
  pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = comments)]
pub struct NewComment {
  pub event_id: i64,
  pub author_name: String,
  pub content: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
  pub event_id: Option<i64>,
  pub user_name: Option<String>,
  pub content: Option<String>,
}

impl CreateCommentRequest {
  pub fn into_new_comment(self) -> Option<NewComment> {
    let author_name = self.user_name.filter(|name| !name.trim().is_empty())?;
    let content = self.content.filter(|content| !content.trim().is_empty())?;
    Some(NewComment {
      event_id: self.event_id?,
      author_name,
      content,
    })
  }
}
