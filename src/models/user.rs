use std::str::FromStr;

use chrono::NaiveDateTime;
use rocket::{
  http::Status,
  request::{FromRequest, Outcome},
  Request,
};

use crate::{
  db_util::login::get_user_by_login_token,
  error::ApiError,
  schema::{login_tokens, users},
  EventBoardDbConn,
};

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_INACTIVE: &str = "inactive";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserType {
  EventCreator,
  Admin,
}

impl UserType {
  pub fn as_str(&self) -> &'static str {
    match self {
      UserType::EventCreator => "event_creator",
      UserType::Admin => "admin",
    }
  }
}

impl FromStr for UserType {
  type Err = ApiError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "event_creator" => Ok(UserType::EventCreator),
      "admin" => Ok(UserType::Admin),
      other => Err(ApiError::validation(format!(
        "\"user_type\" must be one of [event_creator, admin], got \"{}\"",
        other
      ))),
    }
  }
}

pub fn is_valid_email(email: &str) -> bool {
  if email.chars().any(char::is_whitespace) {
    return false;
  }
  match email.split_once('@') {
    Some((local, domain)) =>
      !local.is_empty()
        && !domain.contains('@')
        && domain
          .split_once('.')
          .map(|(host, tld)| !host.is_empty() && !tld.is_empty())
          .unwrap_or(false),
    None => false,
  }
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
  pub email: String,
  pub first_name: String,
  pub last_name: String,
  pub user_type: String,
  pub status: String,
  pub password_hash: String,
}

#[derive(Insertable)]
#[diesel(table_name = login_tokens)]
pub struct NewLoginToken {
  pub user_id: i64,
  pub token: String,
}

#[derive(Queryable, Serialize, Clone, Debug)]
pub struct User {
  pub id: i64,
  pub email: String,
  pub first_name: String,
  pub last_name: String,
  pub user_type: String,
  pub status: String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub created_at: NaiveDateTime,
}

impl User {
  pub fn is_admin(&self) -> bool {
    self.user_type == UserType::Admin.as_str()
  }

  pub fn is_active(&self) -> bool {
    self.status == STATUS_ACTIVE
  }
}

#[derive(Queryable, Serialize, Deserialize, Debug)]
pub struct UserName {
  pub first_name: String,
  pub last_name: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
  pub email: Option<String>,
  pub password: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
  pub token: String,
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
  pub email: Option<String>,
  pub name: Option<String>,
  pub lastname: Option<String>,
  #[serde(rename = "type")]
  pub user_type: Option<String>,
  pub password: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserResponse {
  pub user_id: i64,
}

#[derive(Deserialize, Default)]
pub struct UpdateUserRequest {
  pub email: Option<String>,
  pub first_name: Option<String>,
  pub last_name: Option<String>,
  pub user_type: Option<String>,
}

#[derive(AsChangeset, Default, Debug, PartialEq)]
#[diesel(table_name = users)]
pub struct UserChangeset {
  pub email: Option<String>,
  pub first_name: Option<String>,
  pub last_name: Option<String>,
  pub user_type: Option<String>,
}

impl UpdateUserRequest {
  pub fn into_changeset(self) -> Result<UserChangeset, ApiError> {
    if let Some(email) = &self.email {
      if !is_valid_email(email) {
        return Err(ApiError::validation("\"email\" must be a valid email"));
      }
    }
    for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
      if let Some(value) = value {
        if value.chars().count() < 2 {
          return Err(ApiError::validation(format!(
            "\"{}\" length must be at least 2 characters long",
            field
          )));
        }
      }
    }
    let user_type = match self.user_type {
      Some(user_type) => Some(UserType::from_str(&user_type)?.as_str().to_owned()),
      None => None,
    };

    let changeset = UserChangeset {
      email: self.email,
      first_name: self.first_name,
      last_name: self.last_name,
      user_type,
    };
    if changeset == UserChangeset::default() {
      return Err(ApiError::validation("No valid fields provided to update."));
    }
    Ok(changeset)
  }
}

#[derive(Serialize)]
pub struct UpdateUserResponse {
  pub message: String,
  pub user: User,
}

/// Extracts the token from an `Authorization` header value. Both `Bearer <token>` and a bare
/// token are accepted.
pub fn bearer_token(header: &str) -> Option<&str> {
  let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
  if token.is_empty() {
    None
  } else {
    Some(token)
  }
}

pub struct MaybeLoginToken(pub Option<String>);

impl MaybeLoginToken {
  pub fn from_headers(request: &Request<'_>) -> Self {
    let token = request
      .headers()
      .get_one("Authorization")
      .and_then(bearer_token)
      .map(|token| token.to_string());
    MaybeLoginToken(token)
  }
}

/// A caller holding a valid login token for an active user.
pub struct AuthenticatedUser(pub User);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
  type Error = ApiError;

  async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
    let login_token = match MaybeLoginToken::from_headers(request).0 {
      Some(login_token) => login_token,
      None =>
        return Outcome::Error((
          Status::Unauthorized,
          ApiError::Unauthorized(String::from("Access denied. No token provided.")),
        )),
    };

    let conn = match request.guard::<EventBoardDbConn>().await {
      Outcome::Success(conn) => conn,
      _ =>
        return Outcome::Error((
          Status::ServiceUnavailable,
          ApiError::Internal(String::from("Database connection unavailable")),
        )),
    };

    match get_user_by_login_token(&conn, login_token).await {
      Ok(Some(user)) if !user.is_active() => Outcome::Error((
        Status::Forbidden,
        ApiError::forbidden("User is not active."),
      )),
      Ok(Some(user)) => Outcome::Success(AuthenticatedUser(user)),
      Ok(None) => {
        warn!("Rejected request to {} with unknown login token", request.uri());
        Outcome::Error((
          Status::Unauthorized,
          ApiError::Unauthorized(String::from("Invalid token.")),
        ))
      },
      Err(err) => Outcome::Error((Status::InternalServerError, ApiError::Persistence(err))),
    }
  }
}

/// An authenticated caller whose `user_type` is admin.
pub struct AdminUser(pub User);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
  type Error = ApiError;

  async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
    match AuthenticatedUser::from_request(request).await {
      Outcome::Success(AuthenticatedUser(user)) if user.is_admin() =>
        Outcome::Success(AdminUser(user)),
      Outcome::Success(_) => Outcome::Error((
        Status::Forbidden,
        ApiError::forbidden("Access denied. Admins only."),
      )),
      Outcome::Error(err) => Outcome::Error(err),
      Outcome::Forward(status) => Outcome::Forward(status),
    }
  }
}

#[test]
fn test_bearer_token() {
  assert_eq!(bearer_token("Bearer abc123"), Some("abc123"));
  assert_eq!(bearer_token("abc123"), Some("abc123"));
  assert_eq!(bearer_token("Bearer "), None);
  assert_eq!(bearer_token(""), None);
}

#[test]
fn test_is_valid_email() {
  assert!(is_valid_email("jane@example.com"));
  assert!(!is_valid_email("jane.example.com"));
  assert!(!is_valid_email("jane@localhost"));
  assert!(!is_valid_email("jane doe@example.com"));
  assert!(!is_valid_email("@example.com"));
}

#[test]
fn test_update_user_changeset() {
  let empty = UpdateUserRequest::default().into_changeset();
  assert!(matches!(empty, Err(ApiError::Validation(_))));

  let short_name = UpdateUserRequest {
    first_name: Some(String::from("J")),
    ..Default::default()
  }
  .into_changeset();
  assert!(matches!(short_name, Err(ApiError::Validation(_))));

  let bad_type = UpdateUserRequest {
    user_type: Some(String::from("superuser")),
    ..Default::default()
  }
  .into_changeset();
  assert!(matches!(bad_type, Err(ApiError::Validation(_))));

  let changeset = UpdateUserRequest {
    last_name: Some(String::from("Doe")),
    user_type: Some(String::from("admin")),
    ..Default::default()
  }
  .into_changeset()
  .unwrap();
  assert_eq!(changeset, UserChangeset {
    email: None,
    first_name: None,
    last_name: Some(String::from("Doe")),
    user_type: Some(String::from("admin")),
  });
}
