use diesel::result::DatabaseErrorKind;
use rocket::{
  http::Status,
  response::{self, status::Custom, Responder},
  serde::json::Json,
  Request,
};

use crate::models::MessageResponse;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  Unauthorized(String),

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  #[error("an error occurred with the database: {0}")]
  Persistence(#[from] diesel::result::Error),

  #[error("{0}")]
  Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
  pub fn validation(msg: impl Into<String>) -> Self {
    ApiError::Validation(msg.into())
  }

  pub fn not_found(msg: impl Into<String>) -> Self {
    ApiError::NotFound(msg.into())
  }

  pub fn forbidden(msg: impl Into<String>) -> Self {
    ApiError::Forbidden(msg.into())
  }

  /// Turns a unique constraint violation into `conflict`, passing every other error through as
  /// a persistence failure.
  pub fn on_unique_violation(err: diesel::result::Error, conflict: ApiError) -> ApiError {
    match err {
      diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => conflict,
      other => ApiError::Persistence(other),
    }
  }

  /// Reports a write that referenced a missing row as a validation failure.
  pub fn on_foreign_key_violation(self, msg: &str) -> ApiError {
    match self {
      ApiError::Persistence(diesel::result::Error::DatabaseError(
        DatabaseErrorKind::ForeignKeyViolation,
        _,
      )) => ApiError::validation(msg),
      other => other,
    }
  }

  pub fn status(&self) -> Status {
    match self {
      ApiError::Validation(_) => Status::BadRequest,
      ApiError::Unauthorized(_) => Status::Unauthorized,
      ApiError::Forbidden(_) => Status::Forbidden,
      ApiError::NotFound(_) => Status::NotFound,
      ApiError::Conflict(_) => Status::Conflict,
      ApiError::Persistence(_) | ApiError::Internal(_) => Status::InternalServerError,
    }
  }

  /// The message sent to the client. Database details stay in the server log.
  pub fn public_message(&self) -> String {
    match self {
      ApiError::Persistence(_) => String::from("Internal server error."),
      other => other.to_string(),
    }
  }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for ApiError {
  fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
    match &self {
      ApiError::Persistence(err) => error!("DB error handling {}: {}", req.uri(), err),
      ApiError::Internal(msg) => error!("Internal error handling {}: {}", req.uri(), msg),
      _ => (),
    }

    let body = Json(MessageResponse::new(self.public_message()));
    Custom(self.status(), body).respond_to(req)
  }
}

#[test]
fn test_status_mapping() {
  assert_eq!(ApiError::validation("x").status(), Status::BadRequest);
  assert_eq!(
    ApiError::Persistence(diesel::result::Error::NotFound).status(),
    Status::InternalServerError
  );
  assert_eq!(
    ApiError::Persistence(diesel::result::Error::NotFound).public_message(),
    "Internal server error."
  );
  assert_eq!(
    ApiError::not_found("Event not found.").public_message(),
    "Event not found."
  );
}

#[test]
fn test_unique_violation_becomes_conflict() {
  let duplicate = diesel::result::Error::DatabaseError(
    DatabaseErrorKind::UniqueViolation,
    Box::new(String::from("UNIQUE constraint failed: users.email")),
  );
  let err = ApiError::on_unique_violation(duplicate, ApiError::Conflict(String::from("taken")));
  assert_eq!(err.status(), Status::Conflict);

  let err = ApiError::on_unique_violation(
    diesel::result::Error::NotFound,
    ApiError::Conflict(String::from("taken")),
  );
  assert!(matches!(err, ApiError::Persistence(_)));
}
