use std::str::FromStr;

use diesel::prelude::*;
use rocket::{http::Status, response::status::Custom, serde::json::Json, Route};

use crate::{
  db_util::login::{
    generate_login_token, get_user_by_email, hash_password, insert_new_login_token,
    insert_new_user, verify_password,
  },
  error::{ApiError, ApiResult},
  models::user::{
    is_valid_email, AdminUser, AuthenticatedUser, CreateUserRequest, CreateUserResponse,
    LoginRequest, LoginResponse, NewUser, UpdateUserRequest, UpdateUserResponse, User, UserName,
    UserType, STATUS_ACTIVE, STATUS_INACTIVE,
  },
  EventBoardDbConn,
};

pub fn routes() -> Vec<Route> {
  routes![
    login,
    create_user,
    list_users,
    update_user,
    change_status,
    get_user,
    get_user_name_by_id
  ]
}

async fn load_user(conn: &EventBoardDbConn, user_id: i64) -> ApiResult<User> {
  use crate::schema::users;

  conn
    .run(move |conn| users::table.find(user_id).first::<User>(conn).optional())
    .await?
    .ok_or_else(|| ApiError::not_found("User not found."))
}

#[post("/login", data = "<login_request>")]
pub async fn login(
  conn: EventBoardDbConn,
  login_request: Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
  let LoginRequest { email, password } = login_request.into_inner();
  let (email, password) = match (email, password) {
    (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() =>
      (email, password),
    _ => return Err(ApiError::validation("Email and password are required.")),
  };

  let user = match get_user_by_email(&conn, email.clone()).await? {
    Some(user) => user,
    None => return Err(ApiError::not_found("User not found.")),
  };
  if !verify_password(&password, &user.password_hash) {
    warn!("Failed login attempt for {}", email);
    return Err(ApiError::Unauthorized(String::from("Invalid password.")));
  }
  if !user.is_active() {
    return Err(ApiError::forbidden("User is not active."));
  }

  let token = generate_login_token();
  insert_new_login_token(&conn, user.id, token.clone()).await?;
  info!("User {} logged in", user.id);

  Ok(Json(LoginResponse { token }))
}

fn required_field(value: Option<String>, field: &str) -> ApiResult<String> {
  value
    .filter(|value| !value.trim().is_empty())
    .ok_or_else(|| ApiError::validation(format!("\"{}\" is required", field)))
}

#[post("/createUser", data = "<create_user_request>")]
pub async fn create_user(
  conn: EventBoardDbConn,
  admin: Result<AdminUser, ApiError>,
  create_user_request: Json<CreateUserRequest>,
) -> ApiResult<Custom<Json<CreateUserResponse>>> {
  admin?;

  let req = create_user_request.into_inner();
  let email = required_field(req.email, "email")?;
  let first_name = required_field(req.name, "name")?;
  let last_name = required_field(req.lastname, "lastname")?;
  let user_type = UserType::from_str(&required_field(req.user_type, "type")?)?;
  let password = required_field(req.password, "password")?;
  if !is_valid_email(&email) {
    return Err(ApiError::validation("\"email\" must be a valid email"));
  }

  if get_user_by_email(&conn, email.clone()).await?.is_some() {
    return Err(ApiError::Conflict(String::from("User already exists.")));
  }

  let password_hash = hash_password(&password).map_err(ApiError::Internal)?;
  let user_id = insert_new_user(&conn, NewUser {
    email,
    first_name,
    last_name,
    user_type: user_type.as_str().to_owned(),
    status: STATUS_ACTIVE.to_owned(),
    password_hash,
  })
  .await
  .map_err(|err| {
    ApiError::on_unique_violation(err, ApiError::Conflict(String::from("User already exists.")))
  })?;
  info!("Created user {} with type {}", user_id, user_type.as_str());

  Ok(Custom(Status::Created, Json(CreateUserResponse { user_id })))
}

#[get("/")]
pub async fn list_users(
  conn: EventBoardDbConn,
  admin: Result<AdminUser, ApiError>,
) -> ApiResult<Json<Vec<User>>> {
  use crate::schema::users;

  admin?;
  let users: Vec<User> = conn
    .run(|conn| users::table.order(users::dsl::id.asc()).load(conn))
    .await?;
  Ok(Json(users))
}

#[patch("/update/<user_id>", data = "<update_request>")]
pub async fn update_user(
  conn: EventBoardDbConn,
  admin: Result<AdminUser, ApiError>,
  user_id: i64,
  update_request: Json<UpdateUserRequest>,
) -> ApiResult<Json<UpdateUserResponse>> {
  use crate::schema::users;

  admin?;
  let changeset = update_request.into_inner().into_changeset()?;

  let updated_rows = conn
    .run(move |conn| {
      diesel::update(users::table.find(user_id))
        .set(&changeset)
        .execute(conn)
    })
    .await
    .map_err(|err| {
      ApiError::on_unique_violation(err, ApiError::Conflict(String::from("Email already in use.")))
    })?;
  if updated_rows == 0 {
    return Err(ApiError::not_found("User not found."));
  }

  let user = load_user(&conn, user_id).await?;
  Ok(Json(UpdateUserResponse {
    message: String::from("User updated successfully."),
    user,
  }))
}

#[post("/changeStatus/<user_id>")]
pub async fn change_status(
  conn: EventBoardDbConn,
  admin: Result<AdminUser, ApiError>,
  user_id: i64,
) -> ApiResult<Json<UpdateUserResponse>> {
  use crate::schema::users;

  admin?;
  let user = load_user(&conn, user_id).await?;
  if user.is_admin() {
    return Err(ApiError::forbidden("Cannot change the status of an admin."));
  }

  let new_status = if user.is_active() {
    STATUS_INACTIVE
  } else {
    STATUS_ACTIVE
  };
  conn
    .run(move |conn| {
      diesel::update(users::table.find(user_id))
        .set(users::dsl::status.eq(new_status))
        .execute(conn)
    })
    .await?;
  info!("User {} is now {}", user_id, new_status);

  let user = load_user(&conn, user_id).await?;
  Ok(Json(UpdateUserResponse {
    message: format!("User status changed to {}.", new_status),
    user,
  }))
}

#[get("/<user_id>")]
pub async fn get_user(
  conn: EventBoardDbConn,
  caller: Result<AuthenticatedUser, ApiError>,
  user_id: i64,
) -> ApiResult<Json<User>> {
  caller?;
  Ok(Json(load_user(&conn, user_id).await?))
}

#[get("/getUserNameById/<user_id>")]
pub async fn get_user_name_by_id(
  conn: EventBoardDbConn,
  caller: Result<AuthenticatedUser, ApiError>,
  user_id: i64,
) -> ApiResult<Json<UserName>> {
  use crate::schema::users;

  caller?;
  let name: Option<UserName> = conn
    .run(move |conn| {
      users::table
        .find(user_id)
        .select((users::dsl::first_name, users::dsl::last_name))
        .first(conn)
        .optional()
    })
    .await?;
  name
    .map(Json)
    .ok_or_else(|| ApiError::not_found("User not found."))
}
