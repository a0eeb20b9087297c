use std::convert::TryFrom;

use base64::Engine;
use diesel::{prelude::*, QueryResult, SqliteConnection};
use scrypt::{
  password_hash::{
    rand_core::{OsRng, RngCore},
    PasswordHash, PasswordHasher, PasswordVerifier, Salt, SaltString,
  },
  Scrypt,
};

use crate::{
  db_util::last_inserted_id,
  models::user::{NewLoginToken, NewUser, User, UserType, STATUS_ACTIVE},
  EventBoardDbConn,
};

pub fn hash_password(password: &str) -> Result<String, String> {
  let salt = SaltString::generate(&mut OsRng);
  let params = scrypt::Params::new(15, 2, 2, scrypt::Params::RECOMMENDED_LEN)
    .map_err(|err| format!("Invalid scrypt params: {}", err))?;
  let salt = Salt::try_from(salt.as_ref()).map_err(|err| format!("Invalid salt: {}", err))?;
  let hash = Scrypt
    .hash_password_customized(password.as_bytes(), None, None, params, salt)
    .map_err(|err| format!("Error hashing password: {}", err))?
    .to_string();
  Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
  let hash = match PasswordHash::new(hash) {
    Ok(hash) => hash,
    Err(err) => {
      warn!("Stored password hash could not be parsed: {}", err);
      return false;
    },
  };
  Scrypt.verify_password(password.as_bytes(), &hash).is_ok()
}

pub fn generate_login_token() -> String {
  let mut rng = OsRng;
  let mut bytes = [0u8; 64];
  rng.fill_bytes(&mut bytes);
  base64::engine::general_purpose::STANDARD.encode(&bytes)
}

pub async fn get_user_by_email(
  conn: &EventBoardDbConn,
  email: String,
) -> QueryResult<Option<User>> {
  use crate::schema::users;

  conn
    .run(move |conn| -> QueryResult<Option<_>> {
      users::table
        .filter(users::dsl::email.eq(email))
        .first(conn)
        .optional()
    })
    .await
}

pub async fn get_user_by_login_token(
  conn: &EventBoardDbConn,
  login_token: String,
) -> QueryResult<Option<User>> {
  use crate::schema::{login_tokens, users};

  conn
    .run(move |conn| {
      login_tokens::table
        .inner_join(users::table)
        .filter(login_tokens::dsl::token.eq(login_token))
        .select(users::all_columns)
        .first::<User>(conn)
        .optional()
    })
    .await
}

pub fn create_user(conn: &mut SqliteConnection, new_user: NewUser) -> QueryResult<i64> {
  use crate::schema::users;

  conn.transaction(|conn| {
    diesel::insert_into(users::table)
      .values(&new_user)
      .execute(conn)?;
    last_inserted_id(conn)
  })
}

pub async fn insert_new_user(conn: &EventBoardDbConn, new_user: NewUser) -> QueryResult<i64> {
  conn.run(move |conn| create_user(conn, new_user)).await
}

pub async fn insert_new_login_token(
  conn: &EventBoardDbConn,
  user_id: i64,
  token: String,
) -> QueryResult<()> {
  use crate::schema::login_tokens;

  conn
    .run(move |conn| {
      diesel::insert_into(login_tokens::table)
        .values(NewLoginToken { user_id, token })
        .execute(conn)
    })
    .await
    .map(drop)
}

/// Creates an active admin account for `email` unless a user with that email already exists.
/// Returns the new user's id when one was created.
pub fn ensure_admin_user(
  conn: &mut SqliteConnection,
  email: &str,
  password: &str,
) -> Result<Option<i64>, String> {
  use crate::schema::users;

  let existing: Option<i64> = users::table
    .filter(users::dsl::email.eq(email))
    .select(users::dsl::id)
    .first(conn)
    .optional()
    .map_err(|err| format!("Error looking up admin user: {}", err))?;
  if existing.is_some() {
    return Ok(None);
  }

  let password_hash = hash_password(password)?;
  let user_id = create_user(conn, NewUser {
    email: email.to_owned(),
    first_name: String::from("Admin"),
    last_name: String::from("User"),
    user_type: UserType::Admin.as_str().to_owned(),
    status: STATUS_ACTIVE.to_owned(),
    password_hash,
  })
  .map_err(|err| format!("Error creating admin user: {}", err))?;
  Ok(Some(user_id))
}

#[test]
fn test_hash_password() {
  let password = "password";
  let hash = hash_password(password).unwrap();
  assert!(verify_password(password, &hash));
  assert!(!verify_password("hunter2", &hash));
  assert!(!verify_password(password, "not a hash"));
}

#[test]
fn test_ensure_admin_user_is_idempotent() {
  use crate::{db_util::test_connection, schema::users};

  let mut conn = test_connection();
  let created = ensure_admin_user(&mut conn, "root@example.com", "s3cret").unwrap();
  assert!(created.is_some());
  assert_eq!(
    ensure_admin_user(&mut conn, "root@example.com", "other").unwrap(),
    None
  );

  let admin: User = users::table.first(&mut conn).unwrap();
  assert!(admin.is_admin());
  assert!(admin.is_active());
  assert!(verify_password("s3cret", &admin.password_hash));
}
