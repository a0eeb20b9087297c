mod common;

use common::{spawn_app, ADMIN_EMAIL, ADMIN_PASSWORD};
use rocket::http::Status;
use serde_json::json;

#[test]
fn login_reports_unknown_email_and_wrong_password() {
  let app = spawn_app();

  let (status, body) = app.post_json(
    "/api/users/login",
    None,
    json!({ "email": "nobody@example.com", "password": "whatever" }),
  );
  assert_eq!(status, Status::NotFound);
  assert!(body["message"].is_string());

  let (status, _) = app.post_json(
    "/api/users/login",
    None,
    json!({ "email": ADMIN_EMAIL, "password": "wrong" }),
  );
  assert_eq!(status, Status::Unauthorized);

  let (status, _) = app.post_json("/api/users/login", None, json!({ "email": ADMIN_EMAIL }));
  assert_eq!(status, Status::BadRequest);

  let token = app.login(ADMIN_EMAIL, ADMIN_PASSWORD);
  assert!(!token.is_empty());
}

#[test]
fn guarded_routes_reject_missing_and_unknown_tokens() {
  let app = spawn_app();

  let (status, body) = app.get("/api/users/1", None);
  assert_eq!(status, Status::Unauthorized);
  assert_eq!(body["message"], "Access denied. No token provided.");

  let (status, body) = app.get("/api/users/1", Some("not-a-real-token"));
  assert_eq!(status, Status::Unauthorized);
  assert_eq!(body["message"], "Invalid token.");
}

#[test]
fn admin_routes_require_admin() {
  let app = spawn_app();
  let admin_token = app.admin_token();
  let (_, creator_token) = app.create_creator(&admin_token, "creator@example.com");

  let (status, body) = app.get("/api/users", Some(&creator_token));
  assert_eq!(status, Status::Forbidden);
  assert_eq!(body["message"], "Access denied. Admins only.");

  let (status, body) = app.get("/api/users", Some(&admin_token));
  assert_eq!(status, Status::Ok);
  let users = body.as_array().unwrap();
  assert_eq!(users.len(), 2);
  assert!(users.iter().all(|user| user.get("password_hash").is_none()));
}

#[test]
fn create_user_validation_and_conflicts() {
  let app = spawn_app();
  let admin_token = app.admin_token();
  app.create_creator(&admin_token, "dup@example.com");

  let (status, _) = app.post_json(
    "/api/users/createUser",
    Some(&admin_token),
    json!({
      "email": "dup@example.com",
      "name": "Dup",
      "lastname": "Licate",
      "type": "event_creator",
      "password": "hunter22",
    }),
  );
  assert_eq!(status, Status::Conflict);

  let (status, _) = app.post_json(
    "/api/users/createUser",
    Some(&admin_token),
    json!({
      "email": "new@example.com",
      "name": "New",
      "lastname": "User",
      "type": "superuser",
      "password": "hunter22",
    }),
  );
  assert_eq!(status, Status::BadRequest);

  let (status, _) = app.post_json(
    "/api/users/createUser",
    Some(&admin_token),
    json!({ "email": "new@example.com" }),
  );
  assert_eq!(status, Status::BadRequest);
}

#[test]
fn update_user_and_lookup_names() {
  let app = spawn_app();
  let admin_token = app.admin_token();
  let (user_id, creator_token) = app.create_creator(&admin_token, "rename@example.com");

  let (status, _) = app.patch_json(
    &format!("/api/users/update/{}", user_id),
    Some(&admin_token),
    json!({}),
  );
  assert_eq!(status, Status::BadRequest);

  let (status, _) = app.patch_json(
    &format!("/api/users/update/{}", user_id),
    Some(&admin_token),
    json!({ "first_name": "X" }),
  );
  assert_eq!(status, Status::BadRequest);

  let (status, body) = app.patch_json(
    &format!("/api/users/update/{}", user_id),
    Some(&admin_token),
    json!({ "first_name": "Robin", "last_name": "Renamed" }),
  );
  assert_eq!(status, Status::Ok);
  assert_eq!(body["user"]["first_name"], "Robin");

  let (status, _) = app.patch_json(
    "/api/users/update/999",
    Some(&admin_token),
    json!({ "first_name": "Ghost" }),
  );
  assert_eq!(status, Status::NotFound);

  let (status, body) = app.get(
    &format!("/api/users/getUserNameById/{}", user_id),
    Some(&creator_token),
  );
  assert_eq!(status, Status::Ok);
  assert_eq!(body, json!({ "first_name": "Robin", "last_name": "Renamed" }));

  let (status, body) = app.get(&format!("/api/users/{}", user_id), Some(&creator_token));
  assert_eq!(status, Status::Ok);
  assert_eq!(body["email"], "rename@example.com");

  let (status, _) = app.get("/api/users/999", Some(&creator_token));
  assert_eq!(status, Status::NotFound);
}

#[test]
fn deactivated_users_are_locked_out() {
  let app = spawn_app();
  let admin_token = app.admin_token();
  let (user_id, creator_token) = app.create_creator(&admin_token, "leaving@example.com");

  let (status, body) = app.post_json(
    &format!("/api/users/changeStatus/{}", user_id),
    Some(&admin_token),
    json!({}),
  );
  assert_eq!(status, Status::Ok);
  assert_eq!(body["user"]["status"], "inactive");

  let (status, body) = app.get(&format!("/api/users/{}", user_id), Some(&creator_token));
  assert_eq!(status, Status::Forbidden);
  assert_eq!(body["message"], "User is not active.");

  let (status, _) = app.post_json(
    "/api/users/login",
    None,
    json!({ "email": "leaving@example.com", "password": "hunter22" }),
  );
  assert_eq!(status, Status::Forbidden);

  let (status, body) = app.post_json(
    &format!("/api/users/changeStatus/{}", user_id),
    Some(&admin_token),
    json!({}),
  );
  assert_eq!(status, Status::Ok);
  assert_eq!(body["user"]["status"], "active");
  let (status, _) = app.get(&format!("/api/users/{}", user_id), Some(&creator_token));
  assert_eq!(status, Status::Ok);

  // the bootstrap admin is user 1
  let (status, _) = app.post_json("/api/users/changeStatus/1", Some(&admin_token), json!({}));
  assert_eq!(status, Status::Forbidden);
}
