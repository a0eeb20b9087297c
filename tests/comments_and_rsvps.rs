mod common;

use common::spawn_app;
use rocket::http::{Header, Status};
use serde_json::json;

#[test]
fn comments_are_listed_newest_first() {
  let app = spawn_app();
  let token = app.admin_token();
  let category_id = app.create_category(&token, "Music");
  let event_id = app.create_event(&token, category_id, "Jazz night", "music");

  let (status, first) = app.post_json(
    "/api/comments",
    None,
    json!({ "eventId": event_id, "userName": "Grace", "content": "Can't wait" }),
  );
  assert_eq!(status, Status::Created);
  assert_eq!(first["authorName"], "Grace");
  assert_eq!(first["likes"], 0);

  let (status, second) = app.post_json(
    "/api/comments",
    None,
    json!({ "eventId": event_id, "userName": "Linus", "content": "Same" }),
  );
  assert_eq!(status, Status::Created);

  let (status, _) = app.post_json(
    "/api/comments",
    None,
    json!({ "eventId": event_id, "content": "Anonymous" }),
  );
  assert_eq!(status, Status::BadRequest);
  let (status, _) = app.post_json(
    "/api/comments",
    None,
    json!({ "eventId": 999, "userName": "Grace", "content": "Lost" }),
  );
  assert_eq!(status, Status::NotFound);

  let (status, body) = app.get(&format!("/api/comments/{}", event_id), None);
  assert_eq!(status, Status::Ok);
  let ids: Vec<i64> = body
    .as_array()
    .unwrap()
    .iter()
    .map(|comment| comment["id"].as_i64().unwrap())
    .collect();
  assert_eq!(ids, vec![
    second["id"].as_i64().unwrap(),
    first["id"].as_i64().unwrap()
  ]);

  let (_, body) = app.get("/api/comments", None);
  assert_eq!(body.as_array().unwrap().len(), 2);

  let (status, body) = app.get(&format!("/api/comments/byId/{}", first["id"]), None);
  assert_eq!(status, Status::Ok);
  assert_eq!(body["content"], "Can't wait");
  let (status, _) = app.get("/api/comments/byId/999", None);
  assert_eq!(status, Status::NotFound);
}

#[test]
fn comment_votes_are_counted_once() {
  let app = spawn_app();
  let token = app.admin_token();
  let category_id = app.create_category(&token, "Music");
  let event_id = app.create_event(&token, category_id, "Jazz night", "music");
  let (_, comment) = app.post_json(
    "/api/comments",
    None,
    json!({ "eventId": event_id, "userName": "Grace", "content": "Great" }),
  );
  let like_uri = format!("/api/comments/like/{}", comment["id"]);
  let dislike_uri = format!("/api/comments/dislike/{}", comment["id"]);

  let vote = |uri: &str, client_id: &str| {
    app
      .client
      .patch(uri)
      .header(Header::new("X-Client-Id", client_id.to_owned()))
      .dispatch()
      .status()
  };
  assert_eq!(vote(&like_uri, "alice"), Status::Ok);
  assert_eq!(vote(&like_uri, "alice"), Status::Forbidden);
  assert_eq!(vote(&dislike_uri, "alice"), Status::Forbidden);
  assert_eq!(vote(&like_uri, "bob"), Status::Ok);

  // a logged in user votes as themselves whatever client id they send
  let res = app
    .client
    .patch(dislike_uri.as_str())
    .header(common::bearer(&token))
    .header(Header::new("X-Client-Id", "alice"))
    .dispatch();
  assert_eq!(res.status(), Status::Ok);

  let (_, body) = app.get(&format!("/api/comments/byId/{}", comment["id"]), None);
  assert_eq!(body["likes"], 2);
  assert_eq!(body["dislikes"], 1);
}

#[test]
fn rsvps_respect_capacity() {
  let app = spawn_app();
  let admin_token = app.admin_token();
  let category_id = app.create_category(&admin_token, "Workshops");
  let event_id = app.create_event_with_capacity(
    &admin_token,
    category_id,
    "Pottery class",
    "craft",
    Some(1),
  );
  let (_, guest_token) = app.create_creator(&admin_token, "guest@example.com");

  let (status, _) = app.post_json("/api/rsvps", None, json!({ "event_id": event_id }));
  assert_eq!(status, Status::Unauthorized);

  let (status, body) = app.post_json(
    "/api/rsvps/check",
    Some(&guest_token),
    json!({ "event_id": event_id }),
  );
  assert_eq!(status, Status::Ok);
  assert_eq!(body["rsvped"], false);

  let (status, body) = app.post_json(
    "/api/rsvps",
    Some(&guest_token),
    json!({ "event_id": event_id }),
  );
  assert_eq!(status, Status::Created);
  assert!(body["rsvpId"].is_i64());

  let (status, _) = app.post_json(
    "/api/rsvps",
    Some(&guest_token),
    json!({ "event_id": event_id }),
  );
  assert_eq!(status, Status::BadRequest);

  let (status, _) = app.post_json(
    "/api/rsvps",
    Some(&admin_token),
    json!({ "event_id": event_id, "registered_at": "2099-05-01T10:00" }),
  );
  assert_eq!(status, Status::BadRequest);

  let (status, _) = app.post_json("/api/rsvps", Some(&admin_token), json!({ "event_id": 999 }));
  assert_eq!(status, Status::NotFound);
  let (status, _) = app.post_json("/api/rsvps", Some(&admin_token), json!({}));
  assert_eq!(status, Status::BadRequest);

  let (status, body) = app.get(&format!("/api/rsvps/{}", event_id), None);
  assert_eq!(status, Status::Ok);
  assert_eq!(body, json!({ "eventId": event_id, "rsvpCount": 1 }));

  let (_, body) = app.post_json(
    "/api/rsvps/check",
    Some(&guest_token),
    json!({ "event_id": event_id }),
  );
  assert_eq!(body["rsvped"], true);
}

#[test]
fn deleting_an_event_removes_its_comments_and_rsvps() {
  let app = spawn_app();
  let token = app.admin_token();
  let category_id = app.create_category(&token, "Music");
  let event_id = app.create_event(&token, category_id, "Jazz night", "music");
  app.post_json(
    "/api/comments",
    None,
    json!({ "eventId": event_id, "userName": "Grace", "content": "Great" }),
  );
  app.post_json("/api/rsvps", Some(&token), json!({ "event_id": event_id }));

  let (status, _) = app.delete(&format!("/api/events/delete/{}", event_id), Some(&token));
  assert_eq!(status, Status::Ok);

  let (_, comments) = app.get("/api/comments", None);
  assert!(comments.as_array().unwrap().is_empty());
  let (_, count) = app.get(&format!("/api/rsvps/{}", event_id), None);
  assert_eq!(count["rsvpCount"], 0);
}
