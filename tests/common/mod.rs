#![allow(dead_code)]

use event_board::{build_rocket, conf::Conf};
use rocket::{
  http::{ContentType, Header, Status},
  local::blocking::Client,
};
use serde_json::{json, Value};
use tempfile::TempDir;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

pub struct TestApp {
  pub client: Client,
  _db_dir: TempDir,
}

pub fn spawn_app() -> TestApp {
  let db_dir = tempfile::tempdir().unwrap();
  let conf = Conf {
    database_url: db_dir
      .path()
      .join("events.sqlite")
      .to_string_lossy()
      .into_owned(),
    admin_email: Some(String::from(ADMIN_EMAIL)),
    admin_password: Some(String::from(ADMIN_PASSWORD)),
    cors_allowed_origin: String::from("*"),
  };
  let client = Client::tracked(build_rocket(conf)).unwrap();

  TestApp {
    client,
    _db_dir: db_dir,
  }
}

pub fn bearer(token: &str) -> Header<'static> {
  Header::new("Authorization", format!("Bearer {}", token))
}

impl TestApp {
  pub fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> (Status, Value) {
    let mut req = self
      .client
      .post(uri)
      .header(ContentType::JSON)
      .body(body.to_string());
    if let Some(token) = token {
      req = req.header(bearer(token));
    }
    let res = req.dispatch();
    (res.status(), res.into_json().unwrap_or(Value::Null))
  }

  pub fn patch_json(&self, uri: &str, token: Option<&str>, body: Value) -> (Status, Value) {
    let mut req = self
      .client
      .patch(uri)
      .header(ContentType::JSON)
      .body(body.to_string());
    if let Some(token) = token {
      req = req.header(bearer(token));
    }
    let res = req.dispatch();
    (res.status(), res.into_json().unwrap_or(Value::Null))
  }

  pub fn get(&self, uri: &str, token: Option<&str>) -> (Status, Value) {
    let mut req = self.client.get(uri);
    if let Some(token) = token {
      req = req.header(bearer(token));
    }
    let res = req.dispatch();
    (res.status(), res.into_json().unwrap_or(Value::Null))
  }

  pub fn delete(&self, uri: &str, token: Option<&str>) -> (Status, Value) {
    let mut req = self.client.delete(uri);
    if let Some(token) = token {
      req = req.header(bearer(token));
    }
    let res = req.dispatch();
    (res.status(), res.into_json().unwrap_or(Value::Null))
  }

  pub fn login(&self, email: &str, password: &str) -> String {
    let (status, body) = self.post_json(
      "/api/users/login",
      None,
      json!({ "email": email, "password": password }),
    );
    assert_eq!(status, Status::Ok, "login failed: {}", body);
    body["token"].as_str().unwrap().to_owned()
  }

  pub fn admin_token(&self) -> String {
    self.login(ADMIN_EMAIL, ADMIN_PASSWORD)
  }

  /// Creates an event creator account and returns its id along with a login token.
  pub fn create_creator(&self, admin_token: &str, email: &str) -> (i64, String) {
    let (status, body) = self.post_json(
      "/api/users/createUser",
      Some(admin_token),
      json!({
        "email": email,
        "name": "Casey",
        "lastname": "Creator",
        "type": "event_creator",
        "password": "hunter22",
      }),
    );
    assert_eq!(status, Status::Created, "createUser failed: {}", body);
    let user_id = body["userId"].as_i64().unwrap();
    (user_id, self.login(email, "hunter22"))
  }

  pub fn create_category(&self, token: &str, name: &str) -> i64 {
    let (status, body) = self.post_json(
      "/api/categories",
      Some(token),
      json!({ "name": name, "description": format!("All about {}", name) }),
    );
    assert_eq!(status, Status::Created, "category creation failed: {}", body);
    body["categoryId"].as_i64().unwrap()
  }

  pub fn create_event(&self, token: &str, category_id: i64, title: &str, tags: &str) -> i64 {
    self.create_event_with_capacity(token, category_id, title, tags, None)
  }

  pub fn create_event_with_capacity(
    &self,
    token: &str,
    category_id: i64,
    title: &str,
    tags: &str,
    max_capacity: Option<i64>,
  ) -> i64 {
    let (status, body) = self.post_json(
      "/api/events/createEvent",
      Some(token),
      json!({
        "title": title,
        "description": format!("{} for everyone", title),
        "event_datetime": "2099-06-01T18:30",
        "location": "Harbour stage",
        "category_id": category_id,
        "max_capacity": max_capacity,
        "tags": tags,
      }),
    );
    assert_eq!(status, Status::Created, "event creation failed: {}", body);
    body["eventId"].as_i64().unwrap()
  }

  pub fn event_tag_names(&self, event_id: i64) -> Vec<String> {
    let (status, body) = self.get(&format!("/api/tags/{}", event_id), None);
    assert_eq!(status, Status::Ok);
    body
      .as_array()
      .unwrap()
      .iter()
      .map(|tag| tag["name"].as_str().unwrap().to_owned())
      .collect()
  }

  pub fn all_tag_names(&self) -> Vec<String> {
    let (status, body) = self.get("/api/tags", None);
    assert_eq!(status, Status::Ok);
    let mut names: Vec<String> = body
      .as_array()
      .unwrap()
      .iter()
      .map(|tag| tag["name"].as_str().unwrap().to_owned())
      .collect();
    names.sort();
    names
  }
}
