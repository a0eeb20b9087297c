use rocket::{
  fairing::{Fairing, Info, Kind},
  http::{Header, Status},
  response::status::Custom,
  serde::json::Json,
  Request, Response, Route,
};

use crate::models::MessageResponse;

pub mod categories;
pub mod comments;
pub mod events;
pub mod rsvps;
pub mod tags;
pub mod users;

#[get("/")]
pub fn index() -> &'static str {
  "Application successfully started!"
}

/// Answers CORS preflight requests for every path; the headers are added by [`Cors`].
#[options("/<_..>")]
pub fn preflight() -> Status {
  Status::NoContent
}

#[catch(default)]
pub fn default_catcher(status: Status, req: &Request<'_>) -> Custom<Json<MessageResponse>> {
  let message = match status.code {
    404 => String::from("Not found."),
    400 | 422 => String::from("Malformed request body."),
    _ => status.reason_lossy().to_owned(),
  };
  if status.code >= 500 {
    error!("Unhandled {} error for {} {}", status.code, req.method(), req.uri());
  }
  Custom(status, Json(MessageResponse::new(message)))
}

pub fn root_routes() -> Vec<Route> {
  routes![index, preflight]
}

pub struct CorsConfig {
  pub allow_origin: String,
  pub allow_methods: Vec<&'static str>,
  pub allow_headers: Vec<&'static str>,
  pub max_age: u64,
}

impl CorsConfig {
  pub fn new(allow_origin: impl Into<String>) -> Self {
    CorsConfig {
      allow_origin: allow_origin.into(),
      allow_methods: vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"],
      allow_headers: vec!["Content-Type", "Authorization", "X-Client-Id"],
      max_age: 3600,
    }
  }

  pub fn headers(&self) -> Vec<Header<'static>> {
    vec![
      Header::new("Access-Control-Allow-Origin", self.allow_origin.clone()),
      Header::new("Access-Control-Allow-Methods", self.allow_methods.join(", ")),
      Header::new("Access-Control-Allow-Headers", self.allow_headers.join(", ")),
      Header::new("Access-Control-Max-Age", self.max_age.to_string()),
    ]
  }
}

/// Attaches the CORS headers to every response.
pub struct Cors(pub CorsConfig);

#[rocket::async_trait]
impl Fairing for Cors {
  fn info(&self) -> Info {
    Info {
      name: "CORS headers",
      kind: Kind::Response,
    }
  }

  async fn on_response<'r>(&self, _req: &'r Request<'_>, res: &mut Response<'r>) {
    for header in self.0.headers() {
      res.set_header(header);
    }
  }
}

#[test]
fn test_cors_headers() {
  let headers = CorsConfig::new("https://events.example.com").headers();
  let origin = headers
    .iter()
    .find(|header| header.name() == "Access-Control-Allow-Origin")
    .unwrap();
  assert_eq!(origin.value(), "https://events.example.com");

  let allowed_headers = headers
    .iter()
    .find(|header| header.name() == "Access-Control-Allow-Headers")
    .unwrap();
  assert!(allowed_headers.value().contains("Authorization"));
}
