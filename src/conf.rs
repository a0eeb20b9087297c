#[derive(Clone, Debug)]
pub struct Conf {
  pub database_url: String,
  pub admin_email: Option<String>,
  pub admin_password: Option<String>,
  pub cors_allowed_origin: String,
}

fn optional_var(key: &str) -> Option<String> {
  dotenv::var(key).ok().filter(|val| !val.trim().is_empty())
}

impl Default for Conf {
  fn default() -> Self {
    Conf {
      database_url: optional_var("DATABASE_URL").unwrap_or_else(|| String::from("events.sqlite")),
      admin_email: optional_var("ADMIN_EMAIL"),
      admin_password: optional_var("ADMIN_PASSWORD"),
      cors_allowed_origin: optional_var("CORS_ALLOWED_ORIGIN").unwrap_or_else(|| String::from("*")),
    }
  }
}

impl Conf {
  /// Bootstrap admin credentials, only when both halves are configured.
  pub fn admin_credentials(&self) -> Option<(String, String)> {
    match (&self.admin_email, &self.admin_password) {
      (Some(email), Some(password)) => Some((email.clone(), password.clone())),
      _ => None,
    }
  }
}

#[test]
fn test_admin_credentials_require_both_halves() {
  let mut conf = Conf {
    database_url: String::from(":memory:"),
    admin_email: Some(String::from("admin@example.com")),
    admin_password: None,
    cors_allowed_origin: String::from("*"),
  };
  assert_eq!(conf.admin_credentials(), None);

  conf.admin_password = Some(String::from("hunter2"));
  assert_eq!(
    conf.admin_credentials(),
    Some((
      String::from("admin@example.com"),
      String::from("hunter2")
    ))
  );
}
