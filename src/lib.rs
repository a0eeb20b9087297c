#[macro_use]
extern crate diesel;
#[macro_use]
extern crate rocket;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate log;
#[macro_use]
extern crate lazy_static;

use rocket::{fairing::AdHoc, Build, Rocket};
use rocket_sync_db_pools::database;

pub mod conf;
pub mod db_util;
pub mod error;
pub mod models;
pub mod routes;
pub mod schema;

use self::{
  conf::Conf,
  db_util::{login::ensure_admin_user, run_migrations},
  routes::{Cors, CorsConfig},
};

lazy_static! {
  pub static ref CONF: Conf = Conf::default();
}

#[database("event_board")]
pub struct EventBoardDbConn(diesel::SqliteConnection);

/// Applies pending migrations and creates the bootstrap admin, if one is configured.
async fn prepare_database(rocket: Rocket<Build>) -> Result<Rocket<Build>, Rocket<Build>> {
  let conn = match EventBoardDbConn::get_one(&rocket).await {
    Some(conn) => conn,
    None => {
      error!("No database connection available to run migrations");
      return Err(rocket);
    },
  };

  let admin_credentials = rocket
    .state::<Conf>()
    .and_then(|conf| conf.admin_credentials());
  let res = conn
    .run(move |conn| -> Result<(), String> {
      run_migrations(conn)?;
      if let Some((email, password)) = admin_credentials {
        if let Some(user_id) = ensure_admin_user(conn, &email, &password)? {
          info!("Created bootstrap admin {} with id {}", email, user_id);
        }
      }
      Ok(())
    })
    .await;

  match res {
    Ok(()) => Ok(rocket),
    Err(err) => {
      error!("{}", err);
      Err(rocket)
    },
  }
}

pub fn build_rocket(conf: Conf) -> Rocket<Build> {
  let figment = rocket::Config::figment()
    .merge(("databases.event_board.url", conf.database_url.clone()));
  let cors = Cors(CorsConfig::new(conf.cors_allowed_origin.clone()));

  let rocket = rocket::custom(figment)
    .manage(conf)
    .attach(EventBoardDbConn::fairing())
    .attach(AdHoc::try_on_ignite("Database setup", prepare_database))
    .attach(cors);

  #[cfg(not(debug_assertions))]
  let rocket = rocket.attach(rocket_async_compression::Compression::fairing());

  rocket
    .mount("/", routes::root_routes())
    .mount("/api/users", routes::users::routes())
    .mount("/api/categories", routes::categories::routes())
    .mount("/api/events", routes::events::routes())
    .mount("/api/comments", routes::comments::routes())
    .mount("/api/tags", routes::tags::routes())
    .mount("/api/rsvps", routes::rsvps::routes())
    .register("/", catchers![routes::default_catcher])
}
