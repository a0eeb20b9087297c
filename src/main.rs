#[macro_use]
extern crate rocket;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[launch]
fn rocket() -> _ {
  event_board::build_rocket(event_board::CONF.clone())
}
