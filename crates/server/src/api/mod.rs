pub mod downloads;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod tracks;
pub mod youtube;

pub use routes::create_router;
