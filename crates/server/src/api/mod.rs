pub mod files;
pub mod handlers;
pub mod middleware;
pub mod pages;
pub mod retrievals;
pub mod routes;

pub use routes::create_router;
