pub mod queries;
pub mod routes;

pub use routes::sources_routes;
