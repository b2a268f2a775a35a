pub mod certificates;
pub mod types;

pub use certificates::certificate_routes;
