pub mod errors;
pub mod filters;
pub mod models;
pub mod services;
pub mod stats;
