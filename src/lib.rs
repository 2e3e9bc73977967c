pub mod app;
pub mod config;
pub mod error;
pub mod lookup;
pub mod models;
pub mod normalize;
pub mod ownership;
pub mod resolve;
pub mod store;
pub mod tmdb;
