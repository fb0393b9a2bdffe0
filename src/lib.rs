pub mod app;
pub mod artwork;
pub mod cache;
pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod provider_factory;
pub mod providers;
