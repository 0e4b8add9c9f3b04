pub mod app;
pub mod config;
pub mod error;
pub mod group;
pub mod logging;
pub mod rate_limit;
pub mod service;
pub mod store;
pub mod utils;
pub mod validation;
pub mod view;
