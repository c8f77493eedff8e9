pub mod api;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod models;
pub mod query;
pub mod report;
pub mod warehouse;
