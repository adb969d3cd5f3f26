pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod search;
pub mod services;
