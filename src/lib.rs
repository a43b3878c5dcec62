pub mod app;
pub mod availability;
pub mod config;
pub mod error;
pub mod limits;
pub mod models;
pub mod recommend;
pub mod search;
pub mod seasons;
pub mod tmdb;
