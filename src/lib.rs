//! Catalog service over TMDB that highlights Globo films, series and soap
//! operas, with search, details and a persistent favorites list.

pub mod app;
pub mod catalog;
pub mod classification;
pub mod config;
pub mod error;
pub mod favorites;
pub mod mapper;
pub mod models;
pub mod tmdb;
