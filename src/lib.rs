pub mod aqi;
pub mod config;
pub mod error;
pub mod forecast;
pub mod parser;
pub mod safety;
pub mod service;
pub mod weather;
