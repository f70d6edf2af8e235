pub mod api;
pub mod cli;
pub mod db;
pub mod models;
pub mod services;
pub mod utils;
