pub mod config;
pub mod db;
pub mod error;
pub mod fetch;
pub mod insert;
pub mod parse;
pub mod pipeline;
pub mod schema;
