pub mod access;
pub mod app;
pub mod cli;
pub mod collections;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod migrations;

#[cfg(test)]
pub mod testing;
