pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod report;
pub mod scoring;
pub mod state;
pub mod web;
