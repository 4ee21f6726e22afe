//! InfoNest Core - Content platform backend
//!
//! This crate provides the backend for the InfoNest publishing platform:
//! a declarative per-collection rule engine, role-derived session
//! permissions with an expiring cache, and the REST API over both.

pub mod api;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod migration;
pub mod permissions;
pub mod repository;
pub mod rules;
pub mod server;
pub mod service;
pub mod session;
pub mod state;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
