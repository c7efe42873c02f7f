//! Library exports for the redirect service
//!
//! This module exposes internal components for the binary and for tests.

pub mod config;
pub mod database;
pub mod error;
pub mod generator;
pub mod handler;
pub mod model;
pub mod route;
pub mod store;
