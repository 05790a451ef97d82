//! Threadline Admin library.
//!
//! This crate provides the administration console as a library,
//! allowing it to be tested and reused.
//!
//! # Security
//!
//! Every `/admin` route requires an access token whose role is `admin`.
//! The console reads its own cookie pair, never the storefront's.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
