//! Little Lemon API - Restaurant ordering REST service.
//!
//! Customers browse the menu, fill a cart and place orders; managers curate
//! the menu and staff rosters and assign deliveries; delivery crew mark their
//! orders delivered.
//!
//! # Architecture
//!
//! - Axum web framework, JSON in and out
//! - [`services`] hold the workflows and consult `little_lemon_core::policy`
//!   for every authorization decision
//! - [`db::Store`] abstracts persistence: `PostgreSQL` in production, an
//!   in-process store for tests and demos
//! - Token authentication (`Authorization: Token <key>`) and per-IP /
//!   per-token throttling in [`middleware`]
//!
//! The binary in `main.rs` wires configuration, logging and Sentry around
//! [`routes::app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
