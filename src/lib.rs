//! # Guaagsay Rust Backend
//!
//! REST backend for a small e-commerce store.
//!
//! This crate provides the server side of an online store: a product catalog
//! organized into categories, transactional order placement with stock
//! tracking, customer accounts with saved addresses and notifications, and
//! an admin surface for catalog management and order fulfilment. The backend
//! exposes a REST API via Axum for the web frontend.
//!
//! ## Features
//!
//! - **Catalog**: Product and category browsing with search and price filters
//! - **Orders**: Atomic order placement with server-computed totals and
//!   per-product stock decrements
//! - **Accounts**: Registration, login, password reset, saved addresses,
//!   notifications
//! - **Admin**: Catalog writes, order status updates, and dashboard stats,
//!   gated by role
//! - **HTTP API**: RESTful endpoints under `/api` with a uniform response
//!   envelope
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: Domain types shared by the HTTP layer and the repositories
//! - [`db`]: Database operations, repository pattern, and persistence layer
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;

pub mod db;

#[cfg(feature = "http-server")]
pub mod http;

#[cfg(test)]
#[path = "api_tests.rs"]
mod api_tests;
