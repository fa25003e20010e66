//! Lead Qualifier Library
//!
//! Scores CRM leads and classifies them by temperature and priority, and
//! exposes that over a small HTTP API for CRM forms and the embeddable
//! lead-capture widget.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `intake`: Widget submission validation and normalization.
//! - `models`: Lead data models.
//! - `routes`: Router and OpenAPI document.
//! - `scoring`: Lead score, temperature and priority.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod intake;
pub mod models;
pub mod routes;
pub mod scoring;
