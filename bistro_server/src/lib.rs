//! # Bistro server
//! This crate hosts the HTTP surface of the ordering platform. It is responsible for:
//! * Authenticating users and issuing access tokens.
//! * Exposing the order, notification and chat APIs over REST.
//! * Streaming live events to connected clients over server-sent events.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/auth`: Exchanges a login credential for a signed access token.
//! * `/api/...`: The authenticated REST surface (orders, notifications, chat).
//! * `/live/{room}`: The live event stream.

pub mod auth;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod live;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
