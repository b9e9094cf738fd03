//! Client SDK for the test management platform.
//!
//! SYSTEM CONTEXT
//! ==============
//! The platform is a Spring service exposing a REST API under `/api` and a
//! socket.io endpoint that streams task results. This crate mirrors the web
//! console's client side: the route table, one typed wrapper per REST
//! resource, and a realtime client for result subscriptions. The `testdeck`
//! binary puts a command line on top.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod realtime;
pub mod routes;
pub mod views;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use error::{ApiError, RealtimeError};
pub use realtime::{ConnectionStatus, EventHub, ListenerId, RealtimeClient, SocketEvent};
pub use routes::{View, resolve};
pub use views::load_view;
