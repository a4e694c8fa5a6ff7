//! # ohmybank
//!
//! A read-only HTTP API over two static JSON datasets: the bank's users and
//! their account activities.
//!
//! Both collections are read into memory once, before the listener opens,
//! and never change afterwards. Every request is a pure read over that
//! immutable [`Dataset`], shared with handlers through the [`Router`]'s state.
//!
//! - Radix-tree routing via [`matchit`], one tree per method
//! - hyper HTTP/1.1 and HTTP/2 on tokio
//! - Graceful shutdown on SIGTERM / Ctrl-C, draining in-flight requests
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use ohmybank::{api, Dataset, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ohmybank::Error> {
//!     let data = Dataset::load("data/users.json", "data/bankActivities.json")?;
//!     Server::bind(([0, 0, 0, 0], 3000)).serve(api::router(data)).await
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod api;
pub mod config;
pub mod dataset;
pub mod health;

pub use config::Config;
pub use dataset::{Activity, Dataset, User};
pub use error::{Error, Result};
pub use handler::Handler;
pub use method::{Method, UnknownMethod};
pub use request::Request;
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use status::Status;
