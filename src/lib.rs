//! In-memory movie catalog served over a small HTTP/1.1 server.

pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod movie;
pub mod router;
pub mod store;
pub mod thread_pool;
pub mod web_server;

pub use config::ServerConfig;
pub use router::Router;
pub use store::MovieStore;
pub use web_server::{ShutdownHandle, WebServer};
