//! Server settings. Everything is fixed at compile time; the setters exist so
//! tests can bind an ephemeral port and start with an empty catalog.

use log::LevelFilter;
use std::time::Duration;

pub const DEFAULT_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub address: String,
    /// Number of threads serving connections.
    pub workers: usize,
    /// Read and write timeout on every accepted connection. A client that
    /// stays silent longer than this loses its worker.
    pub io_timeout: Duration,
    pub log_level: LevelFilter,
    /// Load the startup catalog before accepting connections.
    pub seed_catalog: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_owned(),
            workers: DEFAULT_WORKERS,
            io_timeout: DEFAULT_IO_TIMEOUT,
            log_level: LevelFilter::Info,
            seed_catalog: true,
        }
    }
}

impl ServerConfig {
    pub fn with_address(mut self, address: &str) -> Self {
        self.address = address.to_owned();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    pub fn with_log_level(mut self, log_level: LevelFilter) -> Self {
        self.log_level = log_level;
        self
    }

    pub fn with_seed_catalog(mut self, seed_catalog: bool) -> Self {
        self.seed_catalog = seed_catalog;
        self
    }
}
