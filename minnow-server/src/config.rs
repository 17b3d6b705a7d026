//! Server configuration

use clap::Parser;

/// Configuration for the Minnow server
///
/// Parsed from the command line in the binary; constructed directly in
/// tests, usually with `port: 0` for an ephemeral listen port.
#[derive(Parser, Debug, Clone)]
#[command(name = "minnow-server", about = "An in-memory key-value server speaking RESP")]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// TCP port to listen on (0 picks an ephemeral port)
    #[arg(long, default_value_t = 6380)]
    pub port: u16,

    /// Maximum number of simultaneously connected clients
    #[arg(long, default_value_t = 1024)]
    pub max_clients: usize,

    /// Milliseconds between active expiration sweeps
    #[arg(long, default_value_t = 100)]
    pub purge_interval_ms: u64,

    /// Expiration-table entries examined per sweep iteration
    #[arg(long, default_value_t = 20)]
    pub purge_sample_size: usize,

    /// Expired fraction of a sample at or below which the sweep stops
    #[arg(long, default_value_t = 0.1)]
    pub purge_stop_ratio: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6380,
            max_clients: 1024,
            purge_interval_ms: 100,
            purge_sample_size: 20,
            purge_stop_ratio: 0.1,
        }
    }
}
