use std::path::PathBuf;

use clap::Parser;

/// Relay server for the collaborative drawing board.
///
/// Every flag can also be given through the environment. Values are read once
/// at startup.
#[derive(Debug, Clone, Parser)]
#[command(name = "board-server", version)]
pub struct Config {
    /// Interface to listen on.
    #[arg(long, env = "LISTEN_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Directory holding the client bundle.
    #[arg(long, env = "STATIC_DIR", default_value = "public")]
    pub static_dir: PathBuf,

    /// Name of the shared document every client syncs.
    #[arg(long, env = "DOCUMENT", default_value = "drawing-room")]
    pub document: String,

    /// Per-connection outbound queue length; events beyond it are dropped.
    #[arg(long, env = "OUTBOUND_BUFFER", default_value_t = 256)]
    pub outbound_buffer: usize,
}

impl Config {
    pub fn bind_address(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}
