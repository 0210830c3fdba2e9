//! Runtime configuration.
//!
//! Every flag has an environment fallback so the server can be configured
//! entirely from the process environment.

use crate::chat::types::{HISTORY_WINDOW, MAX_ROOM_MESSAGES};

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Secret used when none is configured. Only suitable for local development.
pub const DEV_JWT_SECRET: &str = "volunteer-hub-dev-secret";

#[derive(Debug, Parser)]
#[command(
    name = "volunteer-hub",
    about = "Event search and real-time chat backend for volunteer matching"
)]
pub struct Cli {
    /// Address the HTTP server binds to
    #[arg(long, env = "BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// HMAC secret used to verify bearer tokens
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Directory holding the vocabulary and weight files
    #[arg(long, env = "MODEL_DIR", default_value = "model")]
    pub model_dir: PathBuf,

    /// Optional JSON file with volunteers, NGOs and events to preload
    #[arg(long = "seed", env = "SEED_FILE")]
    pub seed_file: Option<PathBuf>,

    /// Timeout for a single chat store read or write, in milliseconds
    #[arg(long, env = "STORE_TIMEOUT_MS", default_value_t = 2000)]
    pub store_timeout_ms: u64,

    /// Pending write commands buffered per chat room
    #[arg(long, env = "ROOM_QUEUE", default_value_t = 64)]
    pub room_queue: usize,

    /// Seconds an unused chat room keeps its writer task before retiring it
    #[arg(long, env = "ROOM_IDLE_SECS", default_value_t = 300)]
    pub room_idle_secs: u64,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Configured secret, or the development fallback.
    pub fn jwt_secret(&self) -> &str {
        match self.jwt_secret.as_deref() {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET
            }
        }
    }

    pub fn chat_config(&self) -> ChatConfig {
        ChatConfig {
            queue_capacity: self.room_queue.max(1),
            store_timeout: Duration::from_millis(self.store_timeout_ms.max(1)),
            idle_room_timeout: Duration::from_secs(self.room_idle_secs.max(1)),
            ..ChatConfig::default()
        }
    }
}

/// Tunables for the chat subsystem.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Messages replayed on room entry.
    pub history_window: usize,
    /// Per-room message cap.
    pub max_messages: usize,
    /// Bounded command queue per room writer.
    pub queue_capacity: usize,
    /// Per-room fan-out buffer. Slow connections past this lag and drop events.
    pub broadcast_capacity: usize,
    /// Per-connection outbound buffer.
    pub outbound_capacity: usize,
    /// Bound on each store operation and on queue submission.
    pub store_timeout: Duration,
    /// How long a room writer waits for work before it may retire.
    pub idle_room_timeout: Duration,
}

impl ChatConfig {
    /// How long a caller waits for the room writer to answer. A join may
    /// issue a read and two writes, so this covers three store operations.
    pub fn reply_timeout(&self) -> Duration {
        self.store_timeout * 3
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_window: HISTORY_WINDOW,
            max_messages: MAX_ROOM_MESSAGES,
            queue_capacity: 64,
            broadcast_capacity: 256,
            outbound_capacity: 128,
            store_timeout: Duration::from_millis(2000),
            idle_room_timeout: Duration::from_secs(300),
        }
    }
}
