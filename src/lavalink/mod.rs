//! A minimal Lavalink v4 client: track loading and player updates over REST,
//! player events over the node websocket.

pub mod error;
pub mod model;
pub mod node;
pub mod pool;

pub use error::{LavalinkError, LavalinkResult};
pub use model::{Track, TrackEndReason};
pub use node::{Node, NodeConfig, NodeEvent};
pub use pool::NodePool;
