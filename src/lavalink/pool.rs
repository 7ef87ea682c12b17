use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serenity::model::id::UserId;
use tokio::sync::{RwLock, mpsc};
use tracing::{error, info};

use super::node::{Node, NodeConfig, NodeEvent};

/// Registered nodes, kept in registration order
#[derive(Default)]
pub struct NodePool {
    nodes: RwLock<Vec<Arc<Node>>>,
    started: AtomicBool,
}

impl NodePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, node: Arc<Node>) {
        self.nodes.write().await.push(node);
    }

    pub async fn nodes(&self) -> Vec<Arc<Node>> {
        self.nodes.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.nodes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.nodes.read().await.is_empty()
    }

    /// Create every configured node and start its websocket. Only the first call does anything,
    /// later `ready` events after a gateway reconnect are ignored.
    pub async fn start(
        &self,
        configs: &[NodeConfig],
        user_id: UserId,
        events: mpsc::UnboundedSender<NodeEvent>,
    ) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        for config in configs {
            match Node::new(config.clone()) {
                Ok(node) => {
                    let node = Arc::new(node);
                    Node::run(Arc::clone(&node), user_id, events.clone());
                    info!("Created node: {}", node.identifier());
                    self.add(node).await;
                }
                Err(e) => error!(
                    "Failed to create node {}:{}: {}",
                    config.host, config.port, e
                ),
            }
        }
    }

    /// The connected node hosting the fewest players
    pub async fn best(&self) -> Option<Arc<Node>> {
        let mut best: Option<Arc<Node>> = None;

        for node in self.nodes.read().await.iter() {
            if !node.is_connected().await {
                continue;
            }
            let fewer = best
                .as_ref()
                .is_none_or(|current| node.player_count() < current.player_count());
            if fewer {
                best = Some(Arc::clone(node));
            }
        }

        best
    }
}
