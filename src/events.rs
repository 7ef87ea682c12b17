use std::sync::Arc;

use serenity::all::ComponentInteraction;
use serenity::async_trait;
use serenity::model::application::Interaction;
use serenity::prelude::*;
use tracing::error;

use crate::commands::music::utils::component_handlers;
use crate::commands::music::utils::music_manager::MusicManager;

pub struct Handler {
    pub music: Arc<MusicManager>,
}

#[async_trait]
impl serenity::prelude::EventHandler for Handler {
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Component(mut component) = interaction {
            if component.data.custom_id.starts_with("music_") {
                self.music_component_interaction(&ctx, &mut component).await;
            }
        }
    }
}

impl Handler {
    /// Handle component interactions for components with identities starting with "music_"
    async fn music_component_interaction(&self, ctx: &Context, component: &mut ComponentInteraction) {
        if let Err(e) = component_handlers::handle_interaction(ctx, component, &self.music).await {
            error!("Error handling component interaction: {}", e);
        }
    }
}
