pub(crate) mod alwaysjoined;
pub(crate) mod checks;
pub(crate) mod connect;
pub(crate) mod loop_mode;
pub(crate) mod music;
pub(crate) mod nowplaying;
pub(crate) mod pause;
pub(crate) mod play;
pub(crate) mod queue;
pub(crate) mod resume;
pub(crate) mod seek;
pub(crate) mod skip;
pub(crate) mod stop;
pub(crate) mod volume;

pub mod utils;

use crate::{CommandResult, Context};
use poise::CreateReply;

/// Every music command, in the order they are registered
pub fn commands() -> Vec<poise::Command<crate::Data, crate::Error>> {
    vec![
        connect::connect(),
        music::music(),
        volume::volume(),
        play::play(),
        alwaysjoined::alwaysjoined(),
        stop::stop(),
        pause::pause(),
        resume::resume(),
        skip::skip(),
        seek::seek(),
        loop_mode::loop_mode(),
        queue::queue(),
        nowplaying::nowplaying(),
    ]
}
