use serenity::all::{ButtonStyle, CreateActionRow, CreateButton, ReactionType};

pub const LOOP_BUTTON: &str = "music_loop";
pub const STOP_BUTTON: &str = "music_stop";
pub const SKIP_BUTTON: &str = "music_skip";

/// Creates the row of buttons attached to every "now playing" message
pub fn create_music_control_buttons() -> Vec<CreateActionRow> {
    let loop_mode = CreateButton::new(LOOP_BUTTON)
        .emoji(ReactionType::Unicode("🔁".to_string()))
        .style(ButtonStyle::Secondary)
        .label("Loop");

    let stop = CreateButton::new(STOP_BUTTON)
        .emoji(ReactionType::Unicode("⏹️".to_string()))
        .style(ButtonStyle::Danger)
        .label("Stop");

    let skip = CreateButton::new(SKIP_BUTTON)
        .emoji(ReactionType::Unicode("⏭️".to_string()))
        .style(ButtonStyle::Primary)
        .label("Skip");

    vec![CreateActionRow::Buttons(vec![loop_mode, stop, skip])]
}
