use bevy_ecs::prelude::*;
use log::info;

use crate::events::lineclear::LineClearedMessage;
use crate::resources::gamestats::GameStats;
use crate::resources::level::CurrentLevel;

/// One point per cleared line. Marks the level complete once the score
/// reaches its target.
pub fn score_line_clears(
    mut reader: MessageReader<LineClearedMessage>,
    mut stats: ResMut<GameStats>,
    level: Res<CurrentLevel>,
) {
    for msg in reader.read() {
        stats.score += 1;
        stats.lines_cleared += 1;
        info!(
            "Cleared line at y={} ({} blocks, {} pieces), score {}/{}",
            msg.y,
            msg.blocks,
            msg.pieces.len(),
            stats.score,
            level.data.target_score
        );
        if !stats.level_complete && stats.score >= level.data.target_score {
            stats.level_complete = true;
            info!("Level '{}' complete!", level.data.name);
        }
    }
}

/// Swap the message buffers. Must run once per frame.
pub fn update_line_cleared_messages(mut msgs: ResMut<Messages<LineClearedMessage>>) {
    msgs.update();
}
