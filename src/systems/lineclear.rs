//! Periodic row scan over the level's scan area.

use bevy_ecs::prelude::*;
use log::{debug, error};
use rustc_hash::FxHashMap;

use crate::components::block::Block;
use crate::events::lineclear::LineClearedMessage;
use crate::physics::{BodyId, ScanParams, Vec2};
use crate::resources::gameconfig::GameConfig;
use crate::resources::level::CurrentLevel;
use crate::resources::physicsworld::PhysicsWorld;
use crate::resources::worldtime::WorldTime;

/// Every `scan_interval` frames, cast one horizontal line per block row
/// across the scan area and clear the rows that are full.
///
/// A [`LineClearedMessage`] is written per cleared row. Pieces left with no
/// blocks at all are destroyed and despawned.
#[allow(clippy::too_many_arguments)]
pub fn line_clear_scan(
    mut commands: Commands,
    mut physics: ResMut<PhysicsWorld>,
    mut writer: MessageWriter<LineClearedMessage>,
    level: Res<CurrentLevel>,
    config: Res<GameConfig>,
    time: Res<WorldTime>,
    blocks: Query<(Entity, &Block)>,
) {
    if !time.every(config.scan_interval) {
        return;
    }

    let area = level.data.scan_area;
    let params = ScanParams {
        min_hits: level.data.line_min_blocks,
        vertical_tolerance: config.vertical_tolerance,
        horizontal_tolerance: config.horizontal_tolerance,
    };
    let by_body: FxHashMap<BodyId, Entity> =
        blocks.iter().map(|(entity, block)| (block.body, entity)).collect();

    let mut cleared_any = false;
    for y in area.rows(config.square_size) {
        let report = match physics.scan_line(Vec2::new(area.x, y), Vec2::new(area.x + area.w, y), &params)
        {
            Ok(report) => report,
            Err(e) => {
                error!("Line scan at y={} failed: {}", y, e);
                return;
            }
        };
        if !report.was_cleared() {
            continue;
        }
        cleared_any = true;
        let pieces = report
            .bodies_to_split
            .iter()
            .filter_map(|split| by_body.get(&split.body).copied())
            .collect();
        writer.write(LineClearedMessage {
            y,
            blocks: report.cleared_points.len(),
            pieces,
        });
    }

    if !cleared_any {
        return;
    }
    for (entity, block) in blocks.iter() {
        if physics.shape_count(block.body).unwrap_or(0) == 0 {
            debug!("Removing emptied {} piece {:?}", block.kind, entity);
            physics.destroy_body(block.body);
            commands.entity(entity).despawn();
        }
    }
}
