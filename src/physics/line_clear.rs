//! Line-clear detection.
//!
//! A scan casts a segment across the playfield, keeps the blocks that are
//! at rest, works out which of them lie on one horizontal row and removes
//! the longest contiguous run if it is long enough. Removal is immediate
//! and detaches shapes only; bodies survive and are reported so the game can
//! split or discard them.

use arrayvec::ArrayVec;
use log::{debug, info};
use rapier2d::prelude::*;
use smallvec::SmallVec;

use super::body::{BodyId, OwnerKey};
use super::error::PhysicsResult;
use super::shapes::category;
use super::units::Vec2;
use super::world::World;

/// Most shapes a single scan collects.
pub const MAX_RAY_HITS: usize = 50;
/// Squared linear speed (m²/s²) above which a block counts as moving.
pub const STABLE_SPEED_SQ: f32 = 0.01 * 0.01;

pub const DEFAULT_MIN_HITS: usize = 6;
pub const DEFAULT_VERTICAL_TOLERANCE: f32 = 6.0;
pub const DEFAULT_HORIZONTAL_TOLERANCE: f32 = 32.0 * 1.2;

/// Thresholds for one scan, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanParams {
    /// Fewest blocks that make a line.
    pub min_hits: usize,
    /// How far from the row's mean height a block may sit.
    pub vertical_tolerance: f32,
    /// Largest gap between neighbouring blocks of one run.
    pub horizontal_tolerance: f32,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            min_hits: DEFAULT_MIN_HITS,
            vertical_tolerance: DEFAULT_VERTICAL_TOLERANCE,
            horizontal_tolerance: DEFAULT_HORIZONTAL_TOLERANCE,
        }
    }
}

impl ScanParams {
    pub fn with_min_hits(mut self, min_hits: usize) -> Self {
        self.min_hits = min_hits;
        self
    }
}

/// A body that lost shapes to a clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitBody {
    pub body: BodyId,
    pub owner: OwnerKey,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineClearReport {
    /// Bodies that had shapes removed, each listed once.
    pub bodies_to_split: Vec<SplitBody>,
    /// World positions (pixels) of the removed shapes.
    pub cleared_points: Vec<Vec2>,
    /// Every resting block the ray crossed, whether cleared or not.
    pub all_hits: Vec<Vec2>,
}

impl LineClearReport {
    pub fn was_cleared(&self) -> bool {
        !self.cleared_points.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies_to_split.is_empty() && self.cleared_points.is_empty() && self.all_hits.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct RayHit {
    shape: ColliderHandle,
    toi: f32,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    shape: ColliderHandle,
    body: RigidBodyHandle,
}

/// Indices of the blocks forming the longest run on a common row, or an
/// empty list when no run reaches `params.min_hits`.
///
/// Blocks further than `vertical_tolerance` from the mean height are
/// dropped; the rest are ordered by x and split wherever neighbours are
/// more than `horizontal_tolerance` apart. On a tie the leftmost run wins.
pub fn find_row_run(points: &[Vec2], params: &ScanParams) -> Vec<usize> {
    if points.is_empty() || points.len() < params.min_hits {
        return Vec::new();
    }

    let mean_y = points.iter().map(|p| p.y).sum::<f32>() / points.len() as f32;
    let mut row: Vec<usize> = (0..points.len())
        .filter(|&i| (points[i].y - mean_y).abs() < params.vertical_tolerance)
        .collect();
    if row.is_empty() || row.len() < params.min_hits {
        return Vec::new();
    }

    row.sort_by(|&a, &b| points[a].x.total_cmp(&points[b].x));

    let mut best = 0..0;
    let mut start = 0;
    for i in 1..=row.len() {
        let split = i == row.len()
            || points[row[i]].x - points[row[i - 1]].x > params.horizontal_tolerance;
        if split {
            if i - start > best.len() {
                best = start..i;
            }
            start = i;
        }
    }

    if best.len() < params.min_hits.max(1) {
        return Vec::new();
    }
    row[best].to_vec()
}

impl World {
    /// Scan the segment `from` → `to` (pixels) and clear the longest resting
    /// row of blocks on it, if any.
    pub fn scan_line(&mut self, from: Vec2, to: Vec2, params: &ScanParams) -> PhysicsResult<LineClearReport> {
        self.ensure_alive()?;
        let mut report = LineClearReport::default();

        let hits = self.blocks_on_segment(from, to);
        if hits.len() < params.min_hits {
            return Ok(report);
        }

        let mut candidates: ArrayVec<Candidate, MAX_RAY_HITS> = ArrayVec::new();
        for hit in &hits {
            let Some(collider) = self.colliders.get(hit.shape) else {
                continue;
            };
            let Some(body) = collider.parent() else {
                continue;
            };
            let Some(rb) = self.bodies.get(body) else {
                continue;
            };
            if rb.linvel().norm_squared() > STABLE_SPEED_SQ {
                continue;
            }
            let centre = self.shape_centre(rb, collider);
            report.all_hits.push(centre);
            candidates.push(Candidate {
                shape: hit.shape,
                body,
            });
        }

        let run = find_row_run(&report.all_hits, params);
        if run.is_empty() {
            return Ok(report);
        }

        let mut touched: SmallVec<[RigidBodyHandle; 16]> = SmallVec::new();
        for index in run {
            let candidate = candidates[index];
            report.cleared_points.push(report.all_hits[index]);
            self.colliders
                .remove(candidate.shape, &mut self.islands, &mut self.bodies, true);
            if !touched.contains(&candidate.body) {
                touched.push(candidate.body);
            }
        }

        for handle in touched {
            let id = BodyId::from(handle);
            if !self.bodies.contains(handle) {
                continue;
            }
            self.refresh_mass(id);
            match self.contexts.get(&id).and_then(|ctx| ctx.owner) {
                Some(owner) => report.bodies_to_split.push(SplitBody { body: id, owner }),
                None => debug!("Cleared shapes from unowned body {:?}", id),
            }
        }

        info!(
            "Line cleared: {} blocks from {} bodies at y={:.1}",
            report.cleared_points.len(),
            report.bodies_to_split.len(),
            report.cleared_points.first().map_or(0.0, |p| p.y)
        );
        Ok(report)
    }

    /// Tetromino-category shapes crossed by the segment, nearest first,
    /// capped at [`MAX_RAY_HITS`]. Sensors are skipped.
    fn blocks_on_segment(&mut self, from: Vec2, to: Vec2) -> ArrayVec<RayHit, MAX_RAY_HITS> {
        self.sync_query_pipeline();

        let origin = point![self.units.to_sim(from.x), self.units.to_sim(from.y)];
        let dir = self.units.vec_to_sim(to.x - from.x, to.y - from.y);
        let ray = Ray::new(origin, dir);
        let filter = QueryFilter::new()
            .groups(InteractionGroups::new(category::TETROMINO, category::TETROMINO))
            .exclude_sensors();

        let mut hits: ArrayVec<RayHit, MAX_RAY_HITS> = ArrayVec::new();
        self.query_pipeline.intersections_with_ray(
            &self.bodies,
            &self.colliders,
            &ray,
            1.0,
            true,
            filter,
            |shape, intersection| {
                let hit = RayHit {
                    shape,
                    toi: intersection.time_of_impact,
                };
                if !hits.is_full() {
                    hits.push(hit);
                } else if let Some(far) = hits
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.toi.total_cmp(&b.1.toi))
                    .filter(|(_, h)| h.toi > hit.toi)
                    .map(|(i, _)| i)
                {
                    hits[far] = hit;
                }
                true
            },
        );
        hits.sort_by(|a, b| a.toi.total_cmp(&b.toi));
        hits
    }

    /// Shape centre in world pixels, using the body's current pose.
    fn shape_centre(&self, rb: &RigidBody, collider: &Collider) -> Vec2 {
        let local = collider
            .position_wrt_parent()
            .copied()
            .unwrap_or_else(Isometry::identity);
        let centre = (*rb.position() * local) * collider.shape().compute_local_aabb().center();
        Vec2::new(
            self.units.to_display(centre.x),
            self.units.to_display(centre.y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(xs: &[f32], y: f32) -> Vec<Vec2> {
        xs.iter().map(|&x| Vec2::new(x, y)).collect()
    }

    // ==================== ROW RUN TESTS ====================

    #[test]
    fn test_run_found_for_contiguous_row() {
        let points = row(&[0.0, 32.0, 64.0, 96.0, 128.0, 160.0], 100.0);
        let run = find_row_run(&points, &ScanParams::default());
        assert_eq!(run, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_too_few_points() {
        let points = row(&[0.0, 32.0, 64.0, 96.0, 128.0], 100.0);
        assert!(find_row_run(&points, &ScanParams::default()).is_empty());
    }

    #[test]
    fn test_run_is_sorted_by_x() {
        let points = row(&[160.0, 0.0, 96.0, 32.0, 128.0, 64.0], 100.0);
        let run = find_row_run(&points, &ScanParams::default());
        let xs: Vec<f32> = run.iter().map(|&i| points[i].x).collect();
        assert_eq!(xs, vec![0.0, 32.0, 64.0, 96.0, 128.0, 160.0]);
    }

    #[test]
    fn test_largest_group_wins() {
        let points = row(&[0.0, 32.0, 64.0, 200.0, 232.0, 264.0, 296.0], 100.0);
        let params = ScanParams::default().with_min_hits(4);
        let run = find_row_run(&points, &params);
        assert_eq!(run, vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_first_group_wins_ties() {
        let points = row(&[0.0, 32.0, 64.0, 200.0, 232.0, 264.0], 100.0);
        let params = ScanParams::default().with_min_hits(3);
        assert_eq!(find_row_run(&points, &params), vec![0, 1, 2]);
    }

    #[test]
    fn test_gap_equal_to_tolerance_joins() {
        let params = ScanParams {
            min_hits: 3,
            vertical_tolerance: 6.0,
            horizontal_tolerance: 40.0,
        };
        let points = row(&[0.0, 40.0, 80.0], 0.0);
        assert_eq!(find_row_run(&points, &params).len(), 3);
        let points = row(&[0.0, 40.0, 80.5], 0.0);
        assert!(find_row_run(&points, &params).is_empty());
    }

    #[test]
    fn test_outliers_off_the_row_are_dropped() {
        let mut points = row(&[0.0, 32.0, 64.0, 96.0, 128.0, 160.0], 100.0);
        points.push(Vec2::new(192.0, 140.0));
        // The outlier drags the mean up to ~105.7, still within 6px of the row.
        let run = find_row_run(&points, &ScanParams::default());
        assert_eq!(run, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_vertical_tolerance_is_strict() {
        let params = ScanParams {
            min_hits: 2,
            vertical_tolerance: 5.0,
            horizontal_tolerance: 38.4,
        };
        // Mean is 5; both points sit exactly 5 away.
        let points = vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0)];
        assert!(find_row_run(&points, &params).is_empty());
    }

    #[test]
    fn test_zero_min_hits_with_no_points() {
        let params = ScanParams::default().with_min_hits(0);
        assert!(find_row_run(&[], &params).is_empty());
    }

    // ==================== REPORT TESTS ====================

    #[test]
    fn test_default_report_is_empty() {
        let report = LineClearReport::default();
        assert!(report.is_empty());
        assert!(!report.was_cleared());
    }

    #[test]
    fn test_default_params() {
        let params = ScanParams::default();
        assert_eq!(params.min_hits, 6);
        assert_eq!(params.vertical_tolerance, 6.0);
        assert!((params.horizontal_tolerance - 38.4).abs() < 1e-4);
    }
}
