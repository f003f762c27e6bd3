//! Shape factory: boxes, sensors, tetromino composites and ground chains.
//!
//! Every polygon is an axis-aligned box, optionally offset from the body
//! origin. Tetrominoes are four such boxes laid out from a fixed template
//! scaled by `square_size`.

use log::debug;
use rapier2d::prelude::*;
use smallvec::SmallVec;

use super::body::{BodyId, ShapeId};
use super::error::PhysicsResult;
use super::units::{Units, Vec2};
use super::world::World;

/// Collision categories. Used as interaction-group memberships (category
/// bits) and filters (mask bits).
pub mod category {
    use rapier2d::prelude::Group;

    pub const TETROMINO: Group = Group::GROUP_1;
    pub const SENSOR: Group = Group::GROUP_2;
    pub const GROUND: Group = Group::GROUP_3;
}

const DEFAULT_FRICTION: f32 = 0.5;
const DEFAULT_RESTITUTION: f32 = 0.1;
const CHAIN_FRICTION: f32 = 1.0;
const CHAIN_RESTITUTION: f32 = 0.0;

/// Physical material of a solid polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            density: 1.0,
            friction: DEFAULT_FRICTION,
            restitution: DEFAULT_RESTITUTION,
        }
    }
}

impl Material {
    pub fn with_density(density: f32) -> Self {
        Self {
            density,
            ..Self::default()
        }
    }
}

/// Surface of a chain; chains have no mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMaterial {
    pub friction: f32,
    pub restitution: f32,
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self {
            friction: CHAIN_FRICTION,
            restitution: CHAIN_RESTITUTION,
        }
    }
}

/// Everything about a polygon shape except its geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeDef {
    pub material: Material,
    pub groups: InteractionGroups,
    pub sensor: bool,
    pub collision_events: bool,
}

impl ShapeDef {
    /// Solid box with the default filter: tetromino category, collides with
    /// everything.
    pub fn solid(material: Material, enable_contacts: bool) -> Self {
        Self {
            material,
            groups: InteractionGroups::new(category::TETROMINO, Group::ALL),
            sensor: false,
            collision_events: enable_contacts,
        }
    }

    /// Block of a falling piece.
    pub fn tetromino(material: Material) -> Self {
        Self {
            material,
            groups: InteractionGroups::new(
                category::TETROMINO,
                category::GROUND | category::SENSOR | category::TETROMINO,
            ),
            sensor: false,
            collision_events: true,
        }
    }

    /// Overlap-only box that reports tetrominoes entering and leaving.
    pub fn sensor() -> Self {
        Self {
            material: Material::default(),
            groups: InteractionGroups::new(category::SENSOR, category::TETROMINO),
            sensor: true,
            collision_events: true,
        }
    }
}

/// The seven four-block pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tetromino {
    I,
    O,
    T,
    L,
    J,
    S,
    Z,
}

impl Tetromino {
    pub const ALL: [Tetromino; 7] = [
        Tetromino::I,
        Tetromino::O,
        Tetromino::T,
        Tetromino::L,
        Tetromino::J,
        Tetromino::S,
        Tetromino::Z,
    ];

    pub fn letter(&self) -> char {
        match self {
            Tetromino::I => 'I',
            Tetromino::O => 'O',
            Tetromino::T => 'T',
            Tetromino::L => 'L',
            Tetromino::J => 'J',
            Tetromino::S => 'S',
            Tetromino::Z => 'Z',
        }
    }

    /// Block centres in units of `square_size`, in attachment order.
    pub fn template(&self) -> [(f32, f32); 4] {
        match self {
            Tetromino::T => [(0.0, 0.0), (-1.0, 0.0), (1.0, 0.0), (0.0, 1.0)],
            Tetromino::O => [(-0.5, -0.5), (0.5, -0.5), (-0.5, 0.5), (0.5, 0.5)],
            Tetromino::L => [(-1.0, 0.0), (0.0, 0.0), (1.0, 0.0), (1.0, 1.0)],
            Tetromino::J => [(-1.0, 0.0), (1.0, 0.0), (-1.0, 1.0), (0.0, 0.0)],
            Tetromino::S => [(0.0, 0.0), (-1.0, 0.0), (0.0, 1.0), (1.0, 1.0)],
            Tetromino::Z => [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (-1.0, 1.0)],
            Tetromino::I => [(0.0, -1.5), (0.0, 1.5), (0.0, 0.5), (0.0, -0.5)],
        }
    }

    /// Block centres in pixels.
    pub fn offsets(&self, square_size: f32) -> [(f32, f32); 4] {
        self.template()
            .map(|(x, y)| (x * square_size, y * square_size))
    }
}

impl std::fmt::Display for Tetromino {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Build an axis-aligned box of `width` x `height` pixels centred at
/// `(offset_x, offset_y)` in body space.
///
/// # Panics
///
/// Panics if either dimension is not positive.
pub fn offset_box_collider(
    units: &Units,
    def: &ShapeDef,
    width: f32,
    height: f32,
    offset_x: f32,
    offset_y: f32,
) -> Collider {
    assert!(
        width > 0.0 && height > 0.0,
        "box dimensions must be positive, got {width}x{height}"
    );
    ColliderBuilder::cuboid(units.to_sim(width * 0.5), units.to_sim(height * 0.5))
        .translation(units.vec_to_sim(offset_x, offset_y))
        .density(def.material.density)
        .friction(def.material.friction)
        .restitution(def.material.restitution)
        .collision_groups(def.groups)
        .sensor(def.sensor)
        .active_events(if def.collision_events {
            ActiveEvents::COLLISION_EVENTS
        } else {
            ActiveEvents::empty()
        })
        .build()
}

/// Build ground geometry through `points` (pixels, body space).
///
/// Returns `None` for fewer than two points.
pub fn chain_collider(
    units: &Units,
    points: &[Vec2],
    looped: bool,
    surface: SurfaceMaterial,
) -> Option<Collider> {
    if points.len() < 2 {
        return None;
    }
    let vertices: Vec<Point<Real>> = points
        .iter()
        .map(|p| point![units.to_sim(p.x), units.to_sim(p.y)])
        .collect();
    let last = vertices.len() as u32 - 1;
    let mut indices: Vec<[u32; 2]> = (0..last).map(|i| [i, i + 1]).collect();
    if looped && vertices.len() > 2 {
        indices.push([last, 0]);
    }
    Some(
        ColliderBuilder::polyline(vertices, Some(indices))
            .friction(surface.friction)
            .restitution(surface.restitution)
            .collision_groups(InteractionGroups::new(category::GROUND, category::TETROMINO))
            .build(),
    )
}

impl World {
    /// Attach a box of `width` x `height` pixels centred at the given
    /// body-space offset.
    pub fn attach_offset_box(
        &mut self,
        id: BodyId,
        def: &ShapeDef,
        width: f32,
        height: f32,
        offset_x: f32,
        offset_y: f32,
    ) -> PhysicsResult<ShapeId> {
        let collider = offset_box_collider(&self.units, def, width, height, offset_x, offset_y);
        self.insert_collider(id, collider)
    }

    /// Attach a box centred on the body.
    pub fn attach_box(
        &mut self,
        id: BodyId,
        width: f32,
        height: f32,
        material: &Material,
        enable_contacts: bool,
    ) -> PhysicsResult<ShapeId> {
        let def = ShapeDef::solid(*material, enable_contacts);
        self.attach_offset_box(id, &def, width, height, 0.0, 0.0)
    }

    /// Attach a sensor box and switch the body to sensor bookkeeping.
    pub fn attach_sensor_box(&mut self, id: BodyId, width: f32, height: f32) -> PhysicsResult<ShapeId> {
        let shape = self.attach_offset_box(id, &ShapeDef::sensor(), width, height, 0.0, 0.0)?;
        self.mark_sensor(id)?;
        Ok(shape)
    }

    /// Attach the four blocks of `piece` with the default surface.
    pub fn attach_tetromino(
        &mut self,
        id: BodyId,
        piece: Tetromino,
        square_size: f32,
        density: f32,
    ) -> PhysicsResult<SmallVec<[ShapeId; 4]>> {
        self.attach_tetromino_with(id, piece, square_size, &Material::with_density(density))
    }

    /// Attach the four blocks of `piece`, each made of `material`.
    pub fn attach_tetromino_with(
        &mut self,
        id: BodyId,
        piece: Tetromino,
        square_size: f32,
        material: &Material,
    ) -> PhysicsResult<SmallVec<[ShapeId; 4]>> {
        let def = ShapeDef::tetromino(*material);
        let mut shapes = SmallVec::new();
        for (ox, oy) in piece.offsets(square_size) {
            shapes.push(self.attach_offset_box(id, &def, square_size, square_size, ox, oy)?);
        }
        debug!("Attached {} piece to {:?}", piece, id);
        Ok(shapes)
    }

    /// Attach a chain through `points`. Fewer than two points is a no-op.
    pub fn attach_chain(
        &mut self,
        id: BodyId,
        points: &[Vec2],
        looped: bool,
        surface: SurfaceMaterial,
    ) -> PhysicsResult<Option<ShapeId>> {
        self.rigid_body(id)?;
        match chain_collider(&self.units, points, looped, surface) {
            Some(collider) => self.insert_collider(id, collider).map(Some),
            None => Ok(None),
        }
    }

    fn insert_collider(&mut self, id: BodyId, collider: Collider) -> PhysicsResult<ShapeId> {
        self.rigid_body(id)?;
        let handle = self
            .colliders
            .insert_with_parent(collider, id.handle(), &mut self.bodies);
        self.refresh_mass(id);
        Ok(ShapeId(handle))
    }

    /// Recompute mass properties right away so impulses applied before the
    /// next step see the new shapes.
    pub(super) fn refresh_mass(&mut self, id: BodyId) {
        if let Some(rb) = self.bodies.get_mut(id.handle()) {
            rb.recompute_mass_properties_from_colliders(&self.colliders);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::body::{BodyDef, BodyRole, ShapeInfo};
    use crate::physics::clock::ManualClock;
    use crate::physics::world::WorldConfig;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn make_world() -> World {
        World::with_clock(WorldConfig::default(), ManualClock::new())
    }

    fn polygon_centres(world: &World, id: BodyId) -> Vec<(f32, f32)> {
        world
            .shapes_info(id)
            .unwrap()
            .into_iter()
            .filter_map(|info| match info {
                ShapeInfo::Polygon { x, y, .. } => Some((x, y)),
                ShapeInfo::Segment { .. } => None,
            })
            .collect()
    }

    // ==================== TEMPLATE TESTS ====================

    #[test]
    fn test_templates_have_four_distinct_blocks() {
        for piece in Tetromino::ALL {
            let template = piece.template();
            for (i, a) in template.iter().enumerate() {
                for b in template.iter().skip(i + 1) {
                    assert_ne!(a, b, "{piece} has overlapping blocks");
                }
            }
        }
    }

    #[test]
    fn test_t_offsets_scale_with_square_size() {
        assert_eq!(
            Tetromino::T.offsets(32.0),
            [(0.0, 0.0), (-32.0, 0.0), (32.0, 0.0), (0.0, 32.0)]
        );
    }

    #[test]
    fn test_i_piece_is_vertical() {
        let offsets = Tetromino::I.offsets(20.0);
        assert!(offsets.iter().all(|(x, _)| *x == 0.0));
        assert_eq!(offsets, [(0.0, -30.0), (0.0, 30.0), (0.0, 10.0), (0.0, -10.0)]);
    }

    // ==================== ATTACH TESTS ====================

    #[test]
    fn test_attach_tetromino_matches_template() {
        let mut world = make_world();
        for piece in Tetromino::ALL {
            let id = world.create_body(&BodyDef::dynamic(100.0, 200.0)).unwrap();
            let shapes = world.attach_tetromino(id, piece, 32.0, 1.0).unwrap();
            assert_eq!(shapes.len(), 4);
            assert_eq!(world.shape_count(id).unwrap(), 4);

            let centres = polygon_centres(&world, id);
            for ((x, y), (ex, ey)) in centres.iter().zip(piece.offsets(32.0)) {
                assert!(approx_eq(*x, ex) && approx_eq(*y, ey), "{piece}: ({x},{y}) != ({ex},{ey})");
            }
        }
    }

    #[test]
    fn test_tetromino_blocks_are_square() {
        let mut world = make_world();
        let id = world.create_body(&BodyDef::dynamic(0.0, 0.0)).unwrap();
        world.attach_tetromino(id, Tetromino::S, 20.0, 2.0).unwrap();
        for info in world.shapes_info(id).unwrap() {
            match info {
                ShapeInfo::Polygon { w, h, .. } => {
                    assert!(approx_eq(w, 20.0));
                    assert!(approx_eq(h, 20.0));
                }
                ShapeInfo::Segment { .. } => panic!("unexpected segment"),
            }
        }
    }

    #[test]
    fn test_tetromino_material_reaches_every_block() {
        let mut world = make_world();
        let id = world.create_body(&BodyDef::dynamic(0.0, 0.0)).unwrap();
        let material = Material {
            density: 2.0,
            friction: 0.9,
            restitution: 0.0,
        };
        let shapes = world
            .attach_tetromino_with(id, Tetromino::L, 32.0, &material)
            .unwrap();
        for shape in shapes {
            let collider = world.colliders.get(shape.0).unwrap();
            assert!(approx_eq(collider.friction(), 0.9));
            assert!(approx_eq(collider.restitution(), 0.0));
        }
        assert!(approx_eq(world.mass(id).unwrap(), 8.0));
    }

    #[test]
    fn test_tetromino_default_surface() {
        let mut world = make_world();
        let id = world.create_body(&BodyDef::dynamic(0.0, 0.0)).unwrap();
        let shapes = world.attach_tetromino(id, Tetromino::Z, 32.0, 1.0).unwrap();
        let defaults = Material::default();
        let collider = world.colliders.get(shapes[0].0).unwrap();
        assert!(approx_eq(collider.friction(), defaults.friction));
        assert!(approx_eq(collider.restitution(), defaults.restitution));
    }

    #[test]
    fn test_tetromino_filter_bits() {
        let def = ShapeDef::tetromino(Material::default());
        assert_eq!(def.groups.memberships, category::TETROMINO);
        assert!(def.groups.filter.contains(category::GROUND));
        assert!(def.groups.filter.contains(category::SENSOR));
        assert!(def.groups.filter.contains(category::TETROMINO));
        assert!(def.collision_events);
    }

    #[test]
    fn test_offset_box_position() {
        let mut world = make_world();
        let id = world.create_body(&BodyDef::dynamic(0.0, 0.0)).unwrap();
        world
            .attach_offset_box(id, &ShapeDef::solid(Material::default(), false), 10.0, 30.0, 64.0, -32.0)
            .unwrap();
        assert_eq!(
            world.shapes_info(id).unwrap(),
            vec![ShapeInfo::Polygon { x: 64.0, y: -32.0, w: 10.0, h: 30.0 }]
        );
    }

    #[test]
    #[should_panic]
    fn test_zero_width_box_panics() {
        let mut world = make_world();
        let id = world.create_body(&BodyDef::dynamic(0.0, 0.0)).unwrap();
        let _ = world.attach_box(id, 0.0, 10.0, &Material::default(), false);
    }

    #[test]
    fn test_sensor_box_marks_body() {
        let mut world = make_world();
        let id = world.create_body(&BodyDef::fixed(0.0, 0.0)).unwrap();
        world.attach_sensor_box(id, 64.0, 64.0).unwrap();
        assert_eq!(world.role(id).unwrap(), BodyRole::Sensor);
        let handle = world.rigid_body(id).unwrap().colliders()[0];
        let collider = world.colliders.get(handle).unwrap();
        assert!(collider.is_sensor());
        assert_eq!(collider.collision_groups().memberships, category::SENSOR);
    }

    // ==================== CHAIN TESTS ====================

    #[test]
    fn test_chain_needs_two_points() {
        let mut world = make_world();
        let id = world.create_body(&BodyDef::fixed(0.0, 0.0)).unwrap();
        let one = [Vec2::new(0.0, 0.0)];
        assert_eq!(world.attach_chain(id, &one, false, SurfaceMaterial::default()).unwrap(), None);
        assert_eq!(world.shape_count(id).unwrap(), 0);
    }

    #[test]
    fn test_chain_segments() {
        let mut world = make_world();
        let id = world.create_body(&BodyDef::fixed(0.0, 0.0)).unwrap();
        let points = [Vec2::new(0.0, 0.0), Vec2::new(64.0, 0.0), Vec2::new(64.0, 32.0)];
        world
            .attach_chain(id, &points, true, SurfaceMaterial::default())
            .unwrap()
            .unwrap();
        let segments = world.shapes_info(id).unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(
            segments[0],
            ShapeInfo::Segment { x1: 0.0, y1: 0.0, x2: 64.0, y2: 0.0 }
        );
        assert_eq!(
            segments[2],
            ShapeInfo::Segment { x1: 64.0, y1: 32.0, x2: 0.0, y2: 0.0 }
        );
    }

    #[test]
    fn test_open_chain_has_no_closing_segment() {
        let mut world = make_world();
        let id = world.create_body(&BodyDef::fixed(0.0, 0.0)).unwrap();
        let points = [Vec2::new(0.0, 0.0), Vec2::new(64.0, 0.0), Vec2::new(64.0, 32.0)];
        world
            .attach_chain(id, &points, false, SurfaceMaterial::default())
            .unwrap();
        assert_eq!(world.shapes_info(id).unwrap().len(), 2);
        assert_eq!(world.extents(id).unwrap(), None);
    }
}
