//! `Body` userdata exposed to scripts.
//!
//! A proxy does not own its body: dropping it leaves the body in the world,
//! and once the body or the world is destroyed every call except
//! `destroy()` and `is_valid()` raises an error.

use mlua::prelude::*;

use super::world_api::SharedWorld;
use crate::physics::{BodyId, Material, ShapeInfo, SurfaceMaterial, Tetromino, Vec2};

pub struct LuaBody {
    world: SharedWorld,
    id: BodyId,
}

impl LuaBody {
    pub(super) fn new(world: SharedWorld, id: BodyId) -> Self {
        Self { world, id }
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    fn attach_piece(&self, piece: Tetromino, square_size: f32, material: Material) -> LuaResult<()> {
        if square_size.is_nan() || square_size <= 0.0 {
            return Err(LuaError::runtime(format!(
                "square_size must be positive, got {square_size}"
            )));
        }
        self.world
            .borrow_mut()
            .attach_tetromino_with(self.id, piece, square_size, &material)
            .map_err(LuaError::external)?;
        Ok(())
    }
}

/// Material with any script-supplied values laid over the defaults.
fn material_from(density: Option<f32>, friction: Option<f32>, restitution: Option<f32>) -> Material {
    let defaults = Material::default();
    Material {
        density: density.unwrap_or(defaults.density),
        friction: friction.unwrap_or(defaults.friction),
        restitution: restitution.unwrap_or(defaults.restitution),
    }
}

pub(super) fn vec2_table(lua: &Lua, v: Vec2) -> LuaResult<LuaTable> {
    let table = lua.create_table()?;
    table.set("x", v.x)?;
    table.set("y", v.y)?;
    Ok(table)
}

fn check_size(width: f32, height: f32) -> LuaResult<()> {
    if width > 0.0 && height > 0.0 {
        Ok(())
    } else {
        Err(LuaError::runtime(format!(
            "box dimensions must be positive, got {width}x{height}"
        )))
    }
}

/// Accepts `{x = .., y = ..}` or `{.., ..}` entries.
fn read_points(points: LuaTable) -> LuaResult<Vec<Vec2>> {
    points
        .sequence_values::<LuaTable>()
        .map(|point| {
            let point = point?;
            let x = match point.get::<Option<f32>>("x")? {
                Some(x) => x,
                None => point.get(1)?,
            };
            let y = match point.get::<Option<f32>>("y")? {
                Some(y) => y,
                None => point.get(2)?,
            };
            Ok(Vec2::new(x, y))
        })
        .collect()
}

fn shape_table(lua: &Lua, shape: &ShapeInfo) -> LuaResult<LuaTable> {
    let table = lua.create_table()?;
    match *shape {
        ShapeInfo::Polygon { x, y, w, h } => {
            table.set("x", x)?;
            table.set("y", y)?;
            table.set("w", w)?;
            table.set("h", h)?;
        }
        ShapeInfo::Segment { x1, y1, x2, y2 } => {
            table.set("x1", x1)?;
            table.set("y1", y1)?;
            table.set("x2", x2)?;
            table.set("y2", y2)?;
        }
    }
    Ok(table)
}

/// Registers `create_<letter>_shape` for each piece.
macro_rules! piece_methods {
    ($methods:expr, [$( ($name:literal, $piece:expr) ),* $(,)?]) => {
        $(
            $methods.add_method(
                $name,
                |_, this, (square_size, density, friction, restitution): (f32, Option<f32>, Option<f32>, Option<f32>)| {
                    this.attach_piece($piece, square_size, material_from(density, friction, restitution))
                },
            );
        )*
    };
}

impl LuaUserData for LuaBody {
    fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
        // ===== Shapes =====

        methods.add_method(
            "create_box",
            |_,
             this,
             (width, height, density, friction, restitution, enable_contacts): (
                f32,
                f32,
                Option<f32>,
                Option<f32>,
                Option<f32>,
                Option<bool>,
            )| {
                check_size(width, height)?;
                let material = material_from(density, friction, restitution);
                this.world
                    .borrow_mut()
                    .attach_box(this.id, width, height, &material, enable_contacts.unwrap_or(false))
                    .map_err(LuaError::external)?;
                Ok(())
            },
        );

        methods.add_method("create_sensor_box", |_, this, (width, height): (f32, f32)| {
            check_size(width, height)?;
            this.world
                .borrow_mut()
                .attach_sensor_box(this.id, width, height)
                .map_err(LuaError::external)?;
            Ok(())
        });

        piece_methods!(methods, [
            ("create_i_shape", Tetromino::I),
            ("create_o_shape", Tetromino::O),
            ("create_t_shape", Tetromino::T),
            ("create_l_shape", Tetromino::L),
            ("create_j_shape", Tetromino::J),
            ("create_s_shape", Tetromino::S),
            ("create_z_shape", Tetromino::Z),
        ]);

        methods.add_method(
            "create_chain",
            |_,
             this,
             (points, looped, friction, restitution): (
                LuaTable,
                Option<bool>,
                Option<f32>,
                Option<f32>,
            )| {
                let points = read_points(points)?;
                let defaults = SurfaceMaterial::default();
                let surface = SurfaceMaterial {
                    friction: friction.unwrap_or(defaults.friction),
                    restitution: restitution.unwrap_or(defaults.restitution),
                };
                this.world
                    .borrow_mut()
                    .attach_chain(this.id, &points, looped.unwrap_or(false), surface)
                    .map_err(LuaError::external)?;
                Ok(())
            },
        );

        // ===== Queries =====

        methods.add_method("position", |lua, this, ()| {
            let position = this.world.borrow().position(this.id).map_err(LuaError::external)?;
            vec2_table(lua, position)
        });

        methods.add_method("position_meters", |lua, this, ()| {
            let position = this
                .world
                .borrow()
                .position_meters(this.id)
                .map_err(LuaError::external)?;
            vec2_table(lua, position)
        });

        methods.add_method("extents", |lua, this, ()| {
            let extents = this.world.borrow().extents(this.id).map_err(LuaError::external)?;
            extents
                .map(|e| {
                    let table = lua.create_table()?;
                    table.set("w", e.w)?;
                    table.set("h", e.h)?;
                    Ok(table)
                })
                .transpose()
        });

        methods.add_method("get_shapes_info", |lua, this, ()| {
            let shapes = this.world.borrow().shapes_info(this.id).map_err(LuaError::external)?;
            let table = lua.create_table()?;
            for shape in &shapes {
                table.push(shape_table(lua, shape)?)?;
            }
            Ok(table)
        });

        methods.add_method("angle", |_, this, ()| {
            this.world.borrow().angle(this.id).map_err(LuaError::external)
        });

        methods.add_method("angular_velocity", |_, this, ()| {
            this.world.borrow().angular_velocity(this.id).map_err(LuaError::external)
        });

        methods.add_method("linear_velocity", |lua, this, ()| {
            let velocity = this
                .world
                .borrow()
                .linear_velocity(this.id)
                .map_err(LuaError::external)?;
            vec2_table(lua, velocity)
        });

        methods.add_method("get_info", |lua, this, ()| {
            let info = this.world.borrow().info(this.id).map_err(LuaError::external)?;
            let table = lua.create_table()?;
            table.set("x", info.x)?;
            table.set("y", info.y)?;
            table.set("vx", info.vx)?;
            table.set("vy", info.vy)?;
            table.set("angle", info.angle)?;
            table.set("angular_velocity", info.angular_velocity)?;
            table.set("awake", info.awake)?;
            Ok(table)
        });

        methods.add_method("is_awake", |_, this, ()| {
            this.world.borrow().is_awake(this.id).map_err(LuaError::external)
        });

        methods.add_method("has_collided", |_, this, ()| {
            this.world.borrow().has_collided(this.id).map_err(LuaError::external)
        });

        methods.add_method("sensor_contact_count", |_, this, ()| {
            this.world
                .borrow()
                .sensor_contact_count(this.id)
                .map_err(LuaError::external)
        });

        methods.add_method("mass", |_, this, ()| {
            this.world.borrow().mass(this.id).map_err(LuaError::external)
        });

        methods.add_method("shape_count", |_, this, ()| {
            this.world.borrow().shape_count(this.id).map_err(LuaError::external)
        });

        methods.add_method("kind", |_, this, ()| {
            let kind = this.world.borrow().kind(this.id).map_err(LuaError::external)?;
            Ok(kind.as_str())
        });

        methods.add_method("is_valid", |_, this, ()| {
            let world = this.world.borrow();
            Ok(!world.is_destroyed() && world.contains(this.id))
        });

        // ===== Mutators =====

        methods.add_method("set_position", |_, this, (x, y): (f32, f32)| {
            this.world
                .borrow_mut()
                .set_position(this.id, x, y)
                .map_err(LuaError::external)
        });

        methods.add_method("set_angle", |_, this, degrees: f32| {
            this.world
                .borrow_mut()
                .set_angle(this.id, degrees)
                .map_err(LuaError::external)
        });

        methods.add_method("set_angular_velocity", |_, this, degrees_per_sec: f32| {
            this.world
                .borrow_mut()
                .set_angular_velocity(this.id, degrees_per_sec)
                .map_err(LuaError::external)
        });

        methods.add_method("rotate", |_, this, delta_degrees: f32| {
            this.world
                .borrow_mut()
                .rotate(this.id, delta_degrees)
                .map_err(LuaError::external)
        });

        methods.add_method("apply_force_center", |_, this, (fx, fy): (f32, f32)| {
            this.world
                .borrow_mut()
                .apply_force_center(this.id, fx, fy)
                .map_err(LuaError::external)
        });

        methods.add_method("apply_impulse_center", |_, this, (ix, iy): (f32, f32)| {
            this.world
                .borrow_mut()
                .apply_impulse_center(this.id, ix, iy)
                .map_err(LuaError::external)
        });

        methods.add_method("apply_impulse_for_velocity", |_, this, (vx, vy): (f32, f32)| {
            this.world
                .borrow_mut()
                .apply_impulse_for_velocity(this.id, vx, vy)
                .map_err(LuaError::external)
        });

        methods.add_method("reset_collided", |_, this, ()| {
            this.world
                .borrow_mut()
                .reset_collided(this.id)
                .map_err(LuaError::external)
        });

        methods.add_method("destroy", |_, this, ()| {
            Ok(this.world.borrow_mut().destroy_body(this.id))
        });

        methods.add_meta_method(LuaMetaMethod::ToString, |_, this, ()| {
            Ok(format!("Body({})", this.id.to_bits()))
        });
    }
}
