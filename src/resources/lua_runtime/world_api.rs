//! `World` userdata exposed to scripts.
//!
//! ```lua
//! local world = physics.new_world({ pixels_per_meter = 32 })
//! local block = world:create_body("dynamic", 640, 620)
//! block:create_t_shape(32, 1.0)
//! world:step()
//! local result = world:raycast(200, 92, 1080, 92)
//! for _, body in ipairs(result.bodies_to_split) do
//!     -- same userdata as `block` if it lost shapes
//! end
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use mlua::prelude::*;

use super::body_api::{LuaBody, vec2_table};
use crate::physics::{BodyDef, BodyKind, LineClearReport, OwnerKey, ScanParams, Vec2, World};

pub(super) type SharedWorld = Rc<RefCell<World>>;

/// Script handle to a [`World`].
///
/// Body proxies handed out by `create_body` are remembered in a weak-valued
/// table keyed by their [`OwnerKey`], so a scan can hand back the very
/// userdata the script created without keeping it alive.
pub struct LuaWorld {
    world: SharedWorld,
    proxies: LuaTable,
    next_owner: Cell<u64>,
}

impl LuaWorld {
    pub fn new(lua: &Lua, world: World) -> LuaResult<Self> {
        let proxies: LuaTable = lua
            .load("return setmetatable({}, { __mode = 'v' })")
            .set_name("=proxies")
            .eval()?;
        Ok(Self {
            world: Rc::new(RefCell::new(world)),
            proxies,
            next_owner: Cell::new(1),
        })
    }

    fn next_owner(&self) -> OwnerKey {
        let key = self.next_owner.get();
        self.next_owner.set(key + 1);
        OwnerKey(key)
    }

    /// The script-side proxy for `owner`, if it is still alive.
    fn resolve(&self, owner: OwnerKey) -> LuaResult<Option<LuaAnyUserData>> {
        self.proxies.raw_get(owner.0)
    }

    fn report_table(&self, lua: &Lua, report: &LineClearReport) -> LuaResult<LuaTable> {
        let bodies = lua.create_table()?;
        for split in &report.bodies_to_split {
            if let Some(proxy) = self.resolve(split.owner)? {
                bodies.push(proxy)?;
            }
        }
        let points_table = |points: &[Vec2]| -> LuaResult<LuaTable> {
            let table = lua.create_table()?;
            for point in points {
                table.push(vec2_table(lua, *point)?)?;
            }
            Ok(table)
        };

        let result = lua.create_table()?;
        result.set("bodies_to_split", bodies)?;
        result.set("cleared_points", points_table(&report.cleared_points)?)?;
        result.set("all_hits", points_table(&report.all_hits)?)?;
        Ok(result)
    }
}

impl LuaUserData for LuaWorld {
    fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
        // :create_body(kind, x, y, allow_sleep?, vx?, vy?, angular_velocity?)
        methods.add_method(
            "create_body",
            |lua,
             this,
             (kind, x, y, allow_sleep, vx, vy, angular_velocity): (
                String,
                f32,
                f32,
                Option<bool>,
                Option<f32>,
                Option<f32>,
                Option<f32>,
            )| {
                let kind: BodyKind = kind.parse().map_err(LuaError::external)?;
                let owner = this.next_owner();
                let def = BodyDef::new(kind, x, y)
                    .with_sleep(allow_sleep.unwrap_or(true))
                    .with_velocity(vx.unwrap_or(0.0), vy.unwrap_or(0.0))
                    .with_angular_velocity(angular_velocity.unwrap_or(0.0))
                    .with_owner(owner);
                let id = this
                    .world
                    .borrow_mut()
                    .create_body(&def)
                    .map_err(LuaError::external)?;

                let proxy = lua.create_userdata(LuaBody::new(this.world.clone(), id))?;
                this.proxies.raw_set(owner.0, proxy.clone())?;
                Ok(proxy)
            },
        );

        // :step(dt?)
        methods.add_method("step", |_, this, dt: Option<f32>| {
            let mut world = this.world.borrow_mut();
            match dt {
                Some(dt) => world.step_by(dt),
                None => world.step(),
            }
            .map_err(LuaError::external)?;
            Ok(())
        });

        // :raycast(x1, y1, x2, y2, min_hits?, vertical_tolerance?, horizontal_tolerance?)
        methods.add_method(
            "raycast",
            |lua,
             this,
             (x1, y1, x2, y2, min_hits, vertical_tolerance, horizontal_tolerance): (
                f32,
                f32,
                f32,
                f32,
                Option<usize>,
                Option<f32>,
                Option<f32>,
            )| {
                let defaults = ScanParams::default();
                let params = ScanParams {
                    min_hits: min_hits.unwrap_or(defaults.min_hits),
                    vertical_tolerance: vertical_tolerance.unwrap_or(defaults.vertical_tolerance),
                    horizontal_tolerance: horizontal_tolerance
                        .unwrap_or(defaults.horizontal_tolerance),
                };
                let report = this
                    .world
                    .borrow_mut()
                    .scan_line(Vec2::new(x1, y1), Vec2::new(x2, y2), &params)
                    .map_err(LuaError::external)?;
                this.report_table(lua, &report)
            },
        );

        methods.add_method("clear_collision_flags", |_, this, ()| {
            this.world.borrow_mut().clear_collision_flags();
            Ok(())
        });

        methods.add_method("body_count", |_, this, ()| Ok(this.world.borrow().body_count()));

        methods.add_method("step_count", |_, this, ()| Ok(this.world.borrow().step_count()));

        methods.add_method("pixels_per_meter", |_, this, ()| {
            Ok(this.world.borrow().units().pixels_per_meter())
        });

        methods.add_method("is_destroyed", |_, this, ()| Ok(this.world.borrow().is_destroyed()));

        methods.add_method("destroy", |_, this, ()| {
            this.world.borrow_mut().destroy();
            Ok(())
        });

        methods.add_meta_method(LuaMetaMethod::ToString, |_, this, ()| {
            let world = this.world.borrow();
            Ok(format!(
                "World(bodies={}, steps={})",
                world.body_count(),
                world.step_count()
            ))
        });
    }
}
