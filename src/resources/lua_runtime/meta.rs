//! Static descriptions of the script API.
//!
//! These tables are the single source for `engine.__meta`, which the stub
//! generator reads to produce editor annotations. Whenever a function or
//! method is registered in [`super::runtime`], [`super::world_api`] or
//! [`super::body_api`], it gets an entry here.

use mlua::prelude::*;

pub(super) struct Param {
    pub name: &'static str,
    pub ty: &'static str,
}

const fn p(name: &'static str, ty: &'static str) -> Param {
    Param { name, ty }
}

pub(super) struct Function {
    /// Global table the function lives in.
    pub table: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub params: &'static [Param],
    pub returns: Option<&'static str>,
}

pub(super) struct Method {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [Param],
    pub returns: Option<&'static str>,
}

pub(super) struct Class {
    pub name: &'static str,
    pub description: &'static str,
    pub methods: &'static [Method],
}

pub(super) struct Field {
    pub name: &'static str,
    pub ty: &'static str,
    pub optional: bool,
    pub description: Option<&'static str>,
}

const fn f(name: &'static str, ty: &'static str) -> Field {
    Field {
        name,
        ty,
        optional: false,
        description: None,
    }
}

const fn opt(name: &'static str, ty: &'static str, description: &'static str) -> Field {
    Field {
        name,
        ty,
        optional: true,
        description: Some(description),
    }
}

pub(super) struct TypeDesc {
    pub name: &'static str,
    pub description: &'static str,
    pub fields: &'static [Field],
}

pub(super) struct EnumDesc {
    pub name: &'static str,
    pub description: &'static str,
    pub values: &'static [&'static str],
}

pub(super) struct Callback {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [Param],
    pub note: Option<&'static str>,
}

pub(super) struct Constant {
    pub table: &'static str,
    pub name: &'static str,
    pub value: f64,
    pub description: &'static str,
}

const NO_PARAMS: &[Param] = &[];

pub(super) const FUNCTIONS: &[Function] = &[
    Function {
        table: "engine",
        name: "log",
        category: "base",
        description: "Log a message at info level.",
        params: &[p("message", "string")],
        returns: None,
    },
    Function {
        table: "engine",
        name: "log_info",
        category: "base",
        description: "Log a message at info level.",
        params: &[p("message", "string")],
        returns: None,
    },
    Function {
        table: "engine",
        name: "log_warn",
        category: "base",
        description: "Log a warning.",
        params: &[p("message", "string")],
        returns: None,
    },
    Function {
        table: "engine",
        name: "log_error",
        category: "base",
        description: "Log an error.",
        params: &[p("message", "string")],
        returns: None,
    },
    Function {
        table: "physics",
        name: "new_world",
        category: "physics",
        description: "Create a physics world. The scale is fixed for the world's lifetime.",
        params: &[p("opts", "WorldOptions?")],
        returns: Some("World"),
    },
];

pub(super) const CONSTANTS: &[Constant] = &[
    Constant {
        table: "physics",
        name: "PIXELS_PER_METER",
        value: crate::physics::units::PIXELS_PER_METER as f64,
        description: "Default display pixels per simulation meter",
    },
    Constant {
        table: "physics",
        name: "MAX_STEP",
        value: crate::physics::world::MAX_STEP as f64,
        description: "Longest time a single step advances, in seconds",
    },
    Constant {
        table: "physics",
        name: "SUBSTEPS",
        value: crate::physics::world::SUBSTEPS as f64,
        description: "Solver sub-steps per advance",
    },
];

const WORLD_METHODS: &[Method] = &[
    Method {
        name: "create_body",
        description: "Create a body at (x, y) pixels. Velocities are pixels/s and degrees/s.",
        params: &[
            p("kind", "BodyKind"),
            p("x", "number"),
            p("y", "number"),
            p("allow_sleep", "boolean?"),
            p("vx", "number?"),
            p("vy", "number?"),
            p("angular_velocity", "number?"),
        ],
        returns: Some("Body"),
    },
    Method {
        name: "step",
        description: "Advance the simulation by the time since the last step (or by dt), at most MAX_STEP.",
        params: &[p("dt", "number?")],
        returns: None,
    },
    Method {
        name: "raycast",
        description: "Scan a segment for a row of resting blocks and clear it.",
        params: &[
            p("x1", "number"),
            p("y1", "number"),
            p("x2", "number"),
            p("y2", "number"),
            p("min_hits", "integer?"),
            p("vertical_tolerance", "number?"),
            p("horizontal_tolerance", "number?"),
        ],
        returns: Some("RaycastResult"),
    },
    Method {
        name: "clear_collision_flags",
        description: "Reset the collided flag on every body. Call once per frame.",
        params: NO_PARAMS,
        returns: None,
    },
    Method {
        name: "body_count",
        description: "Number of live bodies.",
        params: NO_PARAMS,
        returns: Some("integer"),
    },
    Method {
        name: "step_count",
        description: "Number of steps taken.",
        params: NO_PARAMS,
        returns: Some("integer"),
    },
    Method {
        name: "pixels_per_meter",
        description: "The world's scale.",
        params: NO_PARAMS,
        returns: Some("number"),
    },
    Method {
        name: "is_destroyed",
        description: "True once destroy() has been called.",
        params: NO_PARAMS,
        returns: Some("boolean"),
    },
    Method {
        name: "destroy",
        description: "Destroy the world and every body in it.",
        params: NO_PARAMS,
        returns: None,
    },
];

const BODY_METHODS: &[Method] = &[
    Method {
        name: "create_box",
        description: "Attach a solid box centred on the body.",
        params: &[
            p("width", "number"),
            p("height", "number"),
            p("density", "number?"),
            p("friction", "number?"),
            p("restitution", "number?"),
            p("enable_contacts", "boolean?"),
        ],
        returns: None,
    },
    Method {
        name: "create_sensor_box",
        description: "Attach a sensor box and count overlapping blocks.",
        params: &[p("width", "number"), p("height", "number")],
        returns: None,
    },
    Method {
        name: "create_i_shape",
        description: "Attach an I piece.",
        params: &[
            p("square_size", "number"),
            p("density", "number?"),
            p("friction", "number?"),
            p("restitution", "number?"),
        ],
        returns: None,
    },
    Method {
        name: "create_o_shape",
        description: "Attach an O piece.",
        params: &[
            p("square_size", "number"),
            p("density", "number?"),
            p("friction", "number?"),
            p("restitution", "number?"),
        ],
        returns: None,
    },
    Method {
        name: "create_t_shape",
        description: "Attach a T piece.",
        params: &[
            p("square_size", "number"),
            p("density", "number?"),
            p("friction", "number?"),
            p("restitution", "number?"),
        ],
        returns: None,
    },
    Method {
        name: "create_l_shape",
        description: "Attach an L piece.",
        params: &[
            p("square_size", "number"),
            p("density", "number?"),
            p("friction", "number?"),
            p("restitution", "number?"),
        ],
        returns: None,
    },
    Method {
        name: "create_j_shape",
        description: "Attach a J piece.",
        params: &[
            p("square_size", "number"),
            p("density", "number?"),
            p("friction", "number?"),
            p("restitution", "number?"),
        ],
        returns: None,
    },
    Method {
        name: "create_s_shape",
        description: "Attach an S piece.",
        params: &[
            p("square_size", "number"),
            p("density", "number?"),
            p("friction", "number?"),
            p("restitution", "number?"),
        ],
        returns: None,
    },
    Method {
        name: "create_z_shape",
        description: "Attach a Z piece.",
        params: &[
            p("square_size", "number"),
            p("density", "number?"),
            p("friction", "number?"),
            p("restitution", "number?"),
        ],
        returns: None,
    },
    Method {
        name: "create_chain",
        description: "Attach ground geometry through the given points.",
        params: &[
            p("points", "Vector2[]"),
            p("looped", "boolean?"),
            p("friction", "number?"),
            p("restitution", "number?"),
        ],
        returns: None,
    },
    Method {
        name: "position",
        description: "Position in pixels.",
        params: NO_PARAMS,
        returns: Some("Vector2"),
    },
    Method {
        name: "position_meters",
        description: "Position in simulation meters.",
        params: NO_PARAMS,
        returns: Some("Vector2"),
    },
    Method {
        name: "set_position",
        description: "Teleport the body.",
        params: &[p("x", "number"), p("y", "number")],
        returns: None,
    },
    Method {
        name: "extents",
        description: "Size of the first shape, or nil if it is not a polygon.",
        params: NO_PARAMS,
        returns: Some("Extents?"),
    },
    Method {
        name: "get_shapes_info",
        description: "Body-local geometry of every shape.",
        params: NO_PARAMS,
        returns: Some("ShapeInfo[]"),
    },
    Method {
        name: "angle",
        description: "Angle in degrees.",
        params: NO_PARAMS,
        returns: Some("number"),
    },
    Method {
        name: "set_angle",
        description: "Set the angle in degrees.",
        params: &[p("degrees", "number")],
        returns: None,
    },
    Method {
        name: "angular_velocity",
        description: "Angular velocity in degrees per second.",
        params: NO_PARAMS,
        returns: Some("number"),
    },
    Method {
        name: "set_angular_velocity",
        description: "Set the angular velocity in degrees per second.",
        params: &[p("degrees_per_sec", "number")],
        returns: None,
    },
    Method {
        name: "linear_velocity",
        description: "Velocity in pixels per second.",
        params: NO_PARAMS,
        returns: Some("Vector2"),
    },
    Method {
        name: "rotate",
        description: "Turn towards angle + delta with a rate-limited impulse.",
        params: &[p("delta_degrees", "number")],
        returns: None,
    },
    Method {
        name: "apply_force_center",
        description: "Apply a force at the centre of mass for the next step.",
        params: &[p("fx", "number"), p("fy", "number")],
        returns: None,
    },
    Method {
        name: "apply_impulse_center",
        description: "Apply an impulse at the centre of mass.",
        params: &[p("ix", "number"), p("iy", "number")],
        returns: None,
    },
    Method {
        name: "apply_impulse_for_velocity",
        description: "Apply the impulse that sets the velocity to (vx, vy) m/s.",
        params: &[p("vx", "number"), p("vy", "number")],
        returns: None,
    },
    Method {
        name: "get_info",
        description: "Position, velocity, angle and sleep state in one table.",
        params: NO_PARAMS,
        returns: Some("BodyInfo"),
    },
    Method {
        name: "is_awake",
        description: "False while the body sleeps.",
        params: NO_PARAMS,
        returns: Some("boolean"),
    },
    Method {
        name: "has_collided",
        description: "True once any contact began since the last reset.",
        params: NO_PARAMS,
        returns: Some("boolean"),
    },
    Method {
        name: "reset_collided",
        description: "Clear the collided flag.",
        params: NO_PARAMS,
        returns: None,
    },
    Method {
        name: "sensor_contact_count",
        description: "Blocks currently overlapping this sensor.",
        params: NO_PARAMS,
        returns: Some("integer"),
    },
    Method {
        name: "mass",
        description: "Mass in kilograms.",
        params: NO_PARAMS,
        returns: Some("number"),
    },
    Method {
        name: "shape_count",
        description: "Number of attached shapes.",
        params: NO_PARAMS,
        returns: Some("integer"),
    },
    Method {
        name: "kind",
        description: "Body type.",
        params: NO_PARAMS,
        returns: Some("BodyKind"),
    },
    Method {
        name: "is_valid",
        description: "False once the body or its world is destroyed.",
        params: NO_PARAMS,
        returns: Some("boolean"),
    },
    Method {
        name: "destroy",
        description: "Destroy the body. Returns false if it was already gone.",
        params: NO_PARAMS,
        returns: Some("boolean"),
    },
];

pub(super) const CLASSES: &[Class] = &[
    Class {
        name: "World",
        description: "A physics world created by physics.new_world()",
        methods: WORLD_METHODS,
    },
    Class {
        name: "Body",
        description: "A rigid body created by World:create_body()",
        methods: BODY_METHODS,
    },
];

pub(super) const TYPES: &[TypeDesc] = &[
    TypeDesc {
        name: "Vector2",
        description: "A 2D point or vector",
        fields: &[f("x", "number"), f("y", "number")],
    },
    TypeDesc {
        name: "Extents",
        description: "Width and height in pixels",
        fields: &[f("w", "number"), f("h", "number")],
    },
    TypeDesc {
        name: "ShapeInfo",
        description: "A polygon (x, y, w, h) or a chain segment (x1, y1, x2, y2)",
        fields: &[
            opt("x", "number", "polygon centre"),
            opt("y", "number", "polygon centre"),
            opt("w", "number", "polygon width"),
            opt("h", "number", "polygon height"),
            opt("x1", "number", "segment start"),
            opt("y1", "number", "segment start"),
            opt("x2", "number", "segment end"),
            opt("y2", "number", "segment end"),
        ],
    },
    TypeDesc {
        name: "BodyInfo",
        description: "Snapshot of a body's motion",
        fields: &[
            f("x", "number"),
            f("y", "number"),
            f("vx", "number"),
            f("vy", "number"),
            f("angle", "number"),
            f("angular_velocity", "number"),
            f("awake", "boolean"),
        ],
    },
    TypeDesc {
        name: "RaycastResult",
        description: "Outcome of World:raycast()",
        fields: &[
            f("bodies_to_split", "Body[]"),
            f("cleared_points", "Vector2[]"),
            f("all_hits", "Vector2[]"),
        ],
    },
    TypeDesc {
        name: "WorldOptions",
        description: "Options for physics.new_world()",
        fields: &[
            opt("pixels_per_meter", "number", "scale, default PIXELS_PER_METER"),
            opt("gravity_x", "number", "m/s^2, default 0"),
            opt("gravity_y", "number", "m/s^2, default -9.8"),
        ],
    },
];

pub(super) const ENUMS: &[EnumDesc] = &[EnumDesc {
    name: "BodyKind",
    description: "Rigid body type",
    values: &["static", "dynamic", "kinematic"],
}];

pub(super) const CALLBACKS: &[Callback] = &[
    Callback {
        name: "setup",
        description: "Called once after the script is loaded.",
        params: NO_PARAMS,
        note: None,
    },
    Callback {
        name: "tick",
        description: "Called every frame.",
        params: &[p("frame", "integer"), p("dt", "number")],
        note: Some("The world clock has already advanced by dt when tick runs."),
    },
];

fn params_table(lua: &Lua, params: &[Param]) -> LuaResult<LuaTable> {
    let table = lua.create_table()?;
    for param in params {
        let entry = lua.create_table()?;
        entry.set("name", param.name)?;
        entry.set("type", param.ty)?;
        table.push(entry)?;
    }
    Ok(table)
}

fn returns_table(lua: &Lua, returns: Option<&str>) -> LuaResult<Option<LuaTable>> {
    returns
        .map(|ty| {
            let table = lua.create_table()?;
            table.set("type", ty)?;
            Ok(table)
        })
        .transpose()
}

/// Build the `engine.__meta` table.
pub(super) fn build_meta(lua: &Lua) -> LuaResult<LuaTable> {
    let meta = lua.create_table()?;

    let functions = lua.create_table()?;
    for func in FUNCTIONS {
        let entry = lua.create_table()?;
        entry.set("table", func.table)?;
        entry.set("description", func.description)?;
        entry.set("category", func.category)?;
        entry.set("params", params_table(lua, func.params)?)?;
        entry.set("returns", returns_table(lua, func.returns)?)?;
        functions.set(func.name, entry)?;
    }
    meta.set("functions", functions)?;

    let classes = lua.create_table()?;
    for class in CLASSES {
        let methods = lua.create_table()?;
        for method in class.methods {
            let entry = lua.create_table()?;
            entry.set("description", method.description)?;
            entry.set("params", params_table(lua, method.params)?)?;
            entry.set("returns", returns_table(lua, method.returns)?)?;
            methods.set(method.name, entry)?;
        }
        let entry = lua.create_table()?;
        entry.set("description", class.description)?;
        entry.set("methods", methods)?;
        classes.set(class.name, entry)?;
    }
    meta.set("classes", classes)?;

    let types = lua.create_table()?;
    for ty in TYPES {
        let fields = lua.create_table()?;
        for field in ty.fields {
            let entry = lua.create_table()?;
            entry.set("name", field.name)?;
            entry.set("type", field.ty)?;
            entry.set("optional", field.optional)?;
            entry.set("description", field.description)?;
            fields.push(entry)?;
        }
        let entry = lua.create_table()?;
        entry.set("description", ty.description)?;
        entry.set("fields", fields)?;
        types.set(ty.name, entry)?;
    }
    meta.set("types", types)?;

    let enums = lua.create_table()?;
    for e in ENUMS {
        let entry = lua.create_table()?;
        entry.set("description", e.description)?;
        entry.set("values", lua.create_sequence_from(e.values.iter().copied())?)?;
        enums.set(e.name, entry)?;
    }
    meta.set("enums", enums)?;

    let callbacks = lua.create_table()?;
    for cb in CALLBACKS {
        let entry = lua.create_table()?;
        entry.set("description", cb.description)?;
        entry.set("params", params_table(lua, cb.params)?)?;
        entry.set("note", cb.note)?;
        callbacks.set(cb.name, entry)?;
    }
    meta.set("callbacks", callbacks)?;

    let constants = lua.create_table()?;
    for c in CONSTANTS {
        let entry = lua.create_table()?;
        entry.set("table", c.table)?;
        entry.set("value", c.value)?;
        entry.set("description", c.description)?;
        constants.set(c.name, entry)?;
    }
    meta.set("constants", constants)?;

    Ok(meta)
}
