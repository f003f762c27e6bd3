//! Lua stub generator for EmmyLua / lua-language-server.
//!
//! Reads `engine.__meta` from the Lua runtime and emits a deterministic
//! stub file with `---@class`, `---@field`, `---@param` and `---@return`
//! annotations for the `engine` and `physics` tables and the `World` and
//! `Body` userdata.

use crate::resources::lua_runtime::LuaRuntime;
use mlua::prelude::*;
use std::fmt::{self, Write as FmtWrite};
use std::path::Path;

/// Category display order for deterministic output.
const CATEGORY_ORDER: &[&str] = &["base", "physics"];

/// Section titles for each category.
fn category_title(cat: &str) -> &str {
    match cat {
        "base" => "Logging Functions",
        "physics" => "Physics",
        _ => cat,
    }
}

const CLASS_ORDER: &[&str] = &["World", "Body"];

const TYPE_ORDER: &[&str] = &[
    "Vector2",
    "Extents",
    "ShapeInfo",
    "BodyInfo",
    "RaycastResult",
    "WorldOptions",
];

const CALLBACK_ORDER: &[&str] = &["setup", "tick"];

fn order_of(order: &[&str], name: &str) -> usize {
    order.iter().position(|n| *n == name).unwrap_or(order.len())
}

/// Maps a meta type string to the EmmyLua annotation type.
fn lua_type_annotation(meta_type: &str) -> String {
    match meta_type {
        "number" | "integer" | "string" | "boolean" | "table" => meta_type.into(),
        s if s.ends_with('?') => format!("{}|nil", lua_type_annotation(&s[..s.len() - 1])),
        other => other.into(),
    }
}

struct FnMeta {
    table: String,
    name: String,
    description: String,
    category: String,
    params: Vec<(String, String)>,
    returns: Option<String>,
}

struct ClassMeta {
    name: String,
    description: String,
    methods: Vec<MethodMeta>,
}

struct MethodMeta {
    name: String,
    description: String,
    params: Vec<(String, String)>,
    returns: Option<String>,
}

struct TypeMeta {
    name: String,
    description: String,
    fields: Vec<FieldMeta>,
}

struct FieldMeta {
    name: String,
    type_name: String,
    optional: bool,
    description: Option<String>,
}

struct EnumMeta {
    name: String,
    description: String,
    values: Vec<String>,
}

struct CallbackMeta {
    name: String,
    description: String,
    params: Vec<(String, String)>,
    note: Option<String>,
}

struct ConstantMeta {
    table: String,
    name: String,
    value: f64,
    description: String,
}

/// Everything read out of `engine.__meta`.
struct ApiMeta {
    functions: Vec<FnMeta>,
    classes: Vec<ClassMeta>,
    types: Vec<TypeMeta>,
    enums: Vec<EnumMeta>,
    callbacks: Vec<CallbackMeta>,
    constants: Vec<ConstantMeta>,
}

/// Extract all metadata from `engine.__meta` and generate the stub file content.
pub fn generate_stubs(runtime: &LuaRuntime) -> Result<String, String> {
    let lua = runtime.lua();

    let engine: LuaTable = lua
        .globals()
        .get("engine")
        .map_err(|e| format!("Failed to get engine table: {e}"))?;
    let meta: LuaTable = engine
        .get("__meta")
        .map_err(|e| format!("Failed to get engine.__meta: {e}"))?;

    let api = ApiMeta {
        functions: extract_functions(&meta).map_err(|e| format!("Functions: {e}"))?,
        classes: extract_classes(&meta).map_err(|e| format!("Classes: {e}"))?,
        types: extract_types(&meta).map_err(|e| format!("Types: {e}"))?,
        enums: extract_enums(&meta).map_err(|e| format!("Enums: {e}"))?,
        callbacks: extract_callbacks(&meta).map_err(|e| format!("Callbacks: {e}"))?,
        constants: extract_constants(&meta).map_err(|e| format!("Constants: {e}"))?,
    };

    let mut out = String::with_capacity(32 * 1024);
    render_stubs(&mut out, &api).map_err(|e| format!("Failed to render stubs: {e}"))?;
    Ok(out)
}

/// Write the generated stubs to a file, creating parent directories.
pub fn write_stubs(path: &Path, content: &str) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
    }
    std::fs::write(path, content).map_err(|e| format!("Failed to write {}: {e}", path.display()))
}

// --------------- Extraction ---------------

fn extract_params(tbl: &LuaTable) -> Result<Vec<(String, String)>, LuaError> {
    let params_tbl: LuaTable = tbl.get("params")?;
    let mut params = Vec::new();
    for p in params_tbl.sequence_values::<LuaTable>() {
        let p = p?;
        params.push((p.get::<String>("name")?, p.get::<String>("type")?));
    }
    Ok(params)
}

fn extract_returns(tbl: &LuaTable) -> Option<String> {
    tbl.get::<LuaTable>("returns")
        .ok()
        .and_then(|r| r.get::<String>("type").ok())
}

fn extract_functions(meta: &LuaTable) -> Result<Vec<FnMeta>, LuaError> {
    let fns_tbl: LuaTable = meta.get("functions")?;
    let mut result = Vec::new();
    for pair in fns_tbl.pairs::<String, LuaTable>() {
        let (name, tbl) = pair?;
        result.push(FnMeta {
            table: tbl.get("table")?,
            description: tbl.get("description")?,
            category: tbl.get("category")?,
            params: extract_params(&tbl)?,
            returns: extract_returns(&tbl),
            name,
        });
    }
    // Sort by category order, then alphabetically within category
    result.sort_by(|a, b| {
        order_of(CATEGORY_ORDER, &a.category)
            .cmp(&order_of(CATEGORY_ORDER, &b.category))
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(result)
}

fn extract_classes(meta: &LuaTable) -> Result<Vec<ClassMeta>, LuaError> {
    let classes_tbl: LuaTable = meta.get("classes")?;
    let mut result = Vec::new();
    for pair in classes_tbl.pairs::<String, LuaTable>() {
        let (name, tbl) = pair?;
        let methods_tbl: LuaTable = tbl.get("methods")?;
        let mut methods = Vec::new();
        for mp in methods_tbl.pairs::<String, LuaTable>() {
            let (mname, mtbl) = mp?;
            methods.push(MethodMeta {
                description: mtbl.get("description")?,
                params: extract_params(&mtbl)?,
                returns: extract_returns(&mtbl),
                name: mname,
            });
        }
        methods.sort_by(|a, b| method_sort_key(&a.name).cmp(&method_sort_key(&b.name)));
        result.push(ClassMeta {
            description: tbl.get("description")?,
            methods,
            name,
        });
    }
    result.sort_by_key(|c| order_of(CLASS_ORDER, &c.name));
    Ok(result)
}

/// Constructors first, `destroy` last, everything else alphabetical.
fn method_sort_key(name: &str) -> (u8, &str) {
    if name.starts_with("create_") {
        (0, name)
    } else if name == "destroy" {
        (2, name)
    } else {
        (1, name)
    }
}

fn extract_types(meta: &LuaTable) -> Result<Vec<TypeMeta>, LuaError> {
    let types_tbl: LuaTable = meta.get("types")?;
    let mut result = Vec::new();
    for pair in types_tbl.pairs::<String, LuaTable>() {
        let (name, tbl) = pair?;
        let fields_tbl: LuaTable = tbl.get("fields")?;
        let mut fields = Vec::new();
        for f in fields_tbl.sequence_values::<LuaTable>() {
            let f = f?;
            fields.push(FieldMeta {
                name: f.get("name")?,
                type_name: f.get("type")?,
                optional: f.get("optional")?,
                description: f.get::<String>("description").ok(),
            });
        }
        result.push(TypeMeta {
            description: tbl.get("description")?,
            fields,
            name,
        });
    }
    result.sort_by(|a, b| {
        order_of(TYPE_ORDER, &a.name)
            .cmp(&order_of(TYPE_ORDER, &b.name))
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(result)
}

fn extract_enums(meta: &LuaTable) -> Result<Vec<EnumMeta>, LuaError> {
    let enums_tbl: LuaTable = meta.get("enums")?;
    let mut result = Vec::new();
    for pair in enums_tbl.pairs::<String, LuaTable>() {
        let (name, tbl) = pair?;
        let vals_tbl: LuaTable = tbl.get("values")?;
        let values = vals_tbl
            .sequence_values::<String>()
            .collect::<Result<Vec<_>, _>>()?;
        result.push(EnumMeta {
            description: tbl.get("description")?,
            values,
            name,
        });
    }
    result.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(result)
}

fn extract_callbacks(meta: &LuaTable) -> Result<Vec<CallbackMeta>, LuaError> {
    let cb_tbl: LuaTable = meta.get("callbacks")?;
    let mut result = Vec::new();
    for pair in cb_tbl.pairs::<String, LuaTable>() {
        let (name, tbl) = pair?;
        result.push(CallbackMeta {
            description: tbl.get("description")?,
            params: extract_params(&tbl)?,
            note: tbl.get::<String>("note").ok(),
            name,
        });
    }
    result.sort_by_key(|c| order_of(CALLBACK_ORDER, &c.name));
    Ok(result)
}

fn extract_constants(meta: &LuaTable) -> Result<Vec<ConstantMeta>, LuaError> {
    let consts_tbl: LuaTable = meta.get("constants")?;
    let mut result = Vec::new();
    for pair in consts_tbl.pairs::<String, LuaTable>() {
        let (name, tbl) = pair?;
        result.push(ConstantMeta {
            table: tbl.get("table")?,
            value: tbl.get("value")?,
            description: tbl.get("description")?,
            name,
        });
    }
    result.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(result)
}

// --------------- Rendering ---------------

fn render_stubs(out: &mut String, api: &ApiMeta) -> fmt::Result {
    writeln!(out, "---@meta")?;
    writeln!(out)?;
    writeln!(
        out,
        "-- THIS FILE IS AUTO-GENERATED by `tetrafall --create-lua-stubs`."
    )?;
    writeln!(
        out,
        "-- DO NOT EDIT MANUALLY. Regenerate from engine.__meta instead."
    )?;
    writeln!(out)?;
    writeln!(out, "---@class engine")?;
    writeln!(out, "---Host services provided by tetrafall (Rust)")?;
    writeln!(out, "engine = {{}}")?;
    writeln!(out)?;
    writeln!(out, "---@class physics")?;
    writeln!(out, "---Rigid-body physics for falling-block games")?;
    for c in &api.constants {
        writeln!(out, "---@field {} number {}", c.name, c.description)?;
    }
    writeln!(out, "physics = {{}}")?;
    writeln!(out)?;

    render_constants(out, &api.constants)?;
    render_types(out, &api.types)?;
    render_enums(out, &api.enums)?;
    render_callbacks(out, &api.callbacks)?;
    render_functions(out, &api.functions)?;
    for class in &api.classes {
        render_class(out, class)?;
    }
    Ok(())
}

fn render_constants(out: &mut String, constants: &[ConstantMeta]) -> fmt::Result {
    writeln!(out, "-- ==================== Constants ====================")?;
    writeln!(out)?;
    for c in constants {
        writeln!(out, "---{}", c.description)?;
        writeln!(out, "{}.{} = {}", c.table, c.name, c.value as f32)?;
    }
    writeln!(out)
}

fn render_types(out: &mut String, types: &[TypeMeta]) -> fmt::Result {
    writeln!(out, "-- ==================== Types ====================")?;
    writeln!(out)?;

    for t in types {
        writeln!(out, "---{}", t.description)?;
        writeln!(out, "---@class {}", t.name)?;
        for f in &t.fields {
            let typ = lua_type_annotation(&f.type_name);
            let full_type = if f.optional {
                format!("{}|nil", typ)
            } else {
                typ
            };
            match f.description {
                Some(ref desc) => writeln!(out, "---@field {} {} {}", f.name, full_type, desc)?,
                None => writeln!(out, "---@field {} {}", f.name, full_type)?,
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

fn render_enums(out: &mut String, enums: &[EnumMeta]) -> fmt::Result {
    writeln!(out, "-- ==================== Enums ====================")?;
    writeln!(out)?;

    for e in enums {
        writeln!(out, "---{}", e.description)?;
        let values_str: Vec<String> = e.values.iter().map(|v| format!("\"{}\"", v)).collect();
        writeln!(out, "---@alias {} {}", e.name, values_str.join(" | "))?;
        writeln!(out)?;
    }
    Ok(())
}

fn render_callbacks(out: &mut String, callbacks: &[CallbackMeta]) -> fmt::Result {
    writeln!(
        out,
        "-- ==================== Callback Signatures ===================="
    )?;
    writeln!(
        out,
        "-- Define these globals in your script; the host calls them."
    )?;
    writeln!(out)?;

    for cb in callbacks {
        writeln!(out, "---{}", cb.description)?;
        if let Some(ref note) = cb.note {
            writeln!(out, "---NOTE: {}", note)?;
        }
        for (pname, ptype) in &cb.params {
            writeln!(out, "---@param {} {}", pname, lua_type_annotation(ptype))?;
        }
        let param_names: Vec<&str> = cb.params.iter().map(|(n, _)| n.as_str()).collect();
        writeln!(out, "function {}({}) end", cb.name, param_names.join(", "))?;
        writeln!(out)?;
    }
    Ok(())
}

fn render_functions(out: &mut String, functions: &[FnMeta]) -> fmt::Result {
    let mut current_category = "";

    for f in functions {
        if f.category != current_category {
            current_category = &f.category;
            writeln!(
                out,
                "-- ==================== {} ====================",
                category_title(current_category)
            )?;
            writeln!(out)?;
        }
        write_description(out, &f.description)?;
        write_signature(out, &f.params, f.returns.as_deref())?;
        let param_names: Vec<&str> = f.params.iter().map(|(n, _)| n.as_str()).collect();
        writeln!(
            out,
            "function {}.{}({}) end",
            f.table,
            f.name,
            param_names.join(", ")
        )?;
        writeln!(out)?;
    }
    Ok(())
}

fn write_signature(
    out: &mut String,
    params: &[(String, String)],
    returns: Option<&str>,
) -> fmt::Result {
    for (pname, ptype) in params {
        writeln!(out, "---@param {} {}", pname, lua_type_annotation(ptype))?;
    }
    if let Some(ret) = returns {
        writeln!(out, "---@return {}", lua_type_annotation(ret))?;
    }
    Ok(())
}

/// Writes a description as doc-comment lines, handling multi-line descriptions.
fn write_description(out: &mut String, description: &str) -> fmt::Result {
    for line in description.lines() {
        writeln!(out, "---{}", line)?;
    }
    Ok(())
}

fn render_class(out: &mut String, class: &ClassMeta) -> fmt::Result {
    writeln!(
        out,
        "-- ==================== {} ====================",
        class.name
    )?;
    writeln!(out)?;
    writeln!(out, "---@class {}", class.name)?;
    writeln!(out, "---{}", class.description)?;
    writeln!(out, "local {} = {{}}", class.name)?;
    writeln!(out)?;

    for m in &class.methods {
        write_description(out, &m.description)?;
        write_signature(out, &m.params, m.returns.as_deref())?;
        let param_names: Vec<&str> = m.params.iter().map(|(n, _)| n.as_str()).collect();
        writeln!(
            out,
            "function {}:{}({}) end",
            class.name,
            m.name,
            param_names.join(", ")
        )?;
        writeln!(out)?;
    }
    Ok(())
}
