//! Sandboxed interpreter construction and Lua error/value formatting.
//!
//! The VM loads a fixed allow-list of standard libraries: coroutine,
//! math, package (for `require` under the controlled search path),
//! string, table and utf8, plus the always-present base library. `io`,
//! `os` and `debug` are never loaded, and the base-library entry points
//! that execute arbitrary code from strings or files (`load`, `loadfile`,
//! `dofile`) are scrubbed, as is `package.loadlib`. The registered host
//! functions are the only sanctioned way for a script to affect the host.

use mlua::{Lua, LuaOptions, StdLib, Value};

/// Create a fresh sandboxed Lua VM.
pub fn new_sandboxed_lua() -> mlua::Result<Lua> {
    let lua = Lua::new_with(
        StdLib::COROUTINE
            | StdLib::MATH
            | StdLib::PACKAGE
            | StdLib::STRING
            | StdLib::TABLE
            | StdLib::UTF8,
        LuaOptions::default(),
    )?;

    let globals = lua.globals();
    globals.set("load", Value::Nil)?;
    globals.set("loadfile", Value::Nil)?;
    globals.set("dofile", Value::Nil)?;

    // `require` stays, but only for plain Lua modules on the controlled
    // search path: no native libraries, no C path.
    let package: mlua::Table = globals.get("package")?;
    package.set("loadlib", Value::Nil)?;
    package.set("cpath", "")?;

    Ok(lua)
}

/// Rewrite the interpreter-visible module search path.
pub fn set_package_path(lua: &Lua, path: &str) -> mlua::Result<()> {
    let package: mlua::Table = lua.globals().get("package")?;
    package.set("path", path)
}

/// Convert a Lua value to a display string (for `print`).
pub fn lua_value_to_string(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Number(n) => {
            // No trailing zeros for integral values.
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{:.0}", n)
            } else {
                format!("{}", n)
            }
        }
        Value::String(s) => s
            .to_str()
            .map(|s| s.to_string())
            .unwrap_or_else(|_| "<invalid utf8>".to_string()),
        Value::Table(_) => "table".to_string(),
        Value::Function(_) => "function".to_string(),
        Value::Thread(_) => "thread".to_string(),
        Value::UserData(_) => "userdata".to_string(),
        Value::LightUserData(_) => "lightuserdata".to_string(),
        Value::Error(e) => format!("error: {}", e),
        _ => "<unknown>".to_string(),
    }
}

/// Format a Lua error for reporting to the controller.
pub fn format_lua_error(error: &mlua::Error) -> String {
    match error {
        mlua::Error::SyntaxError { message, .. } => {
            // Strip the "[string \"...\"]: " prefix if present.
            if let Some(idx) = message.find("]: ") {
                message[idx + 3..].to_string()
            } else {
                message.clone()
            }
        }
        mlua::Error::RuntimeError(msg) => msg.clone(),
        mlua::Error::CallbackError { cause, .. } => format_lua_error(cause),
        _ => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_bool(lua: &Lua, code: &str) -> bool {
        lua.load(code).eval::<bool>().expect("eval failed")
    }

    #[test]
    fn test_dangerous_globals_absent() {
        let lua = new_sandboxed_lua().unwrap();
        assert!(eval_bool(&lua, "return os == nil"));
        assert!(eval_bool(&lua, "return io == nil"));
        assert!(eval_bool(&lua, "return debug == nil"));
        assert!(eval_bool(&lua, "return load == nil"));
        assert!(eval_bool(&lua, "return loadfile == nil"));
        assert!(eval_bool(&lua, "return dofile == nil"));
        assert!(eval_bool(&lua, "return package.loadlib == nil"));
    }

    #[test]
    fn test_native_module_path_empty() {
        let lua = new_sandboxed_lua().unwrap();
        let cpath: String = lua.load("return package.cpath").eval().unwrap();
        assert_eq!(cpath, "");
    }

    #[test]
    fn test_allowed_libraries_present() {
        let lua = new_sandboxed_lua().unwrap();
        assert!(eval_bool(&lua, "return type(math) == 'table'"));
        assert!(eval_bool(&lua, "return type(string) == 'table'"));
        assert!(eval_bool(&lua, "return type(table) == 'table'"));
        assert!(eval_bool(&lua, "return type(coroutine) == 'table'"));
        assert!(eval_bool(&lua, "return type(utf8) == 'table'"));
        assert!(eval_bool(&lua, "return type(require) == 'function'"));
    }

    #[test]
    fn test_basic_evaluation_works() {
        let lua = new_sandboxed_lua().unwrap();
        let result: i64 = lua.load("return math.floor(3.7) + 1").eval().unwrap();
        assert_eq!(result, 4);
        let result: String = lua.load("return string.upper('abc')").eval().unwrap();
        assert_eq!(result, "ABC");
    }

    #[test]
    fn test_set_package_path_visible_to_scripts() {
        let lua = new_sandboxed_lua().unwrap();
        set_package_path(&lua, "/tmp/mods/?.lua").unwrap();
        let path: String = lua.load("return package.path").eval().unwrap();
        assert_eq!(path, "/tmp/mods/?.lua");
    }

    #[test]
    fn test_format_syntax_error_strips_chunk_prefix() {
        let lua = new_sandboxed_lua().unwrap();
        let err = lua.load("if then").eval::<Value>().unwrap_err();
        let message = format_lua_error(&err);
        assert!(!message.contains("[string"), "unstripped: {}", message);
        assert!(!message.is_empty());
    }

    #[test]
    fn test_format_unwraps_callback_cause() {
        let lua = new_sandboxed_lua().unwrap();
        let failing = lua
            .create_function(|_, ()| -> mlua::Result<()> {
                Err(mlua::Error::RuntimeError("inner message".to_string()))
            })
            .unwrap();
        lua.globals().set("boom", failing).unwrap();

        let err = lua.load("boom()").exec().unwrap_err();
        assert_eq!(format_lua_error(&err), "inner message");
    }

    #[test]
    fn test_value_to_string_formats() {
        let lua = new_sandboxed_lua().unwrap();
        let v: Value = lua.load("return 2.0").eval().unwrap();
        assert_eq!(lua_value_to_string(&v), "2");
        let v: Value = lua.load("return 2.5").eval().unwrap();
        assert_eq!(lua_value_to_string(&v), "2.5");
        let v: Value = lua.load("return nil").eval().unwrap();
        assert_eq!(lua_value_to_string(&v), "nil");
        let v: Value = lua.load("return 'x'").eval().unwrap();
        assert_eq!(lua_value_to_string(&v), "x");
        let v: Value = lua.load("return {}").eval().unwrap();
        assert_eq!(lua_value_to_string(&v), "table");
    }
}
