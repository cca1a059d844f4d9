use mlua::{Lua, Table, Value};
use std::cell::RefCell;
use std::rc::Rc;

use super::{parse_color, parse_keysym, parse_modkey_string};
use crate::errors::ConfigError;
use crate::keyboard::{Arg, KeyAction, KeyBinding};
use crate::layout::{Layout, LayoutType};
use crate::mouse::{ButtonBinding, ClickTarget};
use crate::rules::Rule;
use crate::{ColorScheme, Config, default_buttons, tag_keys};
use x11rb::protocol::xproto::KeyButMask;

/// Accumulates what a Lua config sets. Lists the script never touches keep
/// their defaults; the first entry added to a list replaces them.
#[derive(Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
    keybindings: Option<Vec<KeyBinding>>,
    buttons: Option<Vec<ButtonBinding>>,
    rules: Option<Vec<Rule>>,
    layouts: Option<Vec<Layout>>,
}

impl ConfigBuilder {
    pub fn finish(self) -> Config {
        let mut config = self.config;
        if let Some(keybindings) = self.keybindings {
            config.keybindings = keybindings;
        }
        config.buttons = self
            .buttons
            .unwrap_or_else(|| default_buttons(config.modkey, &config.terminal));
        if let Some(rules) = self.rules {
            config.rules = rules;
        }
        if let Some(layouts) = self.layouts {
            config.layouts = layouts;
        }
        config
    }
}

type SharedBuilder = Rc<RefCell<ConfigBuilder>>;

pub fn register_api(lua: &Lua) -> Result<SharedBuilder, ConfigError> {
    let builder = Rc::new(RefCell::new(ConfigBuilder::default()));

    let dynwm_table = lua.create_table()?;

    register_spawn(lua, &dynwm_table)?;
    register_key_module(lua, &dynwm_table, builder.clone())?;
    register_mouse_module(lua, &dynwm_table, builder.clone())?;
    register_border_module(lua, &dynwm_table, builder.clone())?;
    register_bar_module(lua, &dynwm_table, builder.clone())?;
    register_layout_module(lua, &dynwm_table, builder.clone())?;
    register_client_module(lua, &dynwm_table)?;
    register_tag_module(lua, &dynwm_table)?;
    register_monitor_module(lua, &dynwm_table)?;
    register_rule_module(lua, &dynwm_table, builder.clone())?;
    register_misc(lua, &dynwm_table, builder.clone())?;

    lua.globals().set("dynwm", dynwm_table)?;

    Ok(builder)
}

fn register_spawn(lua: &Lua, parent: &Table) -> Result<(), ConfigError> {
    let spawn = lua.create_function(|lua, cmd: Value| create_action_table(lua, "Spawn", cmd))?;
    parent.set("spawn", spawn)?;
    Ok(())
}

fn register_key_module(lua: &Lua, parent: &Table, builder: SharedBuilder) -> Result<(), ConfigError> {
    let key_table = lua.create_table()?;

    let builder_clone = builder.clone();
    let bind = lua.create_function(move |_, (mods, key, action): (Value, String, Value)| {
        let modifiers = parse_modifiers_value(mods, "dynwm.key.bind")?;
        let keysym = parse_keysym(&key).map_err(lua_error)?;
        let (key_action, arg) = parse_action_value(action)?;

        builder_clone
            .borrow_mut()
            .keybindings
            .get_or_insert_with(Vec::new)
            .push(KeyBinding::new(modifiers, keysym, key_action, arg));
        Ok(())
    })?;

    let builder_clone = builder.clone();
    let bind_tags = lua.create_function(move |_, keys: Vec<String>| {
        let mut builder = builder_clone.borrow_mut();
        let modkey = builder.config.modkey;
        let mut bindings = Vec::new();
        for (tag, key) in keys.iter().enumerate() {
            bindings.extend(tag_keys(modkey, parse_keysym(key).map_err(lua_error)?, tag));
        }
        builder
            .keybindings
            .get_or_insert_with(Vec::new)
            .extend(bindings);
        Ok(())
    })?;

    key_table.set("bind", bind)?;
    key_table.set("tag_keys", bind_tags)?;
    parent.set("key", key_table)?;
    Ok(())
}

fn register_mouse_module(lua: &Lua, parent: &Table, builder: SharedBuilder) -> Result<(), ConfigError> {
    let mouse_table = lua.create_table()?;

    let bind = lua.create_function(
        move |_, (click, mods, button, action): (String, Value, u8, Value)| {
            let click = ClickTarget::from_name(&click)
                .ok_or_else(|| lua_error(ConfigError::UnknownClickTarget(click.clone())))?;
            let modifiers = parse_modifiers_value(mods, "dynwm.mouse.bind")?;
            let (func, arg) = parse_action_value(action)?;

            builder
                .borrow_mut()
                .buttons
                .get_or_insert_with(Vec::new)
                .push(ButtonBinding::new(click, modifiers, button, func, arg));
            Ok(())
        },
    )?;

    mouse_table.set("bind", bind)?;
    parent.set("mouse", mouse_table)?;
    Ok(())
}

fn register_border_module(lua: &Lua, parent: &Table, builder: SharedBuilder) -> Result<(), ConfigError> {
    let border_table = lua.create_table()?;

    let builder_clone = builder.clone();
    let set_width = lua.create_function(move |_, width: i32| {
        builder_clone.borrow_mut().config.border_width = width;
        Ok(())
    })?;

    let builder_clone = builder.clone();
    let set_snap = lua.create_function(move |_, snap: i32| {
        builder_clone.borrow_mut().config.snap = snap;
        Ok(())
    })?;

    border_table.set("set_width", set_width)?;
    border_table.set("set_snap", set_snap)?;
    parent.set("border", border_table)?;
    Ok(())
}

fn register_bar_module(lua: &Lua, parent: &Table, builder: SharedBuilder) -> Result<(), ConfigError> {
    let bar_table = lua.create_table()?;

    let builder_clone = builder.clone();
    let set_font = lua.create_function(move |_, font: String| {
        builder_clone.borrow_mut().config.font = font;
        Ok(())
    })?;

    let builder_clone = builder.clone();
    let set_visible = lua.create_function(move |_, visible: bool| {
        builder_clone.borrow_mut().config.show_bar = visible;
        Ok(())
    })?;

    let builder_clone = builder.clone();
    let set_position = lua.create_function(move |_, position: String| {
        let top_bar = match position.as_str() {
            "top" => true,
            "bottom" => false,
            _ => {
                return Err(mlua::Error::RuntimeError(format!(
                    "dynwm.bar.set_position: expected \"top\" or \"bottom\", got '{position}'"
                )));
            }
        };
        builder_clone.borrow_mut().config.top_bar = top_bar;
        Ok(())
    })?;

    let builder_clone = builder.clone();
    let set_scheme_normal = lua.create_function(move |_, (fg, bg, border): (Value, Value, Value)| {
        builder_clone.borrow_mut().config.scheme_normal = parse_scheme(fg, bg, border)?;
        Ok(())
    })?;

    let builder_clone = builder.clone();
    let set_scheme_selected =
        lua.create_function(move |_, (fg, bg, border): (Value, Value, Value)| {
            builder_clone.borrow_mut().config.scheme_selected = parse_scheme(fg, bg, border)?;
            Ok(())
        })?;

    let toggle = lua.create_function(|lua, ()| create_action_table(lua, "ToggleBar", Value::Nil))?;

    bar_table.set("set_font", set_font)?;
    bar_table.set("set_visible", set_visible)?;
    bar_table.set("set_position", set_position)?;
    bar_table.set("set_scheme_normal", set_scheme_normal)?;
    bar_table.set("set_scheme_selected", set_scheme_selected)?;
    bar_table.set("toggle", toggle)?;
    parent.set("bar", bar_table)?;
    Ok(())
}

fn register_layout_module(lua: &Lua, parent: &Table, builder: SharedBuilder) -> Result<(), ConfigError> {
    let layout_table = lua.create_table()?;

    let builder_clone = builder.clone();
    let set_mfact = lua.create_function(move |_, mfact: f32| {
        builder_clone.borrow_mut().config.mfact = mfact;
        Ok(())
    })?;

    let builder_clone = builder.clone();
    let set_nmaster = lua.create_function(move |_, nmaster: i32| {
        builder_clone.borrow_mut().config.nmaster = nmaster;
        Ok(())
    })?;

    let builder_clone = builder.clone();
    let set_resize_hints = lua.create_function(move |_, respect: bool| {
        builder_clone.borrow_mut().config.resize_hints = respect;
        Ok(())
    })?;

    let builder_clone = builder.clone();
    let set_lock_fullscreen = lua.create_function(move |_, lock: bool| {
        builder_clone.borrow_mut().config.lock_fullscreen = lock;
        Ok(())
    })?;

    let builder_clone = builder.clone();
    let define = lua.create_function(move |_, (symbol, kind): (String, String)| {
        let kind = LayoutType::from_str(&kind)
            .map_err(|_| lua_error(ConfigError::UnknownLayout(kind.clone())))?;
        builder_clone
            .borrow_mut()
            .layouts
            .get_or_insert_with(Vec::new)
            .push(Layout::new(&symbol, kind));
        Ok(())
    })?;

    let set = lua.create_function(|lua, index: Option<i64>| {
        let arg = index.map(Value::Integer).unwrap_or(Value::Nil);
        create_action_table(lua, "SetLayout", arg)
    })?;

    let toggle = lua.create_function(|lua, ()| create_action_table(lua, "SetLayout", Value::Nil))?;

    let adjust_mfact = lua.create_function(|lua, delta: f64| {
        create_action_table(lua, "SetMFact", Value::Number(delta))
    })?;

    let inc_nmaster = lua.create_function(|lua, delta: i64| {
        create_action_table(lua, "IncNMaster", Value::Integer(delta))
    })?;

    layout_table.set("set_mfact", set_mfact)?;
    layout_table.set("set_nmaster", set_nmaster)?;
    layout_table.set("set_resize_hints", set_resize_hints)?;
    layout_table.set("set_lock_fullscreen", set_lock_fullscreen)?;
    layout_table.set("define", define)?;
    layout_table.set("set", set)?;
    layout_table.set("toggle", toggle)?;
    layout_table.set("adjust_mfact", adjust_mfact)?;
    layout_table.set("inc_nmaster", inc_nmaster)?;
    parent.set("layout", layout_table)?;
    Ok(())
}

fn register_client_module(lua: &Lua, parent: &Table) -> Result<(), ConfigError> {
    let client_table = lua.create_table()?;

    for (name, action) in [
        ("kill", "KillClient"),
        ("toggle_fullscreen", "ToggleFullScreen"),
        ("toggle_floating", "ToggleFloating"),
        ("zoom", "Zoom"),
        ("move_mouse", "MoveMouse"),
        ("resize_mouse", "ResizeMouse"),
    ] {
        let function =
            lua.create_function(move |lua, ()| create_action_table(lua, action, Value::Nil))?;
        client_table.set(name, function)?;
    }

    let focus_stack = lua.create_function(|lua, dir: i64| {
        create_action_table(lua, "FocusStack", Value::Integer(dir))
    })?;
    client_table.set("focus_stack", focus_stack)?;

    parent.set("client", client_table)?;
    Ok(())
}

fn register_tag_module(lua: &Lua, parent: &Table) -> Result<(), ConfigError> {
    let tag_table = lua.create_table()?;

    // tag indices are zero based; no index means "previous" for view and
    // "the clicked tag" in tag bar bindings
    for (name, action) in [
        ("view", "View"),
        ("toggle_view", "ToggleView"),
        ("move_to", "Tag"),
        ("toggle", "ToggleTag"),
    ] {
        let function = lua.create_function(move |lua, index: Option<u32>| {
            let mask = match index {
                Some(index) if index < crate::MAX_TAGS as u32 => 1i64 << index,
                Some(index) => {
                    return Err(mlua::Error::RuntimeError(format!(
                        "dynwm.tag.{name}: tag index {index} is out of range"
                    )));
                }
                None => 0,
            };
            create_action_table(lua, action, Value::Integer(mask))
        })?;
        tag_table.set(name, function)?;
    }

    let view_all = lua.create_function(|lua, ()| {
        create_action_table(lua, "View", Value::Integer(u32::MAX as i64))
    })?;
    let move_to_all = lua.create_function(|lua, ()| {
        create_action_table(lua, "Tag", Value::Integer(u32::MAX as i64))
    })?;

    tag_table.set("view_all", view_all)?;
    tag_table.set("move_to_all", move_to_all)?;
    parent.set("tag", tag_table)?;
    Ok(())
}

fn register_monitor_module(lua: &Lua, parent: &Table) -> Result<(), ConfigError> {
    let monitor_table = lua.create_table()?;

    let focus = lua.create_function(|lua, dir: i64| {
        create_action_table(lua, "FocusMonitor", Value::Integer(dir))
    })?;
    let tag = lua.create_function(|lua, dir: i64| {
        create_action_table(lua, "TagMonitor", Value::Integer(dir))
    })?;

    monitor_table.set("focus", focus)?;
    monitor_table.set("tag", tag)?;
    parent.set("monitor", monitor_table)?;
    Ok(())
}

fn register_rule_module(lua: &Lua, parent: &Table, builder: SharedBuilder) -> Result<(), ConfigError> {
    let rule_table = lua.create_table()?;

    let add = lua.create_function(move |_, spec: Table| {
        let rule = Rule {
            class: spec.get::<Option<String>>("class")?,
            instance: spec.get::<Option<String>>("instance")?,
            title: spec.get::<Option<String>>("title")?,
            tags: spec.get::<Option<u32>>("tags")?.unwrap_or(0),
            is_floating: spec.get::<Option<bool>>("floating")?.unwrap_or(false),
            monitor: spec.get::<Option<i32>>("monitor")?.unwrap_or(-1),
        };
        builder
            .borrow_mut()
            .rules
            .get_or_insert_with(Vec::new)
            .push(rule);
        Ok(())
    })?;

    rule_table.set("add", add)?;
    parent.set("rule", rule_table)?;
    Ok(())
}

fn register_misc(lua: &Lua, parent: &Table, builder: SharedBuilder) -> Result<(), ConfigError> {
    let builder_clone = builder.clone();
    let set_terminal = lua.create_function(move |_, term: String| {
        builder_clone.borrow_mut().config.terminal = term;
        Ok(())
    })?;

    let builder_clone = builder.clone();
    let set_modkey = lua.create_function(move |_, modkey_str: String| {
        let modkey = parse_modkey_string(&modkey_str).map_err(lua_error)?;
        builder_clone.borrow_mut().config.modkey = modkey;
        Ok(())
    })?;

    let builder_clone = builder.clone();
    let set_tags = lua.create_function(move |_, tags: Vec<String>| {
        builder_clone.borrow_mut().config.tags = tags;
        Ok(())
    })?;

    let builder_clone = builder.clone();
    let autostart = lua.create_function(move |_, cmd: String| {
        builder_clone.borrow_mut().config.autostart.push(cmd);
        Ok(())
    })?;

    let quit = lua.create_function(|lua, ()| create_action_table(lua, "Quit", Value::Nil))?;
    let restart = lua.create_function(|lua, ()| create_action_table(lua, "Restart", Value::Nil))?;

    parent.set("set_terminal", set_terminal)?;
    parent.set("set_modkey", set_modkey)?;
    parent.set("set_tags", set_tags)?;
    parent.set("autostart", autostart)?;
    parent.set("quit", quit)?;
    parent.set("restart", restart)?;
    Ok(())
}

fn lua_error(error: ConfigError) -> mlua::Error {
    mlua::Error::RuntimeError(error.to_string())
}

fn parse_modifiers_value(value: Value, caller: &str) -> mlua::Result<Vec<KeyButMask>> {
    match value {
        Value::Table(t) => {
            let mut mods = Vec::new();
            for i in 1..=t.len()? {
                let mod_str: String = t.get(i)?;
                mods.push(parse_modkey_string(&mod_str).map_err(lua_error)?);
            }
            Ok(mods)
        }
        Value::String(s) => {
            let mask = parse_modkey_string(&s.to_str()?).map_err(lua_error)?;
            Ok(vec![mask])
        }
        Value::Nil => Ok(Vec::new()),
        _ => Err(mlua::Error::RuntimeError(format!(
            "{caller}: modifiers must be a table like {{\"Mod1\"}} or {{\"Mod1\", \"Shift\"}}"
        ))),
    }
}

fn parse_action_value(value: Value) -> mlua::Result<(KeyAction, Arg)> {
    let not_an_action = || {
        mlua::Error::RuntimeError(
            "action must be a table returned by dynwm functions like dynwm.spawn(), dynwm.client.kill(), dynwm.quit()".into(),
        )
    };

    match value {
        Value::Function(_) => Err(mlua::Error::RuntimeError(
            "action must be a function call, not a function reference. did you forget ()? example: dynwm.quit() not dynwm.quit".into(),
        )),
        Value::Table(t) => {
            let action_name = t.get::<String>("__action").map_err(|_| not_an_action())?;
            let action = KeyAction::from_name(&action_name)
                .ok_or_else(|| lua_error(ConfigError::UnknownAction(action_name.clone())))?;
            let arg = value_to_arg(t.get::<Value>("__arg")?)?;
            let arg = match (action, arg) {
                (
                    KeyAction::View | KeyAction::ToggleView | KeyAction::Tag | KeyAction::ToggleTag,
                    Arg::Int(mask),
                ) => Arg::UInt(mask as u32),
                (_, arg) => arg,
            };
            Ok((action, arg))
        }
        _ => Err(not_an_action()),
    }
}

fn value_to_arg(value: Value) -> mlua::Result<Arg> {
    match value {
        Value::Nil => Ok(Arg::None),
        Value::String(s) => Ok(Arg::Str(s.to_str()?.to_string())),
        Value::Integer(i) if i > i32::MAX as i64 => Ok(Arg::UInt(i as u32)),
        Value::Integer(i) => Ok(Arg::Int(i as i32)),
        Value::Number(n) => Ok(Arg::Float(n as f32)),
        Value::Table(t) => {
            let mut arr = Vec::new();
            for i in 1..=t.len()? {
                let item: String = t.get(i)?;
                arr.push(item);
            }
            Ok(Arg::Array(arr))
        }
        _ => Ok(Arg::None),
    }
}

fn create_action_table(lua: &Lua, action_name: &str, arg: Value) -> mlua::Result<Table> {
    let table = lua.create_table()?;
    table.set("__action", action_name)?;
    table.set("__arg", arg)?;
    Ok(table)
}

fn parse_color_value(value: Value) -> mlua::Result<u32> {
    match value {
        Value::Integer(i) => Ok(i as u32),
        Value::Number(n) => Ok(n as u32),
        Value::String(s) => parse_color(&s.to_str()?).map_err(lua_error),
        _ => Err(mlua::Error::RuntimeError(
            "color must be a number (0xff0000) or string ('#ff0000' or '0xff0000')".into(),
        )),
    }
}

fn parse_scheme(fg: Value, bg: Value, border: Value) -> mlua::Result<ColorScheme> {
    Ok(ColorScheme {
        foreground: parse_color_value(fg)?,
        background: parse_color_value(bg)?,
        border: parse_color_value(border)?,
    })
}
