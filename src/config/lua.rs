use crate::errors::ConfigError;
use mlua::Lua;

use super::lua_api;

pub fn parse_lua_config(
    input: &str,
    config_dir: Option<&std::path::Path>,
) -> Result<crate::Config, ConfigError> {
    let lua = Lua::new();

    if let Some(dir_str) = config_dir.and_then(|dir| dir.to_str()) {
        let setup_code = format!("package.path = '{dir_str}/?.lua;' .. package.path");
        lua.load(&setup_code)
            .exec()
            .map_err(|e| ConfigError::LuaError(format!("Failed to set package.path: {e}")))?;
    }

    let builder = lua_api::register_api(&lua)?;

    lua.load(input)
        .set_name("config.lua")
        .exec()
        .map_err(|e| ConfigError::LuaError(e.to_string()))?;

    let config = builder.borrow().clone().finish();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::{Arg, KeyAction};
    use crate::layout::LayoutType;
    use crate::mouse::ClickTarget;
    use pretty_assertions::assert_eq;
    use x11rb::protocol::xproto::KeyButMask;

    #[test]
    fn bundled_lua_template_parses() {
        let config = parse_lua_config(include_str!("../../templates/config.lua"), None).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.tags.len(), 9);
        assert_eq!(config.keybindings.len(), crate::Config::default().keybindings.len());
        assert_eq!(config.buttons.len(), crate::Config::default().buttons.len());
        assert_eq!(config.rules.len(), 2);
    }

    #[test]
    fn setters_and_bindings() {
        let config = parse_lua_config(
            r##"
            dynwm.set_modkey("Mod4")
            dynwm.set_tags({ "web", "dev", "chat" })
            dynwm.border.set_width(3)
            dynwm.bar.set_position("bottom")
            dynwm.bar.set_scheme_selected("#eeeeee", "#005577", 0x005577)
            dynwm.layout.set_mfact(0.6)
            dynwm.layout.define("[]=", "tile")
            dynwm.layout.define("[M]", "monocle")
            dynwm.key.bind({ "Mod4", "Shift" }, "Return", dynwm.spawn("st"))
            dynwm.key.bind({ "Mod4" }, "h", dynwm.layout.adjust_mfact(-0.05))
            dynwm.key.tag_keys({ "1", "2", "3" })
            dynwm.mouse.bind("TagBar", {}, 1, dynwm.tag.view())
            dynwm.rule.add({ class = "mpv", floating = true, tags = 4 })
            dynwm.autostart("picom")
            "##,
            None,
        )
        .unwrap();

        assert_eq!(config.modkey, KeyButMask::MOD4);
        assert_eq!(config.tags, vec!["web", "dev", "chat"]);
        assert_eq!(config.border_width, 3);
        assert!(!config.top_bar);
        assert_eq!(config.scheme_selected.border, 0x005577);
        assert_eq!(config.mfact, 0.6);
        assert_eq!(config.layouts.len(), 2);
        assert_eq!(config.layouts[1].kind, LayoutType::Monocle);

        assert_eq!(config.keybindings.len(), 2 + 3 * 4);
        assert_eq!(config.keybindings[0].func, KeyAction::Spawn);
        assert_eq!(config.keybindings[0].arg, Arg::Str("st".into()));
        assert_eq!(config.keybindings[1].arg, Arg::Float(-0.05));
        assert_eq!(config.keybindings[2].modifiers, vec![KeyButMask::MOD4]);

        assert_eq!(config.buttons.len(), 1);
        assert_eq!(config.buttons[0].click, ClickTarget::TagBar);
        assert_eq!(config.buttons[0].arg, Arg::UInt(0));

        assert_eq!(config.rules[0].class.as_deref(), Some("mpv"));
        assert!(config.rules[0].is_floating);
        assert_eq!(config.rules[0].monitor, -1);
        assert_eq!(config.autostart, vec!["picom"]);
    }

    #[test]
    fn untouched_sections_keep_defaults() {
        let config = parse_lua_config("dynwm.set_terminal('alacritty')", None).unwrap();
        let defaults = crate::Config::default();
        assert_eq!(config.terminal, "alacritty");
        assert_eq!(config.keybindings.len(), defaults.keybindings.len());
        assert_eq!(config.layouts, defaults.layouts);
    }

    #[test]
    fn function_reference_instead_of_call_is_rejected() {
        let err = parse_lua_config(
            r#"dynwm.key.bind({ "Mod1" }, "q", dynwm.quit)"#,
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("forget ()"));
    }

    #[test]
    fn invalid_modifier_is_rejected() {
        let err = parse_lua_config(r#"dynwm.set_modkey("Hyper")"#, None).unwrap_err();
        assert!(matches!(err, ConfigError::LuaError(_)));
    }
}
