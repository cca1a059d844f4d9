mod lua;
mod lua_api;

use crate::errors::ConfigError;
use crate::keyboard::keysyms::{self, Keysym};
use crate::keyboard::{Arg, KeyAction, KeyBinding};
use crate::layout::{Layout, LayoutType};
use crate::mouse::{ButtonBinding, ClickTarget};
use crate::rules::Rule;
use crate::{ColorScheme, Config, tag_keys};
use log::info;
use ron::extensions::Extensions;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use x11rb::protocol::xproto::KeyButMask;

pub use lua::parse_lua_config;

#[derive(Debug, Clone, Copy, Deserialize)]
pub enum ModKey {
    Mod,
    Mod1,
    Mod2,
    Mod3,
    Mod4,
    Mod5,
    Shift,
    Control,
}

impl ModKey {
    fn to_keybut_mask(self, modkey: KeyButMask) -> KeyButMask {
        match self {
            ModKey::Mod => modkey,
            ModKey::Mod1 => KeyButMask::MOD1,
            ModKey::Mod2 => KeyButMask::MOD2,
            ModKey::Mod3 => KeyButMask::MOD3,
            ModKey::Mod4 => KeyButMask::MOD4,
            ModKey::Mod5 => KeyButMask::MOD5,
            ModKey::Shift => KeyButMask::SHIFT,
            ModKey::Control => KeyButMask::CONTROL,
        }
    }
}

pub(crate) fn parse_modkey_string(s: &str) -> Result<KeyButMask, ConfigError> {
    match s {
        "Mod1" => Ok(KeyButMask::MOD1),
        "Mod2" => Ok(KeyButMask::MOD2),
        "Mod3" => Ok(KeyButMask::MOD3),
        "Mod4" => Ok(KeyButMask::MOD4),
        "Mod5" => Ok(KeyButMask::MOD5),
        "Shift" => Ok(KeyButMask::SHIFT),
        "Control" => Ok(KeyButMask::CONTROL),
        _ => Err(ConfigError::InvalidModkey(format!(
            "'{s}' is not a valid modifier. Use one of: Mod1-Mod5, Shift, Control"
        ))),
    }
}

pub(crate) fn parse_keysym(key: &str) -> Result<Keysym, ConfigError> {
    keysyms::keysym_from_str(key).ok_or_else(|| ConfigError::UnknownKey(key.to_string()))
}

pub(crate) fn parse_color(s: &str) -> Result<u32, ConfigError> {
    let digits = s
        .strip_prefix('#')
        .or_else(|| s.strip_prefix("0x"))
        .unwrap_or(s);
    u32::from_str_radix(digits, 16)
        .map_err(|e| ConfigError::ValidationError(format!("invalid color '{s}': {e}")))
}

/// `$XDG_CONFIG_HOME/dynwm`.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dynwm"))
}

/// The Lua file wins over the RON file when both exist.
pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
    ["config.lua", "config.ron"]
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let input = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ValidationError(format!("failed to read {path:?}: {e}")))?;

    let is_lua = path.extension().and_then(|ext| ext.to_str()) == Some("lua");
    let config = if is_lua {
        parse_lua_config(&input, path.parent())?
    } else {
        parse_config(&input)?
    };
    config.validate()?;
    Ok(config)
}

/// Loads the user configuration, falling back to the built-in defaults when
/// no file exists.
pub fn load() -> Result<Config, ConfigError> {
    match config_dir().as_deref().and_then(find_config_file) {
        Some(path) => {
            info!("loading configuration from {path:?}");
            load_config_file(&path)
        }
        None => {
            info!("no configuration file found, using defaults");
            Ok(Config::default())
        }
    }
}

fn preprocess_variables(input: &str) -> Result<String, ConfigError> {
    let mut variables: HashMap<String, String> = HashMap::new();
    let mut result = String::new();

    for line in input.lines() {
        let trimmed = line.trim();

        if let Some(rest) = trimmed.strip_prefix("#DEFINE") {
            let Some((var_name, value)) = rest.split_once('=') else {
                return Err(ConfigError::InvalidDefine(trimmed.to_string()));
            };
            let var_name = var_name.trim();
            let value = value.trim().trim_end_matches(',');

            if !var_name.starts_with('$') || var_name.len() < 2 {
                return Err(ConfigError::InvalidVariableName(var_name.to_string()));
            }

            variables.insert(var_name.to_string(), value.to_string());
            result.push('\n');
        } else {
            // longest names first so $mod does not clobber $modkey
            let mut names: Vec<&String> = variables.keys().collect();
            names.sort_by_key(|name| std::cmp::Reverse(name.len()));
            let mut processed_line = line.to_string();
            for name in names {
                processed_line = processed_line.replace(name.as_str(), &variables[name]);
            }
            if let Some(undefined) = unquoted_variable(&processed_line) {
                return Err(ConfigError::UndefinedVariable(undefined));
            }
            result.push_str(&processed_line);
            result.push('\n');
        }
    }

    Ok(result)
}

/// First `$name` outside a string literal.
fn unquoted_variable(line: &str) -> Option<String> {
    let mut in_string = false;
    let mut escaped = false;
    for (index, ch) in line.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '/' if !in_string && line[index..].starts_with("//") => return None,
            '$' if !in_string => {
                let name: String = line[index + 1..]
                    .chars()
                    .take_while(|c| c.is_alphanumeric() || *c == '_')
                    .collect();
                return Some(format!("${name}"));
            }
            _ => {}
        }
    }
    None
}

pub fn parse_config(input: &str) -> Result<Config, ConfigError> {
    let preprocessed = preprocess_variables(input)?;
    let options = ron::Options::default().with_default_extension(Extensions::IMPLICIT_SOME);
    let config_data: ConfigData = options.from_str(&preprocessed)?;
    config_data_to_config(config_data)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigData {
    #[serde(default)]
    border_width: Option<i32>,
    #[serde(default)]
    snap: Option<i32>,
    #[serde(default)]
    font: Option<String>,
    #[serde(default)]
    show_bar: Option<bool>,
    #[serde(default)]
    top_bar: Option<bool>,
    #[serde(default)]
    mfact: Option<f32>,
    #[serde(default)]
    nmaster: Option<i32>,
    #[serde(default)]
    resize_hints: Option<bool>,
    #[serde(default)]
    lock_fullscreen: Option<bool>,

    #[serde(default)]
    terminal: Option<String>,
    #[serde(default)]
    modkey: Option<ModKey>,

    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    layouts: Option<Vec<LayoutData>>,
    #[serde(default)]
    rules: Option<Vec<Rule>>,
    #[serde(default)]
    keybindings: Option<Vec<KeybindingData>>,
    /// One key per tag, expanded to view/toggleview/tag/toggletag.
    #[serde(default)]
    tag_keys: Option<Vec<String>>,
    #[serde(default)]
    buttons: Option<Vec<ButtonData>>,

    #[serde(default)]
    scheme_normal: Option<ColorSchemeData>,
    #[serde(default)]
    scheme_selected: Option<ColorSchemeData>,

    #[serde(default)]
    autostart: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LayoutData {
    symbol: String,
    kind: String,
}

#[derive(Debug, Deserialize)]
struct KeybindingData {
    modifiers: Vec<ModKey>,
    key: String,
    action: KeyAction,
    #[serde(default)]
    arg: ArgData,
}

#[derive(Debug, Deserialize)]
struct ButtonData {
    click: ClickTarget,
    #[serde(default)]
    modifiers: Vec<ModKey>,
    button: u8,
    action: KeyAction,
    #[serde(default)]
    arg: ArgData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum ArgData {
    #[default]
    None,
    String(String),
    Int(i64),
    Float(f32),
    Array(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct ColorSchemeData {
    foreground: String,
    background: String,
    border: String,
}

impl ColorSchemeData {
    fn to_scheme(&self) -> Result<ColorScheme, ConfigError> {
        Ok(ColorScheme {
            foreground: parse_color(&self.foreground)?,
            background: parse_color(&self.background)?,
            border: parse_color(&self.border)?,
        })
    }
}

fn config_data_to_config(data: ConfigData) -> Result<Config, ConfigError> {
    let mut config = Config::default();
    let modkey = data
        .modkey
        .map(|key| key.to_keybut_mask(config.modkey))
        .unwrap_or(config.modkey);
    config.modkey = modkey;

    macro_rules! take {
        ($($field:ident),*) => {
            $(if let Some(value) = data.$field {
                config.$field = value;
            })*
        };
    }
    take!(border_width, snap, font, show_bar, top_bar, mfact, nmaster, resize_hints);
    take!(lock_fullscreen, terminal, tags, rules);

    if let Some(layouts) = data.layouts {
        config.layouts = layouts
            .into_iter()
            .map(|layout| {
                let kind = LayoutType::from_str(&layout.kind)
                    .map_err(|_| ConfigError::UnknownLayout(layout.kind.clone()))?;
                Ok(Layout::new(&layout.symbol, kind))
            })
            .collect::<Result<_, ConfigError>>()?;
    }

    if data.keybindings.is_some() || data.tag_keys.is_some() {
        let mut keybindings = Vec::new();
        for kb_data in data.keybindings.unwrap_or_default() {
            let modifiers = kb_data
                .modifiers
                .iter()
                .map(|m| m.to_keybut_mask(modkey))
                .collect();
            keybindings.push(KeyBinding::new(
                modifiers,
                parse_keysym(&kb_data.key)?,
                kb_data.action,
                arg_data_to_arg(kb_data.arg),
            ));
        }
        for (tag, key) in data.tag_keys.unwrap_or_default().iter().enumerate() {
            keybindings.extend(tag_keys(modkey, parse_keysym(key)?, tag));
        }
        config.keybindings = keybindings;
    }

    config.buttons = match data.buttons {
        Some(buttons) => buttons
            .into_iter()
            .map(|button| {
                ButtonBinding::new(
                    button.click,
                    button
                        .modifiers
                        .iter()
                        .map(|m| m.to_keybut_mask(modkey))
                        .collect(),
                    button.button,
                    button.action,
                    arg_data_to_arg(button.arg),
                )
            })
            .collect(),
        None => crate::default_buttons(modkey, &config.terminal),
    };

    if let Some(scheme) = data.scheme_normal {
        config.scheme_normal = scheme.to_scheme()?;
    }
    if let Some(scheme) = data.scheme_selected {
        config.scheme_selected = scheme.to_scheme()?;
    }
    config.autostart = data.autostart;

    Ok(config)
}

fn arg_data_to_arg(data: ArgData) -> Arg {
    match data {
        ArgData::None => Arg::None,
        ArgData::String(s) => Arg::Str(s),
        ArgData::Int(n) if n > i32::MAX as i64 => Arg::UInt(n as u32),
        ArgData::Int(n) => Arg::Int(n as i32),
        ArgData::Float(f) => Arg::Float(f),
        ArgData::Array(arr) => Arg::Array(arr),
    }
}
