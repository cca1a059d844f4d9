use thiserror::Error;

pub type WmResult<T> = Result<T, WmError>;

#[derive(Debug, Error)]
pub enum WmError {
    #[error(transparent)]
    X11(#[from] X11Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum X11Error {
    #[error("{0}")]
    ConnectError(#[from] x11rb::errors::ConnectError),
    #[error("{0}")]
    ConnectionError(#[from] x11rb::errors::ConnectionError),
    #[error("{0}")]
    ReplyError(#[from] x11rb::errors::ReplyError),
    #[error("{0}")]
    ReplyOrIdError(#[from] x11rb::errors::ReplyOrIdError),
    #[error("another window manager is already running")]
    OtherWmRunning,
    #[error("failed to open X11 display")]
    DisplayOpenFailed,
    #[error("failed to load Xft font: {0}")]
    FontLoadFailed(String),
    #[error("failed to create XftDraw")]
    DrawCreateFailed,
    #[error("fatal protocol error: {request} failed with error code {error_code}")]
    Protocol { request: String, error_code: u8 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse RON config: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    #[error("Lua config error: {0}")]
    LuaError(String),
    #[error("Invalid modkey: {0}")]
    InvalidModkey(String),
    #[error("Unknown key: {0}")]
    UnknownKey(String),
    #[error("Unknown action: {0}")]
    UnknownAction(String),
    #[error("Unknown layout: {0}")]
    UnknownLayout(String),
    #[error("Unknown click target: {0}")]
    UnknownClickTarget(String),
    #[error("{command} requires {field}")]
    MissingCommandArg { command: String, field: String },
    #[error("Invalid variable name '{0}': must start with $")]
    InvalidVariableName(String),
    #[error("Invalid #DEFINE syntax: '{0}'. Expected: #DEFINE $var_name = value")]
    InvalidDefine(String),
    #[error("Undefined variable '{0}': define it with #DEFINE before use")]
    UndefinedVariable(String),
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

impl From<mlua::Error> for ConfigError {
    fn from(value: mlua::Error) -> Self {
        ConfigError::LuaError(value.to_string())
    }
}

impl From<x11rb::errors::ConnectionError> for WmError {
    fn from(value: x11rb::errors::ConnectionError) -> Self {
        Self::X11(value.into())
    }
}

impl From<x11rb::errors::ReplyError> for WmError {
    fn from(value: x11rb::errors::ReplyError) -> Self {
        Self::X11(value.into())
    }
}

impl From<x11rb::errors::ReplyOrIdError> for WmError {
    fn from(value: x11rb::errors::ReplyOrIdError) -> Self {
        Self::X11(value.into())
    }
}

impl From<x11rb::errors::ConnectError> for WmError {
    fn from(value: x11rb::errors::ConnectError) -> Self {
        Self::X11(value.into())
    }
}
