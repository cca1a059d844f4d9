pub mod handlers;
pub mod keysyms;

pub use handlers::{Arg, KeyAction, KeyBinding, clean_mask, matching_bindings};
