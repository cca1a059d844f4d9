pub type Keysym = u32;
pub const XK_ESCAPE: Keysym = 0xff1b;
pub const XK_RETURN: Keysym = 0xff0d;
pub const XK_SPACE: Keysym = 0x0020;
pub const XK_TAB: Keysym = 0xff09;
pub const XK_BACKSPACE: Keysym = 0xff08;
pub const XK_DELETE: Keysym = 0xffff;
pub const XK_F1: Keysym = 0xffbe;
pub const XK_F2: Keysym = 0xffbf;
pub const XK_F3: Keysym = 0xffc0;
pub const XK_F4: Keysym = 0xffc1;
pub const XK_F5: Keysym = 0xffc2;
pub const XK_F6: Keysym = 0xffc3;
pub const XK_F7: Keysym = 0xffc4;
pub const XK_F8: Keysym = 0xffc5;
pub const XK_F9: Keysym = 0xffc6;
pub const XK_F10: Keysym = 0xffc7;
pub const XK_F11: Keysym = 0xffc8;
pub const XK_F12: Keysym = 0xffc9;
pub const XK_A: Keysym = 0x0061;
pub const XK_B: Keysym = 0x0062;
pub const XK_C: Keysym = 0x0063;
pub const XK_D: Keysym = 0x0064;
pub const XK_E: Keysym = 0x0065;
pub const XK_F: Keysym = 0x0066;
pub const XK_G: Keysym = 0x0067;
pub const XK_H: Keysym = 0x0068;
pub const XK_I: Keysym = 0x0069;
pub const XK_J: Keysym = 0x006a;
pub const XK_K: Keysym = 0x006b;
pub const XK_L: Keysym = 0x006c;
pub const XK_M: Keysym = 0x006d;
pub const XK_N: Keysym = 0x006e;
pub const XK_O: Keysym = 0x006f;
pub const XK_P: Keysym = 0x0070;
pub const XK_Q: Keysym = 0x0071;
pub const XK_R: Keysym = 0x0072;
pub const XK_S: Keysym = 0x0073;
pub const XK_T: Keysym = 0x0074;
pub const XK_U: Keysym = 0x0075;
pub const XK_V: Keysym = 0x0076;
pub const XK_W: Keysym = 0x0077;
pub const XK_X: Keysym = 0x0078;
pub const XK_Y: Keysym = 0x0079;
pub const XK_Z: Keysym = 0x007a;
pub const XK_0: Keysym = 0x0030;
pub const XK_1: Keysym = 0x0031;
pub const XK_2: Keysym = 0x0032;
pub const XK_3: Keysym = 0x0033;
pub const XK_4: Keysym = 0x0034;
pub const XK_5: Keysym = 0x0035;
pub const XK_6: Keysym = 0x0036;
pub const XK_7: Keysym = 0x0037;
pub const XK_8: Keysym = 0x0038;
pub const XK_9: Keysym = 0x0039;
pub const XK_LEFT: Keysym = 0xff51;
pub const XK_UP: Keysym = 0xff52;
pub const XK_RIGHT: Keysym = 0xff53;
pub const XK_DOWN: Keysym = 0xff54;
pub const XK_HOME: Keysym = 0xff50;
pub const XK_END: Keysym = 0xff57;
pub const XK_PAGE_UP: Keysym = 0xff55;
pub const XK_PAGE_DOWN: Keysym = 0xff56;
pub const XK_INSERT: Keysym = 0xff63;
pub const XK_MINUS: Keysym = 0x002d;
pub const XK_EQUAL: Keysym = 0x003d;
pub const XK_LEFT_BRACKET: Keysym = 0x005b;
pub const XK_RIGHT_BRACKET: Keysym = 0x005d;
pub const XK_SEMICOLON: Keysym = 0x003b;
pub const XK_APOSTROPHE: Keysym = 0x0027;
pub const XK_GRAVE: Keysym = 0x0060;
pub const XK_BACKSLASH: Keysym = 0x005c;
pub const XK_COMMA: Keysym = 0x002c;
pub const XK_PERIOD: Keysym = 0x002e;
pub const XK_SLASH: Keysym = 0x002f;
pub const XK_PRINT: Keysym = 0xff61;
pub const XK_NUM_LOCK: Keysym = 0xff7f;

pub const XF86_AUDIO_RAISE_VOLUME: Keysym = 0x1008ff13;
pub const XF86_AUDIO_LOWER_VOLUME: Keysym = 0x1008ff11;
pub const XF86_AUDIO_MUTE: Keysym = 0x1008ff12;
pub const XF86_MON_BRIGHTNESS_UP: Keysym = 0x1008ff02;
pub const XF86_MON_BRIGHTNESS_DOWN: Keysym = 0x1008ff03;

/// Resolves the X keysym name used in configuration files.
pub fn keysym_from_str(name: &str) -> Option<Keysym> {
    let keysym = match name {
        "Return" => XK_RETURN,
        "Escape" => XK_ESCAPE,
        "space" | "Space" => XK_SPACE,
        "Tab" => XK_TAB,
        "BackSpace" | "Backspace" => XK_BACKSPACE,
        "Delete" => XK_DELETE,
        "Left" => XK_LEFT,
        "Right" => XK_RIGHT,
        "Up" => XK_UP,
        "Down" => XK_DOWN,
        "Home" => XK_HOME,
        "End" => XK_END,
        "Prior" | "PageUp" => XK_PAGE_UP,
        "Next" | "PageDown" => XK_PAGE_DOWN,
        "Insert" => XK_INSERT,
        "Print" => XK_PRINT,
        "minus" => XK_MINUS,
        "equal" => XK_EQUAL,
        "bracketleft" => XK_LEFT_BRACKET,
        "bracketright" => XK_RIGHT_BRACKET,
        "semicolon" => XK_SEMICOLON,
        "apostrophe" => XK_APOSTROPHE,
        "grave" => XK_GRAVE,
        "backslash" => XK_BACKSLASH,
        "comma" => XK_COMMA,
        "period" => XK_PERIOD,
        "slash" => XK_SLASH,
        "XF86AudioRaiseVolume" => XF86_AUDIO_RAISE_VOLUME,
        "XF86AudioLowerVolume" => XF86_AUDIO_LOWER_VOLUME,
        "XF86AudioMute" => XF86_AUDIO_MUTE,
        "XF86MonBrightnessUp" => XF86_MON_BRIGHTNESS_UP,
        "XF86MonBrightnessDown" => XF86_MON_BRIGHTNESS_DOWN,
        _ => return single_character(name).or_else(|| function_key(name)),
    };
    Some(keysym)
}

fn single_character(name: &str) -> Option<Keysym> {
    let mut chars = name.chars();
    let ch = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    match ch {
        'a'..='z' | '0'..='9' => Some(ch as Keysym),
        'A'..='Z' => Some(ch.to_ascii_lowercase() as Keysym),
        _ => None,
    }
}

fn function_key(name: &str) -> Option<Keysym> {
    let number: u32 = name.strip_prefix('F')?.parse().ok()?;
    (1..=12).contains(&number).then(|| XK_F1 + number - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_map_to_lowercase_keysyms() {
        assert_eq!(keysym_from_str("j"), Some(XK_J));
        assert_eq!(keysym_from_str("J"), Some(XK_J));
        assert_eq!(keysym_from_str("7"), Some(XK_7));
    }

    #[test]
    fn named_and_function_keys() {
        assert_eq!(keysym_from_str("Return"), Some(XK_RETURN));
        assert_eq!(keysym_from_str("comma"), Some(XK_COMMA));
        assert_eq!(keysym_from_str("F12"), Some(XK_F12));
        assert_eq!(keysym_from_str("F13"), None);
        assert_eq!(keysym_from_str("Hyper"), None);
    }
}
