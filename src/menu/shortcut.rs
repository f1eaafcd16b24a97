use std::{fmt, ops, str::FromStr};

use thiserror::Error;

/// Keyboard modifier mask attached to a menu shortcut.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Modifiers(u32);

impl Modifiers {
    pub const NONE: Self = Self(0);
    pub const CMD: Self = Self(1 << 0);
    pub const CTRL: Self = Self(1 << 1);
    pub const CMD_OR_CTRL: Self = Self(1 << 2);
    pub const ALT_OR_OPTION: Self = Self(1 << 3);
    pub const FUNCTION: Self = Self(1 << 4);
    pub const SHIFT: Self = Self(1 << 5);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Looks up a single modifier token. Matching is ASCII case-insensitive.
    pub fn from_token(token: &str) -> Option<Self> {
        // `ctrl` shares the `cmd` flag; existing menus rely on that aliasing.
        let m = match token.to_ascii_lowercase().as_str() {
            "cmd" => Self::CMD,
            "ctrl" => Self::CMD,
            "cmdctrl" => Self::CMD_OR_CTRL,
            "alt" | "option" => Self::ALT_OR_OPTION,
            "fn" => Self::FUNCTION,
            "shift" => Self::SHIFT,
            _ => return None,
        };
        Some(m)
    }
}

impl ops::BitOr for Modifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl ops::BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::CMD, "cmd"),
            (Self::CTRL, "ctrl"),
            (Self::CMD_OR_CTRL, "cmdctrl"),
            (Self::ALT_OR_OPTION, "alt"),
            (Self::FUNCTION, "fn"),
            (Self::SHIFT, "shift"),
        ];
        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    f.write_str("+")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShortcutError {
    #[error("empty shortcut")]
    EmptyShortcut,
    #[error("empty key")]
    EmptyKey,
    #[error("unknown modifier: {0}")]
    UnknownModifier(String),
}

/// A parsed shortcut such as `cmd+shift+n`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shortcut {
    pub key: String,
    pub modifiers: Modifiers,
}

/// Parses `mod+mod+key`. The final token is the key, every token before it
/// must be a known modifier.
pub fn parse(spec: &str) -> Result<Shortcut, ShortcutError> {
    if spec.is_empty() {
        return Err(ShortcutError::EmptyShortcut);
    }

    let mut parts = spec.split('+').collect::<Vec<_>>();
    let Some(key) = parts.pop() else {
        return Err(ShortcutError::EmptyShortcut);
    };
    if key.is_empty() {
        return Err(ShortcutError::EmptyKey);
    }

    let mut modifiers = Modifiers::NONE;
    for part in parts {
        modifiers |= Modifiers::from_token(part)
            .ok_or_else(|| ShortcutError::UnknownModifier(part.to_string()))?;
    }

    Ok(Shortcut {
        key: key.to_string(),
        modifiers,
    })
}

impl FromStr for Shortcut {
    type Err = ShortcutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            return f.write_str(&self.key);
        }
        write!(f, "{}+{}", self.modifiers, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cmd_shift_n() {
        let s = parse("cmd+shift+n").unwrap();
        assert_eq!(s.key, "n");
        assert_eq!(s.modifiers, Modifiers::CMD | Modifiers::SHIFT);
        assert_eq!(s.modifiers.bits(), 0b10_0001);
    }

    #[test]
    fn bare_key_has_no_modifiers() {
        let s = parse("q").unwrap();
        assert_eq!(s.key, "q");
        assert!(s.modifiers.is_empty());
    }

    #[test]
    fn empty_string_is_empty_shortcut() {
        assert_eq!(parse(""), Err(ShortcutError::EmptyShortcut));
    }

    #[test]
    fn trailing_plus_is_empty_key() {
        assert_eq!(parse("cmd+"), Err(ShortcutError::EmptyKey));
        assert_eq!(parse("+"), Err(ShortcutError::EmptyKey));
    }

    #[test]
    fn unknown_modifier_names_the_token() {
        assert_eq!(
            parse("cmd+xyz+n"),
            Err(ShortcutError::UnknownModifier("xyz".to_string()))
        );
        assert_eq!(
            parse("Cmd+Hyper+n"),
            Err(ShortcutError::UnknownModifier("Hyper".to_string()))
        );
    }

    #[test]
    fn modifiers_are_case_insensitive_and_order_free() {
        let a = parse("SHIFT+Cmd+k").unwrap();
        let b = parse("cmd+shift+k").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn duplicate_modifiers_are_idempotent() {
        let s = parse("shift+shift+cmd+cmd+x").unwrap();
        assert_eq!(s.modifiers, Modifiers::CMD | Modifiers::SHIFT);
    }

    #[test]
    fn ctrl_aliases_cmd() {
        assert_eq!(parse("ctrl+c").unwrap().modifiers, Modifiers::CMD);
        assert!(!parse("ctrl+c").unwrap().modifiers.contains(Modifiers::CTRL));
    }

    #[test]
    fn every_table_token_maps_to_its_flag() {
        let table = [
            ("cmd", Modifiers::CMD),
            ("ctrl", Modifiers::CMD),
            ("cmdctrl", Modifiers::CMD_OR_CTRL),
            ("alt", Modifiers::ALT_OR_OPTION),
            ("option", Modifiers::ALT_OR_OPTION),
            ("fn", Modifiers::FUNCTION),
            ("shift", Modifiers::SHIFT),
        ];
        let mut all = Modifiers::NONE;
        let mut spec = String::new();
        for (token, flag) in table {
            assert_eq!(parse(&format!("{token}+a")).unwrap().modifiers, flag);
            all |= flag;
            spec.push_str(&token.to_uppercase());
            spec.push('+');
        }
        spec.push('a');
        assert_eq!(parse(&spec).unwrap().modifiers, all);
    }

    #[test]
    fn display_is_canonical() {
        let s: Shortcut = "option+Cmd+,".parse().unwrap();
        assert_eq!(s.to_string(), "cmd+alt+,");
    }
}
