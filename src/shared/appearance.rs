use crate::game::constants::{COLOR_POOL, DEFAULT_AVATAR, HEAD_AVATARS, MAX_CUSTOM_HEAD_LEN};
use crate::game::types::Avatar;

/// Accepts `#rrggbb` colors, lowercased.
pub fn parse_color(value: &str) -> Option<String> {
    let hex = value.trim().strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!("#{}", hex.to_ascii_lowercase()))
}

pub fn palette_color(index: usize) -> String {
    COLOR_POOL[index % COLOR_POOL.len()].to_string()
}

pub fn is_known_avatar(key: &str) -> bool {
    HEAD_AVATARS.contains(&key)
}

/// The custom head reference wins when present; it is opaque here and only
/// bounded in size.
pub fn resolve_avatar(key: Option<&str>, custom_head: Option<&str>) -> Avatar {
    if let Some(reference) = custom_head.map(str::trim).filter(|value| !value.is_empty()) {
        if reference.len() <= MAX_CUSTOM_HEAD_LEN {
            return Avatar::CustomImage(reference.to_string());
        }
    }
    let key = key
        .map(str::trim)
        .filter(|key| is_known_avatar(key))
        .unwrap_or(DEFAULT_AVATAR);
    Avatar::Emoji(key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_must_be_six_digit_hex() {
        assert_eq!(parse_color("#FF00ff").as_deref(), Some("#ff00ff"));
        assert_eq!(parse_color("ff00ff"), None);
        assert_eq!(parse_color("#ff00f"), None);
        assert_eq!(parse_color("#gg00ff"), None);
    }

    #[test]
    fn palette_wraps_around() {
        assert_eq!(palette_color(0), palette_color(COLOR_POOL.len()));
    }

    #[test]
    fn every_catalog_key_is_known() {
        for key in HEAD_AVATARS {
            assert!(is_known_avatar(key));
            assert_eq!(resolve_avatar(Some(key), None), Avatar::Emoji(key.to_string()));
        }
        assert!(!is_known_avatar("😇"));
    }

    #[test]
    fn avatar_resolution() {
        assert_eq!(resolve_avatar(Some("skull"), None), Avatar::Emoji("skull".to_string()));
        assert_eq!(resolve_avatar(Some("dragon"), None), Avatar::Emoji("angel".to_string()));
        assert_eq!(
            resolve_avatar(Some("skull"), Some("upload-1")),
            Avatar::CustomImage("upload-1".to_string())
        );
        let oversized = "x".repeat(MAX_CUSTOM_HEAD_LEN + 1);
        assert_eq!(
            resolve_avatar(None, Some(&oversized)),
            Avatar::Emoji("angel".to_string())
        );
    }
}
