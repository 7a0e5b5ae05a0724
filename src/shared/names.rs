pub const MAX_PLAYER_NAME_LENGTH: usize = 16;
pub const DEFAULT_PLAYER_NAME: &str = "Player";

pub fn sanitize_player_name(name: &str, fallback: &str) -> String {
    let cleaned = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>();
    if cleaned.is_empty() {
        return fallback.to_string();
    }
    cleaned.chars().take(MAX_PLAYER_NAME_LENGTH).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_truncates() {
        assert_eq!(sanitize_player_name("  neon   rider ", "Player"), "neon rider");
        assert_eq!(
            sanitize_player_name("abcdefghijklmnopqrstuvwxyz", "Player"),
            "abcdefghijklmnop"
        );
    }

    #[test]
    fn blank_names_use_the_fallback() {
        assert_eq!(sanitize_player_name("   ", DEFAULT_PLAYER_NAME), "Player");
        assert_eq!(sanitize_player_name("", DEFAULT_PLAYER_NAME), "Player");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let name = "🐍".repeat(20);
        assert_eq!(sanitize_player_name(&name, "Player").chars().count(), 16);
    }
}
