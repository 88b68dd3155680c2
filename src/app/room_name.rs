pub const MAX_ROOM_NAME_LENGTH: usize = 20;

/// Returns the trimmed name when it is 1 to 20 characters of ASCII letters,
/// digits, spaces, `-` or `_`.
pub fn validate_room_name(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_ROOM_NAME_LENGTH {
        return None;
    }
    let allowed = trimmed
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == ' ' || ch == '-' || ch == '_');
    allowed.then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_and_trims_plain_names() {
        assert_eq!(validate_room_name("  Friday Duel "), Some("Friday Duel".to_string()));
        assert_eq!(validate_room_name("a_b-c"), Some("a_b-c".to_string()));
        assert_eq!(validate_room_name(&"x".repeat(20)), Some("x".repeat(20)));
    }

    #[test]
    fn rejects_empty_long_and_symbolic_names() {
        assert_eq!(validate_room_name("   "), None);
        assert_eq!(validate_room_name(&"x".repeat(21)), None);
        assert_eq!(validate_room_name("<script>"), None);
        assert_eq!(validate_room_name("café"), None);
    }
}
