// src/utils.rs
use uuid::Uuid;

/// Location searched when the operator leaves the field blank.
pub const DEFAULT_LOCATION: &str = "Pakistan";

/// Role used for outreach drafts when no search role was retained.
pub const DEFAULT_OUTREACH_ROLE: &str = "Software Engineer";

/// Trim user input, treating whitespace-only input as missing
pub fn normalize_input(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Normalize location, falling back to the default search location
pub fn normalize_location(location: Option<&str>) -> String {
    location
        .and_then(normalize_input)
        .unwrap_or_else(|| DEFAULT_LOCATION.to_string())
}

/// Pick the role for an outreach draft: explicit, then retained, then generic
pub fn outreach_role(explicit: Option<&str>, retained: Option<&str>) -> String {
    explicit
        .and_then(normalize_input)
        .or_else(|| retained.and_then(normalize_input))
        .unwrap_or_else(|| DEFAULT_OUTREACH_ROLE.to_string())
}

/// Unique per-request token so polls never hit a cached response
pub fn cache_buster() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Shorten text for single-line display
pub fn truncate(text: &str, max_chars: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let cut: String = single_line.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_input() {
        assert_eq!(
            normalize_input("  AI Agent Developer "),
            Some("AI Agent Developer".to_string())
        );
        assert_eq!(normalize_input("   "), None);
        assert_eq!(normalize_input(""), None);
    }

    #[test]
    fn test_normalize_location() {
        assert_eq!(normalize_location(Some("")), "Pakistan");
        assert_eq!(normalize_location(None), "Pakistan");
        assert_eq!(normalize_location(Some(" Lahore ")), "Lahore");
    }

    #[test]
    fn test_outreach_role() {
        assert_eq!(outreach_role(Some("Data Engineer"), Some("SRE")), "Data Engineer");
        assert_eq!(outreach_role(None, Some("SRE")), "SRE");
        assert_eq!(outreach_role(Some(" "), None), "Software Engineer");
    }

    #[test]
    fn test_cache_buster_is_unique() {
        let a = cache_buster();
        let b = cache_buster();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("multi\nline   text", 20), "multi line text");
        assert_eq!(truncate("abcdefghijkl", 6), "abcde…");
    }
}
