// src/utils/html.rs

/// Sanitizes admin-supplied question text before it is stored.
///
/// Whitelist-based (ammonia): harmless markup like `<b>` or `<code>` survives,
/// `<script>` and event-handler attributes are dropped. Surrounding whitespace is trimmed.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_removed_markup_kept() {
        let cleaned = clean_html("  Which is <b>final</b>?<script>alert(1)</script> ");
        assert_eq!(cleaned, "Which is <b>final</b>?");
    }
}
