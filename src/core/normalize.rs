use crate::domain::model::CanonicalKey;

/// Turns a raw card name into its catalog key.
///
/// Lower-cases, drops everything that is not a letter, digit or whitespace,
/// collapses whitespace runs and joins the words with `-`. A hyphen counts
/// as a separator, so feeding a key back in yields the same key. Note that
/// this keeps hyphenated names apart: "Fire-Storm" is `fire-storm`, not
/// `firestorm`.
pub fn normalize(raw: &str) -> CanonicalKey {
    let mut cleaned = String::with_capacity(raw.len());

    // 先轉小寫再過濾：部分字元的小寫會展開成組合符號
    for c in raw.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            cleaned.push(c);
        } else if c.is_whitespace() || c == '-' {
            cleaned.push(' ');
        }
    }

    CanonicalKey(cleaned.split_whitespace().collect::<Vec<_>>().join("-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_examples() {
        assert_eq!(normalize("Merlin, Kingslayer").as_str(), "merlin-kingslayer");
        assert_eq!(normalize("  Lost   Soul ").as_str(), "lost-soul");
        assert_eq!(normalize("Tristan, Underhanded!").as_str(), "tristan-underhanded");
        assert_eq!(normalize("Arisanna's Faith\tII").as_str(), "arisannas-faith-ii");
        assert_eq!(normalize("Fire-Storm").as_str(), "fire-storm");
    }

    #[test]
    fn test_normalize_is_total() {
        assert_eq!(normalize("").as_str(), "");
        assert_eq!(normalize("!!! ,,, ???").as_str(), "");
        assert_eq!(normalize("   ").as_str(), "");
        assert_eq!(normalize("---").as_str(), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "",
            "Merlin, Kingslayer",
            "a - b",
            "--leading and trailing--",
            "snake_case_name",
            "Ünïcödé Ñame",
            "İstanbul",
            "ǅemal",
            "tab\tnew\nline",
            "123 456",
            "emoji 🔥 card",
        ];

        for input in inputs {
            let once = normalize(input);
            let twice = normalize(once.as_str());
            assert_eq!(once, twice, "normalize is not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_normalize_output_is_url_safe_shape() {
        let key = normalize("  Hello,  World -- Again ");
        assert_eq!(key.as_str(), "hello-world-again");
        assert!(!key.as_str().starts_with('-'));
        assert!(!key.as_str().ends_with('-'));
        assert!(!key.as_str().contains("--"));
    }
}
