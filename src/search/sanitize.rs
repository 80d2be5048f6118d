/// Characters with special meaning in the engine's query-string grammar.
pub const UNSAFE_CHARACTERS: [char; 14] = [
    '#', '%', ';', '^', '~', '`', '|', '<', '>', '[', ']', '{', '}', '\\',
];

/// Remove every unsafe character from raw user input.
///
/// Characters are dropped, not escaped: `"a#b"` becomes `"ab"`. Callers trim
/// the result themselves.
pub fn make_safe(term: &str) -> String {
    term.chars()
        .filter(|c| !UNSAFE_CHARACTERS.contains(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_instead_of_escaping() {
        assert_eq!(make_safe("a#b"), "ab");
        assert_eq!(make_safe(r"a\b"), "ab");
    }

    #[test]
    fn test_keeps_safe_text() {
        assert_eq!(make_safe("student loans 2021"), "student loans 2021");
        assert_eq!(make_safe(""), "");
    }

    #[test]
    fn test_strips_every_unsafe_character() {
        let all: String = UNSAFE_CHARACTERS.iter().collect();
        assert_eq!(make_safe(&format!("x{all}y{all}")), "xy");
    }

    #[test]
    fn test_surrounding_whitespace_left_for_caller() {
        assert_eq!(make_safe("  {loans}  "), "  loans  ");
        assert_eq!(make_safe("  {loans}  ").trim(), "loans");
    }

    #[test]
    fn test_idempotent_and_clean() {
        let inputs = [
            "credit ~card~",
            "[mortgage] {rates}",
            "<script>alert(1)</script>",
            "100% | 50%;^`",
            "ünïcödé #tag",
            "\\\\double",
        ];

        for input in inputs {
            let once = make_safe(input);
            assert_eq!(make_safe(&once), once, "not idempotent for {input:?}");
            assert!(
                !once.chars().any(|c| UNSAFE_CHARACTERS.contains(&c)),
                "unsafe character left in {once:?}"
            );
        }
    }
}
