//! Post-substitution name sanitizers.

use tgs_config::Charset;

/// Apply the character rules of `charset`, then truncate to `max_length`.
pub fn sanitize(raw: &str, charset: Charset, max_length: Option<usize>) -> String {
    let mut name = match charset {
        Charset::AlphanumericHyphen => alphanumeric_hyphen(raw),
        Charset::LowerAlphanumeric => raw
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_lowercase(),
    };

    if let Some(max) = max_length {
        name = name.chars().take(max).collect();
        if charset == Charset::AlphanumericHyphen {
            name = name.trim_end_matches('-').to_string();
        }
    }

    name
}

/// Letters, digits and single interior hyphens. Separators become hyphens.
fn alphanumeric_hyphen(raw: &str) -> String {
    let mut name = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c);
        } else if matches!(c, '-' | '_' | ' ' | '.') && !name.is_empty() && !name.ends_with('-') {
            name.push('-');
        }
    }
    name.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_tokens_leave_no_dangling_hyphens() {
        assert_eq!(sanitize("CUSTTP-ed-", Charset::AlphanumericHyphen, None), "CUSTTP-ed");
        assert_eq!(sanitize("-CUSTTP--d", Charset::AlphanumericHyphen, None), "CUSTTP-d");
    }

    #[test]
    fn test_lower_alphanumeric() {
        assert_eq!(
            sanitize("CUSTTP-e2d-st-api", Charset::LowerAlphanumeric, Some(24)),
            "custtpe2dstapi"
        );
    }

    #[test]
    fn test_truncation_does_not_end_with_hyphen() {
        assert_eq!(sanitize("abc-def", Charset::AlphanumericHyphen, Some(4)), "abc");
    }

    #[test]
    fn test_only_invalid_characters() {
        assert_eq!(sanitize("--__", Charset::AlphanumericHyphen, None), "");
        assert_eq!(sanitize("-", Charset::LowerAlphanumeric, None), "");
    }
}
