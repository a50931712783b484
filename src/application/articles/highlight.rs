//! Keyword highlighting for search results.

pub const HIGHLIGHT_MARKER: &str = "**";

/// Wrap the first case-insensitive occurrence of `keyword` in `text` with
/// [`HIGHLIGHT_MARKER`], keeping the matched text's original casing.
///
/// Text without a match, or an empty keyword, is returned unchanged.
pub fn highlight_first(text: &str, keyword: &str) -> String {
    match find_case_insensitive(text, keyword) {
        Some((start, end)) => format!(
            "{}{HIGHLIGHT_MARKER}{}{HIGHLIGHT_MARKER}{}",
            &text[..start],
            &text[start..end],
            &text[end..]
        ),
        None => text.to_string(),
    }
}

/// Byte range of the first occurrence of `needle` in `haystack`, comparing
/// lowercase forms. Ranges always fall on character boundaries of `haystack`.
fn find_case_insensitive(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return None;
    }

    for (start, _) in haystack.char_indices() {
        let mut matched = 0;
        for (offset, ch) in haystack[start..].char_indices() {
            let mut agrees = true;
            for lower in ch.to_lowercase() {
                if needle.get(matched) == Some(&lower) {
                    matched += 1;
                } else {
                    agrees = false;
                    break;
                }
            }
            if !agrees {
                break;
            }
            if matched == needle.len() {
                return Some((start, start + offset + ch.len_utf8()));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_original_casing_inside_markers() {
        assert_eq!(highlight_first("My cat story", "Cat"), "My **cat** story");
        assert_eq!(highlight_first("CATS rule", "cat"), "**CAT**S rule");
    }

    #[test]
    fn only_first_occurrence_is_marked() {
        assert_eq!(
            highlight_first("cat and cat again", "cat"),
            "**cat** and cat again"
        );
    }

    #[test]
    fn unmatched_or_empty_keyword_is_identity() {
        assert_eq!(highlight_first("My dog story", "cat"), "My dog story");
        assert_eq!(highlight_first("My cat story", ""), "My cat story");
        assert_eq!(highlight_first("", "cat"), "");
    }

    #[test]
    fn handles_multibyte_text() {
        assert_eq!(highlight_first("Über Straße", "straße"), "Über **Straße**");
        assert_eq!(highlight_first("学习Rust语言", "rust"), "学习**Rust**语言");
    }

    #[test]
    fn partial_overlap_restarts_scan() {
        assert_eq!(highlight_first("aaab", "aab"), "a**aab**");
    }
}
