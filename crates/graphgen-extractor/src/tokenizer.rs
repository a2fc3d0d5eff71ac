//! Splits raw LLM output into candidate records and attribute lists

use regex::Regex;
use std::sync::LazyLock;

static TUPLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((.*)\)").expect("tuple pattern is valid")
});

/// Split `content` on every occurrence of any marker
///
/// Pieces are trimmed and empty pieces dropped. With no markers the trimmed
/// content is the only piece.
///
/// # Examples
///
/// ```
/// use graphgen_extractor::split_by_markers;
///
/// let pieces = split_by_markers("a ## b<|COMPLETE|>", &["##", "<|COMPLETE|>"]);
/// assert_eq!(pieces, vec!["a", "b"]);
/// ```
pub fn split_by_markers<'a>(content: &'a str, markers: &[&str]) -> Vec<&'a str> {
    let markers: Vec<&str> = markers.iter().copied().filter(|m| !m.is_empty()).collect();
    let mut pieces = Vec::new();
    let mut rest = content;

    loop {
        // Earliest marker wins; on a tie the longer marker is consumed
        let next = markers
            .iter()
            .filter_map(|m| rest.find(m).map(|pos| (pos, m.len())))
            .min_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        match next {
            Some((pos, len)) => {
                pieces.push(&rest[..pos]);
                rest = &rest[pos + len..];
            }
            None => {
                pieces.push(rest);
                break;
            }
        }
    }

    pieces
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Inner text of the first parenthesised group in `candidate`
///
/// Greedy from the first `(` to the last `)` on the same line.
pub fn extract_tuple(candidate: &str) -> Option<&str> {
    TUPLE_RE
        .captures(candidate)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Candidate records of `raw`, split on the record and completion delimiters
pub fn split_records<'a>(
    raw: &'a str,
    record_delimiter: &str,
    completion_delimiter: &str,
) -> Vec<&'a str> {
    split_by_markers(raw, &[record_delimiter, completion_delimiter])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_split_drops_empty_pieces() {
        let pieces = split_by_markers("##  ## a##b ##<|COMPLETE|>", &["##", "<|COMPLETE|>"]);
        assert_eq!(pieces, vec!["a", "b"]);
    }

    #[test]
    fn test_split_without_markers() {
        assert_eq!(split_by_markers("  whole  ", &[]), vec!["whole"]);
        assert!(split_by_markers("   ", &["##"]).is_empty());
    }

    #[test]
    fn test_split_prefers_longer_marker_at_same_position() {
        let pieces = split_by_markers("a<|>b<|COMPLETE|>c", &["<|", "<|COMPLETE|>"]);
        assert_eq!(pieces, vec!["a", "|>b", "c"]);
    }

    #[test]
    fn test_extract_tuple_is_greedy() {
        let inner = extract_tuple(r#"("entity"<|>"A (Inc)"<|>"ORG"<|>"desc")"#).unwrap();
        assert_eq!(inner, r#""entity"<|>"A (Inc)"<|>"ORG"<|>"desc""#);
    }

    #[test]
    fn test_extract_tuple_ignores_prose() {
        assert!(extract_tuple("no tuple here").is_none());
        assert!(extract_tuple(") backwards (").is_none());
    }

    #[test]
    fn test_extract_tuple_stays_on_one_line() {
        assert!(extract_tuple("(\"entity\"<|>A\n<|>ORG<|>desc)").is_none());
        let inner = extract_tuple("noise\n(\"entity\"<|>A<|>ORG<|>desc)\ntrailing").unwrap();
        assert_eq!(inner, "\"entity\"<|>A<|>ORG<|>desc");
    }

    #[test]
    fn test_split_records_uses_both_delimiters() {
        let raw = "(a)##(b)<|COMPLETE|>(c)";
        assert_eq!(split_records(raw, "##", "<|COMPLETE|>"), vec!["(a)", "(b)", "(c)"]);
    }

    proptest! {
        #[test]
        fn prop_pieces_never_contain_markers(
            parts in prop::collection::vec("[a-z ()]{0,12}", 0..10),
        ) {
            let raw = parts.join("##");
            for piece in split_by_markers(&raw, &["##", "<|COMPLETE|>"]) {
                prop_assert!(!piece.contains("##"));
                prop_assert!(!piece.is_empty());
                prop_assert_eq!(piece, piece.trim());
            }
        }

        #[test]
        fn prop_non_empty_parts_survive_in_order(
            parts in prop::collection::vec("[a-z]{1,8}", 1..10),
        ) {
            let raw = parts.join(" ## ");
            let pieces = split_by_markers(&raw, &["##"]);
            prop_assert_eq!(pieces, parts.iter().map(String::as_str).collect::<Vec<_>>());
        }
    }
}
