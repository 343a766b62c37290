//! Line and paragraph splitting of plain text under a [`SizeMeasure`].
//!
//! Splitting is lossless: separators stay attached to the end of the piece
//! they terminate, so concatenating the output reproduces the input.

use crate::chunk::SizeMeasure;

/// Separators tried in order, coarsest first. Text that still does not fit
/// after the last one is cut at character boundaries.
const SEPARATORS: &[&str] = &["\n", ". ", "! ", "? ", "; ", ": ", ", ", " "];

/// Splits `text` into lines of at most `max_size` (under `measure`).
///
/// Prefers newline boundaries, then sentence and clause punctuation, then
/// spaces. Adjacent pieces are merged while they fit. A run with no
/// separator is cut at the largest fitting character prefix.
pub fn split_plain_text_lines(
    text: &str,
    max_size: usize,
    measure: &dyn SizeMeasure,
) -> Vec<String> {
    let mut lines = Vec::new();
    split_recursive(text, max_size.max(1), measure, SEPARATORS, &mut lines);
    lines
}

/// Groups consecutive lines into paragraphs of at most `max_size`.
///
/// Lines are never split here; a line that alone exceeds `max_size` becomes
/// its own paragraph.
pub fn split_plain_text_paragraphs(
    lines: &[String],
    max_size: usize,
    measure: &dyn SizeMeasure,
) -> Vec<String> {
    let mut paragraphs = Vec::new();
    merge_greedy(
        lines.iter().map(String::as_str),
        max_size.max(1),
        measure,
        &mut paragraphs,
    );
    paragraphs
}

fn split_recursive(
    text: &str,
    max_size: usize,
    measure: &dyn SizeMeasure,
    separators: &[&str],
    out: &mut Vec<String>,
) {
    if text.is_empty() {
        return;
    }
    if measure.measure(text) <= max_size {
        out.push(text.to_string());
        return;
    }

    let Some((separator, finer)) = separators.split_first() else {
        split_hard(text, max_size, measure, out);
        return;
    };

    let pieces: Vec<&str> = text.split_inclusive(*separator).collect();
    if pieces.len() == 1 {
        split_recursive(text, max_size, measure, finer, out);
        return;
    }

    // Oversized pieces are split with finer separators; runs of pieces that
    // fit are merged greedily.
    let mut run: Vec<&str> = Vec::new();
    for piece in pieces {
        if measure.measure(piece) > max_size {
            merge_greedy(run.drain(..), max_size, measure, out);
            split_recursive(piece, max_size, measure, finer, out);
        } else {
            run.push(piece);
        }
    }
    merge_greedy(run.drain(..), max_size, measure, out);
}

fn merge_greedy<'a>(
    pieces: impl IntoIterator<Item = &'a str>,
    max_size: usize,
    measure: &dyn SizeMeasure,
    out: &mut Vec<String>,
) {
    let mut current = String::new();
    for piece in pieces {
        if current.is_empty() {
            current.push_str(piece);
            continue;
        }
        let mut candidate = String::with_capacity(current.len() + piece.len());
        candidate.push_str(&current);
        candidate.push_str(piece);
        if measure.measure(&candidate) <= max_size {
            current = candidate;
        } else {
            out.push(std::mem::replace(&mut current, piece.to_string()));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
}

/// Cuts `text` into the largest fitting character prefixes, at least one
/// character each.
fn split_hard(text: &str, max_size: usize, measure: &dyn SizeMeasure, out: &mut Vec<String>) {
    let ends: Vec<usize> = text
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .collect();

    let mut start = 0;
    let mut next = 0;
    while next < ends.len() {
        let candidates = &ends[next..];
        let fitting =
            candidates.partition_point(|&end| measure.measure(&text[start..end]) <= max_size);
        let take = fitting.max(1);
        let end = candidates[take - 1];
        out.push(text[start..end].to_string());
        start = end;
        next += take;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::chunk::{CharCount, TokenEstimate};

    fn assert_bounded(pieces: &[String], max: usize) {
        for piece in pieces {
            assert!(
                CharCount.measure(piece) <= max,
                "piece of {} chars exceeds {max}: {piece:?}",
                piece.chars().count()
            );
        }
    }

    // ── split_plain_text_lines ─────────────────────────────────

    #[test]
    fn empty_text_has_no_lines() {
        assert!(split_plain_text_lines("", 10, &CharCount).is_empty());
    }

    #[test]
    fn short_text_is_one_line() {
        assert_eq!(
            split_plain_text_lines("hello\nworld\n", 100, &CharCount),
            vec!["hello\nworld\n"]
        );
    }

    #[test]
    fn prefers_newline_boundaries() {
        let text = "first line here\nsecond line here\nthird line here\n";
        let lines = split_plain_text_lines(text, 20, &CharCount);
        assert_eq!(
            lines,
            vec!["first line here\n", "second line here\n", "third line here\n"]
        );
    }

    #[test]
    fn long_line_falls_back_to_sentences_then_words() {
        let text = "One sentence here. Another sentence follows. Finally a very long closing remark\n";
        let lines = split_plain_text_lines(text, 25, &CharCount);
        assert_bounded(&lines, 25);
        assert_eq!(lines[0], "One sentence here. ");
        assert_eq!(lines.concat(), text);
    }

    #[test]
    fn unbroken_run_is_cut_at_char_boundaries() {
        let text = "é".repeat(25);
        let lines = split_plain_text_lines(&text, 10, &CharCount);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].chars().count(), 5);
        assert_eq!(lines.concat(), text);
    }

    #[test]
    fn zero_limit_still_makes_progress() {
        let lines = split_plain_text_lines("abc", 0, &CharCount);
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn token_measure_allows_longer_lines() {
        let text = "word ".repeat(40);
        let by_chars = split_plain_text_lines(&text, 30, &CharCount);
        let by_tokens = split_plain_text_lines(&text, 30, &TokenEstimate);
        assert!(by_tokens.len() < by_chars.len());
        assert_eq!(by_tokens.concat(), text);
    }

    // ── split_plain_text_paragraphs ────────────────────────────

    #[test]
    fn paragraphs_group_lines_greedily() {
        let lines: Vec<String> = ["aaaa\n", "bbbb\n", "cccc\n", "dddd\n", "eeee\n"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let paragraphs = split_plain_text_paragraphs(&lines, 10, &CharCount);
        assert_eq!(paragraphs, vec!["aaaa\nbbbb\n", "cccc\ndddd\n", "eeee\n"]);
    }

    #[test]
    fn no_lines_no_paragraphs() {
        assert!(split_plain_text_paragraphs(&[], 10, &CharCount).is_empty());
    }

    #[test]
    fn oversized_line_is_its_own_paragraph() {
        let lines = vec!["ab".to_string(), "x".repeat(20), "cd".to_string()];
        let paragraphs = split_plain_text_paragraphs(&lines, 10, &CharCount);
        assert_eq!(paragraphs.len(), 3);
        assert_eq!(paragraphs[1], "x".repeat(20));
    }

    #[test]
    fn lines_then_paragraphs_is_lossless_and_bounded() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(50);
        let lines = split_plain_text_lines(&text, 100 / 8, &CharCount);
        let paragraphs = split_plain_text_paragraphs(&lines, 100, &CharCount);
        assert_bounded(&paragraphs, 100);
        assert_eq!(paragraphs.concat(), text);
    }

    // ── property tests ────────────────────────────────────────────

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn lines_are_bounded_and_lossless(text in "[a-z .,!?;:\n]{0,400}", max in 1_usize..80) {
                let lines = split_plain_text_lines(&text, max, &CharCount);
                for line in &lines {
                    prop_assert!(CharCount.measure(line) <= max);
                }
                prop_assert_eq!(lines.concat(), text);
            }

            #[test]
            fn arbitrary_text_is_lossless(text in ".{0,200}", max in 1_usize..40) {
                let lines = split_plain_text_lines(&text, max, &CharCount);
                prop_assert_eq!(lines.concat(), text);
            }

            #[test]
            fn paragraphs_keep_line_order(text in "[a-z \n]{0,400}", max in 8_usize..120) {
                let lines = split_plain_text_lines(&text, max / 8, &CharCount);
                let paragraphs = split_plain_text_paragraphs(&lines, max, &CharCount);
                for paragraph in &paragraphs {
                    prop_assert!(CharCount.measure(paragraph) <= max);
                }
                prop_assert_eq!(paragraphs.concat(), text);
            }
        }
    }
}
