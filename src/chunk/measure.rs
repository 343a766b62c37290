//! Pluggable text size measures.

/// Measures the size of a piece of text in some unit.
pub trait SizeMeasure: Send + Sync {
    /// Returns the size of `text`.
    fn measure(&self, text: &str) -> usize;
}

/// Size in Unicode scalar values.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharCount;

impl SizeMeasure for CharCount {
    fn measure(&self, text: &str) -> usize {
        text.chars().count()
    }
}

/// Heuristic token count: 3.5 characters per token plus a 10% margin,
/// rounded up. Overestimates rather than underestimates.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenEstimate;

impl TokenEstimate {
    const CHARS_PER_TOKEN: f64 = 3.5;
    const MARGIN: f64 = 1.10;
}

impl SizeMeasure for TokenEstimate {
    fn measure(&self, text: &str) -> usize {
        let chars = text.chars().count() as f64;
        (chars / Self::CHARS_PER_TOKEN * Self::MARGIN).ceil() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_count_counts_scalars() {
        assert_eq!(CharCount.measure(""), 0);
        assert_eq!(CharCount.measure("héllo"), 5);
    }

    #[test]
    fn token_estimate_rounds_up_with_margin() {
        assert_eq!(TokenEstimate.measure(""), 0);
        // 5 / 3.5 * 1.1 = 1.57
        assert_eq!(TokenEstimate.measure("hello"), 2);
        // 3500 / 3.5 * 1.1 = 1100
        assert_eq!(TokenEstimate.measure(&"x".repeat(3500)), 1100);
    }

    #[test]
    fn token_estimate_counts_characters_not_bytes() {
        assert_eq!(
            TokenEstimate.measure(&"a".repeat(70)),
            TokenEstimate.measure(&"é".repeat(70))
        );
    }

    #[test]
    fn token_estimate_is_smaller_than_char_count() {
        let text = "fn main() { println!(\"hello\"); }\n".repeat(20);
        assert!(TokenEstimate.measure(&text) < CharCount.measure(&text));
    }
}
