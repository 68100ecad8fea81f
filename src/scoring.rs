/// Outcome of comparing a typed attempt against its target sentence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub correct: bool,
    /// Percentage of target positions reproduced exactly. Not clamped.
    pub accuracy: f64,
    /// Characters typed per minute, counted on the raw input.
    pub speed: u64,
}

/// Judge `input` against `target` after `elapsed_secs` seconds of typing.
pub fn score(target: &str, input: &str, elapsed_secs: f64) -> Score {
    Score {
        correct: is_correct(target, input),
        accuracy: accuracy(target, input),
        speed: speed(input, elapsed_secs),
    }
}

/// Exact equality once surrounding whitespace is ignored.
pub fn is_correct(target: &str, input: &str) -> bool {
    input.trim() == target.trim()
}

/// Positional character matches over the target length, as a percentage.
///
/// Only the first `min(len(target), len(input))` positions are compared, so
/// an input running past the end of the target gains nothing and loses
/// nothing beyond the unmatched positions.
pub fn accuracy(target: &str, input: &str) -> f64 {
    let target_len = target.chars().count();
    if target_len == 0 {
        return 0.0;
    }

    let matches = target
        .chars()
        .zip(input.chars())
        .filter(|(expected, typed)| expected == typed)
        .count();

    (matches as f64 / target_len as f64) * 100.0
}

/// Characters per minute, rounded to the nearest whole character.
pub fn speed(input: &str, elapsed_secs: f64) -> u64 {
    if elapsed_secs <= 0.0 {
        return 0;
    }
    let typed = input.chars().count() as f64;
    (typed / elapsed_secs * 60.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_input_is_perfect() {
        let s = score("hello world", "hello world", 2.5);

        assert!(s.correct);
        assert_eq!(s.accuracy, 100.0);
        assert_eq!(s.speed, 264);
    }

    #[test]
    fn test_one_wrong_character() {
        let s = score("abc", "abx", 1.0);

        assert!(!s.correct);
        assert!((s.accuracy - 66.666_666).abs() < 1e-3);
        assert_eq!(format!("{:.1}", s.accuracy), "66.7");
        assert_eq!(s.speed, 180);
    }

    #[test]
    fn test_no_overlap_is_zero_accuracy() {
        assert_eq!(accuracy("abc", "xyz"), 0.0);
        assert_eq!(accuracy("abc", "bca"), 0.0);
    }

    #[test]
    fn test_trailing_whitespace_still_correct() {
        assert!(is_correct("hello", "hello "));
        assert!(is_correct("hello", "  hello\t"));
        assert!(is_correct(" hello ", "hello"));
        assert!(!is_correct("hello", "hell o"));
    }

    #[test]
    fn test_correctness_is_independent_of_accuracy() {
        // leading space shifts every position, accuracy drops but trim matches
        let s = score("abc", " abc", 1.0);
        assert!(s.correct);
        assert_eq!(s.accuracy, 0.0);
    }

    #[test]
    fn test_longer_input_does_not_add_matches() {
        assert_eq!(accuracy("ab", "abcdef"), 100.0);
    }

    #[test]
    fn test_shorter_input_counts_against_target_length() {
        assert_eq!(accuracy("abcd", "ab"), 50.0);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(accuracy("abc", ""), 0.0);
        assert_eq!(speed("", 3.0), 0);
    }

    #[test]
    fn test_empty_target() {
        assert_eq!(accuracy("", "abc"), 0.0);
    }

    #[test]
    fn test_wide_characters_count_once() {
        assert!((accuracy("가나다", "가나라") - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(speed("가나다", 1.0), 180);
    }

    #[test]
    fn test_speed_uses_raw_length_not_correctness() {
        assert_eq!(speed("zzzzzz", 6.0), 60);
    }

    #[test]
    fn test_speed_rounds() {
        // 7 chars in 4 seconds is 105 per minute exactly
        assert_eq!(speed("abcdefg", 4.0), 105);
        // 1 char in 7 seconds is 8.57 per minute
        assert_eq!(speed("a", 7.0), 9);
    }

    #[test]
    fn test_speed_without_elapsed_time() {
        assert_eq!(speed("abc", 0.0), 0);
        assert_eq!(speed("abc", -1.0), 0);
    }
}
