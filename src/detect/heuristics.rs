//! Character-level heuristics shared by the candidate filters and the
//! confidence score.

use std::collections::HashMap;

/// Shannon entropy in bits per character, from the character-frequency
/// distribution of the string.
pub fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut counts = HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_insert(0u32) += 1;
    }

    let len = s.chars().count() as f64;
    let mut entropy = 0.0;
    for count in counts.values() {
        let p = f64::from(*count) / len;
        entropy -= p * p.log2();
    }
    entropy
}

pub fn has_mixed_case(s: &str) -> bool {
    s.chars().any(|c| c.is_uppercase()) && s.chars().any(|c| c.is_lowercase())
}

pub fn has_digits(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
}

/// True when any character repeats at least `run` times consecutively.
pub fn has_repeated_run(s: &str, run: usize) -> bool {
    let mut count = 0;
    let mut previous = None;
    for c in s.chars() {
        if Some(c) == previous {
            count += 1;
            if count >= run {
                return true;
            }
        } else {
            previous = Some(c);
            count = 1;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entropy_of_uniform_string_is_zero() {
        assert_eq!(shannon_entropy("aaaaaaa"), 0.0);
        assert_eq!(shannon_entropy(""), 0.0);
    }

    #[test]
    fn entropy_of_random_looking_string_is_high() {
        assert!(shannon_entropy("aB3xY9zQ2m") > 3.0);
    }

    #[test]
    fn entropy_of_two_symbol_string_is_one_bit() {
        let entropy = shannon_entropy("abababab");
        assert!((entropy - 1.0).abs() < 1e-9);
    }

    #[test]
    fn mixed_case_requires_both() {
        assert!(has_mixed_case("AbCdEf"));
        assert!(!has_mixed_case("abcdef"));
        assert!(!has_mixed_case("ABCDEF"));
    }

    #[test]
    fn digit_check() {
        assert!(has_digits("abc123"));
        assert!(!has_digits("abcdef"));
    }

    #[test]
    fn repeated_run_detection() {
        assert!(has_repeated_run("sk-aaaaaa-rest", 6));
        assert!(!has_repeated_run("sk-aaaaa-rest", 6));
        assert!(!has_repeated_run("abababababab", 6));
    }
}
