//! Helpers called from generated validation code.
//!
//! Everything here is part of the contract between `prost-validator-build`
//! and the code it emits. Generated code calls these by path.

use std::collections::HashMap;
use std::sync::{LazyLock, RwLock};

/// Compiled patterns keyed by source text.
/// `None` records a pattern that failed to compile so it is not retried.
struct RegexCache<R> {
    entries: RwLock<HashMap<String, Option<R>>>,
}

impl<R: Clone> RegexCache<R> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn get_or_compile<E>(
        &self,
        pattern: &str,
        compile: impl FnOnce(&str) -> Result<R, E>,
    ) -> Option<R> {
        // Fast path
        {
            let entries = self
                .entries
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(compiled) = entries.get(pattern) {
                return compiled.clone();
            }
        }

        let compiled = compile(pattern).ok();
        self.entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(pattern.to_string(), compiled.clone());
        compiled
    }
}

static STR_PATTERNS: LazyLock<RegexCache<regex::Regex>> = LazyLock::new(RegexCache::new);
static BYTES_PATTERNS: LazyLock<RegexCache<regex::bytes::Regex>> = LazyLock::new(RegexCache::new);

/// Returns true if `haystack` matches `pattern`.
///
/// An invalid pattern never matches, so the `pattern` rule reports a failure.
#[must_use]
pub fn matches_str(pattern: &str, haystack: &str) -> bool {
    STR_PATTERNS
        .get_or_compile(pattern, regex::Regex::new)
        .is_some_and(|re| re.is_match(haystack))
}

/// Returns true if the raw bytes in `haystack` match `pattern`.
///
/// An invalid pattern never matches, so the `pattern` rule reports a failure.
#[must_use]
pub fn matches_bytes(pattern: &str, haystack: &[u8]) -> bool {
    BYTES_PATTERNS
        .get_or_compile(pattern, regex::bytes::Regex::new)
        .is_some_and(|re| re.is_match(haystack))
}

/// Returns true if `needle` occurs as a contiguous run inside `haystack`.
/// An empty needle is contained in every haystack.
#[must_use]
pub fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

/// Nanoseconds since the Unix epoch, read at validation time.
#[must_use]
pub fn now_unix_nano() -> i64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    i64::try_from(now.as_nanos()).unwrap_or(i64::MAX)
}

/// Arithmetic over the operand types of computed rules.
///
/// Integer addition wraps on overflow. Floats follow IEEE 754.
pub trait Arithmetic: Copy {
    /// `self + rhs`.
    fn sum(self, rhs: Self) -> Self;

    /// `None` when the remainder is undefined.
    fn remainder(self, rhs: Self) -> Option<Self>;
}

macro_rules! integer_arithmetic {
    ($($ty:ty),*) => {$(
        impl Arithmetic for $ty {
            fn sum(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }

            fn remainder(self, rhs: Self) -> Option<Self> {
                // wrapping_rem maps MIN % -1 to 0
                (rhs != 0).then(|| self.wrapping_rem(rhs))
            }
        }
    )*};
}

integer_arithmetic!(i32, i64, u32, u64, usize);

macro_rules! float_arithmetic {
    ($($ty:ty),*) => {$(
        impl Arithmetic for $ty {
            fn sum(self, rhs: Self) -> Self {
                self + rhs
            }

            fn remainder(self, rhs: Self) -> Option<Self> {
                Some(self % rhs)
            }
        }
    )*};
}

float_arithmetic!(f32, f64);

/// `a + b`, wrapping on integer overflow.
#[must_use]
pub fn add<T: Arithmetic>(a: T, b: T) -> T {
    a.sum(b)
}

/// `a % b`, or `None` for an integer division by zero.
#[must_use]
pub fn checked_rem<T: Arithmetic>(a: T, b: T) -> Option<T> {
    a.remainder(b)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn text_patterns_match_and_cache() {
        assert!(matches_str("^[a-z]+$", "abc"));
        assert!(!matches_str("^[a-z]+$", "ab1"));
        // second lookup is served from the cache
        assert!(matches_str("^[a-z]+$", "xyz"));
    }

    #[test]
    fn byte_patterns_accept_non_utf8_input() {
        assert!(matches_bytes("(?-u)^\\x00\\xff", &[0x00, 0xff, 0x10]));
        assert!(!matches_bytes("^abc", b"xabc"));
    }

    #[test]
    fn invalid_patterns_never_match() {
        assert!(!matches_str("(", "("));
        assert!(!matches_bytes("(", b"("));
    }

    #[test]
    fn byte_containment_checks_contiguous_runs() {
        assert!(contains_bytes(b"hello", b"ell"));
        assert!(contains_bytes(b"hello", b""));
        assert!(!contains_bytes(b"hello", b"hlo"));
        assert!(!contains_bytes(b"he", b"hello"));
    }

    #[test]
    fn now_is_after_2020() {
        assert!(now_unix_nano() > 1_577_836_800_000_000_000);
    }

    #[test]
    fn addition_wraps_at_the_type_bounds() {
        assert_eq!(add(i64::MAX - 5, 100), i64::MIN + 94);
        assert_eq!(add(u32::MAX, 1), 0);
        assert_eq!(add(0.5_f64, 0.25).to_bits(), 0.75_f64.to_bits());
    }

    #[test]
    fn remainder_by_zero_is_undefined() {
        assert_eq!(checked_rem(7_i64, 0), None);
        assert_eq!(checked_rem(7_usize, 0), None);
        assert_eq!(checked_rem(i32::MIN, -1), Some(0));
        assert_eq!(checked_rem(-7_i32, 2), Some(-1));
        assert!(checked_rem(1.0_f64, 0.0).is_some_and(f64::is_nan));
    }

    proptest! {
        #[test]
        fn integer_remainder_matches_the_operator(a in any::<i64>(), b in any::<i64>()) {
            let expected = if b == 0 { None } else { a.checked_rem(b).or(Some(0)) };
            prop_assert_eq!(checked_rem(a, b), expected);
        }
    }
}
