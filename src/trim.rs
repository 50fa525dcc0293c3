//! Job name shortening for the widget display.

use crate::config::DisplayConfig;

pub const ELLIPSIS: &str = "...";

/// Shorten `name` to `max_len` leading characters, an ellipsis and the last
/// `tail_len` characters. Names of at most `max_len` characters come back
/// unchanged.
///
/// Lengths are counted in `char`s, so multi-byte names never split inside a
/// code point. A `tail_len` longer than the name keeps the whole name as the
/// tail.
pub fn trim_job_name(name: &str, max_len: usize, tail_len: usize) -> String {
    let len = name.chars().count();
    if len <= max_len {
        return name.to_string();
    }

    let head: String = name.chars().take(max_len).collect();
    let tail: String = name.chars().skip(len.saturating_sub(tail_len)).collect();
    format!("{head}{ELLIPSIS}{tail}")
}

/// Display thresholds bundled for repeated use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameTrimmer {
    pub max_len: usize,
    pub tail_len: usize,
}

impl NameTrimmer {
    pub fn new(max_len: usize, tail_len: usize) -> Self {
        Self { max_len, tail_len }
    }

    pub fn trim(&self, name: &str) -> String {
        trim_job_name(name, self.max_len, self.tail_len)
    }
}

impl Default for NameTrimmer {
    fn default() -> Self {
        Self::from(&DisplayConfig::default())
    }
}

impl From<&DisplayConfig> for NameTrimmer {
    fn from(cfg: &DisplayConfig) -> Self {
        Self::new(cfg.max_name_length, cfg.name_tail_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name_unchanged() {
        assert_eq!(trim_job_name("HELLOGIT", 30, 20), "HELLOGIT");
        assert_eq!(trim_job_name("", 30, 20), "");
    }

    #[test]
    fn test_exact_max_length_unchanged() {
        let name = "a".repeat(30);
        assert_eq!(trim_job_name(&name, 30, 20), name);
    }

    #[test]
    fn test_one_past_max_length_is_trimmed() {
        let name: String = ('a'..='z').chain('A'..='E').collect();
        assert_eq!(name.len(), 31);

        let trimmed = trim_job_name(&name, 30, 20);
        assert_eq!(trimmed.len(), 30 + 3 + 20);
        assert!(trimmed.starts_with(&name[..30]));
        assert!(trimmed.ends_with(&name[11..]));
        assert_eq!(&trimmed[30..33], ELLIPSIS);
    }

    #[test]
    fn test_fifty_x() {
        let name = "x".repeat(50);
        let expected = format!("{}...{}", "x".repeat(30), "x".repeat(20));
        assert_eq!(trim_job_name(&name, 30, 20), expected);
    }

    #[test]
    fn test_prefix_and_suffix_are_distinct_parts() {
        let name = "release-pipeline-integration-tests-for-the-payments-service";
        let trimmed = trim_job_name(name, 30, 20);
        assert_eq!(trimmed, "release-pipeline-integration-t...the-payments-service");
    }

    #[test]
    fn test_already_trimmed_short_name_is_stable() {
        let name = "build-all...nightly";
        assert_eq!(trim_job_name(name, 30, 20), name);
        assert_eq!(trim_job_name(&trim_job_name(name, 30, 20), 30, 20), name);
    }

    #[test]
    fn test_tail_longer_than_name_never_panics() {
        assert_eq!(trim_job_name("abcdef", 2, 50), "ab...abcdef");
        assert_eq!(trim_job_name("abcdef", 0, 0), "...");
    }

    #[test]
    fn test_multibyte_names() {
        let name = "ü".repeat(40);
        let trimmed = trim_job_name(&name, 30, 20);
        assert_eq!(trimmed.chars().count(), 53);
    }

    #[test]
    fn test_trimmer_from_display_config() {
        let trimmer = NameTrimmer::from(&DisplayConfig {
            max_name_length: 4,
            name_tail_length: 2,
        });
        assert_eq!(trimmer.trim("abcdefgh"), "abcd...gh");
        assert_eq!(NameTrimmer::default(), NameTrimmer::new(30, 20));
    }
}
