//! Text metrics shared by the validator and the judge.
//!
//! Everything here is deterministic and allocation-light: keyword sets are
//! ordered (`BTreeSet`) so that any aggregate computed over them is stable
//! across runs.

use std::collections::BTreeSet;

/// Minimum shared prefix (in chars) for two distinct keywords to count as
/// the same term, e.g. `regulated` / `regulation`.
pub const STEM_PREFIX_LEN: usize = 5;

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "been", "before", "being", "between", "both", "but", "by", "can",
    "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how",
    "i", "if", "in", "into", "is", "it", "its", "itself", "just", "like", "me", "more", "most",
    "must", "my", "no", "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other",
    "our", "ours", "out", "over", "own", "same", "she", "should", "so", "some", "such", "than",
    "that", "the", "their", "theirs", "them", "then", "there", "these", "they", "this", "those",
    "through", "to", "too", "under", "until", "up", "us", "very", "was", "we", "were", "what",
    "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would", "you",
    "your", "yours",
];

/// Whether `word` (already lower-cased) is a stopword.
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// Lower-cased maximal runs of alphanumeric characters, in order.
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

/// Distinct non-stopword words of `text`.
pub fn keywords(text: &str) -> BTreeSet<String> {
    words(text)
        .into_iter()
        .filter(|w| !is_stopword(w))
        .collect()
}

/// Two keywords match when equal or when they share a prefix of at least
/// [`STEM_PREFIX_LEN`] chars.
pub fn terms_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let shared = a
        .chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .count();
    shared >= STEM_PREFIX_LEN
}

/// Fraction of `reference` keywords matched by at least one `candidate`
/// keyword.
///
/// Prefix matches only count once the two sets share at least one exact
/// term, so a candidate with an empty exact intersection scores 0.0. An
/// empty reference also scores 0.0.
pub fn keyword_coverage(reference: &BTreeSet<String>, candidate: &BTreeSet<String>) -> f64 {
    if reference.is_empty() || reference.is_disjoint(candidate) {
        return 0.0;
    }
    let matched = reference
        .iter()
        .filter(|r| candidate.iter().any(|c| terms_match(r, c)))
        .count();
    matched as f64 / reference.len() as f64
}

/// Coverage of `topic` terms by `candidate`.
///
/// Terms are keywords. A topic made only of stopwords falls back to all of
/// its words, on both sides, so it still has something to cover.
pub fn topic_coverage(topic: &str, candidate: &str) -> f64 {
    let reference = keywords(topic);
    if reference.is_empty() {
        let all = |text: &str| words(text).into_iter().collect::<BTreeSet<String>>();
        return keyword_coverage(&all(topic), &all(candidate));
    }
    keyword_coverage(&reference, &keywords(candidate))
}

/// Sequence-matching ratio `2 * LCS / (|a| + |b|)` over the characters of
/// the lower-cased, trimmed inputs. Two empty strings are identical (1.0).
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.trim().to_lowercase().chars().collect();
    let b: Vec<char> = b.trim().to_lowercase().chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * lcs_len(&a, &b) as f64 / total as f64
}

/// Longest common subsequence length, two rolling rows.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Truncate to `max` chars, appending `...` when anything was cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max).collect();
    format!("{}...", head)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_words_lowercase_and_split_on_punctuation() {
        assert_eq!(
            words("Should AI be regulated, like medicine?"),
            vec!["should", "ai", "be", "regulated", "like", "medicine"]
        );
    }

    #[test]
    fn test_keywords_strip_stopwords() {
        assert_eq!(
            keywords("Should AI be regulated like medicine?"),
            set(&["ai", "medicine", "regulated"])
        );
    }

    #[test]
    fn test_terms_match_prefix_rule() {
        assert!(terms_match("regulated", "regulation"));
        assert!(terms_match("medicine", "medical"));
        assert!(terms_match("ai", "ai"));
        assert!(!terms_match("media", "medicine"));
        assert!(!terms_match("ai", "aim"));
    }

    #[test]
    fn test_keyword_coverage() {
        let topic = set(&["ai", "medicine", "regulated"]);
        assert_eq!(keyword_coverage(&topic, &topic), 1.0);
        assert_eq!(keyword_coverage(&topic, &set(&["weather", "paris"])), 0.0);
        let partial = keyword_coverage(&topic, &set(&["ai", "regulation"]));
        assert!((partial - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_keyword_coverage_empty_reference() {
        assert_eq!(keyword_coverage(&BTreeSet::new(), &set(&["x"])), 0.0);
        assert_eq!(keyword_coverage(&BTreeSet::new(), &BTreeSet::new()), 0.0);
    }

    #[test]
    fn test_keyword_coverage_needs_an_exact_term() {
        let topic = keywords("Should governments regulate international commerce?");
        let candidate =
            keywords("Governing bodies regularly internationalize commercial disputes.");
        assert!(topic.is_disjoint(&candidate));
        assert_eq!(keyword_coverage(&topic, &candidate), 0.0);

        // One exact term lets the stems count too.
        let anchored = keywords("Governments regularly internationalize commercial disputes.");
        assert_eq!(keyword_coverage(&topic, &anchored), 1.0);
    }

    #[test]
    fn test_topic_coverage_stopword_topic_uses_all_words() {
        let topic = "Should we do this or not?";
        assert!(keywords(topic).is_empty());
        assert_eq!(
            topic_coverage(topic, "Cooking pasta requires salted boiling water."),
            0.0
        );
        assert_eq!(topic_coverage(topic, "We should not do this, or should we?"), 1.0);
        let partial = topic_coverage(topic, "We should do it.");
        assert!((partial - 3.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_topic_coverage_uses_keywords_when_present() {
        let topic = "Should AI be regulated like medicine?";
        assert_eq!(topic_coverage(topic, topic), 1.0);
        assert_eq!(topic_coverage(topic, "Should we, like, be?"), 0.0);
    }

    #[test]
    fn test_sequence_ratio_bounds() {
        assert_eq!(sequence_ratio("same text", "same text"), 1.0);
        assert_eq!(sequence_ratio("  Same Text ", "same text"), 1.0);
        assert_eq!(sequence_ratio("abc", "xyz"), 0.0);
        assert_eq!(sequence_ratio("", ""), 1.0);
        assert_eq!(sequence_ratio("abc", ""), 0.0);
    }

    #[test]
    fn test_sequence_ratio_partial() {
        // LCS("abcd", "abxd") = 3 -> 2*3/8
        assert!((sequence_ratio("abcd", "abxd") - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
    }
}
