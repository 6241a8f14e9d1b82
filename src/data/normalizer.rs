// ============================================================
// Layer 4 — Text Normalizer
// ============================================================
// Turns a raw headline or tweet into the canonical token
// sequence the models are trained on.
//
// Cleaning steps (applied in order):
//   1. Lowercase
//   2. Remove URLs  — "http" or "www." followed by a run of
//                     non-whitespace characters
//   3. Remove HTML  — shortest "<...>" span on a single line
//   4. Remove the punctuation set  . , ! ? ; : " ' ( ) [ ] { } #
//   5. Split on whitespace
//   6. Drop English stopwords
//   7. Lemmatize each surviving token
//   8. Re-join with single spaces
//
// The normalizer holds only immutable lookup tables, so one
// instance can be shared by every thread of the loader's
// worker pool.
//
// Reference: Rust Book §8 (Strings in Rust)
//            Rust Book §13 (Iterators)

use std::collections::HashSet;

use crate::data::lexicon::{stopword_set, Lemmatizer};

const PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', ';', ':', '"', '\'', '(', ')', '[', ']', '{', '}', '#',
];

#[derive(Debug, Clone)]
pub struct TextNormalizer {
    stopwords:  HashSet<&'static str>,
    lemmatizer: Lemmatizer,
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self {
            stopwords:  stopword_set(),
            lemmatizer: Lemmatizer::new(),
        }
    }

    /// Normalise one string. Empty in, empty out.
    pub fn normalize(&self, text: &str) -> String {
        // ── Steps 1-4: character-level cleanup ────────────────────────────────
        let lowered  = text.to_lowercase();
        let no_urls  = strip_urls(&lowered);
        let no_html  = strip_html(&no_urls);
        let stripped: String = no_html
            .chars()
            .filter(|c| !PUNCTUATION.contains(c))
            .collect();

        // ── Steps 5-8: token-level cleanup ────────────────────────────────────
        stripped
            .split_whitespace()
            .filter(|tok| !self.stopwords.contains(tok))
            .map(|tok| self.lemmatizer.lemmatize(tok))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Remove `http\S+` and `www\.\S+` runs.
fn strip_urls(text: &str) -> String {
    let mut out  = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        let prefix = if rest.starts_with("http") {
            Some("http")
        } else if rest.starts_with("www.") {
            Some("www.")
        } else {
            None
        };

        if let Some(prefix) = prefix {
            let tail = &rest[prefix.len()..];
            let run  = tail.find(char::is_whitespace).unwrap_or(tail.len());
            // the pattern needs at least one non-space character after the prefix
            if run > 0 {
                rest = &tail[run..];
                continue;
            }
        }

        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Remove `<.*?>` spans; `.` does not cross a newline.
fn strip_html(text: &str) -> String {
    let mut out  = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let line_end = after.find('\n').unwrap_or(after.len());
        match after[..line_end].find('>') {
            Some(close) => rest = &after[close + 1..],
            None => {
                out.push('<');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_example() {
        let n = TextNormalizer::new();
        assert_eq!(n.normalize("Check this out!! http://x.co #wow"), "check wow");
    }

    #[test]
    fn test_empty_string() {
        let n = TextNormalizer::new();
        assert_eq!(n.normalize(""), "");
        assert_eq!(n.normalize("   "), "");
    }

    #[test]
    fn test_only_stopwords_yields_empty() {
        let n = TextNormalizer::new();
        assert_eq!(n.normalize("This is what they were doing"), "");
    }

    #[test]
    fn test_strips_www_and_html() {
        let n = TextNormalizer::new();
        assert_eq!(
            n.normalize("<b>Senators</b> debate www.example.com/path budgets"),
            "senator debate budget"
        );
    }

    #[test]
    fn test_bare_http_word_is_not_a_url() {
        assert_eq!(strip_urls("http is a protocol"), "http is a protocol");
        assert_eq!(strip_urls("see https://a.b/c now"), "see  now");
    }

    #[test]
    fn test_unclosed_tag_is_kept() {
        assert_eq!(strip_html("a < b and c"), "a < b and c");
        assert_eq!(strip_html("x<i>y</i>z"), "xyz");
        assert_eq!(strip_html("a <b\nc> d"), "a <b\nc> d");
    }

    #[test]
    fn test_collapses_whitespace() {
        let n = TextNormalizer::new();
        assert_eq!(n.normalize("  local   man\twins \n lottery  "), "local man win lottery");
    }

    #[test]
    fn test_idempotent_on_normalized_text() {
        let n = TextNormalizer::new();
        let inputs = [
            "Check this out!! http://x.co #wow",
            "Area Man Passionate Defender Of What He Imagines Constitution To Be",
            "thirtysomething scientists unveil doomsday clock of hair loss",
            "<p>Boxes of puppies & kittens delivered to cities</p>",
            "nation's leaders agree: churches, buses and glasses matter",
            "Others cheer as ramen fans crowd buses",
        ];
        for input in inputs {
            let once  = n.normalize(input);
            let twice = n.normalize(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_lemmas_do_not_turn_into_stopwords() {
        let n = TextNormalizer::new();
        assert_eq!(n.normalize("Others cheer as ramen fans crowd buses"), "others cheer ramen fan crowd bus");
    }

    #[test]
    fn test_preserves_token_count_without_stopwords() {
        let n = TextNormalizer::new();
        let input = "senators debate budget cuts amid protests";
        let out   = n.normalize(input);
        assert_eq!(
            out.split_whitespace().count(),
            input.split_whitespace().count()
        );
        assert_eq!(out, "senator debate budget cut amid protest");
    }
}
