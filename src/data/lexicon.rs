// ============================================================
// Layer 4 — English Lexicon (stopwords + noun lemmatizer)
// ============================================================
// Two fixed word resources used by the TextNormalizer:
//
//   STOPWORDS  — the 179-word NLTK English stopword list.
//                Checked AFTER punctuation is stripped, so
//                contractions like "don't" arrive as "dont"
//                and are not matched (same as the NLTK setup).
//
//   Lemmatizer — a dictionary-free noun lemmatizer:
//                1. irregular plural table ("children" → "child")
//                2. words that only look plural ("news", "series")
//                3. suffix rules, longest first:
//                     -sses → -ss      -ches → -ch
//                     -shes → -sh      -xes  → -x
//                     -ies  → -y       -men  → -man
//                     C-uses → C-us    (buses, viruses)
//                     -s    → (removed)
//
// A lemma is never empty and never changes when lemmatized
// again, which keeps normalisation idempotent. A token whose
// lemma would be a stopword ("others" → "other") is kept as
// it is.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

pub const STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're",
    "you've", "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he",
    "him", "his", "himself", "she", "she's", "her", "hers", "herself", "it", "it's",
    "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "that'll", "these", "those", "am", "is", "are",
    "was", "were", "be", "been", "being", "have", "has", "had", "having", "do",
    "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or", "because",
    "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below",
    "to", "from", "up", "down", "in", "out", "on", "off", "over", "under", "again",
    "further", "then", "once", "here", "there", "when", "where", "why", "how", "all",
    "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t",
    "can", "will", "just", "don", "don't", "should", "should've", "now", "d", "ll",
    "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't",
    "didn", "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't",
    "haven", "haven't", "isn", "isn't", "ma", "mightn", "mightn't", "mustn",
    "mustn't", "needn", "needn't", "shan", "shan't", "shouldn", "shouldn't",
    "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn", "wouldn't",
];

const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("mice", "mouse"),
    ("lice", "louse"),
    ("geese", "goose"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("oxen", "ox"),
    ("data", "datum"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("wolves", "wolf"),
    ("knives", "knife"),
    ("wives", "wife"),
    ("lives", "life"),
    ("leaves", "leaf"),
    ("halves", "half"),
    ("selves", "self"),
    ("shelves", "shelf"),
    ("thieves", "thief"),
    ("loaves", "loaf"),
    ("calves", "calf"),
];

const INVARIANT_WORDS: &[&str] = &[
    "news", "series", "species", "means", "always", "perhaps", "physics",
    "politics", "economics", "mathematics", "ethics", "athletics", "headquarters",
    "sometimes", "afterwards", "besides", "towards", "whereas", "lens", "chaos",
    "people", "police", "specimen", "abdomen", "omen", "stamen", "regimen",
    "acumen", "semen", "amen", "bitumen", "albumen", "dolmen", "carmen",
];

/// Singular nouns ending in consonant + "use"; their plurals only drop the s.
const USE_NOUNS: &[&str] = &[
    "abuse", "excuse", "fuse", "muse", "ruse", "recluse", "refuse", "misuse",
    "overuse", "reuse", "disuse",
];

/// Suffix rules tried in order; the first match wins.
const SUFFIX_RULES: &[(&str, &str)] = &[
    ("sses", "ss"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("xes", "x"),
    ("ies", "y"),
    ("men", "man"),
    ("uses", "us"),
];

pub fn stopword_set() -> HashSet<&'static str> {
    STOPWORDS.iter().copied().collect()
}

#[derive(Debug, Clone)]
pub struct Lemmatizer {
    irregular: HashMap<&'static str, &'static str>,
    invariant: HashSet<&'static str>,
    use_nouns: HashSet<&'static str>,
    stopwords: HashSet<&'static str>,
}

impl Lemmatizer {
    pub fn new() -> Self {
        Self {
            irregular: IRREGULAR_PLURALS.iter().copied().collect(),
            invariant: INVARIANT_WORDS.iter().copied().collect(),
            use_nouns: USE_NOUNS.iter().copied().collect(),
            stopwords: stopword_set(),
        }
    }

    /// Reduce a lowercase token to its singular noun form.
    pub fn lemmatize<'a>(&self, token: &'a str) -> Cow<'a, str> {
        let lemma = self.singular(token);
        if self.stopwords.contains(lemma.as_ref()) {
            return Cow::Borrowed(token);
        }
        lemma
    }

    fn singular<'a>(&self, token: &'a str) -> Cow<'a, str> {
        if let Some(lemma) = self.irregular.get(token) {
            return Cow::Borrowed(*lemma);
        }
        if self.invariant.contains(token)
            || token.chars().count() <= 3
            || !token.chars().all(char::is_alphabetic)
        {
            return Cow::Borrowed(token);
        }

        for (suffix, replacement) in SUFFIX_RULES {
            if let Some(stem) = token.strip_suffix(suffix) {
                // "ties" → "tie", not "ty": -ies needs a real stem in front
                if *suffix == "ies" && stem.chars().count() < 2 {
                    break;
                }
                // "ramen", "yemen": too short to be a compound of "man"
                if *suffix == "men" && stem.chars().count() < 3 {
                    break;
                }
                if *suffix == "uses" && !self.is_us_plural(stem) {
                    break;
                }
                return Cow::Owned(format!("{stem}{replacement}"));
            }
        }

        if let Some(stem) = token.strip_suffix('s') {
            let keeps_s = stem.ends_with('s') || stem.ends_with('u') || stem.ends_with('i');
            if !keeps_s {
                return Cow::Borrowed(stem);
            }
        }
        Cow::Borrowed(token)
    }

    /// "bus" + "es", "virus" + "es": a consonant before "uses" that is not
    /// the plural of an "-use" noun ("houses", "abuses").
    fn is_us_plural(&self, stem: &str) -> bool {
        let after_consonant = stem
            .chars()
            .last()
            .is_some_and(|c| !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'));
        after_consonant && !self.use_nouns.contains(format!("{stem}use").as_str())
    }
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopword_list_size() {
        assert_eq!(stopword_set().len(), 179);
    }

    #[test]
    fn test_regular_plurals() {
        let l = Lemmatizer::new();
        assert_eq!(l.lemmatize("cats"), "cat");
        assert_eq!(l.lemmatize("boxes"), "box");
        assert_eq!(l.lemmatize("churches"), "church");
        assert_eq!(l.lemmatize("cities"), "city");
        assert_eq!(l.lemmatize("glasses"), "glass");
        assert_eq!(l.lemmatize("firemen"), "fireman");
    }

    #[test]
    fn test_words_that_keep_their_s() {
        let l = Lemmatizer::new();
        for w in ["glass", "bus", "analysis", "news", "series", "gas"] {
            assert_eq!(l.lemmatize(w), w, "{w} should be unchanged");
        }
    }

    #[test]
    fn test_irregular_plurals() {
        let l = Lemmatizer::new();
        assert_eq!(l.lemmatize("children"), "child");
        assert_eq!(l.lemmatize("women"), "woman");
        assert_eq!(l.lemmatize("knives"), "knife");
    }

    #[test]
    fn test_short_ies_words_drop_only_s() {
        let l = Lemmatizer::new();
        assert_eq!(l.lemmatize("ties"), "tie");
        assert_eq!(l.lemmatize("lies"), "lie");
    }

    #[test]
    fn test_lemma_is_fixed_point() {
        let l = Lemmatizer::new();
        for w in [
            "cats", "boxes", "cities", "glasses", "children", "ties", "buses", "knives", "days",
            "others", "houses", "viruses", "ramen", "abuses",
        ] {
            let once = l.lemmatize(w).into_owned();
            let twice = l.lemmatize(&once).into_owned();
            assert_eq!(once, twice, "lemma of {w} is not stable");
            assert!(!once.is_empty());
        }
    }

    #[test]
    fn test_lemma_never_becomes_a_stopword() {
        let l = Lemmatizer::new();
        assert_eq!(l.lemmatize("others"), "others");
        assert_eq!(l.lemmatize("doings"), "doings");
        assert_eq!(l.lemmatize("ones"), "one");
    }

    #[test]
    fn test_us_plurals() {
        let l = Lemmatizer::new();
        assert_eq!(l.lemmatize("buses"), "bus");
        assert_eq!(l.lemmatize("viruses"), "virus");
        assert_eq!(l.lemmatize("campuses"), "campus");
        assert_eq!(l.lemmatize("houses"), "house");
        assert_eq!(l.lemmatize("causes"), "cause");
        assert_eq!(l.lemmatize("abuses"), "abuse");
    }

    #[test]
    fn test_short_men_words_are_not_compounds() {
        let l = Lemmatizer::new();
        assert_eq!(l.lemmatize("ramen"), "ramen");
        assert_eq!(l.lemmatize("yemen"), "yemen");
        assert_eq!(l.lemmatize("fans"), "fan");
        assert_eq!(l.lemmatize("airmen"), "airman");
    }

    #[test]
    fn test_non_alphabetic_tokens_untouched() {
        let l = Lemmatizer::new();
        assert_eq!(l.lemmatize("1990s"), "1990s");
        assert_eq!(l.lemmatize("covid-19s"), "covid-19s");
    }
}
