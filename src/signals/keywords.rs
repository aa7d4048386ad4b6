// Unsafe-keyword matcher — the keyword signal.
//
// Matches each configured keyword at the start of a word, case-insensitively,
// so "hate" hits "Hateful" but "kill" does not hit "skill". The raw value is
// the total number of hits across text and hashtags.

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex_lite::Regex;

use super::reading::{SignalKind, SignalReading};
use super::traits::SignalProvider;
use crate::feed::Post;

pub struct KeywordMatcher {
    patterns: Vec<(String, Regex)>,
}

impl KeywordMatcher {
    pub fn new(keywords: &[String]) -> Result<Self> {
        let mut patterns = Vec::with_capacity(keywords.len());
        for kw in keywords {
            let kw = kw.trim().to_lowercase();
            if kw.is_empty() {
                continue;
            }
            let re = Regex::new(&format!(r"(?i)\b{}", regex_lite::escape(&kw)))
                .with_context(|| format!("Invalid keyword pattern {kw:?}"))?;
            patterns.push((kw, re));
        }
        Ok(Self { patterns })
    }

    /// Count hits in `text`. Returns (total hits, distinct keywords matched).
    pub fn scan(&self, text: &str) -> (usize, Vec<String>) {
        let mut total = 0;
        let mut matched = Vec::new();
        for (kw, re) in &self.patterns {
            let hits = re.find_iter(text).count();
            if hits > 0 {
                total += hits;
                matched.push(kw.clone());
            }
        }
        (total, matched)
    }
}

#[async_trait]
impl SignalProvider for KeywordMatcher {
    fn kind(&self) -> SignalKind {
        SignalKind::Keyword
    }

    async fn produce(&self, post: &Post) -> Result<Option<SignalReading>> {
        let (hits, matched) = self.scan(&post.full_text());
        let mut reading = SignalReading::keyword_hits(matched);
        reading.raw_value = hits as f64;
        Ok(Some(reading))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> KeywordMatcher {
        KeywordMatcher::new(&["kill".into(), "hate".into(), "nsfw".into()]).unwrap()
    }

    #[test]
    fn matches_word_prefixes_case_insensitively() {
        let (hits, matched) = matcher().scan("I HATE mondays, hateful weather");
        assert_eq!(hits, 2);
        assert_eq!(matched, vec!["hate".to_string()]);
    }

    #[test]
    fn ignores_keyword_inside_other_words() {
        let (hits, matched) = matcher().scan("great skill on display");
        assert_eq!(hits, 0);
        assert!(matched.is_empty());
    }

    #[test]
    fn counts_hashtags() {
        let (hits, matched) = matcher().scan("pics #nsfw #kill");
        assert_eq!(hits, 2);
        assert_eq!(matched, vec!["kill".to_string(), "nsfw".to_string()]);
    }

    #[test]
    fn blank_keywords_are_skipped() {
        let m = KeywordMatcher::new(&["  ".into(), "kill".into()]).unwrap();
        assert_eq!(m.patterns.len(), 1);
    }

    #[tokio::test]
    async fn produces_reading_for_clean_post() {
        let post = Post {
            post_id: "p1".into(),
            text: "lovely day".into(),
            ..Default::default()
        };
        let reading = matcher().produce(&post).await.unwrap().unwrap();
        assert_eq!(reading.kind, SignalKind::Keyword);
        assert_eq!(reading.raw_value, 0.0);
    }
}
