//! Chinese word segmentation for catalog text and queries.
//!
//! The catalog language has no whitespace word boundaries, so both the
//! vectorizer and the hybrid rescoring signal depend on jieba-style
//! segmentation. Segmentation is deterministic for identical input and
//! never fails: degenerate input yields an empty token list.

use jieba_rs::Jieba;
use std::collections::HashSet;

/// Word segmenter over the embedded jieba dictionary.
///
/// Construction loads the dictionary once; share one instance (behind an
/// `Arc`) between the vectorizer and the engine.
pub struct Segmenter {
    jieba: Jieba,
}

impl std::fmt::Debug for Segmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segmenter").finish_non_exhaustive()
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmenter {
    /// Create a segmenter with the default dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self {
            jieba: Jieba::new(),
        }
    }

    /// Split text into word-like tokens, in input order, duplicates kept.
    ///
    /// Lowercasing is the caller's responsibility where case matters.
    #[must_use]
    pub fn cut(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        self.jieba
            .cut(text, true)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Tokenize into a set of distinct tokens, dropping pure whitespace.
    ///
    /// Set semantics are intentional for overlap scoring: it measures topic
    /// overlap, not term frequency.
    #[must_use]
    pub fn token_set(&self, text: &str) -> HashSet<String> {
        self.cut(text)
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cut_chinese_text() {
        let seg = Segmenter::new();
        let tokens = seg.cut("故宫博物院收藏青铜器");
        assert!(!tokens.is_empty());
        // Round-trips without losing characters
        assert_eq!(tokens.concat(), "故宫博物院收藏青铜器");
    }

    #[test]
    fn test_cut_is_deterministic() {
        let seg = Segmenter::new();
        let a = seg.cut("商代青铜鼎，饕餮纹饰");
        let b = seg.cut("商代青铜鼎，饕餮纹饰");
        assert_eq!(a, b);
    }

    #[test]
    fn test_cut_degenerate_input() {
        let seg = Segmenter::new();
        assert!(seg.cut("").is_empty());
    }

    #[test]
    fn test_token_set_collapses_duplicates() {
        let seg = Segmenter::new();
        let set = seg.token_set("玉璧 玉璧 玉璧");
        assert!(set.contains("玉璧"));
        // Whitespace tokens dropped, duplicates collapsed
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_mixed_script_input() {
        let seg = Segmenter::new();
        let set = seg.token_set("汉代 jade 玉器");
        assert!(set.contains("jade"));
        assert!(set.contains("玉器"));
    }
}
