// ============================================================
// Layer 4: Caption Corpus Loader
// ============================================================
// Reads one persisted caption record per split and normalises
// every caption in place:
//
//   "A DOG runs, fast."
//     → lowercase                 "a dog runs, fast."
//     → strip ' and "             "a dog runs, fast."
//     → drop one trailing period  "a dog runs, fast"
//     → tokenize                  "a dog runs <COMMA>  fast"
//     → trim + collapse spaces    "a dog runs <COMMA> fast"
//     → wrap with markers         "<s> a dog runs <COMMA> fast </s>"
//
// Every token of every normalised caption is appended to a flat
// token list (image order, then caption order, then token order).
// Only the train split's list is used to build the vocabulary.
//
// Reference: serde_json documentation
//            Rust Book §9 (Error Handling)

use std::{fs, path::Path};

use anyhow::{Context, Result};

use crate::data::tokenizer::tokenize;
use crate::domain::caption::{CaptionMap, Split, END_TOKEN, START_TOKEN};

/// Captions of all three splits plus the train token list.
#[derive(Debug, Clone, Default)]
pub struct CaptionCorpus {
    pub train:        CaptionMap,
    pub val:          CaptionMap,
    pub test:         CaptionMap,
    pub train_tokens: Vec<String>,
}

impl CaptionCorpus {
    pub fn split(&self, split: Split) -> &CaptionMap {
        match split {
            Split::Train => &self.train,
            Split::Val   => &self.val,
            Split::Test  => &self.test,
        }
    }
}

/// Load `captions_{train,val,test}.json` from `dir`.
/// The val/test token lists are discarded.
pub fn load_corpus(dir: &Path) -> Result<CaptionCorpus> {
    let (train, train_tokens) = load_split(&dir.join(Split::Train.captions_file()))?;
    let (val, _)              = load_split(&dir.join(Split::Val.captions_file()))?;
    let (test, _)             = load_split(&dir.join(Split::Test.captions_file()))?;

    Ok(CaptionCorpus { train, val, test, train_tokens })
}

/// Read one caption record and normalise it.
/// Returns the normalised captions and the flat token list.
pub fn load_split(path: &Path) -> Result<(CaptionMap, Vec<String>)> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read caption record '{}'", path.display()))?;

    let mut captions: CaptionMap = serde_json::from_str(&json)
        .with_context(|| format!("Malformed caption record '{}'", path.display()))?;

    let mut tokens = Vec::new();

    for image_captions in captions.values_mut() {
        for caption in image_captions.iter_mut() {
            let normalised = normalize_caption(caption);
            tokens.extend(normalised.split_whitespace().map(str::to_string));
            *caption = normalised;
        }
    }

    tracing::info!("Loaded {} image captions from {}", captions.len(), path.display());
    Ok((captions, tokens))
}

/// Normalise one raw caption into its marker-wrapped token string.
pub fn normalize_caption(raw: &str) -> String {
    let mut text: String = raw
        .to_lowercase()
        .chars()
        .filter(|&c| c != '"' && c != '\'')
        .collect();

    if text.ends_with('.') {
        text.pop();
    }

    let collapsed = tokenize(&text).split_whitespace().collect::<Vec<_>>().join(" ");

    format!("{START_TOKEN} {collapsed} {END_TOKEN}")
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_record(dir: &Path, name: &str, json: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(json.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_split_normalises_in_place() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_record(dir.path(), "captions_train.json",
            r#"{"img1": ["A cat.", "A DOG!"]}"#);

        let (captions, tokens) = load_split(&path).unwrap();

        assert_eq!(
            captions["img1"],
            vec!["<s> a cat </s>", "<s> a dog <EXCLAMATION_MARK> </s>"]
        );
        assert_eq!(
            tokens,
            vec!["<s>", "a", "cat", "</s>", "<s>", "a", "dog", "<EXCLAMATION_MARK>", "</s>"]
        );
    }

    #[test]
    fn test_quotes_removed_and_whitespace_collapsed() {
        assert_eq!(
            normalize_caption("  The \"big\"   dog's   ball , red.  "),
            "<s> the big dogs ball <COMMA> red <PERIOD> </s>"
        );
        assert_eq!(normalize_caption("Two dogs play."), "<s> two dogs play </s>");
    }

    #[test]
    fn test_only_one_trailing_period_dropped() {
        assert_eq!(normalize_caption("wait.."), "<s> wait <PERIOD> </s>");
    }

    #[test]
    fn test_empty_caption() {
        let caption = normalize_caption("");
        assert_eq!(caption.split_whitespace().collect::<Vec<_>>(), vec!["<s>", "</s>"]);
    }

    #[test]
    fn test_frequency_order_across_images() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_record(dir.path(), "captions_train.json", r#"{
            "img1": ["a cat", "a a"],
            "img2": ["a cat"],
            "img3": ["a dog"]
        }"#);

        let (_, tokens) = load_split(&path).unwrap();
        assert_eq!(tokens.iter().filter(|t| *t == "a").count(), 5);
        assert_eq!(tokens.iter().filter(|t| *t == "cat").count(), 2);

        let vocab = crate::data::vocabulary::build_vocabulary(&tokens);
        assert!(vocab.index("a").unwrap() < vocab.index("cat").unwrap());
    }

    #[test]
    fn test_images_processed_in_record_order() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_record(dir.path(), "captions_train.json",
            r#"{"zeta": ["cat"], "alpha": ["dog"]}"#);

        let (captions, tokens) = load_split(&path).unwrap();
        assert_eq!(captions.keys().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert_eq!(tokens, vec!["<s>", "cat", "</s>", "<s>", "dog", "</s>"]);

        let vocab = crate::data::vocabulary::build_vocabulary(&tokens);
        assert!(vocab.index("cat").unwrap() < vocab.index("dog").unwrap());
    }

    #[test]
    fn test_missing_record_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_split(&dir.path().join("captions_val.json")).is_err());
    }

    #[test]
    fn test_malformed_record_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_record(dir.path(), "captions_val.json", r#"{"img1": "not a list"}"#);
        assert!(load_split(&path).is_err());
    }

    #[test]
    fn test_load_corpus_keeps_train_tokens_only() {
        let dir = tempfile::tempdir().unwrap();
        write_record(dir.path(), "captions_train.json", r#"{"a": ["one"]}"#);
        write_record(dir.path(), "captions_val.json",   r#"{"b": ["two"]}"#);
        write_record(dir.path(), "captions_test.json",  r#"{"c": ["three"]}"#);

        let corpus = load_corpus(dir.path()).unwrap();
        assert_eq!(corpus.train_tokens, vec!["<s>", "one", "</s>"]);
        assert_eq!(corpus.split(Split::Test)["c"], vec!["<s> three </s>"]);
    }
}
