// ============================================================
// Layer 4 — Dataset Loader
// ============================================================
// Reads one split of a sentence classification dataset from
// `<data_dir>/<data_name>/<split>.jsonl`.
//
// Every non-empty line is one JSON object:
//
//   {"label": "pos", "text": "a fine pale ale",
//    "rationale": [0, 1, 1, 0],          (optional)
//    "scores":    [0.0, 0.4, 0.9, 0.1],  (optional)
//    "knowledge": [0, 1, 0, -1]}         (optional)
//
// Per-token annotations refer to the whitespace tokens of
// `text`, so their length must match the token count. A
// mismatch is reported with the file and line number.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::preprocessor::Preprocessor;
use crate::domain::error::RationaleError;
use crate::domain::example::Split;

/// One line of a dataset file, before vocabulary lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub label:     String,
    pub text:      String,
    #[serde(default)]
    pub rationale: Option<Vec<f32>>,
    #[serde(default)]
    pub scores:    Option<Vec<f32>>,
    #[serde(default)]
    pub knowledge: Option<Vec<f32>>,
}

/// A record after normalisation and tokenisation, annotations
/// truncated together with the tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizedRecord {
    pub label:     String,
    pub tokens:    Vec<String>,
    pub rationale: Option<Vec<f32>>,
    pub scores:    Option<Vec<f32>>,
    pub knowledge: Option<Vec<f32>>,
}

pub struct JsonlLoader {
    dir:          PathBuf,
    preprocessor: Preprocessor,
    truncate_num: usize,
}

impl JsonlLoader {
    pub fn new(dir: impl Into<PathBuf>, truncate_num: usize) -> Self {
        Self { dir: dir.into(), preprocessor: Preprocessor::new(), truncate_num }
    }

    pub fn split_path(&self, split: Split) -> PathBuf {
        self.dir.join(format!("{}.jsonl", split.file_stem()))
    }

    /// Load and tokenise every record of a split.
    pub fn load_split(&self, split: Split) -> Result<Vec<TokenizedRecord>> {
        let path = self.split_path(split);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read {split} split from '{}'", path.display()))?;

        let records = parse_records(&content, &path)?
            .into_iter()
            .map(|(line_no, raw)| self.tokenize(raw, &path, line_no))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Loaded {} {split} records from '{}'", records.len(), path.display());
        Ok(records)
    }

    fn tokenize(&self, raw: RawRecord, path: &Path, line_no: usize) -> Result<TokenizedRecord, RationaleError> {
        let mut tokens = self.preprocessor.tokenize(&raw.text);
        let full_len = tokens.len();

        let check = |name: &str, values: Option<Vec<f32>>| -> Result<Option<Vec<f32>>, RationaleError> {
            match values {
                Some(v) if v.len() != full_len => Err(RationaleError::Data(format!(
                    "{}:{line_no}: {name} has {} values for {full_len} tokens",
                    path.display(),
                    v.len()
                ))),
                Some(mut v) => {
                    v.truncate(self.truncate_num);
                    Ok(Some(v))
                }
                None => Ok(None),
            }
        };
        let rationale = check("rationale", raw.rationale)?;
        let scores    = check("scores", raw.scores)?;
        let knowledge = check("knowledge", raw.knowledge)?;
        tokens.truncate(self.truncate_num);

        Ok(TokenizedRecord { label: raw.label, tokens, rationale, scores, knowledge })
    }
}

/// Parse a JSON-lines document, skipping blank lines.
/// Returns `(1-based line number, record)` pairs.
pub fn parse_records(content: &str, path: &Path) -> Result<Vec<(usize, RawRecord)>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<RawRecord>(line)
                .map(|record| (i + 1, record))
                .with_context(|| format!("{}:{}: malformed record", path.display(), i + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_split(dir: &Path, split: Split, lines: &[&str]) {
        fs::write(dir.join(format!("{}.jsonl", split.file_stem())), lines.join("\n")).unwrap();
    }

    #[test]
    fn test_loads_records_with_optional_annotations() {
        let tmp = tempfile::tempdir().unwrap();
        write_split(
            tmp.path(),
            Split::Train,
            &[
                r#"{"label": "pos", "text": "A  Fine ale"}"#,
                "",
                r#"{"label": "neg", "text": "flat beer", "rationale": [0, 1], "knowledge": [0, -1]}"#,
            ],
        );

        let records = JsonlLoader::new(tmp.path(), 300).load_split(Split::Train).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tokens, vec!["a", "fine", "ale"]);
        assert!(records[0].rationale.is_none());
        assert_eq!(records[1].label, "neg");
        assert_eq!(records[1].knowledge, Some(vec![0.0, -1.0]));
    }

    #[test]
    fn test_truncation_applies_to_annotations() {
        let tmp = tempfile::tempdir().unwrap();
        write_split(tmp.path(), Split::Dev, &[r#"{"label": "x", "text": "a b c d", "scores": [1, 2, 3, 4]}"#]);

        let records = JsonlLoader::new(tmp.path(), 2).load_split(Split::Dev).unwrap();
        assert_eq!(records[0].tokens, vec!["a", "b"]);
        assert_eq!(records[0].scores, Some(vec![1.0, 2.0]));
    }

    #[test]
    fn test_annotation_length_mismatch_names_the_line() {
        let tmp = tempfile::tempdir().unwrap();
        write_split(
            tmp.path(),
            Split::Test,
            &[
                r#"{"label": "x", "text": "a b"}"#,
                r#"{"label": "x", "text": "a b c", "rationale": [1, 0]}"#,
            ],
        );

        let err = JsonlLoader::new(tmp.path(), 300).load_split(Split::Test).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("test.jsonl:2"), "{msg}");
        assert!(msg.contains("rationale"), "{msg}");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(JsonlLoader::new(tmp.path(), 300).load_split(Split::Train).is_err());
    }
}
