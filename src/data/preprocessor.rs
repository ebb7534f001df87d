// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Normalises raw review text before vocabulary lookup.
//
//   1. Unicode whitespace variants and control characters → space
//   2. Lowercase
//   3. Split on whitespace
//
// Tokens are never merged or split beyond whitespace, so per-token
// annotations in the dataset stay aligned with the output.

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean a raw string: normalised whitespace, lowercase, single
    /// spaces, trimmed.
    pub fn clean(&self, text: &str) -> String {
        let normalised: String = text
            .chars()
            .map(|c| match c {
                '\t' | '\r' | '\n' => ' ',
                '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
                c if c.is_control() => ' ',
                c => c,
            })
            .collect();

        normalised
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.clean(text).split(' ').filter(|t| !t.is_empty()).map(String::from).collect()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}
