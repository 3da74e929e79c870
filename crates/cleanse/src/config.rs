use serde::{Deserialize, Serialize};

/// Cleaning behavior. The defaults reproduce the upstream corpus transform:
/// lowercase, strip everything outside `\w` and `\s`, collapse whitespace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CleanseConfig {
    /// Version folded into every content hash. Bump when the cleaning rules
    /// change so stale hashes are distinguishable.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Apply Unicode NFKC before any other transform.
    #[serde(default = "default_true")]
    pub normalize_unicode: bool,
    /// Lowercase the text.
    #[serde(default = "default_true")]
    pub lowercase: bool,
    /// Treat non-word characters (everything except alphanumerics and `_`)
    /// as delimiters and drop them.
    #[serde(default = "default_true")]
    pub strip_non_word: bool,
}

impl Default for CleanseConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            normalize_unicode: true,
            lowercase: true,
            strip_non_word: true,
        }
    }
}

fn default_version() -> u32 {
    1
}

fn default_true() -> bool {
    true
}
