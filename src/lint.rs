//! Asset budget checks run by the `content-lint` binary before deploys.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::error::LintError;

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "svg"];
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "wav", "aac", "ogg"];

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LintPolicy {
    pub assets: AssetPolicy,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AssetPolicy {
    pub max_image_kb: f64,
    pub max_audio_mb: f64,
    pub require_alt_text: bool,
}

impl LintPolicy {
    pub fn from_json(text: &str, path: &str) -> Result<Self, LintError> {
        serde_json::from_str(text).map_err(|source| LintError::Policy {
            path: path.to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, LintError> {
        let text = fs::read_to_string(path).map_err(|source| LintError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text, &path.display().to_string())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Violation {
    ImageTooLarge { path: PathBuf, kb: f64, limit: f64 },
    AudioTooLarge { path: PathBuf, mb: f64, limit: f64 },
    MissingAlt { id: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::ImageTooLarge { path, kb, limit } => write!(
                f,
                "Image too large: {} ({kb:.1} KB > {limit} KB)",
                path.display()
            ),
            Violation::AudioTooLarge { path, mb, limit } => write!(
                f,
                "Audio too large: {} ({mb:.2} MB > {limit} MB)",
                path.display()
            ),
            Violation::MissingAlt { id } => write!(f, "Missing alt in feelings_items.json id={id}"),
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Size check for one file of `bytes` length. Other extensions pass.
pub fn check_file(policy: &AssetPolicy, path: &Path, bytes: u64) -> Option<Violation> {
    let ext = extension(path)?;
    let size = bytes as f64;
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        let kb = size / 1024.0;
        if kb > policy.max_image_kb {
            return Some(Violation::ImageTooLarge {
                path: path.to_path_buf(),
                kb,
                limit: policy.max_image_kb,
            });
        }
    } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        let mb = size / 1024.0 / 1024.0;
        if mb > policy.max_audio_mb {
            return Some(Violation::AudioTooLarge {
                path: path.to_path_buf(),
                mb,
                limit: policy.max_audio_mb,
            });
        }
    }
    None
}

/// Recursively checks every file under `root`.
pub fn lint_tree(policy: &AssetPolicy, root: &Path) -> Result<Vec<Violation>, LintError> {
    let mut found = Vec::new();
    walk(policy, root, &mut found)?;
    Ok(found)
}

fn walk(policy: &AssetPolicy, dir: &Path, found: &mut Vec<Violation>) -> Result<(), LintError> {
    let io = |source| LintError::Io {
        path: dir.display().to_string(),
        source,
    };
    let mut entries: Vec<_> = fs::read_dir(dir)
        .map_err(io)?
        .collect::<Result<_, _>>()
        .map_err(io)?;
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        let path = entry.path();
        let meta = entry.metadata().map_err(|source| LintError::Io {
            path: path.display().to_string(),
            source,
        })?;
        if meta.is_dir() {
            walk(policy, &path, found)?;
        } else if let Some(v) = check_file(policy, &path, meta.len()) {
            found.push(v);
        }
    }
    Ok(())
}

/// Feelings items with missing or blank `alt`. Unparseable input yields
/// nothing; the content loader reports that separately.
pub fn check_alts(policy: &AssetPolicy, feelings_json: &str) -> Vec<Violation> {
    if !policy.require_alt_text {
        return Vec::new();
    }
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(feelings_json) else {
        return Vec::new();
    };
    items
        .iter()
        .filter(|item| {
            item.get("alt")
                .and_then(Value::as_str)
                .map_or(true, |alt| alt.trim().is_empty())
        })
        .map(|item| Violation::MissingAlt {
            id: match item.get("id") {
                Some(Value::String(id)) => id.clone(),
                Some(other) => other.to_string(),
                None => "undefined".to_string(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> AssetPolicy {
        AssetPolicy {
            max_image_kb: 300.0,
            max_audio_mb: 2.0,
            require_alt_text: true,
        }
    }

    #[test]
    fn size_limits_by_extension() {
        let p = policy();
        assert!(check_file(&p, Path::new("a.PNG"), 300 * 1024).is_none());
        let v = check_file(&p, Path::new("a.PNG"), 400 * 1024).unwrap();
        assert_eq!(v.to_string(), "Image too large: a.PNG (400.0 KB > 300 KB)");
        let v = check_file(&p, Path::new("x/b.m4a"), 3 * 1024 * 1024).unwrap();
        assert_eq!(v.to_string(), "Audio too large: x/b.m4a (3.00 MB > 2 MB)");
        assert!(check_file(&p, Path::new("big.json"), u64::MAX / 2).is_none());
        assert!(check_file(&p, Path::new("noext"), 1 << 30).is_none());
    }

    #[test]
    fn alt_text_required() {
        let json = r#"[{"id":"a","alt":"rain"},{"id":"b","alt":"  "},{"id":"c"}]"#;
        let found: Vec<String> = check_alts(&policy(), json).iter().map(|v| v.to_string()).collect();
        assert_eq!(
            found,
            vec![
                "Missing alt in feelings_items.json id=b",
                "Missing alt in feelings_items.json id=c"
            ]
        );
        let relaxed = AssetPolicy {
            require_alt_text: false,
            ..policy()
        };
        assert!(check_alts(&relaxed, json).is_empty());
        assert!(check_alts(&policy(), "{oops").is_empty());
    }

    #[test]
    fn policy_parses_and_reports_path() {
        let p = LintPolicy::from_json(include_str!("../ops/policy.json"), "ops/policy.json").unwrap();
        assert_eq!(p.assets, policy());
        let err = LintPolicy::from_json("{}", "ops/policy.json").unwrap_err();
        assert!(err.to_string().starts_with("invalid policy file ops/policy.json"));
    }
}
