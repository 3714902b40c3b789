//! Rogue-prompt scan: a static check over the source tree.
//!
//! Walks `.rs` files and flags lines that talk to a model provider directly
//! (a provider `complete`/`stream` call, an HTTP client, a provider
//! endpoint path) outside the allow-listed files. It runs at test/CI time
//! and from `promptward compliance`; it is never on a request path.
//!
//! Test code is out of scope: `tests/` directories are skipped, as is the
//! item under each `#[cfg(test)]` attribute. Code after that item is
//! scanned again.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Directory names never descended into.
const SKIP_DIRS: [&str; 4] = ["target", "tests", "examples", "benches"];

/// Patterns that indicate direct provider access, as `(name, regex)`.
const DEFAULT_PATTERNS: [(&str, &str); 5] = [
    ("provider-complete", r"(\.|::)complete\s*\("),
    ("provider-stream", r"(\.|::)stream\s*\("),
    ("http-client", r"reqwest::"),
    ("openai-endpoint", r"/chat/completions"),
    ("anthropic-endpoint", r"/v1/messages"),
];

/// One offending line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Path relative to the scan root, `/`-separated
    pub path: String,
    /// 1-based line number
    pub line: usize,
    pub pattern: String,
    pub snippet: String,
}

/// Result of a scan, as surfaced in the compliance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    Clean { files_scanned: usize },
    Dirty {
        files_scanned: usize,
        violations: Vec<Violation>,
    },
    NotRun,
}

impl ScanOutcome {
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean { .. })
    }
}

pub struct RogueScanner {
    patterns: Vec<(String, Regex)>,
    allowed_paths: Vec<String>,
}

impl std::fmt::Debug for RogueScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.patterns.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("RogueScanner")
            .field("patterns", &names)
            .field("allowed_paths", &self.allowed_paths)
            .finish()
    }
}

impl RogueScanner {
    /// Scanner with the built-in patterns. `allowed_paths` are path
    /// fragments; a file whose relative path contains one is exempt.
    pub fn new(allowed_paths: Vec<String>) -> Self {
        let patterns = DEFAULT_PATTERNS
            .iter()
            .filter_map(|(name, re)| Regex::new(re).ok().map(|re| (name.to_string(), re)))
            .collect();
        Self {
            patterns,
            allowed_paths,
        }
    }

    /// Add an extra pattern. Fails if the regex does not compile.
    pub fn with_pattern(mut self, name: &str, pattern: &str) -> Result<Self, regex_lite::Error> {
        self.patterns.push((name.to_string(), Regex::new(pattern)?));
        Ok(self)
    }

    fn is_allowed(&self, rel_path: &str) -> bool {
        self.allowed_paths
            .iter()
            .any(|fragment| !fragment.is_empty() && rel_path.contains(fragment.as_str()))
    }

    /// Scan one file's source text.
    pub fn scan_source(&self, rel_path: &str, source: &str) -> Vec<Violation> {
        if self.is_allowed(rel_path) {
            return Vec::new();
        }

        let mut violations = Vec::new();
        let mut test_item: Option<TestItem> = None;
        for (idx, line) in source.lines().enumerate() {
            let trimmed = line.trim_start();
            if let Some(item) = test_item.as_mut() {
                if item.consume(trimmed) {
                    test_item = None;
                }
                continue;
            }
            if let Some(rest) = trimmed.strip_prefix("#[cfg(test)]") {
                let mut item = TestItem::default();
                if !item.consume(rest) {
                    test_item = Some(item);
                }
                continue;
            }
            if trimmed.starts_with("//") {
                continue;
            }
            if let Some((name, _)) = self.patterns.iter().find(|(_, re)| re.is_match(line)) {
                violations.push(Violation {
                    path: rel_path.to_string(),
                    line: idx + 1,
                    pattern: name.clone(),
                    snippet: trimmed.trim_end().to_string(),
                });
            }
        }
        violations
    }

    /// Walk `root` and scan every `.rs` file.
    pub fn scan_dir(&self, root: &Path) -> std::io::Result<ScanOutcome> {
        let mut files = Vec::new();
        collect_rs_files(root, &mut files)?;
        files.sort();

        let mut violations = Vec::new();
        for file in &files {
            let rel = file
                .strip_prefix(root)
                .unwrap_or(file)
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let source = std::fs::read_to_string(file)?;
            violations.extend(self.scan_source(&rel, &source));
        }

        tracing::debug!(
            root = %root.display(),
            files = files.len(),
            violations = violations.len(),
            "Rogue-prompt scan finished"
        );

        Ok(if violations.is_empty() {
            ScanOutcome::Clean {
                files_scanned: files.len(),
            }
        } else {
            ScanOutcome::Dirty {
                files_scanned: files.len(),
                violations,
            }
        })
    }
}

/// Tracks the extent of one `#[cfg(test)]` item, line by line.
///
/// The item ends at a `;` before any block opens (`use`, `mod foo;`) or when
/// its outermost block closes. Braces inside string literals are ignored.
#[derive(Debug, Default)]
struct TestItem {
    depth: usize,
    opened: bool,
    in_string: bool,
}

impl TestItem {
    /// Feed one line; returns true once the item is complete.
    fn consume(&mut self, line: &str) -> bool {
        if !self.in_string && line.starts_with("//") {
            return false;
        }
        let mut chars = line.chars();
        while let Some(c) = chars.next() {
            if self.in_string {
                match c {
                    '\\' => {
                        chars.next();
                    }
                    '"' => self.in_string = false,
                    _ => {}
                }
                continue;
            }
            match c {
                '"' => self.in_string = true,
                '/' if chars.as_str().starts_with('/') => return false,
                '{' => {
                    self.depth += 1;
                    self.opened = true;
                }
                '}' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.opened && self.depth == 0 {
                        return true;
                    }
                }
                ';' if !self.opened && self.depth == 0 => return true,
                _ => {}
            }
        }
        false
    }
}

fn collect_rs_files(dir: &Path, out: &mut Vec<std::path::PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if name.starts_with('.') || SKIP_DIRS.contains(&name.as_ref()) {
                continue;
            }
            collect_rs_files(&path, out)?;
        } else if file_type.is_file() && name.ends_with(".rs") {
            out.push(path);
        }
    }
    Ok(())
}
