//! Filesystem-safe vault names used as mount point basenames.
//!
//! Vault display names are chosen freely by users ("Work (2024)", "a/b",
//! names with tabs or emoji). Before such a name can become part of a path
//! it is normalized:
//!
//! - blank names, `.` and `..` become `_`
//! - every run of whitespace collapses to a single space
//! - every run of control characters or characters that are illegal in file
//!   names on common filesystems (`< > : " / \ | ? *`) collapses to a single `_`

use std::fmt;

/// Characters that are not allowed in file names on at least one of the
/// common desktop filesystems (NTFS, APFS, ext4).
const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replacement for names that cannot be used at all.
const PLACEHOLDER: &str = "_";

/// A normalized, filesystem-legal vault name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MountName(String);

impl MountName {
    /// Normalize a user-facing display name into a mount name.
    pub fn normalize(display_name: &str) -> Self {
        if display_name.trim().is_empty() || display_name == "." || display_name == ".." {
            return Self(PLACEHOLDER.to_string());
        }

        let without_fancy_whitespace = collapse(display_name, char::is_whitespace, ' ');
        Self(collapse(&without_fancy_whitespace, is_reserved, '_'))
    }

    /// The normalized name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MountName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_reserved(c: char) -> bool {
    c.is_control() || RESERVED_CHARS.contains(&c)
}

/// Replace each run of characters matching `matches` with a single `replacement`.
fn collapse(input: &str, matches: impl Fn(char) -> bool, replacement: char) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_run = false;
    for c in input.chars() {
        if matches(c) {
            if !in_run {
                out.push(replacement);
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}
