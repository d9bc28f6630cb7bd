//! Name handling for untrusted client filenames.
//!
//! # Design
//! - Client filenames are untrusted: only the final path component is ever used.
//! - Staging names are ASCII-only so every filesystem accepts them.
//! - Archive entry names keep Unicode but never carry directories or reserved characters.
//! - Entry collisions are detected case-insensitively and resolved with `-N` suffixes in
//!   arrival order, so the same batch always yields the same names.

use std::collections::HashSet;

const STAGING_COMPONENT_MAX: usize = 64;
const ENTRY_STEM_MAX: usize = 120;
const DEFAULT_STAGING_COMPONENT: &str = "upload";
const DEFAULT_ENTRY_STEM: &str = "image";
const RESERVED_ENTRY_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// Allocator for unique archive entry names within one job.
#[derive(Debug)]
pub struct OutputNames {
    extension: &'static str,
    taken: HashSet<String>,
}

impl OutputNames {
    /// Create an allocator producing names with the given extension (without dot).
    #[must_use]
    pub fn new(extension: &'static str) -> Self {
        Self {
            extension,
            taken: HashSet::new(),
        }
    }

    /// Derive the entry name for `original_name`, disambiguating against earlier allocations.
    pub fn allocate(&mut self, original_name: &str) -> String {
        let stem = entry_stem(original_name);
        let mut candidate = format!("{stem}.{}", self.extension);
        let mut suffix = 0usize;
        while !self.taken.insert(candidate.to_lowercase()) {
            suffix += 1;
            candidate = format!("{stem}-{suffix}.{}", self.extension);
        }
        candidate
    }
}

/// Reduce a client filename to a filesystem-safe ASCII component for staging.
#[must_use]
pub fn staging_component(original_name: &str) -> String {
    let cleaned: String = final_component(original_name)
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        return DEFAULT_STAGING_COMPONENT.to_string();
    }
    let keep = trimmed.len().saturating_sub(STAGING_COMPONENT_MAX);
    trimmed[keep..].to_string()
}

/// Base name used for the archive entry: final component without its extension.
#[must_use]
pub fn entry_stem(original_name: &str) -> String {
    let component = final_component(original_name);
    let stem = match component.rsplit_once('.') {
        Some((stem, _)) if !stem.trim_start_matches('.').is_empty() => stem,
        _ => component,
    };
    let cleaned: String = stem
        .chars()
        .map(|ch| {
            if ch.is_control() || RESERVED_ENTRY_CHARS.contains(&ch) {
                '_'
            } else {
                ch
            }
        })
        .take(ENTRY_STEM_MAX)
        .collect();
    let trimmed = cleaned
        .trim_start_matches(|ch: char| ch == '.' || ch.is_whitespace())
        .trim_end_matches(|ch: char| ch == '.' || ch.is_whitespace());
    if trimmed.is_empty() {
        DEFAULT_ENTRY_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

fn final_component(original_name: &str) -> &str {
    original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_replaces_extension() {
        let mut names = OutputNames::new("webp");
        assert_eq!(names.allocate("holiday.png"), "holiday.webp");
        assert_eq!(names.allocate("scan.final.tiff"), "scan.final.webp");
    }

    #[test]
    fn allocate_disambiguates_shared_base_names() {
        let mut names = OutputNames::new("webp");
        assert_eq!(names.allocate("photo.png"), "photo.webp");
        assert_eq!(names.allocate("photo.jpg"), "photo-1.webp");
        assert_eq!(names.allocate("PHOTO.gif"), "PHOTO-2.webp");
    }

    #[test]
    fn allocate_skips_names_already_taken_by_suffixed_inputs() {
        let mut names = OutputNames::new("webp");
        assert_eq!(names.allocate("photo-1.png"), "photo-1.webp");
        assert_eq!(names.allocate("photo.png"), "photo.webp");
        assert_eq!(names.allocate("photo.jpg"), "photo-2.webp");
    }

    #[test]
    fn entry_stem_strips_directories_and_reserved_characters() {
        assert_eq!(entry_stem("../../etc/passwd.png"), "passwd");
        assert_eq!(entry_stem("C:\\Users\\me\\cat.jpeg"), "cat");
        assert_eq!(entry_stem("what?.png"), "what_");
        assert_eq!(entry_stem("фото.png"), "фото");
        assert_eq!(entry_stem(".hidden"), "hidden");
        assert_eq!(entry_stem(""), "image");
        assert_eq!(entry_stem("..."), "image");
    }

    #[test]
    fn staging_component_is_ascii_and_bounded() {
        assert_eq!(staging_component("my photo (1).png"), "my_photo__1_.png");
        assert_eq!(staging_component("../.."), "upload");
        assert_eq!(staging_component("a/b/фото.png"), "____.png");
        let long = format!("{}.png", "x".repeat(200));
        let component = staging_component(&long);
        assert_eq!(component.len(), 64);
        assert!(component.ends_with(".png"));
    }
}
