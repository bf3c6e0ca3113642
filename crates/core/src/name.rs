//! Display-name sanitization and storage-name generation.

use uuid::Uuid;

/// Restrict a client-supplied file name to letters, digits, dot, underscore
/// and hyphen. Every other character becomes a hyphen.
///
/// The sanitized name is used for presentation only (`Content-Disposition`
/// and archive entry names), never for lookup.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Generate a storage file name for an upload.
///
/// The name is a UUIDv7 (millisecond timestamp plus random bits) followed by
/// the sanitized display name, so names sort by upload time and cannot
/// collide across concurrent requests without any cross-request locking.
#[must_use]
pub fn storage_name(display_name: &str) -> String {
    format!("{}_{}", Uuid::now_v7().simple(), sanitize_name(display_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_passes_safe_characters() {
        assert_eq!(sanitize_name("report_v2.final-1.pdf"), "report_v2.final-1.pdf");
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_name("my file (1).txt"), "my-file--1-.txt");
        assert_eq!(sanitize_name("../../etc/passwd"), "..-..-etc-passwd");
        assert_eq!(sanitize_name("résumé.doc"), "r-sum-.doc");
    }

    #[test]
    fn storage_names_are_unique_and_keep_the_display_name() {
        let a = storage_name("notes.txt");
        let b = storage_name("notes.txt");
        assert_ne!(a, b);
        assert!(a.ends_with("_notes.txt"));
        assert!(!a.contains('/'));
    }

    #[test]
    fn storage_names_are_time_ordered() {
        let earlier = storage_name("a.bin");
        std::thread::sleep(std::time::Duration::from_millis(2));
        let later = storage_name("a.bin");
        assert!(earlier < later);
    }
}
