//! Storage key generation
//!
//! Keys look like `<uuid>-<unix millis>-<tag>.<ext>`. The random UUID alone
//! makes keys unique; the timestamp and tag exist for humans reading a
//! bucket listing.

use chrono::Utc;
use uuid::Uuid;

/// Generate a collision-resistant key for an artifact
///
/// Characters outside `[A-Za-z0-9-]` in `tag` are replaced with `-`, and a
/// leading dot on `extension` is ignored.
#[must_use]
pub fn generate_key(tag: &str, extension: &str) -> String {
    format!(
        "{}-{}-{}.{}",
        Uuid::new_v4().simple(),
        Utc::now().timestamp_millis(),
        sanitize(tag),
        extension.trim_start_matches('.'),
    )
}

fn sanitize(tag: &str) -> String {
    let cleaned: String = tag
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect();
    if cleaned.is_empty() {
        "artifact".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn key_carries_tag_and_extension() {
        let key = generate_key("enhanced-front", "png");
        assert!(key.ends_with("-enhanced-front.png"));
    }

    #[test]
    fn leading_dot_is_dropped() {
        assert!(generate_key("video", ".mp4").ends_with("-video.mp4"));
    }

    #[test]
    fn empty_tag_gets_placeholder() {
        assert!(generate_key("", "jpg").ends_with("-artifact.jpg"));
    }

    #[test]
    fn concurrent_keys_never_collide() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| (0..500).map(|_| generate_key("front", "jpg")).collect::<Vec<_>>()))
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for key in handle.join().unwrap() {
                assert!(seen.insert(key), "duplicate key generated");
            }
        }
        assert_eq!(seen.len(), 4000);
    }

    proptest! {
        #[test]
        fn prop_key_is_path_safe(tag in ".{0,24}", ext in "[a-z0-9]{1,4}") {
            let key = generate_key(&tag, &ext);
            let expected_suffix = format!(".{}", ext);
            prop_assert!(key.ends_with(&expected_suffix));
            prop_assert!(!key.contains('/'));
            prop_assert!(key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.'));
        }
    }
}
