//! Object-store key and public URL conventions for post images.
//!
//! Generated images live under `posts/{post_id}/{slug}.{ext}` both in the
//! blob store and in the local render cache.

use crate::types::DbId;

/// Extension used when the media type is unknown or the image came from cache.
pub const DEFAULT_IMAGE_EXTENSION: &str = "png";

/// Media type paired with [`DEFAULT_IMAGE_EXTENSION`].
pub const DEFAULT_IMAGE_MEDIA_TYPE: &str = "image/png";

/// Build the object key for a post image.
///
/// # Examples
///
/// ```
/// use postpix_core::naming::post_image_key;
///
/// let id = uuid::Uuid::nil();
/// assert_eq!(
///     post_image_key(id, "market-visit", "webp"),
///     "posts/00000000-0000-0000-0000-000000000000/market-visit.webp",
/// );
/// ```
pub fn post_image_key(post_id: DbId, slug: &str, extension: &str) -> String {
    format!("posts/{post_id}/{slug}.{extension}")
}

/// Join an assets base URL and an object key, tolerating a trailing slash.
pub fn public_url(assets_url: &str, key: &str) -> String {
    format!("{}/{}", assets_url.trim_end_matches('/'), key)
}

/// Image formats the pipeline knows by both extension and media type.
/// The first entry for a media type is its canonical extension.
const IMAGE_FORMATS: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
];

/// Map an image media type to a file extension.
///
/// Unknown types fall back to [`DEFAULT_IMAGE_EXTENSION`].
pub fn extension_for_media_type(media_type: &str) -> &'static str {
    let media_type = if media_type == "image/jpg" {
        "image/jpeg"
    } else {
        media_type
    };
    IMAGE_FORMATS
        .iter()
        .find(|(_, media)| *media == media_type)
        .map_or(DEFAULT_IMAGE_EXTENSION, |&(ext, _)| ext)
}

/// Guess an image media type from the extension of a path or URL.
///
/// Query string and fragment are ignored; unknown extensions fall back to
/// [`DEFAULT_IMAGE_MEDIA_TYPE`].
pub fn media_type_for_path(path: &str) -> &'static str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let Some((_, ext)) = path.rsplit_once('.') else {
        return DEFAULT_IMAGE_MEDIA_TYPE;
    };
    IMAGE_FORMATS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map_or(DEFAULT_IMAGE_MEDIA_TYPE, |&(_, media)| media)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_uses_post_id_and_slug() {
        let id = uuid::Uuid::parse_str("6f1c1f4e-3c0a-4c4e-9d55-0b9f2f2d2a11").unwrap();
        assert_eq!(
            post_image_key(id, "savings-jar", "png"),
            "posts/6f1c1f4e-3c0a-4c4e-9d55-0b9f2f2d2a11/savings-jar.png"
        );
    }

    #[test]
    fn public_url_trims_trailing_slash() {
        assert_eq!(
            public_url("https://assets.postpix.ai/", "posts/a/b.png"),
            "https://assets.postpix.ai/posts/a/b.png"
        );
        assert_eq!(
            public_url("https://assets.postpix.ai", "posts/a/b.png"),
            "https://assets.postpix.ai/posts/a/b.png"
        );
    }

    #[test]
    fn known_media_types_map_to_extensions() {
        assert_eq!(extension_for_media_type("image/png"), "png");
        assert_eq!(extension_for_media_type("image/jpeg"), "jpeg");
        assert_eq!(extension_for_media_type("image/webp"), "webp");
    }

    #[test]
    fn media_type_is_guessed_from_url_extension() {
        assert_eq!(media_type_for_path("https://cdn.test/a/photo.JPG?w=200"), "image/jpeg");
        assert_eq!(media_type_for_path("https://cdn.test/a.webp#top"), "image/webp");
        assert_eq!(media_type_for_path("https://cdn.test/a.gif"), "image/gif");
        assert_eq!(media_type_for_path("https://cdn.test/image"), "image/png");
    }

    #[test]
    fn both_directions_share_one_table() {
        for media in ["image/png", "image/jpeg", "image/webp", "image/gif"] {
            let ext = extension_for_media_type(media);
            assert_eq!(media_type_for_path(&format!("x.{ext}")), media);
        }
        assert_eq!(extension_for_media_type("image/jpg"), "jpeg");
    }

    #[test]
    fn unknown_media_type_falls_back_to_png() {
        assert_eq!(extension_for_media_type("application/octet-stream"), "png");
    }
}
