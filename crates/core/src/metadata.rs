//! Post image metadata: the persisted `metadata` JSON contract.
//!
//! A post's metadata is produced once by the structured completion step and
//! stored as JSONB on the post row. Its shape (`banner` + `sectionImages`)
//! is shared with every other component reading the `post` table, so field
//! names here are part of the wire contract and must not be renamed.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::CoreError;

/// Image slugs are lowercase kebab-case. They become path segments of the
/// render cache and of the object key, so nothing else is accepted.
pub const SLUG_PATTERN: &str = r"^[a-z0-9]+(?:-[a-z0-9]+)*$";

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SLUG_PATTERN).expect("valid regex"));

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_RE.is_match(slug)
}

fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if is_valid_slug(slug) {
        return Ok(());
    }
    let mut error = ValidationError::new("slug");
    error.message = Some(format!("'{slug}' is not a kebab-case slug").into());
    Err(error)
}

/// Every descriptor of a post needs its own slug: image records are keyed
/// by `(post_id, slug)`.
fn validate_unique_slugs(metadata: &PostMetadata) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    let slugs = std::iter::once(&metadata.banner.slug)
        .chain(metadata.section_images.iter().map(|image| &image.slug));
    for slug in slugs {
        if !seen.insert(slug.as_str()) {
            let mut error = ValidationError::new("duplicate_slug");
            error.message = Some(format!("Slug '{slug}' is used by more than one image").into());
            return Err(error);
        }
    }
    Ok(())
}

/// Descriptor for the single banner image of a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PostBanner {
    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
    #[validate(length(min = 1))]
    pub alt: String,
    #[validate(length(min = 1))]
    pub prompt: String,
    #[validate(length(min = 1))]
    pub url: String,
}

/// Descriptor for one in-body section image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PostSectionImage {
    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
    #[validate(length(min = 1))]
    pub alt: String,
    #[validate(length(min = 1))]
    pub prompt: String,
    /// Free-text placement hint, e.g. "After the 'Pricing' section".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<String>,
    #[validate(length(min = 1))]
    pub url: String,
}

/// Banner plus zero or more section images for one post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_unique_slugs"))]
pub struct PostMetadata {
    #[validate(nested)]
    pub banner: PostBanner,
    #[serde(default)]
    #[validate(nested)]
    pub section_images: Vec<PostSectionImage>,
}

/// Which slot an image fills in the post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Banner,
    Section,
}

impl ImageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Banner => "banner",
            Self::Section => "section",
        }
    }
}

/// One image that has to be generated and uploaded for a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageWorkItem {
    pub kind: ImageKind,
    pub slug: String,
    pub prompt: String,
    pub url: String,
}

impl PostMetadata {
    /// Parse and validate metadata read back from the database.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CoreError> {
        let metadata: Self = serde_json::from_value(value.clone())
            .map_err(|e| CoreError::Validation(format!("Malformed post metadata: {e}")))?;
        metadata.check()?;
        Ok(metadata)
    }

    /// Run field validation, mapping failures to [`CoreError::Validation`].
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(format!("Invalid post metadata: {e}")))
    }

    /// Flatten the descriptors into work items, banner first.
    pub fn work_items(&self) -> Vec<ImageWorkItem> {
        let banner = ImageWorkItem {
            kind: ImageKind::Banner,
            slug: self.banner.slug.clone(),
            prompt: self.banner.prompt.clone(),
            url: self.banner.url.clone(),
        };

        std::iter::once(banner)
            .chain(self.section_images.iter().map(|image| ImageWorkItem {
                kind: ImageKind::Section,
                slug: image.slug.clone(),
                prompt: image.prompt.clone(),
                url: image.url.clone(),
            }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn sample_json() -> serde_json::Value {
        json!({
            "banner": {
                "slug": "family-budget-banner",
                "alt": "A family planning a monthly budget at the kitchen table",
                "prompt": "Warm kitchen scene, family with notebook",
                "url": "https://assets.postpix.ai/posts/p1/family-budget-banner.png"
            },
            "sectionImages": [
                {
                    "slug": "savings-jar",
                    "alt": "Glass jar filling with coins",
                    "prompt": "Coins dropping into a jar on a windowsill",
                    "placement": "After the 'Saving' section",
                    "url": "https://assets.postpix.ai/posts/p1/savings-jar.png"
                },
                {
                    "slug": "market-visit",
                    "alt": "Shopping at an open-air market",
                    "prompt": "Busy market stalls in morning light",
                    "url": "https://assets.postpix.ai/posts/p1/market-visit.png"
                }
            ]
        })
    }

    #[test]
    fn parses_camel_case_contract() {
        let metadata = PostMetadata::from_json(&sample_json()).unwrap();
        assert_eq!(metadata.banner.slug, "family-budget-banner");
        assert_eq!(metadata.section_images.len(), 2);
        assert_eq!(
            metadata.section_images[0].placement.as_deref(),
            Some("After the 'Saving' section")
        );
        assert!(metadata.section_images[1].placement.is_none());
    }

    #[test]
    fn serializes_section_images_in_camel_case() {
        let metadata = PostMetadata::from_json(&sample_json()).unwrap();
        let value = serde_json::to_value(&metadata).unwrap();
        assert!(value.get("sectionImages").is_some());
        assert!(value.get("section_images").is_none());
    }

    #[test]
    fn missing_section_images_defaults_to_empty() {
        let mut value = sample_json();
        value.as_object_mut().unwrap().remove("sectionImages");
        let metadata = PostMetadata::from_json(&value).unwrap();
        assert!(metadata.section_images.is_empty());
        assert_eq!(metadata.work_items().len(), 1);
    }

    #[test]
    fn empty_slug_fails_validation() {
        let mut value = sample_json();
        value["banner"]["slug"] = json!("");
        assert_matches!(PostMetadata::from_json(&value), Err(CoreError::Validation(_)));
    }

    #[test]
    fn nested_section_image_is_validated() {
        let mut value = sample_json();
        value["sectionImages"][1]["prompt"] = json!("");
        assert_matches!(PostMetadata::from_json(&value), Err(CoreError::Validation(_)));
    }

    #[test]
    fn missing_banner_is_malformed() {
        let value = json!({ "sectionImages": [] });
        assert_matches!(PostMetadata::from_json(&value), Err(CoreError::Validation(msg)) if msg.contains("Malformed"));
    }

    #[test]
    fn slug_that_leaves_its_folder_is_rejected() {
        let mut value = sample_json();
        value["banner"]["slug"] = json!("../../../../escaped");
        assert_matches!(PostMetadata::from_json(&value), Err(CoreError::Validation(_)));
        assert_eq!(validate_slug("../escaped").unwrap_err().code, "slug");
    }

    #[test]
    fn section_slug_must_be_kebab_case() {
        for bad in ["Savings-Jar", "savings_jar", "savings jar", "a/b", "-jar", "jar-", "jar--lid"] {
            let mut value = sample_json();
            value["sectionImages"][0]["slug"] = json!(bad);
            assert_matches!(PostMetadata::from_json(&value), Err(CoreError::Validation(_)), "{bad}");
        }
    }

    #[test]
    fn kebab_case_slugs_are_accepted() {
        assert!(is_valid_slug("savings-jar"));
        assert!(is_valid_slug("step-2-review"));
        assert!(is_valid_slug("banner"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("x.png"));
    }

    #[test]
    fn section_reusing_the_banner_slug_is_rejected() {
        let mut value = sample_json();
        value["sectionImages"][1]["slug"] = json!("family-budget-banner");
        assert_matches!(PostMetadata::from_json(&value), Err(CoreError::Validation(_)));

        let metadata: PostMetadata = serde_json::from_value(value).unwrap();
        assert_eq!(validate_unique_slugs(&metadata).unwrap_err().code, "duplicate_slug");
    }

    #[test]
    fn two_sections_sharing_a_slug_are_rejected() {
        let mut value = sample_json();
        value["sectionImages"][1]["slug"] = json!("savings-jar");
        assert_matches!(PostMetadata::from_json(&value), Err(CoreError::Validation(_)));
    }

    #[test]
    fn work_items_put_banner_first() {
        let metadata = PostMetadata::from_json(&sample_json()).unwrap();
        let items = metadata.work_items();
        let kinds: Vec<_> = items.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, [ImageKind::Banner, ImageKind::Section, ImageKind::Section]);
        assert_eq!(items[2].slug, "market-visit");
    }
}
