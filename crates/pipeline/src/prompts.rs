//! Prompt builders for the metadata, placement and image-generation calls.

use postpix_ai::provider::ObjectSchema;
use postpix_core::metadata::SLUG_PATTERN;
use postpix_core::types::DbId;
use serde_json::json;

/// System prompt for the structured call that plans a post's images.
pub fn metadata_system_prompt(ideal_section_images: i32, assets_url: &str) -> String {
    let assets_url = assets_url.trim_end_matches('/');
    format!(
        "You are a content strategist and visual designer who plans imagery for blog posts. \
Plan one banner image and {ideal_section_images} section images for the post you are given.

## Input
- Post ID
- Post Title
- Post Content (markdown)

## Banner
- Carries the post title as prominent overlaid text.
- Captures the main theme and emotional tone of the post.
- Bold, vivid colours suited to social sharing.
- Ghibli-inspired illustration with soft, dreamy lighting.

## Section images
- Each one illustrates a specific section or key point of the post.
- Relatable, practical scenes that support the text rather than distract from it.
- Visually consistent with the banner.

## Fields for every image
- \"slug\": SEO-friendly kebab-case filename without extension (lowercase letters, \
digits and single hyphens only), unique within the post.
- \"alt\": SEO alt text of 60 to 125 characters describing the image.
- \"url\": exactly \"{assets_url}/posts/{{postId}}/{{slug}}.png\".
- \"placement\" (section images): where it goes, e.g. \"After the 'Pricing' section\".
- \"prompt\": a detailed text-to-image prompt naming the style, palette, mood, key \
elements and composition, any text overlay (banner), and people whose cultural \
background matches the post's audience.

Return valid JSON only."
    )
}

pub fn metadata_user_prompt(post_id: DbId, title: Option<&str>, content: &str) -> String {
    format!(
        "Post ID: {post_id}\n\nPost Title: {}\n\nPost Content:\n```markdown\n{content}\n```\n",
        title.unwrap_or_default()
    )
}

/// Schema the metadata response must satisfy.
pub fn metadata_schema() -> ObjectSchema {
    let image = |with_placement: bool| {
        let mut properties = json!({
            "slug": { "type": "string", "pattern": SLUG_PATTERN },
            "alt": { "type": "string" },
            "prompt": { "type": "string" },
            "url": { "type": "string" },
        });
        let mut required = vec!["slug", "alt", "prompt", "url"];
        if with_placement {
            properties["placement"] = json!({ "type": "string" });
            required.push("placement");
        }
        json!({ "type": "object", "properties": properties, "required": required })
    };

    ObjectSchema {
        name: "post_metadata".to_string(),
        schema: json!({
            "type": "object",
            "properties": {
                "banner": image(false),
                "sectionImages": { "type": "array", "items": image(true) },
            },
            "required": ["banner", "sectionImages"],
        }),
    }
}

/// System prompt for embedding the planned images into the markdown.
pub fn placement_system_prompt(ideal_section_images: i32) -> String {
    format!(
        "You are a markdown editor. Insert 1 banner image and {ideal_section_images} section \
images into the blog post you are given, using the metadata provided.

- Put the banner at the very top, before any heading.
- Put each section image where its \"placement\" says.
- Use standard markdown image syntax: ![alt](url).
- Leave a blank line before and after every image.
- Keep all existing formatting and content; only add or update image tags.
- Keep existing images unless they clash with a new placement.

Return only the updated markdown: no code fences, no commentary."
    )
}

pub fn placement_user_prompt(markdown: &str, metadata: &serde_json::Value) -> String {
    format!("Markdown:\n```markdown\n{markdown}\n```\n\nMetadata:\n```json\n{metadata}\n```\n")
}

/// Wrap a planned banner prompt with the house banner style.
pub fn banner_image_prompt(prompt: &str) -> String {
    format!(
        "Create a Studio Ghibli-inspired blog post banner.

{prompt}

Requirements:
- Landscape orientation.
- Soft, dreamy lighting with warm pastel tones.
- Left side: a light, rounded card holding the title text, with some margin from the edge.
- Right side: an illustrated scene relevant to the post.
- Title in bold capitals; subtitle smaller, sentence case, in an accent colour.
- Text must read clearly and feel part of the illustration.
- High resolution, suitable for web and social media."
    )
}

/// Wrap a planned section prompt with the house section style.
pub fn section_image_prompt(prompt: &str) -> String {
    format!(
        "Create a Studio Ghibli-inspired illustration for a blog post section.

{prompt}

Requirements:
- Landscape orientation.
- Gentle, atmospheric lighting.
- Clear visual storytelling that supports the section.
- Harmonious palette consistent with the rest of the post.
- High resolution, professional finish."
    )
}
