//! SEO alt text and filename for an existing image.

use base64::Engine;

use crate::completion::{Completion, CompletionError};
use crate::message::{ContentPart, Examples};

const ALT_SYSTEM_PROMPT: &str = "You write SEO-friendly image descriptions. \
Output only the description, no other text.";

const ALT_USER_PROMPT: &str = "Provide a concise SEO \"alt\" text for this image.";

const FILENAME_SYSTEM_PROMPT: &str = "You turn image descriptions into SEO-friendly \
filenames: lowercase, hyphen-separated, at most five words, including a file extension \
such as .png or .jpg. Output only the filename, no other text.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescription {
    pub filename: String,
    pub alt: String,
}

/// Describe an image given as a URL or `data:` URL.
///
/// The alt text comes from a multi-part (text + image) completion; the
/// filename is then derived from the alt text alone.
pub async fn describe_image(
    completion: &Completion,
    image: &str,
) -> Result<ImageDescription, CompletionError> {
    let examples = Examples::new();

    let alt = completion
        .generate_text(
            ALT_SYSTEM_PROMPT,
            &examples,
            vec![ContentPart::text(ALT_USER_PROMPT), ContentPart::image(image)],
        )
        .await?;

    let filename = completion
        .generate_text(FILENAME_SYSTEM_PROMPT, &examples, alt.as_str())
        .await?;

    Ok(ImageDescription {
        filename: filename.trim().to_string(),
        alt: alt.trim().to_string(),
    })
}

/// Encode image bytes as a `data:image/<ext>;base64,...` URL.
///
/// The extension may be given with or without its leading dot.
pub fn image_to_data_url(bytes: &[u8], extension: &str) -> String {
    let subtype = extension.trim_start_matches('.');
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:image/{subtype};base64,{encoded}")
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::message::{parse_data_url, ChatRequest, UserContent};
    use crate::provider::{ChatProvider, ProviderError};

    #[test]
    fn data_url_strips_leading_dot() {
        assert_eq!(image_to_data_url(b"hi", ".png"), "data:image/png;base64,aGk=");
        assert_eq!(image_to_data_url(b"hi", "webp"), "data:image/webp;base64,aGk=");
        assert_eq!(
            parse_data_url(&image_to_data_url(b"hi", "png")),
            Some(("image/png", "aGk="))
        );
    }

    /// Records the final user content of every request.
    struct Recorder {
        seen: Mutex<Vec<UserContent>>,
    }

    #[async_trait]
    impl ChatProvider for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn generate_text(&self, request: &ChatRequest) -> Result<String, ProviderError> {
            let last = request.messages.last().map(|m| m.content.clone());
            let mut seen = self.seen.lock().unwrap();
            seen.extend(last);
            Ok(if seen.len() == 1 {
                " Kids flying a kite on a hill \n".to_string()
            } else {
                "kids-flying-kite.png".to_string()
            })
        }
    }

    #[tokio::test]
    async fn alt_text_feeds_filename_request() {
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let completion = Completion::new(vec![recorder.clone() as Arc<dyn ChatProvider>], vec![]);

        let description = describe_image(&completion, "data:image/png;base64,AAAA")
            .await
            .unwrap();

        assert_eq!(description.alt, "Kids flying a kite on a hill");
        assert_eq!(description.filename, "kids-flying-kite.png");

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(
            seen[0],
            UserContent::Parts(vec![
                ContentPart::text(ALT_USER_PROMPT),
                ContentPart::image("data:image/png;base64,AAAA"),
            ])
        );
        // Untrimmed reply is what the provider returned and is passed on as-is.
        assert_eq!(seen[1], UserContent::Text(" Kids flying a kite on a hill \n".into()));
    }
}
