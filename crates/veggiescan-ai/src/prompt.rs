use base64::{engine::general_purpose, Engine as _};

use crate::models::{ChatMessage, ContentPart, ImageUrl};

/// Instruction sent with every image. The label names match the keys the
/// normalizer looks for.
pub const SCAN_PROMPT: &str = "You are VeggieScan, an assistant for visual diagnosis of vegetable freshness and contamination. \
Identify the vegetable in the image and always answer in JSON format inside a ```json code block.
If the vegetable is cut or damaged, append \" (Proned to Bacteria)\" to the vegetable name.
If the image does not show a vegetable, use \"invalid_image\" as the vegetable name.
Use exactly these keys:
Vegetable Name:
Safe to Eat: true or false
Disease Name: (null when healthy)
Recommendation:";

/// Best-effort MIME sniffing from magic bytes. Unknown formats are sent as
/// JPEG, which is what phone cameras produce.
pub fn detect_image_mime(image: &[u8]) -> &'static str {
    if image.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if image.len() >= 12 && &image[0..4] == b"RIFF" && &image[8..12] == b"WEBP" {
        "image/webp"
    } else if image.starts_with(b"GIF8") {
        "image/gif"
    } else {
        "image/jpeg"
    }
}

/// Encode the image as a `data:` URL
pub fn image_data_url(image: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        detect_image_mime(image),
        general_purpose::STANDARD.encode(image)
    )
}

/// Single user message carrying the prompt and the image.
pub fn build_scan_messages(image: &[u8]) -> Vec<ChatMessage> {
    vec![ChatMessage {
        role: "user".to_string(),
        content: vec![
            ContentPart::Text {
                text: SCAN_PROMPT.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: image_data_url(image),
                },
            },
        ],
    }]
}
