//! Inline image attachment for image-bearing documents.

use super::{ContentPart, Document, ImageUrl, Message};
use crate::error::{GearchatError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;
use tracing::debug;

/// Append a single trailing user message carrying every document image.
///
/// Each document with a non-empty image path contributes one image part,
/// encoded as a base64 data URI. With no image-bearing documents the
/// message list is left untouched. Image parts always travel in their own
/// trailing message, never inline with the templated text messages.
pub fn append_image_message(messages: &mut Vec<Message>, documents: &[Document]) -> Result<()> {
    let mut parts = Vec::new();

    for document in documents {
        let Some(path) = document.imagepath.as_deref().filter(|p| !p.is_empty()) else {
            continue;
        };
        parts.push(ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: encode_image_data_uri(path)?,
            },
        });
    }

    if !parts.is_empty() {
        debug!("attaching {} product image(s) to the turn", parts.len());
        messages.push(Message::user_parts(parts));
    }

    Ok(())
}

/// Read an image file and encode it as a data URI.
fn encode_image_data_uri(path: &str) -> Result<String> {
    let bytes = std::fs::read(path)
        .map_err(|e| GearchatError::ResourceNotFound(format!("image {}: {}", path, e)))?;
    Ok(format!(
        "data:{};base64,{}",
        mime_for_path(path),
        STANDARD.encode(bytes)
    ))
}

/// Guess the image MIME type from the file extension. JPEG when unknown.
fn mime_for_path(path: &str) -> &'static str {
    match Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::MessageContent;

    fn doc_with_image(imagepath: Option<String>) -> Document {
        Document {
            id: String::new(),
            title: "Tent".to_string(),
            text: "A tent".to_string(),
            imagepath,
        }
    }

    #[test]
    fn test_no_images_appends_nothing() {
        let mut messages = vec![Message::system("sys")];
        let documents = vec![doc_with_image(None), doc_with_image(Some(String::new()))];

        append_image_message(&mut messages, &documents).unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_multiple_images_one_trailing_message() {
        let dir = tempfile::tempdir().unwrap();
        let img1 = dir.path().join("tent.jpg");
        let img2 = dir.path().join("pack.png");
        std::fs::write(&img1, b"\xff\xd8fakejpeg").unwrap();
        std::fs::write(&img2, b"\x89PNGfake").unwrap();

        let mut messages = vec![Message::system("sys"), Message::user("q")];
        let documents = vec![
            doc_with_image(Some(img1.to_string_lossy().into_owned())),
            doc_with_image(None),
            doc_with_image(Some(img2.to_string_lossy().into_owned())),
        ];

        append_image_message(&mut messages, &documents).unwrap();

        assert_eq!(messages.len(), 3);
        let trailing = messages.last().unwrap();
        let MessageContent::Parts(parts) = &trailing.content else {
            panic!("trailing message should carry content parts");
        };
        assert_eq!(parts.len(), 2);
        let ContentPart::ImageUrl { image_url } = &parts[0] else {
            panic!("expected an image part");
        };
        assert!(image_url.url.starts_with("data:image/jpeg;base64,"));
        let ContentPart::ImageUrl { image_url } = &parts[1] else {
            panic!("expected an image part");
        };
        assert!(image_url.url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_missing_image_is_resource_not_found() {
        let mut messages = Vec::new();
        let documents = vec![doc_with_image(Some("/nonexistent/tent.jpg".to_string()))];

        let err = append_image_message(&mut messages, &documents).unwrap_err();
        assert!(matches!(err, GearchatError::ResourceNotFound(_)));
        assert!(messages.is_empty());
    }

    #[test]
    fn test_mime_guess() {
        assert_eq!(mime_for_path("a/b/photo.PNG"), "image/png");
        assert_eq!(mime_for_path("photo.webp"), "image/webp");
        assert_eq!(mime_for_path("photo"), "image/jpeg");
    }
}
