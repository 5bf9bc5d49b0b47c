//! Builds outgoing messages and writes them to the feed.
//!
//! Sends are fire-and-forget with respect to the message list: nothing is
//! returned and nothing is written to the cache. The new message shows up
//! through the next feed snapshot.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tracing::{info, warn};

use chatku_shared::constants::{DEFAULT_IMAGE_MIME, IMAGE_EXTENSION, IMAGE_KEY_SUFFIX_LEN};
use chatku_shared::validation::normalize_message_text;
use chatku_shared::{ChatError, MessageDraft, SubmissionError};

use crate::ports::{DocumentFeed, MediaReader, ObjectStore};

const KEY_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `<prefix>/<unix millis>_<random base-36>.jpg`
pub fn generate_image_key(prefix: &str, now_ms: i64) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..IMAGE_KEY_SUFFIX_LEN)
        .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
        .collect();
    format!(
        "{}/{}_{}.{}",
        prefix.trim_end_matches('/'),
        now_ms,
        suffix,
        IMAGE_EXTENSION
    )
}

#[derive(Clone)]
pub struct Composer {
    feed: Arc<dyn DocumentFeed>,
    objects: Arc<dyn ObjectStore>,
    media: Arc<dyn MediaReader>,
    upload_prefix: String,
}

impl Composer {
    pub fn new(
        feed: Arc<dyn DocumentFeed>,
        objects: Arc<dyn ObjectStore>,
        media: Arc<dyn MediaReader>,
        upload_prefix: impl Into<String>,
    ) -> Self {
        Self {
            feed,
            objects,
            media,
            upload_prefix: upload_prefix.into(),
        }
    }

    /// Send a text message. Blank input is rejected before the feed is
    /// touched; surrounding whitespace is trimmed.
    pub async fn send_text(&self, text: &str, user: &str) -> Result<(), ChatError> {
        let text = normalize_message_text(text)?;

        let id = self
            .feed
            .append(MessageDraft::text(text, user))
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to send message");
                SubmissionError::MessageWrite(e.to_string())
            })?;

        info!(msg_id = %id, user, "Message sent");
        Ok(())
    }

    /// Upload the image behind `local_uri`, then write a message that
    /// points at its public URL.
    ///
    /// If the upload succeeds but the write fails, the uploaded object is
    /// left in place; the key is logged so it can be found later.
    pub async fn send_image(&self, local_uri: &str, user: &str) -> Result<(), ChatError> {
        let url = self.upload_image(local_uri).await?;

        let id = self
            .feed
            .append(MessageDraft::image(url.clone(), user))
            .await
            .map_err(|e| {
                warn!(error = %e, orphaned_url = %url, "Image uploaded but message write failed");
                SubmissionError::ImageMessageWrite(e.to_string())
            })?;

        info!(msg_id = %id, user, "Image message sent");
        Ok(())
    }

    /// Upload a local image and return its public URL.
    pub async fn upload_image(&self, local_uri: &str) -> Result<String, SubmissionError> {
        let data = self.media.read(local_uri).await.map_err(|e| {
            warn!(uri = local_uri, error = %e, "Failed to read local image");
            SubmissionError::ImageRead(e.to_string())
        })?;

        let key = generate_image_key(&self.upload_prefix, Utc::now().timestamp_millis());
        let size = data.len();

        let handle = self
            .objects
            .put(&key, data, DEFAULT_IMAGE_MIME)
            .await
            .map_err(|e| {
                warn!(key = %key, error = %e, "Failed to upload image");
                SubmissionError::ImageUpload(e.to_string())
            })?;

        let url = self.objects.public_url(&handle).await.map_err(|e| {
            warn!(key = %key, error = %e, "Failed to resolve image URL");
            SubmissionError::ImageUpload(e.to_string())
        })?;

        info!(key = %key, size, "Image uploaded");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use bytes::Bytes;
    use chatku_shared::ValidationError;

    use super::*;
    use crate::backend::memory::{MemoryFeed, MemoryObjectStore};

    struct FixedMedia;

    #[async_trait]
    impl MediaReader for FixedMedia {
        async fn read(&self, uri: &str) -> std::io::Result<Bytes> {
            if uri.ends_with("missing.jpg") {
                Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"))
            } else {
                Ok(Bytes::from_static(b"\xff\xd8\xff"))
            }
        }
    }

    fn setup() -> (Arc<MemoryFeed>, Arc<MemoryObjectStore>, Composer) {
        let feed = Arc::new(MemoryFeed::new());
        let objects = Arc::new(MemoryObjectStore::new());
        let composer = Composer::new(
            feed.clone(),
            objects.clone(),
            Arc::new(FixedMedia),
            "chat_images",
        );
        (feed, objects, composer)
    }

    #[test]
    fn image_key_shape() {
        let key = generate_image_key("chat_images/", 1_700_000_000_123);
        let rest = key.strip_prefix("chat_images/1700000000123_").unwrap();
        let suffix = rest.strip_suffix(".jpg").unwrap();
        assert_eq!(suffix.len(), IMAGE_KEY_SUFFIX_LEN);
        assert!(suffix.bytes().all(|b| KEY_ALPHABET.contains(&b)));
    }

    #[tokio::test]
    async fn blank_text_never_reaches_feed() {
        let (feed, _, composer) = setup();
        for input in ["", "   ", "\n\t"] {
            let err = composer.send_text(input, "Ani").await.unwrap_err();
            assert_eq!(err, ChatError::Validation(ValidationError::EmptyMessage));
        }
        assert_eq!(feed.write_attempts(), 0);
    }

    #[tokio::test]
    async fn text_is_trimmed_and_written() {
        let (feed, _, composer) = setup();
        composer.send_text("  halo  ", "Ani").await.unwrap();

        let records = feed.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "halo");
        assert_eq!(records[0].user, "Ani");
        assert!(records[0].image_url.is_none());
    }

    #[tokio::test]
    async fn text_write_failure_is_submission_error() {
        let (feed, _, composer) = setup();
        feed.fail_writes(true);
        let err = composer.send_text("hi", "Ani").await.unwrap_err();
        assert!(matches!(
            err,
            ChatError::Submission(SubmissionError::MessageWrite(_))
        ));
    }

    #[tokio::test]
    async fn image_upload_then_write() {
        let (feed, objects, composer) = setup();
        composer.send_image("file:///tmp/a.jpg", "Ani").await.unwrap();

        let keys = objects.keys();
        assert_eq!(keys.len(), 1);
        let (_, content_type) = objects.get(&keys[0]).unwrap();
        assert_eq!(content_type, "image/jpeg");

        let records = feed.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "");
        assert_eq!(
            records[0].image_url.as_deref(),
            Some(format!("memory://{}", keys[0]).as_str())
        );
    }

    #[tokio::test]
    async fn write_failure_after_upload_leaves_orphan() {
        let (feed, objects, composer) = setup();
        feed.fail_writes(true);

        let err = composer.send_image("file:///tmp/a.jpg", "Ani").await.unwrap_err();
        assert!(matches!(
            err,
            ChatError::Submission(SubmissionError::ImageMessageWrite(_))
        ));
        assert_eq!(objects.keys().len(), 1);
        assert!(feed.records().is_empty());
    }

    #[tokio::test]
    async fn upload_failure_skips_write() {
        let (feed, objects, composer) = setup();
        objects.fail_uploads(true);

        let err = composer.send_image("file:///tmp/a.jpg", "Ani").await.unwrap_err();
        assert!(matches!(
            err,
            ChatError::Submission(SubmissionError::ImageUpload(_))
        ));
        assert_eq!(feed.write_attempts(), 0);
    }

    #[tokio::test]
    async fn unreadable_image_is_submission_error() {
        let (feed, objects, composer) = setup();
        let err = composer
            .send_image("file:///tmp/missing.jpg", "Ani")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ChatError::Submission(SubmissionError::ImageRead(_))
        ));
        assert!(objects.keys().is_empty());
        assert_eq!(feed.write_attempts(), 0);
    }
}
