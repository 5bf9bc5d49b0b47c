//! Picking an image to send, from the camera or the photo library.
//!
//! Every way of not getting an image (user cancelled, permission denied,
//! picker failure, asset without a URI) resolves to `None`. Failures and
//! denials additionally raise an alert through the [`EventSink`].

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use chatku_shared::constants::DEFAULT_IMAGE_MIME;
use chatku_shared::{ImageSource, SelectedImage, UserMessages};

use crate::events::{alert, EventSink};
use crate::ports::{
    CameraPermission, ImagePicker, PickedAsset, PickerOptions, PickerOutcome, SourceChoice,
    SourceChooser,
};

#[derive(Clone)]
pub struct ImageAcquisition {
    chooser: Arc<dyn SourceChooser>,
    picker: Arc<dyn ImagePicker>,
    permission: Arc<dyn CameraPermission>,
    events: Arc<dyn EventSink>,
    strings: Arc<UserMessages>,
    options: PickerOptions,
}

impl ImageAcquisition {
    pub fn new(
        chooser: Arc<dyn SourceChooser>,
        picker: Arc<dyn ImagePicker>,
        permission: Arc<dyn CameraPermission>,
        events: Arc<dyn EventSink>,
        strings: Arc<UserMessages>,
        options: PickerOptions,
    ) -> Self {
        Self {
            chooser,
            picker,
            permission,
            events,
            strings,
            options,
        }
    }

    /// Ask the user where to take the image from, then get it.
    pub async fn acquire(&self) -> Option<SelectedImage> {
        match self.chooser.choose().await {
            SourceChoice::Camera => self.take_photo().await,
            SourceChoice::Library => self.pick_from_library().await,
            SourceChoice::Cancel => {
                debug!("Image source choice cancelled");
                None
            }
        }
    }

    pub async fn pick_from_library(&self) -> Option<SelectedImage> {
        let options = PickerOptions {
            save_to_photos: false,
            ..self.options.clone()
        };
        let outcome = self.picker.launch(ImageSource::Library, &options).await;
        self.resolve(ImageSource::Library, outcome)
    }

    /// Fails closed: no permission, no photo.
    pub async fn take_photo(&self) -> Option<SelectedImage> {
        let granted = match self.permission.request().await {
            Ok(granted) => granted,
            Err(e) => {
                warn!(error = %e, "Camera permission request failed");
                false
            }
        };
        if !granted {
            alert(
                self.events.as_ref(),
                &self.strings.permission_denied_title,
                &self.strings.camera_permission_denied,
            );
            return None;
        }

        let options = PickerOptions {
            save_to_photos: true,
            ..self.options.clone()
        };
        let outcome = self.picker.launch(ImageSource::Camera, &options).await;
        self.resolve(ImageSource::Camera, outcome)
    }

    fn resolve(&self, source: ImageSource, outcome: PickerOutcome) -> Option<SelectedImage> {
        match outcome {
            PickerOutcome::Cancelled => {
                debug!(?source, "Picker cancelled");
                None
            }
            PickerOutcome::Failed { code, message } => {
                warn!(?source, code = %code, message = %message, "Picker error");
                let text = match source {
                    ImageSource::Camera => &self.strings.capture_failed,
                    ImageSource::Library => &self.strings.pick_failed,
                };
                alert(self.events.as_ref(), &self.strings.error_title, text);
                None
            }
            PickerOutcome::Picked(assets) => {
                let now_ms = Utc::now().timestamp_millis();
                assets
                    .into_iter()
                    .next()
                    .and_then(|asset| selected_from_asset(asset, source, now_ms))
            }
        }
    }
}

/// Fill in the picker's gaps: MIME type defaults to JPEG, file name to
/// `image_<ms>.jpg` (library) or `photo_<ms>.jpg` (camera).
fn selected_from_asset(
    asset: PickedAsset,
    source: ImageSource,
    now_ms: i64,
) -> Option<SelectedImage> {
    let uri = asset.uri.filter(|u| !u.is_empty())?;
    let stem = match source {
        ImageSource::Camera => "photo",
        ImageSource::Library => "image",
    };
    Some(SelectedImage {
        uri,
        mime_type: asset
            .mime_type
            .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string()),
        file_name: asset
            .file_name
            .unwrap_or_else(|| format!("{stem}_{now_ms}.jpg")),
    })
}
