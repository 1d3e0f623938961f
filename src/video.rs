// src/video.rs
use anyhow::{Context, Result};
use image::DynamicImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;
use tracing::{debug, info, warn};

use crate::config::CameraConfig;

/// Webcam frames, mirrored so on-screen motion matches the user's hand.
pub struct CameraSource {
    camera: Camera,
}

impl CameraSource {
    pub fn open(config: &CameraConfig) -> Result<Self> {
        info!(index = config.index, width = config.width, height = config.height, "opening camera");

        let format = CameraFormat::new(
            Resolution::new(config.width, config.height),
            FrameFormat::MJPEG,
            config.fps,
        );
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format));

        let mut camera = Camera::new(CameraIndex::Index(config.index), requested)
            .with_context(|| format!("failed to open camera {}", config.index))?;
        camera.open_stream().context("failed to open camera stream")?;

        let actual = camera.camera_format();
        info!(
            width = actual.resolution().width(),
            height = actual.resolution().height(),
            fps = actual.frame_rate(),
            "camera stream open"
        );

        Ok(Self { camera })
    }

    pub fn read_frame(&mut self) -> Result<DynamicImage> {
        let frame = self.camera.frame().context("failed to capture frame")?;
        let decoded = frame
            .decode_image::<RgbFormat>()
            .context("failed to decode frame")?;

        Ok(DynamicImage::ImageRgb8(image::imageops::flip_horizontal(&decoded)))
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            warn!(error = %e, "failed to stop camera stream");
        }
    }
}

/// Lists attached cameras as `(index, name)` pairs.
pub fn list_cameras() -> Result<Vec<(String, String)>> {
    let cameras = nokhwa::query(ApiBackend::Auto).context("failed to query cameras")?;
    let listed: Vec<_> = cameras
        .iter()
        .map(|info| (info.index().to_string(), info.human_name()))
        .collect();
    debug!(count = listed.len(), "cameras found");
    Ok(listed)
}
