//! One opened camera and its handle.

use super::config::CameraSettings;
use crate::sdk::{
    AccessMode, CameraSdk, DeviceInfo, FrameInfo, ImageType, SaveImageParams, SdkError,
    SdkResultExt, EXPOSURE_TIME, GAIN, PAYLOAD_SIZE, TRIGGER_MODE, TRIGGER_MODE_OFF,
};

/// How long a single grab may block, in milliseconds.
pub const FRAME_TIMEOUT_MS: u32 = 1000;

/// An opened device owned by the rig.
///
/// The session tracks how far the device got through open and grab so that
/// [`release`](CameraSession::release) only undoes the steps that happened.
#[derive(Debug)]
pub(crate) struct CameraSession<H> {
    key: String,
    serial: String,
    handle: H,
    payload_size: u32,
    opened: bool,
    grabbing: bool,
}

impl<H> CameraSession<H> {
    /// Creates a handle, opens the device and applies `settings`.
    ///
    /// On failure the partially opened device is released before the error
    /// is returned.
    pub(crate) fn open<S>(
        sdk: &S,
        key: &str,
        device: &DeviceInfo,
        settings: &CameraSettings,
    ) -> Result<Self, SdkError>
    where
        S: CameraSdk<Handle = H>,
    {
        let handle = sdk.create_handle(device).op("CreateHandle")?;
        let mut session = CameraSession {
            key: key.to_string(),
            serial: device.serial.clone(),
            handle,
            payload_size: 0,
            opened: false,
            grabbing: false,
        };

        match session.configure(sdk, settings) {
            Ok(()) => Ok(session),
            Err(err) => {
                for failure in session.release(sdk) {
                    tracing::warn!(key, error = %failure, "Cleanup after failed open also failed");
                }
                Err(err)
            }
        }
    }

    fn configure<S>(&mut self, sdk: &S, settings: &CameraSettings) -> Result<(), SdkError>
    where
        S: CameraSdk<Handle = H>,
    {
        sdk.open_device(&self.handle, AccessMode::Exclusive)
            .op("OpenDevice")?;
        self.opened = true;

        sdk.set_enum_value(&self.handle, TRIGGER_MODE, TRIGGER_MODE_OFF)
            .op("SetEnumValue (TriggerMode)")?;

        self.apply_float(sdk, EXPOSURE_TIME, settings.exposure)?;
        self.apply_float(sdk, GAIN, settings.gain)?;

        self.payload_size = sdk
            .get_int_value(&self.handle, PAYLOAD_SIZE)
            .op("Get Payload")?;
        tracing::debug!(key = %self.key, payload = self.payload_size, "Negotiated payload size");
        Ok(())
    }

    /// Writes a float node only if its live value differs.
    fn apply_float<S>(&self, sdk: &S, node: &str, wanted: f32) -> Result<(), SdkError>
    where
        S: CameraSdk<Handle = H>,
    {
        let current = sdk
            .get_float_value(&self.handle, node)
            .op(&format!("GetFloatValue ({node})"))?;
        if current == wanted {
            tracing::debug!(key = %self.key, node, value = current, "Already set, skipping write");
            return Ok(());
        }
        sdk.set_float_value(&self.handle, node, wanted)
            .op(&format!("SetFloatValue ({node})"))?;
        tracing::debug!(key = %self.key, node, from = current, to = wanted, "Updated");
        Ok(())
    }

    pub(crate) fn serial(&self) -> &str {
        &self.serial
    }

    pub(crate) fn payload_size(&self) -> u32 {
        self.payload_size
    }

    pub(crate) fn is_grabbing(&self) -> bool {
        self.grabbing
    }

    /// Grabs one frame and has the SDK encode it as JPEG.
    ///
    /// Acquisition is started on first use and left running.
    pub(crate) fn grab_jpeg<S>(&mut self, sdk: &S, quality: u32) -> Result<(FrameInfo, Vec<u8>), SdkError>
    where
        S: CameraSdk<Handle = H>,
    {
        if !self.grabbing {
            sdk.start_grabbing(&self.handle).op("StartGrabbing")?;
            self.grabbing = true;
        }

        let mut buffer = vec![0u8; self.payload_size as usize];
        let frame = sdk
            .get_one_frame_timeout(&self.handle, &mut buffer, FRAME_TIMEOUT_MS)
            .op("GetOneFrameTimeout")?;

        let params = SaveImageParams {
            data: &buffer,
            frame,
            image_type: ImageType::Jpeg,
            jpeg_quality: quality,
        };
        let jpeg = sdk.encode_image(&self.handle, &params).op("SaveImage")?;
        Ok((frame, jpeg))
    }

    /// Stops grabbing, closes the device and destroys the handle.
    ///
    /// Every step is attempted; failures are returned rather than stopping
    /// the sequence.
    pub(crate) fn release<S>(self, sdk: &S) -> Vec<SdkError>
    where
        S: CameraSdk<Handle = H>,
    {
        let mut failures = Vec::new();
        if self.grabbing {
            if let Err(e) = sdk.stop_grabbing(&self.handle).op("StopGrabbing") {
                failures.push(e);
            }
        }
        if self.opened {
            if let Err(e) = sdk.close_device(&self.handle).op("CloseDevice") {
                failures.push(e);
            }
        }
        if let Err(e) = sdk.destroy_handle(self.handle).op("DestroyHandle") {
            failures.push(e);
        }
        failures
    }
}
