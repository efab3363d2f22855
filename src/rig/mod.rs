//! Configuration-bound multi-camera rig.
//!
//! [`CameraRig`] ties a [`RigConfig`] to the devices the SDK enumerates.
//! Each configured camera key owns one session holding the SDK handle; the
//! sessions are released by [`CameraRig::shutdown`] or, failing that, when
//! the rig is dropped.

mod config;
mod session;

pub use config::{CameraSettings, ConfigError, ConfigFormat, RigConfig};
pub use session::FRAME_TIMEOUT_MS;

use crate::sdk::{CameraSdk, DeviceInfo, SdkError, SdkResultExt, TransportLayers};
use session::CameraSession;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while opening cameras or saving images.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sdk(#[from] SdkError),
    #[error("Find {found} / {configured} devices!")]
    DeviceCountMismatch { found: usize, configured: usize },
    #[error("No such serial number in config {0}")]
    UnknownSerial(String),
    #[error("serial number {0} was reported by more than one device")]
    DuplicateDevice(String),
    #[error("Wrong camera key {0}")]
    UnknownCamera(String),
    #[error("camera {0} has not been opened")]
    NotOpened(String),
    #[error("devices are already open")]
    AlreadyOpen,
    #[error("Wrong path {}", .0.display())]
    InvalidDestination(PathBuf),
    #[error("JPEG quality {0} is outside 0..=100")]
    InvalidQuality(u32),
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A camera that could not be fully released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseFailure {
    /// Camera key.
    pub key: String,
    /// The failed step.
    pub error: SdkError,
}

/// Every release step that failed during shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownError {
    /// Failures in the order they happened.
    pub failures: Vec<CloseFailure>,
}

impl fmt::Display for ShutdownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} shutdown step(s) failed", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {}: {}", failure.key, failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ShutdownError {}

/// JPEG quality, 0 to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct JpegQuality(u8);

impl JpegQuality {
    /// Highest accepted quality.
    pub const MAX: u32 = 100;

    /// Validates `quality`.
    pub fn new(quality: u32) -> Result<Self, CameraError> {
        if quality > Self::MAX {
            return Err(CameraError::InvalidQuality(quality));
        }
        Ok(JpegQuality(quality as u8))
    }

    /// The quality value.
    #[inline]
    pub fn get(self) -> u32 {
        u32::from(self.0)
    }
}

impl Default for JpegQuality {
    fn default() -> Self {
        JpegQuality(90)
    }
}

impl TryFrom<u32> for JpegQuality {
    type Error = CameraError;

    fn try_from(quality: u32) -> Result<Self, Self::Error> {
        Self::new(quality)
    }
}

/// Outcome of [`CameraRig::save_image`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    pub key: String,
    pub path: PathBuf,
    /// Size of the written JPEG.
    pub bytes: usize,
    pub width: u16,
    pub height: u16,
    /// Device frame counter of the grabbed frame.
    pub frame_num: u32,
    /// Whether an existing file was replaced.
    pub overwritten: bool,
}

/// Lists GigE and USB3 devices.
pub fn enumerate<S: CameraSdk>(sdk: &S) -> Result<Vec<DeviceInfo>, SdkError> {
    sdk.enum_devices(TransportLayers::GIGE_AND_USB)
        .op("EnumDevices")
}

/// Cameras matched by serial number to a configuration.
pub struct CameraRig<S: CameraSdk> {
    sdk: S,
    config: RigConfig,
    devices: Vec<DeviceInfo>,
    sessions: BTreeMap<String, CameraSession<S::Handle>>,
}

impl<S: CameraSdk> CameraRig<S> {
    /// Loads `path` and binds it to the devices `sdk` enumerates.
    pub fn from_config_file(sdk: S, path: impl AsRef<Path>) -> Result<Self, CameraError> {
        // Loading already validates.
        let config = RigConfig::from_file(path)?;
        Self::bind(sdk, config)
    }

    /// Binds `config` to the enumerated devices.
    ///
    /// The config is validated first, since one built in code has not been
    /// checked. Fails unless exactly as many devices are present as are
    /// configured.
    pub fn new(sdk: S, config: RigConfig) -> Result<Self, CameraError> {
        config.validate()?;
        Self::bind(sdk, config)
    }

    fn bind(sdk: S, config: RigConfig) -> Result<Self, CameraError> {
        let devices = enumerate(&sdk)?;
        if devices.len() != config.len() {
            return Err(CameraError::DeviceCountMismatch {
                found: devices.len(),
                configured: config.len(),
            });
        }
        tracing::info!(devices = devices.len(), "Found all configured devices");
        Ok(Self {
            sdk,
            config,
            devices,
            sessions: BTreeMap::new(),
        })
    }

    /// The loaded configuration.
    pub fn config(&self) -> &RigConfig {
        &self.config
    }

    /// Devices found at construction.
    pub fn devices(&self) -> &[DeviceInfo] {
        &self.devices
    }

    /// The underlying SDK.
    pub fn sdk(&self) -> &S {
        &self.sdk
    }

    /// Returns true if the camera `key` is open.
    pub fn is_open(&self, key: &str) -> bool {
        self.sessions.contains_key(key)
    }

    /// Returns true if the camera `key` is acquiring frames.
    pub fn is_grabbing(&self, key: &str) -> bool {
        self.sessions.get(key).is_some_and(|s| s.is_grabbing())
    }

    /// Raw frame size negotiated for `key`.
    pub fn payload_size(&self, key: &str) -> Option<u32> {
        self.sessions.get(key).map(|s| s.payload_size())
    }

    /// Pairs each enumerated device with its camera key.
    fn plan(&self) -> Result<Vec<(String, usize)>, CameraError> {
        let mut seen = HashSet::new();
        let mut plan = Vec::with_capacity(self.devices.len());
        for (position, device) in self.devices.iter().enumerate() {
            let key = self
                .config
                .key_for_serial(&device.serial)
                .ok_or_else(|| CameraError::UnknownSerial(device.serial.clone()))?;
            if !seen.insert(device.serial.as_str()) {
                return Err(CameraError::DuplicateDevice(device.serial.clone()));
            }
            plan.push((key.to_string(), position));
        }
        Ok(plan)
    }

    /// Opens every device and applies its configured settings.
    ///
    /// Each device is opened exclusively with trigger mode off. Exposure and
    /// gain are only written when the live value differs.
    ///
    /// After a failure the cameras opened so far stay open; calling this
    /// again opens only the remaining ones.
    pub fn open_devices(&mut self) -> Result<(), CameraError> {
        if !self.sessions.is_empty() && self.sessions.len() == self.config.len() {
            return Err(CameraError::AlreadyOpen);
        }
        for (key, position) in self.plan()? {
            if self.sessions.contains_key(&key) {
                continue;
            }
            let device = &self.devices[position];
            let settings = self
                .config
                .get(&key)
                .ok_or_else(|| CameraError::UnknownCamera(key.clone()))?;
            tracing::info!(
                serial = %device.serial,
                model = %device.model,
                transport = %device.transport,
                "Opening {} as a {}",
                device.serial,
                key
            );
            let session = CameraSession::open(&self.sdk, &key, device, settings)?;
            self.sessions.insert(key, session);
        }
        Ok(())
    }

    /// Grabs one frame from `key` and writes it to `path` as JPEG.
    pub fn save_image(
        &mut self,
        key: &str,
        path: impl AsRef<Path>,
        quality: JpegQuality,
    ) -> Result<SavedImage, CameraError> {
        let path = path.as_ref();
        if !self.config.contains_key(key) {
            return Err(CameraError::UnknownCamera(key.to_string()));
        }
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !dir.is_dir() {
            return Err(CameraError::InvalidDestination(path.to_path_buf()));
        }
        let overwritten = path.is_file();
        if overwritten {
            tracing::warn!("{} will be overwritten", path.display());
        }

        let session = self
            .sessions
            .get_mut(key)
            .ok_or_else(|| CameraError::NotOpened(key.to_string()))?;
        let (frame, jpeg) = session.grab_jpeg(&self.sdk, quality.get())?;

        std::fs::write(path, &jpeg).map_err(|source| CameraError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(
            serial = %session.serial(),
            bytes = jpeg.len(),
            frame = frame.frame_num,
            "Saved photo of {} to '{}' successfully.",
            key,
            path.display()
        );

        Ok(SavedImage {
            key: key.to_string(),
            path: path.to_path_buf(),
            bytes: jpeg.len(),
            width: frame.width,
            height: frame.height,
            frame_num: frame.frame_num,
            overwritten,
        })
    }

    /// Releases every open camera.
    ///
    /// All cameras are attempted even if some fail; failures are logged and
    /// returned together.
    pub fn close_all(&mut self) -> Result<(), ShutdownError> {
        if self.sessions.is_empty() {
            return Ok(());
        }
        tracing::info!("Closing all cameras...");
        let mut failures = Vec::new();
        for (key, session) in std::mem::take(&mut self.sessions) {
            for error in session.release(&self.sdk) {
                tracing::error!(key = %key, "{error}");
                failures.push(CloseFailure {
                    key: key.clone(),
                    error,
                });
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ShutdownError { failures })
        }
    }

    /// Releases every open camera and consumes the rig.
    pub fn shutdown(mut self) -> Result<(), ShutdownError> {
        self.close_all()
    }
}

impl<S: CameraSdk> Drop for CameraRig<S> {
    fn drop(&mut self) {
        if self.sessions.is_empty() {
            return;
        }
        tracing::warn!(
            cameras = self.sessions.len(),
            "Rig dropped with open cameras, releasing"
        );
        if let Err(e) = self.close_all() {
            tracing::error!("Release on drop incomplete: {e}");
        }
    }
}

impl<S: CameraSdk> fmt::Debug for CameraRig<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraRig")
            .field("config", &self.config)
            .field("devices", &self.devices)
            .field("open", &self.sessions.keys().collect::<Vec<_>>())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::{AccessMode, ErrorCode, MockDevice, MockSdk, SdkCall, SdkOp, TransportLayer};

    fn three_cameras() -> RigConfig {
        RigConfig::new()
            .with_camera("topCamera", CameraSettings::new("DA0001", 20000.0, 5.0))
            .with_camera("leftCamera", CameraSettings::new("DA0002", 15000.0, 0.0))
            .with_camera("rightCamera", CameraSettings::new("DA0003", 15000.0, 0.0))
    }

    fn matching_sdk() -> MockSdk {
        MockSdk::with_devices([
            MockDevice::new("DA0001"),
            MockDevice::new("DA0002").with_exposure(15000.0),
            MockDevice::new("DA0003").with_transport(TransportLayer::GigE),
        ])
    }

    fn opened_rig() -> (MockSdk, CameraRig<MockSdk>) {
        let sdk = matching_sdk();
        let mut rig = CameraRig::new(sdk.clone(), three_cameras()).unwrap();
        rig.open_devices().unwrap();
        (sdk, rig)
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = CameraRig::from_config_file(matching_sdk(), dir.path().join("config.json"));
        assert!(matches!(
            result,
            Err(CameraError::Config(ConfigError::NotFound(_)))
        ));
    }

    #[test]
    fn test_config_file_round_trip_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "topCamera":   { "serial": "DA0001", "exposure": "20000", "gain": "5" },
                "leftCamera":  { "serial": "DA0002", "exposure": "15000", "gain": "0" },
                "rightCamera": { "serial": "DA0003", "exposure": "15000", "gain": "0" }
            }"#,
        )
        .unwrap();
        let mut rig = CameraRig::from_config_file(matching_sdk(), &path).unwrap();
        rig.open_devices().unwrap();
        assert!(rig.is_open("topCamera"));
        assert!(rig.is_open("rightCamera"));
    }

    #[test]
    fn test_device_count_mismatch() {
        let sdk = MockSdk::with_devices([MockDevice::new("DA0001"), MockDevice::new("DA0002")]);
        let err = CameraRig::new(sdk, three_cameras()).unwrap_err();
        assert!(matches!(
            err,
            CameraError::DeviceCountMismatch {
                found: 2,
                configured: 3
            }
        ));
        assert_eq!(err.to_string(), "Find 2 / 3 devices!");
    }

    #[test]
    fn test_unknown_serial_aborts_before_opening() {
        let sdk = MockSdk::with_devices([
            MockDevice::new("DA0001"),
            MockDevice::new("DA0002"),
            MockDevice::new("XX9999"),
        ]);
        let mut rig = CameraRig::new(sdk.clone(), three_cameras()).unwrap();
        let err = rig.open_devices().unwrap_err();
        assert!(matches!(err, CameraError::UnknownSerial(ref s) if s == "XX9999"));
        assert_eq!(err.to_string(), "No such serial number in config XX9999");
        assert_eq!(sdk.count(SdkOp::CreateHandle), 0);
        assert_eq!(sdk.live_handles(), 0);
    }

    #[test]
    fn test_open_sequence_for_one_device() {
        let (sdk, _rig) = opened_rig();
        let ops: Vec<SdkOp> = sdk
            .calls()
            .iter()
            .filter(|c| c.serial() == Some("DA0001"))
            .map(SdkCall::op)
            .collect();
        assert_eq!(
            ops,
            vec![
                SdkOp::CreateHandle,
                SdkOp::OpenDevice,
                SdkOp::SetEnumValue,
                SdkOp::GetFloatValue,
                SdkOp::SetFloatValue,
                SdkOp::GetFloatValue,
                SdkOp::SetFloatValue,
                SdkOp::GetIntValue,
            ]
        );
        assert!(sdk.calls().contains(&SdkCall::OpenDevice {
            serial: "DA0001".to_string(),
            access: AccessMode::Exclusive,
        }));
        assert!(sdk.calls().contains(&SdkCall::SetEnumValue {
            serial: "DA0001".to_string(),
            key: "TriggerMode".to_string(),
            value: 0,
        }));
    }

    #[test]
    fn test_parameter_writes_skipped_when_equal() {
        let (sdk, rig) = opened_rig();

        // Exposure and gain both differ.
        assert_eq!(sdk.count_for("DA0001", SdkOp::SetFloatValue), 2);
        // Both already match.
        assert_eq!(sdk.count_for("DA0002", SdkOp::SetFloatValue), 0);
        // Only exposure differs.
        assert_eq!(sdk.count_for("DA0003", SdkOp::SetFloatValue), 1);
        assert!(sdk.calls().contains(&SdkCall::SetFloatValue {
            serial: "DA0003".to_string(),
            key: "ExposureTime".to_string(),
            value: 15000.0,
        }));

        let top = sdk.device("DA0001").unwrap();
        assert_eq!(top.exposure, 20000.0);
        assert_eq!(top.gain, 5.0);
        assert_eq!(top.trigger_mode, 0);
        assert_eq!(rig.payload_size("topCamera"), Some(64 * 48));
    }

    #[test]
    fn test_open_twice_rejected() {
        let (_sdk, mut rig) = opened_rig();
        assert!(matches!(rig.open_devices(), Err(CameraError::AlreadyOpen)));
    }

    #[test]
    fn test_open_failures_name_operation_and_code() {
        let cases = [
            (SdkOp::CreateHandle, "CreateHandle"),
            (SdkOp::OpenDevice, "OpenDevice"),
            (SdkOp::SetEnumValue, "SetEnumValue (TriggerMode)"),
            (SdkOp::GetFloatValue, "GetFloatValue (ExposureTime)"),
            (SdkOp::SetFloatValue, "SetFloatValue (ExposureTime)"),
            (SdkOp::GetIntValue, "Get Payload"),
        ];
        for (op, name) in cases {
            let sdk = matching_sdk();
            sdk.fail_on(op, ErrorCode::BUSY);
            let mut rig = CameraRig::new(sdk.clone(), three_cameras()).unwrap();
            let message = rig.open_devices().unwrap_err().to_string();
            assert!(message.contains(name), "{message}");
            assert!(message.contains("MV_E_BUSY"), "{message}");
            assert!(message.contains("0x80000204"), "{message}");
            // The partially opened device was released.
            assert_eq!(sdk.live_handles(), 0, "{name}");
        }
    }

    #[test]
    fn test_gain_failures_name_gain_node() {
        // Exposure already matches, so the first float write is the gain.
        let config = RigConfig::new()
            .with_camera("topCamera", CameraSettings::new("DA0001", 5000.0, 3.0));
        let sdk = MockSdk::with_devices([MockDevice::new("DA0001")]);
        sdk.fail_on(SdkOp::SetFloatValue, ErrorCode::BUSY);
        let mut rig = CameraRig::new(sdk.clone(), config.clone()).unwrap();
        assert_eq!(
            rig.open_devices().unwrap_err().to_string(),
            "SetFloatValue (Gain) failed with error [0x80000204] MV_E_BUSY"
        );
        assert_eq!(sdk.count(SdkOp::SetFloatValue), 1);
        assert_eq!(sdk.live_handles(), 0);

        let sdk = MockSdk::with_devices([MockDevice::new("DA0001")]);
        sdk.fail_on_node(SdkOp::GetFloatValue, "Gain", ErrorCode::GC_ACCESS);
        let mut rig = CameraRig::new(sdk.clone(), config).unwrap();
        let err = rig.open_devices().unwrap_err();
        assert!(matches!(
            err,
            CameraError::Sdk(SdkError { ref op, code }) if op == "GetFloatValue (Gain)" && code == ErrorCode::GC_ACCESS
        ));
        assert_eq!(sdk.live_handles(), 0);
    }

    #[test]
    fn test_retry_opens_remaining_cameras() {
        let sdk = matching_sdk();
        sdk.fail_on_device("DA0002", SdkOp::OpenDevice, ErrorCode::ACCESS_DENIED);
        let mut rig = CameraRig::new(sdk.clone(), three_cameras()).unwrap();
        assert!(rig.open_devices().is_err());
        assert!(rig.is_open("topCamera"));
        assert!(!rig.is_open("leftCamera"));

        sdk.clear_failures();
        rig.open_devices().unwrap();
        assert!(rig.is_open("leftCamera"));
        assert!(rig.is_open("rightCamera"));
        // The camera opened on the first attempt was not reopened.
        assert_eq!(sdk.count_for("DA0001", SdkOp::CreateHandle), 1);
        assert_eq!(sdk.live_handles(), 3);
        assert!(matches!(rig.open_devices(), Err(CameraError::AlreadyOpen)));
    }

    #[test]
    fn test_enumeration_failure() {
        let sdk = matching_sdk();
        sdk.fail_on(SdkOp::EnumDevices, ErrorCode::RESOURCE);
        let err = CameraRig::new(sdk, three_cameras()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "EnumDevices failed with error [0x80000006] MV_E_RESOURCE"
        );
    }

    #[test]
    fn test_capture_failures_name_operation_and_code() {
        let cases = [
            (SdkOp::StartGrabbing, "StartGrabbing"),
            (SdkOp::GetOneFrame, "GetOneFrameTimeout"),
            (SdkOp::EncodeImage, "SaveImage"),
        ];
        let dir = tempfile::tempdir().unwrap();
        for (op, name) in cases {
            let (sdk, mut rig) = opened_rig();
            sdk.fail_on(op, ErrorCode::NODATA);
            let path = dir.path().join("top.jpg");
            let message = rig
                .save_image("topCamera", &path, JpegQuality::default())
                .unwrap_err()
                .to_string();
            assert!(message.contains(name), "{message}");
            assert!(message.contains("MV_E_NODATA"), "{message}");
            assert!(!path.exists());
        }
    }

    #[test]
    fn test_save_image_writes_jpeg() {
        let (sdk, mut rig) = opened_rig();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("top.jpg");

        let saved = rig
            .save_image("topCamera", &path, JpegQuality::new(75).unwrap())
            .unwrap();
        assert!(!saved.overwritten);
        assert_eq!((saved.width, saved.height), (64, 48));
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), saved.bytes);
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert!(sdk.calls().contains(&SdkCall::GetOneFrame {
            serial: "DA0001".to_string(),
            timeout_ms: FRAME_TIMEOUT_MS,
        }));
        assert!(sdk.calls().contains(&SdkCall::EncodeImage {
            serial: "DA0001".to_string(),
            quality: 75,
        }));
        assert!(rig.is_grabbing("topCamera"));
        assert!(!rig.is_grabbing("leftCamera"));
    }

    #[test]
    fn test_repeated_capture_starts_grabbing_once() {
        let (sdk, mut rig) = opened_rig();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("left.jpg");

        rig.save_image("leftCamera", &path, JpegQuality::default())
            .unwrap();
        let second = rig
            .save_image("leftCamera", &path, JpegQuality::default())
            .unwrap();
        assert!(second.overwritten);
        assert_eq!(second.frame_num, 2);
        assert_eq!(sdk.count_for("DA0002", SdkOp::StartGrabbing), 1);
        assert_eq!(sdk.count_for("DA0002", SdkOp::StopGrabbing), 0);
    }

    #[test]
    fn test_save_image_missing_directory() {
        let (sdk, mut rig) = opened_rig();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("top.jpg");
        let err = rig
            .save_image("topCamera", &path, JpegQuality::default())
            .unwrap_err();
        assert!(matches!(err, CameraError::InvalidDestination(_)));
        assert!(err.to_string().starts_with("Wrong path"));
        assert_eq!(sdk.count(SdkOp::StartGrabbing), 0);
    }

    #[test]
    fn test_save_image_unknown_key_and_unopened() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.jpg");

        let mut rig = CameraRig::new(matching_sdk(), three_cameras()).unwrap();
        assert!(matches!(
            rig.save_image("bottomCamera", &path, JpegQuality::default()),
            Err(CameraError::UnknownCamera(ref k)) if k == "bottomCamera"
        ));
        assert!(matches!(
            rig.save_image("topCamera", &path, JpegQuality::default()),
            Err(CameraError::NotOpened(_))
        ));
    }

    #[test]
    fn test_quality_range() {
        assert_eq!(JpegQuality::new(0).unwrap().get(), 0);
        assert_eq!(JpegQuality::new(100).unwrap().get(), 100);
        assert!(matches!(
            JpegQuality::new(101),
            Err(CameraError::InvalidQuality(101))
        ));
        assert_eq!(JpegQuality::default().get(), 90);
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let (sdk, mut rig) = opened_rig();
        let dir = tempfile::tempdir().unwrap();
        rig.save_image("topCamera", dir.path().join("top.jpg"), JpegQuality::default())
            .unwrap();

        rig.shutdown().unwrap();
        assert_eq!(sdk.live_handles(), 0);
        assert_eq!(sdk.count(SdkOp::CloseDevice), 3);
        assert_eq!(sdk.count(SdkOp::DestroyHandle), 3);
        // Only the camera that grabbed is stopped.
        assert_eq!(sdk.count(SdkOp::StopGrabbing), 1);
        assert!(!sdk.is_grabbing("DA0001"));
    }

    #[test]
    fn test_shutdown_continues_past_failures() {
        let (sdk, mut rig) = opened_rig();
        let dir = tempfile::tempdir().unwrap();
        rig.save_image("leftCamera", dir.path().join("left.jpg"), JpegQuality::default())
            .unwrap();
        sdk.fail_on_device("DA0002", SdkOp::StopGrabbing, ErrorCode::BUSY);
        sdk.fail_on_device("DA0001", SdkOp::CloseDevice, ErrorCode::HANDLE);

        let err = rig.shutdown().unwrap_err();
        assert_eq!(err.failures.len(), 2);
        assert_eq!(err.failures[0].key, "leftCamera");
        assert_eq!(err.failures[0].error.op, "StopGrabbing");
        assert_eq!(err.failures[1].key, "topCamera");
        assert_eq!(err.failures[1].error.op, "CloseDevice");
        assert!(err.to_string().contains("MV_E_HANDLE"));

        // Every camera still got to DestroyHandle.
        assert_eq!(sdk.count(SdkOp::DestroyHandle), 3);
        assert_eq!(sdk.live_handles(), 0);
    }

    #[test]
    fn test_shutdown_reports_destroy_failure() {
        let (sdk, rig) = opened_rig();
        sdk.fail_on_device("DA0003", SdkOp::DestroyHandle, ErrorCode::HANDLE);

        let err = rig.shutdown().unwrap_err();
        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].key, "rightCamera");
        assert_eq!(err.failures[0].error.op, "DestroyHandle");
        assert_eq!(err.failures[0].error.code, ErrorCode::HANDLE);
        assert_eq!(sdk.count(SdkOp::CloseDevice), 3);
        assert_eq!(sdk.count(SdkOp::DestroyHandle), 3);
    }

    #[test]
    fn test_drop_releases_open_cameras() {
        let sdk = matching_sdk();
        {
            let mut rig = CameraRig::new(sdk.clone(), three_cameras()).unwrap();
            rig.open_devices().unwrap();
            assert_eq!(sdk.live_handles(), 3);
        }
        assert_eq!(sdk.live_handles(), 0);
        assert_eq!(sdk.count(SdkOp::DestroyHandle), 3);
    }

    #[test]
    fn test_close_all_is_idempotent() {
        let (sdk, mut rig) = opened_rig();
        rig.close_all().unwrap();
        rig.close_all().unwrap();
        assert_eq!(sdk.count(SdkOp::DestroyHandle), 3);
        assert!(!rig.is_open("topCamera"));
    }
}
