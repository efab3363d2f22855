//! Hik Rig Library
//!
//! Serial-number driven multi-camera capture on top of the MVS industrial
//! camera SDK. A small configuration file names each camera, the serial
//! number of the device it should be, and the exposure and gain to run it
//! with. The rig opens every device exclusively, applies those settings,
//! and saves single frames as JPEG on request.
//!
//! # Architecture
//!
//! ```text
//! RigConfig ──► CameraRig<S: CameraSdk> ──► S = MvsSdk (vendor library)
//!                    │                       S = MockSdk (simulation)
//!                    └─► JPEG files
//! ```
//!
//! # Design Principles
//!
//! - **All or nothing**: the device count and every serial must match the config
//! - **Owned handles**: each open camera belongs to the rig and is released on
//!   shutdown or drop, even when some release steps fail
//! - **Vendor codes kept**: SDK failures carry the operation name and the
//!   symbolic `MV_E_*` code
//!
//! # Example
//!
//! ```no_run
//! use hik_rig::{
//!     rig::{CameraRig, CameraSettings, JpegQuality, RigConfig},
//!     sdk::{MockDevice, MockSdk},
//! };
//!
//! let config = RigConfig::new()
//!     .with_camera("topCamera", CameraSettings::new("DA0001", 20000.0, 5.0));
//! let sdk = MockSdk::with_devices([MockDevice::new("DA0001")]);
//!
//! let mut rig = CameraRig::new(sdk, config).unwrap();
//! rig.open_devices().unwrap();
//! rig.save_image("topCamera", "./top.jpg", JpegQuality::new(90).unwrap())
//!     .unwrap();
//! rig.shutdown().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod rig;
pub mod sdk;

// Re-export commonly used types at crate root
pub use rig::{
    CameraError, CameraRig, CameraSettings, ConfigError, JpegQuality, RigConfig, SavedImage,
    ShutdownError,
};
pub use sdk::{CameraSdk, DeviceInfo, ErrorCode, MockDevice, MockSdk, SdkError};
#[cfg(feature = "mvs")]
pub use sdk::MvsSdk;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
