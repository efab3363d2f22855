//! Vendor SDK seam.
//!
//! [`CameraSdk`] mirrors the subset of the MVS camera-control API this crate
//! drives. Methods return the raw [`ErrorCode`] on failure; callers attach
//! an operation name with [`SdkResultExt::op`].
//!
//! Two implementations are provided: [`MockSdk`], an in-memory simulation,
//! and (with the `mvs` feature) `MvsSdk`, the binding to the vendor library.

mod error_code;
mod mock;
#[cfg(feature = "mvs")]
mod mvs;

pub use error_code::{ErrorCode, SdkError, SdkResultExt, UNRECOGNIZED_NAME};
pub use mock::{MockDevice, MockHandle, MockSdk, SdkCall, SdkOp};
#[cfg(feature = "mvs")]
pub use mvs::{MvsHandle, MvsSdk};

use std::fmt;

/// GenICam node selecting free-running versus triggered acquisition.
pub const TRIGGER_MODE: &str = "TriggerMode";
/// GenICam node holding exposure time in microseconds.
pub const EXPOSURE_TIME: &str = "ExposureTime";
/// GenICam node holding analog gain in dB.
pub const GAIN: &str = "Gain";
/// GenICam node holding the byte size of one raw frame.
pub const PAYLOAD_SIZE: &str = "PayloadSize";

/// `TriggerMode` value for free-running acquisition.
pub const TRIGGER_MODE_OFF: u32 = 0;
/// `TriggerMode` value for externally triggered acquisition.
pub const TRIGGER_MODE_ON: u32 = 1;

/// Pixel format of a grabbed frame (GigE Vision PFNC value).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelType(pub u32);

impl PixelType {
    /// 8-bit monochrome.
    pub const MONO8: PixelType = PixelType(0x0108_0001);
    /// 8-bit Bayer RG.
    pub const BAYER_RG8: PixelType = PixelType(0x0108_0009);
    /// Packed 24-bit RGB.
    pub const RGB8_PACKED: PixelType = PixelType(0x0218_0014);
}

/// Bus a device was discovered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportLayer {
    /// GigE Vision.
    GigE,
    /// USB3 Vision.
    Usb3,
}

impl TransportLayer {
    /// `nTLayerType` bit for this layer.
    pub fn bits(self) -> u32 {
        match self {
            TransportLayer::GigE => 0x0000_0001,
            TransportLayer::Usb3 => 0x0000_0004,
        }
    }

    /// Decodes an `nTLayerType` value.
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            0x0000_0001 => Some(TransportLayer::GigE),
            0x0000_0004 => Some(TransportLayer::Usb3),
            _ => None,
        }
    }
}

impl fmt::Display for TransportLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportLayer::GigE => f.write_str("GigE"),
            TransportLayer::Usb3 => f.write_str("USB3"),
        }
    }
}

/// Set of transport layers to enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportLayers(pub u32);

impl TransportLayers {
    /// GigE and USB3 devices.
    pub const GIGE_AND_USB: TransportLayers = TransportLayers(0x0000_0001 | 0x0000_0004);

    /// Returns true if `layer` is part of the set.
    pub fn contains(self, layer: TransportLayer) -> bool {
        self.0 & layer.bits() != 0
    }
}

/// Device open mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AccessMode {
    /// No other process may open or control the device.
    Exclusive = 1,
    /// Other processes may read but not control.
    ExclusiveWithSwitch = 2,
    /// Control access; others may open in monitor mode.
    Control = 3,
    /// Read-only monitor access.
    Monitor = 7,
}

/// Output format for [`CameraSdk::encode_image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ImageType {
    /// Windows bitmap.
    Bmp = 1,
    /// Baseline JPEG.
    Jpeg = 2,
}

/// One enumerated device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Position in the enumeration list.
    pub index: usize,
    /// Bus the device was found on.
    pub transport: TransportLayer,
    /// Factory serial number.
    pub serial: String,
    /// Model name.
    pub model: String,
    /// User-defined device name, often empty.
    pub user_name: String,
}

/// Metadata for a grabbed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
    /// Pixel format.
    pub pixel_type: PixelType,
    /// Bytes of valid frame data in the buffer.
    pub frame_len: u32,
    /// Device frame counter.
    pub frame_num: u32,
}

/// Parameters for [`CameraSdk::encode_image`].
#[derive(Debug, Clone, Copy)]
pub struct SaveImageParams<'a> {
    /// Raw frame data, `frame.frame_len` bytes.
    pub data: &'a [u8],
    /// Frame metadata returned by the grab.
    pub frame: FrameInfo,
    /// Target format.
    pub image_type: ImageType,
    /// JPEG quality, ignored for other formats.
    pub jpeg_quality: u32,
}

/// The vendor SDK calls used by the rig.
///
/// Handles are opaque; the implementation owns whatever they point at and
/// only [`destroy_handle`](CameraSdk::destroy_handle) releases it.
pub trait CameraSdk {
    /// Opaque per-device handle.
    type Handle;

    /// Lists devices on the given transport layers.
    fn enum_devices(&self, layers: TransportLayers) -> Result<Vec<DeviceInfo>, ErrorCode>;

    /// Creates a handle for an enumerated device.
    fn create_handle(&self, device: &DeviceInfo) -> Result<Self::Handle, ErrorCode>;

    /// Opens the device behind `handle`.
    fn open_device(&self, handle: &Self::Handle, access: AccessMode) -> Result<(), ErrorCode>;

    /// Writes an enumeration node.
    fn set_enum_value(&self, handle: &Self::Handle, key: &str, value: u32) -> Result<(), ErrorCode>;

    /// Reads the current value of a float node.
    fn get_float_value(&self, handle: &Self::Handle, key: &str) -> Result<f32, ErrorCode>;

    /// Writes a float node.
    fn set_float_value(&self, handle: &Self::Handle, key: &str, value: f32) -> Result<(), ErrorCode>;

    /// Reads the current value of an integer node.
    fn get_int_value(&self, handle: &Self::Handle, key: &str) -> Result<u32, ErrorCode>;

    /// Starts frame acquisition.
    fn start_grabbing(&self, handle: &Self::Handle) -> Result<(), ErrorCode>;

    /// Blocks up to `timeout_ms` for one frame, written into `buffer`.
    fn get_one_frame_timeout(
        &self,
        handle: &Self::Handle,
        buffer: &mut [u8],
        timeout_ms: u32,
    ) -> Result<FrameInfo, ErrorCode>;

    /// Encodes a grabbed frame, returning the encoded bytes.
    fn encode_image(&self, handle: &Self::Handle, params: &SaveImageParams<'_>) -> Result<Vec<u8>, ErrorCode>;

    /// Stops frame acquisition.
    fn stop_grabbing(&self, handle: &Self::Handle) -> Result<(), ErrorCode>;

    /// Closes the device.
    fn close_device(&self, handle: &Self::Handle) -> Result<(), ErrorCode>;

    /// Releases the handle.
    fn destroy_handle(&self, handle: Self::Handle) -> Result<(), ErrorCode>;
}
