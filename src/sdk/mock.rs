//! In-memory stand-in for the vendor SDK.
//!
//! `MockSdk` simulates a set of cameras closely enough to exercise the rig:
//! handles, exclusive open, parameter nodes, grabbing state and JPEG
//! encoding. Calls are recorded and failures can be injected per operation,
//! optionally restricted to one device.
//!
//! Clones share state, so a test can hand one clone to the rig and keep
//! another to inspect what happened.

use super::{
    AccessMode, CameraSdk, DeviceInfo, ErrorCode, FrameInfo, ImageType, PixelType,
    SaveImageParams, TransportLayer, TransportLayers, EXPOSURE_TIME, GAIN, PAYLOAD_SIZE,
    TRIGGER_MODE, TRIGGER_MODE_OFF, TRIGGER_MODE_ON,
};
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// SDK operation kinds, used to target injected failures.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SdkOp {
    EnumDevices,
    CreateHandle,
    OpenDevice,
    SetEnumValue,
    GetFloatValue,
    SetFloatValue,
    GetIntValue,
    StartGrabbing,
    GetOneFrame,
    EncodeImage,
    StopGrabbing,
    CloseDevice,
    DestroyHandle,
}

/// One recorded SDK call.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum SdkCall {
    EnumDevices,
    CreateHandle { serial: String },
    OpenDevice { serial: String, access: AccessMode },
    SetEnumValue { serial: String, key: String, value: u32 },
    GetFloatValue { serial: String, key: String },
    SetFloatValue { serial: String, key: String, value: f32 },
    GetIntValue { serial: String, key: String },
    StartGrabbing { serial: String },
    GetOneFrame { serial: String, timeout_ms: u32 },
    EncodeImage { serial: String, quality: u32 },
    StopGrabbing { serial: String },
    CloseDevice { serial: String },
    DestroyHandle { serial: String },
}

impl SdkCall {
    /// The operation kind of this call.
    pub fn op(&self) -> SdkOp {
        match self {
            SdkCall::EnumDevices => SdkOp::EnumDevices,
            SdkCall::CreateHandle { .. } => SdkOp::CreateHandle,
            SdkCall::OpenDevice { .. } => SdkOp::OpenDevice,
            SdkCall::SetEnumValue { .. } => SdkOp::SetEnumValue,
            SdkCall::GetFloatValue { .. } => SdkOp::GetFloatValue,
            SdkCall::SetFloatValue { .. } => SdkOp::SetFloatValue,
            SdkCall::GetIntValue { .. } => SdkOp::GetIntValue,
            SdkCall::StartGrabbing { .. } => SdkOp::StartGrabbing,
            SdkCall::GetOneFrame { .. } => SdkOp::GetOneFrame,
            SdkCall::EncodeImage { .. } => SdkOp::EncodeImage,
            SdkCall::StopGrabbing { .. } => SdkOp::StopGrabbing,
            SdkCall::CloseDevice { .. } => SdkOp::CloseDevice,
            SdkCall::DestroyHandle { .. } => SdkOp::DestroyHandle,
        }
    }

    /// Serial of the device the call targeted, if any.
    pub fn serial(&self) -> Option<&str> {
        match self {
            SdkCall::EnumDevices => None,
            SdkCall::CreateHandle { serial }
            | SdkCall::OpenDevice { serial, .. }
            | SdkCall::SetEnumValue { serial, .. }
            | SdkCall::GetFloatValue { serial, .. }
            | SdkCall::SetFloatValue { serial, .. }
            | SdkCall::GetIntValue { serial, .. }
            | SdkCall::StartGrabbing { serial }
            | SdkCall::GetOneFrame { serial, .. }
            | SdkCall::EncodeImage { serial, .. }
            | SdkCall::StopGrabbing { serial }
            | SdkCall::CloseDevice { serial }
            | SdkCall::DestroyHandle { serial } => Some(serial),
        }
    }
}

/// A simulated camera.
#[derive(Debug, Clone)]
pub struct MockDevice {
    /// Serial reported by enumeration.
    pub serial: String,
    /// Model name reported by enumeration.
    pub model: String,
    /// User-defined name reported by enumeration.
    pub user_name: String,
    /// Bus the device appears on.
    pub transport: TransportLayer,
    /// Live `ExposureTime` value.
    pub exposure: f32,
    /// Live `Gain` value.
    pub gain: f32,
    /// Live `TriggerMode` value.
    pub trigger_mode: u32,
    /// Frame width in pixels.
    pub width: u16,
    /// Frame height in pixels.
    pub height: u16,
}

impl MockDevice {
    /// A small Mono8 USB3 camera with trigger mode on.
    pub fn new(serial: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            model: "MV-SIM-U3".to_string(),
            user_name: String::new(),
            transport: TransportLayer::Usb3,
            exposure: 5000.0,
            gain: 0.0,
            trigger_mode: TRIGGER_MODE_ON,
            width: 64,
            height: 48,
        }
    }

    pub fn with_exposure(mut self, exposure: f32) -> Self {
        self.exposure = exposure;
        self
    }

    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    pub fn with_transport(mut self, transport: TransportLayer) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_resolution(mut self, width: u16, height: u16) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Bytes in one Mono8 frame.
    pub fn payload_size(&self) -> u32 {
        u32::from(self.width) * u32::from(self.height)
    }
}

#[derive(Debug)]
struct DeviceState {
    profile: MockDevice,
    /// Handle id holding the device open, if any.
    holder: Option<u64>,
    frames: u32,
}

#[derive(Debug)]
struct HandleState {
    device: usize,
    opened: bool,
    grabbing: bool,
}

#[derive(Debug)]
struct Failure {
    serial: Option<String>,
    node: Option<String>,
    op: SdkOp,
    code: ErrorCode,
}

#[derive(Debug, Default)]
struct MockState {
    devices: Vec<DeviceState>,
    failures: Vec<Failure>,
    calls: Vec<SdkCall>,
    handles: HashMap<u64, HandleState>,
    next_handle: u64,
}

impl MockState {
    fn injected(&self, serial: Option<&str>, op: SdkOp) -> Result<(), ErrorCode> {
        let hit = self.failures.iter().find(|f| {
            f.op == op
                && f.node.is_none()
                && f.serial.as_deref().map_or(true, |s| Some(s) == serial)
        });
        match hit {
            Some(failure) => Err(failure.code),
            None => Ok(()),
        }
    }

    fn injected_node(&self, node: &str, op: SdkOp) -> Result<(), ErrorCode> {
        match self
            .failures
            .iter()
            .find(|f| f.op == op && f.node.as_deref() == Some(node))
        {
            Some(failure) => Err(failure.code),
            None => Ok(()),
        }
    }

    /// Records a call on `handle` and applies injected failures.
    fn begin(
        &mut self,
        handle: &MockHandle,
        op: SdkOp,
        call: impl FnOnce(String) -> SdkCall,
    ) -> Result<usize, ErrorCode> {
        let device = self.handles.get(&handle.id).ok_or(ErrorCode::HANDLE)?.device;
        let serial = self.devices[device].profile.serial.clone();
        self.calls.push(call(serial.clone()));
        self.injected(Some(&serial), op)?;
        Ok(device)
    }

    fn opened_handle(&mut self, handle: &MockHandle) -> Result<&mut HandleState, ErrorCode> {
        let state = self.handles.get_mut(&handle.id).ok_or(ErrorCode::HANDLE)?;
        if state.opened {
            Ok(state)
        } else {
            Err(ErrorCode::CALLORDER)
        }
    }
}

/// Handle to a simulated device.
#[derive(Debug)]
pub struct MockHandle {
    id: u64,
}

/// Simulated SDK.
#[derive(Debug, Clone, Default)]
pub struct MockSdk {
    state: Arc<Mutex<MockState>>,
}

impl MockSdk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an SDK that enumerates `devices` in order.
    pub fn with_devices(devices: impl IntoIterator<Item = MockDevice>) -> Self {
        let sdk = Self::new();
        for device in devices {
            sdk.add_device(device);
        }
        sdk
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Plugs in another device.
    pub fn add_device(&self, device: MockDevice) {
        self.state().devices.push(DeviceState {
            profile: device,
            holder: None,
            frames: 0,
        });
    }

    /// Makes every call of kind `op` return `code`.
    pub fn fail_on(&self, op: SdkOp, code: ErrorCode) {
        self.state().failures.push(Failure {
            serial: None,
            node: None,
            op,
            code,
        });
    }

    /// Makes calls of kind `op` on the device with `serial` return `code`.
    pub fn fail_on_device(&self, serial: &str, op: SdkOp, code: ErrorCode) {
        self.state().failures.push(Failure {
            serial: Some(serial.to_string()),
            node: None,
            op,
            code,
        });
    }

    /// Makes calls of kind `op` that address the parameter `node` return `code`.
    pub fn fail_on_node(&self, op: SdkOp, node: &str, code: ErrorCode) {
        self.state().failures.push(Failure {
            serial: None,
            node: Some(node.to_string()),
            op,
            code,
        });
    }

    /// Removes all injected failures.
    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<SdkCall> {
        self.state().calls.clone()
    }

    /// Number of calls of kind `op`.
    pub fn count(&self, op: SdkOp) -> usize {
        self.state().calls.iter().filter(|c| c.op() == op).count()
    }

    /// Number of calls of kind `op` on the device with `serial`.
    pub fn count_for(&self, serial: &str, op: SdkOp) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.op() == op && c.serial() == Some(serial))
            .count()
    }

    /// Handles created and not yet destroyed.
    pub fn live_handles(&self) -> usize {
        self.state().handles.len()
    }

    /// Current state of a simulated device.
    pub fn device(&self, serial: &str) -> Option<MockDevice> {
        self.state()
            .devices
            .iter()
            .find(|d| d.profile.serial == serial)
            .map(|d| d.profile.clone())
    }

    /// Whether any handle on `serial` is grabbing.
    pub fn is_grabbing(&self, serial: &str) -> bool {
        let state = self.state();
        state
            .handles
            .values()
            .any(|h| h.grabbing && state.devices[h.device].profile.serial == serial)
    }
}

fn fill_gradient(buffer: &mut [u8], width: u16, frame: u32) {
    let width = usize::from(width.max(1));
    for (i, px) in buffer.iter_mut().enumerate() {
        let (x, y) = (i % width, i / width);
        *px = ((x + y + frame as usize) % 256) as u8;
    }
}

impl CameraSdk for MockSdk {
    type Handle = MockHandle;

    fn enum_devices(&self, layers: TransportLayers) -> Result<Vec<DeviceInfo>, ErrorCode> {
        let mut state = self.state();
        state.calls.push(SdkCall::EnumDevices);
        state.injected(None, SdkOp::EnumDevices)?;
        let devices = state
            .devices
            .iter()
            .filter(|d| layers.contains(d.profile.transport))
            .enumerate()
            .map(|(index, d)| DeviceInfo {
                index,
                transport: d.profile.transport,
                serial: d.profile.serial.clone(),
                model: d.profile.model.clone(),
                user_name: d.profile.user_name.clone(),
            })
            .collect();
        Ok(devices)
    }

    fn create_handle(&self, device: &DeviceInfo) -> Result<MockHandle, ErrorCode> {
        let mut guard = self.state();
        let state = &mut *guard;
        state.calls.push(SdkCall::CreateHandle {
            serial: device.serial.clone(),
        });
        state.injected(Some(&device.serial), SdkOp::CreateHandle)?;
        let index = state
            .devices
            .iter()
            .position(|d| d.profile.serial == device.serial)
            .ok_or(ErrorCode::PARAMETER)?;
        let id = state.next_handle;
        state.next_handle += 1;
        state.handles.insert(
            id,
            HandleState {
                device: index,
                opened: false,
                grabbing: false,
            },
        );
        Ok(MockHandle { id })
    }

    fn open_device(&self, handle: &MockHandle, access: AccessMode) -> Result<(), ErrorCode> {
        let mut guard = self.state();
        let state = &mut *guard;
        let device = state.begin(handle, SdkOp::OpenDevice, |serial| SdkCall::OpenDevice {
            serial,
            access,
        })?;
        if state.handles[&handle.id].opened {
            return Err(ErrorCode::CALLORDER);
        }
        let holder = &mut state.devices[device].holder;
        if holder.is_some() {
            return Err(ErrorCode::ACCESS_DENIED);
        }
        *holder = Some(handle.id);
        if let Some(h) = state.handles.get_mut(&handle.id) {
            h.opened = true;
        }
        Ok(())
    }

    fn set_enum_value(&self, handle: &MockHandle, key: &str, value: u32) -> Result<(), ErrorCode> {
        let mut guard = self.state();
        let state = &mut *guard;
        let device = state.begin(handle, SdkOp::SetEnumValue, |serial| SdkCall::SetEnumValue {
            serial,
            key: key.to_string(),
            value,
        })?;
        state.injected_node(key, SdkOp::SetEnumValue)?;
        state.opened_handle(handle)?;
        match key {
            TRIGGER_MODE if value == TRIGGER_MODE_OFF || value == TRIGGER_MODE_ON => {
                state.devices[device].profile.trigger_mode = value;
                Ok(())
            }
            TRIGGER_MODE => Err(ErrorCode::GC_RANGE),
            _ => Err(ErrorCode::GC_PROPERTY),
        }
    }

    fn get_float_value(&self, handle: &MockHandle, key: &str) -> Result<f32, ErrorCode> {
        let mut guard = self.state();
        let state = &mut *guard;
        let device = state.begin(handle, SdkOp::GetFloatValue, |serial| SdkCall::GetFloatValue {
            serial,
            key: key.to_string(),
        })?;
        state.injected_node(key, SdkOp::GetFloatValue)?;
        state.opened_handle(handle)?;
        let profile = &state.devices[device].profile;
        match key {
            EXPOSURE_TIME => Ok(profile.exposure),
            GAIN => Ok(profile.gain),
            _ => Err(ErrorCode::GC_PROPERTY),
        }
    }

    fn set_float_value(&self, handle: &MockHandle, key: &str, value: f32) -> Result<(), ErrorCode> {
        let mut guard = self.state();
        let state = &mut *guard;
        let device = state.begin(handle, SdkOp::SetFloatValue, |serial| SdkCall::SetFloatValue {
            serial,
            key: key.to_string(),
            value,
        })?;
        state.injected_node(key, SdkOp::SetFloatValue)?;
        state.opened_handle(handle)?;
        if !value.is_finite() || value < 0.0 {
            return Err(ErrorCode::GC_RANGE);
        }
        let profile = &mut state.devices[device].profile;
        match key {
            EXPOSURE_TIME => profile.exposure = value,
            GAIN => profile.gain = value,
            _ => return Err(ErrorCode::GC_PROPERTY),
        }
        Ok(())
    }

    fn get_int_value(&self, handle: &MockHandle, key: &str) -> Result<u32, ErrorCode> {
        let mut guard = self.state();
        let state = &mut *guard;
        let device = state.begin(handle, SdkOp::GetIntValue, |serial| SdkCall::GetIntValue {
            serial,
            key: key.to_string(),
        })?;
        state.injected_node(key, SdkOp::GetIntValue)?;
        state.opened_handle(handle)?;
        let profile = &state.devices[device].profile;
        match key {
            PAYLOAD_SIZE => Ok(profile.payload_size()),
            "Width" => Ok(u32::from(profile.width)),
            "Height" => Ok(u32::from(profile.height)),
            _ => Err(ErrorCode::GC_PROPERTY),
        }
    }

    fn start_grabbing(&self, handle: &MockHandle) -> Result<(), ErrorCode> {
        let mut guard = self.state();
        let state = &mut *guard;
        state.begin(handle, SdkOp::StartGrabbing, |serial| SdkCall::StartGrabbing { serial })?;
        let h = state.opened_handle(handle)?;
        if h.grabbing {
            return Err(ErrorCode::CALLORDER);
        }
        h.grabbing = true;
        Ok(())
    }

    fn get_one_frame_timeout(
        &self,
        handle: &MockHandle,
        buffer: &mut [u8],
        timeout_ms: u32,
    ) -> Result<FrameInfo, ErrorCode> {
        let mut guard = self.state();
        let state = &mut *guard;
        let device = state.begin(handle, SdkOp::GetOneFrame, |serial| SdkCall::GetOneFrame {
            serial,
            timeout_ms,
        })?;
        if !state.opened_handle(handle)?.grabbing {
            return Err(ErrorCode::CALLORDER);
        }
        let dev = &mut state.devices[device];
        let payload = dev.profile.payload_size();
        if buffer.len() < payload as usize {
            return Err(ErrorCode::NOENOUGH_BUF);
        }
        dev.frames += 1;
        fill_gradient(&mut buffer[..payload as usize], dev.profile.width, dev.frames);
        Ok(FrameInfo {
            width: dev.profile.width,
            height: dev.profile.height,
            pixel_type: PixelType::MONO8,
            frame_len: payload,
            frame_num: dev.frames,
        })
    }

    fn encode_image(&self, handle: &MockHandle, params: &SaveImageParams<'_>) -> Result<Vec<u8>, ErrorCode> {
        let mut guard = self.state();
        let state = &mut *guard;
        state.begin(handle, SdkOp::EncodeImage, |serial| SdkCall::EncodeImage {
            serial,
            quality: params.jpeg_quality,
        })?;
        state.opened_handle(handle)?;
        if params.image_type != ImageType::Jpeg {
            return Err(ErrorCode::SUPPORT);
        }
        let (color, bytes_per_pixel) = match params.frame.pixel_type {
            PixelType::MONO8 => (ExtendedColorType::L8, 1usize),
            PixelType::RGB8_PACKED => (ExtendedColorType::Rgb8, 3usize),
            _ => return Err(ErrorCode::SUPPORT),
        };
        let (width, height) = (params.frame.width, params.frame.height);
        let needed = usize::from(width) * usize::from(height) * bytes_per_pixel;
        if params.data.len() < needed || (params.frame.frame_len as usize) < needed {
            return Err(ErrorCode::PARAMETER);
        }

        let quality = params.jpeg_quality.clamp(1, 100) as u8;
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality)
            .encode(
                &params.data[..needed],
                u32::from(width),
                u32::from(height),
                color,
            )
            .map_err(|_| ErrorCode::UNKNOWN)?;
        Ok(out)
    }

    fn stop_grabbing(&self, handle: &MockHandle) -> Result<(), ErrorCode> {
        let mut guard = self.state();
        let state = &mut *guard;
        state.begin(handle, SdkOp::StopGrabbing, |serial| SdkCall::StopGrabbing { serial })?;
        let h = state.opened_handle(handle)?;
        if !h.grabbing {
            return Err(ErrorCode::CALLORDER);
        }
        h.grabbing = false;
        Ok(())
    }

    fn close_device(&self, handle: &MockHandle) -> Result<(), ErrorCode> {
        let mut guard = self.state();
        let state = &mut *guard;
        let device = state.begin(handle, SdkOp::CloseDevice, |serial| SdkCall::CloseDevice { serial })?;
        let h = state.opened_handle(handle)?;
        h.opened = false;
        h.grabbing = false;
        state.devices[device].holder = None;
        Ok(())
    }

    fn destroy_handle(&self, handle: MockHandle) -> Result<(), ErrorCode> {
        let mut guard = self.state();
        let state = &mut *guard;
        let device = state.begin(&handle, SdkOp::DestroyHandle, |serial| SdkCall::DestroyHandle {
            serial,
        })?;
        // A destroyed handle implicitly closes its device.
        state.handles.remove(&handle.id);
        let holder = &mut state.devices[device].holder;
        if *holder == Some(handle.id) {
            *holder = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opened(sdk: &MockSdk) -> MockHandle {
        let devices = sdk.enum_devices(TransportLayers::GIGE_AND_USB).unwrap();
        let handle = sdk.create_handle(&devices[0]).unwrap();
        sdk.open_device(&handle, AccessMode::Exclusive).unwrap();
        handle
    }

    #[test]
    fn test_mock_lifecycle() {
        let sdk = MockSdk::with_devices([MockDevice::new("A1")]);
        let handle = opened(&sdk);
        sdk.start_grabbing(&handle).unwrap();
        assert!(sdk.is_grabbing("A1"));

        let mut buffer = vec![0u8; 64 * 48];
        let info = sdk.get_one_frame_timeout(&handle, &mut buffer, 1000).unwrap();
        assert_eq!(info.frame_num, 1);
        assert_eq!(info.frame_len, 64 * 48);

        sdk.stop_grabbing(&handle).unwrap();
        sdk.close_device(&handle).unwrap();
        sdk.destroy_handle(handle).unwrap();
        assert_eq!(sdk.live_handles(), 0);
    }

    #[test]
    fn test_call_order_enforced() {
        let sdk = MockSdk::with_devices([MockDevice::new("A1")]);
        let devices = sdk.enum_devices(TransportLayers::GIGE_AND_USB).unwrap();
        let handle = sdk.create_handle(&devices[0]).unwrap();
        assert_eq!(sdk.start_grabbing(&handle), Err(ErrorCode::CALLORDER));

        sdk.open_device(&handle, AccessMode::Exclusive).unwrap();
        assert_eq!(sdk.stop_grabbing(&handle), Err(ErrorCode::CALLORDER));
        sdk.start_grabbing(&handle).unwrap();
        assert_eq!(sdk.start_grabbing(&handle), Err(ErrorCode::CALLORDER));
    }

    #[test]
    fn test_exclusive_access() {
        let sdk = MockSdk::with_devices([MockDevice::new("A1")]);
        let _first = opened(&sdk);
        let devices = sdk.enum_devices(TransportLayers::GIGE_AND_USB).unwrap();
        let second = sdk.create_handle(&devices[0]).unwrap();
        assert_eq!(
            sdk.open_device(&second, AccessMode::Exclusive),
            Err(ErrorCode::ACCESS_DENIED)
        );
    }

    #[test]
    fn test_small_buffer_rejected() {
        let sdk = MockSdk::with_devices([MockDevice::new("A1")]);
        let handle = opened(&sdk);
        sdk.start_grabbing(&handle).unwrap();
        let mut buffer = vec![0u8; 10];
        assert_eq!(
            sdk.get_one_frame_timeout(&handle, &mut buffer, 1000),
            Err(ErrorCode::NOENOUGH_BUF)
        );
    }

    #[test]
    fn test_injected_failure_targets_one_device() {
        let sdk = MockSdk::with_devices([MockDevice::new("A1"), MockDevice::new("B2")]);
        sdk.fail_on_device("B2", SdkOp::CreateHandle, ErrorCode::RESOURCE);
        let devices = sdk.enum_devices(TransportLayers::GIGE_AND_USB).unwrap();
        assert!(sdk.create_handle(&devices[0]).is_ok());
        assert_eq!(
            sdk.create_handle(&devices[1]).err(),
            Some(ErrorCode::RESOURCE)
        );
        assert_eq!(sdk.count(SdkOp::CreateHandle), 2);
    }

    #[test]
    fn test_node_failure_targets_one_parameter() {
        let sdk = MockSdk::with_devices([MockDevice::new("A")]);
        let handle = opened(&sdk);
        sdk.fail_on_node(SdkOp::GetFloatValue, GAIN, ErrorCode::BUSY);

        assert_eq!(sdk.get_float_value(&handle, EXPOSURE_TIME), Ok(5000.0));
        assert_eq!(sdk.get_float_value(&handle, GAIN), Err(ErrorCode::BUSY));
        sdk.set_float_value(&handle, GAIN, 1.0).unwrap();
    }

    #[test]
    fn test_encode_produces_jpeg() {
        let sdk = MockSdk::with_devices([MockDevice::new("A1")]);
        let handle = opened(&sdk);
        sdk.start_grabbing(&handle).unwrap();
        let mut buffer = vec![0u8; 64 * 48];
        let frame = sdk.get_one_frame_timeout(&handle, &mut buffer, 1000).unwrap();
        let jpeg = sdk
            .encode_image(
                &handle,
                &SaveImageParams {
                    data: &buffer,
                    frame,
                    image_type: ImageType::Jpeg,
                    jpeg_quality: 90,
                },
            )
            .unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_unknown_node() {
        let sdk = MockSdk::with_devices([MockDevice::new("A1")]);
        let handle = opened(&sdk);
        assert_eq!(
            sdk.get_float_value(&handle, "Gamma"),
            Err(ErrorCode::GC_PROPERTY)
        );
    }
}
