//! Binding to the vendor `MvCameraControl` library.
//!
//! Struct layouts follow `CameraParams.h` from the MVS SDK. Only the fields
//! read or written here are spelled out; structs the SDK fills in for us
//! carry a reserved tail at least as large as the vendor's.

#![allow(unsafe_code)]
#![allow(non_snake_case, non_camel_case_types, dead_code)]

use super::{
    AccessMode, CameraSdk, DeviceInfo, ErrorCode, FrameInfo, PixelType, SaveImageParams,
    TransportLayer, TransportLayers,
};
use std::cell::RefCell;
use std::ffi::{c_char, c_float, c_int, c_uchar, c_uint, c_ushort, c_void, CString};
use std::ptr::{self, NonNull};

const MV_MAX_DEVICE_NUM: usize = 256;
const INFO_MAX_BUFFER_SIZE: usize = 64;

#[repr(C)]
#[derive(Clone, Copy)]
struct MV_GIGE_DEVICE_INFO {
    nIpCfgOption: c_uint,
    nIpCfgCurrent: c_uint,
    nCurrentIp: c_uint,
    nCurrentSubNetMask: c_uint,
    nDefultGateWay: c_uint,
    chManufacturerName: [c_uchar; 32],
    chModelName: [c_uchar; 32],
    chDeviceVersion: [c_uchar; 32],
    chManufacturerSpecificInfo: [c_uchar; 48],
    chSerialNumber: [c_uchar; 16],
    chUserDefinedName: [c_uchar; 16],
    nNetExport: c_uint,
    nReserved: [c_uint; 4],
}

#[repr(C)]
#[derive(Clone, Copy)]
struct MV_USB3_DEVICE_INFO {
    CrtlInEndPoint: c_uchar,
    CrtlOutEndPoint: c_uchar,
    StreamEndPoint: c_uchar,
    EventEndPoint: c_uchar,
    idVendor: c_ushort,
    idProduct: c_ushort,
    nDeviceNumber: c_uint,
    chDeviceGUID: [c_uchar; INFO_MAX_BUFFER_SIZE],
    chVendorName: [c_uchar; INFO_MAX_BUFFER_SIZE],
    chModelName: [c_uchar; INFO_MAX_BUFFER_SIZE],
    chFamilyName: [c_uchar; INFO_MAX_BUFFER_SIZE],
    chDeviceVersion: [c_uchar; INFO_MAX_BUFFER_SIZE],
    chManufacturerName: [c_uchar; INFO_MAX_BUFFER_SIZE],
    chSerialNumber: [c_uchar; INFO_MAX_BUFFER_SIZE],
    chUserDefinedName: [c_uchar; INFO_MAX_BUFFER_SIZE],
    nbcdUSB: c_uint,
    nDeviceAddress: c_uint,
    nReserved: [c_uint; 2],
}

#[repr(C)]
#[derive(Clone, Copy)]
union MV_SPECIAL_INFO {
    stGigEInfo: MV_GIGE_DEVICE_INFO,
    stUsb3VInfo: MV_USB3_DEVICE_INFO,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct MV_CC_DEVICE_INFO {
    nMajorVer: c_ushort,
    nMinorVer: c_ushort,
    nMacAddrHigh: c_uint,
    nMacAddrLow: c_uint,
    nTLayerType: c_uint,
    nReserved: [c_uint; 4],
    SpecialInfo: MV_SPECIAL_INFO,
}

#[repr(C)]
struct MV_CC_DEVICE_INFO_LIST {
    nDeviceNum: c_uint,
    pDeviceInfo: [*mut MV_CC_DEVICE_INFO; MV_MAX_DEVICE_NUM],
}

#[repr(C)]
struct MVCC_FLOATVALUE {
    fCurValue: c_float,
    fMax: c_float,
    fMin: c_float,
    nReserved: [c_uint; 4],
}

#[repr(C)]
struct MVCC_INTVALUE {
    nCurValue: c_uint,
    nMax: c_uint,
    nMin: c_uint,
    nInc: c_uint,
    nReserved: [c_uint; 4],
}

#[repr(C)]
struct MV_FRAME_OUT_INFO_EX {
    nWidth: c_ushort,
    nHeight: c_ushort,
    enPixelType: c_uint,
    nFrameNum: c_uint,
    nDevTimeStampHigh: c_uint,
    nDevTimeStampLow: c_uint,
    nReserved0: c_uint,
    nHostTimeStamp: i64,
    nFrameLen: c_uint,
    // Chunk data, statistics and vendor reserved words.
    nTail: [c_uint; 128],
}

#[repr(C)]
struct MV_SAVE_IMAGE_PARAM_EX {
    pData: *mut c_uchar,
    nDataLen: c_uint,
    enPixelType: c_uint,
    nWidth: c_ushort,
    nHeight: c_ushort,
    pImageBuffer: *mut c_uchar,
    nImageLen: c_uint,
    nBufferSize: c_uint,
    enImageType: c_uint,
    nJpgQuality: c_uint,
    iMethodValue: c_uint,
    nReserved: [c_uint; 3],
}

#[link(name = "MvCameraControl")]
extern "C" {
    fn MV_CC_EnumDevices(nTLayerType: c_uint, pstDevList: *mut MV_CC_DEVICE_INFO_LIST) -> c_int;
    fn MV_CC_CreateHandle(handle: *mut *mut c_void, pstDevInfo: *const MV_CC_DEVICE_INFO) -> c_int;
    fn MV_CC_DestroyHandle(handle: *mut c_void) -> c_int;
    fn MV_CC_OpenDevice(handle: *mut c_void, nAccessMode: c_uint, nSwitchoverKey: c_ushort) -> c_int;
    fn MV_CC_CloseDevice(handle: *mut c_void) -> c_int;
    fn MV_CC_StartGrabbing(handle: *mut c_void) -> c_int;
    fn MV_CC_StopGrabbing(handle: *mut c_void) -> c_int;
    fn MV_CC_GetOneFrameTimeout(
        handle: *mut c_void,
        pData: *mut c_uchar,
        nDataSize: c_uint,
        pFrameInfo: *mut MV_FRAME_OUT_INFO_EX,
        nMsec: c_uint,
    ) -> c_int;
    fn MV_CC_SetEnumValue(handle: *mut c_void, strKey: *const c_char, nValue: c_uint) -> c_int;
    fn MV_CC_GetFloatValue(handle: *mut c_void, strKey: *const c_char, pFloatValue: *mut MVCC_FLOATVALUE) -> c_int;
    fn MV_CC_SetFloatValue(handle: *mut c_void, strKey: *const c_char, fValue: c_float) -> c_int;
    fn MV_CC_GetIntValue(handle: *mut c_void, strKey: *const c_char, pIntValue: *mut MVCC_INTVALUE) -> c_int;
    fn MV_CC_SaveImageEx2(handle: *mut c_void, pSaveParam: *mut MV_SAVE_IMAGE_PARAM_EX) -> c_int;
}

/// Reads a NUL-padded fixed-size string field.
fn fixed_str(bytes: &[c_uchar]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

fn node_key(key: &str) -> Result<CString, ErrorCode> {
    CString::new(key).map_err(|_| ErrorCode::PARAMETER)
}

/// Handle created by `MV_CC_CreateHandle`.
#[derive(Debug)]
pub struct MvsHandle(NonNull<c_void>);

impl MvsHandle {
    fn raw(&self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// The vendor SDK.
///
/// Keeps the last enumeration list alive, since `MV_CC_CreateHandle`
/// takes a pointer into it.
pub struct MvsSdk {
    list: RefCell<Box<MV_CC_DEVICE_INFO_LIST>>,
}

impl MvsSdk {
    pub fn new() -> Self {
        Self {
            list: RefCell::new(Box::new(MV_CC_DEVICE_INFO_LIST {
                nDeviceNum: 0,
                pDeviceInfo: [ptr::null_mut(); MV_MAX_DEVICE_NUM],
            })),
        }
    }

    fn describe(index: usize, info: &MV_CC_DEVICE_INFO) -> Option<DeviceInfo> {
        let transport = TransportLayer::from_bits(info.nTLayerType)?;
        // SAFETY: the SDK fills the union member matching nTLayerType.
        let (serial, model, user_name) = unsafe {
            match transport {
                TransportLayer::GigE => {
                    let gige = &info.SpecialInfo.stGigEInfo;
                    (
                        fixed_str(&gige.chSerialNumber),
                        fixed_str(&gige.chModelName),
                        fixed_str(&gige.chUserDefinedName),
                    )
                }
                TransportLayer::Usb3 => {
                    let usb = &info.SpecialInfo.stUsb3VInfo;
                    (
                        fixed_str(&usb.chSerialNumber),
                        fixed_str(&usb.chModelName),
                        fixed_str(&usb.chUserDefinedName),
                    )
                }
            }
        };
        Some(DeviceInfo {
            index,
            transport,
            serial,
            model,
            user_name,
        })
    }
}

impl Default for MvsSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraSdk for MvsSdk {
    type Handle = MvsHandle;

    fn enum_devices(&self, layers: TransportLayers) -> Result<Vec<DeviceInfo>, ErrorCode> {
        let mut list = self.list.borrow_mut();
        // SAFETY: `list` is a valid, writable MV_CC_DEVICE_INFO_LIST.
        ErrorCode::check(unsafe { MV_CC_EnumDevices(layers.0, &mut **list) })?;

        let count = (list.nDeviceNum as usize).min(MV_MAX_DEVICE_NUM);
        let mut devices = Vec::with_capacity(count);
        for (index, &entry) in list.pDeviceInfo[..count].iter().enumerate() {
            // SAFETY: the SDK owns the entries until the next enumeration.
            let Some(info) = (unsafe { entry.as_ref() }) else {
                continue;
            };
            match Self::describe(index, info) {
                Some(device) => devices.push(device),
                None => tracing::debug!(
                    index,
                    layer = info.nTLayerType,
                    "Skipping device on unsupported transport layer"
                ),
            }
        }
        Ok(devices)
    }

    fn create_handle(&self, device: &DeviceInfo) -> Result<MvsHandle, ErrorCode> {
        let list = self.list.borrow();
        if device.index >= list.nDeviceNum as usize || device.index >= MV_MAX_DEVICE_NUM {
            return Err(ErrorCode::PARAMETER);
        }
        let entry = list.pDeviceInfo[device.index];
        // SAFETY: entry comes from the current enumeration list.
        let info = unsafe { entry.as_ref() }.ok_or(ErrorCode::PARAMETER)?;
        if Self::describe(device.index, info).map(|d| d.serial).as_deref() != Some(device.serial.as_str()) {
            // Enumeration changed since `device` was produced.
            return Err(ErrorCode::PARAMETER);
        }

        let mut raw: *mut c_void = ptr::null_mut();
        // SAFETY: `raw` is a valid out-pointer, `info` a valid device entry.
        ErrorCode::check(unsafe { MV_CC_CreateHandle(&mut raw, info) })?;
        NonNull::new(raw).map(MvsHandle).ok_or(ErrorCode::HANDLE)
    }

    fn open_device(&self, handle: &MvsHandle, access: AccessMode) -> Result<(), ErrorCode> {
        // SAFETY: handle is live until destroy_handle consumes it.
        ErrorCode::check(unsafe { MV_CC_OpenDevice(handle.raw(), access as c_uint, 0) })
    }

    fn set_enum_value(&self, handle: &MvsHandle, key: &str, value: u32) -> Result<(), ErrorCode> {
        let key = node_key(key)?;
        // SAFETY: live handle, NUL-terminated key.
        ErrorCode::check(unsafe { MV_CC_SetEnumValue(handle.raw(), key.as_ptr(), value) })
    }

    fn get_float_value(&self, handle: &MvsHandle, key: &str) -> Result<f32, ErrorCode> {
        let key = node_key(key)?;
        let mut value = MVCC_FLOATVALUE {
            fCurValue: 0.0,
            fMax: 0.0,
            fMin: 0.0,
            nReserved: [0; 4],
        };
        // SAFETY: live handle, NUL-terminated key, valid out-struct.
        ErrorCode::check(unsafe { MV_CC_GetFloatValue(handle.raw(), key.as_ptr(), &mut value) })?;
        Ok(value.fCurValue)
    }

    fn set_float_value(&self, handle: &MvsHandle, key: &str, value: f32) -> Result<(), ErrorCode> {
        let key = node_key(key)?;
        // SAFETY: live handle, NUL-terminated key.
        ErrorCode::check(unsafe { MV_CC_SetFloatValue(handle.raw(), key.as_ptr(), value) })
    }

    fn get_int_value(&self, handle: &MvsHandle, key: &str) -> Result<u32, ErrorCode> {
        let key = node_key(key)?;
        let mut value = MVCC_INTVALUE {
            nCurValue: 0,
            nMax: 0,
            nMin: 0,
            nInc: 0,
            nReserved: [0; 4],
        };
        // SAFETY: live handle, NUL-terminated key, valid out-struct.
        ErrorCode::check(unsafe { MV_CC_GetIntValue(handle.raw(), key.as_ptr(), &mut value) })?;
        Ok(value.nCurValue)
    }

    fn start_grabbing(&self, handle: &MvsHandle) -> Result<(), ErrorCode> {
        // SAFETY: live handle.
        ErrorCode::check(unsafe { MV_CC_StartGrabbing(handle.raw()) })
    }

    fn get_one_frame_timeout(
        &self,
        handle: &MvsHandle,
        buffer: &mut [u8],
        timeout_ms: u32,
    ) -> Result<FrameInfo, ErrorCode> {
        let size = c_uint::try_from(buffer.len()).map_err(|_| ErrorCode::PARAMETER)?;
        let mut info = MV_FRAME_OUT_INFO_EX {
            nWidth: 0,
            nHeight: 0,
            enPixelType: 0,
            nFrameNum: 0,
            nDevTimeStampHigh: 0,
            nDevTimeStampLow: 0,
            nReserved0: 0,
            nHostTimeStamp: 0,
            nFrameLen: 0,
            nTail: [0; 128],
        };
        // SAFETY: `buffer` is writable for `size` bytes; `info` is a valid out-struct.
        ErrorCode::check(unsafe {
            MV_CC_GetOneFrameTimeout(handle.raw(), buffer.as_mut_ptr(), size, &mut info, timeout_ms)
        })?;
        Ok(FrameInfo {
            width: info.nWidth,
            height: info.nHeight,
            pixel_type: PixelType(info.enPixelType),
            frame_len: info.nFrameLen,
            frame_num: info.nFrameNum,
        })
    }

    fn encode_image(&self, handle: &MvsHandle, params: &SaveImageParams<'_>) -> Result<Vec<u8>, ErrorCode> {
        let frame = params.frame;
        if (frame.frame_len as usize) > params.data.len() {
            return Err(ErrorCode::PARAMETER);
        }
        // Worst case for BMP output is four bytes per pixel plus headers.
        let capacity = usize::from(frame.width) * usize::from(frame.height) * 4 + 2048;
        let mut output = vec![0u8; capacity];
        let mut save = MV_SAVE_IMAGE_PARAM_EX {
            // The SDK only reads the source buffer.
            pData: params.data.as_ptr() as *mut c_uchar,
            nDataLen: frame.frame_len,
            enPixelType: frame.pixel_type.0,
            nWidth: frame.width,
            nHeight: frame.height,
            pImageBuffer: output.as_mut_ptr(),
            nImageLen: 0,
            nBufferSize: c_uint::try_from(capacity).map_err(|_| ErrorCode::PARAMETER)?,
            enImageType: params.image_type as c_uint,
            nJpgQuality: params.jpeg_quality,
            iMethodValue: 0,
            nReserved: [0; 3],
        };
        // SAFETY: both buffers outlive the call and their lengths are passed.
        ErrorCode::check(unsafe { MV_CC_SaveImageEx2(handle.raw(), &mut save) })?;
        output.truncate((save.nImageLen as usize).min(capacity));
        Ok(output)
    }

    fn stop_grabbing(&self, handle: &MvsHandle) -> Result<(), ErrorCode> {
        // SAFETY: live handle.
        ErrorCode::check(unsafe { MV_CC_StopGrabbing(handle.raw()) })
    }

    fn close_device(&self, handle: &MvsHandle) -> Result<(), ErrorCode> {
        // SAFETY: live handle.
        ErrorCode::check(unsafe { MV_CC_CloseDevice(handle.raw()) })
    }

    fn destroy_handle(&self, handle: MvsHandle) -> Result<(), ErrorCode> {
        // SAFETY: consumes the handle; it is never used again.
        ErrorCode::check(unsafe { MV_CC_DestroyHandle(handle.raw()) })
    }
}
