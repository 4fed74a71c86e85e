//! `#[repr(C)]` mirrors of the HCNetSDK structures this workspace marshals.
//!
//! Layouts follow `HCNetSDK.h`. Only the structures needed for login,
//! JPEG capture and the focus/zoom configuration block are mirrored.

use serde::Serialize;

/// Length of the serial number field in `NET_DVR_DEVICEINFO_V30`.
pub const SERIALNO_LEN: usize = 48;

/// `NET_DVR_GetDVRConfig` command reading the focus mode block.
pub const NET_DVR_GET_FOCUSMODECFG: u32 = 3305;

/// `NET_DVR_SetDVRConfig` command writing the focus mode block.
pub const NET_DVR_SET_FOCUSMODECFG: u32 = 3306;

/// Buffer size passed to the get/set config calls for the focus block.
///
/// The SDK is handed a buffer of this size regardless of the structure's
/// own size; marshaling code must back the structure with at least this
/// many bytes.
pub const CONFIG_BUFFER_SIZE: u32 = 255;

/// Handle value meaning "no user logged in".
pub const INVALID_USER_ID: i32 = -1;

/// Device information filled in by `NET_DVR_Login_V30`.
///
/// ```c
/// typedef struct {
///     BYTE sSerialNumber[SERIALNO_LEN];
///     BYTE byAlarmInPortNum;
///     ...
///     WORD wStartMirrorChanNo;
///     BYTE bySupport7;
///     BYTE byRes2;
/// } NET_DVR_DEVICEINFO_V30;
/// ```
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceInfoV30 {
    pub serial_number: [u8; SERIALNO_LEN],
    pub alarm_in_port_num: u8,
    pub alarm_out_port_num: u8,
    pub disk_num: u8,
    pub dvr_type: u8,
    pub chan_num: u8,
    pub start_chan: u8,
    pub audio_chan_num: u8,
    pub ip_chan_num: u8,
    pub zero_chan_num: u8,
    pub main_proto: u8,
    pub sub_proto: u8,
    pub support: u8,
    pub support1: u8,
    pub support2: u8,
    pub dev_type: u16,
    pub support3: u8,
    pub multi_stream_proto: u8,
    pub start_d_chan: u8,
    pub start_d_talk_chan: u8,
    pub high_d_chan_num: u8,
    pub support4: u8,
    pub language_type: u8,
    pub voice_in_chan_num: u8,
    pub start_voice_in_chan_no: u8,
    pub support5: u8,
    pub support6: u8,
    pub mirror_chan_num: u8,
    pub start_mirror_chan_no: u16,
    pub support7: u8,
    pub res2: u8,
}

impl Default for DeviceInfoV30 {
    fn default() -> Self {
        Self {
            serial_number: [0; SERIALNO_LEN],
            alarm_in_port_num: 0,
            alarm_out_port_num: 0,
            disk_num: 0,
            dvr_type: 0,
            chan_num: 0,
            start_chan: 0,
            audio_chan_num: 0,
            ip_chan_num: 0,
            zero_chan_num: 0,
            main_proto: 0,
            sub_proto: 0,
            support: 0,
            support1: 0,
            support2: 0,
            dev_type: 0,
            support3: 0,
            multi_stream_proto: 0,
            start_d_chan: 0,
            start_d_talk_chan: 0,
            high_d_chan_num: 0,
            support4: 0,
            language_type: 0,
            voice_in_chan_num: 0,
            start_voice_in_chan_no: 0,
            support5: 0,
            support6: 0,
            mirror_chan_num: 0,
            start_mirror_chan_no: 0,
            support7: 0,
            res2: 0,
        }
    }
}

impl DeviceInfoV30 {
    /// Serial number with trailing NUL padding stripped.
    pub fn serial(&self) -> String {
        let end = self
            .serial_number
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(SERIALNO_LEN);
        String::from_utf8_lossy(&self.serial_number[..end]).trim().to_string()
    }

    /// Condensed view used for reporting.
    pub fn summary(&self) -> DeviceSummary {
        DeviceSummary {
            serial: self.serial(),
            device_type: self.dev_type,
            analog_channels: self.chan_num,
            first_channel: self.start_chan,
            ip_channels: self.ip_chan_num,
            disks: self.disk_num,
            alarm_inputs: self.alarm_in_port_num,
            alarm_outputs: self.alarm_out_port_num,
        }
    }
}

/// Serializable subset of [`DeviceInfoV30`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
    pub serial: String,
    pub device_type: u16,
    pub analog_channels: u8,
    pub first_channel: u8,
    pub ip_channels: u8,
    pub disks: u8,
    pub alarm_inputs: u8,
    pub alarm_outputs: u8,
}

/// JPEG capture parameters (`NET_DVR_JPEGPARA`).
///
/// A zeroed value asks the device for its default size and best quality.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JpegPara {
    pub pic_size: u16,
    pub pic_quality: u16,
}

/// Focus mode configuration block (`NET_DVR_FOCUSMODE_CFG`).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocusModeCfg {
    pub size: u32,
    pub focus_mode: u8,
    pub auto_focus_mode: u8,
    pub min_focus_distance: u16,
    pub zoom_speed_level: u8,
    pub focus_speed_level: u8,
    pub optical_zoom: u8,
    pub digital_zoom: u8,
    pub optical_zoom_level: f32,
    pub focus_pos: u32,
    pub focus_definition_display: u8,
    pub focus_sensitivity: u8,
    pub res1: [u8; 2],
    pub relative_focus_pos: u32,
    pub res: [u8; 48],
}

impl Default for FocusModeCfg {
    fn default() -> Self {
        Self {
            size: std::mem::size_of::<Self>() as u32,
            focus_mode: 0,
            auto_focus_mode: 0,
            min_focus_distance: 0,
            zoom_speed_level: 0,
            focus_speed_level: 0,
            optical_zoom: 0,
            digital_zoom: 0,
            optical_zoom_level: 0.0,
            focus_pos: 0,
            focus_definition_display: 0,
            focus_sensitivity: 0,
            res1: [0; 2],
            relative_focus_pos: 0,
            res: [0; 48],
        }
    }
}
