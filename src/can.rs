///
/// can.rs
///
/// Frame types shared between the driver layer and the transport layer: the
/// raw driver-level UnifiedFrame and the protocol-facing CanMessage.
///
use serde::{Deserialize, Serialize};

/// Capacity of the `UnifiedFrame` payload buffer, sized for CAN-FD.
pub const FRAME_BUF_LEN: usize = 64;

/// One CAN/CAN-FD frame as produced by a driver.
///
/// Fields are public and untrusted: `dlc` is whatever the driver declared and
/// may disagree with the real payload length. Consumers must clamp it before
/// indexing into `data`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnifiedFrame {
    pub id: u32,
    pub dlc: i32,
    pub data: [u8; FRAME_BUF_LEN],
    pub is_fd: bool,
}

impl UnifiedFrame {
    /// Builds a frame from a payload slice, zero-padding the buffer and
    /// deriving `dlc` from the slice length. Payloads longer than the buffer
    /// are cut to fit.
    pub fn new(id: u32, data: &[u8], is_fd: bool) -> Self {
        let mut buf = [0u8; FRAME_BUF_LEN];
        let len = data.len().min(FRAME_BUF_LEN);
        buf[..len].copy_from_slice(&data[..len]);
        Self {
            id,
            dlc: len as i32,
            data: buf,
            is_fd,
        }
    }
}

/// The frame shape the transport layer above the adapter consumes.
///
/// `data` always owns exactly `dlc` bytes, copied out of whatever driver
/// storage the frame came from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanMessage {
    pub arbitration_id: u32,
    pub dlc: usize,
    pub data: Vec<u8>,
    /// Always `false`: the bridge does not distinguish 11-bit from 29-bit
    /// identifiers yet.
    pub extended_id: bool,
    pub is_fd: bool,
    /// Always `false`: CAN-FD bitrate switching is not carried through.
    pub bitrate_switch: bool,
}

impl CanMessage {
    pub fn new(arbitration_id: u32, data: &[u8]) -> Self {
        Self {
            arbitration_id,
            dlc: data.len(),
            data: data.to_vec(),
            extended_id: false,
            is_fd: false,
            bitrate_switch: false,
        }
    }
}
