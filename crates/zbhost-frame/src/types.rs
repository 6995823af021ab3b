//! Frame type and ZDO cluster tags.

use serde::{Deserialize, Serialize};

use crate::FrameError;

/// Device frame types understood by the host.
///
/// The numeric codes are the command ids the transceiver firmware uses on
/// the wire. The serialised form is the snake_case variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameType {
    /// Confirmation that an APS data request was transmitted.
    ApsDataConfirm,
    /// Query of the device state flags.
    DeviceState,
    /// Request to change the network state (join/leave).
    ChangeNetworkState,
    /// Read a device parameter.
    ReadParameter,
    /// Write a device parameter.
    WriteParameter,
    /// Firmware version query.
    Version,
    /// Unsolicited device state change notification.
    DeviceStateChanged,
    /// Outbound APS data request.
    ApsDataRequest,
    /// Inbound APS data (read from the device's receive queue).
    ApsDataIndication,
    /// MAC poll indication from an end device.
    MacPollIndication,
}

impl FrameType {
    /// All known frame types, in code order.
    pub const ALL: [FrameType; 10] = [
        FrameType::ApsDataConfirm,
        FrameType::DeviceState,
        FrameType::ChangeNetworkState,
        FrameType::ReadParameter,
        FrameType::WriteParameter,
        FrameType::Version,
        FrameType::DeviceStateChanged,
        FrameType::ApsDataRequest,
        FrameType::ApsDataIndication,
        FrameType::MacPollIndication,
    ];

    /// Wire command id for this frame type.
    pub const fn code(self) -> u8 {
        match self {
            FrameType::ApsDataConfirm => 0x04,
            FrameType::DeviceState => 0x07,
            FrameType::ChangeNetworkState => 0x08,
            FrameType::ReadParameter => 0x0A,
            FrameType::WriteParameter => 0x0B,
            FrameType::Version => 0x0D,
            FrameType::DeviceStateChanged => 0x0E,
            FrameType::ApsDataRequest => 0x12,
            FrameType::ApsDataIndication => 0x17,
            FrameType::MacPollIndication => 0x1C,
        }
    }

    /// Look up a frame type by its wire command id.
    pub fn from_code(code: u8) -> Result<Self, FrameError> {
        FrameType::ALL
            .iter()
            .copied()
            .find(|t| t.code() == code)
            .ok_or(FrameError::UnknownFrameType(code))
    }

    /// Human-readable name, as used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            FrameType::ApsDataConfirm => "APS_DATA_CONFIRM",
            FrameType::DeviceState => "DEVICE_STATE",
            FrameType::ChangeNetworkState => "CHANGE_NETWORK_STATE",
            FrameType::ReadParameter => "READ_PARAMETER",
            FrameType::WriteParameter => "WRITE_PARAMETER",
            FrameType::Version => "VERSION",
            FrameType::DeviceStateChanged => "DEVICE_STATE_CHANGED",
            FrameType::ApsDataRequest => "APS_DATA_REQUEST",
            FrameType::ApsDataIndication => "APS_DATA_INDICATION",
            FrameType::MacPollIndication => "MAC_POLL",
        }
    }
}

impl std::fmt::Display for FrameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// ZDO cluster ids that the host sub-dispatches on.
///
/// Responses are the request id with the high bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ZdoCluster {
    NetworkAddressRequest,
    IeeeAddressRequest,
    NodeDescriptorRequest,
    SimpleDescriptorRequest,
    ActiveEndpointsRequest,
    ManagementLqiRequest,
    ManagementLeaveRequest,
    NetworkAddressResponse,
    IeeeAddressResponse,
    NodeDescriptorResponse,
    SimpleDescriptorResponse,
    ActiveEndpointsResponse,
    ManagementLqiResponse,
    ManagementLeaveResponse,
}

impl ZdoCluster {
    const ALL: [ZdoCluster; 14] = [
        ZdoCluster::NetworkAddressRequest,
        ZdoCluster::IeeeAddressRequest,
        ZdoCluster::NodeDescriptorRequest,
        ZdoCluster::SimpleDescriptorRequest,
        ZdoCluster::ActiveEndpointsRequest,
        ZdoCluster::ManagementLqiRequest,
        ZdoCluster::ManagementLeaveRequest,
        ZdoCluster::NetworkAddressResponse,
        ZdoCluster::IeeeAddressResponse,
        ZdoCluster::NodeDescriptorResponse,
        ZdoCluster::SimpleDescriptorResponse,
        ZdoCluster::ActiveEndpointsResponse,
        ZdoCluster::ManagementLqiResponse,
        ZdoCluster::ManagementLeaveResponse,
    ];

    /// The 16-bit cluster id.
    pub const fn id(self) -> u16 {
        match self {
            ZdoCluster::NetworkAddressRequest => 0x0000,
            ZdoCluster::IeeeAddressRequest => 0x0001,
            ZdoCluster::NodeDescriptorRequest => 0x0002,
            ZdoCluster::SimpleDescriptorRequest => 0x0004,
            ZdoCluster::ActiveEndpointsRequest => 0x0005,
            ZdoCluster::ManagementLqiRequest => 0x0031,
            ZdoCluster::ManagementLeaveRequest => 0x0034,
            ZdoCluster::NetworkAddressResponse => 0x8000,
            ZdoCluster::IeeeAddressResponse => 0x8001,
            ZdoCluster::NodeDescriptorResponse => 0x8002,
            ZdoCluster::SimpleDescriptorResponse => 0x8004,
            ZdoCluster::ActiveEndpointsResponse => 0x8005,
            ZdoCluster::ManagementLqiResponse => 0x8031,
            ZdoCluster::ManagementLeaveResponse => 0x8034,
        }
    }

    /// Look up a cluster by id. Returns `None` for clusters the host does
    /// not know about.
    pub fn from_id(id: u16) -> Option<Self> {
        ZdoCluster::ALL.iter().copied().find(|c| c.id() == id)
    }

    /// Whether this is a response cluster.
    pub const fn is_response(self) -> bool {
        self.id() & 0x8000 != 0
    }
}

impl std::fmt::Display for ZdoCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} (0x{:04X})", self, self.id())
    }
}
