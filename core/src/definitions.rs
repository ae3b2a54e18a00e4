use bitflags::bitflags;

bitflags! {
    /// Optional behaviour a discovery collaborator may support.
    #[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
    pub struct Capabilities: u8 {
        /// Listing preference items are honoured when ordering routes.
        const LISTING_PREFERENCE = 0x01;
        /// Playback may be transferred to a route outside the active session.
        const TRANSFER = 0x02;
    }
}

/// Kind of playback endpoint reported by the discovery service.
///
/// Numeric codes follow the platform router. Codes the engine does not know are kept as
/// [`RouteType::Unrecognized`] so they can be reported and skipped during classification.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum RouteType {
    #[default]
    Unknown,
    BuiltinSpeaker,
    WiredHeadset,
    WiredHeadphones,
    BluetoothA2dp,
    Hdmi,
    HdmiArc,
    HdmiEarc,
    UsbDevice,
    UsbAccessory,
    Dock,
    UsbHeadset,
    HearingAid,
    BleHeadset,
    RemoteTv,
    RemoteSpeaker,
    RemoteAudioVideoReceiver,
    RemoteTablet,
    RemoteTabletDocked,
    RemoteComputer,
    RemoteGameConsole,
    RemoteCar,
    RemoteSmartwatch,
    RemoteSmartphone,
    Group,
    Unrecognized(u32),
}

impl RouteType {
    pub fn code(&self) -> u32 {
        match self {
            RouteType::Unknown => 0,
            RouteType::BuiltinSpeaker => 2,
            RouteType::WiredHeadset => 3,
            RouteType::WiredHeadphones => 4,
            RouteType::BluetoothA2dp => 8,
            RouteType::Hdmi => 9,
            RouteType::HdmiArc => 10,
            RouteType::UsbDevice => 11,
            RouteType::UsbAccessory => 12,
            RouteType::Dock => 13,
            RouteType::UsbHeadset => 22,
            RouteType::HearingAid => 23,
            RouteType::BleHeadset => 26,
            RouteType::HdmiEarc => 29,
            RouteType::RemoteTv => 1001,
            RouteType::RemoteSpeaker => 1002,
            RouteType::RemoteAudioVideoReceiver => 1003,
            RouteType::RemoteTablet => 1004,
            RouteType::RemoteTabletDocked => 1005,
            RouteType::RemoteComputer => 1006,
            RouteType::RemoteGameConsole => 1007,
            RouteType::RemoteCar => 1008,
            RouteType::RemoteSmartwatch => 1009,
            RouteType::RemoteSmartphone => 1010,
            RouteType::Group => 2000,
            RouteType::Unrecognized(code) => *code,
        }
    }

    /// Routes of these types are backed by a bonded Bluetooth peer.
    pub fn is_bluetooth(&self) -> bool {
        matches!(self, RouteType::HearingAid | RouteType::BluetoothA2dp | RouteType::BleHeadset)
    }
}

impl From<u32> for RouteType {
    fn from(code: u32) -> Self {
        match code {
            0 => RouteType::Unknown,
            2 => RouteType::BuiltinSpeaker,
            3 => RouteType::WiredHeadset,
            4 => RouteType::WiredHeadphones,
            8 => RouteType::BluetoothA2dp,
            9 => RouteType::Hdmi,
            10 => RouteType::HdmiArc,
            11 => RouteType::UsbDevice,
            12 => RouteType::UsbAccessory,
            13 => RouteType::Dock,
            22 => RouteType::UsbHeadset,
            23 => RouteType::HearingAid,
            26 => RouteType::BleHeadset,
            29 => RouteType::HdmiEarc,
            1001 => RouteType::RemoteTv,
            1002 => RouteType::RemoteSpeaker,
            1003 => RouteType::RemoteAudioVideoReceiver,
            1004 => RouteType::RemoteTablet,
            1005 => RouteType::RemoteTabletDocked,
            1006 => RouteType::RemoteComputer,
            1007 => RouteType::RemoteGameConsole,
            1008 => RouteType::RemoteCar,
            1009 => RouteType::RemoteSmartwatch,
            1010 => RouteType::RemoteSmartphone,
            2000 => RouteType::Group,
            other => RouteType::Unrecognized(other),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum VolumeHandling {
    #[default]
    Fixed,
    Variable,
}

/// Selection state of a synthesized device.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum DeviceState {
    #[default]
    Available,
    Selected,
}
