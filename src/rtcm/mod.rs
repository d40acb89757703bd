//! RTCM3 framing and message decoding
use crate::{error::Error, prelude::Ephemeris};

pub mod bits;
pub mod crc;
pub mod ephemeris;
pub mod framer;
pub mod msm7;
pub mod station;

use msm7::Msm7;
use station::StationCoordinates;

/// Framed RTCM3 message, as delimited by [framer::FrameSync]
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    /// Message number (first 12 bits of payload)
    pub msg_type: u16,
    /// Payload (message number included)
    pub payload: Vec<u8>,
    /// CRC-24Q check result
    pub crc_valid: bool,
}

/// Decoded RTCM3 message
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// GPS MSM7 observations (1077)
    Msm7(Msm7),
    /// GPS broadcast ephemeris (1019)
    Ephemeris(Ephemeris),
    /// Reference station coordinates (1005/1006)
    StationCoordinates(StationCoordinates),
    /// Any other message number
    Unsupported(u16),
}

impl RawMessage {
    /// Decodes this [RawMessage] into [Message]
    pub fn decode(&self) -> Result<Message, Error> {
        match self.msg_type {
            msm7::MSM7_GPS => Ok(Message::Msm7(Msm7::decode(self)?)),
            ephemeris::EPHEMERIS_GPS => Ok(Message::Ephemeris(Ephemeris::decode(self)?)),
            station::STATION_ARP | station::STATION_ARP_HEIGHT => Ok(
                Message::StationCoordinates(StationCoordinates::decode(self)?),
            ),
            msg_type => Ok(Message::Unsupported(msg_type)),
        }
    }
}
