//! Reference station coordinates (messages 1005 / 1006)
use log::debug;
use nalgebra::Vector3;

use crate::{
    error::Error,
    rtcm::{bits::BitReader, RawMessage},
};

/// Stationary antenna reference point
pub const STATION_ARP: u16 = 1005;

/// Stationary antenna reference point, with antenna height
pub const STATION_ARP_HEIGHT: u16 = 1006;

const COORDINATE_SCALE: f64 = 1.0E-4;

/// Reference station coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StationCoordinates {
    /// Reference station ID
    pub station_id: u16,
    /// ITRF realization year
    pub itrf_year: u8,
    /// Station provides GPS observations
    pub gps: bool,
    /// Station provides GLONASS observations
    pub glonass: bool,
    /// Station provides Galileo observations
    pub galileo: bool,
    /// Physical (not virtual / computed) reference station
    pub reference_station: bool,
    /// Antenna reference point, in meters ECEF
    pub arp_ecef_m: (f64, f64, f64),
    /// All raw measurements are driven by the same oscillator
    pub single_oscillator: bool,
    /// Quarter cycle indicator
    pub quarter_cycle: u8,
    /// Antenna height above marker (1006 only)
    pub antenna_height_m: Option<f64>,
}

impl StationCoordinates {
    /// Antenna reference point, as ECEF vector
    pub fn arp(&self) -> Vector3<f64> {
        Vector3::new(self.arp_ecef_m.0, self.arp_ecef_m.1, self.arp_ecef_m.2)
    }

    /// Decodes [StationCoordinates] from a 1005/1006 [RawMessage]
    pub fn decode(msg: &RawMessage) -> Result<Self, Error> {
        match msg.msg_type {
            STATION_ARP | STATION_ARP_HEIGHT => Self::decode_payload(&msg.payload),
            msg_type => Err(Error::UnexpectedMessage(msg_type)),
        }
    }

    /// Decodes [StationCoordinates] from message payload (message number included)
    pub fn decode_payload(payload: &[u8]) -> Result<Self, Error> {
        let mut r = BitReader::new(payload);

        let msg_type = r.read_unsigned(12).ok_or(Error::NotEnoughBits)? as u16;
        if msg_type != STATION_ARP && msg_type != STATION_ARP_HEIGHT {
            return Err(Error::UnexpectedMessage(msg_type));
        }

        let station_id = r.read_unsigned(12).ok_or(Error::NotEnoughBits)? as u16;
        let itrf_year = r.read_unsigned(6).ok_or(Error::NotEnoughBits)? as u8;
        let gps = r.read_bool().ok_or(Error::NotEnoughBits)?;
        let glonass = r.read_bool().ok_or(Error::NotEnoughBits)?;
        let galileo = r.read_bool().ok_or(Error::NotEnoughBits)?;
        let reference_station = r.read_bool().ok_or(Error::NotEnoughBits)?;
        let x = r.read_signed_long(38).ok_or(Error::NotEnoughBits)?;
        let single_oscillator = r.read_bool().ok_or(Error::NotEnoughBits)?;
        r.skip(1).ok_or(Error::NotEnoughBits)?;
        let y = r.read_signed_long(38).ok_or(Error::NotEnoughBits)?;
        let quarter_cycle = r.read_unsigned(2).ok_or(Error::NotEnoughBits)? as u8;
        let z = r.read_signed_long(38).ok_or(Error::NotEnoughBits)?;

        let antenna_height_m = if msg_type == STATION_ARP_HEIGHT {
            let height = r.read_unsigned(16).ok_or(Error::NotEnoughBits)?;
            Some(height as f64 * COORDINATE_SCALE)
        } else {
            None
        };

        let arp_ecef_m = (
            x as f64 * COORDINATE_SCALE,
            y as f64 * COORDINATE_SCALE,
            z as f64 * COORDINATE_SCALE,
        );

        debug!(
            "station {}: arp x={:.4} y={:.4} z={:.4}",
            station_id, arp_ecef_m.0, arp_ecef_m.1, arp_ecef_m.2
        );

        Ok(Self {
            station_id,
            itrf_year,
            gps,
            glonass,
            galileo,
            reference_station,
            arp_ecef_m,
            single_oscillator,
            quarter_cycle,
            antenna_height_m,
        })
    }
}
