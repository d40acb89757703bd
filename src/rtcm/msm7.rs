//! GPS MSM7 (message 1077) decoder
use log::{debug, trace};

use crate::{
    constants::SPEED_OF_LIGHT_M_S,
    error::Error,
    prelude::SignalType,
    rtcm::{bits::BitReader, RawMessage},
};

/// GPS MSM7 message number
pub const MSM7_GPS: u16 = 1077;

/// Bit position of the satellite mask
const SATELLITE_MASK_OFFSET: usize = 73;

/// Bit position of the signal mask
const SIGNAL_MASK_OFFSET: usize = 137;

/// Bit position of the cell mask
const CELL_MASK_OFFSET: usize = 169;

/// Largest cell mask the protocol allows
const MAX_CELLS: usize = 64;

/// Rough range (integer ms) marking an invalid satellite
const INVALID_ROUGH_RANGE: u32 = 255;

/// Fine pseudo range marking an invalid cell
const INVALID_FINE_PSEUDO_RANGE: i32 = -(1 << 19);

/// Fine phase range marking an invalid cell
const INVALID_FINE_PHASE_RANGE: i32 = -(1 << 23);

/// Rough phase range rate marking an invalid value
const INVALID_ROUGH_RATE: i32 = -(1 << 13);

/// Fine phase range rate marking an invalid value
const INVALID_FINE_RATE: i32 = -(1 << 14);

const P2_4: f64 = 1.0 / 16.0;
const P2_10: f64 = 1.0 / 1024.0;
const P2_29: f64 = 1.0 / 536_870_912.0;
const P2_31: f64 = 1.0 / 2_147_483_648.0;

/// Range (in meters) of one light-millisecond
const RANGE_MS: f64 = SPEED_OF_LIGHT_M_S / 1000.0;

/// Converts a (DF407) lock time indicator to the minimal lock time in ms
pub fn minimum_lock_time_ms(indicator: u16) -> u64 {
    let i = indicator as u64;
    match i {
        0..=63 => i,
        64..=704 => {
            let n = i / 32 - 1;
            (1 << n) * (i - 32 * n)
        },
        _ => 0,
    }
}

/// MSM7 header content
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Msm7Header {
    /// Reference station ID
    pub station_id: u16,
    /// GPS epoch time (time of week) in milliseconds
    pub tow_ms: u32,
    /// True when more MSM messages follow for this very epoch
    pub multiple_message: bool,
    /// Issue of data station
    pub iods: u8,
    /// Clock steering indicator
    pub clock_steering: u8,
    /// External clock indicator
    pub external_clock: u8,
    /// Divergence free smoothing indicator
    pub smoothing: bool,
    /// Smoothing interval indicator
    pub smoothing_interval: u8,
}

impl Msm7Header {
    /// Time of week in seconds
    pub fn tow(&self) -> f64 {
        self.tow_ms as f64 / 1000.0
    }
}

/// One (satellite, signal) cell of an MSM7 message
#[derive(Debug, Clone, PartialEq)]
pub struct Msm7Cell {
    /// Signal tracked in this cell
    pub signal: SignalType,
    /// Raw fine pseudo range (2^-29 ms)
    pub fine_pseudo_range: i32,
    /// Raw fine phase range (2^-31 ms)
    pub fine_phase_range: i32,
    /// Lock time indicator (DF407)
    pub lock_time_indicator: u16,
    /// Half cycle ambiguity indicator
    pub half_cycle_ambiguity: bool,
    /// Carrier to noise ratio, in dB.Hz
    pub cnr_dbhz: f64,
    /// Raw fine phase range rate (0.0001 m/s)
    pub fine_range_rate: i32,
}

/// Per satellite content of an MSM7 message
#[derive(Debug, Clone, PartialEq)]
pub struct Msm7Satellite {
    /// Satellite PRN number
    pub prn: u8,
    /// Integer number of milliseconds in rough range
    pub rough_range_ms: u32,
    /// Extended satellite information
    pub extended_info: u8,
    /// Rough range modulo 1 ms (2^-10 ms)
    pub rough_range_mod_ms: u32,
    /// Rough phase range rate (m/s)
    pub rough_range_rate: i32,
    /// Cells tracked for this satellite, in signal mask order
    pub cells: Vec<Msm7Cell>,
}

impl Msm7Satellite {
    /// True when rough range holds the invalid marker
    pub fn is_valid(&self) -> bool {
        self.rough_range_ms != INVALID_ROUGH_RANGE
    }

    fn rough_ms(&self) -> f64 {
        self.rough_range_ms as f64 + self.rough_range_mod_ms as f64 * P2_10
    }

    /// Pseudo range in meters for given cell
    pub fn pseudo_range_m(&self, cell: &Msm7Cell) -> Option<f64> {
        if !self.is_valid() || cell.fine_pseudo_range == INVALID_FINE_PSEUDO_RANGE {
            return None;
        }
        Some(RANGE_MS * (self.rough_ms() + cell.fine_pseudo_range as f64 * P2_29))
    }

    /// Phase range in meters for given cell
    pub fn phase_range_m(&self, cell: &Msm7Cell) -> Option<f64> {
        if !self.is_valid() || cell.fine_phase_range == INVALID_FINE_PHASE_RANGE {
            return None;
        }
        Some(RANGE_MS * (self.rough_ms() + cell.fine_phase_range as f64 * P2_31))
    }

    /// Phase range rate in m/s for given cell
    pub fn range_rate_m_s(&self, cell: &Msm7Cell) -> Option<f64> {
        if self.rough_range_rate == INVALID_ROUGH_RATE || cell.fine_range_rate == INVALID_FINE_RATE
        {
            return None;
        }
        Some(self.rough_range_rate as f64 + cell.fine_range_rate as f64 * 1.0E-4)
    }
}

/// Decoded GPS MSM7 message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Msm7 {
    pub header: Msm7Header,
    /// Satellites, in ascending PRN order
    pub satellites: Vec<Msm7Satellite>,
}

impl Msm7 {
    /// Decodes [Msm7] from [RawMessage]
    pub fn decode(msg: &RawMessage) -> Result<Self, Error> {
        if msg.msg_type != MSM7_GPS {
            return Err(Error::UnexpectedMessage(msg.msg_type));
        }
        Self::decode_payload(&msg.payload)
    }

    /// Decodes [Msm7] from message payload (message number included)
    pub fn decode_payload(payload: &[u8]) -> Result<Self, Error> {
        let mut reader = BitReader::new(payload);

        let msg_type = reader.read_unsigned(12).ok_or(Error::NotEnoughBits)? as u16;
        if msg_type != MSM7_GPS {
            return Err(Error::UnexpectedMessage(msg_type));
        }

        let header = Msm7Header {
            station_id: reader.read_unsigned(12).ok_or(Error::NotEnoughBits)? as u16,
            tow_ms: reader.read_unsigned(30).ok_or(Error::NotEnoughBits)?,
            multiple_message: reader.read_bool().ok_or(Error::NotEnoughBits)?,
            iods: reader.read_unsigned(3).ok_or(Error::NotEnoughBits)? as u8,
            clock_steering: {
                reader.skip(7).ok_or(Error::NotEnoughBits)?;
                reader.read_unsigned(2).ok_or(Error::NotEnoughBits)? as u8
            },
            external_clock: reader.read_unsigned(2).ok_or(Error::NotEnoughBits)? as u8,
            smoothing: reader.read_bool().ok_or(Error::NotEnoughBits)?,
            smoothing_interval: reader.read_unsigned(3).ok_or(Error::NotEnoughBits)? as u8,
        };

        debug_assert_eq!(reader.position(), SATELLITE_MASK_OFFSET);

        let sat_mask = reader.read_unsigned_long(64).ok_or(Error::NotEnoughBits)?;
        let prns = (0..64)
            .filter(|i| (sat_mask >> (63 - i)) & 0x01 == 1)
            .map(|i| i as u8 + 1)
            .collect::<Vec<_>>();

        debug_assert_eq!(reader.position(), SIGNAL_MASK_OFFSET);

        let sig_mask = reader.read_unsigned(32).ok_or(Error::NotEnoughBits)?;
        let signals = (0..32)
            .filter(|i| (sig_mask >> (31 - i)) & 0x01 == 1)
            .map(|i| SignalType::from_rtcm_slot(i + 1))
            .collect::<Vec<_>>();

        let (nsat, nsig) = (prns.len(), signals.len());
        if nsat * nsig > MAX_CELLS {
            return Err(Error::CellMaskMismatch(nsat, nsig));
        }

        debug_assert_eq!(reader.position(), CELL_MASK_OFFSET);

        let cell_mask = reader
            .read_unsigned_bulk(nsat * nsig, 1)
            .ok_or(Error::NotEnoughBits)?
            .into_iter()
            .map(|b| b == 1)
            .collect::<Vec<_>>();

        let ncell = cell_mask.iter().filter(|b| **b).count();

        trace!(
            "msm7: station={} tow={}ms nsat={} nsig={} ncell={}",
            header.station_id,
            header.tow_ms,
            nsat,
            nsig,
            ncell
        );

        // satellite data, field by field
        let rough_ms = reader
            .read_unsigned_bulk(nsat, 8)
            .ok_or(Error::NotEnoughBits)?;
        let ext_info = reader
            .read_unsigned_bulk(nsat, 4)
            .ok_or(Error::NotEnoughBits)?;
        let rough_mod = reader
            .read_unsigned_bulk(nsat, 10)
            .ok_or(Error::NotEnoughBits)?;
        let rough_rate = reader
            .read_signed_bulk(nsat, 14)
            .ok_or(Error::NotEnoughBits)?;

        // signal data, field by field
        let fine_pr = reader
            .read_signed_bulk(ncell, 20)
            .ok_or(Error::NotEnoughBits)?;
        let fine_ph = reader
            .read_signed_bulk(ncell, 24)
            .ok_or(Error::NotEnoughBits)?;
        let lock_time = reader
            .read_unsigned_bulk(ncell, 10)
            .ok_or(Error::NotEnoughBits)?;
        let half_cycle = reader
            .read_unsigned_bulk(ncell, 1)
            .ok_or(Error::NotEnoughBits)?;
        let cnr = reader
            .read_unsigned_bulk(ncell, 10)
            .ok_or(Error::NotEnoughBits)?;
        let fine_rate = reader
            .read_signed_bulk(ncell, 15)
            .ok_or(Error::NotEnoughBits)?;

        let mut cell = 0;
        let mut satellites = Vec::with_capacity(nsat);

        for (i, prn) in prns.iter().enumerate() {
            let mut cells = Vec::with_capacity(nsig);

            for (j, signal) in signals.iter().enumerate() {
                if !cell_mask[i * nsig + j] {
                    continue;
                }
                cells.push(Msm7Cell {
                    signal: *signal,
                    fine_pseudo_range: fine_pr[cell],
                    fine_phase_range: fine_ph[cell],
                    lock_time_indicator: lock_time[cell] as u16,
                    half_cycle_ambiguity: half_cycle[cell] == 1,
                    cnr_dbhz: cnr[cell] as f64 * P2_4,
                    fine_range_rate: fine_rate[cell],
                });
                cell += 1;
            }

            satellites.push(Msm7Satellite {
                prn: *prn,
                rough_range_ms: rough_ms[i],
                extended_info: ext_info[i] as u8,
                rough_range_mod_ms: rough_mod[i],
                rough_range_rate: rough_rate[i],
                cells,
            });
        }

        debug!(
            "msm7: tow={} - {} satellites (multiple message: {})",
            header.tow(),
            satellites.len(),
            header.multiple_message
        );

        Ok(Self { header, satellites })
    }
}
