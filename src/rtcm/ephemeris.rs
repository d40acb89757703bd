//! GPS broadcast ephemeris (message 1019) decoder
use log::debug;

use crate::{
    constants::GPS_PI,
    error::Error,
    prelude::Ephemeris,
    rtcm::{bits::BitReader, RawMessage},
};

/// GPS ephemeris message number
pub const EPHEMERIS_GPS: u16 = 1019;

/// Payload size, in bits
pub const EPHEMERIS_GPS_BITS: usize = 488;

/// GPS week rollover applied to the 10 bit week number
const WEEK_ROLLOVER: u16 = 2048;

fn u(r: &mut BitReader<'_>, n: usize) -> u32 {
    r.read_unsigned(n).unwrap_or_default()
}

fn s(r: &mut BitReader<'_>, n: usize) -> f64 {
    r.read_signed(n).unwrap_or_default() as f64
}

const P2_5: f64 = 0.03125;
const P2_19: f64 = 1.0 / 524_288.0;
const P2_29: f64 = 1.0 / 536_870_912.0;
const P2_31: f64 = 1.0 / 2_147_483_648.0;
const P2_33: f64 = 1.0 / 8_589_934_592.0;
const P2_43: f64 = 1.0 / 8_796_093_022_208.0;
const P2_55: f64 = 1.0 / 36_028_797_018_963_968.0;

impl Ephemeris {
    /// Decodes [Ephemeris] from a 1019 [RawMessage]
    pub fn decode(msg: &RawMessage) -> Result<Self, Error> {
        if msg.msg_type != EPHEMERIS_GPS {
            return Err(Error::UnexpectedMessage(msg.msg_type));
        }
        Self::decode_payload(&msg.payload)
    }

    /// Decodes [Ephemeris] from message payload (message number included)
    pub fn decode_payload(payload: &[u8]) -> Result<Self, Error> {
        let mut r = BitReader::new(payload);

        if r.remaining() < EPHEMERIS_GPS_BITS {
            return Err(Error::NotEnoughBits);
        }

        let msg_type = r.read_unsigned(12).ok_or(Error::NotEnoughBits)? as u16;
        if msg_type != EPHEMERIS_GPS {
            return Err(Error::UnexpectedMessage(msg_type));
        }

        // the length check above guarantees every read below
        let prn = u(&mut r, 6) as u8;
        let week = u(&mut r, 10) as u16 + WEEK_ROLLOVER;
        let sv_accuracy = u(&mut r, 4) as u8;
        let code_on_l2 = u(&mut r, 2) as u8;
        let idot = s(&mut r, 14) * P2_43 * GPS_PI;
        let iode = u(&mut r, 8) as u8;
        let toc = u(&mut r, 16) as f64 * 16.0;
        let af2 = s(&mut r, 8) * P2_55;
        let af1 = s(&mut r, 16) * P2_43;
        let af0 = s(&mut r, 22) * P2_31;
        let iodc = u(&mut r, 10) as u16;
        let crs = s(&mut r, 16) * P2_5;
        let delta_n = s(&mut r, 16) * P2_43 * GPS_PI;
        let m0 = s(&mut r, 32) * P2_31 * GPS_PI;
        let cuc = s(&mut r, 16) * P2_29;
        let e = u(&mut r, 32) as f64 * P2_33;
        let cus = s(&mut r, 16) * P2_29;
        let sqrt_a = u(&mut r, 32) as f64 * P2_19;
        let toe = u(&mut r, 16) as f64 * 16.0;
        let cic = s(&mut r, 16) * P2_29;
        let omega0 = s(&mut r, 32) * P2_31 * GPS_PI;
        let cis = s(&mut r, 16) * P2_29;
        let i0 = s(&mut r, 32) * P2_31 * GPS_PI;
        let crc = s(&mut r, 16) * P2_5;
        let omega = s(&mut r, 32) * P2_31 * GPS_PI;
        let omega_dot = s(&mut r, 24) * P2_43 * GPS_PI;
        let tgd = s(&mut r, 8) * P2_31;
        let health = u(&mut r, 6) as u8;
        let l2p_flag = u(&mut r, 1) == 1;
        let fit_interval = u(&mut r, 1) == 1;

        debug!(
            "ephemeris: G{:02} week={} toc={} toe={} iode={}",
            prn, week, toc, toe, iode
        );

        Ok(Self {
            prn,
            week,
            toc,
            toe,
            sqrt_a,
            e,
            i0,
            omega0,
            omega,
            m0,
            delta_n,
            idot,
            omega_dot,
            cuc,
            cus,
            crc,
            crs,
            cic,
            cis,
            tgd,
            af0,
            af1,
            af2,
            iode,
            iodc,
            sv_accuracy,
            code_on_l2,
            health,
            l2p_flag,
            fit_interval,
        })
    }
}
