//! RTCM3 frame synchronization
use log::{debug, trace, warn};

use crate::{
    error::Error,
    rtcm::{bits::BitReader, crc::crc24q, RawMessage},
};

/// RTCM3 preamble byte
pub const PREAMBLE: u8 = 0xD3;

/// Frame header size (preamble + reserved + length)
const HEADER_SIZE: usize = 3;

/// CRC-24Q trailer size
const CRC_SIZE: usize = 3;

/// Largest payload the 10 bit length field may describe
pub const MAX_PAYLOAD_SIZE: usize = 1023;

/// Default internal buffer size
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Counters exposed by [FrameSync]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FramerStats {
    /// Frames extracted
    pub frames: usize,
    /// Frames that failed the CRC-24Q check
    pub crc_failures: usize,
    /// Bytes discarded while searching for a preamble,
    /// or dropped on buffer overflow
    pub discarded_bytes: usize,
}

/// [FrameSync] delimits RTCM3 frames in a byte stream that is fed
/// by chunks of arbitrary size. Memory is bounded: when the internal
/// buffer fills up without yielding a frame, its oldest half is dropped.
#[derive(Debug, Clone)]
pub struct FrameSync {
    buffer: Vec<u8>,
    capacity: usize,
    reject_invalid_crc: bool,
    stats: FramerStats,
}

impl Default for FrameSync {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

impl FrameSync {
    /// Creates a new [FrameSync] with desired buffer capacity.
    /// Capacity is raised to the largest possible frame if smaller.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(HEADER_SIZE + MAX_PAYLOAD_SIZE + CRC_SIZE);
        Self {
            capacity,
            reject_invalid_crc: true,
            stats: FramerStats::default(),
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Copies and returns a [FrameSync] that forwards frames failing the
    /// CRC check (flagged as such) instead of rejecting them.
    pub fn with_invalid_crc_forwarding(&self) -> Self {
        let mut s = self.clone();
        s.reject_invalid_crc = false;
        s
    }

    /// Returns [FramerStats] accumulated so far
    pub fn stats(&self) -> FramerStats {
        self.stats
    }

    /// Number of bytes currently buffered
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Feeds a new chunk of bytes and returns all [RawMessage]s completed by it.
    pub fn feed(&mut self, mut chunk: &[u8]) -> Vec<RawMessage> {
        let mut messages = Vec::new();

        while !chunk.is_empty() {
            let room = self.capacity - self.buffer.len();

            if room == 0 {
                let half = self.buffer.len() / 2;
                warn!("framer: buffer full, dropping {} oldest bytes", half);
                self.buffer.drain(..half);
                self.stats.discarded_bytes += half;
                continue;
            }

            let size = room.min(chunk.len());
            self.buffer.extend_from_slice(&chunk[..size]);
            chunk = &chunk[size..];

            self.scan(&mut messages);
        }

        messages
    }

    fn scan(&mut self, messages: &mut Vec<RawMessage>) {
        loop {
            let start = match self.buffer.iter().position(|b| *b == PREAMBLE) {
                Some(start) => start,
                None => {
                    self.stats.discarded_bytes += self.buffer.len();
                    self.buffer.clear();
                    return;
                },
            };

            if start > 0 {
                trace!("framer: skipping {} bytes prior preamble", start);
                self.buffer.drain(..start);
                self.stats.discarded_bytes += start;
            }

            if self.buffer.len() < HEADER_SIZE {
                return;
            }

            let length = match frame_length(&self.buffer) {
                Ok(length) => length,
                Err(e) => {
                    // not a frame start
                    trace!("framer: {}", e);
                    self.buffer.drain(..1);
                    self.stats.discarded_bytes += 1;
                    continue;
                },
            };

            let total = HEADER_SIZE + length + CRC_SIZE;

            if self.buffer.len() < total {
                return;
            }

            let crc_valid = match verify_frame(&self.buffer[..total]) {
                Ok(()) => true,
                Err(e) => {
                    self.stats.crc_failures += 1;
                    warn!("framer: {}", e);
                    if self.reject_invalid_crc {
                        self.buffer.drain(..1);
                        self.stats.discarded_bytes += 1;
                        continue;
                    }
                    false
                },
            };

            let payload = self.buffer[HEADER_SIZE..HEADER_SIZE + length].to_vec();

            let msg_type = BitReader::new(&payload)
                .read_unsigned(12)
                .unwrap_or_default() as u16;

            debug!("framer: message {} ({} bytes)", msg_type, length);

            messages.push(RawMessage {
                msg_type,
                payload,
                crc_valid,
            });

            self.stats.frames += 1;
            self.buffer.drain(..total);
        }
    }
}

/// Payload length declared by the header this buffer starts with
fn frame_length(header: &[u8]) -> Result<usize, Error> {
    if header.len() < HEADER_SIZE || header[0] != PREAMBLE {
        return Err(Error::BadFrameLength(0));
    }
    let length = (((header[1] & 0x03) as usize) << 8) | header[2] as usize;
    if length == 0 {
        return Err(Error::BadFrameLength(length));
    }
    Ok(length)
}

/// Verifies one complete RTCM3 frame: header, declared length and CRC-24Q trailer.
pub fn verify_frame(frame: &[u8]) -> Result<(), Error> {
    let length = frame_length(frame)?;
    let total = HEADER_SIZE + length + CRC_SIZE;

    if frame.len() != total {
        return Err(Error::BadFrameLength(length));
    }

    let received = frame[HEADER_SIZE + length..]
        .iter()
        .fold(0u32, |crc, b| (crc << 8) | *b as u32);

    let computed = crc24q(&frame[..HEADER_SIZE + length]);

    if computed != received {
        return Err(Error::CrcMismatch { computed, received });
    }
    Ok(())
}

/// Wraps a payload into a complete RTCM3 frame (header + payload + CRC-24Q).
/// Payloads larger than [MAX_PAYLOAD_SIZE] are truncated.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let length = payload.len().min(MAX_PAYLOAD_SIZE);
    let mut frame = Vec::with_capacity(HEADER_SIZE + length + CRC_SIZE);
    frame.push(PREAMBLE);
    frame.push(((length >> 8) & 0x03) as u8);
    frame.push((length & 0xff) as u8);
    frame.extend_from_slice(&payload[..length]);
    let crc = crc24q(&frame);
    frame.extend_from_slice(&[(crc >> 16) as u8, (crc >> 8) as u8, crc as u8]);
    frame
}
