/// MSB first bit field writer, to forge RTCM payloads
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bits: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bits written so far
    pub fn len(&self) -> usize {
        self.bits
    }

    /// Appends the n (≤ 64) least significant bits of value
    pub fn unsigned(&mut self, n: usize, value: u64) -> &mut Self {
        for i in (0..n).rev() {
            let bit = ((value >> i) & 0x01) as u8;
            if self.bits % 8 == 0 {
                self.bytes.push(0);
            }
            if bit == 1 {
                let last = self.bytes.len() - 1;
                self.bytes[last] |= 0x80 >> (self.bits % 8);
            }
            self.bits += 1;
        }
        self
    }

    /// Appends value as n bit two's complement
    pub fn signed(&mut self, n: usize, value: i64) -> &mut Self {
        let mask = if n >= 64 { u64::MAX } else { (1u64 << n) - 1 };
        self.unsigned(n, (value as u64) & mask)
    }

    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.unsigned(1, value as u64)
    }

    /// Returns the bytes, last one zero padded
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}
