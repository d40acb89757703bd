//! CRC-24Q (Qualcomm), as used by RTCM3 framing

/// CRC-24Q generator polynomial, including the x^24 term
pub const CRC_24Q_POLYNOMIAL: u32 = 0x0186_4CFB;

const CRC_24Q_TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u32) << 16;
        let mut bit = 0;
        while bit < 8 {
            crc <<= 1;
            if crc & 0x0100_0000 != 0 {
                crc ^= CRC_24Q_POLYNOMIAL;
            }
            bit += 1;
        }
        table[i] = crc & 0x00FF_FFFF;
        i += 1;
    }
    table
}

/// Computes the 24 bit CRC-24Q of given bytes
pub fn crc24q(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |crc, byte| {
        let index = ((crc >> 16) as u8 ^ byte) as usize;
        ((crc << 8) ^ CRC_24Q_TABLE[index]) & 0x00FF_FFFF
    })
}
