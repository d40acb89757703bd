use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// [BitReader] requested to start past the first byte (offset 0..=7).
    #[error("invalid bit offset {0}")]
    InvalidBitOffset(usize),

    /// Payload does not carry enough bits for the fields it declares.
    /// The cell mask of an MSM message typically winds up here when the
    /// declared satellite/signal counts exceed the remaining payload.
    #[error("not enough bits in payload")]
    NotEnoughBits,

    /// Length field out of the 1..=1023 RTCM3 range
    #[error("invalid frame length {0}")]
    BadFrameLength(usize),

    /// CRC-24Q trailer does not match the frame content
    #[error("crc mismatch: computed {computed:06x}, received {received:06x}")]
    CrcMismatch { computed: u32, received: u32 },

    /// Message type does not match the decoder it was presented to
    #[error("unexpected message type {0}")]
    UnexpectedMessage(u16),

    /// MSM cell mask is wider than 64 cells, which the protocol forbids
    #[error("msm cell mask too large: {0} satellites x {1} signals")]
    CellMaskMismatch(usize, usize),

    /// No [Ephemeris] within the validity window of an observation
    #[error("missing ephemeris for G{prn:02} at tow={tow}")]
    MissingEphemeris { prn: u8, tow: f64 },

    /// Not enough satellites to form a navigation solution.
    /// Both solvers require at least 4 satellites.
    #[error("insufficient satellites: {0}")]
    NotEnoughSatellites(usize),

    /// Matrix operands of incompatible shapes
    #[error("internal error: invalid matrix setup")]
    MatrixDimension,

    /// Invalid orbital states or bad signal data may cause the algebric calculations
    /// to wind up here.
    #[error("failed to invert matrix")]
    MatrixInversion,

    /// PPP requires phase range observations on every tracked satellite
    #[error("failed to form phase range combination")]
    PhaseRangeCombination,

    /// Filter update was attempted prior initialization
    #[error("internal error: filter is not initialized (bad op)")]
    UninitializedFilter,

    /// Failed to parse navigation method
    #[error("unknown navigation method")]
    UnknownNavigationMethod,

    /// HTTP transport failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Caster answered with a non success status
    #[error("caster rejected request: http status {0}")]
    HttpStatus(u16),

    /// Snapshot I/O failure
    #[error("snapshot i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization failure
    #[error("snapshot error: {0}")]
    Snapshot(String),
}
