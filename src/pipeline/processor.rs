//! Sequential decode, pair and solve of one byte stream
use std::sync::Arc;

use log::{trace, warn};

use crate::{
    cfg::Config,
    epoch::ContinuationMerger,
    navigation::{Navigator, PositionResult},
    observation::ObservationSet,
    pipeline::store::{EphemerisStore, MemoryStore, ObservationStore},
    rtcm::{
        framer::{FrameSync, FramerStats},
        Message, RawMessage,
    },
};

/// [Processor] runs the complete chain (framing, decoding, pairing and
/// solving) on one byte stream, in a single thread of execution.
/// Output only depends on the input bytes and the initial store content.
#[derive(Debug)]
pub struct Processor {
    framer: FrameSync,
    merger: ContinuationMerger,
    navigator: Navigator,
    store: Arc<MemoryStore>,
    decode_failures: usize,
}

impl Processor {
    /// Creates a new [Processor]
    pub fn new(cfg: &Config, store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            framer: FrameSync::new(cfg.pipeline.framer_buffer),
            merger: ContinuationMerger::new(),
            navigator: Navigator::new(cfg),
            decode_failures: 0,
        }
    }

    /// Shared store
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Frame synchronization statistics
    pub fn framer_stats(&self) -> FramerStats {
        self.framer.stats()
    }

    /// Number of framed messages we failed to decode
    pub fn decode_failures(&self) -> usize {
        self.decode_failures
    }

    /// Feeds one chunk of the stream, returns the positions it completed
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<PositionResult> {
        self.framer
            .feed(chunk)
            .iter()
            .filter_map(|msg| self.handle(msg))
            .collect()
    }

    /// Handles one framed message. Returns a position when this message
    /// completed an epoch of observations.
    pub fn handle(&mut self, msg: &RawMessage) -> Option<PositionResult> {
        match msg.decode() {
            Ok(Message::Msm7(msm)) => {
                let observations = self.merger.feed(&msm)?;
                let tow = observations
                    .first()
                    .map(|obs| obs.tow)
                    .unwrap_or(msm.header.tow());
                Some(self.resolve(tow, &observations))
            },
            Ok(Message::Ephemeris(ephemeris)) => {
                self.store.upsert_ephemeris(ephemeris);
                None
            },
            Ok(Message::StationCoordinates(station)) => {
                self.navigator.set_apriori_ecef_m(station.arp_ecef_m);
                None
            },
            Ok(Message::Unsupported(msg_type)) => {
                trace!("ignoring message {}", msg_type);
                None
            },
            Err(e) => {
                warn!("message {} - decoding error: {}", msg.msg_type, e);
                self.decode_failures += 1;
                None
            },
        }
    }

    fn resolve(&mut self, tow: f64, observations: &[ObservationSet]) -> PositionResult {
        self.store.insert_observations(observations);
        self.navigator
            .resolve_observations(tow, observations, self.store.as_ref())
    }
}
