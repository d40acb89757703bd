//! Concurrent stream processing: framing tasks per source, decoding
//! stages and a solving stage, connected by drop-oldest broadcasts.
use std::sync::Arc;

use log::{debug, error, info, trace, warn};
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    cfg::{Config, PipelineOpts},
    epoch::ContinuationMerger,
    navigation::{Navigator, PositionResult},
    observation::ObservationSet,
    prelude::Ephemeris,
    rtcm::{
        ephemeris::EPHEMERIS_GPS,
        framer::FrameSync,
        msm7::{Msm7, MSM7_GPS},
        station::{StationCoordinates, STATION_ARP, STATION_ARP_HEIGHT},
        RawMessage,
    },
};

pub(crate) mod broadcast;
pub(crate) mod processor;
pub(crate) mod source;
pub(crate) mod store;

#[cfg(feature = "serde")]
#[cfg_attr(docrs, doc(cfg(feature = "serde")))]
pub mod snapshot;

pub use broadcast::{Broadcast, Subscriber};
pub use processor::Processor;
pub use source::{BufferSource, ByteSource, NtripClient};
pub use store::{EphemerisStore, MemoryStore, ObservationStore};

/// Waits for the next item of this [Subscriber], unless shutdown is requested
async fn next_or_shutdown<T: Clone>(
    subscriber: &mut Subscriber<T>,
    shutdown: &mut watch::Receiver<bool>,
) -> Option<T> {
    if *shutdown.borrow() {
        return None;
    }
    tokio::select! {
        _ = shutdown.changed() => None,
        item = subscriber.recv() => item,
    }
}

/// [Pipeline] coordinates all processing tasks and owns every channel.
/// Stages are spawned on creation, sources are attached afterwards.
/// Must be created within a tokio runtime.
pub struct Pipeline {
    opts: PipelineOpts,
    raw: Broadcast<RawMessage>,
    observations: Broadcast<Vec<ObservationSet>>,
    ephemerides: Broadcast<Ephemeris>,
    stations: Broadcast<StationCoordinates>,
    results: Broadcast<PositionResult>,
    store: Arc<MemoryStore>,
    shutdown: watch::Sender<bool>,
    sources: Vec<JoinHandle<()>>,
    stages: Vec<JoinHandle<()>>,
}

impl Pipeline {
    /// Creates a new [Pipeline] and spawns its decoding and solving stages
    pub fn spawn(cfg: &Config, store: Arc<MemoryStore>) -> Self {
        let opts = cfg.pipeline;
        let (replay, capacity) = (opts.replay_capacity, opts.capacity());

        let (shutdown, _) = watch::channel(false);

        let mut s = Self {
            opts,
            store,
            shutdown,
            raw: Broadcast::new("raw", replay, capacity),
            observations: Broadcast::new("observations", replay, capacity),
            ephemerides: Broadcast::new("ephemerides", replay, capacity),
            stations: Broadcast::new("stations", replay, capacity),
            results: Broadcast::new("results", replay, capacity),
            sources: Vec::new(),
            stages: Vec::new(),
        };

        s.stages.push(tokio::spawn(decode_observations(
            s.raw.subscribe(),
            s.observations.clone(),
            s.shutdown.subscribe(),
        )));

        s.stages.push(tokio::spawn(decode_ephemerides(
            s.raw.subscribe(),
            s.ephemerides.clone(),
            s.stations.clone(),
            Arc::clone(&s.store),
            s.shutdown.subscribe(),
        )));

        s.stages.push(tokio::spawn(solve(
            Navigator::new(cfg),
            s.observations.subscribe(),
            s.stations.subscribe(),
            s.results.clone(),
            Arc::clone(&s.store),
            s.shutdown.subscribe(),
        )));

        s
    }

    /// Attaches a new [ByteSource], framed in its own task
    pub fn add_source<S: ByteSource + Send + 'static>(&mut self, name: &str, source: S) {
        self.sources.push(tokio::spawn(frame_source(
            name.to_string(),
            source,
            FrameSync::new(self.opts.framer_buffer),
            self.raw.clone(),
            self.shutdown.subscribe(),
        )));
    }

    /// Framed messages channel
    pub fn raw(&self) -> &Broadcast<RawMessage> {
        &self.raw
    }

    /// Decoded epochs of observations channel
    pub fn observations(&self) -> &Broadcast<Vec<ObservationSet>> {
        &self.observations
    }

    /// Decoded [Ephemeris] channel
    pub fn ephemerides(&self) -> &Broadcast<Ephemeris> {
        &self.ephemerides
    }

    /// Decoded [StationCoordinates] channel
    pub fn stations(&self) -> &Broadcast<StationCoordinates> {
        &self.stations
    }

    /// Subscribes to the [PositionResult]s
    pub fn results(&self) -> Subscriber<PositionResult> {
        self.results.subscribe()
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Requests all tasks to stop at their next suspension point
    pub fn shutdown(&self) {
        info!("pipeline: shutdown requested");
        self.shutdown.send_replace(true);
    }

    /// Waits for all sources to terminate, then for every stage
    /// to drain its input.
    pub async fn join(self) {
        for handle in self.sources {
            if let Err(e) = handle.await {
                error!("pipeline: source task failure: {}", e);
            }
        }

        debug!("pipeline: all sources terminated");
        self.raw.close();

        for handle in self.stages {
            if let Err(e) = handle.await {
                error!("pipeline: stage task failure: {}", e);
            }
        }

        info!("pipeline: terminated");
    }
}

async fn frame_source<S: ByteSource>(
    name: String,
    mut source: S,
    mut framer: FrameSync,
    raw: Broadcast<RawMessage>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }

        let chunk = tokio::select! {
            _ = shutdown.changed() => break,
            chunk = source.next_chunk() => chunk,
        };

        match chunk {
            Ok(Some(bytes)) => {
                for msg in framer.feed(&bytes) {
                    raw.publish(msg);
                }
            },
            Ok(None) => {
                info!("{}: end of stream", name);
                break;
            },
            Err(e) => {
                error!("{}: {}", name, e);
                break;
            },
        }
    }

    let stats = framer.stats();
    debug!(
        "{}: {} frames, {} crc failures, {} bytes discarded",
        name, stats.frames, stats.crc_failures, stats.discarded_bytes
    );
}

async fn decode_observations(
    mut raw: Subscriber<RawMessage>,
    output: Broadcast<Vec<ObservationSet>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut merger = ContinuationMerger::new();

    while let Some(msg) = next_or_shutdown(&mut raw, &mut shutdown).await {
        if msg.msg_type != MSM7_GPS {
            continue;
        }
        match Msm7::decode(&msg) {
            Ok(msm) => {
                if let Some(observations) = merger.feed(&msm) {
                    output.publish(observations);
                }
            },
            Err(e) => warn!("msm7 decoding error: {}", e),
        }
    }

    if raw.missed() > 0 {
        warn!("msm7 decoder: {} messages lost to overflow", raw.missed());
    }
    output.close();
}

async fn decode_ephemerides(
    mut raw: Subscriber<RawMessage>,
    ephemerides: Broadcast<Ephemeris>,
    stations: Broadcast<StationCoordinates>,
    store: Arc<MemoryStore>,
    mut shutdown: watch::Receiver<bool>,
) {
    while let Some(msg) = next_or_shutdown(&mut raw, &mut shutdown).await {
        match msg.msg_type {
            EPHEMERIS_GPS => match Ephemeris::decode(&msg) {
                Ok(ephemeris) => {
                    if store.upsert_ephemeris(ephemeris) {
                        ephemerides.publish(ephemeris);
                    }
                },
                Err(e) => warn!("ephemeris decoding error: {}", e),
            },
            STATION_ARP | STATION_ARP_HEIGHT => match StationCoordinates::decode(&msg) {
                Ok(station) => {
                    stations.publish(station);
                },
                Err(e) => warn!("station decoding error: {}", e),
            },
            msg_type => trace!("ignoring message {}", msg_type),
        }
    }

    ephemerides.close();
    stations.close();
}

async fn solve(
    mut navigator: Navigator,
    mut observations: Subscriber<Vec<ObservationSet>>,
    mut stations: Subscriber<StationCoordinates>,
    results: Broadcast<PositionResult>,
    store: Arc<MemoryStore>,
    mut shutdown: watch::Receiver<bool>,
) {
    while let Some(epoch) = next_or_shutdown(&mut observations, &mut shutdown).await {
        while let Some(station) = stations.try_recv() {
            navigator.set_apriori_ecef_m(station.arp_ecef_m);
        }

        let tow = match epoch.first() {
            Some(obs) => obs.tow,
            None => continue,
        };

        store.insert_observations(&epoch);

        // CPU bound: runs off the async workers, so framing and decoding keep going
        let source = Arc::clone(&store);
        let solved = tokio::task::spawn_blocking(move || {
            let result = navigator.resolve_observations(tow, &epoch, source.as_ref());
            (navigator, result)
        })
        .await;

        match solved {
            Ok((solver, result)) => {
                navigator = solver;
                results.publish(result);
            },
            Err(e) => {
                error!("tow={:.3} - solver task failure: {}", tow, e);
                break;
            },
        }
    }

    results.close();
}
