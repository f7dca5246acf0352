// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Background station lookups.
//!
//! Lookups run on a small tokio runtime owned by the worker. Completions are
//! sent back to the UI thread over a channel and drained once per frame, so
//! the session itself never leaves the UI thread.

use std::sync::Arc;

use log::{debug, info};
use station_overlay::{
    HttpStationSource, LookupTicket, OfflineSource, OverlayError, RawStation, StationRecord,
    StationResolver, StationSource,
};
use tokio::sync::mpsc;

use crate::config::AppConfig;

/// Where station lookups go first.
#[derive(Debug)]
pub enum Backend {
    Http(HttpStationSource),
    /// Always fall back to simulated stations.
    Offline(OfflineSource),
}

impl Backend {
    pub fn from_config(config: &AppConfig, offline: bool) -> Result<Self, OverlayError> {
        if offline || config.offline {
            info!("Station service disabled, using simulated stations");
            return Ok(Self::Offline(OfflineSource));
        }
        let source_config = config.http_source_config();
        info!("Using station service at {}", source_config.base_url);
        Ok(Self::Http(HttpStationSource::new(source_config)?))
    }
}

impl StationSource for Backend {
    async fn fetch(&self, number: &str) -> Result<RawStation, OverlayError> {
        match self {
            Self::Http(source) => source.fetch(number).await,
            Self::Offline(source) => source.fetch(number).await,
        }
    }
}

/// A finished lookup waiting to be applied to the session.
#[derive(Debug)]
pub struct LookupCompletion {
    pub ticket: LookupTicket,
    pub result: Result<StationRecord, OverlayError>,
}

#[derive(Debug)]
pub struct LookupWorker {
    runtime: tokio::runtime::Runtime,
    resolver: Arc<StationResolver<Backend>>,
    tx: mpsc::UnboundedSender<LookupCompletion>,
    rx: mpsc::UnboundedReceiver<LookupCompletion>,
    in_flight: usize,
}

impl LookupWorker {
    pub fn new(resolver: StationResolver<Backend>) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("station-lookup")
            .enable_all()
            .build()?;
        let (tx, rx) = mpsc::unbounded_channel();

        Ok(Self {
            runtime,
            resolver: Arc::new(resolver),
            tx,
            rx,
            in_flight: 0,
        })
    }

    /// Resolve `ticket` in the background and wake the UI when done
    pub fn submit(&mut self, ticket: LookupTicket, ctx: &egui::Context) {
        debug!("Queueing lookup for station {}", ticket.number());

        let resolver = Arc::clone(&self.resolver);
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        self.in_flight += 1;

        self.runtime.spawn(async move {
            let result = resolver.resolve(ticket.number()).await;
            // The receiver lives as long as the app; a failed send means shutdown.
            if tx.send(LookupCompletion { ticket, result }).is_ok() {
                ctx.request_repaint();
            }
        });
    }

    /// Completions that arrived since the last call
    pub fn drain(&mut self) -> Vec<LookupCompletion> {
        let mut done = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            done.push(completion);
        }
        self.in_flight = self.in_flight.saturating_sub(done.len());
        done
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use station_overlay::{
        GeofenceSpec, LookupOutcome, Position, ResolverConfig, Session, SessionConfig,
        StationOrigin,
    };

    use crate::scene::{MapScene, ViewState};

    fn worker() -> LookupWorker {
        let resolver = StationResolver::new(
            Backend::Offline(OfflineSource),
            ResolverConfig::default(),
        );
        LookupWorker::new(resolver).unwrap()
    }

    fn drain_until(worker: &mut LookupWorker, count: usize) -> Vec<LookupCompletion> {
        let mut done = Vec::new();
        for _ in 0..200 {
            done.extend(worker.drain());
            if done.len() >= count {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        done
    }

    #[test]
    fn test_offline_backend_resolves_simulated_station() {
        let mut worker = worker();
        let center = Position::new(-3.7319, -38.5267).unwrap();
        let mut session = Session::new(
            MapScene::new(ViewState::new(center, 12.0)),
            SessionConfig::new(center),
        );

        let ticket = session.begin_lookup("1").unwrap();
        worker.submit(ticket, &egui::Context::default());
        assert!(worker.is_busy());

        let done = drain_until(&mut worker, 1);
        assert_eq!(done.len(), 1);
        assert!(!worker.is_busy());

        let completion = done.into_iter().next().unwrap();
        let outcome = session
            .complete_lookup(&completion.ticket, completion.result, GeofenceSpec::default())
            .unwrap();
        match outcome {
            LookupOutcome::Drawn { station, .. } => {
                assert_eq!(station.origin, StationOrigin::Simulated);
            }
            LookupOutcome::Superseded => panic!("single lookup must not be superseded"),
        }
    }

    #[test]
    fn test_overlapping_lookups_only_latest_draws() {
        let mut worker = worker();
        let center = Position::new(-3.7319, -38.5267).unwrap();
        let mut session = Session::new(
            MapScene::new(ViewState::new(center, 12.0)),
            SessionConfig::new(center),
        );
        let ctx = egui::Context::default();

        let first = session.begin_lookup("1").unwrap();
        let second = session.begin_lookup("2").unwrap();
        worker.submit(first, &ctx);
        worker.submit(second, &ctx);

        let mut drawn = Vec::new();
        for completion in drain_until(&mut worker, 2) {
            let outcome = session
                .complete_lookup(&completion.ticket, completion.result, GeofenceSpec::default())
                .unwrap();
            if let LookupOutcome::Drawn { station, .. } = outcome {
                drawn.push(station.id);
            }
        }
        assert_eq!(drawn, vec!["2".to_string()]);
    }

    #[test]
    fn test_offline_flag_selects_offline_backend() {
        let backend = Backend::from_config(&AppConfig::default(), true).unwrap();
        assert!(matches!(backend, Backend::Offline(_)));
    }
}
