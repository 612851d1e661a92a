//! Background structure scans.
//!
//! A [`ScanScheduler`] runs [`FissionValidator::validate`] on the rayon pool
//! and commits results back on the owning thread when [`ScanScheduler::poll`]
//! is called. Each scan carries a [`ScanToken`]; starting a new scan or
//! invalidating the structure bumps the generation, so reports from older
//! scans are dropped instead of overwriting newer state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use tracing::{debug, info};

use crate::coord::Coord;
use crate::fission::{Classifier, FissionValidator, FormationError, FormedReactor, ScanOutcome};

/// Identifies one scan generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScanToken(u64);

impl ScanToken {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Where the structure stands from the owner's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanState {
    /// No scan has produced a result for the current generation.
    #[default]
    Idle,
    Scanning(ScanToken),
    Formed(FormedReactor),
    Failed(FormationError),
}

impl ScanState {
    pub fn is_formed(&self) -> bool {
        matches!(self, ScanState::Formed(_))
    }

    pub fn formed(&self) -> Option<&FormedReactor> {
        match self {
            ScanState::Formed(reactor) => Some(reactor),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct ScanReport {
    token: ScanToken,
    outcome: ScanOutcome,
}

/// Owns the state of one structure and schedules its rescans.
pub struct ScanScheduler<C> {
    validator: Arc<FissionValidator<C>>,
    generation: u64,
    liveness: Arc<AtomicBool>,
    state: ScanState,
    tx: Sender<ScanReport>,
    rx: Receiver<ScanReport>,
}

impl<C> ScanScheduler<C>
where
    C: Classifier + Send + Sync + 'static,
{
    pub fn new(validator: FissionValidator<C>) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded::<ScanReport>();
        Self {
            validator: Arc::new(validator),
            generation: 0,
            liveness: Arc::new(AtomicBool::new(true)),
            state: ScanState::Idle,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    pub fn current_token(&self) -> ScanToken {
        ScanToken(self.generation)
    }

    pub fn is_alive(&self) -> bool {
        self.liveness.load(Ordering::Acquire)
    }

    /// Shared flag the game layer clears when the structure is removed.
    pub fn liveness_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.liveness)
    }

    /// Start validating `interior` in the background. Any scan already in
    /// flight becomes stale.
    pub fn start_scan(&mut self, interior: Vec<Coord>) -> ScanToken {
        self.generation += 1;
        let token = self.current_token();
        self.liveness.store(true, Ordering::Release);
        self.state = ScanState::Scanning(token);
        debug!(generation = token.0, positions = interior.len(), "fission scan started");

        let validator = Arc::clone(&self.validator);
        let liveness = Arc::clone(&self.liveness);
        let tx = self.tx.clone();
        rayon::spawn(move || {
            let outcome = validator.validate(interior, liveness.as_ref());
            // The receiver is gone once the scheduler is dropped.
            let _ = tx.send(ScanReport { token, outcome });
        });
        token
    }

    /// The structure changed or was removed: stop any running scan and
    /// forget the current result.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.liveness.store(false, Ordering::Release);
        self.state = ScanState::Idle;
        debug!(generation = self.generation, "fission structure invalidated");
    }

    /// Commit any finished reports. Returns `true` if the state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.rx.try_recv() {
                Ok(report) => changed |= self.commit(report),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        changed
    }

    /// Block until the current scan reports. Returns immediately when no
    /// scan is running.
    ///
    /// The scheduler holds a sender itself, so this only returns once the
    /// current scan reports. Use [`ScanScheduler::wait_timeout`] when a scan
    /// may never finish.
    pub fn wait(&mut self) -> &ScanState {
        while matches!(self.state, ScanState::Scanning(_)) {
            match self.rx.recv() {
                Ok(report) => {
                    self.commit(report);
                }
                Err(_) => break,
            }
        }
        &self.state
    }

    /// Like [`ScanScheduler::wait`], but gives up after `timeout`. The state
    /// is still [`ScanState::Scanning`] if the current scan has not reported.
    pub fn wait_timeout(&mut self, timeout: Duration) -> &ScanState {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.wait();
        };
        while matches!(self.state, ScanState::Scanning(_)) {
            match self.rx.recv_deadline(deadline) {
                Ok(report) => {
                    self.commit(report);
                }
                Err(_) => break,
            }
        }
        &self.state
    }

    fn commit(&mut self, report: ScanReport) -> bool {
        if report.token != self.current_token() {
            debug!(
                stale = report.token.0,
                current = self.generation,
                "discarding stale fission scan result"
            );
            return false;
        }
        self.state = match report.outcome {
            ScanOutcome::Aborted => ScanState::Idle,
            ScanOutcome::Formed(reactor) => {
                info!(
                    fuel_assemblies = reactor.fuel_assemblies,
                    surface_area = reactor.surface_area,
                    "fission reactor formed"
                );
                ScanState::Formed(reactor)
            }
            ScanOutcome::Failed(err) => ScanState::Failed(err),
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn scheduler(interior: &InteriorBuilder) -> ScanScheduler<impl Classifier + Send + Sync + 'static> {
        ScanScheduler::new(FissionValidator::new(interior.classifier()))
    }

    #[test]
    fn scan_forms_reactor() {
        let interior = square_core(2, 3);
        let mut scheduler = scheduler(&interior);
        assert_eq!(scheduler.state(), &ScanState::Idle);

        let token = scheduler.start_scan(interior.interior());
        assert_eq!(scheduler.state(), &ScanState::Scanning(token));

        let reactor = scheduler.wait().formed().cloned().unwrap();
        assert_eq!(reactor.fuel_assemblies, 12);
    }

    #[test]
    fn scan_reports_failure() {
        let mut interior = InteriorBuilder::new();
        interior.fuel(0, 0, 0);
        let mut scheduler = scheduler(&interior);
        scheduler.start_scan(interior.interior());
        assert!(matches!(
            scheduler.wait(),
            ScanState::Failed(FormationError::BadFuelAssembly { .. })
        ));
    }

    #[test]
    fn stale_report_is_discarded() {
        let interior = square_core(1, 1);
        let mut scheduler = scheduler(&interior);
        let stale = ScanToken(scheduler.generation + 1);
        scheduler.generation += 2;
        scheduler.state = ScanState::Scanning(scheduler.current_token());

        let report = ScanReport {
            token: stale,
            outcome: ScanOutcome::Failed(FormationError::MissingFuelAssembly),
        };
        assert!(!scheduler.commit(report));
        assert_eq!(scheduler.state(), &ScanState::Scanning(scheduler.current_token()));

        let current = ScanReport {
            token: scheduler.current_token(),
            outcome: ScanOutcome::Formed(FormedReactor::default()),
        };
        assert!(scheduler.commit(current));
        assert!(scheduler.state().is_formed());
    }

    #[test]
    fn aborted_report_returns_to_idle() {
        let interior = square_core(1, 1);
        let mut scheduler = scheduler(&interior);
        scheduler.generation = 1;
        scheduler.state = ScanState::Scanning(ScanToken(1));
        assert!(scheduler.commit(ScanReport {
            token: ScanToken(1),
            outcome: ScanOutcome::Aborted,
        }));
        assert_eq!(scheduler.state(), &ScanState::Idle);
    }

    #[test]
    fn restart_supersedes_previous_scan() {
        let interior = square_core(2, 2);
        let mut scheduler = scheduler(&interior);
        let first = scheduler.start_scan(interior.interior());
        let second = scheduler.start_scan(interior.interior());
        assert!(second > first);
        scheduler.wait();
        assert!(scheduler.state().is_formed());
        // The first report may still be queued; it must not change anything.
        let before = scheduler.state().clone();
        scheduler.poll();
        assert_eq!(scheduler.state(), &before);
    }

    #[test]
    fn invalidate_clears_state_and_liveness() {
        let interior = square_core(1, 2);
        let mut scheduler = scheduler(&interior);
        let token = scheduler.start_scan(interior.interior());
        scheduler.invalidate();
        assert!(!scheduler.is_alive());
        assert!(!scheduler.liveness_handle().load(Ordering::Acquire));
        assert_ne!(scheduler.current_token(), token);
        assert_eq!(scheduler.wait(), &ScanState::Idle);
    }

    #[test]
    fn wait_timeout_gives_up_on_missing_report() {
        let interior = square_core(1, 1);
        let mut scheduler = scheduler(&interior);
        // Scanning with no scan in flight: nothing will ever report.
        scheduler.generation = 1;
        scheduler.state = ScanState::Scanning(ScanToken(1));
        let state = scheduler.wait_timeout(Duration::from_millis(20));
        assert_eq!(state, &ScanState::Scanning(ScanToken(1)));
    }

    #[test]
    fn wait_timeout_commits_finished_scan() {
        let interior = square_core(2, 2);
        let mut scheduler = scheduler(&interior);
        scheduler.start_scan(interior.interior());
        assert!(scheduler.wait_timeout(Duration::from_secs(30)).is_formed());
    }
}
