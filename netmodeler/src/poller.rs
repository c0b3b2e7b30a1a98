// NetModeler: Reconciling Polled Device Observations into a Network Topology
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # Poller
//!
//! Runs one poll cycle at a time. Every cycle, all pollable devices of the catalog are handed to
//! a small pool of worker threads, which query them using a [`Collector`]. The main thread waits
//! until every device answered, or until the gather deadline elapsed. Devices which did not
//! answer in time are treated as down for this cycle. Then, the network is reconciled on the
//! main thread.
//!
//! Workers which are still busy after the deadline keep running in the background. Their device
//! stays marked as in flight, and is skipped (and thus down) in every following cycle until the
//! query returns. Finished workers are joined at the start of the next cycle.

use crate::model::{CatalogEntry, DeviceCatalog, Network, Observation, ObservationSet};
use crate::topology::{Snapshot, TopologyAssembler, DEFAULT_REBOOT_THRESHOLD};
use crate::{Error, Stopper};

use log::*;
use std::collections::{HashSet, VecDeque};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Granularity at which the poll loop checks the stopper while sleeping.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Source of observations. The collector performs the actual queries (SNMP, SSH, files, ...), and
/// returns `None` if the device could not be queried.
pub trait Collector: Send + Sync {
    /// Query a single device
    fn collect(&self, device: &CatalogEntry) -> Option<Observation>;
}

impl<F> Collector for F
where
    F: Fn(&CatalogEntry) -> Option<Observation> + Send + Sync,
{
    fn collect(&self, device: &CatalogEntry) -> Option<Observation> {
        self(device)
    }
}

/// Options of the poll loop
#[derive(Debug, Clone, PartialEq)]
pub struct PollOptions {
    /// Target interval between the start of two cycles
    pub interval: Duration,
    /// Minimum time to sleep after a cycle
    pub min_sleep: Duration,
    /// Minimum gather deadline
    pub base_timeout: Duration,
    /// Gather deadline per outstanding device
    pub device_timeout: Duration,
    /// Number of worker threads used to query the devices
    pub num_threads: usize,
    /// Uptime (in seconds) below which a device is considered recently rebooted
    pub reboot_threshold: f64,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(crate::model::catalog::DEFAULT_POLL_RATE),
            min_sleep: Duration::from_secs(5),
            base_timeout: Duration::from_secs(5),
            device_timeout: Duration::from_secs(2),
            num_threads: num_cpus::get(),
            reboot_threshold: DEFAULT_REBOOT_THRESHOLD,
        }
    }
}

impl PollOptions {
    /// Default options, using the poll rate of the catalog as interval.
    pub fn from_catalog(catalog: &DeviceCatalog) -> Self {
        Self { interval: Duration::from_secs(catalog.poll_rate), ..Default::default() }
    }

    /// Time to wait for `outstanding` devices to answer.
    pub fn gather_timeout(&self, outstanding: usize) -> Duration {
        let scaled = self.device_timeout * outstanding as u32;
        scaled.max(self.base_timeout)
    }

    /// Time to sleep after a cycle which took `elapsed`.
    pub fn sleep_after(&self, elapsed: Duration) -> Duration {
        self.interval.checked_sub(elapsed).unwrap_or_default().max(self.min_sleep)
    }
}

/// Names of the devices with a collector call in progress. Shared between all cycles.
type InFlight = Arc<Mutex<HashSet<String>>>;

/// # Poller
///
/// A device is never queried twice at the same time. If the collector call of an earlier cycle
/// is still running, the device is skipped and treated as down until that call returns.
pub struct Poller<C: Collector + 'static> {
    catalog: Arc<DeviceCatalog>,
    collector: Arc<C>,
    options: PollOptions,
    assembler: TopologyAssembler,
    in_flight: InFlight,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl<C: Collector + 'static> std::fmt::Debug for Poller<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("catalog", &self.catalog)
            .field("options", &self.options)
            .field("in_flight", &*lock(&self.in_flight))
            .finish()
    }
}

impl<C: Collector + 'static> Poller<C> {
    /// Create a new poller
    pub fn new(catalog: Arc<DeviceCatalog>, collector: C, options: PollOptions) -> Self {
        let assembler = TopologyAssembler::new().with_reboot_threshold(options.reboot_threshold);
        Self {
            catalog,
            collector: Arc::new(collector),
            options,
            assembler,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Options of the poller
    pub fn options(&self) -> &PollOptions {
        &self.options
    }

    /// Query all pollable devices in parallel, and return the observations of all devices that
    /// answered before the gather deadline. Devices which are still being queried since an
    /// earlier cycle are not queried again.
    pub fn gather(&self) -> ObservationSet {
        self.join_finished_workers();

        let queue: VecDeque<CatalogEntry> = {
            let mut in_flight = lock(&self.in_flight);
            let mut queue = VecDeque::new();
            for entry in self.catalog.iter().filter(|e| e.kind.is_pollable()) {
                if in_flight.insert(entry.name.clone()) {
                    queue.push_back(entry.clone());
                } else {
                    warn!("{} is still being queried since an earlier cycle", entry.name);
                }
            }
            queue
        };
        let num_devices = queue.len();
        let mut result = ObservationSet::new();
        if num_devices == 0 {
            return result;
        }

        let queue = Arc::new(Mutex::new(queue));
        let (tx, rx) = mpsc::channel::<(String, Option<Observation>)>();
        let num_threads = self.options.num_threads.max(1).min(num_devices);
        debug!("Querying {} devices using {} threads", num_devices, num_threads);

        let mut workers = lock(&self.workers);
        for _ in 0..num_threads {
            let q = queue.clone();
            let c = self.collector.clone();
            let f = self.in_flight.clone();
            let tx = tx.clone();
            // a worker that is still busy after the deadline exits as soon as it notices that
            // the receiver is gone. It is joined in a later cycle.
            workers.push(thread::spawn(move || loop {
                let entry = match lock(&q).pop_front() {
                    Some(entry) => entry,
                    None => break,
                };
                let guard = InFlightGuard { in_flight: f.clone(), name: entry.name.clone() };
                let observation = c.collect(&entry);
                drop(guard);
                if tx.send((entry.name, observation)).is_err() {
                    break;
                }
            }));
        }
        drop(workers);
        drop(tx);

        let deadline = Instant::now() + self.options.gather_timeout(num_devices);
        let mut received = 0;
        while received < num_devices {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok((name, Some(observation))) => {
                    received += 1;
                    result.insert(name, observation);
                }
                Ok((name, None)) => {
                    received += 1;
                    debug!("{} yielded no observation", name);
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        "Failed to get data for {} devices (timed out)",
                        num_devices - received
                    );
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    error!("All workers quit before every device was queried");
                    break;
                }
            }
        }

        // devices which were never picked up by a worker are not in flight
        let mut remaining = lock(&queue);
        let mut in_flight = lock(&self.in_flight);
        for entry in remaining.drain(..) {
            in_flight.remove(&entry.name);
        }
        result
    }

    /// Join all worker threads of earlier cycles which are done.
    fn join_finished_workers(&self) {
        let mut workers = lock(&self.workers);
        let (finished, running): (Vec<_>, Vec<_>) =
            workers.drain(..).partition(|handle| handle.is_finished());
        *workers = running;
        for handle in finished {
            if handle.join().is_err() {
                error!("A collector thread panicked");
            }
        }
    }

    /// Run a single poll cycle: gather the observations and assemble the snapshot.
    pub fn run_cycle(&self) -> Snapshot {
        let observations = self.gather();
        let net = Network::new(self.catalog.clone(), observations);
        self.assembler.assemble(&net)
    }

    /// Run the poll loop until the stopper is triggered or `duration` elapsed, passing every
    /// snapshot to `sink`. Returns the number of completed cycles. The loop stops early if the sink
    /// returns an error.
    pub fn run<F>(
        &self,
        stopper: &Stopper,
        duration: Option<Duration>,
        mut sink: F,
    ) -> Result<usize, Error>
    where
        F: FnMut(Snapshot) -> Result<(), Error>,
    {
        let start = Instant::now();
        let mut cycles = 0;
        loop {
            let cycle_start = Instant::now();
            let snapshot = self.run_cycle();
            sink(snapshot)?;
            cycles += 1;

            let elapsed = cycle_start.elapsed();
            info!("elapsed: {:.1} seconds", elapsed.as_secs_f64());

            if stopper.is_stop() {
                break;
            }
            if let Some(duration) = duration {
                if start.elapsed() >= duration {
                    break;
                }
            }
            if !sleep_unless_stopped(stopper, self.options.sleep_after(elapsed)) {
                break;
            }
        }
        info!("Poll loop finished after {} cycles", cycles);
        Ok(cycles)
    }
}

/// Sleep for `duration`, waking up regularly to check the stopper. Returns `false` if the stopper
/// was triggered.
fn sleep_unless_stopped(stopper: &Stopper, duration: Duration) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if stopper.is_stop() {
            return false;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining == Duration::from_secs(0) {
            return true;
        }
        thread::sleep(remaining.min(SLEEP_SLICE));
    }
}

/// Marks a device as queried until dropped, even if the collector panics.
struct InFlightGuard {
    in_flight: InFlight,
    name: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.in_flight).remove(&self.name);
    }
}

/// Lock the mutex, ignoring poisoning. The protected data is always left consistent.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
