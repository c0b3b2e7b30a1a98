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

use netmodeler::example_networks::*;
use netmodeler::model::{CatalogEntry, DeviceCatalog, Network, Observation, ObservationSet};
use netmodeler::poller::{PollOptions, Poller};
use netmodeler::topology::{Snapshot, TopologyAssembler};
use netmodeler::Stopper;

use clap::{Parser, Subcommand, ValueEnum};
use log::*;
use std::error::Error;
use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<(), Box<dyn Error>> {
    // initialize the env logger
    pretty_env_logger::init();

    // run clap
    let args = CommandLineArguments::parse();

    match args.cmd {
        MainCommand::Reconcile { catalog, observations, json_filename } => {
            let catalog = Arc::new(DeviceCatalog::from_file(&catalog)?);
            let observations: ObservationSet =
                serde_json::from_reader(BufReader::new(File::open(&observations)?))?;
            info!("Read the observations of {} devices", observations.len());
            let net = Network::new(catalog, observations);
            let assembler = TopologyAssembler::new().with_reboot_threshold(args.reboot_threshold);
            let snapshot = assembler.assemble(&net);
            write_snapshot(&snapshot, json_filename.as_deref())?;
        }
        MainCommand::Poll { catalog, dir, duration, num_threads, json_filename } => {
            let catalog = Arc::new(DeviceCatalog::from_file(&catalog)?);
            let mut options = PollOptions::from_catalog(&catalog);
            options.reboot_threshold = args.reboot_threshold;
            if let Some(num_threads) = num_threads {
                options.num_threads = num_threads;
            }
            let collector = move |entry: &CatalogEntry| read_observation(&dir, entry);
            let poller = Poller::new(catalog, collector, options);
            info!("Starting the poll loop: {:?}", poller.options());

            let cycles = poller.run(&Stopper::new(), duration.map(Duration::from_secs), |snapshot| {
                write_snapshot(&snapshot, json_filename.as_deref())
            })?;
            info!("Finished {} cycles", cycles);
        }
        MainCommand::Example { topology, down } => {
            let (catalog, mut observations) = topology.get();
            for name in down.iter() {
                if observations.remove(name).is_none() {
                    warn!("{} is not part of the observations", name);
                }
            }
            let net = Network::new(Arc::new(catalog), observations);
            let assembler = TopologyAssembler::new().with_reboot_threshold(args.reboot_threshold);
            let snapshot = assembler.assemble(&net);
            write_snapshot(&snapshot, None)?;
        }
    }
    Ok(())
}

/// File-backed collector: reads `<dir>/<name>.json`. Missing or broken files mean that the device
/// did not answer.
fn read_observation(dir: &Path, entry: &CatalogEntry) -> Option<Observation> {
    let filename = dir.join(format!("{}.json", entry.name));
    let file = match File::open(&filename) {
        Ok(file) => file,
        Err(e) => {
            debug!("Cannot open {}: {}", filename.display(), e);
            return None;
        }
    };
    match serde_json::from_reader(BufReader::new(file)) {
        Ok(observation) => Some(observation),
        Err(e) => {
            warn!("Invalid observation of {} in {}: {}", entry.name, filename.display(), e);
            None
        }
    }
}

fn write_snapshot(
    snapshot: &Snapshot,
    json_filename: Option<&Path>,
) -> Result<(), netmodeler::Error> {
    match json_filename {
        Some(filename) => {
            let tmp = filename.with_extension("json.tmp");
            serde_json::to_writer_pretty(File::create(&tmp)?, snapshot)?;
            fs::rename(&tmp, filename)?;
            debug!("Snapshot written to {}", filename.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, snapshot)?;
            writeln!(handle)?;
        }
    }
    Ok(())
}

/// Reconcile the observations of independently polled devices into a single network topology.
/// The snapshot (entities, relations, labels and alerts) is printed as JSON.
#[derive(Parser, Debug)]
#[clap(name = "netmodeler", author, version, about, long_about = None)]
struct CommandLineArguments {
    /// Uptime (in seconds) below which a device is considered recently rebooted
    #[clap(short = 'r', long, default_value = "60")]
    reboot_threshold: f64,
    /// Action to perform
    #[clap(subcommand)]
    cmd: MainCommand,
}

#[derive(Subcommand, Debug)]
enum MainCommand {
    /// Reconcile a single cycle
    #[clap(name = "reconcile")]
    Reconcile {
        /// Catalog of all devices (network file)
        catalog: PathBuf,
        /// JSON map from device name to its observation
        observations: PathBuf,
        /// Write the snapshot to a file instead of stdout
        #[clap(long = "json")]
        json_filename: Option<PathBuf>,
    },
    /// Run the poll loop, reading the observation of every device from `<dir>/<name>.json`
    #[clap(name = "poll")]
    Poll {
        /// Catalog of all devices (network file)
        catalog: PathBuf,
        /// Directory containing one observation file per device
        dir: PathBuf,
        /// Stop after this many seconds. Without this option, the loop runs forever.
        #[clap(short = 'd', long)]
        duration: Option<u64>,
        /// Number of parallel queries
        #[clap(long)]
        num_threads: Option<usize>,
        /// Write the snapshot to a file instead of stdout. The file is replaced every cycle.
        #[clap(long = "json")]
        json_filename: Option<PathBuf>,
    },
    /// Reconcile one of the example networks
    #[clap(name = "example")]
    Example {
        /// Topology to use
        #[clap(value_enum)]
        topology: Topology,
        /// Devices that did not answer in this cycle
        #[clap(long)]
        down: Vec<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Topology {
    RoutedTriangle,
    MulticastTree,
}

impl Topology {
    fn get(self) -> (DeviceCatalog, ObservationSet) {
        match self {
            Self::RoutedTriangle => (RoutedTriangle::catalog(), RoutedTriangle::observations()),
            Self::MulticastTree => (MulticastTree::catalog(), MulticastTree::observations()),
        }
    }
}
