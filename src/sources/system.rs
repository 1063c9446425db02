// System counters and gauges via sysinfo: CPU, memory, network, disk I/O.

use std::sync::{Arc, Mutex};
use std::time::Instant;
use sysinfo::{Disks, Networks, System};
use tracing::instrument;

use super::{CounterSource, SourceReading};
use crate::error::{Result, SamplerError};
use crate::models::names;

/// Shared sysinfo handles; each source locks only what it refreshes.
#[derive(Clone)]
pub struct SystemProbe {
    sys: Arc<Mutex<System>>,
    networks: Arc<Mutex<Networks>>,
    disks: Arc<Mutex<Disks>>,
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemProbe {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        sys.refresh_memory();
        let networks = Networks::new_with_refreshed_list();
        let disks = Disks::new_with_refreshed_list();
        Self {
            sys: Arc::new(Mutex::new(sys)),
            networks: Arc::new(Mutex::new(networks)),
            disks: Arc::new(Mutex::new(disks)),
        }
    }

    pub fn cpu(&self) -> CpuSource {
        CpuSource {
            sys: self.sys.clone(),
            last_refresh: Mutex::new(None),
        }
    }

    pub fn memory(&self) -> MemorySource {
        MemorySource {
            sys: self.sys.clone(),
        }
    }

    pub fn network(&self) -> NetworkSource {
        NetworkSource {
            networks: self.networks.clone(),
        }
    }

    pub fn disk(&self) -> DiskSource {
        DiskSource {
            disks: self.disks.clone(),
        }
    }
}

fn poisoned(source: &str, e: impl std::fmt::Display) -> SamplerError {
    SamplerError::unavailable(source, format!("sysinfo lock poisoned: {}", e))
}

pub struct CpuSource {
    sys: Arc<Mutex<System>>,
    /// Last refresh time and usage; sysinfo needs a minimum gap between refreshes.
    last_refresh: Mutex<Option<(Instant, f64)>>,
}

impl CounterSource for CpuSource {
    fn name(&self) -> &str {
        names::SOURCE_CPU
    }

    #[instrument(skip(self), fields(source = "cpu", operation = "sample"))]
    fn sample(&self) -> Result<SourceReading> {
        let mut sys = self.sys.lock().map_err(|e| poisoned(self.name(), e))?;
        let mut last = self.last_refresh.lock().map_err(|e| poisoned(self.name(), e))?;

        let now = Instant::now();
        let usage = match *last {
            Some((prev_ts, prev_usage))
                if now.duration_since(prev_ts) < sysinfo::MINIMUM_CPU_UPDATE_INTERVAL =>
            {
                prev_usage
            }
            _ => {
                sys.refresh_cpu_all();
                let usage = sys.global_cpu_usage() as f64;
                *last = Some((now, usage));
                usage
            }
        };
        let speed_ghz = sys
            .cpus()
            .first()
            .map(|c| c.frequency() as f64 / 1000.0)
            .unwrap_or(0.0);

        Ok(SourceReading::default()
            .gauge(names::CPU_PERCENT, usage.clamp(0.0, 100.0))
            .gauge(names::CPU_SPEED_GHZ, speed_ghz))
    }
}

pub struct MemorySource {
    sys: Arc<Mutex<System>>,
}

impl CounterSource for MemorySource {
    fn name(&self) -> &str {
        names::SOURCE_MEMORY
    }

    #[instrument(skip(self), fields(source = "memory", operation = "sample"))]
    fn sample(&self) -> Result<SourceReading> {
        let mut sys = self.sys.lock().map_err(|e| poisoned(self.name(), e))?;
        sys.refresh_memory();

        let total = sys.total_memory();
        let used = total.saturating_sub(sys.available_memory());
        let usage_percent = if total > 0 {
            (used as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        Ok(SourceReading::default()
            .gauge(names::MEMORY_PERCENT, usage_percent)
            .gauge(names::MEMORY_USED_BYTES, used as f64)
            .gauge(names::MEMORY_TOTAL_BYTES, total as f64))
    }
}

pub struct NetworkSource {
    networks: Arc<Mutex<Networks>>,
}

impl CounterSource for NetworkSource {
    fn name(&self) -> &str {
        names::SOURCE_NETWORK
    }

    #[instrument(skip(self), fields(source = "network", operation = "sample"))]
    fn sample(&self) -> Result<SourceReading> {
        let mut networks = self.networks.lock().map_err(|e| poisoned(self.name(), e))?;
        networks.refresh(true);

        // Interfaces that disappear drop out of the sum; the rate
        // calculator treats the resulting decrease as a counter reset.
        let (sent, recv) = networks
            .list()
            .values()
            .fold((0u64, 0u64), |(tx, rx), data| {
                (
                    tx.saturating_add(data.total_transmitted()),
                    rx.saturating_add(data.total_received()),
                )
            });

        Ok(SourceReading::default()
            .counter(names::NET_BYTES_SENT, sent)
            .counter(names::NET_BYTES_RECV, recv))
    }
}

/// Cumulative bytes read/written across all disks sysinfo lists.
pub struct DiskSource {
    disks: Arc<Mutex<Disks>>,
}

impl CounterSource for DiskSource {
    fn name(&self) -> &str {
        names::SOURCE_DISK
    }

    #[instrument(skip(self), fields(source = "disk", operation = "sample"))]
    fn sample(&self) -> Result<SourceReading> {
        let mut disks = self.disks.lock().map_err(|e| poisoned(self.name(), e))?;
        disks.refresh(true);

        // Same as network: a removed disk shows up as a counter reset.
        let (read, written) = disks.list().iter().fold((0u64, 0u64), |(r, w), disk| {
            let usage = disk.usage();
            (
                r.saturating_add(usage.total_read_bytes),
                w.saturating_add(usage.total_written_bytes),
            )
        });

        Ok(SourceReading::default()
            .counter(names::DISK_BYTES_READ, read)
            .counter(names::DISK_BYTES_WRITTEN, written))
    }
}
