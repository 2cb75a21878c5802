//! Device memory and utilization telemetry.
//!
//! Purely observational collaborator: callers may query device state before
//! and after operator applications for diagnostics. Telemetry never
//! influences the numerical path, and its failures are reported as status
//! rather than propagated.
//!
//! Monitoring state is not process-global: a [`DeviceMonitor`] is an owned
//! session with an explicit open/close lifecycle, and all queries go through
//! the session handle. Queries against a backend that could not be opened
//! report [`TelemetryError::NotInitialised`]; values are never fabricated.
//!
//! The backend is NVML, compiled in behind the `nvml` cargo feature. Without
//! the feature the module still builds and every session open reports the
//! backend as unavailable.

use crate::error::TelemetryError;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Memory usage of one device, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMemoryReport {
    pub device: u32,
    pub used_bytes: u64,
    pub total_bytes: u64,
}

impl DeviceMemoryReport {
    /// Used memory as a percentage of total memory.
    pub fn used_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        100.0 * self.used_bytes as f64 / self.total_bytes as f64
    }
}

/// Busy percentages of one device over the last sample period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceUtilizationReport {
    pub device: u32,
    /// Time the device spent executing work, in percent.
    pub device_busy_percent: u32,
    /// Time the memory controller was busy, in percent.
    pub memory_busy_percent: u32,
}

/// An open telemetry session.
///
/// `rank` identifies the distributed process the reports belong to and is
/// included in every log line, alongside a caller-supplied label.
pub struct DeviceMonitor {
    rank: usize,
    #[cfg(feature = "nvml")]
    nvml: nvml_wrapper::Nvml,
}

impl std::fmt::Debug for DeviceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceMonitor")
            .field("rank", &self.rank)
            .finish_non_exhaustive()
    }
}

impl DeviceMonitor {
    /// The process rank this session reports for.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Logs per-device memory usage, prefixed by `label`.
    ///
    /// Backend failures are logged as status and never propagated.
    pub fn log_memory_usage(&self, label: &str) {
        match self.memory_reports() {
            Ok(reports) => {
                for report in reports {
                    info!(
                        "{label} rank {} device {} memory used: {} of {} bytes ({:.1} %)",
                        self.rank,
                        report.device,
                        report.used_bytes,
                        report.total_bytes,
                        report.used_percent()
                    );
                }
            }
            Err(status) => info!("{label} rank {}: {status}", self.rank),
        }
    }

    /// Logs per-device busy percentages, prefixed by `label`.
    ///
    /// Backend failures are logged as status and never propagated.
    pub fn log_utilization(&self, label: &str) {
        match self.utilization_reports() {
            Ok(reports) => {
                for report in reports {
                    info!(
                        "{label} rank {} device {} busy: {} % (memory {} %)",
                        self.rank,
                        report.device,
                        report.device_busy_percent,
                        report.memory_busy_percent
                    );
                }
            }
            Err(status) => info!("{label} rank {}: {status}", self.rank),
        }
    }
}

#[cfg(feature = "nvml")]
impl DeviceMonitor {
    /// Opens a telemetry session for the given process rank.
    pub fn open(rank: usize) -> Result<Self, TelemetryError> {
        match nvml_wrapper::Nvml::init() {
            Ok(nvml) => {
                debug!("opened NVML telemetry session for rank {rank}");
                Ok(Self { rank, nvml })
            }
            Err(error) => Err(TelemetryError::Backend(error.to_string())),
        }
    }

    /// Number of devices visible to the session.
    pub fn device_count(&self) -> Result<u32, TelemetryError> {
        self.nvml
            .device_count()
            .map_err(|error| TelemetryError::Backend(error.to_string()))
    }

    /// Memory usage of every visible device.
    pub fn memory_reports(&self) -> Result<Vec<DeviceMemoryReport>, TelemetryError> {
        let count = self.device_count()?;
        let mut reports = Vec::with_capacity(count as usize);
        for device_index in 0..count {
            let device = self
                .nvml
                .device_by_index(device_index)
                .map_err(|error| TelemetryError::Backend(error.to_string()))?;
            let memory = device
                .memory_info()
                .map_err(|error| TelemetryError::Backend(error.to_string()))?;
            reports.push(DeviceMemoryReport {
                device: device_index,
                used_bytes: memory.used,
                total_bytes: memory.total,
            });
        }
        Ok(reports)
    }

    /// Busy percentages of every visible device.
    pub fn utilization_reports(&self) -> Result<Vec<DeviceUtilizationReport>, TelemetryError> {
        let count = self.device_count()?;
        let mut reports = Vec::with_capacity(count as usize);
        for device_index in 0..count {
            let device = self
                .nvml
                .device_by_index(device_index)
                .map_err(|error| TelemetryError::Backend(error.to_string()))?;
            let utilization = device
                .utilization_rates()
                .map_err(|error| TelemetryError::Backend(error.to_string()))?;
            reports.push(DeviceUtilizationReport {
                device: device_index,
                device_busy_percent: utilization.gpu,
                memory_busy_percent: utilization.memory,
            });
        }
        Ok(reports)
    }

    /// Closes the session, shutting the backend down.
    pub fn close(self) {
        debug!("closed NVML telemetry session for rank {}", self.rank);
        // The backend shuts down when the handle is dropped
    }
}

#[cfg(not(feature = "nvml"))]
impl DeviceMonitor {
    /// Opens a telemetry session for the given process rank.
    ///
    /// Without the `nvml` feature there is no backend to initialise, so this
    /// always reports [`TelemetryError::NotInitialised`].
    pub fn open(rank: usize) -> Result<Self, TelemetryError> {
        debug!("telemetry backend not compiled in (rank {rank})");
        Err(TelemetryError::NotInitialised)
    }

    /// Number of devices visible to the session.
    pub fn device_count(&self) -> Result<u32, TelemetryError> {
        Err(TelemetryError::NotInitialised)
    }

    /// Memory usage of every visible device.
    pub fn memory_reports(&self) -> Result<Vec<DeviceMemoryReport>, TelemetryError> {
        Err(TelemetryError::NotInitialised)
    }

    /// Busy percentages of every visible device.
    pub fn utilization_reports(&self) -> Result<Vec<DeviceUtilizationReport>, TelemetryError> {
        Err(TelemetryError::NotInitialised)
    }

    /// Closes the session.
    pub fn close(self) {}
}
