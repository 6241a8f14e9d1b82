// ============================================================
// Layer 6 — Compute Device Selection
// ============================================================
// Picks the Burn backend + device a run executes on.
//
//   CUDA_VISIBLE_DEVICES   meaning
//   ─────────────────────  ─────────────────────────────────
//   (unset)                best available GPU adapter
//   "" or "-1"             no accelerator → CPU (NdArray)
//   "1,0"                  first listed ordinal → discrete
//                          GPU adapter #1
//
// An explicit --device cpu|gpu overrides the variable.
//
// Reference: Burn Book §2 (Backends)

use std::fmt;

use burn::backend::wgpu::WgpuDevice;
use serde::{Deserialize, Serialize};

pub const VISIBLE_DEVICES_VAR: &str = "CUDA_VISIBLE_DEVICES";

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    #[default]
    Auto,
    Cpu,
    Gpu,
}

/// Parsed value of the visible-devices variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibleDevices {
    Unset,
    Hidden,
    /// First listed ordinal; None when it is not a plain number (e.g. a UUID)
    First(Option<usize>),
}

/// Where training and inference run.
#[derive(Debug, Clone)]
pub enum ComputeDevice {
    Cpu,
    Gpu(WgpuDevice),
}

impl fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu (ndarray)"),
            Self::Gpu(device) => write!(f, "gpu (wgpu {device:?})"),
        }
    }
}

pub fn parse_visible_devices(value: Option<&str>) -> VisibleDevices {
    let Some(value) = value else {
        return VisibleDevices::Unset;
    };
    let first = value.split(',').next().unwrap_or("").trim();
    if first.is_empty() || first.starts_with('-') {
        return VisibleDevices::Hidden;
    }
    VisibleDevices::First(first.parse().ok())
}

fn gpu_for(visible: VisibleDevices) -> WgpuDevice {
    match visible {
        VisibleDevices::First(Some(ordinal)) => WgpuDevice::DiscreteGpu(ordinal),
        _ => WgpuDevice::default(),
    }
}

/// Combine the user preference with the visible-devices value.
pub fn resolve(preference: DevicePreference, visible: Option<&str>) -> ComputeDevice {
    let visible = parse_visible_devices(visible);
    match preference {
        DevicePreference::Cpu => ComputeDevice::Cpu,
        DevicePreference::Gpu => ComputeDevice::Gpu(gpu_for(visible)),
        DevicePreference::Auto => match visible {
            VisibleDevices::Hidden => ComputeDevice::Cpu,
            other => ComputeDevice::Gpu(gpu_for(other)),
        },
    }
}

/// Resolve against the current process environment.
pub fn select_device(preference: DevicePreference) -> ComputeDevice {
    let visible = std::env::var(VISIBLE_DEVICES_VAR).ok();
    let device = resolve(preference, visible.as_deref());
    tracing::info!("Using device: {}", device);
    device
}
