//! DMA coherency hooks.
//!
//! Device emulators bracket their DMA with the two hooks here. For devices
//! registered as non-coherent, the hooks stand in for the cache maintenance
//! real hardware performs: a sequentially-consistent fence orders the device
//! thread's view of guest RAM against the CPU threads. Coherent devices skip
//! the fence; every device write still breaks intersecting reservations.
//!
//! The coherency attribute is fixed per device UID at registration time; it
//! is not synchronized against in-flight DMA and must not change at runtime.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{Ordering, fence};

use tracing::warn;

use crate::soc::memory::GuestMemory;
use crate::soc::reservation::ReservationManager;

/// Per-device coherency attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Coherency {
    /// Device snoops the coherency fabric; no maintenance needed.
    Coherent,
    /// Device bypasses the fabric; flush/invalidate plus fence required.
    #[default]
    NonCoherent,
}

/// DMA direction, for rejection logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DmaDirection {
    /// Device reads guest RAM (descriptor fetch, TX payload).
    DeviceRead,
    /// Device writes guest RAM (RX payload, completion status).
    DeviceWrite,
}

/// DMA coherency manager: per-UID attributes plus the hooks devices call.
#[derive(Debug)]
pub struct DmaCoherency {
    attrs: HashMap<u64, Coherency>,
    mem: Arc<GuestMemory>,
    reservations: Arc<ReservationManager>,
}

impl DmaCoherency {
    /// Creates a manager over the shared RAM image and reservation table.
    pub fn new(mem: Arc<GuestMemory>, reservations: Arc<ReservationManager>) -> Self {
        Self {
            attrs: HashMap::new(),
            mem,
            reservations,
        }
    }

    /// Registers a device's coherency attribute. Configuration-time only.
    pub fn register_device(&mut self, device_uid: u64, coherency: Coherency) {
        let _ = self.attrs.insert(device_uid, coherency);
    }

    /// Returns a device's registered attribute (unknown devices are treated
    /// as non-coherent, the conservative choice).
    pub fn coherency_of(&self, device_uid: u64) -> Coherency {
        self.attrs
            .get(&device_uid)
            .copied()
            .unwrap_or(Coherency::NonCoherent)
    }

    /// Validates a DMA target range. Targets must lie in RAM; anything else
    /// is rejected and logged with device UID, direction, and address.
    fn validate(&self, pa: u64, size: u64, device_uid: u64, dir: DmaDirection) -> bool {
        if self.mem.is_ram(pa, size) {
            return true;
        }
        warn!(
            uid = format_args!("{device_uid:#x}"),
            pa = format_args!("{pa:#x}"),
            size,
            ?dir,
            "DMA target outside RAM rejected"
        );
        false
    }

    /// Called before a device reads guest RAM.
    ///
    /// For non-coherent devices, makes all CPU-side writes to
    /// `[pa, pa+size)` visible to the device thread. No-op for coherent
    /// devices. Returns `false` when the target is not RAM.
    pub fn prepare_for_device_read(&self, pa: u64, size: u64, device_uid: u64) -> bool {
        if !self.validate(pa, size, device_uid, DmaDirection::DeviceRead) {
            return false;
        }
        if self.coherency_of(device_uid) == Coherency::NonCoherent {
            fence(Ordering::SeqCst);
        }
        true
    }

    /// Called after a device writes guest RAM.
    ///
    /// Breaks every reservation intersecting `[pa, pa+size)`; non-coherent
    /// devices additionally fence so CPU threads observe the new data before
    /// the completion interrupt. Returns `false` when the target is not RAM.
    pub fn handle_device_write(&self, pa: u64, size: u64, device_uid: u64) -> bool {
        if !self.validate(pa, size, device_uid, DmaDirection::DeviceWrite) {
            return false;
        }
        self.reservations.invalidate_range(pa, size);
        if self.coherency_of(device_uid) == Coherency::NonCoherent {
            fence(Ordering::SeqCst);
        }
        true
    }
}
