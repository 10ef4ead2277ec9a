use std::sync::Mutex;

use axp_core::soc::mmio::MmioHandler;
use mockall::mock;

/// A scratch MMIO device: a small register file that records every access.
///
/// Handlers take `&self` (the registry is shared read-only after
/// finalization), so device state lives behind a mutex.
pub struct ScratchDevice {
    regs: Mutex<Vec<u64>>,
    pub log: Mutex<Vec<(bool, u64, u8, u64)>>,
}

impl ScratchDevice {
    pub fn new(words: usize) -> Self {
        Self {
            regs: Mutex::new(vec![0; words]),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn reg(&self, idx: usize) -> u64 {
        self.regs.lock().unwrap()[idx]
    }

    pub fn set_reg(&self, idx: usize, val: u64) {
        self.regs.lock().unwrap()[idx] = val;
    }

    pub fn accesses(&self) -> Vec<(bool, u64, u8, u64)> {
        self.log.lock().unwrap().clone()
    }
}

impl MmioHandler for ScratchDevice {
    fn read(&self, offset: u64, width: u8) -> u64 {
        let val = self
            .regs
            .lock()
            .unwrap()
            .get(offset as usize / 8)
            .copied()
            .unwrap_or(0);
        self.log.lock().unwrap().push((false, offset, width, val));
        val
    }

    fn write(&self, offset: u64, value: u64, width: u8) {
        if let Some(slot) = self.regs.lock().unwrap().get_mut(offset as usize / 8) {
            *slot = value;
        }
        self.log.lock().unwrap().push((true, offset, width, value));
    }
}

mock! {
    pub MmioDev {}

    impl MmioHandler for MmioDev {
        fn read(&self, offset: u64, width: u8) -> u64;
        fn write(&self, offset: u64, value: u64, width: u8);
    }
}
