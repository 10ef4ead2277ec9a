//! System Control Block decode.
//!
//! The SCB is the guest-resident vector table PALcode dispatches interrupts
//! and exceptions through. Every entry is one quadword: the handler PC in
//! the upper bits and a 2-bit stack disposition in the low bits.

use crate::common::constants::SCB_ENTRY_BYTES;
use crate::core::arch::hwpcb::Hwpcb;
use crate::soc::memory::GuestMemory;

/// Frame-target encoding in SCB entry bits `1:0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackDisposition {
    /// 00: deliver on the kernel stack.
    Kernel,
    /// 01: deliver on the interrupt stack.
    Interrupt,
    /// 10: no frame is built.
    NoFrame,
    /// 11: reserved encoding.
    Reserved,
}

/// Outcome of stack selection for a disposition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackChoice {
    /// Build the frame on this stack pointer.
    Stack(u64),
    /// No frame is built for this vector.
    NoFrame,
    /// Reserved disposition: the caller should raise an illegal-PAL
    /// condition rather than dispatch.
    Illegal,
}

/// Decodes an SCB entry into its handler PC and stack disposition.
pub fn decode_entry(entry: u64) -> (u64, StackDisposition) {
    let disposition = match entry & 3 {
        0 => StackDisposition::Kernel,
        1 => StackDisposition::Interrupt,
        2 => StackDisposition::NoFrame,
        _ => StackDisposition::Reserved,
    };
    (entry & !3, disposition)
}

/// Reads the SCB entry for a vector from guest memory.
pub fn read_entry(mem: &GuestMemory, scbb: u64, vector: u64) -> u64 {
    debug_assert!(vector % SCB_ENTRY_BYTES == 0);
    mem.read64(scbb + vector)
}

/// Selects the stack pointer for a disposition.
///
/// The interrupt stack pointer is not implemented; disposition 01 falls
/// back to the kernel stack. This is a known conformance limitation
/// observable by OpenVMS device drivers.
pub fn select_stack(pcb: &Hwpcb, disposition: StackDisposition) -> StackChoice {
    match disposition {
        StackDisposition::Kernel | StackDisposition::Interrupt => StackChoice::Stack(pcb.ksp()),
        StackDisposition::NoFrame => StackChoice::NoFrame,
        StackDisposition::Reserved => StackChoice::Illegal,
    }
}
