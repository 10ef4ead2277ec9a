//! Alpha Processor Modes.
//!
//! This module defines the four privilege modes of the Alpha architecture.
//! It implements the following:
//! 1. **Mode Classification:** Kernel, Executive, Supervisor, and User modes.
//! 2. **Serialization:** Conversion between the 2-bit CM field and enum variants.
//! 3. **Observability:** Human-readable naming and display formatting.

/// Alpha current-mode (CM) privilege levels.
///
/// Kernel is the most privileged mode; User the least. The numeric values
/// are the architectural CM encoding and double as stack-pointer slot
/// indices in the HWPCB.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Cm {
    /// Kernel mode: PALcode and the OS inner kernel.
    Kernel = 0,

    /// Executive mode: OpenVMS record management services.
    Executive = 1,

    /// Supervisor mode: OpenVMS command language interpreter.
    Supervisor = 2,

    /// User mode: application code.
    User = 3,
}

impl Cm {
    /// Converts a 2-bit CM field value to a mode. Values fold modulo 4.
    pub fn from_bits(val: u64) -> Self {
        match val & 3 {
            0 => Self::Kernel,
            1 => Self::Executive,
            2 => Self::Supervisor,
            _ => Self::User,
        }
    }

    /// Returns the 2-bit CM encoding of this mode.
    #[inline(always)]
    pub fn bits(self) -> u64 {
        self as u64
    }

    /// Returns the human-readable name of the mode.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Kernel => "Kernel",
            Self::Executive => "Executive",
            Self::Supervisor => "Supervisor",
            Self::User => "User",
        }
    }
}

impl std::fmt::Display for Cm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
