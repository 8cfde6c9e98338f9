use crate::core::{Bus, BusMaster};

/// Generic CPU interface
pub trait Cpu: CpuStateTrait {
    type Bus: Bus + ?Sized;

    /// Clear the register file and start fetching at `vector`.
    fn reset(&mut self, vector: u16);

    /// Run whole instructions until at least `budget` cycles have been
    /// consumed or the CPU halts. Returns the cycles actually consumed.
    fn execute(&mut self, bus: &mut Self::Bus, master: BusMaster, budget: u32) -> u32;

    /// Deliver an externally triggered interrupt. Returns false if it was
    /// masked and dropped.
    fn interrupt(&mut self, bus: &mut Self::Bus, master: BusMaster, vector: u16) -> bool;

    /// Query if the CPU is halted internally (HLT instruction)
    fn is_sleeping(&self) -> bool;
}

// Re-export state types
pub mod state;
pub use state::{CpuStateTrait, I8080State};

// Intel 8080 CPU
pub mod i8080;
pub use i8080::I8080;
