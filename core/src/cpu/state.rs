//! CPU state snapshot types and traits

/// Trait for CPU types that can provide and accept full state snapshots
pub trait CpuStateTrait {
    type Snapshot;
    fn snapshot(&self) -> Self::Snapshot;

    /// Overwrite the complete architectural state (used by save-state load).
    fn restore(&mut self, state: &Self::Snapshot);
}

/// I8080 CPU state snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct I8080State {
    pub a: u8,               // Accumulator
    pub b: u8,               // Register B
    pub c: u8,               // Register C
    pub d: u8,               // Register D
    pub e: u8,               // Register E
    pub h: u8,               // Register H
    pub l: u8,               // Register L
    pub f: u8,               // Flags (S Z 0 AC 0 P 1 CY)
    pub sp: u16,             // Stack pointer
    pub pc: u16,             // Program counter
    pub inte: bool,          // Interrupt enable flip-flop
    pub halted: bool,        // HLT executed, waiting for an interrupt
    pub pending_cycles: u32, // Interrupt-acknowledge cycles not yet charged
}
