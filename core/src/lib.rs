pub mod core;
pub mod cpu;
pub mod device;

pub mod prelude {
    pub use crate::core::machine::{InputButton, Machine};
    pub use crate::core::memory::AddressSpace;
    pub use crate::core::{Bus, BusMaster};
    pub use crate::cpu::i8080::I8080;
    pub use crate::cpu::{Cpu, CpuStateTrait};
    pub use crate::device::Mb14241;
}
