pub mod bus;
pub mod machine;
pub mod memory;

pub use bus::{Bus, BusMaster};
pub use machine::{InputButton, Machine};
pub use memory::{AddressSpace, BankError, MemoryBank};
