pub mod observation;
pub mod rom_loader;
pub mod savestate;
pub mod space_invaders;

pub use observation::{AddressMap, Observation, ObservationError, ObservationSnapshot};
pub use rom_loader::{RomLoadError, RomSet};
pub use savestate::{SaveState, SaveStateError};
pub use space_invaders::{InitError, MachineConfig, RomImages, SpaceInvadersSystem};
