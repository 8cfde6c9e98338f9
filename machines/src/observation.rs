//! Game-state extraction from work RAM.
//!
//! Every field lives at a fixed RAM address that is only valid for one
//! program revision, so addresses are grouped into an [`AddressMap`] keyed
//! by the CRC32s of the four program chips.

use thiserror::Error;

use crate::space_invaders::SpaceInvadersSystem;

/// Number of alien slots: 5 rows of 11.
pub const ALIEN_GRID_LEN: usize = 55;

/// Reserve ships plus the live one can never exceed this.
pub const MAX_LIVES: u32 = 6;

/// Level is not stored in RAM; one level per ~60 s of play is assumed.
pub const FRAMES_PER_LEVEL: u64 = 3600;

#[derive(Debug, Error)]
pub enum ObservationError {
    #[error("no RAM address map for program ROM with CRC32s {checksums:08X?}")]
    UnknownRevision { checksums: [u32; 4] },
}

/// X/Y byte addresses of one shot slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotAddresses {
    pub x: u16,
    pub y: u16,
}

/// RAM layout of one program revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressMap {
    pub name: &'static str,
    /// CRC32 of chips h, g, f, e.
    pub checksums: [u32; 4],

    /// Two BCD digits each.
    pub score_lo: u16,
    pub score_hi: u16,
    pub reserve_ships: u16,
    pub player_alive: u16,
    pub player_x: u16,
    pub player_y: u16,
    /// First of [`ALIEN_GRID_LEN`] alive flags.
    pub alien_grid: u16,
    pub alien_count: u16,

    pub player_shot_status: u16,
    pub player_shot: ShotAddresses,
    pub rolling_shot: ShotAddresses,
    pub plunger_shot: ShotAddresses,
    pub squiggly_shot: ShotAddresses,

    pub ufo_active: u16,
    pub ufo_x: u16,
    pub ufo_y: u16,
}

/// Midway "invaders" (MAME set name), the 1978 release.
pub static INVADERS_MIDWAY: AddressMap = AddressMap {
    name: "invaders",
    checksums: [0x734F_5AD8, 0x6BFA_CA4A, 0x0CCE_AD96, 0x14E5_38B0],
    score_lo: 0x20F8,
    score_hi: 0x20F9,
    reserve_ships: 0x21FF,
    player_alive: 0x20E7,
    player_x: 0x201B,
    player_y: 0x201A,
    alien_grid: 0x2100,
    alien_count: 0x2082,
    player_shot_status: 0x2025,
    player_shot: ShotAddresses {
        x: 0x202A,
        y: 0x2029,
    },
    rolling_shot: ShotAddresses {
        x: 0x203E,
        y: 0x203D,
    },
    plunger_shot: ShotAddresses {
        x: 0x204E,
        y: 0x204D,
    },
    squiggly_shot: ShotAddresses {
        x: 0x205E,
        y: 0x205D,
    },
    ufo_active: 0x2084,
    ufo_x: 0x207C,
    ufo_y: 0x207B,
};

static KNOWN_REVISIONS: &[&AddressMap] = &[&INVADERS_MIDWAY];

/// Find the map whose chip checksums match exactly.
pub fn lookup(checksums: &[u32; 4]) -> Option<&'static AddressMap> {
    KNOWN_REVISIONS
        .iter()
        .copied()
        .find(|map| &map.checksums == checksums)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShotState {
    /// Non-zero Y byte.
    pub active: bool,
    pub x: u8,
    pub y: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UfoState {
    pub active: bool,
    /// Both 0 while inactive.
    pub x: u8,
    pub y: u8,
}

/// Every observable field at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationSnapshot {
    pub score: u32,
    pub lives: u32,
    pub game_over: bool,
    pub level: u32,
    pub player_x: u8,
    pub player_y: u8,
    pub player_alive: bool,
    pub alien_grid: [u8; ALIEN_GRID_LEN],
    pub alien_count: u8,
    pub player_shot: ShotState,
    pub rolling_shot: ShotState,
    pub plunger_shot: ShotState,
    pub squiggly_shot: ShotState,
    pub ufo: UfoState,
}

/// Read-only view of a machine through an address map. Values are read on
/// each call, so an `Observation` always reflects current RAM.
pub struct Observation<'a> {
    system: &'a SpaceInvadersSystem,
    map: &'a AddressMap,
}

impl<'a> Observation<'a> {
    pub(crate) fn new(system: &'a SpaceInvadersSystem, map: &'a AddressMap) -> Self {
        Self { system, map }
    }

    fn byte(&self, addr: u16) -> u8 {
        self.system.read_memory(addr)
    }

    pub fn map(&self) -> &AddressMap {
        self.map
    }

    /// Four-digit score (0-9999) decoded from two BCD bytes.
    pub fn score(&self) -> u32 {
        let lo = bcd_to_binary(self.byte(self.map.score_lo));
        let hi = bcd_to_binary(self.byte(self.map.score_hi));
        hi * 100 + lo
    }

    /// Reserve ships plus the one in play. Anything above [`MAX_LIVES`]
    /// is a garbage read (attract mode, boot) and reports 0.
    pub fn lives(&self) -> u32 {
        let reserve = self.byte(self.map.reserve_ships) as u32;
        let lives = reserve + self.player_alive() as u32;
        if lives > MAX_LIVES { 0 } else { lives }
    }

    pub fn is_game_over(&self) -> bool {
        self.system.is_halted()
            || (!self.player_alive() && self.byte(self.map.reserve_ships) == 0)
    }

    /// Estimate only: frame count / [`FRAMES_PER_LEVEL`] + 1.
    pub fn level(&self) -> u32 {
        let level = self.system.frame_count() / FRAMES_PER_LEVEL + 1;
        u32::try_from(level).unwrap_or(u32::MAX)
    }

    pub fn player_x(&self) -> u8 {
        self.byte(self.map.player_x)
    }

    pub fn player_y(&self) -> u8 {
        self.byte(self.map.player_y)
    }

    pub fn player_alive(&self) -> bool {
        self.byte(self.map.player_alive) != 0
    }

    /// One alive flag per alien in RAM order, 11 per row.
    pub fn alien_grid(&self) -> [u8; ALIEN_GRID_LEN] {
        let mut grid = [0u8; ALIEN_GRID_LEN];
        self.alien_grid_into(&mut grid);
        grid
    }

    pub fn alien_grid_into(&self, out: &mut [u8; ALIEN_GRID_LEN]) {
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.byte(self.map.alien_grid.wrapping_add(i as u16));
        }
    }

    pub fn alien_count(&self) -> u8 {
        self.byte(self.map.alien_count)
    }

    fn shot(&self, addrs: ShotAddresses) -> ShotState {
        let y = self.byte(addrs.y);
        ShotState {
            active: y != 0,
            x: self.byte(addrs.x),
            y,
        }
    }

    pub fn player_shot(&self) -> ShotState {
        self.shot(self.map.player_shot)
    }

    /// Raw player shot state byte (0 = available, non-zero while the shot
    /// is being set up, in flight or exploding).
    pub fn player_shot_status(&self) -> u8 {
        self.byte(self.map.player_shot_status)
    }

    pub fn rolling_shot(&self) -> ShotState {
        self.shot(self.map.rolling_shot)
    }

    pub fn plunger_shot(&self) -> ShotState {
        self.shot(self.map.plunger_shot)
    }

    pub fn squiggly_shot(&self) -> ShotState {
        self.shot(self.map.squiggly_shot)
    }

    pub fn ufo(&self) -> UfoState {
        if self.byte(self.map.ufo_active) == 0 {
            return UfoState::default();
        }
        UfoState {
            active: true,
            x: self.byte(self.map.ufo_x),
            y: self.byte(self.map.ufo_y),
        }
    }

    pub fn snapshot(&self) -> ObservationSnapshot {
        ObservationSnapshot {
            score: self.score(),
            lives: self.lives(),
            game_over: self.is_game_over(),
            level: self.level(),
            player_x: self.player_x(),
            player_y: self.player_y(),
            player_alive: self.player_alive(),
            alien_grid: self.alien_grid(),
            alien_count: self.alien_count(),
            player_shot: self.player_shot(),
            rolling_shot: self.rolling_shot(),
            plunger_shot: self.plunger_shot(),
            squiggly_shot: self.squiggly_shot(),
            ufo: self.ufo(),
        }
    }
}

/// Two packed decimal digits. Nibbles above 9 are taken at face value.
fn bcd_to_binary(byte: u8) -> u32 {
    (byte >> 4) as u32 * 10 + (byte & 0x0F) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcd_digits() {
        assert_eq!(bcd_to_binary(0x00), 0);
        assert_eq!(bcd_to_binary(0x23), 23);
        assert_eq!(bcd_to_binary(0x99), 99);
    }

    #[test]
    fn lookup_matches_all_four_chips() {
        let map = lookup(&[0x734F_5AD8, 0x6BFA_CA4A, 0x0CCE_AD96, 0x14E5_38B0]);
        assert_eq!(map.map(|m| m.name), Some("invaders"));
        assert!(lookup(&[0x734F_5AD8, 0x6BFA_CA4A, 0x0CCE_AD96, 0]).is_none());
    }

    #[test]
    fn known_addresses_are_in_ram() {
        let m = &INVADERS_MIDWAY;
        let addrs = [
            m.score_lo,
            m.score_hi,
            m.reserve_ships,
            m.player_alive,
            m.player_x,
            m.player_y,
            m.alien_count,
            m.player_shot_status,
            m.ufo_active,
            m.ufo_x,
            m.ufo_y,
            m.alien_grid + ALIEN_GRID_LEN as u16 - 1,
        ];
        for addr in addrs {
            assert!((0x2000..0x2400).contains(&addr), "0x{addr:04X}");
        }
    }
}
