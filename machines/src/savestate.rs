//! Save-state codec.
//!
//! Version 1 layout, all multi-byte fields little-endian:
//!
//! ```text
//! offset   size     field
//! 0        4        magic "SI80"
//! 4        4        version (1)
//! 8        7        A B C D E H L
//! 15       1        flags
//! 16       2        SP
//! 18       2        PC
//! 20       1        interrupt enable
//! 21       1        halted
//! 22       4        pending interrupt-acknowledge cycles
//! 26       2        shift register
//! 28       1        shift offset
//! 29       1        input latch
//! 30       3        DIP switches
//! 33       8        frame counter
//! 41       8        cycle counter
//! 49       1        headless
//! 50       4        speed multiplier (f32)
//! 54       1        uncapped
//! 55       229376   pixel buffer, 256×224 u32
//! 229431   8192     RAM 0x2000-0x3FFF
//! ```
//!
//! Decoding is all-or-nothing: [`SaveState::from_bytes`] either returns a
//! complete state or an error, and nothing is applied to a machine until
//! then.

use std::path::{Path, PathBuf};

use invaders_core::cpu::i8080::INTERRUPT_CYCLES;
use invaders_core::cpu::state::I8080State;
use thiserror::Error;

use crate::space_invaders::{RAM_SIZE, SCREEN_HEIGHT, SCREEN_WIDTH};

pub const SAVE_STATE_MAGIC: [u8; 4] = *b"SI80";
pub const SAVE_STATE_VERSION: u32 = 1;

const HEADER_LEN: usize = 8;
const CPU_LEN: usize = 18;
const MACHINE_LEN: usize = 29;
const PIXEL_COUNT: usize = (SCREEN_WIDTH * SCREEN_HEIGHT) as usize;
const PIXELS_LEN: usize = PIXEL_COUNT * 4;

/// Size of a version 1 save state in bytes.
pub const SAVE_STATE_LEN: usize = HEADER_LEN + CPU_LEN + MACHINE_LEN + PIXELS_LEN + RAM_SIZE;

#[derive(Debug, Error)]
pub enum SaveStateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a save state (magic {found:02X?})")]
    BadMagic { found: [u8; 4] },

    #[error("unsupported save state version {found} (expected {})", SAVE_STATE_VERSION)]
    UnsupportedVersion { found: u32 },

    #[error("save state truncated in {section}: need {expected} bytes, {actual} left")]
    Truncated {
        section: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{extra} unexpected bytes after the end of the save state")]
    TrailingData { extra: usize },

    #[error(
        "pending interrupt-acknowledge cycles {found} (expected 0 or {})",
        INTERRUPT_CYCLES
    )]
    PendingCycles { found: u32 },

    #[error("{section} is {actual} entries, expected {expected}")]
    SectionLength {
        section: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Complete machine state, detached from any machine instance.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveState {
    pub cpu: I8080State,
    pub shift_register: u16,
    pub shift_offset: u8,
    pub input: u8,
    pub dip_switches: [u8; 3],
    pub frame_count: u64,
    pub cycle_count: u64,
    pub headless: bool,
    pub speed_multiplier: f32,
    pub uncapped: bool,
    /// 256×224 ARGB8888 pixels.
    pub framebuffer: Vec<u32>,
    /// RAM bank contents, 0x2000-0x3FFF.
    pub ram: Vec<u8>,
}

impl SaveState {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SAVE_STATE_LEN);
        out.extend_from_slice(&SAVE_STATE_MAGIC);
        out.extend_from_slice(&SAVE_STATE_VERSION.to_le_bytes());

        let cpu = &self.cpu;
        out.extend_from_slice(&[cpu.a, cpu.b, cpu.c, cpu.d, cpu.e, cpu.h, cpu.l, cpu.f]);
        out.extend_from_slice(&cpu.sp.to_le_bytes());
        out.extend_from_slice(&cpu.pc.to_le_bytes());
        out.push(cpu.inte as u8);
        out.push(cpu.halted as u8);
        out.extend_from_slice(&cpu.pending_cycles.to_le_bytes());

        out.extend_from_slice(&self.shift_register.to_le_bytes());
        out.push(self.shift_offset);
        out.push(self.input);
        out.extend_from_slice(&self.dip_switches);
        out.extend_from_slice(&self.frame_count.to_le_bytes());
        out.extend_from_slice(&self.cycle_count.to_le_bytes());
        out.push(self.headless as u8);
        out.extend_from_slice(&self.speed_multiplier.to_le_bytes());
        out.push(self.uncapped as u8);

        for px in &self.framebuffer {
            out.extend_from_slice(&px.to_le_bytes());
        }
        out.extend_from_slice(&self.ram);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SaveStateError> {
        let mut reader = SectionReader { bytes, pos: 0 };

        let header = reader.take("header", HEADER_LEN)?;
        let found = [header[0], header[1], header[2], header[3]];
        if found != SAVE_STATE_MAGIC {
            return Err(SaveStateError::BadMagic { found });
        }
        let version = le_u32(header, 4);
        if version != SAVE_STATE_VERSION {
            return Err(SaveStateError::UnsupportedVersion { found: version });
        }

        let c = reader.take("cpu", CPU_LEN)?;
        let cpu = I8080State {
            a: c[0],
            b: c[1],
            c: c[2],
            d: c[3],
            e: c[4],
            h: c[5],
            l: c[6],
            f: c[7],
            sp: le_u16(c, 8),
            pc: le_u16(c, 10),
            inte: c[12] != 0,
            halted: c[13] != 0,
            pending_cycles: le_u32(c, 14),
        };
        check_pending_cycles(cpu.pending_cycles)?;

        let m = reader.take("machine", MACHINE_LEN)?;
        let pixels = reader.take("pixel buffer", PIXELS_LEN)?;
        let ram = reader.take("ram", RAM_SIZE)?;
        if reader.remaining() > 0 {
            return Err(SaveStateError::TrailingData {
                extra: reader.remaining(),
            });
        }

        Ok(Self {
            cpu,
            shift_register: le_u16(m, 0),
            shift_offset: m[2],
            input: m[3],
            dip_switches: [m[4], m[5], m[6]],
            frame_count: le_u64(m, 7),
            cycle_count: le_u64(m, 15),
            headless: m[23] != 0,
            speed_multiplier: f32::from_bits(le_u32(m, 24)),
            uncapped: m[28] != 0,
            framebuffer: pixels
                .chunks_exact(4)
                .map(|p| u32::from_le_bytes([p[0], p[1], p[2], p[3]]))
                .collect(),
            ram: ram.to_vec(),
        })
    }

    /// Everything [`from_bytes`](Self::from_bytes) would reject in a value
    /// built by hand: section sizes and the pending acknowledge cost.
    pub fn validate(&self) -> Result<(), SaveStateError> {
        self.check_lengths()?;
        check_pending_cycles(self.cpu.pending_cycles)
    }

    /// Verify the variable-length sections have their fixed sizes.
    pub fn check_lengths(&self) -> Result<(), SaveStateError> {
        if self.framebuffer.len() != PIXEL_COUNT {
            return Err(SaveStateError::SectionLength {
                section: "pixel buffer",
                expected: PIXEL_COUNT,
                actual: self.framebuffer.len(),
            });
        }
        if self.ram.len() != RAM_SIZE {
            return Err(SaveStateError::SectionLength {
                section: "ram",
                expected: RAM_SIZE,
                actual: self.ram.len(),
            });
        }
        Ok(())
    }

    /// Write to `<path>.tmp` and rename over `path`, so a crash never
    /// leaves a half-written file under the real name.
    pub fn write_to(&self, path: &Path) -> Result<(), SaveStateError> {
        self.validate()?;
        let tmp = temp_path(path);
        if let Err(e) = std::fs::write(&tmp, self.to_bytes()) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self, SaveStateError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

struct SectionReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SectionReader<'a> {
    fn take(&mut self, section: &'static str, len: usize) -> Result<&'a [u8], SaveStateError> {
        let available = self.remaining();
        if available < len {
            return Err(SaveStateError::Truncated {
                section,
                expected: len,
                actual: available,
            });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

/// An acknowledge is charged once and drained by the next burst, so only
/// nothing or one acknowledge can be outstanding.
fn check_pending_cycles(found: u32) -> Result<(), SaveStateError> {
    if found == 0 || found == INTERRUPT_CYCLES {
        Ok(())
    } else {
        Err(SaveStateError::PendingCycles { found })
    }
}

fn le_u16(b: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([b[at], b[at + 1]])
}

fn le_u32(b: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

fn le_u64(b: &[u8], at: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&b[at..at + 8]);
    u64::from_le_bytes(raw)
}
