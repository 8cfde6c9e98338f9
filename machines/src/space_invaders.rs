use std::path::Path;

use invaders_core::core::memory::BankError;
use invaders_core::cpu::state::I8080State;
use invaders_core::prelude::*;
use thiserror::Error;

use crate::observation::{self, AddressMap, Observation, ObservationError};
use crate::rom_loader::{LoadedRegion, RomEntry, RomLoadError, RomRegion, RomSet};
use crate::savestate::{SaveState, SaveStateError};

// ---------------------------------------------------------------------------
// ROM definitions ("invaders" Midway set)
// ---------------------------------------------------------------------------

/// Program ROM: 8KB at 0x0000-0x1FFF (four 2KB chips).
pub static INVADERS_PROGRAM_ROM: RomRegion = RomRegion {
    size: 0x2000,
    entries: &[
        RomEntry {
            name: "invaders.h",
            size: 0x0800,
            offset: 0x0000,
            crc32: 0x734F_5AD8,
        },
        RomEntry {
            name: "invaders.g",
            size: 0x0800,
            offset: 0x0800,
            crc32: 0x6BFA_CA4A,
        },
        RomEntry {
            name: "invaders.f",
            size: 0x0800,
            offset: 0x1000,
            crc32: 0x0CCE_AD96,
        },
        RomEntry {
            name: "invaders.e",
            size: 0x0800,
            offset: 0x1800,
            crc32: 0x14E5_38B0,
        },
    ],
};

/// The four program chips in load order (h, g, f, e), 2KB each.
#[derive(Clone, Copy)]
pub struct RomImages<'a> {
    pub h: &'a [u8],
    pub g: &'a [u8],
    pub f: &'a [u8],
    pub e: &'a [u8],
}

// ---------------------------------------------------------------------------
// Memory map
// ---------------------------------------------------------------------------

pub const ROM_BASE: u16 = 0x0000;
pub const ROM_SIZE: usize = 0x2000;
pub const RAM_BASE: u16 = 0x2000;
pub const RAM_SIZE: usize = 0x2000;
/// Video RAM is the top 7KB of the RAM bank.
pub const VRAM_BASE: u16 = 0x2400;
pub const VRAM_SIZE: usize = 0x1C00;

/// Execution starts one byte in; the first ROM byte is patched to JMP.
pub const RESET_VECTOR: u16 = 0x0001;
const ROM_PATCH_OPCODE: u8 = 0xC3;

// ---------------------------------------------------------------------------
// Input button IDs and port 1 latch bits
// ---------------------------------------------------------------------------
pub const INPUT_COIN: u8 = 0;
pub const INPUT_P2_START: u8 = 1;
pub const INPUT_P1_START: u8 = 2;
pub const INPUT_P1_FIRE: u8 = 3;
pub const INPUT_P1_LEFT: u8 = 4;
pub const INPUT_P1_RIGHT: u8 = 5;

pub const INPUT_BIT_COIN: u8 = 0x01;
pub const INPUT_BIT_P2_START: u8 = 0x02;
pub const INPUT_BIT_P1_START: u8 = 0x04;
/// Wired high on the board.
pub const INPUT_BIT_IDLE: u8 = 0x08;
pub const INPUT_BIT_FIRE: u8 = 0x10;
pub const INPUT_BIT_LEFT: u8 = 0x20;
pub const INPUT_BIT_RIGHT: u8 = 0x40;
const INPUT_DEFINED_MASK: u8 = 0x77;

const INVADERS_INPUT_MAP: &[InputButton] = &[
    InputButton { id: INPUT_COIN, name: "Coin" },
    InputButton { id: INPUT_P1_START, name: "P1 Start" },
    InputButton { id: INPUT_P2_START, name: "P2 Start" },
    InputButton { id: INPUT_P1_FIRE, name: "P1 Fire" },
    InputButton { id: INPUT_P1_LEFT, name: "P1 Left" },
    InputButton { id: INPUT_P1_RIGHT, name: "P1 Right" },
];

/// Factory DIP settings: 3 ships, extra ship at 1500, coin info shown.
pub const DEFAULT_DIP_SWITCHES: [u8; 3] = [0x0E, 0x08, 0x00];

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------
// CPU clock:   19.968 MHz / 10 = 1.9968 MHz
// Frame:       two bursts of 17066 cycles, RST 1 after the first
//              (beam at mid-screen), RST 2 after the second (VBLANK)
// Frame rate:  1996800 / 34132 ≈ 58.5 Hz

pub const HALF_FRAME_CYCLES: u32 = 17_066;
pub const CPU_CLOCK_HZ: u64 = 1_996_800;
pub const MID_SCREEN_VECTOR: u16 = 0x0008;
pub const END_SCREEN_VECTOR: u16 = 0x0010;

// ---------------------------------------------------------------------------
// Video
// ---------------------------------------------------------------------------

/// Native raster size, before the cabinet's 90° monitor rotation.
pub const SCREEN_WIDTH: u32 = 256;
pub const SCREEN_HEIGHT: u32 = 224;
const PIXEL_COUNT: usize = (SCREEN_WIDTH * SCREEN_HEIGHT) as usize;

pub const PIXEL_WHITE: u32 = 0xFFFF_FFFF;
pub const PIXEL_BLACK: u32 = 0xFF00_0000;

const MASTER: BusMaster = BusMaster::Cpu(0);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Run-time configuration. The machine only stores `headless`,
/// `speed_multiplier` and `uncapped`; pacing is up to the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineConfig {
    pub headless: bool,
    pub speed_multiplier: f32,
    pub uncapped: bool,
    pub dip_switches: [u8; 3],
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            headless: false,
            speed_multiplier: 1.0,
            uncapped: false,
            dip_switches: DEFAULT_DIP_SWITCHES,
        }
    }
}

impl MachineConfig {
    pub fn headless(dip_switches: Option<[u8; 3]>) -> Self {
        Self {
            headless: true,
            speed_multiplier: 0.0,
            uncapped: true,
            dip_switches: dip_switches.unwrap_or(DEFAULT_DIP_SWITCHES),
        }
    }
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error("ROM load failed: {0}")]
    Rom(#[from] RomLoadError),

    #[error("memory map rejected: {0}")]
    Bank(#[from] BankError),
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Everything on the CPU's side of the bus: banked memory plus the port
/// devices. Kept apart from the CPU so the CPU can borrow it mutably.
struct InvadersBoard {
    memory: AddressSpace,
    shifter: Mb14241,
    input: u8,
    dip_switches: [u8; 3],
}

impl Bus for InvadersBoard {
    type Address = u16;
    type Data = u8;

    fn read(&mut self, _master: BusMaster, addr: u16) -> u8 {
        self.memory.read(addr)
    }

    fn write(&mut self, _master: BusMaster, addr: u16, data: u8) {
        self.memory.write(addr, data);
    }

    fn io_read(&mut self, _master: BusMaster, addr: u16) -> u8 {
        match addr & 0xFF {
            0 => self.dip_switches[0],
            1 => self.input,
            2 => self.dip_switches[2],
            3 => self.shifter.read_result(),
            port => {
                log::trace!("read from unregistered port {port}");
                0x00
            }
        }
    }

    fn io_write(&mut self, _master: BusMaster, addr: u16, data: u8) {
        match addr & 0xFF {
            2 => self.shifter.set_offset(data),
            4 => self.shifter.write_data(data),
            // Sound latches and watchdog: accepted, nothing emulated
            3 | 5 | 6 => {}
            port => log::trace!("write 0x{data:02X} to unregistered port {port}"),
        }
    }
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// Space Invaders (Taito/Midway, 1978)
///
/// Hardware: Intel 8080 @ 1.9968 MHz, MB14241 shift register on ports 2/3/4.
/// Memory: 8KB ROM at 0x0000, 8KB RAM at 0x2000 of which 0x2400-0x3FFF is
/// a 1bpp bitmap. Screen: 256×224 displayed rotated 90° CCW.
pub struct SpaceInvadersSystem {
    cpu: I8080,
    board: InvadersBoard,

    // ARGB8888, VRAM order. Refreshed only by update_framebuffer().
    framebuffer: Vec<u32>,

    frame_count: u64,
    cycle_count: u64,

    headless: bool,
    speed_multiplier: f32,
    uncapped: bool,

    program_checksums: [u32; 4],
    address_map: Option<AddressMap>,
}

impl SpaceInvadersSystem {
    /// Interactive instance from the four program chips.
    pub fn new(roms: &RomImages) -> Result<Self, InitError> {
        Self::with_config(roms, MachineConfig::default())
    }

    /// Headless instance: uncapped, speed 0, optional DIP override.
    pub fn new_headless(roms: &RomImages, dip_switches: Option<[u8; 3]>) -> Result<Self, InitError> {
        Self::with_config(roms, MachineConfig::headless(dip_switches))
    }

    pub fn with_config(roms: &RomImages, config: MachineConfig) -> Result<Self, InitError> {
        let program = INVADERS_PROGRAM_ROM.load_images(&[roms.h, roms.g, roms.f, roms.e])?;
        Self::build(program, config)
    }

    /// Build from a ROM set, accepting chips whose CRC32 does not match the
    /// original release. Such programs get no address map.
    pub fn from_rom_set(rom_set: &RomSet, config: MachineConfig) -> Result<Self, InitError> {
        let program = INVADERS_PROGRAM_ROM.load_skip_checksums(rom_set)?;
        Self::build(program, config)
    }

    /// Build from a ROM set, rejecting any chip with an unexpected CRC32.
    pub fn from_rom_set_strict(rom_set: &RomSet, config: MachineConfig) -> Result<Self, InitError> {
        let program = INVADERS_PROGRAM_ROM.load(rom_set)?;
        Self::build(program, config)
    }

    fn build(program: LoadedRegion, config: MachineConfig) -> Result<Self, InitError> {
        let mut memory = AddressSpace::new();
        let rom = memory.register_bank(ROM_BASE, ROM_SIZE, Some(program.data.as_slice()), true)?;
        rom[0] = ROM_PATCH_OPCODE;
        memory.register_bank(RAM_BASE, RAM_SIZE, None, false)?;

        let mut program_checksums = [0u32; 4];
        for (slot, crc) in program_checksums.iter_mut().zip(&program.checksums) {
            *slot = *crc;
        }

        let address_map = observation::lookup(&program_checksums).copied();
        match &address_map {
            Some(map) => log::info!("program ROM identified as '{}'", map.name),
            None => log::warn!(
                "unrecognised program ROM (CRC32 {:08X?}); observations unavailable",
                program_checksums
            ),
        }

        let mut cpu = I8080::new();
        cpu.reset(RESET_VECTOR);

        Ok(Self {
            cpu,
            board: InvadersBoard {
                memory,
                shifter: Mb14241::new(),
                input: INPUT_BIT_IDLE,
                dip_switches: config.dip_switches,
            },
            framebuffer: vec![PIXEL_BLACK; PIXEL_COUNT],
            frame_count: 0,
            cycle_count: 0,
            headless: config.headless,
            speed_multiplier: config.speed_multiplier,
            uncapped: config.uncapped,
            program_checksums,
            address_map,
        })
    }

    // -- Stepping -----------------------------------------------------------

    /// One video frame: burst, RST 1, burst, RST 2. Returns the cycles
    /// consumed by both bursts.
    pub fn step_frame(&mut self) -> u32 {
        let first = self.cpu.execute(&mut self.board, MASTER, HALF_FRAME_CYCLES);
        self.cpu.interrupt(&mut self.board, MASTER, MID_SCREEN_VECTOR);

        let second = self.cpu.execute(&mut self.board, MASTER, HALF_FRAME_CYCLES);
        self.cpu.interrupt(&mut self.board, MASTER, END_SCREEN_VECTOR);

        let total = first.saturating_add(second);
        self.frame_count += 1;
        self.cycle_count += total as u64;
        total
    }

    /// Run at least `cycles` cycles with no interrupt injection.
    ///
    /// An acknowledge left by the previous [`step_frame`](Self::step_frame)
    /// is charged first, so right after a frame a budget of 11 cycles or
    /// less returns 11 without executing an instruction.
    pub fn step_cycles(&mut self, cycles: u32) -> u32 {
        let consumed = self.cpu.execute(&mut self.board, MASTER, cycles);
        self.cycle_count += consumed as u64;
        consumed
    }

    // -- Input --------------------------------------------------------------

    /// Replace the port 1 latch. Undefined bits are dropped and bit 3 is
    /// forced high.
    pub fn set_input_bits(&mut self, buttons: u8) {
        self.board.input = (buttons & INPUT_DEFINED_MASK) | INPUT_BIT_IDLE;
    }

    pub fn input_bits(&self) -> u8 {
        self.board.input
    }

    // -- Video --------------------------------------------------------------

    /// Decode video RAM into the pixel buffer. Each byte holds 8 pixels,
    /// bit 0 first.
    pub fn update_framebuffer(&mut self) {
        let Some(ram) = self.board.memory.bank(RAM_BASE) else {
            return;
        };
        let vram_start = (VRAM_BASE - RAM_BASE) as usize;
        let vram = &ram.data()[vram_start..vram_start + VRAM_SIZE];

        for (pixels, &byte) in self.framebuffer.chunks_exact_mut(8).zip(vram) {
            for (bit, pixel) in pixels.iter_mut().enumerate() {
                *pixel = if byte & (1 << bit) != 0 {
                    PIXEL_WHITE
                } else {
                    PIXEL_BLACK
                };
            }
        }
    }

    /// The decoded pixels, 256×224 ARGB8888 in VRAM order. Reflects the
    /// last call to [`update_framebuffer`](Self::update_framebuffer).
    pub fn framebuffer(&self) -> &[u32] {
        &self.framebuffer
    }

    /// 255 for every lit pixel, 0 otherwise. Writes up to `out.len()` bytes.
    pub fn framebuffer_grayscale(&self, out: &mut [u8]) {
        for (dst, &px) in out.iter_mut().zip(&self.framebuffer) {
            *dst = if px & 0x00FF_FFFF != 0 { 255 } else { 0 };
        }
    }

    // -- Configuration ------------------------------------------------------

    /// Store the speed multiplier. A multiplier of 0 also means uncapped.
    pub fn set_speed(&mut self, multiplier: f32) {
        self.speed_multiplier = multiplier;
        if multiplier == 0.0 {
            self.uncapped = true;
        }
    }

    pub fn set_uncapped(&mut self, uncapped: bool) {
        self.uncapped = uncapped;
    }

    pub fn set_dip_switches(&mut self, dip_switches: [u8; 3]) {
        self.board.dip_switches = dip_switches;
    }

    pub fn config(&self) -> MachineConfig {
        MachineConfig {
            headless: self.headless,
            speed_multiplier: self.speed_multiplier,
            uncapped: self.uncapped,
            dip_switches: self.board.dip_switches,
        }
    }

    // -- Inspection ---------------------------------------------------------

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Read any address as the CPU would see it (unmapped reads 0x00).
    pub fn read_memory(&self, addr: u16) -> u8 {
        self.board.memory.read(addr)
    }

    /// Poke a byte through the normal write path (ROM stays protected).
    pub fn write_memory(&mut self, addr: u16, value: u8) {
        self.board.memory.write(addr, value);
    }

    pub fn cpu_state(&self) -> I8080State {
        self.cpu.snapshot()
    }

    pub fn is_halted(&self) -> bool {
        self.cpu.is_sleeping()
    }

    /// Shift register contents and offset.
    pub fn shifter(&self) -> &Mb14241 {
        &self.board.shifter
    }

    pub fn program_checksums(&self) -> [u32; 4] {
        self.program_checksums
    }

    // -- Observation --------------------------------------------------------

    pub fn address_map(&self) -> Option<&AddressMap> {
        self.address_map.as_ref()
    }

    /// Use `map` for observations regardless of the loaded program, or
    /// clear it with `None`.
    pub fn set_address_map(&mut self, map: Option<AddressMap>) {
        self.address_map = map;
    }

    pub fn observe(&self) -> Result<Observation<'_>, ObservationError> {
        match &self.address_map {
            Some(map) => Ok(Observation::new(self, map)),
            None => Err(ObservationError::UnknownRevision {
                checksums: self.program_checksums,
            }),
        }
    }

    // -- Save states --------------------------------------------------------

    pub fn capture_state(&self) -> SaveState {
        let shifter = &self.board.shifter;
        SaveState {
            cpu: self.cpu.snapshot(),
            shift_register: shifter.register(),
            shift_offset: shifter.offset(),
            input: self.board.input,
            dip_switches: self.board.dip_switches,
            frame_count: self.frame_count,
            cycle_count: self.cycle_count,
            headless: self.headless,
            speed_multiplier: self.speed_multiplier,
            uncapped: self.uncapped,
            framebuffer: self.framebuffer.clone(),
            ram: self
                .board
                .memory
                .bank(RAM_BASE)
                .map(|bank| bank.data().to_vec())
                .unwrap_or_else(|| vec![0; RAM_SIZE]),
        }
    }

    /// Replace the whole live state. Every section is length-checked before
    /// anything is written.
    pub fn restore_state(&mut self, state: &SaveState) -> Result<(), SaveStateError> {
        state.validate()?;

        self.cpu.restore(&state.cpu);
        self.board.shifter.restore(state.shift_register, state.shift_offset);
        self.board.input = state.input;
        self.board.dip_switches = state.dip_switches;
        self.frame_count = state.frame_count;
        self.cycle_count = state.cycle_count;
        self.headless = state.headless;
        self.speed_multiplier = state.speed_multiplier;
        self.uncapped = state.uncapped;
        self.framebuffer.copy_from_slice(&state.framebuffer);
        if let Some(ram) = self.board.memory.bank_mut(RAM_BASE) {
            ram.copy_from_slice(&state.ram);
        }
        Ok(())
    }

    pub fn save_state_bytes(&self) -> Vec<u8> {
        self.capture_state().to_bytes()
    }

    /// Decode `bytes` completely, then commit. On error nothing changes.
    pub fn load_state_bytes(&mut self, bytes: &[u8]) -> Result<(), SaveStateError> {
        let state = SaveState::from_bytes(bytes)?;
        self.restore_state(&state)
    }

    /// Write a save state atomically (temporary file, then rename).
    pub fn save_state(&self, path: impl AsRef<Path>) -> Result<(), SaveStateError> {
        let path = path.as_ref();
        match self.capture_state().write_to(path) {
            Ok(()) => {
                log::info!("saved state to {}", path.display());
                Ok(())
            }
            Err(e) => {
                log::warn!("saving state to {} failed: {e}", path.display());
                Err(e)
            }
        }
    }

    /// Load a save state. The file is fully decoded and validated before
    /// any live state is touched.
    pub fn load_state(&mut self, path: impl AsRef<Path>) -> Result<(), SaveStateError> {
        let path = path.as_ref();
        let result = SaveState::read_from(path).and_then(|state| self.restore_state(&state));
        match &result {
            Ok(()) => log::info!("loaded state from {}", path.display()),
            Err(e) => log::warn!("loading state from {} failed: {e}", path.display()),
        }
        result
    }
}

impl Machine for SpaceInvadersSystem {
    fn display_size(&self) -> (u32, u32) {
        (SCREEN_WIDTH, SCREEN_HEIGHT)
    }

    fn run_frame(&mut self) {
        self.step_frame();
    }

    fn render_frame(&self, buffer: &mut [u8]) {
        for (rgb, &px) in buffer.chunks_exact_mut(3).zip(&self.framebuffer) {
            rgb[0] = (px >> 16) as u8;
            rgb[1] = (px >> 8) as u8;
            rgb[2] = px as u8;
        }
    }

    fn set_input(&mut self, button: u8, pressed: bool) {
        let bit = match button {
            INPUT_COIN => INPUT_BIT_COIN,
            INPUT_P2_START => INPUT_BIT_P2_START,
            INPUT_P1_START => INPUT_BIT_P1_START,
            INPUT_P1_FIRE => INPUT_BIT_FIRE,
            INPUT_P1_LEFT => INPUT_BIT_LEFT,
            INPUT_P1_RIGHT => INPUT_BIT_RIGHT,
            _ => return,
        };
        // Active high
        let latch = if pressed {
            self.board.input | bit
        } else {
            self.board.input & !bit
        };
        self.set_input_bits(latch);
    }

    fn input_map(&self) -> &[InputButton] {
        INVADERS_INPUT_MAP
    }

    fn reset(&mut self) {
        self.cpu.reset(RESET_VECTOR);
        // The board comes out of reset with interrupts enabled.
        self.cpu.inte = true;

        self.board.shifter.reset();
        self.board.input = INPUT_BIT_IDLE;
        self.frame_count = 0;
        self.cycle_count = 0;
        if let Some(ram) = self.board.memory.bank_mut(RAM_BASE) {
            ram.fill(0);
        }
        self.framebuffer.fill(PIXEL_BLACK);
        // ROM, DIP switches and run configuration are kept.
        log::debug!("machine reset");
    }

    fn frame_rate_hz(&self) -> f64 {
        CPU_CLOCK_HZ as f64 / (2 * HALF_FRAME_CYCLES) as f64
    }
}
