#![allow(dead_code)]

use invaders_machines::space_invaders::{MachineConfig, ROM_SIZE, RomImages, SpaceInvadersSystem};

/// 8KB program image built from code fragments placed at fixed addresses.
pub struct TestProgram {
    pub image: Vec<u8>,
}

impl TestProgram {
    pub fn new() -> Self {
        Self {
            image: vec![0; ROM_SIZE],
        }
    }

    pub fn at(mut self, addr: u16, code: &[u8]) -> Self {
        let start = addr as usize;
        self.image[start..start + code.len()].copy_from_slice(code);
        self
    }

    pub fn images(&self) -> RomImages<'_> {
        RomImages {
            h: &self.image[0x0000..0x0800],
            g: &self.image[0x0800..0x1000],
            f: &self.image[0x1000..0x1800],
            e: &self.image[0x1800..0x2000],
        }
    }

    pub fn headless(&self) -> SpaceInvadersSystem {
        SpaceInvadersSystem::new_headless(&self.images(), None).unwrap()
    }

    pub fn with_config(&self, config: MachineConfig) -> SpaceInvadersSystem {
        SpaceInvadersSystem::with_config(&self.images(), config).unwrap()
    }

    /// The four chips as named ROM files.
    pub fn rom_files(&self) -> Vec<(&'static str, &[u8])> {
        let images = self.images();
        vec![
            ("invaders.h", images.h),
            ("invaders.g", images.g),
            ("invaders.f", images.f),
            ("invaders.e", images.e),
        ]
    }
}

/// Spins forever at 0x0001.
pub fn idle_program() -> TestProgram {
    TestProgram::new().at(0x0001, &[0xC3, 0x01, 0x00]) // JMP 0001
}

/// Enables interrupts and spins. RST 1 increments B, RST 2 increments C;
/// both handlers re-enable interrupts before returning.
pub fn interrupt_counter_program() -> TestProgram {
    TestProgram::new()
        .at(0x0001, &[0xC3, 0x40, 0x00]) // JMP 0040
        .at(0x0008, &[0x04, 0xFB, 0xC9]) // INR B; EI; RET
        .at(0x0010, &[0x0C, 0xFB, 0xC9]) // INR C; EI; RET
        .at(
            0x0040,
            &[
                0x31, 0x00, 0x24, // LXI SP,2400
                0xFB, // EI
                0xC3, 0x44, 0x00, // JMP 0044
            ],
        )
}
