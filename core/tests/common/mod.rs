#![allow(dead_code)]

use invaders_core::core::{Bus, BusMaster};

/// Minimal bus for testing: flat 64KB read/write memory plus a 256-entry
/// I/O port file. Port writes are recorded in order.
pub struct TestBus {
    pub memory: [u8; 0x10000],
    pub ports_in: [u8; 256],
    pub port_writes: Vec<(u16, u8)>,
    pub port_reads: Vec<u16>,
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            memory: [0; 0x10000],
            ports_in: [0; 256],
            port_writes: Vec::new(),
            port_reads: Vec::new(),
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }
}

impl Bus for TestBus {
    type Address = u16;
    type Data = u8;

    fn read(&mut self, _master: BusMaster, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    fn write(&mut self, _master: BusMaster, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
    }

    fn io_read(&mut self, _master: BusMaster, addr: u16) -> u8 {
        self.port_reads.push(addr);
        self.ports_in[(addr & 0xFF) as usize]
    }

    fn io_write(&mut self, _master: BusMaster, addr: u16, data: u8) {
        self.port_writes.push((addr, data));
    }
}

pub const MASTER: BusMaster = BusMaster::Cpu(0);
