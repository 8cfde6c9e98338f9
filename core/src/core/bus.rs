/// Identifies who is accessing the bus.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BusMaster {
    Cpu(usize), // CPU 0, CPU 1, etc.
}

/// Generic bus interface between a CPU and the board it sits on.
pub trait Bus {
    type Address: Copy + Into<u64>; // u16 for 8-bit
    type Data; // u8

    fn read(&mut self, master: BusMaster, addr: Self::Address) -> Self::Data;
    fn write(&mut self, master: BusMaster, addr: Self::Address, data: Self::Data);

    /// Read from the I/O port address space (separate from memory on the 8080).
    /// Default maps to memory read; override for boards with port-mapped devices.
    fn io_read(&mut self, master: BusMaster, addr: Self::Address) -> Self::Data {
        self.read(master, addr)
    }

    /// Write to the I/O port address space (separate from memory on the 8080).
    /// Default maps to memory write; override for boards with port-mapped devices.
    fn io_write(&mut self, master: BusMaster, addr: Self::Address, data: Self::Data) {
        self.write(master, addr, data)
    }
}
