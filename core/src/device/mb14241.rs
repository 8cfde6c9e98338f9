/// Fujitsu MB14241 barrel shifter
///
/// A 16-bit register fed one byte at a time: each data write pushes the new
/// byte into the high half and slides the previous high byte down into the
/// low half. The result port returns an 8-bit window of that register
/// selected by a 3-bit offset, which lets the CPU shift sprite rows by any
/// pixel amount without doing it in software.
///
/// On the Taito 8080 boards the offset, data and result appear on ports 2, 4
/// and 3 respectively; the port decoding itself belongs to the board.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mb14241 {
    register: u16,
    offset: u8,
}

impl Mb14241 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a byte into the high half of the register.
    pub fn write_data(&mut self, value: u8) {
        self.register = (self.register >> 8) | ((value as u16) << 8);
    }

    /// Latch the shift amount. Only the low three bits are kept.
    pub fn set_offset(&mut self, value: u8) {
        self.offset = value & 0x07;
    }

    /// Byte window starting `offset` bits below the top of the register.
    pub fn read_result(&self) -> u8 {
        ((self.register << self.offset) >> 8) as u8
    }

    pub fn register(&self) -> u16 {
        self.register
    }

    pub fn offset(&self) -> u8 {
        self.offset
    }

    /// Restore raw register contents (save-state load). The offset is masked
    /// the same way a port write would mask it.
    pub fn restore(&mut self, register: u16, offset: u8) {
        self.register = register;
        self.offset = offset & 0x07;
    }

    pub fn reset(&mut self) {
        self.register = 0;
        self.offset = 0;
    }
}
