use crate::core::{Bus, BusMaster};
use crate::cpu::i8080::I8080;

impl I8080 {
    /// JMP nn — 10
    pub(crate) fn op_jmp<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        self.pc = self.fetch_word(bus, master);
        10
    }

    /// Jcc nn — 10 whether or not the jump is taken
    /// Opcode mask: 11 ccc 010
    pub(crate) fn op_jcc<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let target = self.fetch_word(bus, master);
        if self.condition((opcode >> 3) & 0x07) {
            self.pc = target;
        }
        10
    }

    /// CALL nn — 17
    pub(crate) fn op_call<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let target = self.fetch_word(bus, master);
        self.push_word(self.pc, bus, master);
        self.pc = target;
        17
    }

    /// Ccc nn — 17 taken, 11 not taken
    /// Opcode mask: 11 ccc 100
    pub(crate) fn op_ccc<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let target = self.fetch_word(bus, master);
        if self.condition((opcode >> 3) & 0x07) {
            self.push_word(self.pc, bus, master);
            self.pc = target;
            17
        } else {
            11
        }
    }

    /// RET — 10
    pub(crate) fn op_ret<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        self.pc = self.pop_word(bus, master);
        10
    }

    /// Rcc — 11 taken, 5 not taken
    /// Opcode mask: 11 ccc 000
    pub(crate) fn op_rcc<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        if self.condition((opcode >> 3) & 0x07) {
            self.pc = self.pop_word(bus, master);
            11
        } else {
            5
        }
    }

    /// RST p — 11: call to p * 8
    /// Opcode mask: 11 ppp 111
    pub(crate) fn op_rst<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        self.push_word(self.pc, bus, master);
        self.pc = (opcode & 0x38) as u16;
        11
    }

    /// PCHL — 5
    pub(crate) fn op_pchl(&mut self) -> u32 {
        self.pc = self.get_hl();
        5
    }
}
