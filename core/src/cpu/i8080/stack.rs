use crate::core::{Bus, BusMaster};
use crate::cpu::i8080::I8080;

impl I8080 {
    /// Push a word: high byte at SP-1, low byte at SP-2.
    pub(crate) fn push_word<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        val: u16,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.sp = self.sp.wrapping_sub(1);
        bus.write(master, self.sp, (val >> 8) as u8);
        self.sp = self.sp.wrapping_sub(1);
        bus.write(master, self.sp, val as u8);
    }

    pub(crate) fn pop_word<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u16 {
        let lo = bus.read(master, self.sp) as u16;
        self.sp = self.sp.wrapping_add(1);
        let hi = bus.read(master, self.sp) as u16;
        self.sp = self.sp.wrapping_add(1);
        (hi << 8) | lo
    }

    /// PUSH rp — 11. rp index 3 is PSW (A + flags), not SP.
    /// Opcode mask: 11 rr0 101
    pub(crate) fn op_push<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let rp = (opcode >> 4) & 0x03;
        let val = if rp == 3 { self.get_psw() } else { self.get_rp(rp) };
        self.push_word(val, bus, master);
        11
    }

    /// POP rp — 10. POP PSW normalizes the fixed flag bits.
    /// Opcode mask: 11 rr0 001
    pub(crate) fn op_pop<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let rp = (opcode >> 4) & 0x03;
        let val = self.pop_word(bus, master);
        if rp == 3 {
            self.set_psw(val);
        } else {
            self.set_rp(rp, val);
        }
        10
    }

    /// XTHL — 18: exchange HL with the word on top of the stack
    pub(crate) fn op_xthl<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let lo = bus.read(master, self.sp);
        let hi = bus.read(master, self.sp.wrapping_add(1));
        bus.write(master, self.sp, self.l);
        bus.write(master, self.sp.wrapping_add(1), self.h);
        self.l = lo;
        self.h = hi;
        18
    }

    /// SPHL — 5
    pub(crate) fn op_sphl(&mut self) -> u32 {
        self.sp = self.get_hl();
        5
    }
}
