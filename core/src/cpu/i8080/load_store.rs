use crate::core::{Bus, BusMaster};
use crate::cpu::i8080::I8080;

impl I8080 {
    /// MOV r1, r2 — 5 (reg to reg) or 7 (either side M)
    /// Opcode mask: 01 ddd sss (01 110 110 is HLT, decoded earlier)
    pub(crate) fn op_mov<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let dst = (opcode >> 3) & 0x07;
        let src = opcode & 0x07;
        let val = self.read_operand(src, bus, master);
        self.write_operand(dst, val, bus, master);
        if dst == 6 || src == 6 { 7 } else { 5 }
    }

    /// MVI r, n — 7 (reg) or 10 (M)
    /// Opcode mask: 00 ddd 110
    pub(crate) fn op_mvi<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let dst = (opcode >> 3) & 0x07;
        let val = self.fetch_byte(bus, master);
        self.write_operand(dst, val, bus, master);
        if dst == 6 { 10 } else { 7 }
    }

    /// LXI rp, nn — 10
    /// Opcode mask: 00 rr0 001
    pub(crate) fn op_lxi<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let rp = (opcode >> 4) & 0x03;
        let val = self.fetch_word(bus, master);
        self.set_rp(rp, val);
        10
    }

    /// STAX B (0x02) / STAX D (0x12) — 7
    pub(crate) fn op_stax<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let addr = if opcode == 0x02 { self.get_bc() } else { self.get_de() };
        bus.write(master, addr, self.a);
        7
    }

    /// LDAX B (0x0A) / LDAX D (0x1A) — 7
    pub(crate) fn op_ldax<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let addr = if opcode == 0x0A { self.get_bc() } else { self.get_de() };
        self.a = bus.read(master, addr);
        7
    }

    /// SHLD nn — 16: (nn) = L, (nn+1) = H
    pub(crate) fn op_shld<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let addr = self.fetch_word(bus, master);
        bus.write(master, addr, self.l);
        bus.write(master, addr.wrapping_add(1), self.h);
        16
    }

    /// LHLD nn — 16: L = (nn), H = (nn+1)
    pub(crate) fn op_lhld<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let addr = self.fetch_word(bus, master);
        self.l = bus.read(master, addr);
        self.h = bus.read(master, addr.wrapping_add(1));
        16
    }

    /// STA nn — 13
    pub(crate) fn op_sta<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let addr = self.fetch_word(bus, master);
        bus.write(master, addr, self.a);
        13
    }

    /// LDA nn — 13
    pub(crate) fn op_lda<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let addr = self.fetch_word(bus, master);
        self.a = bus.read(master, addr);
        13
    }

    /// XCHG — 4: swap HL and DE
    pub(crate) fn op_xchg(&mut self) -> u32 {
        std::mem::swap(&mut self.h, &mut self.d);
        std::mem::swap(&mut self.l, &mut self.e);
        4
    }

    /// IN n — 10. The port number appears on both halves of the address bus.
    pub(crate) fn op_in<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let port = self.fetch_byte(bus, master) as u16;
        self.a = bus.io_read(master, (port << 8) | port);
        10
    }

    /// OUT n — 10
    pub(crate) fn op_out<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let port = self.fetch_byte(bus, master) as u16;
        bus.io_write(master, (port << 8) | port, self.a);
        10
    }
}
