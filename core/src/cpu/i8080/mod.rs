mod alu;
mod branch;
mod load_store;
mod stack;

use crate::core::{Bus, BusMaster};
use crate::cpu::{
    Cpu,
    state::{CpuStateTrait, I8080State},
};

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum Flag {
    CY = 0x01, // Carry
    P = 0x04,  // Parity (even)
    AC = 0x10, // Auxiliary carry (out of bit 3)
    Z = 0x40,  // Zero
    S = 0x80,  // Sign
}

/// Bits of F that hold real flags; bit 1 always reads 1, bits 3 and 5 read 0.
const FLAG_MASK: u8 = 0xD5;
const FLAG_FIXED: u8 = 0x02;

/// Cost of acknowledging an interrupt (the injected RST instruction).
pub const INTERRUPT_CYCLES: u32 = 11;

/// Intel 8080 at whole-instruction granularity.
///
/// Each call to [`step`](Self::step) fetches, decodes and executes one full
/// instruction and returns its cycle cost (datasheet T-states, taken/not-taken
/// for conditional calls and returns). There is no sub-instruction timing.
pub struct I8080 {
    // Registers
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,

    // Internal state
    pub inte: bool,
    pub halted: bool,
    pub(crate) pending_cycles: u32,
}

impl Default for I8080 {
    fn default() -> Self {
        Self::new()
    }
}

impl I8080 {
    pub fn new() -> Self {
        Self {
            a: 0,
            f: FLAG_FIXED,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            sp: 0,
            pc: 0,
            inte: false,
            halted: false,
            pending_cycles: 0,
        }
    }

    // Helpers for 16-bit register access
    pub fn get_bc(&self) -> u16 { ((self.b as u16) << 8) | self.c as u16 }
    pub fn set_bc(&mut self, val: u16) { self.b = (val >> 8) as u8; self.c = val as u8; }

    pub fn get_de(&self) -> u16 { ((self.d as u16) << 8) | self.e as u16 }
    pub fn set_de(&mut self, val: u16) { self.d = (val >> 8) as u8; self.e = val as u8; }

    pub fn get_hl(&self) -> u16 { ((self.h as u16) << 8) | self.l as u16 }
    pub fn set_hl(&mut self, val: u16) { self.h = (val >> 8) as u8; self.l = val as u8; }

    /// Processor status word as pushed by PUSH PSW.
    pub fn get_psw(&self) -> u16 { ((self.a as u16) << 8) | self.f as u16 }
    pub fn set_psw(&mut self, val: u16) {
        self.a = (val >> 8) as u8;
        self.f = (val as u8 & FLAG_MASK) | FLAG_FIXED;
    }

    pub fn flag(&self, flag: Flag) -> bool {
        self.f & flag as u8 != 0
    }

    pub(crate) fn set_flag(&mut self, flag: Flag, on: bool) {
        if on {
            self.f |= flag as u8;
        } else {
            self.f &= !(flag as u8);
        }
    }

    pub fn get_reg8(&self, index: u8) -> u8 {
        match index {
            0 => self.b,
            1 => self.c,
            2 => self.d,
            3 => self.e,
            4 => self.h,
            5 => self.l,
            7 => self.a,
            _ => unreachable!("get_reg8 called with index {}", index),
        }
    }

    pub fn set_reg8(&mut self, index: u8, val: u8) {
        match index {
            0 => self.b = val,
            1 => self.c = val,
            2 => self.d = val,
            3 => self.e = val,
            4 => self.h = val,
            5 => self.l = val,
            7 => self.a = val,
            _ => unreachable!("set_reg8 called with index {}", index),
        }
    }

    /// Get 16-bit register pair by index (0=BC, 1=DE, 2=HL, 3=SP).
    pub(crate) fn get_rp(&self, index: u8) -> u16 {
        match index {
            0 => self.get_bc(),
            1 => self.get_de(),
            2 => self.get_hl(),
            3 => self.sp,
            _ => unreachable!("get_rp called with index {}", index),
        }
    }

    /// Set 16-bit register pair by index (0=BC, 1=DE, 2=HL, 3=SP).
    pub(crate) fn set_rp(&mut self, index: u8, val: u16) {
        match index {
            0 => self.set_bc(val),
            1 => self.set_de(val),
            2 => self.set_hl(val),
            3 => self.sp = val,
            _ => unreachable!("set_rp called with index {}", index),
        }
    }

    pub(crate) fn fetch_byte<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u8 {
        let val = bus.read(master, self.pc);
        self.pc = self.pc.wrapping_add(1);
        val
    }

    pub(crate) fn fetch_word<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u16 {
        let lo = self.fetch_byte(bus, master) as u16;
        let hi = self.fetch_byte(bus, master) as u16;
        (hi << 8) | lo
    }

    /// Read register operand `index`, where 6 means memory at (HL).
    pub(crate) fn read_operand<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        index: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u8 {
        if index == 6 {
            bus.read(master, self.get_hl())
        } else {
            self.get_reg8(index)
        }
    }

    /// Write register operand `index`, where 6 means memory at (HL).
    pub(crate) fn write_operand<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        index: u8,
        val: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        if index == 6 {
            bus.write(master, self.get_hl(), val);
        } else {
            self.set_reg8(index, val);
        }
    }

    /// Condition code test for Jcc/Ccc/Rcc (bits 5-3 of the opcode).
    /// 0=NZ, 1=Z, 2=NC, 3=C, 4=PO, 5=PE, 6=P, 7=M
    pub(crate) fn condition(&self, cc: u8) -> bool {
        match cc {
            0 => !self.flag(Flag::Z),
            1 => self.flag(Flag::Z),
            2 => !self.flag(Flag::CY),
            3 => self.flag(Flag::CY),
            4 => !self.flag(Flag::P),
            5 => self.flag(Flag::P),
            6 => !self.flag(Flag::S),
            7 => self.flag(Flag::S),
            _ => unreachable!("condition called with cc {}", cc),
        }
    }

    /// Execute exactly one instruction and return its cycle cost.
    /// A halted CPU executes nothing and returns 0.
    pub fn step<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        if self.halted {
            return 0;
        }
        let opcode = self.fetch_byte(bus, master);
        self.execute_instruction(opcode, bus, master)
    }

    fn execute_instruction<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        match opcode {
            // NOP and its undocumented aliases — 4
            0x00 | 0x08 | 0x10 | 0x18 | 0x20 | 0x28 | 0x30 | 0x38 => 4,

            // HLT sits in the middle of the MOV block (MOV M,M) — 7
            0x76 => self.op_hlt(),

            // --- Data transfer ---
            op if (op & 0xC0) == 0x40 => self.op_mov(op, bus, master), // MOV r,r — 5/7
            op if (op & 0xC7) == 0x06 => self.op_mvi(op, bus, master), // MVI r,n — 7/10
            op if (op & 0xCF) == 0x01 => self.op_lxi(op, bus, master), // LXI rp,nn — 10
            0x02 | 0x12 => self.op_stax(opcode, bus, master),          // STAX B/D — 7
            0x0A | 0x1A => self.op_ldax(opcode, bus, master),          // LDAX B/D — 7
            0x22 => self.op_shld(bus, master),                         // SHLD nn — 16
            0x2A => self.op_lhld(bus, master),                         // LHLD nn — 16
            0x32 => self.op_sta(bus, master),                          // STA nn — 13
            0x3A => self.op_lda(bus, master),                          // LDA nn — 13
            0xEB => self.op_xchg(),                                    // XCHG — 4
            0xDB => self.op_in(bus, master),                           // IN n — 10
            0xD3 => self.op_out(bus, master),                          // OUT n — 10

            // --- Arithmetic and logic ---
            op if (op & 0xC0) == 0x80 => self.op_alu_r(op, bus, master), // ALU r — 4/7
            op if (op & 0xC7) == 0xC6 => self.op_alu_n(op, bus, master), // ALU n — 7
            op if (op & 0xC7) == 0x04 => self.op_inr(op, bus, master),   // INR r — 5/10
            op if (op & 0xC7) == 0x05 => self.op_dcr(op, bus, master),   // DCR r — 5/10
            op if (op & 0xCF) == 0x03 => self.op_inx(op),                // INX rp — 5
            op if (op & 0xCF) == 0x0B => self.op_dcx(op),                // DCX rp — 5
            op if (op & 0xCF) == 0x09 => self.op_dad(op),                // DAD rp — 10
            0x07 => self.op_rlc(),                                       // RLC — 4
            0x0F => self.op_rrc(),                                       // RRC — 4
            0x17 => self.op_ral(),                                       // RAL — 4
            0x1F => self.op_rar(),                                       // RAR — 4
            0x27 => self.op_daa(),                                       // DAA — 4
            0x2F => self.op_cma(),                                       // CMA — 4
            0x37 => self.op_stc(),                                       // STC — 4
            0x3F => self.op_cmc(),                                       // CMC — 4

            // --- Branch ---
            0xC3 | 0xCB => self.op_jmp(bus, master),                  // JMP nn — 10
            op if (op & 0xC7) == 0xC2 => self.op_jcc(op, bus, master), // Jcc nn — 10
            0xCD | 0xDD | 0xED | 0xFD => self.op_call(bus, master),    // CALL nn — 17
            op if (op & 0xC7) == 0xC4 => self.op_ccc(op, bus, master), // Ccc nn — 17/11
            0xC9 | 0xD9 => self.op_ret(bus, master),                   // RET — 10
            op if (op & 0xC7) == 0xC0 => self.op_rcc(op, bus, master), // Rcc — 11/5
            op if (op & 0xC7) == 0xC7 => self.op_rst(op, bus, master), // RST p — 11
            0xE9 => self.op_pchl(),                                    // PCHL — 5

            // --- Stack and machine control ---
            op if (op & 0xCF) == 0xC5 => self.op_push(op, bus, master), // PUSH rp — 11
            op if (op & 0xCF) == 0xC1 => self.op_pop(op, bus, master),  // POP rp — 10
            0xE3 => self.op_xthl(bus, master),                          // XTHL — 18
            0xF9 => self.op_sphl(),                                     // SPHL — 5
            0xF3 => self.op_di(),                                       // DI — 4
            0xFB => self.op_ei(),                                       // EI — 4

            _ => unreachable!("opcode 0x{:02X} not decoded", opcode),
        }
    }

    fn op_hlt(&mut self) -> u32 {
        self.halted = true;
        7
    }

    fn op_di(&mut self) -> u32 {
        self.inte = false;
        4
    }

    /// EI takes effect immediately; the one-instruction delay of the real
    /// part is below the granularity of this core.
    fn op_ei(&mut self) -> u32 {
        self.inte = true;
        4
    }
}

impl Cpu for I8080 {
    type Bus = dyn Bus<Address = u16, Data = u8>;

    fn reset(&mut self, vector: u16) {
        *self = Self::new();
        self.pc = vector;
    }

    fn execute(&mut self, bus: &mut Self::Bus, master: BusMaster, budget: u32) -> u32 {
        if self.halted {
            // Idle: time still passes so cycle accounting keeps moving.
            self.pending_cycles = 0;
            return budget;
        }
        let mut consumed = std::mem::take(&mut self.pending_cycles);
        while consumed < budget && !self.halted {
            consumed = consumed.saturating_add(self.step(bus, master));
        }
        consumed
    }

    fn interrupt(&mut self, bus: &mut Self::Bus, master: BusMaster, vector: u16) -> bool {
        if !self.inte {
            return false;
        }
        self.push_word(self.pc, bus, master);
        self.inte = false;
        self.halted = false;
        self.pc = vector;
        self.pending_cycles = self.pending_cycles.saturating_add(INTERRUPT_CYCLES);
        true
    }

    fn is_sleeping(&self) -> bool {
        self.halted
    }
}

impl CpuStateTrait for I8080 {
    type Snapshot = I8080State;

    fn snapshot(&self) -> I8080State {
        I8080State {
            a: self.a,
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            h: self.h,
            l: self.l,
            f: self.f,
            sp: self.sp,
            pc: self.pc,
            inte: self.inte,
            halted: self.halted,
            pending_cycles: self.pending_cycles,
        }
    }

    fn restore(&mut self, state: &I8080State) {
        self.a = state.a;
        self.b = state.b;
        self.c = state.c;
        self.d = state.d;
        self.e = state.e;
        self.h = state.h;
        self.l = state.l;
        self.f = (state.f & FLAG_MASK) | FLAG_FIXED;
        self.sp = state.sp;
        self.pc = state.pc;
        self.inte = state.inte;
        self.halted = state.halted;
        self.pending_cycles = state.pending_cycles;
    }
}
