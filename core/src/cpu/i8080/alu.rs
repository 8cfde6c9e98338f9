use crate::core::{Bus, BusMaster};
use crate::cpu::i8080::{Flag, I8080};

impl I8080 {
    // --- Flag Helpers ---

    fn get_parity(val: u8) -> bool {
        val.count_ones() % 2 == 0
    }

    /// Set S, Z and P from `result`; AC and CY are left alone.
    fn update_flags_szp(&mut self, result: u8) {
        self.set_flag(Flag::S, result & 0x80 != 0);
        self.set_flag(Flag::Z, result == 0);
        self.set_flag(Flag::P, Self::get_parity(result));
    }

    /// A + val + carry_in with full flag update. Returns the result without
    /// storing it so CMP can share the path.
    fn do_add(&mut self, val: u8, carry_in: bool) -> u8 {
        let a = self.a;
        let c_val = carry_in as u16;
        let result_u16 = a as u16 + val as u16 + c_val;
        let result = result_u16 as u8;

        self.update_flags_szp(result);
        self.set_flag(Flag::AC, (a & 0x0F) as u16 + (val & 0x0F) as u16 + c_val > 0x0F);
        self.set_flag(Flag::CY, result_u16 > 0xFF);
        result
    }

    /// A - val - borrow_in. The 8080 subtracts by adding the one's complement
    /// with inverted borrow: AC is the nibble carry of that addition and CY
    /// is its inverted carry.
    fn do_sub(&mut self, val: u8, borrow_in: bool) -> u8 {
        let result = self.do_add(!val, !borrow_in);
        let carry = self.flag(Flag::CY);
        self.set_flag(Flag::CY, !carry);
        result
    }

    fn perform_alu_op(&mut self, op: u8, val: u8) {
        match op {
            0 => self.a = self.do_add(val, false),                 // ADD
            1 => self.a = self.do_add(val, self.flag(Flag::CY)),   // ADC
            2 => self.a = self.do_sub(val, false),                 // SUB
            3 => self.a = self.do_sub(val, self.flag(Flag::CY)),   // SBB
            4 => {
                // ANA: AC reflects bit 3 of the OR of the operands
                let ac = (self.a | val) & 0x08 != 0;
                self.a &= val;
                self.update_flags_szp(self.a);
                self.set_flag(Flag::AC, ac);
                self.set_flag(Flag::CY, false);
            }
            5 => {
                // XRA
                self.a ^= val;
                self.update_flags_szp(self.a);
                self.set_flag(Flag::AC, false);
                self.set_flag(Flag::CY, false);
            }
            6 => {
                // ORA
                self.a |= val;
                self.update_flags_szp(self.a);
                self.set_flag(Flag::AC, false);
                self.set_flag(Flag::CY, false);
            }
            7 => {
                // CMP
                self.do_sub(val, false);
            }
            _ => unreachable!(),
        }
    }

    // --- Instructions ---

    /// ALU A, r — 4 (reg) or 7 (M)
    /// ADD, ADC, SUB, SBB, ANA, XRA, ORA, CMP
    /// Opcode mask: 10 xxx zzz
    pub(crate) fn op_alu_r<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let alu_op = (opcode >> 3) & 0x07;
        let r = opcode & 0x07;
        let val = self.read_operand(r, bus, master);
        self.perform_alu_op(alu_op, val);
        if r == 6 { 7 } else { 4 }
    }

    /// ALU A, n — 7
    /// Opcode mask: 11 xxx 110
    pub(crate) fn op_alu_n<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let alu_op = (opcode >> 3) & 0x07;
        let val = self.fetch_byte(bus, master);
        self.perform_alu_op(alu_op, val);
        7
    }

    /// INR r — 5 (reg) or 10 (M). CY is not affected.
    /// Opcode mask: 00 rrr 100
    pub(crate) fn op_inr<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let r = (opcode >> 3) & 0x07;
        let result = self.read_operand(r, bus, master).wrapping_add(1);
        self.update_flags_szp(result);
        self.set_flag(Flag::AC, result & 0x0F == 0x00);
        self.write_operand(r, result, bus, master);
        if r == 6 { 10 } else { 5 }
    }

    /// DCR r — 5 (reg) or 10 (M). CY is not affected.
    /// Opcode mask: 00 rrr 101
    pub(crate) fn op_dcr<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u32 {
        let r = (opcode >> 3) & 0x07;
        let result = self.read_operand(r, bus, master).wrapping_sub(1);
        self.update_flags_szp(result);
        self.set_flag(Flag::AC, result & 0x0F != 0x0F);
        self.write_operand(r, result, bus, master);
        if r == 6 { 10 } else { 5 }
    }

    /// INX rp — 5, no flags
    pub(crate) fn op_inx(&mut self, opcode: u8) -> u32 {
        let rp = (opcode >> 4) & 0x03;
        self.set_rp(rp, self.get_rp(rp).wrapping_add(1));
        5
    }

    /// DCX rp — 5, no flags
    pub(crate) fn op_dcx(&mut self, opcode: u8) -> u32 {
        let rp = (opcode >> 4) & 0x03;
        self.set_rp(rp, self.get_rp(rp).wrapping_sub(1));
        5
    }

    /// DAD rp — 10. Only CY is affected.
    pub(crate) fn op_dad(&mut self, opcode: u8) -> u32 {
        let rp = (opcode >> 4) & 0x03;
        let result = self.get_hl() as u32 + self.get_rp(rp) as u32;
        self.set_flag(Flag::CY, result > 0xFFFF);
        self.set_hl(result as u16);
        10
    }

    /// RLC — 4. CY = old bit 7, rotated into bit 0.
    pub(crate) fn op_rlc(&mut self) -> u32 {
        let carry = self.a & 0x80 != 0;
        self.a = self.a.rotate_left(1);
        self.set_flag(Flag::CY, carry);
        4
    }

    /// RRC — 4. CY = old bit 0, rotated into bit 7.
    pub(crate) fn op_rrc(&mut self) -> u32 {
        let carry = self.a & 0x01 != 0;
        self.a = self.a.rotate_right(1);
        self.set_flag(Flag::CY, carry);
        4
    }

    /// RAL — 4. Rotate left through carry.
    pub(crate) fn op_ral(&mut self) -> u32 {
        let carry = self.a & 0x80 != 0;
        self.a = (self.a << 1) | self.flag(Flag::CY) as u8;
        self.set_flag(Flag::CY, carry);
        4
    }

    /// RAR — 4. Rotate right through carry.
    pub(crate) fn op_rar(&mut self) -> u32 {
        let carry = self.a & 0x01 != 0;
        self.a = (self.a >> 1) | ((self.flag(Flag::CY) as u8) << 7);
        self.set_flag(Flag::CY, carry);
        4
    }

    /// DAA — 4. Decimal-adjust A after a BCD addition.
    pub(crate) fn op_daa(&mut self) -> u32 {
        let lsb = self.a & 0x0F;
        let msb = self.a >> 4;
        let mut carry = self.flag(Flag::CY);
        let mut correction = 0u8;

        if self.flag(Flag::AC) || lsb > 9 {
            correction |= 0x06;
        }
        if carry || msb > 9 || (msb >= 9 && lsb > 9) {
            correction |= 0x60;
            carry = true;
        }

        self.a = self.do_add(correction, false);
        self.set_flag(Flag::CY, carry);
        4
    }

    /// CMA — 4, no flags
    pub(crate) fn op_cma(&mut self) -> u32 {
        self.a = !self.a;
        4
    }

    /// STC — 4
    pub(crate) fn op_stc(&mut self) -> u32 {
        self.set_flag(Flag::CY, true);
        4
    }

    /// CMC — 4
    pub(crate) fn op_cmc(&mut self) -> u32 {
        let carry = self.flag(Flag::CY);
        self.set_flag(Flag::CY, !carry);
        4
    }
}
