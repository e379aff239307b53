//! The `CB`-prefixed family: rotate/shift, BIT, RES, SET — including the
//! indexed `DDCB`/`FDCB` forms and their register copy-back quirk.

use crate::core::Core;
use crate::cpu::registers::{Flag, Registers};
use crate::pacer::Clock;

impl<C: Clock> Core<C> {
    fn rotate_shift_flags(&mut self, result: u8, carry_out: bool) {
        let mut f = 0u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if result & 0x80 != 0 {
            f |= Flag::S as u8;
        }
        if Registers::get_parity(result) {
            f |= Flag::PV as u8;
        }
        if carry_out {
            f |= Flag::C as u8;
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.regs.f = f;
        self.regs.q = self.regs.f;
    }

    /// The eight CB rotate/shift operations, selected by the 3-bit field in
    /// `00 xxx rrr`. `6` (SLL) is undocumented but real hardware implements
    /// it identically to SLA except it shifts in a 1, not a 0.
    pub(super) fn do_cb_rotate_shift(&mut self, op: u8, val: u8) -> u8 {
        let carry_in = self.regs.f & Flag::C as u8 != 0;
        let (result, carry_out) = match op {
            0 => (val.rotate_left(1), val & 0x80 != 0), // RLC
            1 => (val.rotate_right(1), val & 0x01 != 0), // RRC
            2 => ((val << 1) | carry_in as u8, val & 0x80 != 0), // RL
            3 => ((val >> 1) | ((carry_in as u8) << 7), val & 0x01 != 0), // RR
            4 => (val << 1, val & 0x80 != 0), // SLA
            5 => ((val >> 1) | (val & 0x80), val & 0x01 != 0), // SRA
            6 => ((val << 1) | 1, val & 0x80 != 0), // SLL (undocumented)
            7 => (val >> 1, val & 0x01 != 0), // SRL
            _ => unreachable!("rotate/shift field is 3 bits"),
        };
        self.rotate_shift_flags(result, carry_out);
        result
    }

    fn bit_flags(&mut self, bit: u8, val: u8, operand_for_xy: u8) {
        let set = val & (1 << bit) != 0;
        let mut f = self.regs.f & Flag::C as u8;
        f |= Flag::H as u8;
        if !set {
            f |= Flag::Z as u8 | Flag::PV as u8;
        }
        if bit == 7 && set {
            f |= Flag::S as u8;
        }
        // Undocumented: X/Y come from the tested value for register/(HL)
        // forms, but from MEMPTR's high byte for the indexed forms.
        f |= operand_for_xy & (Flag::X as u8 | Flag::Y as u8);
        self.regs.f = f;
        self.regs.q = self.regs.f;
    }

    /// BIT b,r / BIT b,(HL). `src` is the decoder's 3-bit register field.
    pub(super) fn op_bit_reg(&mut self, bit: u8, src: u8) {
        let val = if src == 6 {
            let addr = self.regs.get_hl();
            self.memory.read(addr)
        } else {
            self.regs.get_reg8(src)
        };
        self.bit_flags(bit, val, val);
    }

    /// BIT b,(IX+d) / BIT b,(IY+d): X/Y leak from MEMPTR's high byte.
    pub(super) fn op_bit_indexed(&mut self, bit: u8, addr: u16) {
        let val = self.memory.read(addr);
        let xy_source = (self.regs.memptr >> 8) as u8;
        self.bit_flags(bit, val, xy_source);
    }

    pub(super) fn op_res_reg(&mut self, bit: u8, src: u8) {
        if src == 6 {
            let addr = self.regs.get_hl();
            let val = self.memory.read(addr) & !(1 << bit);
            self.memory.write(addr, val);
        } else {
            let val = self.regs.get_reg8(src) & !(1 << bit);
            self.regs.set_reg8(src, val);
        }
    }

    pub(super) fn op_set_reg(&mut self, bit: u8, src: u8) {
        if src == 6 {
            let addr = self.regs.get_hl();
            let val = self.memory.read(addr) | (1 << bit);
            self.memory.write(addr, val);
        } else {
            let val = self.regs.get_reg8(src) | (1 << bit);
            self.regs.set_reg8(src, val);
        }
    }

    /// DDCB/FDCB RES/SET at `addr`, copying the result back into register
    /// `dst` (7 means "no copy-back", matching the real decode where bits
    /// 0-7 of the second opcode byte select the copy-back target and 6
    /// alone writes only to memory).
    pub(super) fn op_reswrite_indexed(&mut self, addr: u16, bit: u8, set: bool, dst: u8) {
        let mut val = self.memory.read(addr);
        if set {
            val |= 1 << bit;
        } else {
            val &= !(1 << bit);
        }
        self.memory.write(addr, val);
        if dst != 6 {
            self.regs.set_reg8(dst, val);
        }
    }

    /// DDCB/FDCB rotate/shift at `addr`, copying the result back into
    /// register `dst` unless `dst == 6`.
    pub(super) fn op_rotate_indexed(&mut self, addr: u16, op: u8, dst: u8) {
        let val = self.memory.read(addr);
        let result = self.do_cb_rotate_shift(op, val);
        self.memory.write(addr, result);
        if dst != 6 {
            self.regs.set_reg8(dst, result);
        }
    }
}
