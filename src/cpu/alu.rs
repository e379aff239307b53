//! Pure 8/16-bit arithmetic and the flag computations that go with it.
//!
//! Every function here takes and returns plain values and touches no bus —
//! the decoder (`cpu::decode`) is the only place that reads an operand from
//! memory or writes a result back.

use super::registers::{Flag, Registers};

impl Registers {
    fn update_flags_logic(&mut self, result: u8, is_and: bool) {
        let mut f = 0u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if Self::get_parity(result) {
            f |= Flag::PV as u8;
        }
        if is_and {
            f |= Flag::H as u8;
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.q = self.f;
    }

    /// ADD/ADC A, val. Carries are computed on widened `u16` operands so the
    /// half-carry and carry checks never depend on signed wraparound.
    pub(super) fn do_add(&mut self, val: u8, carry_in: bool) {
        let a = self.a;
        let c_val: u16 = if carry_in && (self.f & Flag::C as u8) != 0 {
            1
        } else {
            0
        };
        let result16 = a as u16 + val as u16 + c_val;
        let result = result16 as u8;

        let mut f = 0u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if (a & 0x0F) + (val & 0x0F) + c_val as u8 > 0x0F {
            f |= Flag::H as u8;
        }
        if (a ^ result) & (val ^ result) & 0x80 != 0 {
            f |= Flag::PV as u8;
        }
        if result16 > 0xFF {
            f |= Flag::C as u8;
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);

        self.a = result;
        self.f = f;
        self.q = self.f;
    }

    /// SUB/SBC A, val. Borrow is computed on widened operands, not by
    /// reinterpreting a wrapped `u8` as signed.
    pub(super) fn do_sub(&mut self, val: u8, carry_in: bool) {
        let a = self.a;
        let c_val: u16 = if carry_in && (self.f & Flag::C as u8) != 0 {
            1
        } else {
            0
        };
        let full = a as i16 - val as i16 - c_val as i16;
        let result = full as u8;

        let mut f = Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if (a & 0x0F) as i16 - (val & 0x0F) as i16 - c_val as i16 < 0 {
            f |= Flag::H as u8;
        }
        if (a ^ val) & (a ^ result) & 0x80 != 0 {
            f |= Flag::PV as u8;
        }
        if full < 0 {
            f |= Flag::C as u8;
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);

        self.a = result;
        self.f = f;
        self.q = self.f;
    }

    /// CP val: SUB's flags without writing the result back to `A`. X/Y come
    /// from the result, matching SUB, not from the operand.
    pub(super) fn do_cp(&mut self, val: u8) {
        let a = self.a;
        let full = a as i16 - val as i16;
        let result = full as u8;

        let mut f = Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if (a & 0x0F) as i16 - (val & 0x0F) as i16 < 0 {
            f |= Flag::H as u8;
        }
        if (a ^ val) & (a ^ result) & 0x80 != 0 {
            f |= Flag::PV as u8;
        }
        if full < 0 {
            f |= Flag::C as u8;
        }
        // Undocumented: X/Y for CP come from the operand, not the result.
        f |= val & (Flag::X as u8 | Flag::Y as u8);

        self.f = f;
        self.q = self.f;
    }

    pub(super) fn perform_alu_op(&mut self, op: u8, val: u8) {
        match op {
            0 => self.do_add(val, false),
            1 => self.do_add(val, true),
            2 => self.do_sub(val, false),
            3 => self.do_sub(val, true),
            4 => {
                self.a &= val;
                self.update_flags_logic(self.a, true);
            }
            5 => {
                self.a ^= val;
                self.update_flags_logic(self.a, false);
            }
            6 => {
                self.a |= val;
                self.update_flags_logic(self.a, false);
            }
            7 => self.do_cp(val),
            _ => unreachable!("ALU op field is 3 bits"),
        }
    }

    pub(super) fn calc_inc_flags(&mut self, val: u8) -> u8 {
        let result = val.wrapping_add(1);
        let mut f = self.f & Flag::C as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if (val & 0x0F) == 0x0F {
            f |= Flag::H as u8;
        }
        if val == 0x7F {
            f |= Flag::PV as u8;
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.q = self.f;
        result
    }

    pub(super) fn calc_dec_flags(&mut self, val: u8) -> u8 {
        let result = val.wrapping_sub(1);
        let mut f = (self.f & Flag::C as u8) | Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if (val & 0x0F) == 0x00 {
            f |= Flag::H as u8;
        }
        if val == 0x80 {
            f |= Flag::PV as u8;
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.q = self.f;
        result
    }

    /// ADD HL,ss (and ADD IX,pp / ADD IY,pp under a prefix): 16-bit add with
    /// no Z/S/PV change, matching real hardware.
    pub(super) fn do_add16(&mut self, lhs: u16, rhs: u16) -> u16 {
        let result32 = lhs as u32 + rhs as u32;
        let result = result32 as u16;

        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        if (lhs & 0x0FFF) + (rhs & 0x0FFF) > 0x0FFF {
            f |= Flag::H as u8;
        }
        if result32 > 0xFFFF {
            f |= Flag::C as u8;
        }
        f |= ((result >> 8) as u8) & (Flag::X as u8 | Flag::Y as u8);

        self.f = f;
        self.q = self.f;
        result
    }

    /// ADC HL,ss / SBC HL,ss: full 16-bit flag set, S/Z/PV included.
    pub(super) fn do_adc16(&mut self, lhs: u16, rhs: u16) -> u16 {
        let c_val = if (self.f & Flag::C as u8) != 0 { 1u32 } else { 0 };
        let result32 = lhs as u32 + rhs as u32 + c_val;
        let result = result32 as u16;

        let mut f = 0u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x8000) != 0 {
            f |= Flag::S as u8;
        }
        if (lhs & 0x0FFF) + (rhs & 0x0FFF) + c_val as u16 > 0x0FFF {
            f |= Flag::H as u8;
        }
        if (lhs ^ result) & (rhs ^ result) & 0x8000 != 0 {
            f |= Flag::PV as u8;
        }
        if result32 > 0xFFFF {
            f |= Flag::C as u8;
        }
        f |= ((result >> 8) as u8) & (Flag::X as u8 | Flag::Y as u8);

        self.f = f;
        self.q = self.f;
        result
    }

    pub(super) fn do_sbc16(&mut self, lhs: u16, rhs: u16) -> u16 {
        let c_val = if (self.f & Flag::C as u8) != 0 { 1i32 } else { 0 };
        let full = lhs as i32 - rhs as i32 - c_val;
        let result = full as u16;

        let mut f = Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x8000) != 0 {
            f |= Flag::S as u8;
        }
        if (lhs as i32 & 0x0FFF) - (rhs as i32 & 0x0FFF) - c_val < 0 {
            f |= Flag::H as u8;
        }
        if (lhs ^ rhs) & (lhs ^ result) & 0x8000 != 0 {
            f |= Flag::PV as u8;
        }
        if full < 0 {
            f |= Flag::C as u8;
        }
        f |= ((result >> 8) as u8) & (Flag::X as u8 | Flag::Y as u8);

        self.f = f;
        self.q = self.f;
        result
    }

    /// DAA: branches on N (the teacher's omission this fixes), per the
    /// Zilog data sheet's correction table.
    pub(super) fn do_daa(&mut self) {
        let a = self.a;
        let n = self.f & Flag::N as u8 != 0;
        let h = self.f & Flag::H as u8 != 0;
        let c = self.f & Flag::C as u8 != 0;

        let mut correction = 0u8;
        let mut carry_out = c;

        if h || (a & 0x0F) > 9 {
            correction |= 0x06;
        }
        if c || a > 0x99 {
            correction |= 0x60;
            carry_out = true;
        }

        let result = if n {
            a.wrapping_sub(correction)
        } else {
            a.wrapping_add(correction)
        };

        let half_carry_out = if n {
            h && (a & 0x0F) < 0x06
        } else {
            (a & 0x0F) + (correction & 0x0F) > 0x0F
        };

        let mut f = self.f & Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if half_carry_out {
            f |= Flag::H as u8;
        }
        if Self::get_parity(result) {
            f |= Flag::PV as u8;
        }
        if carry_out {
            f |= Flag::C as u8;
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);

        self.a = result;
        self.f = f;
        self.q = self.f;
    }

    pub(super) fn do_cpl(&mut self) {
        self.a = !self.a;
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8 | Flag::C as u8);
        f |= Flag::H as u8 | Flag::N as u8;
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.q = self.f;
    }

    pub(super) fn do_neg(&mut self) {
        let val = self.a;
        self.a = 0;
        self.do_sub(val, false);
    }

    /// SCF/CCF: X/Y come from A OR'd with F-as-it-stood-before-this-instruction
    /// when the *preceding* instruction left flags untouched, else from A
    /// alone (OQ-1). `prev_q` is the `q` marker left by that preceding
    /// instruction, captured at the top of `step()` before this one runs.
    fn scf_ccf_xy(&self) -> u8 {
        let source = if self.prev_q == 0 { self.a | self.f } else { self.a };
        source & (Flag::X as u8 | Flag::Y as u8)
    }

    pub(super) fn do_scf(&mut self) {
        let xy = self.scf_ccf_xy();
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        f |= Flag::C as u8;
        f |= xy;
        self.f = f;
        self.q = self.f;
    }

    pub(super) fn do_ccf(&mut self) {
        let xy = self.scf_ccf_xy();
        let had_carry = self.f & Flag::C as u8 != 0;
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        if had_carry {
            f |= Flag::H as u8;
        } else {
            f |= Flag::C as u8;
        }
        f |= xy;
        self.f = f;
        self.q = self.f;
    }

    fn rot_flags(&mut self, result: u8, carry_out: bool) {
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        if carry_out {
            f |= Flag::C as u8;
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.q = self.f;
    }

    pub(super) fn do_rlca(&mut self) {
        let carry_out = (self.a & 0x80) != 0;
        self.a = self.a.rotate_left(1);
        self.rot_flags(self.a, carry_out);
    }

    pub(super) fn do_rrca(&mut self) {
        let carry_out = (self.a & 0x01) != 0;
        self.a = self.a.rotate_right(1);
        self.rot_flags(self.a, carry_out);
    }

    pub(super) fn do_rla(&mut self) {
        let carry_in = (self.f & Flag::C as u8) != 0;
        let carry_out = (self.a & 0x80) != 0;
        self.a = (self.a << 1) | (carry_in as u8);
        self.rot_flags(self.a, carry_out);
    }

    pub(super) fn do_rra(&mut self) {
        let carry_in = (self.f & Flag::C as u8) != 0;
        let carry_out = (self.a & 0x01) != 0;
        self.a = (self.a >> 1) | ((carry_in as u8) << 7);
        self.rot_flags(self.a, carry_out);
    }
}
