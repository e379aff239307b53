//! Jumps, calls, returns, restarts, and the interrupt-control instructions.

use crate::core::Core;
use crate::cpu::registers::Flag;
use crate::pacer::Clock;

impl<C: Clock> Core<C> {
    /// Evaluate one of the eight condition codes encoded in a `cc` field.
    pub(super) fn eval_condition(&self, cc: u8) -> bool {
        let f = self.regs.f;
        match cc {
            0 => f & Flag::Z as u8 == 0,  // NZ
            1 => f & Flag::Z as u8 != 0,  // Z
            2 => f & Flag::C as u8 == 0,  // NC
            3 => f & Flag::C as u8 != 0,  // C
            4 => f & Flag::PV as u8 == 0, // PO
            5 => f & Flag::PV as u8 != 0, // PE
            6 => f & Flag::S as u8 == 0,  // P
            7 => f & Flag::S as u8 != 0,  // M
            _ => unreachable!("condition field is 3 bits"),
        }
    }

    pub(super) fn op_jp_nn(&mut self) {
        let nn = self.fetch_word();
        self.regs.memptr = nn;
        self.regs.pc = nn;
    }

    /// JP cc,nn. Returns whether the jump was taken (all JP forms cost the
    /// same T-states, so the caller doesn't need this, but it mirrors
    /// `op_jr_cc` and keeps the two symmetric).
    pub(super) fn op_jp_cc_nn(&mut self, cc: u8) {
        let nn = self.fetch_word();
        self.regs.memptr = nn;
        if self.eval_condition(cc) {
            self.regs.pc = nn;
        }
    }

    pub(super) fn op_jp_hl(&mut self) {
        self.regs.pc = self.regs.get_rp(2);
    }

    /// JR e. Returns the extra T-states already accounted for by the caller.
    pub(super) fn op_jr(&mut self) {
        let e = self.fetch_byte() as i8;
        self.regs.pc = self.regs.pc.wrapping_add(e as i16 as u16);
        self.regs.memptr = self.regs.pc;
    }

    /// JR cc,e for cc in {NZ,Z,NC,C} (2-bit field, not the full 3-bit `cc`).
    /// Returns true if the branch was taken (caller adds the extra 5 T-states).
    pub(super) fn op_jr_cc(&mut self, cc2: u8) -> bool {
        let e = self.fetch_byte() as i8;
        let taken = self.eval_condition(cc2);
        if taken {
            self.regs.pc = self.regs.pc.wrapping_add(e as i16 as u16);
            self.regs.memptr = self.regs.pc;
        }
        taken
    }

    /// DJNZ e. Returns true if the branch was taken.
    pub(super) fn op_djnz(&mut self) -> bool {
        let e = self.fetch_byte() as i8;
        self.regs.b = self.regs.b.wrapping_sub(1);
        if self.regs.b != 0 {
            self.regs.pc = self.regs.pc.wrapping_add(e as i16 as u16);
            self.regs.memptr = self.regs.pc;
            true
        } else {
            false
        }
    }

    pub(super) fn op_call_nn(&mut self) {
        let nn = self.fetch_word();
        self.regs.memptr = nn;
        self.push16(self.regs.pc);
        self.regs.pc = nn;
    }

    /// CALL cc,nn. Returns true if the call was taken.
    pub(super) fn op_call_cc_nn(&mut self, cc: u8) -> bool {
        let nn = self.fetch_word();
        self.regs.memptr = nn;
        if self.eval_condition(cc) {
            self.push16(self.regs.pc);
            self.regs.pc = nn;
            true
        } else {
            false
        }
    }

    pub(super) fn op_ret(&mut self) {
        let nn = self.pop16();
        self.regs.memptr = nn;
        self.regs.pc = nn;
    }

    /// RET cc. Returns true if the return was taken.
    pub(super) fn op_ret_cc(&mut self, cc: u8) -> bool {
        if self.eval_condition(cc) {
            self.op_ret();
            true
        } else {
            false
        }
    }

    /// RST p. Opcode mask: 11 ppp 111; `p` selects one of the eight fixed
    /// vectors 0x00,0x08,...,0x38.
    pub(super) fn op_rst(&mut self, p: u8) {
        self.push16(self.regs.pc);
        let addr = (p as u16) * 8;
        self.regs.memptr = addr;
        self.regs.pc = addr;
    }

    pub(super) fn op_di(&mut self) {
        self.regs.iff1 = false;
        self.regs.iff2 = false;
    }

    pub(super) fn op_ei(&mut self) {
        self.regs.iff1 = true;
        self.regs.iff2 = true;
        self.regs.ei_delay = true;
    }

    /// RETN: restores IFF1 from IFF2, as for any non-maskable-interrupt return.
    pub(super) fn op_retn(&mut self) {
        self.regs.iff1 = self.regs.iff2;
        self.op_ret();
    }

    /// RETI: functionally identical to RETN on real hardware (both merely
    /// signal "this interrupt service routine is done" to daisy-chained
    /// peripherals); kept as a distinct opcode for host `Port` implementations
    /// that want to distinguish NMI-return from INT-return.
    pub(super) fn op_reti(&mut self) {
        self.regs.iff1 = self.regs.iff2;
        self.op_ret();
    }
}
