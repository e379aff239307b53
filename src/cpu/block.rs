//! The `ED`-prefixed block transfer/search/I/O instructions, and RLD/RRD.

use crate::core::Core;
use crate::cpu::registers::{Flag, Registers};
use crate::pacer::Clock;

impl<C: Clock> Core<C> {
    fn block_xy_flags(result_plus_a: u8) -> u8 {
        let mut f = 0u8;
        if result_plus_a & 0x02 != 0 {
            f |= Flag::Y as u8;
        }
        if result_plus_a & 0x08 != 0 {
            f |= Flag::X as u8;
        }
        f
    }

    /// LDI/LDD shared body; `inc` is true for LDI, false for LDD.
    fn do_ldi_ldd(&mut self, inc: bool) {
        let hl = self.regs.get_hl();
        let de = self.regs.get_de();
        let val = self.memory.read(hl);
        self.memory.write(de, val);

        let bc = self.regs.get_bc().wrapping_sub(1);
        self.regs.set_bc(bc);

        if inc {
            self.regs.set_hl(hl.wrapping_add(1));
            self.regs.set_de(de.wrapping_add(1));
        } else {
            self.regs.set_hl(hl.wrapping_sub(1));
            self.regs.set_de(de.wrapping_sub(1));
        }

        let n = val.wrapping_add(self.regs.a);
        let mut f = self.regs.f & (Flag::S as u8 | Flag::Z as u8 | Flag::C as u8);
        if bc != 0 {
            f |= Flag::PV as u8;
        }
        f |= Self::block_xy_flags(n);
        self.regs.f = f;
        self.regs.q = self.regs.f;
    }

    pub(super) fn op_ldi(&mut self) {
        self.do_ldi_ldd(true);
    }

    pub(super) fn op_ldd(&mut self) {
        self.do_ldi_ldd(false);
    }

    /// LDIR/LDDR. Returns true if the instruction repeats (BC != 0), in
    /// which case the caller rewinds PC by 2 and the extra 5 T-states apply.
    pub(super) fn op_ldir(&mut self) -> bool {
        self.op_ldi();
        self.regs.get_bc() != 0
    }

    pub(super) fn op_lddr(&mut self) -> bool {
        self.op_ldd();
        self.regs.get_bc() != 0
    }

    fn do_cpi_cpd(&mut self, inc: bool) {
        let hl = self.regs.get_hl();
        let val = self.memory.read(hl);
        let a = self.regs.a;
        let result = a.wrapping_sub(val);

        let bc = self.regs.get_bc().wrapping_sub(1);
        self.regs.set_bc(bc);

        if inc {
            self.regs.set_hl(hl.wrapping_add(1));
            self.regs.memptr = self.regs.memptr.wrapping_add(1);
        } else {
            self.regs.set_hl(hl.wrapping_sub(1));
            self.regs.memptr = self.regs.memptr.wrapping_sub(1);
        }

        let half_carry = (a & 0x0F) < (val & 0x0F);
        let n = if half_carry { result.wrapping_sub(1) } else { result };

        let mut f = (self.regs.f & Flag::C as u8) | Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if result & 0x80 != 0 {
            f |= Flag::S as u8;
        }
        if half_carry {
            f |= Flag::H as u8;
        }
        if bc != 0 {
            f |= Flag::PV as u8;
        }
        f |= Self::block_xy_flags(n);
        self.regs.f = f;
        self.regs.q = self.regs.f;
    }

    pub(super) fn op_cpi(&mut self) {
        self.do_cpi_cpd(true);
    }

    pub(super) fn op_cpd(&mut self) {
        self.do_cpi_cpd(false);
    }

    /// CPIR/CPDR. Repeats while BC != 0 AND no match found yet.
    pub(super) fn op_cpir(&mut self) -> bool {
        self.op_cpi();
        self.regs.get_bc() != 0 && self.regs.f & Flag::Z as u8 == 0
    }

    pub(super) fn op_cpdr(&mut self) -> bool {
        self.op_cpd();
        self.regs.get_bc() != 0 && self.regs.f & Flag::Z as u8 == 0
    }

    fn io_block_flags(&mut self, result: u8, b_after: u8, carry_candidate: u16) {
        let mut f = 0u8;
        if b_after == 0 {
            f |= Flag::Z as u8;
        }
        if b_after & 0x80 != 0 {
            f |= Flag::S as u8;
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        if carry_candidate > 0xFF {
            f |= Flag::C as u8 | Flag::H as u8;
        }
        let parity_index = ((carry_candidate as u8) & 0x07) ^ b_after;
        if Registers::get_parity(parity_index) {
            f |= Flag::PV as u8;
        }
        f |= Flag::N as u8 * ((result & 0x80 != 0) as u8);
        self.regs.f = f;
        self.regs.q = self.regs.f;
    }


    fn do_ini_ind(&mut self, inc: bool) {
        let port_addr = self.regs.get_bc();
        let val = self.ports.read_port(port_addr);
        let hl = self.regs.get_hl();
        self.memory.write(hl, val);

        self.regs.b = self.regs.b.wrapping_sub(1);
        if inc {
            self.regs.set_hl(hl.wrapping_add(1));
            self.regs.memptr = port_addr.wrapping_add(1);
        } else {
            self.regs.set_hl(hl.wrapping_sub(1));
            self.regs.memptr = port_addr.wrapping_sub(1);
        }

        let c_plus = if inc {
            (self.regs.c as u16).wrapping_add(1)
        } else {
            (self.regs.c as u16).wrapping_sub(1)
        };
        let carry_candidate = val as u16 + (c_plus & 0xFF);
        let b_after = self.regs.b;
        self.io_block_flags(val, b_after, carry_candidate);
    }

    pub(super) fn op_ini(&mut self) {
        self.do_ini_ind(true);
    }

    pub(super) fn op_ind(&mut self) {
        self.do_ini_ind(false);
    }

    pub(super) fn op_inir(&mut self) -> bool {
        self.op_ini();
        self.regs.b != 0
    }

    pub(super) fn op_indr(&mut self) -> bool {
        self.op_ind();
        self.regs.b != 0
    }

    fn do_outi_outd(&mut self, inc: bool) {
        let hl = self.regs.get_hl();
        let val = self.memory.read(hl);
        self.regs.b = self.regs.b.wrapping_sub(1);
        let port_addr = self.regs.get_bc();
        self.ports.write_port(port_addr, val);

        if inc {
            self.regs.set_hl(hl.wrapping_add(1));
        } else {
            self.regs.set_hl(hl.wrapping_sub(1));
        }
        self.regs.memptr = port_addr.wrapping_add(1);

        let carry_candidate = val as u16 + self.regs.l as u16;
        let b_after = self.regs.b;
        self.io_block_flags(val, b_after, carry_candidate);
    }

    pub(super) fn op_outi(&mut self) {
        self.do_outi_outd(true);
    }

    pub(super) fn op_outd(&mut self) {
        self.do_outi_outd(false);
    }

    pub(super) fn op_otir(&mut self) -> bool {
        self.op_outi();
        self.regs.b != 0
    }

    pub(super) fn op_otdr(&mut self) -> bool {
        self.op_outd();
        self.regs.b != 0
    }

    /// RLD: rotate the low nibble of `(HL)` into A's low nibble, A's old low
    /// nibble into `(HL)`'s high nibble, `(HL)`'s high nibble out to carry in.
    pub(super) fn op_rld(&mut self) {
        let hl = self.regs.get_hl();
        let mem = self.memory.read(hl);
        let a = self.regs.a;

        let new_mem = (mem << 4) | (a & 0x0F);
        let new_a = (a & 0xF0) | (mem >> 4);

        self.memory.write(hl, new_mem);
        self.regs.a = new_a;
        self.regs.memptr = hl.wrapping_add(1);
        self.set_rotate_digit_flags(new_a);
    }

    pub(super) fn op_rrd(&mut self) {
        let hl = self.regs.get_hl();
        let mem = self.memory.read(hl);
        let a = self.regs.a;

        let new_mem = (a << 4) | (mem >> 4);
        let new_a = (a & 0xF0) | (mem & 0x0F);

        self.memory.write(hl, new_mem);
        self.regs.a = new_a;
        self.regs.memptr = hl.wrapping_add(1);
        self.set_rotate_digit_flags(new_a);
    }

    fn set_rotate_digit_flags(&mut self, new_a: u8) {
        let mut f = self.regs.f & Flag::C as u8;
        if new_a == 0 {
            f |= Flag::Z as u8;
        }
        if new_a & 0x80 != 0 {
            f |= Flag::S as u8;
        }
        if Registers::get_parity(new_a) {
            f |= Flag::PV as u8;
        }
        f |= new_a & (Flag::X as u8 | Flag::Y as u8);
        self.regs.f = f;
        self.regs.q = self.regs.f;
    }
}
