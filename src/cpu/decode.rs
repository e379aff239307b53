//! Fetch, decode, dispatch. This is the one place that advances `PC`, reads
//! opcode bytes, and turns an opcode into the family-module call that
//! implements it.
//!
//! The opcode map is read the way the Zilog data sheet documents it: every
//! byte splits into `x:2 y:3 z:3` (with `y` further splitting into `p:2 q:1`
//! for the register-pair forms). See SPEC_FULL.md §4.1.

use crate::core::Core;
use crate::cpu::registers::{Flag, IndexMode};
use crate::pacer::Clock;

impl<C: Clock> Core<C> {
    pub(super) fn fetch_byte(&mut self) -> u8 {
        let b = self.memory.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        b
    }

    pub(super) fn fetch_word(&mut self) -> u16 {
        let lo = self.fetch_byte();
        let hi = self.fetch_byte();
        ((hi as u16) << 8) | lo as u16
    }

    /// Read an 8-bit operand selected by a decoder register field, honoring
    /// the active index mode for field 6 (`(HL)`/`(IX+d)`/`(IY+d)`) and the
    /// undocumented half-register substitution for fields 4/5.
    pub(super) fn get_operand(&mut self, r: u8) -> u8 {
        if r == 6 {
            let addr = self.resolve_index_addr();
            self.memory.read(addr)
        } else {
            self.regs.get_reg8_ix(r)
        }
    }

    pub(super) fn set_operand(&mut self, r: u8, val: u8) {
        if r == 6 {
            let addr = self.resolve_index_addr();
            self.memory.write(addr, val);
        } else {
            self.regs.set_reg8_ix(r, val);
        }
    }

    fn op_inc_dec_r(&mut self, r: u8, is_dec: bool) {
        if r == 6 {
            let addr = self.resolve_index_addr();
            let val = self.memory.read(addr);
            let result = if is_dec {
                self.regs.calc_dec_flags(val)
            } else {
                self.regs.calc_inc_flags(val)
            };
            self.memory.write(addr, result);
        } else {
            let val = self.regs.get_reg8_ix(r);
            let result = if is_dec {
                self.regs.calc_dec_flags(val)
            } else {
                self.regs.calc_inc_flags(val)
            };
            self.regs.set_reg8_ix(r, result);
        }
    }

    /// R increments by `ceil(t_states / 4)`, written into the low 7 bits
    /// only — bit 7 is sticky and never touched by execution.
    fn credit(&mut self, t_states: u32) {
        let inc = ((t_states + 3) / 4) as u8;
        let low7 = self.regs.r.wrapping_add(inc) & 0x7F;
        self.regs.r = (self.regs.r & 0x80) | low7;
    }

    /// Edge-detects NMI, applies the one-instruction EI delay to the
    /// maskable interrupt check, and services whichever (if either) fires.
    /// Returns the T-states spent servicing an interrupt, or `None` if
    /// `step()` should proceed to decode the next opcode normally.
    fn poll_interrupts(&mut self) -> Option<u32> {
        let nmi_line = self.ports.nmi();
        if nmi_line && !self.regs.nmi_previous {
            self.regs.nmi_previous = true;
            return Some(self.service_nmi());
        }
        if !nmi_line {
            self.regs.nmi_previous = false;
        }

        if self.regs.ei_delay {
            self.regs.ei_delay = false;
            return None;
        }

        let int_requested = self.ports.int() || self.pending_int_vector.is_some();
        if self.regs.iff1 && int_requested {
            return Some(self.service_int());
        }
        if !self.regs.iff1 {
            // A signalled interrupt that arrives while masked is dropped, not
            // queued: consume it so a later EI doesn't resurrect a stale byte.
            self.pending_int_vector = None;
        }
        None
    }

    /// Byte placed on the data bus at interrupt acknowledge: whatever
    /// `signal_int` stashed, else the port adapter's own `data()` line.
    /// Consumed (and cleared) by whichever interrupt-mode branch reads it.
    fn ack_data(&mut self) -> u8 {
        self.pending_int_vector
            .take()
            .unwrap_or_else(|| self.ports.data())
    }

    /// NMI and every INT mode cost 17 T-states to service, per SPEC_FULL §4.3.
    const INTERRUPT_SERVICE_COST: u32 = 17;

    fn service_nmi(&mut self) -> u32 {
        self.regs.halted = false;
        self.regs.iff1 = false;
        self.push16(self.regs.pc);
        self.regs.pc = 0x0066;
        self.regs.memptr = self.regs.pc;
        self.credit(Self::INTERRUPT_SERVICE_COST);
        Self::INTERRUPT_SERVICE_COST
    }

    fn service_int(&mut self) -> u32 {
        self.regs.halted = false;
        self.regs.iff1 = false;
        self.regs.iff2 = false;
        match self.regs.im {
            2 => {
                let vector = ((self.regs.i as u16) << 8) | self.ack_data() as u16;
                let addr = self.memory.read16(vector);
                self.push16(self.regs.pc);
                self.regs.pc = addr;
                self.regs.memptr = addr;
            }
            _ => {
                // IM 0 and IM 1 both vector through a fixed location here:
                // IM 0 hardware would execute whatever instruction the
                // interrupting device places on the bus (almost always an
                // RST), so we treat the low 6 bits of the supplied data byte
                // as that RST's vector (OQ: IM 0 simplification).
                let vector = if self.regs.im == 0 {
                    (self.ack_data() & 0x38) as u16
                } else {
                    self.pending_int_vector.take();
                    0x0038
                };
                self.push16(self.regs.pc);
                self.regs.pc = vector;
                self.regs.memptr = vector;
            }
        };
        self.credit(Self::INTERRUPT_SERVICE_COST);
        Self::INTERRUPT_SERVICE_COST
    }

    /// Advance the CPU by exactly one instruction (or one interrupt
    /// acknowledgment cycle), returning the T-states it cost.
    pub fn step(&mut self) -> u32 {
        if let Some(t) = self.poll_interrupts() {
            log::trace!("interrupt acknowledged, pc now 0x{:04X}", self.regs.pc);
            self.pacer.wait(t);
            return t;
        }

        if self.regs.halted {
            self.credit(4);
            self.pacer.wait(4);
            return 4;
        }

        self.regs.prev_q = self.regs.q;
        self.regs.q = 0;
        self.regs.index_mode = IndexMode::HL;

        let pc_at_fetch = self.regs.pc;
        let opcode = self.fetch_byte();
        self.logger.log_mem_read(pc_at_fetch, opcode);
        let t = match opcode {
            0xCB => {
                let opcode2 = self.fetch_byte();
                self.exec_cb(opcode2)
            }
            0xED => {
                let opcode2 = self.fetch_byte();
                self.exec_ed(opcode2)
            }
            0xDD => self.exec_prefixed(IndexMode::IX),
            0xFD => self.exec_prefixed(IndexMode::IY),
            _ => self.exec_root(opcode),
        };

        self.credit(t);
        self.pacer.wait(t);
        t
    }

    fn exec_prefixed(&mut self, mode: IndexMode) -> u32 {
        self.regs.index_mode = mode;
        let opcode2 = self.fetch_byte();
        if opcode2 == 0xCB {
            // exec_ddcb_fdcb already returns the full documented DDCB/FDCB
            // total, including the leading DD/FD byte's own fetch.
            return self.exec_ddcb_fdcb();
        }
        // exec_root returns the base (unprefixed) table cost; the index
        // prefix adds a flat 4 T-states on top of it.
        4 + self.exec_root(opcode2)
    }

    /// `DDCB`/`FDCB`: `d` precedes the real opcode byte, unlike every other
    /// indexed form where the displacement follows it.
    fn exec_ddcb_fdcb(&mut self) -> u32 {
        let disp = self.fetch_byte();
        let addr = self.regs.get_index_addr(disp);
        self.regs.memptr = addr;
        let opcode3 = self.fetch_byte();
        let dst = opcode3 & 0x07;
        let bit = (opcode3 >> 3) & 0x07;

        match opcode3 >> 6 {
            0 => {
                self.op_rotate_indexed(addr, bit, dst);
                23
            }
            1 => {
                self.op_bit_indexed(bit, addr);
                20
            }
            2 => {
                self.op_reswrite_indexed(addr, bit, false, dst);
                23
            }
            3 => {
                self.op_reswrite_indexed(addr, bit, true, dst);
                23
            }
            _ => unreachable!(),
        }
    }

    /// Returns the full documented T-state cost of the CB-prefixed
    /// instruction, including the CB byte's own fetch — callers must not
    /// add anything further on top of it.
    fn exec_cb(&mut self, opcode: u8) -> u32 {
        let r = opcode & 0x07;
        let is_mem = r == 6;
        match opcode >> 6 {
            0 => {
                let op = (opcode >> 3) & 0x07;
                let val = self.get_operand(r);
                let result = self.do_cb_rotate_shift(op, val);
                self.set_operand(r, result);
                if is_mem {
                    15
                } else {
                    8
                }
            }
            1 => {
                let bit = (opcode >> 3) & 0x07;
                self.op_bit_reg(bit, r);
                if is_mem {
                    12
                } else {
                    8
                }
            }
            2 => {
                let bit = (opcode >> 3) & 0x07;
                self.op_res_reg(bit, r);
                if is_mem {
                    15
                } else {
                    8
                }
            }
            3 => {
                let bit = (opcode >> 3) & 0x07;
                self.op_set_reg(bit, r);
                if is_mem {
                    15
                } else {
                    8
                }
            }
            _ => unreachable!(),
        }
    }

    /// Returns the full documented T-state cost of the ED-prefixed
    /// instruction, including the ED byte's own fetch — callers must not
    /// add anything further on top of it.
    fn exec_ed(&mut self, opcode: u8) -> u32 {
        let x = opcode >> 6;
        let y = (opcode >> 3) & 0x07;
        let z = opcode & 0x07;
        let p = y >> 1;
        let q = y & 1;

        match (x, z) {
            (1, 0) => {
                let addr = self.regs.get_bc();
                let val = self.ports.read_port(addr);
                self.regs.memptr = addr.wrapping_add(1);
                if y != 6 {
                    self.regs.set_reg8(y, val);
                }
                self.set_in_flags(val);
                12
            }
            (1, 1) => {
                let val = if y == 6 { 0 } else { self.regs.get_reg8(y) };
                let addr = self.regs.get_bc();
                self.ports.write_port(addr, val);
                self.regs.memptr = addr.wrapping_add(1);
                12
            }
            (1, 2) => {
                let rhs = self.regs.get_rp(p);
                let hl = self.regs.get_hl();
                self.regs.memptr = hl.wrapping_add(1);
                let result = if q == 0 {
                    self.regs.do_sbc16(hl, rhs)
                } else {
                    self.regs.do_adc16(hl, rhs)
                };
                self.regs.set_hl(result);
                15
            }
            (1, 3) => {
                if q == 0 {
                    self.op_ld_ind_nn_dd(p);
                } else {
                    self.op_ld_dd_ind_nn(p);
                }
                20
            }
            (1, 4) => {
                self.regs.do_neg();
                8
            }
            (1, 5) => {
                if y == 1 {
                    self.op_reti();
                } else {
                    self.op_retn();
                }
                14
            }
            (1, 6) => {
                self.regs.im = match y & 0x03 {
                    0 | 1 => 0,
                    2 => 1,
                    _ => 2,
                };
                8
            }
            (1, 7) => match y {
                // ED 67 = RRD (y=4), ED 6F = RLD (y=5).
                4 => {
                    self.op_rrd();
                    18
                }
                5 => {
                    self.op_rld();
                    18
                }
                _ => {
                    match y {
                        0 => self.op_ld_i_a(),
                        1 => self.op_ld_r_a(),
                        2 => self.op_ld_a_i(),
                        3 => self.op_ld_a_r(),
                        _ => {} // undocumented NOPs
                    }
                    9
                }
            },
            (2, 0) if y >= 4 => {
                let repeat = if y == 4 {
                    self.op_ldi();
                    false
                } else if y == 5 {
                    self.op_ldd();
                    false
                } else if y == 6 {
                    self.op_ldir()
                } else {
                    self.op_lddr()
                };
                self.finish_block_repeat(repeat)
            }
            (2, 1) if y >= 4 => {
                let repeat = if y == 4 {
                    self.op_cpi();
                    false
                } else if y == 5 {
                    self.op_cpd();
                    false
                } else if y == 6 {
                    self.op_cpir()
                } else {
                    self.op_cpdr()
                };
                self.finish_block_repeat(repeat)
            }
            (2, 2) if y >= 4 => {
                let repeat = if y == 4 {
                    self.op_ini();
                    false
                } else if y == 5 {
                    self.op_ind();
                    false
                } else if y == 6 {
                    self.op_inir()
                } else {
                    self.op_indr()
                };
                self.finish_block_repeat(repeat)
            }
            (2, 3) if y >= 4 => {
                let repeat = if y == 4 {
                    self.op_outi();
                    false
                } else if y == 5 {
                    self.op_outd();
                    false
                } else if y == 6 {
                    self.op_otir()
                } else {
                    self.op_otdr()
                };
                self.finish_block_repeat(repeat)
            }
            // Undefined ED opcodes act as an 8 T-state NOP (OQ-2).
            _ => 8,
        }
    }

    /// Block-repeat instructions rewind `PC` by 2 to re-execute themselves
    /// while the repeat condition holds, costing 5 extra T-states per pass.
    fn finish_block_repeat(&mut self, repeat: bool) -> u32 {
        if repeat {
            self.regs.pc = self.regs.pc.wrapping_sub(2);
            21
        } else {
            16
        }
    }

    fn set_in_flags(&mut self, val: u8) {
        let mut f = self.regs.f & Flag::C as u8;
        if val == 0 {
            f |= Flag::Z as u8;
        }
        if val & 0x80 != 0 {
            f |= Flag::S as u8;
        }
        if val.count_ones() % 2 == 0 {
            f |= Flag::PV as u8;
        }
        f |= val & (Flag::X as u8 | Flag::Y as u8);
        self.regs.f = f;
        self.regs.q = self.regs.f;
    }

    /// The unprefixed opcode table — and, when `self.regs.index_mode` is
    /// `IX`/`IY`, the DD/FD-prefixed variant of the same table. An opcode
    /// that never touches `H`/`L`/`(HL)` behaves identically either way,
    /// matching real hardware's "prefix has no effect" behavior for those.
    fn exec_root(&mut self, opcode: u8) -> u32 {
        let x = opcode >> 6;
        let y = (opcode >> 3) & 0x07;
        let z = opcode & 0x07;
        let p = y >> 1;
        let q = y & 1;

        match x {
            0 => match z {
                0 => match y {
                    0 => 4,
                    1 => {
                        self.op_ex_af_af();
                        4
                    }
                    2 => {
                        if self.op_djnz() {
                            13
                        } else {
                            8
                        }
                    }
                    3 => {
                        self.op_jr();
                        12
                    }
                    _ => {
                        if self.op_jr_cc(y - 4) {
                            12
                        } else {
                            7
                        }
                    }
                },
                1 => {
                    if q == 0 {
                        self.op_ld_dd_nn(p);
                        10
                    } else {
                        let rhs = self.regs.get_rp(p);
                        let lhs = self.regs.get_rp(2);
                        let result = self.regs.do_add16(lhs, rhs);
                        self.regs.set_rp(2, result);
                        11
                    }
                }
                2 => match (q, p) {
                    (0, 0) => {
                        self.op_ld_bc_a();
                        7
                    }
                    (0, 1) => {
                        self.op_ld_de_a();
                        7
                    }
                    (0, 2) => {
                        self.op_ld_ind_nn_hl();
                        16
                    }
                    (0, 3) => {
                        self.op_ld_nn_a();
                        13
                    }
                    (1, 0) => {
                        self.op_ld_a_bc();
                        7
                    }
                    (1, 1) => {
                        self.op_ld_a_de();
                        7
                    }
                    (1, 2) => {
                        self.op_ld_hl_ind_nn();
                        16
                    }
                    (1, 3) => {
                        self.op_ld_a_nn();
                        13
                    }
                    _ => unreachable!(),
                },
                3 => {
                    let val = self.regs.get_rp(p);
                    let result = if q == 0 {
                        val.wrapping_add(1)
                    } else {
                        val.wrapping_sub(1)
                    };
                    self.regs.set_rp(p, result);
                    6
                }
                4 => {
                    self.op_inc_dec_r(y, false);
                    if y == 6 {
                        11
                    } else {
                        4
                    }
                }
                5 => {
                    self.op_inc_dec_r(y, true);
                    if y == 6 {
                        11
                    } else {
                        4
                    }
                }
                6 => {
                    self.op_ld_r_n(y);
                    if y == 6 {
                        10
                    } else {
                        7
                    }
                }
                7 => {
                    match y {
                        0 => self.regs.do_rlca(),
                        1 => self.regs.do_rrca(),
                        2 => self.regs.do_rla(),
                        3 => self.regs.do_rra(),
                        4 => self.regs.do_daa(),
                        5 => self.regs.do_cpl(),
                        6 => self.regs.do_scf(),
                        7 => self.regs.do_ccf(),
                        _ => unreachable!(),
                    }
                    4
                }
                _ => unreachable!(),
            },
            1 => {
                if y == 6 && z == 6 {
                    self.regs.halted = true;
                    4
                } else {
                    self.op_ld_r_r(opcode);
                    if y == 6 || z == 6 {
                        7
                    } else {
                        4
                    }
                }
            }
            2 => {
                let val = self.get_operand(z);
                self.regs.perform_alu_op(y, val);
                if z == 6 {
                    7
                } else {
                    4
                }
            }
            3 => match z {
                0 => {
                    if self.op_ret_cc(y) {
                        11
                    } else {
                        5
                    }
                }
                1 => {
                    if q == 0 {
                        self.op_pop(p);
                        10
                    } else {
                        match p {
                            0 => {
                                self.op_ret();
                                10
                            }
                            1 => {
                                self.op_exx();
                                4
                            }
                            2 => {
                                self.op_jp_hl();
                                4
                            }
                            3 => {
                                self.op_ld_sp_hl();
                                6
                            }
                            _ => unreachable!(),
                        }
                    }
                }
                2 => {
                    self.op_jp_cc_nn(y);
                    10
                }
                3 => match y {
                    0 => {
                        self.op_jp_nn();
                        10
                    }
                    1 => {
                        let opcode2 = self.fetch_byte();
                        self.exec_cb(opcode2)
                    }
                    2 => {
                        let n = self.fetch_byte();
                        let addr = (self.regs.a as u16) << 8 | n as u16;
                        self.ports.write_port(addr, self.regs.a);
                        self.regs.memptr = (self.regs.a as u16) << 8 | (n.wrapping_add(1) as u16);
                        11
                    }
                    3 => {
                        let n = self.fetch_byte();
                        let addr = (self.regs.a as u16) << 8 | n as u16;
                        self.regs.a = self.ports.read_port(addr);
                        self.regs.memptr = addr.wrapping_add(1);
                        11
                    }
                    4 => {
                        self.op_ex_sp_hl();
                        19
                    }
                    5 => {
                        self.op_ex_de_hl();
                        4
                    }
                    6 => {
                        self.op_di();
                        4
                    }
                    _ => {
                        self.op_ei();
                        4
                    }
                },
                4 => {
                    if self.op_call_cc_nn(y) {
                        17
                    } else {
                        10
                    }
                }
                5 => {
                    if q == 0 {
                        self.op_push(p);
                        11
                    } else {
                        match p {
                            0 => {
                                self.op_call_nn();
                                17
                            }
                            1 => self.exec_prefixed(IndexMode::IX),
                            2 => {
                                let opcode2 = self.fetch_byte();
                                self.exec_ed(opcode2)
                            }
                            3 => self.exec_prefixed(IndexMode::IY),
                            _ => unreachable!(),
                        }
                    }
                }
                6 => {
                    let val = self.fetch_byte();
                    self.regs.perform_alu_op(y, val);
                    7
                }
                7 => {
                    self.op_rst(y);
                    11
                }
                _ => unreachable!(),
            },
            _ => unreachable!(),
        }
    }
}
