//! T-state costs for the CB/ED-prefixed families, and the interrupt
//! acknowledge cycle: regression coverage for the prefix-fetch
//! double-counting bug described in SPEC_FULL.md §4.1.

mod common;
use common::new_core;

#[test]
fn cb_register_rotate_costs_8() {
    let (mut core, mem) = new_core();
    mem.load(0, &[0xCB, 0x00]); // RLC B
    assert_eq!(core.step(), 8);
}

#[test]
fn cb_memory_rotate_costs_15() {
    let (mut core, mem) = new_core();
    mem.load(0, &[0x21, 0x00, 0x30, 0xCB, 0x06]); // LD HL,0x3000 ; RLC (HL)
    core.step();
    assert_eq!(core.step(), 15);
}

#[test]
fn ddcb_rotate_costs_23() {
    let (mut core, mem) = new_core();
    mem.load(0, &[0xDD, 0x21, 0x00, 0x30, 0xDD, 0xCB, 0x02, 0x06]); // LD IX,0x3000 ; RLC (IX+2)
    core.step();
    assert_eq!(core.step(), 23);
}

#[test]
fn ed_ldi_costs_16() {
    let (mut core, mem) = new_core();
    mem.load(
        0,
        &[
            0x21, 0x00, 0x20, // LD HL,0x2000
            0x11, 0x00, 0x30, // LD DE,0x3000
            0x01, 0x01, 0x00, // LD BC,1
            0xED, 0xA0, // LDI
        ],
    );
    core.step();
    core.step();
    core.step();
    assert_eq!(core.step(), 16);
}

#[test]
fn ed_im_costs_8() {
    let (mut core, mem) = new_core();
    mem.load(0, &[0xED, 0x56]); // IM 1
    assert_eq!(core.step(), 8);
}

#[test]
fn ed_adc_hl_costs_15() {
    let (mut core, mem) = new_core();
    mem.load(0, &[0x01, 0x01, 0x00, 0xED, 0x4A]); // LD BC,1 ; ADC HL,BC
    core.step();
    assert_eq!(core.step(), 15);
}

#[test]
fn ed_in_c_costs_12() {
    let (mut core, mem) = new_core();
    mem.load(0, &[0xED, 0x40]); // IN B,(C)
    assert_eq!(core.step(), 12);
}

#[test]
fn ed_rld_costs_18() {
    let (mut core, mem) = new_core();
    mem.load(0, &[0x21, 0x00, 0x30, 0xED, 0x6F]); // LD HL,0x3000 ; RLD
    core.step();
    assert_eq!(core.step(), 18);
}

#[test]
fn ed_undefined_opcode_costs_8() {
    let (mut core, mem) = new_core();
    mem.load(0, &[0xED, 0x00]); // undefined ED opcode, NOP-like
    assert_eq!(core.step(), 8);
}

#[test]
fn doubled_dd_then_ed_wastes_the_index_prefix_and_costs_12() {
    // DD immediately followed by ED: the index prefix is simply wasted (its
    // own 4 T-states) and the ED instruction that follows executes as if
    // unprefixed, at its own full documented cost (NEG = 8, so 4 + 8 = 12).
    let (mut core, mem) = new_core();
    mem.load(0, &[0xDD, 0xED, 0x44]); // DD ; NEG
    assert_eq!(core.step(), 12);
}
