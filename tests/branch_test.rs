//! Jump/call/return condition evaluation, DJNZ, RST, and the interrupt-control
//! instructions' effect on IFF1/IFF2.

mod common;
use common::{new_core, new_core_with_ports};

#[test]
fn jp_nn_sets_pc_and_memptr() {
    let (mut core, mem) = new_core();
    mem.load(0, &[0xC3, 0x34, 0x12]); // JP 0x1234
    core.step();
    assert_eq!(core.pc(), 0x1234);
}

#[test]
fn jp_cc_not_taken_falls_through() {
    let (mut core, mem) = new_core();
    // AND A clears Z only if A==0; LD A,1 ; AND A -> Z clear ; JP Z,nn not taken
    mem.load(0, &[0x3E, 0x01, 0xA7, 0xCA, 0x00, 0x10]);
    core.step();
    core.step();
    core.step();
    assert_eq!(core.pc(), 6);
}

#[test]
fn jp_cc_taken_jumps() {
    let (mut core, mem) = new_core();
    // LD A,0 ; AND A -> Z set ; JP Z,nn taken
    mem.load(0, &[0x3E, 0x00, 0xA7, 0xCA, 0x00, 0x10]);
    core.step();
    core.step();
    core.step();
    assert_eq!(core.pc(), 0x1000);
}

#[test]
fn jp_hl_is_indirect_not_memory_read() {
    let (mut core, mem) = new_core();
    mem.load(0, &[0x21, 0x00, 0x30, 0xE9]); // LD HL,0x3000 ; JP (HL)
    core.step();
    core.step();
    assert_eq!(core.pc(), 0x3000);
}

#[test]
fn jr_is_pc_relative() {
    let (mut core, mem) = new_core();
    mem.load(0, &[0x18, 0x05]); // JR +5
    core.step();
    assert_eq!(core.pc(), 2 + 5);
}

#[test]
fn jr_negative_offset_jumps_backward() {
    let (mut core, mem) = new_core();
    mem.load(0, &[0x00, 0x00, 0x18, 0xFC]); // at pc=2: JR -4 -> target 4-4=0
    core.step();
    core.step();
    core.step();
    assert_eq!(core.pc(), 0);
}

#[test]
fn djnz_decrements_b_and_loops_until_zero() {
    let (mut core, mem) = new_core();
    // LD B,3 ; loop: NOP ; DJNZ loop
    mem.load(0, &[0x06, 0x03, 0x00, 0x10, 0xFD]);
    core.step(); // LD B,3
    let mut iterations = 0;
    loop {
        core.step(); // NOP
        core.step(); // DJNZ
        iterations += 1;
        if core.bc() >> 8 == 0 {
            break;
        }
        assert!(iterations <= 10, "DJNZ did not terminate");
    }
    assert_eq!(iterations, 3);
    assert_eq!(core.pc(), 5);
}

#[test]
fn call_and_ret_round_trip_through_stack() {
    let (mut core, mem) = new_core();
    mem.load(
        0,
        &[
            0x31, 0x00, 0x80, // LD SP,0x8000
            0xCD, 0x00, 0x10, // CALL 0x1000
        ],
    );
    mem.load(0x1000, &[0xC9]); // RET
    core.step(); // LD SP
    core.step(); // CALL
    assert_eq!(core.pc(), 0x1000);
    assert_eq!(core.sp(), 0x7FFE);
    core.step(); // RET
    assert_eq!(core.pc(), 6);
    assert_eq!(core.sp(), 0x8000);
}

#[test]
fn call_cc_not_taken_leaves_stack_untouched() {
    let (mut core, mem) = new_core();
    mem.load(
        0,
        &[
            0x31, 0x00, 0x80, // LD SP,0x8000
            0x3E, 0x01, // LD A,1
            0xA7, // AND A (Z clear)
            0xCC, 0x00, 0x10, // CALL Z,0x1000 (not taken)
        ],
    );
    for _ in 0..4 {
        core.step();
    }
    assert_eq!(core.sp(), 0x8000);
    assert_eq!(core.pc(), 9);
}

#[test]
fn rst_pushes_return_address_and_jumps_to_fixed_vector() {
    let (mut core, mem) = new_core();
    mem.load(0, &[0x31, 0x00, 0x80, 0xEF]); // LD SP,0x8000 ; RST 0x28
    core.step();
    core.step();
    assert_eq!(core.pc(), 0x28);
    assert_eq!(core.sp(), 0x7FFE);
}

#[test]
fn di_clears_both_iff_and_ei_sets_both() {
    let (mut core, mem) = new_core();
    mem.load(0, &[0xFB, 0x00, 0xF3]); // EI ; NOP ; DI
    core.step();
    assert!(core.iff1());
    assert!(core.iff2());
    core.step();
    core.step();
    assert!(!core.iff1());
    assert!(!core.iff2());
}

#[test]
fn im_sets_interrupt_mode() {
    let (mut core, mem) = new_core();
    mem.load(0, &[0xED, 0x56, 0xED, 0x5E]); // IM 1 ; IM 2
    core.step();
    assert_eq!(core.im(), 1);
    core.step();
    assert_eq!(core.im(), 2);
}

#[test]
fn retn_restores_iff1_from_iff2() {
    // NMI servicing clears IFF1 but leaves IFF2 untouched; RETN must restore
    // IFF1 from the surviving IFF2 so interrupts resume where they left off.
    let (mut core, mem, ports) = new_core_with_ports();
    mem.load(0, &[0xFB, 0x00]); // EI ; NOP
    mem.load(0x0066, &[0xED, 0x45]); // NMI vector: RETN
    core.step(); // EI -> IFF1=IFF2=true, ei_delay set
    core.step(); // NOP, consumes the EI shadow with no interrupt serviced
    ports.set_nmi(true);
    core.step(); // services the NMI: IFF1 cleared, IFF2 still true, PC=0x0066
    assert!(!core.iff1());
    assert!(core.iff2());
    assert_eq!(core.pc(), 0x0066);
    ports.set_nmi(false);
    core.step(); // RETN
    assert_eq!(core.pc(), 2);
    assert!(core.iff1());
    assert!(core.iff2());
}
