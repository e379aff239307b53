//! External collaborator contracts: memory, I/O ports, and diagnostic logging.
//!
//! None of these are implemented by this crate — a host supplies concrete
//! types (a flat 64 KiB array, a memory-mapped ROM/RAM overlay, an arcade
//! I/O board, a disassembly window) and hands them to [`crate::core::Core`].

/// Byte-addressable 64 KiB memory space.
///
/// Implementations MAY silently ignore writes below a ROM boundary; the core
/// does not distinguish "ignored" from "applied" and never inspects memory
/// contents except through `read`/`write`.
pub trait Memory {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, value: u8);

    /// Little-endian 16-bit composite read. Default composes two `read` calls.
    fn read16(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr);
        let hi = self.read(addr.wrapping_add(1));
        ((hi as u16) << 8) | lo as u16
    }

    /// Little-endian 16-bit composite write. Default composes two `write` calls.
    fn write16(&mut self, addr: u16, value: u16) {
        self.write(addr, value as u8);
        self.write(addr.wrapping_add(1), (value >> 8) as u8);
    }
}

/// 16-bit I/O port space plus the two interrupt lines and the mode-0/2 data byte.
///
/// `nmi`/`int` are polled once per instruction boundary; the core itself does
/// the edge-detection for NMI (see `cpu::decode::Core::poll_interrupts`), so
/// implementers only need to report the instantaneous line level.
pub trait Port {
    fn read_port(&mut self, addr: u16) -> u8;
    fn write_port(&mut self, addr: u16, value: u8);

    /// Non-maskable interrupt line, level-sampled (edge-detected by the core).
    fn nmi(&self) -> bool {
        false
    }

    /// Maskable interrupt line, level-triggered.
    fn int(&self) -> bool {
        false
    }

    /// Byte placed on the data bus at interrupt acknowledge: an `RST p` opcode
    /// in IM 0, or the low byte of the IM 2 vector table index.
    fn data(&self) -> u8 {
        0xFF
    }
}

/// Diagnostic disassembly/trace sink, attached only in diagnostic builds.
///
/// All methods default to no-ops so that a host with no interest in
/// diagnostics (the common case) pays nothing: `NullLogger` compiles away
/// entirely under inlining.
pub trait Logger {
    fn log_mem_read(&mut self, _addr: u16, _value: u8) {}
    fn log(&mut self, _text: &str) {}
    fn reg_name_8(&self, _idx: u8) -> &'static str {
        ""
    }
    fn reg_name_16(&self, _idx: u8) -> &'static str {
        ""
    }
}

/// Zero-cost logger for hosts that don't attach diagnostics.
pub struct NullLogger;

impl Logger for NullLogger {}
