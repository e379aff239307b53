//! The assembled CPU: register file plus its three external collaborators.

use crate::bus::{Logger, Memory, NullLogger, Port};
use crate::cpu::registers::Registers;
use crate::cpu::state::Z80State;
use crate::error::CoreError;
use crate::pacer::{Clock, Pacer, SystemClock};

/// A complete, runnable Z80 core.
///
/// `Core` owns the register file and the boxed collaborators it was built
/// with. Everything that touches memory, ports, or the diagnostic log goes
/// through `self.memory`/`self.ports`/`self.logger`; the pure ALU and flag
/// arithmetic lives on [`Registers`] and never sees a `Core` at all.
pub struct Core<C: Clock = SystemClock> {
    pub(crate) regs: Registers,
    pub(crate) memory: Box<dyn Memory>,
    pub(crate) ports: Box<dyn Port>,
    pub(crate) logger: Box<dyn Logger>,
    pub(crate) pacer: Pacer<C>,
    /// Vector byte stashed by [`Core::signal_int`], consulted instead of
    /// `ports.data()` for the next maskable interrupt acknowledge.
    pub(crate) pending_int_vector: Option<u8>,
}

impl Core<SystemClock> {
    /// Construct directly from the two mandatory collaborators, with a
    /// [`NullLogger`] and no real-time pacing. Prefer [`Core::builder`] when
    /// a custom logger is wanted.
    pub fn new(memory: Box<dyn Memory>, ports: Box<dyn Port>) -> Result<Self, CoreError> {
        CoreBuilder::new().memory(memory).ports(ports).build()
    }

    pub fn builder() -> CoreBuilder<SystemClock> {
        CoreBuilder::new()
    }
}

impl<C: Clock> Core<C> {
    pub fn reset(&mut self) {
        self.regs.reset();
    }

    pub fn halted(&self) -> bool {
        self.regs.halted
    }

    pub fn get_state(&self) -> [u8; 28] {
        Z80State::from(&self.regs).to_bytes()
    }

    pub fn dump_state(&self) -> String {
        Z80State::from(&self.regs).dump()
    }

    pub fn enable_real_time_pacing(&mut self, enabled: bool) {
        self.pacer.set_enabled(enabled);
    }

    /// Force the NMI edge-detector to re-arm: the next instance of
    /// `ports.nmi()` returning `true` will be treated as a fresh rising edge
    /// even if the line never dropped low in between.
    pub fn signal_nmi(&mut self) {
        self.regs.nmi_previous = false;
    }

    /// Stash a vector byte to use for the next maskable interrupt instead of
    /// calling `ports.data()`. Convenience for hosts driving IM 0/2 without
    /// a custom `Port` impl; cleared after one use whether or not an
    /// interrupt was actually serviced.
    pub fn signal_int(&mut self, vector_byte: u8) {
        self.pending_int_vector = Some(vector_byte);
    }

    pub fn a(&self) -> u8 {
        self.regs.a
    }
    pub fn f(&self) -> u8 {
        self.regs.f
    }
    pub fn i(&self) -> u8 {
        self.regs.i
    }
    pub fn r(&self) -> u8 {
        self.regs.r
    }
    pub fn iff1(&self) -> bool {
        self.regs.iff1
    }
    pub fn iff2(&self) -> bool {
        self.regs.iff2
    }
    pub fn im(&self) -> u8 {
        self.regs.im
    }
    pub fn bc(&self) -> u16 {
        self.regs.get_bc()
    }
    pub fn de(&self) -> u16 {
        self.regs.get_de()
    }
    pub fn hl(&self) -> u16 {
        self.regs.get_hl()
    }
    pub fn ix(&self) -> u16 {
        self.regs.ix
    }
    pub fn iy(&self) -> u16 {
        self.regs.iy
    }
    pub fn sp(&self) -> u16 {
        self.regs.sp
    }
    pub fn pc(&self) -> u16 {
        self.regs.pc
    }

    /// Overwrite the entire register file, including shadow registers and
    /// the undocumented hidden state (`memptr`, `q`, `p`, `ei_delay`).
    /// Exists for test harnesses that replay a captured CPU snapshot (see
    /// the single-step corpus test) rather than driving state through
    /// instruction execution.
    pub fn load_registers(&mut self, regs: Registers) {
        self.regs = regs;
    }

    pub fn registers(&self) -> &Registers {
        &self.regs
    }
}

/// Builder for [`Core`], since the two bus collaborators are mandatory but
/// Rust has no natural "required-but-set-later" constructor shape.
pub struct CoreBuilder<C: Clock = SystemClock> {
    memory: Option<Box<dyn Memory>>,
    ports: Option<Box<dyn Port>>,
    logger: Option<Box<dyn Logger>>,
    clock: C,
}

impl CoreBuilder<SystemClock> {
    pub fn new() -> Self {
        Self {
            memory: None,
            ports: None,
            logger: None,
            clock: SystemClock,
        }
    }
}

impl Default for CoreBuilder<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> CoreBuilder<C> {
    pub fn memory(mut self, memory: Box<dyn Memory>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn ports(mut self, ports: Box<dyn Port>) -> Self {
        self.ports = Some(ports);
        self
    }

    pub fn logger(mut self, logger: Box<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Swap the clock source, for tests that drive the pacer deterministically.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> CoreBuilder<C2> {
        CoreBuilder {
            memory: self.memory,
            ports: self.ports,
            logger: self.logger,
            clock,
        }
    }

    pub fn build(self) -> Result<Core<C>, CoreError> {
        let memory = self.memory.ok_or(CoreError::MissingMemory)?;
        let ports = self.ports.ok_or(CoreError::MissingPorts)?;
        let logger = self.logger.unwrap_or_else(|| Box::new(NullLogger));
        Ok(Core {
            regs: Registers::new(),
            memory,
            ports,
            logger,
            pacer: Pacer::with_clock(self.clock),
            pending_int_vector: None,
        })
    }
}
