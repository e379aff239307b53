//! A cycle-approximate Zilog Z80 interpreter core.
//!
//! `z80core` owns the register file and instruction decoder. It never
//! assumes anything about the machine it's embedded in: memory, I/O ports,
//! and diagnostic logging are supplied by the host through the traits in
//! [`bus`]. See [`core::Core`] for the entry point.

pub mod bus;
pub mod core;
pub mod cpu;
pub mod error;
pub mod pacer;

pub mod prelude {
    pub use crate::bus::{Logger, Memory, NullLogger, Port};
    pub use crate::core::{Core, CoreBuilder};
    pub use crate::cpu::{Flag, IndexMode, Registers, Z80State};
    pub use crate::error::CoreError;
    pub use crate::pacer::{Clock, Pacer, SystemClock};
}
