//! `z80run`: load a flat binary into memory at a given origin and single-step
//! the core through it, printing register state as it goes. A minimal
//! harness for poking at the core from the command line, not a machine.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use z80core::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "z80run", about = "Run a flat Z80 binary against z80core")]
struct Args {
    /// Path to a flat binary image.
    image: PathBuf,

    /// Address to load the image at.
    #[arg(long, value_parser = parse_hex, default_value = "0x0000")]
    origin: u16,

    /// Number of instructions to execute before stopping.
    #[arg(long, default_value_t = 1_000_000)]
    max_steps: u64,

    /// Print register state after every step.
    #[arg(long)]
    trace: bool,
}

fn parse_hex(s: &str) -> Result<u16, std::num::ParseIntError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    u16::from_str_radix(s, 16)
}

struct FlatMemory {
    bytes: Box<[u8; 0x10000]>,
}

impl Memory for FlatMemory {
    fn read(&mut self, addr: u16) -> u8 {
        self.bytes[addr as usize]
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.bytes[addr as usize] = value;
    }
}

/// No interrupts, no I/O devices: `IN` always returns 0xFF, `OUT` is discarded.
struct NullPorts;

impl Port for NullPorts {}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let image = fs::read(&args.image).unwrap_or_else(|err| {
        log::error!("failed to read {}: {err}", args.image.display());
        std::process::exit(1);
    });

    let mut bytes = Box::new([0u8; 0x10000]);
    let origin = args.origin as usize;
    let end = origin + image.len();
    if end > bytes.len() {
        log::error!("image does not fit in 64 KiB at origin 0x{:04X}", args.origin);
        std::process::exit(1);
    }
    bytes[origin..end].copy_from_slice(&image);

    let memory = Box::new(FlatMemory { bytes });
    let ports = Box::new(NullPorts);

    let mut core = Core::builder()
        .memory(memory)
        .ports(ports)
        .build()
        .expect("memory and ports were both supplied");
    core.reset();

    for step_count in 0..args.max_steps {
        if core.halted() {
            log::info!("halted after {step_count} steps");
            break;
        }
        let t_states = core.step();
        if args.trace {
            println!("[{t_states:>2}T] {}", core.dump_state());
        }
    }
}
