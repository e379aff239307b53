use std::cell::RefCell;
use std::rc::Rc;

use z80core::prelude::*;

/// Shared 64 KiB RAM: the test keeps one handle to poke/inspect bytes while
/// the `Core` owns a clone wrapping the same buffer.
#[derive(Clone)]
pub struct SharedMemory(Rc<RefCell<[u8; 0x10000]>>);

impl SharedMemory {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new([0u8; 0x10000])))
    }

    pub fn load(&self, origin: u16, bytes: &[u8]) {
        let mut ram = self.0.borrow_mut();
        for (i, b) in bytes.iter().enumerate() {
            ram[origin as usize + i] = *b;
        }
    }

    pub fn peek(&self, addr: u16) -> u8 {
        self.0.borrow()[addr as usize]
    }
}

impl Memory for SharedMemory {
    fn read(&mut self, addr: u16) -> u8 {
        self.0.borrow()[addr as usize]
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.0.borrow_mut()[addr as usize] = value;
    }
}

/// Test double for the port space: pre-load expected reads, record writes,
/// and drive the interrupt lines explicitly.
#[derive(Default)]
pub struct TestPorts {
    pub writes: Vec<(u16, u8)>,
    pub reads: Vec<u16>,
    pub read_value: u8,
    pub nmi_line: bool,
    pub int_line: bool,
    pub data_byte: u8,
}

impl Port for TestPorts {
    fn read_port(&mut self, addr: u16) -> u8 {
        self.reads.push(addr);
        self.read_value
    }

    fn write_port(&mut self, addr: u16, value: u8) {
        self.writes.push((addr, value));
    }

    fn nmi(&self) -> bool {
        self.nmi_line
    }

    fn int(&self) -> bool {
        self.int_line
    }

    fn data(&self) -> u8 {
        self.data_byte
    }
}

/// Shared handle to a [`TestPorts`], so a test can flip `nmi_line`/`int_line`
/// after the `Core` already owns its boxed copy.
#[derive(Clone, Default)]
pub struct SharedPorts(Rc<RefCell<TestPorts>>);

impl SharedPorts {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(TestPorts::default())))
    }

    pub fn set_nmi(&self, level: bool) {
        self.0.borrow_mut().nmi_line = level;
    }

    pub fn set_int(&self, level: bool, data_byte: u8) {
        let mut p = self.0.borrow_mut();
        p.int_line = level;
        p.data_byte = data_byte;
    }

    pub fn writes(&self) -> Vec<(u16, u8)> {
        self.0.borrow().writes.clone()
    }

    pub fn set_read_value(&self, value: u8) {
        self.0.borrow_mut().read_value = value;
    }
}

impl Port for SharedPorts {
    fn read_port(&mut self, addr: u16) -> u8 {
        self.0.borrow_mut().read_port(addr)
    }

    fn write_port(&mut self, addr: u16, value: u8) {
        self.0.borrow_mut().write_port(addr, value);
    }

    fn nmi(&self) -> bool {
        self.0.borrow().nmi_line
    }

    fn int(&self) -> bool {
        self.0.borrow().int_line
    }

    fn data(&self) -> u8 {
        self.0.borrow().data_byte
    }
}

/// A core over shared RAM and the port test double, with real-time pacing
/// left off (the default) so tests run instantly. Returns the memory handle
/// alongside the core so the test can load a program and inspect results.
pub fn new_core() -> (Core, SharedMemory) {
    let memory = SharedMemory::new();
    let mut core = Core::builder()
        .memory(Box::new(memory.clone()))
        .ports(Box::new(TestPorts::default()))
        .build()
        .expect("memory and ports were both supplied");
    core.reset();
    (core, memory)
}

/// As [`new_core`], but also hands back a [`SharedPorts`] handle so the test
/// can assert interrupt lines after construction.
pub fn new_core_with_ports() -> (Core, SharedMemory, SharedPorts) {
    let memory = SharedMemory::new();
    let ports = SharedPorts::new();
    let mut core = Core::builder()
        .memory(Box::new(memory.clone()))
        .ports(Box::new(ports.clone()))
        .build()
        .expect("memory and ports were both supplied");
    core.reset();
    (core, memory, ports)
}
