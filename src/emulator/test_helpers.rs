use crate::emulator;
use crate::emulator::Emulator;
use crate::hardware::io_port::BufferedIoPort;
use crate::hardware::memory::Memory;
use crate::hardware::registers::Registers;
use std::cell::RefCell;
use std::rc::Rc;

pub const ORIGIN: u16 = 0x3000;

/// An emulator with a program loaded at `0x3000` and buffered I/O.
pub struct FakeEmulator {
    pub inner: Emulator,
    pub io: Rc<RefCell<BufferedIoPort>>,
}
impl FakeEmulator {
    pub fn new(program_no_header: &[u16]) -> Self {
        let mut program = Vec::with_capacity(program_no_header.len() + 1);
        program.push(ORIGIN);
        program.extend_from_slice(program_no_header);

        let io = Rc::new(RefCell::new(BufferedIoPort::new(b"")));
        let emu = emulator::from_program_words(program.as_slice(), io.clone()).unwrap();
        Self { inner: emu, io }
    }
    pub fn add_stdin_input(&mut self, input: &[u8]) -> &mut Self {
        self.io.borrow_mut().push_input(input);
        self
    }
    pub fn output(&self) -> String {
        self.io.borrow().output_string()
    }
    pub fn get_parts(
        &mut self,
    ) -> (
        &mut Registers,
        &mut Memory,
        &Rc<RefCell<BufferedIoPort>>,
    ) {
        (
            &mut self.inner.registers,
            &mut self.inner.memory,
            &self.io,
        )
    }
}
