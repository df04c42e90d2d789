//! The execution engine: fetch, decode and execute until the program halts.
pub mod instruction;
pub mod opcodes;
#[cfg(test)]
pub(crate) mod test_helpers;
pub mod trap_routines;

use crate::emulator::instruction::{Instruction, Operation};
use crate::errors::{ExecutionError, LoadProgramError};
use crate::hardware::io_port::IoPort;
use crate::hardware::memory::Memory;
use crate::hardware::registers::Registers;
use log::{debug, info, trace};
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::ops::ControlFlow;
use std::path::Path;
use std::rc::Rc;

/// Converts the bytes of an image file, big-endian u16 words, to host words.
///
/// # Errors
/// - odd number of bytes
pub fn words_from_be_bytes(bytes: &[u8]) -> Result<Vec<u16>, LoadProgramError> {
    if bytes.len() % 2 != 0 {
        return Err(LoadProgramError::ProgramNotWordAligned {
            byte_count: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect())
}

/// Reads an image file and creates an emulator ready to execute it.
///
/// # Errors
/// - file cannot be read
/// - see [`words_from_be_bytes`] and [`Emulator::load_program`]
pub fn from_program(
    path: impl AsRef<Path>,
    io: Rc<RefCell<dyn IoPort>>,
) -> Result<Emulator, LoadProgramError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| {
        LoadProgramError::ProgramNotReadable(format!("{}: {e}", path.display()))
    })?;
    from_program_words(&words_from_be_bytes(&bytes)?, io)
}

/// Creates an emulator from an image already converted to host words, origin first.
///
/// # Errors
/// - see [`Emulator::load_program`]
pub fn from_program_words(
    image: &[u16],
    io: Rc<RefCell<dyn IoPort>>,
) -> Result<Emulator, LoadProgramError> {
    let mut emu = Emulator::new(io);
    emu.load_program(image)?;
    Ok(emu)
}

/// The public facing emulator used to run LC-3 programs.
///
/// Owns the complete machine state, memory and registers, so any number of independent
/// machines can exist side by side.
pub struct Emulator {
    pub(crate) memory: Memory,
    pub(crate) registers: Registers,
    io: Rc<RefCell<dyn IoPort>>,
    origin: u16,
    halted: bool,
    executed_instructions: u64,
}

impl Debug for Emulator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emulator")
            .field("registers", &self.registers)
            .field("memory", &self.memory)
            .field("halted", &self.halted)
            .field("executed_instructions", &self.executed_instructions)
            .finish_non_exhaustive()
    }
}

impl Emulator {
    /// Creates a machine with zeroed memory and registers in power-on state.
    #[must_use]
    pub fn new(io: Rc<RefCell<dyn IoPort>>) -> Self {
        let registers = Registers::new();
        Self {
            memory: Memory::new(io.clone()),
            origin: registers.pc().as_binary(),
            registers,
            io,
            halted: false,
            executed_instructions: 0,
        }
    }

    /// Loads a program image (origin word first) and points the PC at its origin.
    ///
    /// # Errors
    /// - Program is missing the origin word
    /// - Program does not fit into memory at its origin
    pub fn load_program(&mut self, image: &[u16]) -> Result<u16, LoadProgramError> {
        let origin = self.load_image(image)?;
        self.origin = origin;
        self.registers.set_pc(origin);
        Ok(origin)
    }

    /// Loads an additional image (origin word first) without touching the registers.
    ///
    /// # Errors
    /// - see [`Emulator::load_program`]
    pub fn load_image(&mut self, image: &[u16]) -> Result<u16, LoadProgramError> {
        let origin = self.memory.load_image(image)?;
        debug!(
            "Loaded {} words at {origin:#06X}",
            image.len().saturating_sub(1)
        );
        Ok(origin)
    }

    /// Puts the registers back to power-on state with the PC at the program origin and
    /// clears the halt signal. Memory is kept.
    pub fn reset_registers(&mut self) {
        self.registers = Registers::new();
        self.registers.set_pc(self.origin);
        self.halted = false;
        self.executed_instructions = 0;
    }

    #[must_use]
    pub const fn registers(&self) -> &Registers {
        &self.registers
    }
    pub const fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }
    pub const fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }
    #[must_use]
    pub const fn executed_instructions(&self) -> u64 {
        self.executed_instructions
    }

    /// Runs until the program halts.
    ///
    /// # Errors
    /// - reserved opcode or unknown trap vector
    /// - I/O failed or the user interrupted
    pub fn execute(&mut self) -> Result<(), ExecutionError> {
        while self.step()?.is_continue() {}
        Ok(())
    }

    /// Runs until the program halts, but for at most `max_steps` instructions.
    ///
    /// # Errors
    /// - [`ExecutionError::StepLimitReached`] if the program is still running afterwards
    /// - see [`Emulator::execute`]
    pub fn execute_with_limit(&mut self, max_steps: u64) -> Result<(), ExecutionError> {
        for _ in 0..max_steps {
            if self.step()?.is_break() {
                return Ok(());
            }
        }
        if self.halted {
            Ok(())
        } else {
            Err(ExecutionError::StepLimitReached { steps: max_steps })
        }
    }

    /// Executes one instruction: fetch at PC, increment PC, decode and execute.
    ///
    /// Returns [`ControlFlow::Break`] once the machine is halted, a halted machine does not
    /// fetch anymore. On a decode error no register is changed.
    ///
    /// # Errors
    /// - see [`Emulator::execute`]
    pub fn step(&mut self) -> Result<ControlFlow<()>, ExecutionError> {
        if self.halted {
            return Ok(ControlFlow::Break(()));
        }
        let pc = self.registers.pc().as_binary();
        let instruction = Instruction::from(self.memory.read(pc)?);
        let operation = instruction.decode()?;
        trace!("{pc:#06X}: {:#06X} {operation:?}", instruction.raw());
        self.registers.set_pc(pc.wrapping_add(1));
        self.executed_instructions += 1;

        let flow = self.execute_operation(operation)?;
        if flow.is_break() {
            self.halted = true;
            info!(
                "Program halted after {} instructions",
                self.executed_instructions
            );
        }
        Ok(flow)
    }

    fn execute_operation(
        &mut self,
        operation: Operation,
    ) -> Result<ControlFlow<()>, ExecutionError> {
        let r = &mut self.registers;
        let mem = &mut self.memory;
        match operation {
            Operation::Br { nzp, pc_offset } => opcodes::br(nzp, pc_offset, r),
            Operation::Add { dr, sr1, operand } => opcodes::add(dr, sr1, operand, r),
            Operation::Ld { dr, pc_offset } => opcodes::ld(dr, pc_offset, r, mem)?,
            Operation::St { sr, pc_offset } => opcodes::st(sr, pc_offset, r, mem),
            Operation::Jsr { target } => opcodes::jsr(target, r),
            Operation::And { dr, sr1, operand } => opcodes::and(dr, sr1, operand, r),
            Operation::Ldr { dr, base_r, offset } => opcodes::ldr(dr, base_r, offset, r, mem)?,
            Operation::Str { sr, base_r, offset } => opcodes::str(sr, base_r, offset, r, mem),
            Operation::Rti => return Ok(ControlFlow::Break(())),
            Operation::Not { dr, sr } => opcodes::not(dr, sr, r),
            Operation::Ldi { dr, pc_offset } => opcodes::ldi(dr, pc_offset, r, mem)?,
            Operation::Sti { sr, pc_offset } => opcodes::sti(sr, pc_offset, r, mem)?,
            Operation::Jmp { base_r } => opcodes::jmp_or_ret(base_r, r),
            Operation::Lea { dr, pc_offset } => opcodes::lea(dr, pc_offset, r),
            Operation::Trap { vector } => {
                return trap_routines::execute(vector, r, mem, &self.io);
            }
        }
        Ok(ControlFlow::Continue(()))
    }
}
