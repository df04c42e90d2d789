use crate::errors::{ExecutionError, LoadProgramError};
use crate::hardware::io_port::IoPort;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::ops::{Index, IndexMut};
use std::rc::Rc;

/// Number of addressable u16 cells, the full 16-bit address space.
pub const MEMORY_SIZE_U16: usize = 1 << 16;

/// Memory regions mapped to IO functionality.
#[repr(u16)]
#[derive(enumn::N, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryMappedIOLocations {
    /// Keyboard Status Register
    Kbsr = 0xFE00,
    /// Keyboard Data Register
    Kbdr = 0xFE02,
}

/// An abstraction for the LC-3 memory including memory mapped keyboard but excluding registers.
///
/// [`Memory::read`] is the access path of the running program: reading the keyboard status
/// register polls the [`IoPort`] and updates status and data register. Indexing is passive
/// storage access without that side effect.
pub struct Memory {
    /// Index equals memory address
    data: Vec<u16>,
    io: Rc<RefCell<dyn IoPort>>,
}

impl Debug for Memory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let used = self.data.iter().filter(|cell| **cell != 0).count();
        write!(
            f,
            "Memory {{ cells: {}, non-zero cells: {used}, KBSR: {:#06X}, KBDR: {:#06X} }}",
            self.data.len(),
            self[MemoryMappedIOLocations::Kbsr as u16],
            self[MemoryMappedIOLocations::Kbdr as u16]
        )
    }
}

impl Index<u16> for Memory {
    type Output = u16;
    fn index(&self, index: u16) -> &Self::Output {
        &self.data[usize::from(index)]
    }
}
impl IndexMut<u16> for Memory {
    fn index_mut(&mut self, index: u16) -> &mut Self::Output {
        &mut self.data[usize::from(index)]
    }
}

impl Memory {
    pub const KEYBOARD_STATUS_REGISTER_SET: u16 = 1 << 15;
    pub const KEYBOARD_STATUS_REGISTER_UNSET: u16 = 0;

    #[must_use]
    pub fn new(io: Rc<RefCell<dyn IoPort>>) -> Self {
        Self {
            data: vec![0x0u16; MEMORY_SIZE_U16],
            io,
        }
    }

    /// Reads the cell at `address` as the running program does.
    ///
    /// For the keyboard status register the [`IoPort`] is polled first: with a character
    /// available the status register reads `0x8000` and the data register holds the
    /// character, otherwise the status register reads 0.
    ///
    /// # Errors
    /// - polling the [`IoPort`] failed or was interrupted
    pub fn read(&mut self, address: u16) -> Result<u16, ExecutionError> {
        if MemoryMappedIOLocations::n(address) == Some(MemoryMappedIOLocations::Kbsr) {
            self.poll_keyboard()?;
        }
        Ok(self[address])
    }

    pub fn write(&mut self, address: u16, value: u16) {
        self[address] = value;
    }

    fn poll_keyboard(&mut self) -> Result<(), ExecutionError> {
        let input = {
            let mut io = self.io.borrow_mut();
            if io.poll_input()? {
                Some(io.read_char()?)
            } else {
                None
            }
        };
        if let Some(c) = input {
            self[MemoryMappedIOLocations::Kbsr as u16] = Self::KEYBOARD_STATUS_REGISTER_SET;
            self[MemoryMappedIOLocations::Kbdr as u16] = u16::from(c);
        } else {
            self[MemoryMappedIOLocations::Kbsr as u16] = Self::KEYBOARD_STATUS_REGISTER_UNSET;
        }
        Ok(())
    }

    /// Loads a program image: the first word is the origin address, all following words are
    /// placed into consecutive cells starting at that origin.
    ///
    /// Returns the origin.
    ///
    /// # Errors
    /// - Program is missing the origin word
    /// - Program does not fit between origin and the end of the address space
    pub fn load_image(&mut self, image: &[u16]) -> Result<u16, LoadProgramError> {
        let Some((&origin, program)) = image.split_first() else {
            return Err(LoadProgramError::ProgramMissingOrigHeader);
        };
        let start = usize::from(origin);
        let maximum_instructions = MEMORY_SIZE_U16 - start;
        if program.len() > maximum_instructions {
            return Err(LoadProgramError::ProgramTooLong {
                origin,
                actual_instructions: program.len(),
                maximum_instructions,
            });
        }
        self.data[start..start + program.len()].copy_from_slice(program);
        Ok(origin)
    }
}
