//! Errors for loading and running LC-3 programs.
use std::error::Error;
use std::io;

/// Failures while placing a program image into memory.
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
pub enum LoadProgramError {
    /// Program is missing valid .ORIG header
    ProgramMissingOrigHeader,
    /// Program too long, got {actual_instructions} u16 instructions while limit at origin {origin:#06X} is {maximum_instructions}
    ProgramTooLong {
        origin: u16,
        actual_instructions: usize,
        maximum_instructions: usize,
    },
    /// Program has an odd number of bytes ({byte_count}), expected big-endian u16 words
    ProgramNotWordAligned { byte_count: usize },
    /// Program could not be read: {0}
    ProgramNotReadable(String),
}
impl Error for LoadProgramError {}

/// Fatal conditions surfaced by the execution engine.
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// Reserved opcode in instruction {instruction:#06X}
    UnknownOpcode { instruction: u16 },
    /// Unknown trap vector {vector:#04X}
    UnknownTrapVector { vector: u8 },
    /// Error during reading Stdin or writing program output to Stdout: {0}
    IOInputOutputError(String),
    /// Execution interrupted by user
    Interrupted,
    /// Program did not halt within {steps} instructions
    StepLimitReached { steps: u64 },
}
impl Error for ExecutionError {}

impl From<io::Error> for ExecutionError {
    fn from(error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::Interrupted {
            Self::Interrupted
        } else {
            Self::IOInputOutputError(error.to_string())
        }
    }
}
