//! # LC-3 Simulator.
//!
//! `lc3-sim` executes binary images for the LC-3 teaching computer.
//! Usage starts with loading a program via [`emulator::from_program`] or
//! [`emulator::from_program_words`], which take the character I/O port the machine talks to.
//!
//!  # Example
//! ```
//! use lc3_sim::emulator;
//! use lc3_sim::hardware::io_port::BufferedIoPort;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let io = Rc::new(RefCell::new(BufferedIoPort::new(b"")));
//! // .ORIG x3000; LEA R0, #2; PUTS; HALT; "Hi"
//! let image = [0x3000, 0xE002, 0xF022, 0xF025, 0x0048, 0x0069, 0x0000];
//! let mut emu = emulator::from_program_words(&image, io.clone()).unwrap();
//! emu.execute().unwrap();
//! assert_eq!(io.borrow().output_string(), "Hi");
//! ```
//! # Errors
//! - Loading: image is missing the origin word, has an odd byte count or does not fit
//! - Execution: reserved opcode, unknown trap vector, I/O failure or user interrupt

pub mod emulator;
pub mod errors;
pub mod hardware;
pub(crate) mod numbers;
pub mod terminal;
