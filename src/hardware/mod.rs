//! Machine parts: memory with memory mapped keyboard, register file and the character I/O port.
pub mod io_port;
pub mod memory;
pub mod registers;
