use crate::errors::ExecutionError;
use crate::hardware::io_port::IoPort;
use crate::hardware::memory::Memory;
use crate::hardware::registers::{Registers, from_binary};
use log::debug;
use std::cell::RefCell;
use std::ops::ControlFlow;

/// Trap vectors of the built-in routines, the low byte of a TRAP instruction.
#[repr(u8)]
#[derive(enumn::N, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapVector {
    GetC = 0x20,
    Out = 0x21,
    PutS = 0x22,
    In = 0x23,
    PutSp = 0x24,
    Halt = 0x25,
}

/// Runs the trap routine selected by `vector`.
///
/// Returns [`ControlFlow::Break`] for HALT. Trap routines never touch the condition flag.
///
/// # Errors
/// - [`ExecutionError::UnknownTrapVector`] if `vector` selects no routine
/// - the I/O port failed or was interrupted
pub fn execute(
    vector: u8,
    regs: &mut Registers,
    mem: &Memory,
    io: &RefCell<dyn IoPort>,
) -> Result<ControlFlow<()>, ExecutionError> {
    let trap = TrapVector::n(vector).ok_or(ExecutionError::UnknownTrapVector { vector })?;
    debug!("TRAP {trap:?}");
    let mut io = io.borrow_mut();
    match trap {
        TrapVector::GetC => get_c(regs, &mut *io)?,
        TrapVector::Out => out(regs, &mut *io)?,
        TrapVector::PutS => put_s(regs, mem, &mut *io)?,
        TrapVector::In => in_trap(regs, &mut *io)?,
        TrapVector::PutSp => put_sp(regs, mem, &mut *io)?,
        TrapVector::Halt => return Ok(halt()),
    }
    Ok(ControlFlow::Continue(()))
}

/// GETC: Read a single character from the keyboard. The character is not echoed onto the console.
///
/// Its ASCII code is copied into R0. The high eight bits of R0 are cleared.
///
/// # Errors
/// - reading failed or was interrupted
pub fn get_c(regs: &mut Registers, io: &mut dyn IoPort) -> Result<(), ExecutionError> {
    let c = io.read_char()?;
    regs.set(0, from_binary(u16::from(c)));
    Ok(())
}

/// IN: Read a single character like 0x20 GETC. Echo and prompt are left to the [`IoPort`].
///
/// # Errors
/// - reading failed or was interrupted
pub fn in_trap(regs: &mut Registers, io: &mut dyn IoPort) -> Result<(), ExecutionError> {
    get_c(regs, io)
}

/// OUT: Write a character in R0[7:0] to the console display.
///
/// # Errors
/// - writing failed
pub fn out(regs: &Registers, io: &mut dyn IoPort) -> Result<(), ExecutionError> {
    let [low, _high] = regs.get(0).as_binary().to_le_bytes();
    io.write_char(low)?;
    io.flush()?;
    Ok(())
}

fn put_one_char_per_u16(input: u16, io: &mut dyn IoPort) -> std::io::Result<()> {
    let [low, _high] = input.to_le_bytes();
    io.write_char(low)
}

fn put_two_chars_per_u16(input: u16, io: &mut dyn IoPort) -> std::io::Result<()> {
    let [low, high] = input.to_le_bytes();
    io.write_char(low)?;
    if high != 0 {
        io.write_char(high)?;
    }
    Ok(())
}

fn put(
    regs: &Registers,
    mem: &Memory,
    io: &mut dyn IoPort,
    handle_char: fn(u16, &mut dyn IoPort) -> std::io::Result<()>,
) -> Result<(), ExecutionError> {
    let mut address = regs.get(0).as_binary();
    while mem[address] != 0 {
        handle_char(mem[address], io)?;
        address = address.wrapping_add(1);
    }
    io.flush()?;
    Ok(())
}

/// PUTS: print null-delimited string from register 0's address, one character per cell.
///
/// # Errors
/// - writing failed
pub fn put_s(regs: &Registers, mem: &Memory, io: &mut dyn IoPort) -> Result<(), ExecutionError> {
    put(regs, mem, io, put_one_char_per_u16)
}

/// PUTSP: Packed version of PUTS
///
/// The ASCII code contained in bits [7:0] of a memory location is written to the console first.
/// The second character of the last memory location can be 0x00.
/// Writing terminates with a 0x0000 cell.
///
/// # Errors
/// - writing failed
pub fn put_sp(regs: &Registers, mem: &Memory, io: &mut dyn IoPort) -> Result<(), ExecutionError> {
    put(regs, mem, io, put_two_chars_per_u16)
}

/// HALT: End program.
#[must_use]
pub const fn halt() -> ControlFlow<()> {
    ControlFlow::Break(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::test_helpers::FakeEmulator;
    use crate::hardware::io_port::BufferedIoPort;
    use crate::hardware::registers::ConditionFlag;
    use googletest::prelude::*;

    #[gtest]
    pub fn test_get_c() {
        let mut io = BufferedIoPort::new(b"a");
        let mut regs = Registers::new();
        regs.set(0, from_binary(0xFF00));
        get_c(&mut regs, &mut io).unwrap();
        expect_that!(regs.get(0).as_binary(), eq(u16::from(b'a')));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Zero));
        expect_that!(io.output_string(), eq(""));
    }
    #[gtest]
    pub fn test_get_c_read_error() {
        let mut io = BufferedIoPort::new(b"");
        let mut regs = Registers::new();
        let execution_error = get_c(&mut regs, &mut io).unwrap_err();
        assert_that!(
            execution_error.to_string(),
            eq("Error during reading Stdin or writing program output to Stdout: No input available")
        );
    }
    #[gtest]
    pub fn test_in() {
        let mut io = BufferedIoPort::new(b"abc");
        let mut regs = Registers::new();
        in_trap(&mut regs, &mut io).unwrap();
        expect_that!(regs.get(0).as_binary(), eq(u16::from(b'a')));
        expect_that!(io.output_string(), eq(""));
    }
    #[gtest]
    pub fn test_out() {
        let mut io = BufferedIoPort::new(b"");
        let mut regs = Registers::new();
        regs.set(0, from_binary(0x4200 | u16::from(b'k')));
        out(&regs, &mut io).unwrap();
        assert_that!(io.output_string(), eq("k"));
    }
    #[gtest]
    pub fn test_put_s() {
        let data = [0x0048u16, 0x0069, 0x0021, 0x0000, 0x0041];
        let mut emu = FakeEmulator::new(&data);
        let (regs, mem, io) = emu.get_parts();
        regs.set(0, from_binary(0x3000));
        put_s(regs, mem, &mut *io.borrow_mut()).unwrap();
        assert_that!(io.borrow().output_string(), eq("Hi!"));
    }
    #[gtest]
    pub fn test_put_s_wraps_at_end_of_memory() {
        let mut emu = FakeEmulator::new(&[]);
        let (regs, mem, io) = emu.get_parts();
        mem.write(0xFFFE, u16::from(b'a'));
        mem.write(0xFFFF, u16::from(b'b'));
        mem.write(0x0000, u16::from(b'c'));
        mem.write(0x0001, 0);
        regs.set(0, from_binary(0xFFFE));
        put_s(regs, mem, &mut *io.borrow_mut()).unwrap();
        assert_that!(io.borrow().output_string(), eq("abc"));
    }
    #[gtest]
    pub fn test_put_s_across_keyboard_status_keeps_input() {
        let mut emu = FakeEmulator::new(&[]);
        emu.add_stdin_input(b"q");
        let (regs, mem, io) = emu.get_parts();
        mem.write(0xFDFF, u16::from(b'x'));
        mem.write(0xFE00, u16::from(b'y'));
        mem.write(0xFE01, 0);
        regs.set(0, from_binary(0xFDFF));
        put_s(regs, mem, &mut *io.borrow_mut()).unwrap();
        expect_that!(io.borrow().output_string(), eq("xy"));
        expect_that!(io.borrow_mut().poll_input().unwrap(), eq(true));
        expect_that!(io.borrow_mut().read_char().unwrap(), eq(b'q'));
    }
    #[gtest]
    pub fn test_put_sp() {
        let data = [
            0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF, 0x6548u16, 0x6c6c, 0x206f, 0x6f57, 0x6c72,
            0x2164, 0x0000,
        ];
        let mut emu = FakeEmulator::new(&data);
        let (regs, mem, io) = emu.get_parts();
        regs.set(0, from_binary(0x3005));
        put_sp(regs, mem, &mut *io.borrow_mut()).unwrap();
        assert_that!(io.borrow().output_string(), eq("Hello World!"));
    }
    #[gtest]
    pub fn test_put_sp_odd_length() {
        let data = [0x6948u16, 0x0021, 0x0000];
        let mut emu = FakeEmulator::new(&data);
        let (regs, mem, io) = emu.get_parts();
        regs.set(0, from_binary(0x3000));
        put_sp(regs, mem, &mut *io.borrow_mut()).unwrap();
        assert_that!(io.borrow().output_string(), eq("Hi!"));
    }
    #[gtest]
    pub fn test_execute_halt_breaks() {
        let mut emu = FakeEmulator::new(&[]);
        let (regs, mem, io) = emu.get_parts();
        let res = execute(0x25, regs, mem, &**io).unwrap();
        expect_that!(res.is_break(), eq(true));
        let res = execute(0x21, regs, mem, &**io).unwrap();
        expect_that!(res.is_continue(), eq(true));
    }
    #[gtest]
    pub fn test_execute_unknown_vector() {
        let mut emu = FakeEmulator::new(&[]);
        let (regs, mem, io) = emu.get_parts();
        let err = execute(0x26, regs, mem, &**io).unwrap_err();
        expect_that!(err, eq(&ExecutionError::UnknownTrapVector { vector: 0x26 }));
    }
}
