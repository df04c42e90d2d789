use crate::errors::ExecutionError;
use crate::numbers;
use std::fmt::{Debug, Formatter};

/// Wrapper for LC-3 u16 instruction.
/// format is: `OOOO_DDD_P_PPPP_PPPP`
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Instruction(u16);

impl Instruction {
    /// Gives the value of only the specified bit range.
    ///
    /// # Parameters
    /// - `from`: starting index
    /// - `to`: end index (inclusive), mut be greater or equal to `from`
    ///
    /// # Panics
    /// - asserts that to is greater or equal from and both are valid indexes
    #[must_use]
    pub fn get_bit_range(self, from: u8, to: u8) -> u16 {
        debug_assert!(
            to >= from,
            "wrong direction of from: {from:?} and to: {to:?}"
        );
        debug_assert!(
            (0..u16::BITS).contains(&u32::from(to)),
            "index: {to:?} to u16 is greater than maximum value {:?}",
            u16::BITS - 1
        );
        // widened so that a full 16 bit range does not overflow the mask
        let mask = (1u32 << (to - from + 1)) - 1;
        #[expect(clippy::cast_possible_truncation, reason = "mask has at most 16 bits")]
        let value = (u32::from(self.0 >> from) & mask) as u16;
        value
    }
    /// Gives the value of a bit range of at most 8 bits as u8.
    /// See [`Instruction::get_bit_range()`]
    #[must_use]
    pub fn get_bit_range_u8(self, from: u8, to: u8) -> u8 {
        debug_assert!(to - from < 8, "range {from}..={to} does not fit into u8");
        self.get_bit_range(from, to).to_le_bytes()[0]
    }
    #[must_use]
    pub fn get_bit(self, index: u8) -> bool {
        self.get_bit_range(index, index) & 1 != 0
    }
    #[must_use]
    pub fn op_code(self) -> u8 {
        self.get_bit_range_u8(12, 15)
    }
    #[must_use]
    pub fn dr_number(self) -> u8 {
        self.get_bit_range_u8(9, 11)
    }
    #[must_use]
    pub fn sr1_number(self) -> u8 {
        self.get_bit_range_u8(6, 8)
    }
    #[must_use]
    pub fn sr2_number(self) -> u8 {
        self.get_bit_range_u8(0, 2)
    }
    #[must_use]
    pub fn is_immediate(self) -> bool {
        self.get_bit(5)
    }
    #[must_use]
    pub fn get_immediate(self) -> u16 {
        numbers::sign_extend(self.get_bit_range(0, 4), 5)
    }
    /// Sign extended offset in the lowest `len` bits.
    /// Can be positive or negative.
    #[must_use]
    pub fn pc_offset(self, len: u8) -> i16 {
        numbers::twos_complement_to_decimal(numbers::sign_extend(
            self.get_bit_range(0, len - 1),
            len,
        ))
    }
    #[must_use]
    pub fn trap_vector(self) -> u8 {
        self.get_bit_range_u8(0, 7)
    }
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Decodes the instruction into its operation with all operand fields extracted.
    ///
    /// # Errors
    /// - [`ExecutionError::UnknownOpcode`] for the reserved opcode `1101`
    pub fn decode(self) -> Result<Operation, ExecutionError> {
        let unknown = ExecutionError::UnknownOpcode {
            instruction: self.0,
        };
        let op_code = Opcode::n(self.op_code()).ok_or_else(|| unknown.clone())?;
        let operand = || {
            if self.is_immediate() {
                Operand::Immediate(self.get_immediate())
            } else {
                Operand::Register(self.sr2_number())
            }
        };
        Ok(match op_code {
            Opcode::Br => Operation::Br {
                nzp: self.get_bit_range(9, 11),
                pc_offset: self.pc_offset(9),
            },
            Opcode::Add => Operation::Add {
                dr: self.dr_number(),
                sr1: self.sr1_number(),
                operand: operand(),
            },
            Opcode::Ld => Operation::Ld {
                dr: self.dr_number(),
                pc_offset: self.pc_offset(9),
            },
            Opcode::St => Operation::St {
                sr: self.dr_number(),
                pc_offset: self.pc_offset(9),
            },
            Opcode::Jsr => Operation::Jsr {
                target: if self.get_bit(11) {
                    JumpTarget::PcOffset(self.pc_offset(11))
                } else {
                    JumpTarget::BaseRegister(self.sr1_number())
                },
            },
            Opcode::And => Operation::And {
                dr: self.dr_number(),
                sr1: self.sr1_number(),
                operand: operand(),
            },
            Opcode::Ldr => Operation::Ldr {
                dr: self.dr_number(),
                base_r: self.sr1_number(),
                offset: self.pc_offset(6),
            },
            Opcode::Str => Operation::Str {
                sr: self.dr_number(),
                base_r: self.sr1_number(),
                offset: self.pc_offset(6),
            },
            Opcode::Rti => Operation::Rti,
            Opcode::Not => Operation::Not {
                dr: self.dr_number(),
                sr: self.sr1_number(),
            },
            Opcode::Ldi => Operation::Ldi {
                dr: self.dr_number(),
                pc_offset: self.pc_offset(9),
            },
            Opcode::Sti => Operation::Sti {
                sr: self.dr_number(),
                pc_offset: self.pc_offset(9),
            },
            Opcode::Jmp => Operation::Jmp {
                base_r: self.sr1_number(),
            },
            Opcode::Res => return Err(unknown),
            Opcode::Lea => Operation::Lea {
                dr: self.dr_number(),
                pc_offset: self.pc_offset(9),
            },
            Opcode::Trap => Operation::Trap {
                vector: self.trap_vector(),
            },
        })
    }
}

impl Debug for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Op: {:04b}, DR: {:03b}, PC_Off: {:09b}",
            self.op_code(),
            self.dr_number(),
            self.get_bit_range(0, 8)
        )
    }
}

impl From<u16> for Instruction {
    fn from(bits: u16) -> Self {
        Self(bits)
    }
}

/// The 16 values of the opcode field, bits `[15:12]`.
#[repr(u8)]
#[derive(enumn::N, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Br = 0b0000,
    Add = 0b0001,
    Ld = 0b0010,
    St = 0b0011,
    Jsr = 0b0100,
    And = 0b0101,
    Ldr = 0b0110,
    Str = 0b0111,
    /// Return from interrupt, used to stop the machine.
    Rti = 0b1000,
    Not = 0b1001,
    Ldi = 0b1010,
    Sti = 0b1011,
    Jmp = 0b1100,
    /// Reserved, not a valid instruction.
    Res = 0b1101,
    Lea = 0b1110,
    Trap = 0b1111,
}

/// Second operand of ADD and AND.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Register(u8),
    /// Sign extended `imm5`.
    Immediate(u16),
}

/// Target of JSR (PC relative) and JSRR (base register).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpTarget {
    PcOffset(i16),
    BaseRegister(u8),
}

/// A decoded instruction, one variant per valid opcode.
///
/// Register fields are indexes 0..=7, offsets are already sign extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Br { nzp: u16, pc_offset: i16 },
    Add { dr: u8, sr1: u8, operand: Operand },
    Ld { dr: u8, pc_offset: i16 },
    St { sr: u8, pc_offset: i16 },
    Jsr { target: JumpTarget },
    And { dr: u8, sr1: u8, operand: Operand },
    Ldr { dr: u8, base_r: u8, offset: i16 },
    Str { sr: u8, base_r: u8, offset: i16 },
    Rti,
    Not { dr: u8, sr: u8 },
    Ldi { dr: u8, pc_offset: i16 },
    Sti { sr: u8, pc_offset: i16 },
    Jmp { base_r: u8 },
    Lea { dr: u8, pc_offset: i16 },
    Trap { vector: u8 },
}
