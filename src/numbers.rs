/// Implements sign extension as described at [Sign extension](https://en.wikipedia.org/wiki/Sign_extension).
///
/// `bits` holds a two's complement value in its lowest `valid_bits` bits, the result is the
/// same value widened to 16 bits.
#[must_use]
pub const fn sign_extend(bits: u16, valid_bits: u8) -> u16 {
    debug_assert!(valid_bits > 0 && valid_bits < 16);
    let most_significant_bit = (bits >> (valid_bits - 1)) & 1;
    if most_significant_bit == 1 {
        // negative: 1-extend
        bits | (0xFFFF << valid_bits)
    } else {
        // positive, already 0-extended
        bits
    }
}

#[must_use]
pub const fn twos_complement_to_decimal(bin_rep: u16) -> i16 {
    bin_rep.cast_signed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;
    use yare::parameterized;

    #[gtest]
    pub fn test_sign_extend_imm5_all_values() {
        for i in 0..32u16 {
            let expected = if i < 16 { i } else { i | 0xFFE0 };
            expect_that!(sign_extend(i, 5), eq(expected), "imm5: {i}");
        }
    }

    #[parameterized(
        offset6_positive = { 0b01_1111, 6, 31 },
        offset6_negative = { 0b10_0000, 6, -32 },
        offset9_minus_one = { 0x1FF, 9, -1 },
        offset9_minus_sixteen = { 0x1F0, 9, -16 },
        offset11_positive = { 0x010, 11, 16 },
        offset11_negative = { 0x7F0, 11, -16 },
    )]
    fn test_sign_extend_offsets(bits: u16, valid_bits: u8, expected: i16) {
        assert_that!(
            twos_complement_to_decimal(sign_extend(bits, valid_bits)),
            eq(expected)
        );
    }

    #[gtest]
    pub fn test_twos_complement_to_decimal() {
        expect_that!(twos_complement_to_decimal(0x7FFF), eq(i16::MAX));
        expect_that!(twos_complement_to_decimal(0x8000), eq(i16::MIN));
        expect_that!(twos_complement_to_decimal(0xFFFE), eq(-2));
        expect_that!(twos_complement_to_decimal(0), eq(0));
    }
}
