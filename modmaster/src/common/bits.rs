pub(crate) fn num_bytes_for_bits(count: u16) -> usize {
    (count as usize + 7) / 8
}

pub(crate) fn num_bytes_for_registers(count: u16) -> usize {
    2 * (count as usize)
}

/// packs the bits 8 per byte, least significant bit first
pub(crate) fn pack_bits(bits: &[bool]) -> impl Iterator<Item = u8> + '_ {
    bits.chunks(8).map(|chunk| {
        chunk
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, bit)| if *bit { acc | (1 << i) } else { acc })
    })
}

pub(crate) fn unpack_bits(bytes: &[u8], count: u16) -> impl Iterator<Item = bool> + '_ {
    (0..count as usize).map(move |pos| {
        bytes
            .get(pos / 8)
            .map(|byte| byte & (1 << (pos % 8)) != 0)
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calculates_number_of_bytes_needed_for_count_of_packed_bits() {
        assert_eq!(num_bytes_for_bits(7), 1);
        assert_eq!(num_bytes_for_bits(8), 1);
        assert_eq!(num_bytes_for_bits(9), 2);
        assert_eq!(num_bytes_for_bits(15), 2);
        assert_eq!(num_bytes_for_bits(16), 2);
        assert_eq!(num_bytes_for_bits(17), 3);
        assert_eq!(num_bytes_for_bits(0xFFFF), 8192); // ensure that it's free from overflow
    }

    #[test]
    fn packs_low_order_bits_first() {
        let bits = [true, false, true, true, false, false, true, true, true, false];
        let packed: Vec<u8> = pack_bits(&bits).collect();
        assert_eq!(packed, vec![0xCD, 0x01]);
    }

    #[test]
    fn unpacks_only_the_requested_count() {
        let bits: Vec<bool> = unpack_bits(&[0x03], 3).collect();
        assert_eq!(bits, vec![true, true, false]);
    }
}
