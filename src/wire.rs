//! Little-endian field access shared by the event codec and the historic file format

/// Read an `i32` at `offset`, or `None` when the slice is too short.
pub(crate) fn i32_at(data: &[u8], offset: usize) -> Option<i32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    bytes.try_into().ok().map(i32::from_le_bytes)
}

/// Read a `u32` at `offset`, or `None` when the slice is too short.
pub(crate) fn u32_at(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    bytes.try_into().ok().map(u32::from_le_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_in_bounds() {
        let data = [0x01, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF];
        assert_eq!(i32_at(&data, 0), Some(1));
        assert_eq!(i32_at(&data, 4), Some(-1));
        assert_eq!(u32_at(&data, 4), Some(u32::MAX));
    }

    #[test]
    fn rejects_out_of_bounds() {
        let data = [0u8; 6];
        assert_eq!(i32_at(&data, 4), None);
        assert_eq!(u32_at(&data, usize::MAX), None);
    }
}
