//! Bounded cursor helpers for hand-rolled binary formats.
//!
//! Readers take a `current` offset that they advance past what they consume,
//! and fail with [`SanitizeError::IndexOutOfBounds`] instead of panicking
//! when the buffer is too short. Reads of fixed-size typed data return
//! borrowed views into the buffer.

use {
    crate::{address::Address, sanitize::SanitizeError},
    std::mem::size_of,
};

pub fn append_u16(buf: &mut Vec<u8>, data: u16) {
    buf.extend_from_slice(&data.to_le_bytes());
}

pub fn append_u8(buf: &mut Vec<u8>, data: u8) {
    buf.push(data);
}

pub fn append_slice(buf: &mut Vec<u8>, data: &[u8]) {
    buf.extend_from_slice(data);
}

pub fn read_u8(current: &mut usize, data: &[u8]) -> Result<u8, SanitizeError> {
    let byte = *data
        .get(*current)
        .ok_or(SanitizeError::IndexOutOfBounds)?;
    *current = current.saturating_add(1);
    Ok(byte)
}

pub fn read_u16(current: &mut usize, data: &[u8]) -> Result<u16, SanitizeError> {
    let end = current
        .checked_add(size_of::<u16>())
        .ok_or(SanitizeError::IndexOutOfBounds)?;
    let range = data
        .get(*current..end)
        .ok_or(SanitizeError::IndexOutOfBounds)?;
    let mut fixed_data = [0u8; size_of::<u16>()];
    fixed_data.copy_from_slice(range);
    *current = end;
    Ok(u16::from_le_bytes(fixed_data))
}

pub fn read_address<'a>(
    current: &mut usize,
    data: &'a [u8],
) -> Result<&'a Address, SanitizeError> {
    let end = current
        .checked_add(size_of::<Address>())
        .ok_or(SanitizeError::IndexOutOfBounds)?;
    let range = data
        .get(*current..end)
        .ok_or(SanitizeError::IndexOutOfBounds)?;
    let address =
        bytemuck::try_from_bytes(range).map_err(|_| SanitizeError::IndexOutOfBounds)?;
    *current = end;
    Ok(address)
}

pub fn read_slice<'a>(
    current: &mut usize,
    data: &'a [u8],
    data_len: usize,
) -> Result<&'a [u8], SanitizeError> {
    let end = current
        .checked_add(data_len)
        .ok_or(SanitizeError::IndexOutOfBounds)?;
    let range = data
        .get(*current..end)
        .ok_or(SanitizeError::IndexOutOfBounds)?;
    *current = end;
    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_past_end_fails() {
        let mut current = 0;
        let data = [1u8, 2];
        assert_eq!(read_u16(&mut current, &data), Ok(0x0201));
        assert_eq!(
            read_u16(&mut current, &data),
            Err(SanitizeError::IndexOutOfBounds)
        );
        assert_eq!(current, 2);

        assert_eq!(
            read_u8(&mut current, &data),
            Err(SanitizeError::IndexOutOfBounds)
        );
        assert_eq!(
            read_address(&mut current, &data),
            Err(SanitizeError::IndexOutOfBounds)
        );
        assert_eq!(
            read_slice(&mut current, &data, 1),
            Err(SanitizeError::IndexOutOfBounds)
        );
    }

    #[test]
    fn test_append_read_round_trip() {
        let address = Address::new_unique();
        let mut buf = vec![];
        append_u16(&mut buf, 0xbeef);
        append_u8(&mut buf, 7);
        append_slice(&mut buf, address.as_ref());
        append_slice(&mut buf, &[1, 2, 3]);

        let mut current = 0;
        assert_eq!(read_u16(&mut current, &buf), Ok(0xbeef));
        assert_eq!(read_u8(&mut current, &buf), Ok(7));
        assert_eq!(read_address(&mut current, &buf), Ok(&address));
        assert_eq!(read_slice(&mut current, &buf, 3), Ok(&[1u8, 2, 3][..]));
        assert_eq!(current, buf.len());
    }
}
