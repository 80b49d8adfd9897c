//! The engine's "query size, then fill" string idiom.
//!
//! Every string getter reports its size in bytes with the terminator
//! included. These helpers make the sizing call, allocate, fill, and strip
//! the terminator so callers never repeat the arithmetic.

/// Read a UTF-16LE string through a two-call engine getter.
///
/// `fill` receives an empty slice for the sizing call and a sized buffer for
/// the second call; it returns the byte length reported by the engine.
/// Returns `None` when the engine reports 0 (absent or failed).
pub fn read_utf16_string<F>(mut fill: F) -> Option<String>
where
    F: FnMut(&mut [u16]) -> usize,
{
    let size = fill(&mut []);
    if size == 0 {
        return None;
    }

    let mut buffer = vec![0u16; size.div_ceil(2)];
    let written = fill(&mut buffer);
    if written == 0 {
        return None;
    }

    let units = (written.min(size) / 2).saturating_sub(1);
    let text: Vec<u16> = buffer[..units]
        .iter()
        .copied()
        .take_while(|&c| c != 0)
        .collect();
    Some(String::from_utf16_lossy(&text))
}

/// Read a byte string (ASCII or UTF-8) through a two-call engine getter.
pub fn read_byte_string<F>(mut fill: F) -> Option<String>
where
    F: FnMut(&mut [u8]) -> usize,
{
    let size = fill(&mut []);
    if size == 0 {
        return None;
    }

    let mut buffer = vec![0u8; size];
    let written = fill(&mut buffer);
    if written == 0 {
        return None;
    }

    let len = written.min(size).saturating_sub(1);
    let text: Vec<u8> = buffer[..len].iter().copied().take_while(|&c| c != 0).collect();
    Some(String::from_utf8_lossy(&text).into_owned())
}

/// Copy `text` into `buffer` the way an engine string getter would:
/// UTF-16 with a terminator, returning the size in bytes.
///
/// Nothing is written when the buffer is too small.
pub fn write_utf16_string(text: &str, buffer: &mut [u16]) -> usize {
    let encoded: Vec<u16> = text.encode_utf16().chain(std::iter::once(0)).collect();
    if buffer.len() >= encoded.len() {
        buffer[..encoded.len()].copy_from_slice(&encoded);
    }
    encoded.len() * 2
}

/// Byte-string counterpart of [`write_utf16_string`].
pub fn write_byte_string(text: &str, buffer: &mut [u8]) -> usize {
    let len = text.len() + 1;
    if buffer.len() >= len {
        buffer[..text.len()].copy_from_slice(text.as_bytes());
        buffer[text.len()] = 0;
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf16_strips_terminator() {
        let value = read_utf16_string(|buf| write_utf16_string("Hello", buf));
        assert_eq!(value.as_deref(), Some("Hello"));
    }

    #[test]
    fn test_utf16_empty_string_is_present() {
        // Only the terminator: size 2 bytes, zero characters.
        let value = read_utf16_string(|buf| write_utf16_string("", buf));
        assert_eq!(value.as_deref(), Some(""));
    }

    #[test]
    fn test_utf16_zero_size_is_absent() {
        assert_eq!(read_utf16_string(|_| 0), None);
    }

    #[test]
    fn test_utf16_non_bmp() {
        let value = read_utf16_string(|buf| write_utf16_string("a\u{1F600}b", buf));
        assert_eq!(value.as_deref(), Some("a\u{1F600}b"));
    }

    #[test]
    fn test_utf16_second_call_failure() {
        let mut calls = 0;
        let value = read_utf16_string(|_| {
            calls += 1;
            if calls == 1 {
                10
            } else {
                0
            }
        });
        assert_eq!(value, None);
    }

    #[test]
    fn test_byte_string_strips_terminator() {
        let value = read_byte_string(|buf| write_byte_string("D:20240101120000Z", buf));
        assert_eq!(value.as_deref(), Some("D:20240101120000Z"));
        let value = read_byte_string(|buf| write_byte_string("", buf));
        assert_eq!(value.as_deref(), Some(""));
    }

    #[test]
    fn test_write_reports_size_without_buffer() {
        assert_eq!(write_utf16_string("abc", &mut []), 8);
        assert_eq!(write_byte_string("abc", &mut []), 4);
    }
}
