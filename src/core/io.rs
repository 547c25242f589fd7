//! Big-endian field primitives
//!
//! Every multi-byte integer in a PSD file is stored most-significant byte
//! first. These helpers read and write such fields over `Read + Seek` /
//! `Write` streams independently of the host byte order, and turn a short
//! read into [`PsdError::Truncated`] carrying the offset it happened at.

use std::io::{self, Read, Seek, Write};

use crate::core::error::{PsdError, PsdResult};
use crate::types::FourCc;

/// Smallest multiple of `align` that is >= `size`.
pub fn padded_size(size: u64, align: u64) -> u64 {
    size.div_ceil(align) * align
}

/// Current position of the stream
pub fn position<R: Seek>(reader: &mut R) -> PsdResult<u64> {
    Ok(reader.stream_position()?)
}

/// Fill `buf` completely or fail with [`PsdError::Truncated`].
pub fn read_exact<R: Read + Seek>(reader: &mut R, buf: &mut [u8]) -> PsdResult<()> {
    let offset = reader.stream_position()?;
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => PsdError::Truncated {
            offset,
            wanted: buf.len() as u64,
        },
        _ => PsdError::Io(e),
    })
}

/// Read a single byte
pub fn read_u8<R: Read + Seek>(reader: &mut R) -> PsdResult<u8> {
    let mut buf = [0u8; 1];
    read_exact(reader, &mut buf)?;
    Ok(buf[0])
}

/// Read a big-endian u16
pub fn read_u16_be<R: Read + Seek>(reader: &mut R) -> PsdResult<u16> {
    let mut buf = [0u8; 2];
    read_exact(reader, &mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

/// Read a big-endian i16
pub fn read_i16_be<R: Read + Seek>(reader: &mut R) -> PsdResult<i16> {
    let mut buf = [0u8; 2];
    read_exact(reader, &mut buf)?;
    Ok(i16::from_be_bytes(buf))
}

/// Read a big-endian u32
pub fn read_u32_be<R: Read + Seek>(reader: &mut R) -> PsdResult<u32> {
    let mut buf = [0u8; 4];
    read_exact(reader, &mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Read a big-endian i32
pub fn read_i32_be<R: Read + Seek>(reader: &mut R) -> PsdResult<i32> {
    let mut buf = [0u8; 4];
    read_exact(reader, &mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

/// Read a four-character code
pub fn read_fourcc<R: Read + Seek>(reader: &mut R) -> PsdResult<FourCc> {
    let mut buf = [0u8; 4];
    read_exact(reader, &mut buf)?;
    Ok(FourCc(buf))
}

/// Read a four-character code and require it to be one of `accepted`.
///
/// The first entry of `accepted` is reported as the expected value on mismatch.
pub fn expect_fourcc<R: Read + Seek>(reader: &mut R, accepted: &[&[u8; 4]]) -> PsdResult<FourCc> {
    let offset = reader.stream_position()?;
    let found = read_fourcc(reader)?;
    if accepted.iter().any(|sig| found == **sig) {
        Ok(found)
    } else {
        Err(PsdError::MagicMismatch {
            expected: FourCc(*accepted[0]),
            found,
            offset,
        })
    }
}

/// Read exactly `len` bytes into a new buffer.
///
/// The buffer grows with the data actually present, so a bogus length
/// near the end of the stream fails without allocating it up front.
pub fn read_bytes<R: Read + Seek>(reader: &mut R, len: u64) -> PsdResult<Vec<u8>> {
    let offset = reader.stream_position()?;
    let mut data = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut data)?;
    if (data.len() as u64) < len {
        return Err(PsdError::Truncated {
            offset,
            wanted: len,
        });
    }
    Ok(data)
}

/// Consume `len` bytes without keeping them.
pub fn skip<R: Read + Seek>(reader: &mut R, len: u64) -> PsdResult<()> {
    let offset = reader.stream_position()?;
    let copied = io::copy(&mut reader.by_ref().take(len), &mut io::sink())?;
    if copied < len {
        return Err(PsdError::Truncated {
            offset,
            wanted: len,
        });
    }
    Ok(())
}

/// Write a single byte
pub fn write_u8<W: Write>(writer: &mut W, value: u8) -> PsdResult<()> {
    writer.write_all(&[value])?;
    Ok(())
}

/// Write a big-endian u16
pub fn write_u16_be<W: Write>(writer: &mut W, value: u16) -> PsdResult<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

/// Write a big-endian i16
pub fn write_i16_be<W: Write>(writer: &mut W, value: i16) -> PsdResult<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

/// Write a big-endian u32
pub fn write_u32_be<W: Write>(writer: &mut W, value: u32) -> PsdResult<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

/// Write a big-endian i32
pub fn write_i32_be<W: Write>(writer: &mut W, value: i32) -> PsdResult<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

/// Write `count` zero bytes
pub fn write_zeros<W: Write>(writer: &mut W, count: usize) -> PsdResult<()> {
    const ZEROS: [u8; 4] = [0; 4];
    let mut remaining = count;
    while remaining > 0 {
        let n = remaining.min(ZEROS.len());
        writer.write_all(&ZEROS[..n])?;
        remaining -= n;
    }
    Ok(())
}

/// Convert a length to the 32-bit field it is stored in.
pub fn length_field(what: &'static str, len: u64) -> PsdResult<u32> {
    u32::try_from(len).map_err(|_| PsdError::UnsupportedFeature {
        feature: format!("{what} of {len} bytes does not fit a 32-bit length"),
        offset: 0,
    })
}

/// Writer adapter that counts the bytes passing through it.
///
/// Lets encoders check their output against a computed size without
/// requiring `Seek` on the destination.
pub struct CountingWriter<'a, W: Write> {
    inner: &'a mut W,
    written: u64,
}

impl<'a, W: Write> CountingWriter<'a, W> {
    pub fn new(inner: &'a mut W) -> Self {
        Self { inner, written: 0 }
    }

    /// Bytes written so far
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl<W: Write> Write for CountingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_padded_size() {
        assert_eq!(padded_size(0, 2), 0);
        assert_eq!(padded_size(1, 2), 2);
        assert_eq!(padded_size(2, 2), 2);
        assert_eq!(padded_size(5, 4), 8);
        assert_eq!(padded_size(8, 4), 8);
    }

    #[test]
    fn test_read_be_fields() {
        let data = [
            0x12, 0x34, 0xff, 0xfd, 0x00, 0x00, 0x01, 0x00, 0xff, 0xff, 0xff, 0xfe,
        ];
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(read_u16_be(&mut cursor).unwrap(), 0x1234);
        assert_eq!(read_i16_be(&mut cursor).unwrap(), -3);
        assert_eq!(read_u32_be(&mut cursor).unwrap(), 256);
        assert_eq!(read_i32_be(&mut cursor).unwrap(), -2);
    }

    #[test]
    fn test_write_be_fields() {
        let mut out = Vec::new();
        write_u16_be(&mut out, 0x1234).unwrap();
        write_i16_be(&mut out, -3).unwrap();
        write_u32_be(&mut out, 256).unwrap();
        write_i32_be(&mut out, -2).unwrap();
        assert_eq!(
            out,
            [0x12, 0x34, 0xff, 0xfd, 0x00, 0x00, 0x01, 0x00, 0xff, 0xff, 0xff, 0xfe]
        );
    }

    #[test]
    fn test_short_read_is_truncation() {
        let mut cursor = Cursor::new(vec![0u8; 3]);
        cursor.set_position(1);
        match read_u32_be(&mut cursor) {
            Err(PsdError::Truncated { offset, wanted }) => {
                assert_eq!(offset, 1);
                assert_eq!(wanted, 4);
            }
            other => panic!("expected truncation, got {other:?}"),
        }
    }

    #[test]
    fn test_read_bytes_and_skip() {
        let mut cursor = Cursor::new(vec![1u8, 2, 3, 4, 5]);
        assert_eq!(read_bytes(&mut cursor, 2).unwrap(), vec![1, 2]);
        skip(&mut cursor, 2).unwrap();
        assert_eq!(read_u8(&mut cursor).unwrap(), 5);
        assert!(matches!(
            skip(&mut cursor, 1),
            Err(PsdError::Truncated { .. })
        ));
        assert!(matches!(
            read_bytes(&mut Cursor::new(vec![0u8; 3]), 10),
            Err(PsdError::Truncated {
                offset: 0,
                wanted: 10
            })
        ));
    }

    #[test]
    fn test_expect_fourcc() {
        let mut cursor = Cursor::new(b"8B64XXXX".to_vec());
        let sig = expect_fourcc(&mut cursor, &[b"8BIM", b"8B64"]).unwrap();
        assert_eq!(sig, b"8B64");
        match expect_fourcc(&mut cursor, &[b"8BIM", b"8B64"]) {
            Err(PsdError::MagicMismatch {
                expected,
                found,
                offset,
            }) => {
                assert_eq!(expected, b"8BIM");
                assert_eq!(found, b"XXXX");
                assert_eq!(offset, 4);
            }
            other => panic!("expected magic mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_counting_writer() {
        let mut out = Vec::new();
        let mut counter = CountingWriter::new(&mut out);
        write_u32_be(&mut counter, 7).unwrap();
        write_zeros(&mut counter, 9).unwrap();
        assert_eq!(counter.written(), 13);
        assert_eq!(out.len(), 13);
    }
}
