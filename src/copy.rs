use std::io::{self, Read, Write};

use crate::{Error, Result};

/// Size of each chunk moved by [`copy_exact`].
pub const COPY_CHUNK_SIZE: usize = 2048;

/// Fill `buf` from `reader`, stopping early only at EOF.
fn read_chunk(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut n = 0;

    while n < buf.len() {
        match reader.read(&mut buf[n..]) {
            Ok(0) => break,
            Ok(r) => n += r,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    Ok(n)
}

/// Write as much of `buf` as `writer` accepts, stopping early only if the
/// writer stops accepting data.
fn write_chunk(writer: &mut impl Write, buf: &[u8]) -> io::Result<usize> {
    let mut n = 0;

    while n < buf.len() {
        match writer.write(&buf[n..]) {
            Ok(0) => break,
            Ok(w) => n += w,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    Ok(n)
}

/// Copy exactly `size` bytes from `reader` to `writer` in chunks of
/// [`COPY_CHUNK_SIZE`]. A chunk that cannot be read or written in full is a
/// [`Error::CopyIntegrityFailure`] and stops the copy immediately. Whatever
/// was already written is left in `writer`.
pub fn copy_exact(mut reader: impl Read, mut writer: impl Write, size: u64) -> Result<()> {
    let mut buf = [0u8; COPY_CHUNK_SIZE];
    let mut offset = 0u64;

    while offset < size {
        let expected = (size - offset).min(buf.len() as u64) as usize;

        let read = read_chunk(&mut reader, &mut buf[..expected]).map_err(Error::CopyRead)?;
        let written = write_chunk(&mut writer, &buf[..read]).map_err(Error::CopyWrite)?;

        if read != expected || written != read {
            return Err(Error::CopyIntegrityFailure {
                offset,
                expected,
                read,
                written,
            });
        }

        offset += read as u64;
    }

    writer.flush().map_err(Error::CopyWrite)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use assert_matches::assert_matches;

    use super::*;

    /// Accepts at most `limit` bytes in total, then reports zero-length
    /// writes.
    struct LimitedWriter {
        data: Vec<u8>,
        limit: usize,
    }

    impl Write for LimitedWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = buf.len().min(self.limit - self.data.len());
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct PanicReader;

    impl Read for PanicReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            panic!("Unexpected read");
        }
    }

    struct PanicWriter;

    impl Write for PanicWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            panic!("Unexpected write");
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn copies_exactly_size_bytes() {
        let data = pattern(10_000);
        let mut out = Vec::new();

        copy_exact(Cursor::new(&data), &mut out, 5000).unwrap();
        assert_eq!(out, &data[..5000]);

        let mut out = Vec::new();
        copy_exact(Cursor::new(&data), &mut out, 10_000).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn zero_size_touches_nothing() {
        copy_exact(PanicReader, PanicWriter, 0).unwrap();
    }

    #[test]
    fn source_too_short() {
        let data = pattern(3000);
        let mut out = Vec::new();

        assert_matches!(
            copy_exact(Cursor::new(&data), &mut out, 4096),
            Err(Error::CopyIntegrityFailure {
                offset: 2048,
                expected: 2048,
                read: 952,
                written: 952,
            })
        );
        assert_eq!(out, data);
    }

    #[test]
    fn writer_falls_short() {
        let data = pattern(8192);
        let mut writer = LimitedWriter {
            data: Vec::new(),
            limit: 3000,
        };

        assert_matches!(
            copy_exact(Cursor::new(&data), &mut writer, 8192),
            Err(Error::CopyIntegrityFailure {
                offset: 2048,
                expected: 2048,
                read: 2048,
                written: 952,
            })
        );
        assert_eq!(writer.data, &data[..3000]);
    }

    #[test]
    fn read_error() {
        struct Broken;

        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("broken"))
            }
        }

        assert_matches!(
            copy_exact(Broken, io::sink(), 10),
            Err(Error::CopyRead(_))
        );
    }
}
