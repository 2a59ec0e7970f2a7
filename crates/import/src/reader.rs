use std::io::{self, BufReader, ErrorKind, Read};

/// Outcome of a single-byte read. End of input is a normal outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadByte {
    Byte(u8),
    EndOfInput,
}

/// Sequential single-byte reads over any `Read`, buffered underneath.
pub struct ByteReader<R> {
    inner: BufReader<R>,
    offset: u64,
}

impl<R: Read> ByteReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            offset: 0,
        }
    }

    /// Number of bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn read_byte(&mut self) -> io::Result<ReadByte> {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(ReadByte::EndOfInput),
                Ok(_) => {
                    self.offset += 1;
                    return Ok(ReadByte::Byte(buf[0]));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_bytes_then_end_of_input() {
        let mut reader = ByteReader::new(&b"a,"[..]);
        assert_eq!(reader.read_byte().unwrap(), ReadByte::Byte(b'a'));
        assert_eq!(reader.read_byte().unwrap(), ReadByte::Byte(b','));
        assert_eq!(reader.read_byte().unwrap(), ReadByte::EndOfInput);
        // Stays at end of input.
        assert_eq!(reader.read_byte().unwrap(), ReadByte::EndOfInput);
        assert_eq!(reader.offset(), 2);
    }

    struct Failing;

    impl Read for Failing {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::Other, "disk on fire"))
        }
    }

    #[test]
    fn read_error_is_not_end_of_input() {
        let mut reader = ByteReader::new(Failing);
        assert!(reader.read_byte().is_err());
    }
}
