//! Serial line assembler.
//!
//! Bytes go in one at a time; a complete line comes out at each `\n`.
//! `\r` is dropped so both `\n` and `\r\n` terminals work. A line longer
//! than `N` bytes is discarded whole and reported once, at its newline.

use crate::error::Error;
use heapless::{String, Vec};

pub struct LineBuffer<const N: usize> {
    buf: Vec<u8, N>,
    overflowed: bool,
}

impl<const N: usize> LineBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            overflowed: false,
        }
    }

    /// Feed one byte. Returns `Some` when a line terminator completes a line.
    pub fn push(&mut self, byte: u8) -> Option<Result<String<N>, Error>> {
        match byte {
            b'\r' => None,
            b'\n' => Some(self.take_line()),
            _ => {
                if !self.overflowed && self.buf.push(byte).is_err() {
                    self.overflowed = true;
                    self.buf.clear();
                }
                None
            }
        }
    }

    /// Bytes of the line in progress.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty() && !self.overflowed
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.overflowed = false;
    }

    fn take_line(&mut self) -> Result<String<N>, Error> {
        let bytes = core::mem::take(&mut self.buf);
        if core::mem::replace(&mut self.overflowed, false) {
            return Err(Error::LineTooLong);
        }
        String::from_utf8(bytes).map_err(|_| Error::NotUtf8)
    }
}

impl<const N: usize> Default for LineBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
