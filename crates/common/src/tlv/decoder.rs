use super::{DecodeError, VAR_NUMBER_U16, VAR_NUMBER_U32, VAR_NUMBER_U64};

/// Parsed header of a single record
#[derive(Debug, Clone, Copy)]
struct Header {
    typ: u64,
    /// Absolute offset of the first value byte
    value_start: usize,
    /// Absolute offset one past the last value byte
    end: usize,
}

/// Streaming reader over a nested TLV buffer.
///
/// The decoder owns a cursor into a borrowed buffer plus the stack of
/// boundaries of the nested records it has opened. Reads are checked
/// against the innermost open boundary, so a child record can never
/// claim bytes that belong to its parent's siblings.
///
/// A decoder is meant to live for a single decode call. It is cheap to
/// construct, so create a fresh one per buffer rather than sharing one.
///
/// # Examples
///
/// ```ignore
/// let mut decoder = Decoder::new(&bytes);
/// let end = decoder.read_nested_start(999)?;
/// while decoder.offset() < end {
///     if decoder.peek_type(100, end) {
///         let name = decoder.read_blob(100)?;
///     } else {
///         decoder.skip(104)?;
///     }
/// }
/// decoder.finish_nested(end)?;
/// ```
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    input: &'a [u8],
    offset: usize,
    boundaries: Vec<usize>,
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            offset: 0,
            boundaries: Vec::new(),
        }
    }

    /// Current absolute cursor position
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Total length of the input, the outermost boundary
    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Bytes left before the innermost open boundary
    pub fn remaining(&self) -> usize {
        self.limit() - self.offset
    }

    fn limit(&self) -> usize {
        self.boundaries
            .last()
            .copied()
            .unwrap_or(self.input.len())
    }

    /// Read a var-number starting at `at`, never looking at or past `limit`.
    ///
    /// Returns the value and the offset just after it.
    fn var_number_at(&self, at: usize, limit: usize) -> Result<(u64, usize), DecodeError> {
        let truncated = |declared: usize| DecodeError::Truncated {
            offset: at,
            declared: declared as u64,
            available: limit.saturating_sub(at),
        };

        if at >= limit {
            return Err(truncated(1));
        }

        let first = self.input[at];
        let width = match first {
            VAR_NUMBER_U16 => 2,
            VAR_NUMBER_U32 => 4,
            VAR_NUMBER_U64 => 8,
            _ => return Ok((u64::from(first), at + 1)),
        };

        let start = at + 1;
        if limit - start < width {
            return Err(truncated(1 + width));
        }

        let value = self.input[start..start + width]
            .iter()
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte));
        Ok((value, start + width))
    }

    /// Parse the header of the record at the cursor without consuming it
    fn header(&self) -> Result<Header, DecodeError> {
        let limit = self.limit();
        let (typ, after_type) = self.var_number_at(self.offset, limit)?;
        let (length, value_start) = self.var_number_at(after_type, limit)?;

        let available = limit - value_start;
        if length > available as u64 {
            return Err(DecodeError::Truncated {
                offset: self.offset,
                declared: length,
                available,
            });
        }

        Ok(Header {
            typ,
            value_start,
            // length <= available, so this fits in usize
            end: value_start + length as usize,
        })
    }

    fn expect_header(&self, expected: u64) -> Result<Header, DecodeError> {
        let header = self.header()?;
        if header.typ != expected {
            return Err(DecodeError::UnexpectedType {
                expected,
                actual: header.typ,
            });
        }
        Ok(header)
    }

    /// Type of the next record before `boundary`, without moving the cursor.
    ///
    /// Returns `None` at or past the boundary, or if the type itself is
    /// cut short; the next read will report the error.
    pub fn next_type(&self, boundary: usize) -> Option<u64> {
        self.try_next_type(boundary).ok().flatten()
    }

    /// Like [`next_type`](Self::next_type), but a type cut short by the
    /// boundary is an error instead of `None`.
    pub fn try_next_type(&self, boundary: usize) -> Result<Option<u64>, DecodeError> {
        let limit = boundary.min(self.limit());
        if self.offset >= limit {
            return Ok(None);
        }
        let (typ, _) = self.var_number_at(self.offset, limit)?;
        Ok(Some(typ))
    }

    /// Check whether the next record before `boundary` has type `candidate`.
    ///
    /// Never moves the cursor.
    pub fn peek_type(&self, candidate: u64, boundary: usize) -> bool {
        self.next_type(boundary) == Some(candidate)
    }

    /// Open a nested record of type `expected`.
    ///
    /// Consumes the header and returns the absolute offset at which the
    /// nested record ends. Every call must be paired with
    /// [`finish_nested`](Self::finish_nested) on the returned boundary.
    pub fn read_nested_start(&mut self, expected: u64) -> Result<usize, DecodeError> {
        let header = self.expect_header(expected)?;
        self.offset = header.value_start;
        self.boundaries.push(header.end);
        Ok(header.end)
    }

    /// Close the nested record ending at `boundary`.
    ///
    /// Fails unless the cursor sits exactly on the boundary, which catches
    /// both children that overran their parent and trailing garbage.
    pub fn finish_nested(&mut self, boundary: usize) -> Result<(), DecodeError> {
        if self.offset != boundary || self.boundaries.last() != Some(&boundary) {
            return Err(DecodeError::BoundaryMismatch {
                offset: self.offset,
                boundary,
            });
        }
        self.boundaries.pop();
        Ok(())
    }

    /// Move the cursor to `boundary` without looking at the bytes in between.
    ///
    /// Only valid for the innermost open record; whatever lies between the
    /// cursor and the boundary is not validated.
    pub fn skip_to_boundary(&mut self, boundary: usize) -> Result<(), DecodeError> {
        if self.boundaries.last() != Some(&boundary) || boundary < self.offset {
            return Err(DecodeError::BoundaryMismatch {
                offset: self.offset,
                boundary,
            });
        }
        self.offset = boundary;
        Ok(())
    }

    /// Consume a leaf record of type `typ` and return its value.
    pub fn read_blob(&mut self, typ: u64) -> Result<&'a [u8], DecodeError> {
        let header = self.expect_header(typ)?;
        let input = self.input;
        self.offset = header.end;
        Ok(&input[header.value_start..header.end])
    }

    /// Consume a leaf record of type `typ` if it is next before `boundary`.
    pub fn read_optional_blob(
        &mut self,
        typ: u64,
        boundary: usize,
    ) -> Result<Option<&'a [u8]>, DecodeError> {
        if self.peek_type(typ, boundary) {
            self.read_blob(typ).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Consume a record of type `typ`, leaf or nested, without looking
    /// inside it. The cursor advances by exactly the declared header plus
    /// payload length.
    pub fn skip(&mut self, typ: u64) -> Result<(), DecodeError> {
        let header = self.expect_header(typ)?;
        self.offset = header.end;
        Ok(())
    }
}
