use super::{VAR_NUMBER_U16, VAR_NUMBER_U32, VAR_NUMBER_U64};

/// Number of bytes `value` occupies as a var-number
pub fn var_number_len(value: u64) -> usize {
    if value < u64::from(VAR_NUMBER_U16) {
        1
    } else if value <= u64::from(u16::MAX) {
        3
    } else if value <= u64::from(u32::MAX) {
        5
    } else {
        9
    }
}

/// Growable writer producing nested TLV records.
///
/// Nested records are written through a closure so the length prefix
/// is always computed from what the closure actually wrote:
///
/// ```ignore
/// let mut encoder = Encoder::new();
/// encoder.write_nested(999, |metadata| {
///     metadata.write_blob(100, b"/photos/img1.jpg");
/// });
/// let bytes = encoder.finish();
/// ```
#[derive(Debug, Default, Clone)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the encoder and return the encoded bytes
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_var_number(&mut self, value: u64) -> &mut Self {
        match var_number_len(value) {
            1 => self.buf.push(value as u8),
            3 => {
                self.buf.push(VAR_NUMBER_U16);
                self.buf.extend_from_slice(&(value as u16).to_be_bytes());
            }
            5 => {
                self.buf.push(VAR_NUMBER_U32);
                self.buf.extend_from_slice(&(value as u32).to_be_bytes());
            }
            _ => {
                self.buf.push(VAR_NUMBER_U64);
                self.buf.extend_from_slice(&value.to_be_bytes());
            }
        }
        self
    }

    /// Write a leaf record
    pub fn write_blob(&mut self, typ: u64, value: &[u8]) -> &mut Self {
        self.write_var_number(typ);
        self.write_var_number(value.len() as u64);
        self.buf.extend_from_slice(value);
        self
    }

    /// Write a nested record whose children are produced by `f`
    pub fn write_nested<F>(&mut self, typ: u64, f: F) -> &mut Self
    where
        F: FnOnce(&mut Encoder),
    {
        let mut inner = Encoder::new();
        f(&mut inner);
        self.write_blob(typ, &inner.buf)
    }
}
