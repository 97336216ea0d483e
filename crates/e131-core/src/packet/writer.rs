/// Append-only, big-endian writer used to lay out outbound packets.
///
/// Fields are pushed in wire order; `position` lets callers check the
/// running offset against `layout` in debug builds.
pub(crate) struct PacketWriter {
    buf: Vec<u8>,
}

impl PacketWriter {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub(crate) fn put_u16_be(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub(crate) fn put_u32_be(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub(crate) fn put_slice(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes `bytes` into a fixed-width field, NUL-padding the remainder.
    pub(crate) fn put_padded(&mut self, bytes: &[u8], width: usize) {
        let len = bytes.len().min(width);
        self.buf.extend_from_slice(&bytes[..len]);
        self.buf.resize(self.buf.len() + (width - len), 0);
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.buf
    }
}
