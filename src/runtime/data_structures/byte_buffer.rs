use crate::runtime::{
    data_structures::{
        shared_ptr,
        value::{DeepClone, Value},
        SharedLock, SharedPtr,
    },
    error::{self, ScriptError},
};
use std::{
    cmp::Ordering,
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
};

fn bounds_error<T>(operation: &str, position: usize, size: usize) -> error::Result<T> {
    ScriptError::new_as_result(
        None,
        format!(
            "Buffer {} at position {} exceeds the buffer size {}.",
            operation, position, size
        ),
        None,
    )
}

/// A buffer of raw bytes with a read/write cursor, for building and picking apart binary data.
///
/// All access is linear from the cursor.  Integers are written little endian in widths of 1, 2, 4
/// or 8 bytes, (reads can sign extend,) floats in widths of 4 or 8, and strings occupy a fixed
/// maximum size with a NUL terminator when shorter.  Reads and writes past the end of the buffer
/// raise script errors.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ByteBuffer {
    bytes: Vec<u8>,
    position: usize,
}

/// Buffers are always handled by reference from script code.
pub type ByteBufferPtr = SharedPtr<ByteBuffer>;

impl PartialOrd for ByteBuffer {
    fn partial_cmp(&self, other: &ByteBuffer) -> Option<Ordering> {
        self.bytes.partial_cmp(&other.bytes)
    }
}

impl Hash for ByteBuffer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl DeepClone for ByteBufferPtr {
    fn deep_clone(&self) -> Value {
        Value::ByteBuffer(shared_ptr(self.locked().clone()))
    }
}

/// Hex dump display:
///
/// ```text
///           00 01 02 03 04 05 06 07  08 09 0a 0b 0c 0d 0e 0f  | 01234567 89abcdef |
/// 00000000  68 65 6c 6c 6f 00 00 00                           | hello....        |
/// ```
impl Display for ByteBuffer {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(
            f,
            "          00 01 02 03 04 05 06 07  08 09 0a 0b 0c 0d 0e 0f  | 01234567 89abcdef |"
        )?;

        for (chunk_index, chunk) in self.bytes.chunks(16).enumerate() {
            write!(f, "{:08x}  ", chunk_index * 16)?;

            for index in 0..16 {
                if index == 8 {
                    write!(f, " ")?;
                }

                match chunk.get(index) {
                    Some(byte) => write!(f, "{:02x} ", byte)?,
                    None => write!(f, "   ")?,
                }
            }

            write!(f, " | ")?;

            for index in 0..16 {
                if index == 8 {
                    write!(f, " ")?;
                }

                match chunk.get(index) {
                    Some(byte) if byte.is_ascii_graphic() || *byte == b' ' => {
                        write!(f, "{}", *byte as char)?
                    }

                    Some(_) => write!(f, ".")?,
                    None => write!(f, " ")?,
                }
            }

            writeln!(f, " |")?;
        }

        Ok(())
    }
}

impl ByteBuffer {
    /// Create a zero filled buffer of the given size.
    pub fn new(size: usize) -> ByteBuffer {
        ByteBuffer {
            bytes: vec![0; size],
            position: 0,
        }
    }

    pub fn new_ptr(size: usize) -> ByteBufferPtr {
        shared_ptr(ByteBuffer::new(size))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Grow or shrink the buffer, zero filling new space.  The cursor is clamped to the new size.
    pub fn resize(&mut self, new_size: usize) {
        self.bytes.resize(new_size, 0);

        if self.position > new_size {
            self.position = new_size;
        }
    }

    /// The current cursor position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Move the cursor.  Positioning at the very end of the buffer is allowed, any read or write
    /// from there will fail its own bounds check.
    pub fn set_position(&mut self, new_position: usize) -> error::Result<()> {
        if new_position > self.bytes.len() {
            return bounds_error("position", new_position, self.bytes.len());
        }

        self.position = new_position;
        Ok(())
    }

    /// Reserve space at the cursor for an access of the given width, advancing the cursor past it
    /// and returning the access base.
    fn advance(&mut self, byte_size: usize, operation: &str) -> error::Result<usize> {
        let base = self.position;

        if base + byte_size > self.bytes.len() {
            return bounds_error(operation, base + byte_size, self.bytes.len());
        }

        self.position = base + byte_size;
        Ok(base)
    }

    /// Write a little endian integer of 1, 2, 4, or 8 bytes.
    pub fn write_int(&mut self, byte_size: usize, value: i64) -> error::Result<()> {
        if !matches!(byte_size, 1 | 2 | 4 | 8) {
            return ScriptError::new_as_result(
                None,
                format!("Invalid byte size {} for an integer write.", byte_size),
                None,
            );
        }

        let base = self.advance(byte_size, "write")?;
        let encoded = value.to_le_bytes();

        self.bytes[base..base + byte_size].copy_from_slice(&encoded[..byte_size]);
        Ok(())
    }

    /// Read a little endian integer of 1, 2, 4, or 8 bytes, sign extending when asked.
    pub fn read_int(&mut self, byte_size: usize, is_signed: bool) -> error::Result<i64> {
        if !matches!(byte_size, 1 | 2 | 4 | 8) {
            return ScriptError::new_as_result(
                None,
                format!("Invalid byte size {} for an integer read.", byte_size),
                None,
            );
        }

        let base = self.advance(byte_size, "read")?;
        let field = &self.bytes[base..base + byte_size];

        let value = match byte_size {
            1 => {
                if is_signed {
                    field[0] as i8 as i64
                } else {
                    field[0] as i64
                }
            }

            2 => {
                let mut encoded = [0u8; 2];
                encoded.copy_from_slice(field);

                if is_signed {
                    i16::from_le_bytes(encoded) as i64
                } else {
                    u16::from_le_bytes(encoded) as i64
                }
            }

            4 => {
                let mut encoded = [0u8; 4];
                encoded.copy_from_slice(field);

                if is_signed {
                    i32::from_le_bytes(encoded) as i64
                } else {
                    u32::from_le_bytes(encoded) as i64
                }
            }

            8 => {
                let mut encoded = [0u8; 8];
                encoded.copy_from_slice(field);

                i64::from_le_bytes(encoded)
            }

            _ => {
                return ScriptError::new_as_result(
                    None,
                    format!("Invalid byte size {} for an integer read.", byte_size),
                    None,
                );
            }
        };

        Ok(value)
    }

    /// Write a little endian float of 4 or 8 bytes.
    pub fn write_float(&mut self, byte_size: usize, value: f64) -> error::Result<()> {
        match byte_size {
            4 => {
                let base = self.advance(4, "write")?;
                self.bytes[base..base + 4].copy_from_slice(&(value as f32).to_le_bytes());
            }

            8 => {
                let base = self.advance(8, "write")?;
                self.bytes[base..base + 8].copy_from_slice(&value.to_le_bytes());
            }

            _ => {
                return ScriptError::new_as_result(
                    None,
                    format!("Invalid byte size {} for a float write.", byte_size),
                    None,
                );
            }
        }

        Ok(())
    }

    /// Read a little endian float of 4 or 8 bytes.
    pub fn read_float(&mut self, byte_size: usize) -> error::Result<f64> {
        match byte_size {
            4 => {
                let base = self.advance(4, "read")?;
                let mut encoded = [0u8; 4];

                encoded.copy_from_slice(&self.bytes[base..base + 4]);
                Ok(f32::from_le_bytes(encoded) as f64)
            }

            8 => {
                let base = self.advance(8, "read")?;
                let mut encoded = [0u8; 8];

                encoded.copy_from_slice(&self.bytes[base..base + 8]);
                Ok(f64::from_le_bytes(encoded))
            }

            _ => ScriptError::new_as_result(
                None,
                format!("Invalid byte size {} for a float read.", byte_size),
                None,
            ),
        }
    }

    /// Write a string into a field of max_size bytes.  Longer strings are truncated, shorter ones
    /// leave the remainder of the field zeroed.
    pub fn write_string(&mut self, max_size: usize, value: &str) -> error::Result<()> {
        let base = self.advance(max_size, "write")?;
        let bytes = value.as_bytes();
        let copied = bytes.len().min(max_size);

        self.bytes[base..base + copied].copy_from_slice(&bytes[..copied]);

        for slot in &mut self.bytes[base + copied..base + max_size] {
            *slot = 0;
        }

        Ok(())
    }

    /// Read a string from a field of max_size bytes, stopping at the first NUL.
    pub fn read_string(&mut self, max_size: usize) -> error::Result<String> {
        let base = self.advance(max_size, "read")?;
        let field = &self.bytes[base..base + max_size];
        let end = field.iter().position(|&byte| byte == 0).unwrap_or(max_size);

        Ok(String::from_utf8_lossy(&field[..end]).to_string())
    }
}

/// A window into a parent buffer starting at a base offset.  The view shares the parent's
/// storage, it has a cursor of its own, and advancing it drags the parent's cursor along so
/// interleaved parent access continues after the view's data.
pub struct SubBuffer {
    parent: ByteBufferPtr,
    base: usize,
    position: usize,
}

impl SubBuffer {
    /// Create a view over the parent starting at the parent's current cursor.
    pub fn new(parent: ByteBufferPtr) -> SubBuffer {
        let base = parent.locked().position();

        SubBuffer {
            parent,
            base,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Run one parent operation at this view's cursor, then track how far the parent moved and
    /// leave the parent's cursor at the new high water mark.
    fn with_parent<T>(
        &mut self,
        operation: impl FnOnce(&mut ByteBuffer) -> error::Result<T>,
    ) -> error::Result<T> {
        let mut parent = self.parent.locked();

        parent.set_position(self.base + self.position)?;

        let result = operation(&mut parent)?;

        self.position = parent.position() - self.base;
        Ok(result)
    }

    pub fn write_int(&mut self, byte_size: usize, value: i64) -> error::Result<()> {
        self.with_parent(|parent| parent.write_int(byte_size, value))
    }

    pub fn read_int(&mut self, byte_size: usize, is_signed: bool) -> error::Result<i64> {
        self.with_parent(|parent| parent.read_int(byte_size, is_signed))
    }

    pub fn write_float(&mut self, byte_size: usize, value: f64) -> error::Result<()> {
        self.with_parent(|parent| parent.write_float(byte_size, value))
    }

    pub fn read_float(&mut self, byte_size: usize) -> error::Result<f64> {
        self.with_parent(|parent| parent.read_float(byte_size))
    }

    pub fn write_string(&mut self, max_size: usize, value: &str) -> error::Result<()> {
        self.with_parent(|parent| parent.write_string(max_size, value))
    }

    pub fn read_string(&mut self, max_size: usize) -> error::Result<String> {
        self.with_parent(|parent| parent.read_string(max_size))
    }

    pub fn set_position(&mut self, new_position: usize) -> error::Result<()> {
        let parent_size = self.parent.locked().len();

        if self.base + new_position > parent_size {
            return bounds_error("position", self.base + new_position, parent_size);
        }

        self.position = new_position;
        Ok(())
    }
}
