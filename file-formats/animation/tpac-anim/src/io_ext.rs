use glam::{Quat, Vec4};
use std::io::{Error, ErrorKind, Read, Result, Write};

/// Extension trait for reading little-endian values from a reader
pub trait ReadExt: Read {
    fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_i32_le(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    fn read_f32_le(&mut self) -> Result<f32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }

    /// Read a non-negative i32 count
    fn read_count(&mut self) -> Result<usize> {
        let count = self.read_i32_le()?;
        usize::try_from(count)
            .map_err(|_| Error::new(ErrorKind::InvalidData, format!("negative count {count}")))
    }

    /// Read a length-prefixed string (i32 length, no terminator)
    fn read_sized_string(&mut self) -> Result<String> {
        let len = self.read_count()?;
        // Grows with the data actually present instead of trusting the length
        let mut buf = Vec::new();
        (&mut *self).take(len as u64).read_to_end(&mut buf)?;
        if buf.len() != len {
            return Err(Error::new(
                ErrorKind::UnexpectedEof,
                format!("string of {len} bytes cut off after {}", buf.len()),
            ));
        }
        String::from_utf8(buf).map_err(|e| Error::new(ErrorKind::InvalidData, e))
    }

    /// Read a quaternion stored as x, y, z, w
    fn read_quat(&mut self) -> Result<Quat> {
        let x = self.read_f32_le()?;
        let y = self.read_f32_le()?;
        let z = self.read_f32_le()?;
        let w = self.read_f32_le()?;
        Ok(Quat::from_xyzw(x, y, z, w))
    }

    fn read_vec4(&mut self) -> Result<Vec4> {
        let x = self.read_f32_le()?;
        let y = self.read_f32_le()?;
        let z = self.read_f32_le()?;
        let w = self.read_f32_le()?;
        Ok(Vec4::new(x, y, z, w))
    }
}

/// Extension trait for writing little-endian values to a writer
pub trait WriteExt: Write {
    fn write_u8(&mut self, n: u8) -> Result<()> {
        self.write_all(&[n])
    }

    fn write_i32_le(&mut self, n: i32) -> Result<()> {
        self.write_all(&n.to_le_bytes())
    }

    fn write_f32_le(&mut self, n: f32) -> Result<()> {
        self.write_all(&n.to_le_bytes())
    }

    /// Write a count as i32, failing if it does not fit
    fn write_count(&mut self, n: usize) -> Result<()> {
        let n = i32::try_from(n)
            .map_err(|_| Error::new(ErrorKind::InvalidInput, format!("count {n} exceeds i32")))?;
        self.write_i32_le(n)
    }

    fn write_sized_string(&mut self, s: &str) -> Result<()> {
        self.write_count(s.len())?;
        self.write_all(s.as_bytes())
    }

    fn write_quat(&mut self, q: Quat) -> Result<()> {
        for c in q.to_array() {
            self.write_f32_le(c)?;
        }
        Ok(())
    }

    fn write_vec4(&mut self, v: Vec4) -> Result<()> {
        for c in v.to_array() {
            self.write_f32_le(c)?;
        }
        Ok(())
    }
}

// Implement the traits for all types that implement Read/Write
impl<R: Read + ?Sized> ReadExt for R {}
impl<W: Write + ?Sized> WriteExt for W {}
