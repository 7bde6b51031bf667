use super::DecodeError;
use solana_sdk::pubkey::Pubkey;

/// Forward-only cursor over an account buffer.
///
/// Offsets only advance after a successful bounds check, so a failed read
/// leaves the cursor where it was.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn take(&mut self, field: &'static str, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .offset
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or(DecodeError::UnexpectedEnd {
                field,
                offset: self.offset,
                needed: n,
                len: self.data.len(),
            })?;
        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(field, N)?);
        Ok(out)
    }

    pub fn u8(&mut self, field: &'static str) -> Result<u8, DecodeError> {
        Ok(self.take(field, 1)?[0])
    }

    pub fn bool(&mut self, field: &'static str) -> Result<bool, DecodeError> {
        Ok(self.u8(field)? == 1)
    }

    pub fn u16_le(&mut self, field: &'static str) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.array(field)?))
    }

    pub fn u32_le(&mut self, field: &'static str) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.array(field)?))
    }

    pub fn u64_le(&mut self, field: &'static str) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.array(field)?))
    }

    pub fn i64_le(&mut self, field: &'static str) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.array(field)?))
    }

    pub fn f64_le(&mut self, field: &'static str) -> Result<f64, DecodeError> {
        Ok(f64::from_le_bytes(self.array(field)?))
    }

    pub fn pubkey(&mut self, field: &'static str) -> Result<Pubkey, DecodeError> {
        Ok(Pubkey::new_from_array(self.array(field)?))
    }

    /// 4-byte little-endian length followed by UTF-8 bytes
    pub fn string(&mut self, field: &'static str) -> Result<String, DecodeError> {
        let len = self.u32_le(field)? as usize;
        let bytes = self.take(field, len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8(field))
    }

    /// Check and consume an 8-byte account discriminator
    pub fn discriminator(
        &mut self,
        account: &'static str,
        expected: &[u8; 8],
    ) -> Result<(), DecodeError> {
        let found: [u8; 8] = self.array("discriminator")?;
        if &found != expected {
            return Err(DecodeError::DiscriminatorMismatch(account));
        }
        Ok(())
    }
}
