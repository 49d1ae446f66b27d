//! Cell codec: bit-packed builder/slice with references
//!
//! Message bodies and the persisted offer state are trees of cells. Each cell
//! holds at most 1023 data bits and 4 references. Fields are big-endian and
//! bit-packed:
//!
//! ```text
//! uint(n)      n bits, most significant first
//! coins        [len: uint4][value: uint(8 * len)]        (VarUInteger 16)
//! addr_none    [0b00]
//! addr_std     [0b10][anycast: 0][workchain: int8][hash: uint256]
//! maybe ^X     [0] | [1] + reference to X
//! ```
//!
//! Cells are identified by a SHA-256 representation hash over their
//! descriptors, data and the depths and hashes of their references.

use sha2::{Digest, Sha256};
use types::address::Address;
use types::coins::{Coins, MAX_COINS};

use crate::errors::CellError;

/// Maximum data bits per cell.
pub const MAX_BITS: usize = 1023;
/// Maximum references per cell.
pub const MAX_REFS: usize = 4;
/// Maximum reference depth of a cell tree.
pub const MAX_DEPTH: u16 = 1024;

/// Bit length of a serialized `addr_std`.
pub const ADDRESS_BITS: usize = 267;

/// An immutable cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Cell>,
    depth: u16,
}

impl Cell {
    /// The empty cell (zero bits, no references).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn refs(&self) -> &[Cell] {
        &self.refs
    }

    pub fn is_empty(&self) -> bool {
        self.bit_len == 0 && self.refs.is_empty()
    }

    /// Begin reading this cell.
    pub fn parse(&self) -> CellSlice<'_> {
        CellSlice {
            cell: self,
            bit_pos: 0,
            ref_pos: 0,
        }
    }

    /// Maximum reference chain length below this cell, fixed at build time.
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Representation hash.
    pub fn hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();

        let d1 = self.refs.len() as u8;
        let d2 = (self.bit_len / 8 + (self.bit_len + 7) / 8) as u8;
        hasher.update([d1, d2]);

        let mut data = self.data.clone();
        if self.bit_len % 8 != 0 {
            // completion tag: a single 1 bit after the data
            data[self.bit_len / 8] |= 0x80 >> (self.bit_len % 8);
        }
        hasher.update(&data);

        for r in &self.refs {
            hasher.update(r.depth().to_be_bytes());
        }
        for r in &self.refs {
            hasher.update(r.hash());
        }

        hasher.finalize().into()
    }
}

/// Incremental cell writer.
#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Cell>,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bits_left(&self) -> usize {
        MAX_BITS - self.bit_len
    }

    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self, CellError> {
        if self.bit_len >= MAX_BITS {
            return Err(CellError::BitOverflow {
                requested: 1,
                available: 0,
            });
        }
        let byte = self.bit_len / 8;
        if byte == self.data.len() {
            self.data.push(0);
        }
        if bit {
            self.data[byte] |= 0x80 >> (self.bit_len % 8);
        }
        self.bit_len += 1;
        Ok(self)
    }

    /// Store the low `bits` bits of `value`, most significant first.
    pub fn store_uint(&mut self, value: u128, bits: usize) -> Result<&mut Self, CellError> {
        if bits > 128 || (bits < 128 && value >> bits != 0) {
            return Err(CellError::ValueTooLarge { bits });
        }
        if bits > self.bits_left() {
            return Err(CellError::BitOverflow {
                requested: bits,
                available: self.bits_left(),
            });
        }
        for i in (0..bits).rev() {
            self.store_bit((value >> i) & 1 == 1)?;
        }
        Ok(self)
    }

    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self, CellError> {
        if bytes.len() * 8 > self.bits_left() {
            return Err(CellError::BitOverflow {
                requested: bytes.len() * 8,
                available: self.bits_left(),
            });
        }
        for b in bytes {
            self.store_uint(*b as u128, 8)?;
        }
        Ok(self)
    }

    /// `VarUInteger 16`: 4-bit byte length, then the value.
    pub fn store_coins(&mut self, amount: Coins) -> Result<&mut Self, CellError> {
        let value = amount.nano();
        if value > MAX_COINS {
            return Err(CellError::ValueTooLarge { bits: 120 });
        }
        let len = (128 - value.leading_zeros() as usize + 7) / 8;
        self.store_uint(len as u128, 4)?;
        self.store_uint(value, len * 8)
    }

    pub fn store_address(&mut self, address: &Address) -> Result<&mut Self, CellError> {
        if ADDRESS_BITS > self.bits_left() {
            return Err(CellError::BitOverflow {
                requested: ADDRESS_BITS,
                available: self.bits_left(),
            });
        }
        self.store_uint(0b10, 2)?;
        self.store_bit(false)?;
        self.store_uint(address.workchain() as u8 as u128, 8)?;
        self.store_bytes(address.hash())
    }

    /// `addr_none` when `None`.
    pub fn store_maybe_address(&mut self, address: Option<&Address>) -> Result<&mut Self, CellError> {
        match address {
            Some(addr) => self.store_address(addr),
            None => self.store_uint(0b00, 2),
        }
    }

    pub fn store_ref(&mut self, cell: Cell) -> Result<&mut Self, CellError> {
        if self.refs.len() >= MAX_REFS {
            return Err(CellError::RefOverflow);
        }
        if cell.depth >= MAX_DEPTH {
            return Err(CellError::DepthOverflow { max: MAX_DEPTH });
        }
        self.refs.push(cell);
        Ok(self)
    }

    pub fn store_maybe_ref(&mut self, cell: Option<Cell>) -> Result<&mut Self, CellError> {
        match cell {
            Some(c) => {
                if self.refs.len() >= MAX_REFS {
                    return Err(CellError::RefOverflow);
                }
                self.store_bit(true)?;
                self.store_ref(c)
            }
            None => self.store_bit(false),
        }
    }

    pub fn build(self) -> Cell {
        let depth = self.refs.iter().map(|r| r.depth + 1).max().unwrap_or(0);
        Cell {
            data: self.data,
            bit_len: self.bit_len,
            refs: self.refs,
            depth,
        }
    }
}

/// Read cursor over a cell.
#[derive(Debug, Clone)]
pub struct CellSlice<'a> {
    cell: &'a Cell,
    bit_pos: usize,
    ref_pos: usize,
}

impl<'a> CellSlice<'a> {
    pub fn remaining_bits(&self) -> usize {
        self.cell.bit_len - self.bit_pos
    }

    pub fn remaining_refs(&self) -> usize {
        self.cell.refs.len() - self.ref_pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining_bits() == 0 && self.remaining_refs() == 0
    }

    /// Fail if anything is left unread.
    pub fn end_parse(&self) -> Result<(), CellError> {
        if !self.is_empty() {
            return Err(CellError::TrailingData {
                bits: self.remaining_bits(),
                refs: self.remaining_refs(),
            });
        }
        Ok(())
    }

    fn ensure_bits(&self, bits: usize) -> Result<(), CellError> {
        if bits > self.remaining_bits() {
            return Err(CellError::BitUnderflow {
                requested: bits,
                remaining: self.remaining_bits(),
            });
        }
        Ok(())
    }

    pub fn load_bit(&mut self) -> Result<bool, CellError> {
        self.ensure_bits(1)?;
        let byte = self.cell.data[self.bit_pos / 8];
        let bit = byte & (0x80 >> (self.bit_pos % 8)) != 0;
        self.bit_pos += 1;
        Ok(bit)
    }

    pub fn load_uint(&mut self, bits: usize) -> Result<u128, CellError> {
        if bits > 128 {
            return Err(CellError::ValueTooLarge { bits });
        }
        self.ensure_bits(bits)?;
        let mut value = 0u128;
        for _ in 0..bits {
            value = (value << 1) | self.load_bit()? as u128;
        }
        Ok(value)
    }

    pub fn load_u16(&mut self) -> Result<u16, CellError> {
        Ok(self.load_uint(16)? as u16)
    }

    pub fn load_u32(&mut self) -> Result<u32, CellError> {
        Ok(self.load_uint(32)? as u32)
    }

    pub fn load_u64(&mut self) -> Result<u64, CellError> {
        Ok(self.load_uint(64)? as u64)
    }

    pub fn load_coins(&mut self) -> Result<Coins, CellError> {
        let len = self.load_uint(4)? as usize;
        Ok(Coins::from_nano(self.load_uint(len * 8)?))
    }

    /// Load an `addr_std`; `addr_none` is an error here.
    pub fn load_address(&mut self) -> Result<Address, CellError> {
        self.load_maybe_address()?.ok_or(CellError::UnsupportedAddress { tag: 0b00 })
    }

    pub fn load_maybe_address(&mut self) -> Result<Option<Address>, CellError> {
        let tag = self.load_uint(2)? as u8;
        match tag {
            0b00 => Ok(None),
            0b10 => {
                if self.load_bit()? {
                    return Err(CellError::UnsupportedAddress { tag });
                }
                let workchain = self.load_uint(8)? as u8 as i8;
                let mut hash = [0u8; 32];
                for b in hash.iter_mut() {
                    *b = self.load_uint(8)? as u8;
                }
                Ok(Some(Address::new(workchain, hash)))
            }
            other => Err(CellError::UnsupportedAddress { tag: other }),
        }
    }

    pub fn load_ref(&mut self) -> Result<&'a Cell, CellError> {
        let cell = self.cell.refs.get(self.ref_pos).ok_or(CellError::RefUnderflow)?;
        self.ref_pos += 1;
        Ok(cell)
    }

    pub fn load_maybe_ref(&mut self) -> Result<Option<&'a Cell>, CellError> {
        if self.load_bit()? {
            self.load_ref().map(Some)
        } else {
            Ok(None)
        }
    }
}
