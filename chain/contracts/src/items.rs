//! Item collections: ordered, 1-based, gap-free lists of item addresses
//!
//! # Wire Format
//! ```text
//! collection   [present: 1] + ^root            (absent = empty collection)
//! root         [count: u32] [present: 1] + ^entry
//! entry        [position: u32] [item: addr_std] [present: 1] + ^next
//! ```
//! Entries are chained in ascending position order. Decoding rejects any
//! collection whose positions are not exactly `1..=count`.

use serde::{Deserialize, Serialize};
use types::address::Address;
use types::errors::OfferError;

use crate::cell::{Cell, CellBuilder, CellSlice};
use crate::errors::CellError;

/// Fixed ordered collection of item addresses, indexed from 1.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemList(Vec<Address>);

impl ItemList {
    pub fn new(items: Vec<Address>) -> Self {
        Self(items)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Build from `(position, item)` pairs, requiring positions `1..=n`.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (u32, Address)>,
    ) -> Result<Self, OfferError> {
        let mut entries: Vec<(u32, Address)> = entries.into_iter().collect();
        entries.sort_by_key(|(pos, _)| *pos);

        let mut items = Vec::with_capacity(entries.len());
        for (expected, (pos, addr)) in (1u32..).zip(entries) {
            if pos != expected {
                return Err(OfferError::DictValueNotFound { position: expected });
            }
            items.push(addr);
        }
        Ok(Self(items))
    }

    pub fn len(&self) -> u32 {
        self.0.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Item at a 1-based position.
    pub fn get(&self, position: u32) -> Result<Address, OfferError> {
        if self.0.is_empty() {
            return Err(OfferError::DictEmpty);
        }
        position
            .checked_sub(1)
            .and_then(|i| self.0.get(i as usize))
            .copied()
            .ok_or(OfferError::DictValueNotFound { position })
    }

    /// `(position, item)` pairs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Address)> {
        (1u32..).zip(self.0.iter())
    }

    pub fn addresses(&self) -> &[Address] {
        &self.0
    }

    /// Append the collection field (`maybe ^root`) to a builder.
    pub fn store(&self, builder: &mut CellBuilder) -> Result<(), CellError> {
        let entries: Vec<(u32, Address)> = self.iter().map(|(pos, addr)| (pos, *addr)).collect();
        store_entries(builder, &entries)
    }

    /// Read a collection field and validate its positions.
    pub fn load(slice: &mut CellSlice<'_>) -> Result<Self, OfferError> {
        let entries = Self::load_entries(slice)?;
        Self::from_entries(entries)
    }

    /// Raw `(position, item)` pairs as encoded, without position checks.
    pub fn load_entries(slice: &mut CellSlice<'_>) -> Result<Vec<(u32, Address)>, CellError> {
        let root = match slice.load_maybe_ref()? {
            Some(root) => root,
            None => return Ok(Vec::new()),
        };

        let mut root_slice = root.parse();
        let declared = root_slice.load_u32()?;
        let mut cursor = root_slice.load_maybe_ref()?;
        root_slice.end_parse()?;

        let mut entries = Vec::new();
        while let Some(cell) = cursor {
            let mut s = cell.parse();
            let pos = s.load_u32()?;
            let addr = s.load_address()?;
            cursor = s.load_maybe_ref()?;
            s.end_parse()?;
            entries.push((pos, addr));
            if entries.len() as u64 > declared as u64 {
                break;
            }
        }

        if entries.len() as u64 != declared as u64 {
            return Err(CellError::ItemCountMismatch {
                declared,
                found: entries.len() as u32,
            });
        }
        Ok(entries)
    }
}

impl FromIterator<Address> for ItemList {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Encode raw entries as given, gaps included; used to build payloads.
pub fn store_entries(
    builder: &mut CellBuilder,
    entries: &[(u32, Address)],
) -> Result<(), CellError> {
    if entries.is_empty() {
        builder.store_maybe_ref(None)?;
        return Ok(());
    }

    // chain is built tail-first so each entry can reference its successor
    let mut next: Option<Cell> = None;
    for (pos, addr) in entries.iter().rev() {
        let mut entry = CellBuilder::new();
        entry.store_uint(*pos as u128, 32)?;
        entry.store_address(addr)?;
        entry.store_maybe_ref(next.take())?;
        next = Some(entry.build());
    }

    let mut root = CellBuilder::new();
    root.store_uint(entries.len() as u128, 32)?;
    root.store_maybe_ref(next)?;
    builder.store_maybe_ref(Some(root.build()))?;
    Ok(())
}
