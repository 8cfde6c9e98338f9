//! Banked 16-bit address space.
//!
//! A board registers a handful of fixed, non-overlapping regions ("banks")
//! once at start-up. Each bank owns its bytes and is either read-write or
//! read-only. The bank set never changes after setup; bank contents do.
//!
//! Invalid references are never fatal: reads of unmapped addresses return
//! [`UNMAPPED_READ`] and writes to unmapped or read-only addresses are
//! dropped. This keeps long unattended runs deterministic and crash-free.
//! It is not a model of the floating data bus of real hardware.

use thiserror::Error;

/// Value returned for reads that hit no registered bank.
pub const UNMAPPED_READ: u8 = 0x00;

/// Size of the 16-bit address range covered by an [`AddressSpace`].
const ADDRESS_RANGE: usize = 0x1_0000;

/// Reasons a bank registration is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BankError {
    #[error("bank at 0x{base:04X} has zero length")]
    Empty { base: u16 },

    #[error("bank at 0x{base:04X} with length {length} extends past 0xFFFF")]
    OutOfRange { base: u16, length: usize },

    #[error("bank at 0x{base:04X} (length {length}) overlaps bank at 0x{existing_base:04X}")]
    Overlap {
        base: u16,
        length: usize,
        existing_base: u16,
    },

    #[error("initial contents are {actual} bytes, bank length is {expected}")]
    ContentsLength { expected: usize, actual: usize },
}

/// One contiguous memory region.
pub struct MemoryBank {
    base: u16,
    read_only: bool,
    data: Box<[u8]>,
}

impl MemoryBank {
    pub fn base(&self) -> u16 {
        self.base
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn end(&self) -> usize {
        self.base as usize + self.data.len()
    }

    fn contains(&self, addr: u16) -> bool {
        addr >= self.base && (addr as usize) < self.end()
    }
}

/// Ordered collection of [`MemoryBank`]s, sorted by base address.
#[derive(Default)]
pub struct AddressSpace {
    banks: Vec<MemoryBank>,
}

impl AddressSpace {
    pub fn new() -> Self {
        Self { banks: Vec::new() }
    }

    /// Register a new bank covering `base..base + length`.
    ///
    /// When `initial` is `None` the bank starts zero-filled. The returned
    /// slice lets the caller populate the bank (e.g. copy ROM images in);
    /// writes through it bypass read-only protection, which only applies
    /// to later [`write`](Self::write) calls.
    pub fn register_bank(
        &mut self,
        base: u16,
        length: usize,
        initial: Option<&[u8]>,
        read_only: bool,
    ) -> Result<&mut [u8], BankError> {
        if length == 0 {
            return Err(BankError::Empty { base });
        }
        if base as usize + length > ADDRESS_RANGE {
            return Err(BankError::OutOfRange { base, length });
        }
        let end = base as usize + length;
        if let Some(existing) = self
            .banks
            .iter()
            .find(|b| (base as usize) < b.end() && end > b.base as usize)
        {
            return Err(BankError::Overlap {
                base,
                length,
                existing_base: existing.base,
            });
        }

        let data = match initial {
            Some(contents) if contents.len() != length => {
                return Err(BankError::ContentsLength {
                    expected: length,
                    actual: contents.len(),
                });
            }
            Some(contents) => contents.to_vec().into_boxed_slice(),
            None => vec![0u8; length].into_boxed_slice(),
        };

        log::debug!(
            "registered {} bank 0x{:04X}-0x{:04X}",
            if read_only { "ROM" } else { "RAM" },
            base,
            end - 1
        );

        let index = self.banks.partition_point(|b| b.base < base);
        self.banks.insert(
            index,
            MemoryBank {
                base,
                read_only,
                data,
            },
        );
        Ok(&mut self.banks[index].data[..])
    }

    fn find(&self, addr: u16) -> Option<&MemoryBank> {
        // Last bank starting at or below addr is the only candidate.
        let index = self.banks.partition_point(|b| b.base <= addr);
        index
            .checked_sub(1)
            .map(|i| &self.banks[i])
            .filter(|b| b.contains(addr))
    }

    fn find_mut(&mut self, addr: u16) -> Option<&mut MemoryBank> {
        let index = self.banks.partition_point(|b| b.base <= addr);
        index
            .checked_sub(1)
            .map(|i| &mut self.banks[i])
            .filter(|b| b.contains(addr))
    }

    pub fn read(&self, addr: u16) -> u8 {
        match self.find(addr) {
            Some(bank) => bank.data[(addr - bank.base) as usize],
            None => UNMAPPED_READ,
        }
    }

    /// Write a byte. Dropped silently on read-only or unmapped addresses.
    pub fn write(&mut self, addr: u16, value: u8) {
        if let Some(bank) = self.find_mut(addr)
            && !bank.read_only
        {
            let offset = (addr - bank.base) as usize;
            bank.data[offset] = value;
        }
    }

    pub fn is_mapped(&self, addr: u16) -> bool {
        self.find(addr).is_some()
    }

    /// The bank registered exactly at `base`.
    pub fn bank(&self, base: u16) -> Option<&MemoryBank> {
        self.banks.iter().find(|b| b.base == base)
    }

    /// Mutable contents of the bank registered exactly at `base`.
    ///
    /// Like the slice returned from registration, this bypasses read-only
    /// protection; it exists for whole-bank restore and clearing.
    pub fn bank_mut(&mut self, base: u16) -> Option<&mut [u8]> {
        self.banks
            .iter_mut()
            .find(|b| b.base == base)
            .map(|b| &mut b.data[..])
    }

    pub fn banks(&self) -> impl Iterator<Item = &MemoryBank> {
        self.banks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmapped_read_returns_zero() {
        let space = AddressSpace::new();
        assert_eq!(space.read(0x1234), 0x00);
        assert!(!space.is_mapped(0x1234));
    }

    #[test]
    fn ram_write_then_read() {
        let mut space = AddressSpace::new();
        space.register_bank(0x2000, 0x2000, None, false).unwrap();
        space.write(0x2000, 0x11);
        space.write(0x3FFF, 0x22);
        assert_eq!(space.read(0x2000), 0x11);
        assert_eq!(space.read(0x3FFF), 0x22);
        assert_eq!(space.read(0x4000), 0x00);
    }

    #[test]
    fn rom_ignores_writes() {
        let mut space = AddressSpace::new();
        let rom = space.register_bank(0x0000, 4, None, true).unwrap();
        rom.copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        space.write(0x0001, 0x00);
        assert_eq!(space.read(0x0001), 0xAD);
    }

    #[test]
    fn initial_contents_are_copied() {
        let mut space = AddressSpace::new();
        space
            .register_bank(0x1000, 3, Some(&[1, 2, 3]), false)
            .unwrap();
        assert_eq!(space.read(0x1002), 3);
    }

    #[test]
    fn initial_contents_length_must_match() {
        let mut space = AddressSpace::new();
        let err = space
            .register_bank(0x1000, 4, Some(&[1, 2, 3]), false)
            .unwrap_err();
        assert_eq!(
            err,
            BankError::ContentsLength {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn overlap_is_rejected() {
        let mut space = AddressSpace::new();
        space.register_bank(0x2000, 0x100, None, false).unwrap();
        let err = space
            .register_bank(0x20FF, 0x10, None, false)
            .unwrap_err();
        assert!(matches!(
            err,
            BankError::Overlap {
                existing_base: 0x2000,
                ..
            }
        ));
        // Adjacent is fine.
        assert!(space.register_bank(0x2100, 0x10, None, false).is_ok());
        assert!(space.register_bank(0x1F00, 0x100, None, false).is_ok());
    }

    #[test]
    fn out_of_range_and_empty_are_rejected() {
        let mut space = AddressSpace::new();
        assert!(matches!(
            space.register_bank(0xFF00, 0x200, None, false),
            Err(BankError::OutOfRange { .. })
        ));
        assert!(matches!(
            space.register_bank(0x1000, 0, None, false),
            Err(BankError::Empty { .. })
        ));
        assert!(space.register_bank(0xFF00, 0x100, None, false).is_ok());
        assert!(space.is_mapped(0xFFFF));
    }

    #[test]
    fn banks_are_kept_sorted() {
        let mut space = AddressSpace::new();
        space.register_bank(0x4000, 0x10, None, false).unwrap();
        space.register_bank(0x0000, 0x10, None, true).unwrap();
        space.register_bank(0x2000, 0x10, None, false).unwrap();
        let bases: Vec<u16> = space.banks().map(|b| b.base()).collect();
        assert_eq!(bases, vec![0x0000, 0x2000, 0x4000]);
        space.write(0x2005, 0x77);
        assert_eq!(space.read(0x2005), 0x77);
        assert_eq!(space.read(0x1000), 0x00);
    }

    #[test]
    fn bank_mut_bypasses_read_only() {
        let mut space = AddressSpace::new();
        space.register_bank(0x0000, 2, None, true).unwrap();
        space.bank_mut(0x0000).unwrap()[1] = 0x5A;
        assert_eq!(space.read(0x0001), 0x5A);
        assert!(space.bank(0x0000).unwrap().is_read_only());
        assert!(space.bank_mut(0x0001).is_none());
    }
}
