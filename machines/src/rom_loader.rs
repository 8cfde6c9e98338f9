//! ROM set loading and validation.
//!
//! A [`RomSet`] holds named chip images gathered from a directory, a ZIP
//! archive (assembled by the caller through [`RomSet::from_entries`]) or
//! byte slices in tests. A [`RomRegion`] describes how chips are laid out in
//! one contiguous program region and assembles it, recording the CRC32 of
//! each chip so the board can tell which program revision it is running.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

// ---------------------------------------------------------------------------
// CRC-32
// ---------------------------------------------------------------------------

/// Reflected polynomial 0xEDB88320 (the MAME / ZIP / PNG variant).
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0u32;
    while i < 256 {
        let mut crc = i;
        let mut j = 0;
        while j < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0xEDB8_8320
            } else {
                crc >> 1
            };
            j += 1;
        }
        table[i as usize] = crc;
        i += 1;
    }
    table
};

/// CRC-32 of `data`, as listed in MAME ROM definitions.
pub fn crc32(data: &[u8]) -> u32 {
    !data.iter().fold(0xFFFF_FFFFu32, |crc, &byte| {
        (crc >> 8) ^ CRC32_TABLE[((crc ^ byte as u32) & 0xFF) as usize]
    })
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RomLoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing ROM file: {0}")]
    MissingFile(String),

    #[error("ROM {file}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        file: String,
        expected: usize,
        actual: usize,
    },

    #[error("ROM {file}: CRC32 expected 0x{expected:08X}, got 0x{actual:08X}")]
    ChecksumMismatch {
        file: String,
        expected: u32,
        actual: u32,
    },
}

// ---------------------------------------------------------------------------
// RomSet
// ---------------------------------------------------------------------------

/// Named chip images. Names are bare file names without any directory part.
#[derive(Debug, Default, Clone)]
pub struct RomSet {
    files: HashMap<String, Vec<u8>>,
}

impl RomSet {
    /// Read every regular file in `path` (non-recursive).
    pub fn from_directory(path: &Path) -> Result<Self, RomLoadError> {
        let mut files = HashMap::new();
        for entry in std::fs::read_dir(path)? {
            let file_path = entry?.path();
            if !file_path.is_file() {
                continue;
            }
            let Some(name) = file_path.file_name() else {
                continue;
            };
            let data = std::fs::read(&file_path)?;
            files.insert(name.to_string_lossy().into_owned(), data);
        }
        log::debug!("read {} ROM files from {}", files.len(), path.display());
        Ok(Self { files })
    }

    /// Build from owned (name, data) pairs, e.g. the members of a ZIP file.
    /// Any directory prefix in a name is dropped.
    pub fn from_entries(entries: Vec<(String, Vec<u8>)>) -> Self {
        let files = entries
            .into_iter()
            .map(|(name, data)| {
                let bare = name.rsplit('/').next().unwrap_or(name.as_str()).to_string();
                (bare, data)
            })
            .collect();
        Self { files }
    }

    pub fn from_slices(entries: &[(&str, &[u8])]) -> Self {
        let files = entries
            .iter()
            .map(|(name, data)| (name.to_string(), data.to_vec()))
            .collect();
        Self { files }
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    pub fn require(&self, name: &str) -> Result<&[u8], RomLoadError> {
        self.get(name)
            .ok_or_else(|| RomLoadError::MissingFile(name.to_string()))
    }

    pub fn require_sized(&self, name: &str, expected: usize) -> Result<&[u8], RomLoadError> {
        let data = self.require(name)?;
        if data.len() != expected {
            return Err(RomLoadError::SizeMismatch {
                file: name.to_string(),
                expected,
                actual: data.len(),
            });
        }
        Ok(data)
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }
}

// ---------------------------------------------------------------------------
// RomEntry / RomRegion
// ---------------------------------------------------------------------------

/// One chip within a region.
pub struct RomEntry {
    pub name: &'static str,
    pub size: usize,
    /// Offset of the chip inside the region.
    pub offset: usize,
    /// Known-good CRC32, checked only when loading strictly.
    pub crc32: u32,
}

/// A contiguous region assembled from one or more chips.
pub struct RomRegion {
    pub size: usize,
    pub entries: &'static [RomEntry],
}

/// An assembled region plus the CRC32 actually computed for each chip,
/// in the order of [`RomRegion::entries`].
#[derive(Debug, Clone)]
pub struct LoadedRegion {
    pub data: Vec<u8>,
    pub checksums: Vec<u32>,
}

impl LoadedRegion {
    /// True if every chip matches the checksum the region lists for it.
    pub fn matches(&self, region: &RomRegion) -> bool {
        region.entries.len() == self.checksums.len()
            && region
                .entries
                .iter()
                .zip(&self.checksums)
                .all(|(entry, &crc)| entry.crc32 == crc)
    }
}

impl RomRegion {
    /// Assemble the region, rejecting any chip whose CRC32 differs from the
    /// listed value.
    pub fn load(&self, rom_set: &RomSet) -> Result<LoadedRegion, RomLoadError> {
        self.assemble(rom_set, true)
    }

    /// Assemble the region checking sizes only. Modified or homebrew program
    /// chips are accepted; [`LoadedRegion::checksums`] still reports what
    /// was loaded.
    pub fn load_skip_checksums(&self, rom_set: &RomSet) -> Result<LoadedRegion, RomLoadError> {
        self.assemble(rom_set, false)
    }

    /// Assemble from raw chip images given in entry order.
    pub fn load_images(&self, images: &[&[u8]]) -> Result<LoadedRegion, RomLoadError> {
        if images.len() != self.entries.len() {
            let missing = self.entries.get(images.len()).map_or("<extra image>", |e| e.name);
            return Err(RomLoadError::MissingFile(missing.to_string()));
        }
        let entries: Vec<(&str, &[u8])> = self
            .entries
            .iter()
            .zip(images)
            .map(|(entry, &data)| (entry.name, data))
            .collect();
        self.assemble(&RomSet::from_slices(&entries), false)
    }

    fn assemble(&self, rom_set: &RomSet, verify: bool) -> Result<LoadedRegion, RomLoadError> {
        let mut data = vec![0u8; self.size];
        let mut checksums = Vec::with_capacity(self.entries.len());

        for entry in self.entries {
            debug_assert!(
                entry.offset + entry.size <= self.size,
                "chip '{}' does not fit its region",
                entry.name
            );
            let chip = rom_set.require_sized(entry.name, entry.size)?;
            let actual = crc32(chip);
            if verify && actual != entry.crc32 {
                return Err(RomLoadError::ChecksumMismatch {
                    file: entry.name.to_string(),
                    expected: entry.crc32,
                    actual,
                });
            }
            data[entry.offset..entry.offset + entry.size].copy_from_slice(chip);
            checksums.push(actual);
        }

        Ok(LoadedRegion { data, checksums })
    }
}
