use std::fs::File;
use std::io::Read;
use std::path::Path;

use memmap2::{Mmap, MmapOptions};

use crate::base::Result;

/// Read-only view over the postings blob. Loaded once, shared freely.
pub trait Buffer: Send + Sync {
    fn data(&self) -> &[u8];

    fn len(&self) -> usize {
        self.data().len()
    }
}

/// Holds the whole file in memory
pub struct MemoryBuffer {
    data: Vec<u8>,
}

impl MemoryBuffer {
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::options().read(true).open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(Self { data })
    }
}

impl Buffer for MemoryBuffer {
    fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Uses a memory map
pub struct MmapBuffer {
    mmap: Mmap,
}

impl MmapBuffer {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::options().read(true).open(path)?;
        let mmap = unsafe { MmapOptions::new().map(&file)? };
        Ok(Self { mmap })
    }
}

impl Buffer for MmapBuffer {
    fn data(&self) -> &[u8] {
        &self.mmap
    }
}
