// SPDX-License-Identifier: AGPL-3.0-only

//! Memory-mapped register access
//!
//! Maps the reserved physical range of the peripheral through a memory
//! device file and issues volatile byte writes into it. `mmap` offsets must be
//! page aligned, so the mapping starts at the page containing the base and the
//! register block sits `delta` bytes into it.

use crate::bus::{BusType, RegisterBus};
use crate::error::{BallError, Result};
use rustix::fs::OFlags;
use rustix::mm::{mmap, munmap, MapFlags, ProtFlags};
use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsFd;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

/// Mapped register span
#[derive(Debug)]
pub struct MmioBus {
    /// Start of the page-aligned mapping
    map_base: NonNull<u8>,
    /// Length of the page-aligned mapping
    map_len: usize,
    /// Offset of the register block inside the mapping
    delta: usize,
    /// Accessible bytes from the register block start
    span: usize,
    /// Physical address of the register block
    start: u64,
    path: PathBuf,
    _file: File,
}

impl MmioBus {
    /// Map `len` bytes at physical address `start` through `path`
    ///
    /// # Errors
    ///
    /// Returns `MappingFailed` if:
    /// - The device file cannot be opened
    /// - The range is empty or does not fit the address space
    /// - `mmap` fails
    pub fn map(path: &Path, start: u64, len: u64) -> Result<Self> {
        tracing::debug!("Mapping {start:#x}+{len:#x} through {}", path.display());

        let span = usize::try_from(len)
            .map_err(|_| BallError::mapping_failed(format!("span {len:#x} too large")))?;
        if span == 0 {
            return Err(BallError::mapping_failed("span is 0"));
        }

        let page = rustix::param::page_size();
        let page_u64 = page as u64;
        let aligned = start & !(page_u64 - 1);
        #[allow(clippy::cast_possible_truncation)]
        let delta = (start - aligned) as usize;
        let map_len = delta
            .checked_add(span)
            .and_then(|end| end.checked_next_multiple_of(page))
            .ok_or_else(|| {
                BallError::mapping_failed(format!(
                    "range {start:#x}+{len:#x} overflows the address space"
                ))
            })?;

        // Register writes must not sit in a cache
        #[allow(clippy::cast_possible_wrap)]
        let sync_flag = OFlags::SYNC.bits() as i32;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(sync_flag)
            .open(path)
            .map_err(|e| {
                BallError::mapping_failed(format!("Cannot open {}: {e}", path.display()))
            })?;

        // SAFETY: mmap of a device file.
        // Invariants: (1) file is open read/write for the lifetime of the mapping
        // (stored in self); (2) map_len is non-zero and page-multiple; (3) aligned
        // is a page-aligned file offset; (4) the range was reserved for this
        // driver before mapping, so no other owner writes it.
        let addr = unsafe {
            mmap(
                std::ptr::null_mut(),
                map_len,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                file.as_fd(),
                aligned,
            )
        }
        .map_err(|e| BallError::mapping_failed(format!("mmap {aligned:#x}: {e}")))?;

        let map_base = NonNull::new(addr.cast::<u8>())
            .ok_or_else(|| BallError::mapping_failed("mmap returned null"))?;

        tracing::info!(
            "Mapped {start:#x}+{span:#x} from {} at {:p}",
            path.display(),
            map_base
        );

        Ok(Self {
            map_base,
            map_len,
            delta,
            span,
            start,
            path: path.to_path_buf(),
            _file: file,
        })
    }

    /// Physical address of the register block
    #[must_use]
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// Device file the range was mapped through
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegisterBus for MmioBus {
    fn write_u8(&mut self, offset: usize, value: u8) -> Result<()> {
        if offset >= self.span {
            return Err(BallError::hardware_fault(
                offset,
                format!("outside mapped span {:#x}", self.span),
            ));
        }

        tracing::trace!("Write u8 @ {:#x} = {value:#04x}", self.start + offset as u64);

        // SAFETY: volatile write to a device register.
        // Invariants: (1) map_base from a successful mmap of map_len bytes;
        // (2) delta + offset < delta + span <= map_len (checked above);
        // (3) u8 has alignment 1; (4) write_volatile keeps the compiler from
        // eliding or reordering register writes.
        unsafe {
            self.map_base.as_ptr().add(self.delta + offset).write_volatile(value);
        }

        Ok(())
    }

    fn span(&self) -> usize {
        self.span
    }

    fn bus_type(&self) -> BusType {
        BusType::Mmio
    }
}

impl Drop for MmioBus {
    fn drop(&mut self) {
        tracing::debug!("Unmapping {:#x}+{:#x}", self.start, self.span);

        // SAFETY: map_base/map_len are exactly what mmap returned in map();
        // Drop runs once and no references into the mapping outlive self.
        unsafe {
            if let Err(e) = munmap(self.map_base.as_ptr().cast(), self.map_len) {
                tracing::error!("munmap failed during drop: {e}");
            }
        }
    }
}

// SAFETY: Send - MmioBus owns its mapping exclusively and the mapping is
// process-wide, so moving it between threads does not invalidate it.
unsafe impl Send for MmioBus {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_device_file_is_mapping_failure() {
        let err = MmioBus::map(Path::new("/nonexistent/vga_ball_mem"), 0, 8).unwrap_err();
        assert!(matches!(err, BallError::MappingFailed { .. }), "{err}");
    }

    #[test]
    fn span_reaching_past_usize_max_is_rejected() {
        let err = MmioBus::map(Path::new("/dev/null"), 1, usize::MAX as u64).unwrap_err();
        assert!(matches!(err, BallError::MappingFailed { .. }), "{err}");
    }

    #[test]
    fn empty_span_is_rejected() {
        let err = MmioBus::map(Path::new("/dev/null"), 0, 0).unwrap_err();
        assert!(matches!(err, BallError::MappingFailed { .. }));
    }

    #[test]
    fn writes_land_at_unaligned_base() {
        let mut backing = tempfile::NamedTempFile::new().unwrap();
        let page = rustix::param::page_size();
        backing.write_all(&vec![0u8; page * 2]).unwrap();
        backing.flush().unwrap();

        let start = (page + 3) as u64;
        {
            let mut bus = MmioBus::map(backing.path(), start, 8).unwrap();
            assert_eq!(bus.span(), 8);
            bus.write_u8(0, 0xAA).unwrap();
            bus.write_u8(6, 0x55).unwrap();
            assert!(matches!(
                bus.write_u8(8, 0),
                Err(BallError::HardwareFault { offset: 8, .. })
            ));
        }

        let contents = std::fs::read(backing.path()).unwrap();
        assert_eq!(contents[page + 3], 0xAA);
        assert_eq!(contents[page + 9], 0x55);
    }
}
