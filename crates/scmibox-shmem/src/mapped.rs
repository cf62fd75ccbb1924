use std::fs::OpenOptions;
use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use tracing::{debug, info};

use crate::error::{Result, ShmemError};
use crate::layout::FIELD_WIDTH;
use crate::region::SharedRegion;

/// Physical memory mapped through a memory device such as `/dev/mem`.
///
/// The mapping is created by [`MappedRegion::map`] and released exactly once
/// when the value is dropped. Physical addresses need not be page aligned;
/// the page offset is folded in transparently.
pub struct MappedRegion {
    mapping: NonNull<libc::c_void>,
    mapping_len: usize,
    /// First byte of the requested region inside the mapping.
    window: NonNull<u8>,
    size: usize,
    base: u64,
    path: PathBuf,
}

impl MappedRegion {
    /// Map `size` bytes of physical memory starting at `base`.
    pub fn map(path: impl AsRef<Path>, base: u64, size: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let map_err = |source: io::Error| ShmemError::MapFailed {
            path: path.clone(),
            base,
            size,
            source,
        };

        if size < FIELD_WIDTH {
            return Err(ShmemError::RegionTooSmall { size });
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(&path)
            .map_err(map_err)?;

        let page = page_size().map_err(map_err)?;
        let page_offset = (base % page as u64) as usize;
        let mapping_start = base - page_offset as u64;
        let mapping_len = page_offset.checked_add(size).ok_or_else(|| {
            map_err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "region size overflows the mapping length",
            ))
        })?;
        let file_offset = libc::off_t::try_from(mapping_start).map_err(|_| {
            map_err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "base address does not fit in off_t",
            ))
        })?;

        // SAFETY: we request a fresh shared mapping chosen by the kernel; `fd` is
        // open for read/write for the duration of the call and the length is
        // non-zero. The result is checked against MAP_FAILED before use.
        let raw = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                mapping_len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                file_offset,
            )
        };
        if raw == libc::MAP_FAILED {
            return Err(map_err(io::Error::last_os_error()));
        }
        let mapping = NonNull::new(raw).ok_or_else(|| {
            map_err(io::Error::other("mmap returned a null mapping"))
        })?;
        // SAFETY: page_offset < mapping_len, so the window stays inside the mapping.
        let window = unsafe { NonNull::new_unchecked(raw.cast::<u8>().add(page_offset)) };

        info!(?path, base = format_args!("{base:#x}"), size, "shared memory mapped");

        Ok(Self {
            mapping,
            mapping_len,
            window,
            size,
            base,
            path,
        })
    }

    /// Physical base address of the region.
    pub fn base(&self) -> u64 {
        self.base
    }

    fn word_ptr(&self, offset: usize) -> *mut u32 {
        debug_assert!(offset % FIELD_WIDTH == 0, "unaligned offset {offset:#x}");
        debug_assert!(offset + FIELD_WIDTH <= self.size, "offset {offset:#x} out of range");
        // SAFETY: offsets are validated by the channel layout to lie in the window.
        unsafe { self.window.as_ptr().add(offset).cast::<u32>() }
    }
}

impl SharedRegion for MappedRegion {
    fn size(&self) -> usize {
        self.size
    }

    fn read_u32(&self, offset: usize) -> u32 {
        // SAFETY: the pointer is in bounds, aligned and backed by a live mapping.
        unsafe { std::ptr::read_volatile(self.word_ptr(offset)) }
    }

    fn write_u32(&mut self, offset: usize, value: u32) {
        // SAFETY: the pointer is in bounds, aligned and backed by a live mapping.
        unsafe { std::ptr::write_volatile(self.word_ptr(offset), value) }
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        // SAFETY: `mapping`/`mapping_len` are exactly what mmap returned and the
        // mapping is unmapped only here.
        let rc = unsafe { libc::munmap(self.mapping.as_ptr(), self.mapping_len) };
        if rc == 0 {
            debug!(base = format_args!("{:#x}", self.base), "shared memory unmapped");
        } else {
            debug!(
                base = format_args!("{:#x}", self.base),
                error = %io::Error::last_os_error(),
                "munmap failed"
            );
        }
    }
}

impl std::fmt::Debug for MappedRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedRegion")
            .field("path", &self.path)
            .field("base", &format_args!("{:#x}", self.base))
            .field("size", &format_args!("{:#x}", self.size))
            .finish()
    }
}

fn page_size() -> io::Result<usize> {
    // SAFETY: sysconf has no memory-safety preconditions.
    let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page <= 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(page as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backing_file(tag: &str, len: usize) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "scmibox-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::write(&path, vec![0u8; len]).unwrap();
        path
    }

    #[test]
    fn test_map_unaligned_base_and_write_through() {
        let path = backing_file("map", 0x3000);
        let base = 0x1010;

        {
            let mut region = MappedRegion::map(&path, base, 0x100).unwrap();
            assert_eq!(region.size(), 0x100);
            assert_eq!(region.base(), base);
            region.write_u32(0x04, 0xDEAD_BEEF);
            assert_eq!(region.read_u32(0x04), 0xDEAD_BEEF);
        }

        let contents = std::fs::read(&path).unwrap();
        let at = base as usize + 4;
        assert_eq!(
            u32::from_ne_bytes(contents[at..at + 4].try_into().unwrap()),
            0xDEAD_BEEF
        );
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_map_missing_device_fails() {
        let result = MappedRegion::map("/nonexistent/scmibox-mem", 0x0659_0000, 0x100);
        assert!(matches!(result, Err(ShmemError::MapFailed { .. })));
    }

    #[test]
    fn test_map_oversized_region_rejected() {
        let path = backing_file("huge", 0x3000);
        let result = MappedRegion::map(&path, 0x1010, usize::MAX);
        match result {
            Err(ShmemError::MapFailed { source, size, .. }) => {
                assert_eq!(source.kind(), io::ErrorKind::InvalidInput);
                assert_eq!(size, usize::MAX);
            }
            other => panic!("expected MapFailed, got {other:?}"),
        }
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_map_zero_size_rejected() {
        let path = backing_file("zero", 0x1000);
        let result = MappedRegion::map(&path, 0, 0);
        assert!(matches!(result, Err(ShmemError::RegionTooSmall { size: 0 })));
        let _ = std::fs::remove_file(&path);
    }
}
