// SPDX-License-Identifier: AGPL-3.0-only

//! Exclusive reservation of a physical address range
//!
//! Before a range is mapped it is claimed here, so two controllers never drive
//! the same registers. Claims live in a process-wide table; an optional lock
//! file extends the exclusion to other processes through `flock`.

use crate::error::{BallError, Result};
use crate::platform::PlatformResource;
use rustix::fs::{flock, FlockOperation};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct Claim {
    end: u64,
    owner: String,
}

/// Claimed ranges keyed by start address
static CLAIMS: Mutex<BTreeMap<u64, Claim>> = Mutex::new(BTreeMap::new());

fn claims() -> MutexGuard<'static, BTreeMap<u64, Claim>> {
    CLAIMS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Held claim on an address range
///
/// Released by [`release`](Self::release) or on drop, whichever comes first.
#[derive(Debug)]
pub struct Reservation {
    start: u64,
    len: u64,
    owner: String,
    lock: Option<(File, PathBuf)>,
    held: bool,
}

impl Reservation {
    /// Claim the range described by `resource` within this process
    ///
    /// # Errors
    ///
    /// Returns `ResourceUnavailable` if any part of the range is already
    /// claimed, or `MappingFailed` if the range is empty or wraps.
    pub fn claim(resource: &PlatformResource) -> Result<Self> {
        let end = resource_end(resource)?;
        let mut table = claims();

        if let Some((_, holder)) = table
            .range(..end)
            .find(|(_, claim)| claim.end > resource.start)
        {
            tracing::warn!(
                "{} cannot claim {:#x}+{:#x}: held by {}",
                resource.name,
                resource.start,
                resource.len,
                holder.owner
            );
            return Err(BallError::resource_unavailable(
                resource.start,
                resource.len,
                holder.owner.clone(),
            ));
        }

        table.insert(
            resource.start,
            Claim {
                end,
                owner: resource.name.clone(),
            },
        );

        tracing::debug!(
            "{} claimed {:#x}+{:#x}",
            resource.name,
            resource.start,
            resource.len
        );

        Ok(Self {
            start: resource.start,
            len: resource.len,
            owner: resource.name.clone(),
            lock: None,
            held: true,
        })
    }

    /// Claim the range and also take an exclusive lock file in `lock_dir`
    ///
    /// # Errors
    ///
    /// As [`claim`](Self::claim), plus `ResourceUnavailable` if another process
    /// holds the lock file and `Io` if it cannot be created.
    pub fn claim_with_lock_dir(resource: &PlatformResource, lock_dir: &Path) -> Result<Self> {
        let mut reservation = Self::claim(resource)?;
        // On error `reservation` drops here and gives the in-process claim back
        reservation.lock = Some(acquire_lock_file(resource, lock_dir)?);
        Ok(reservation)
    }

    /// Give the range back; later calls do nothing
    pub fn release(&mut self) {
        if !self.held {
            return;
        }
        self.held = false;

        // Closing the fd drops the flock. The file stays: unlinking it would
        // let a waiter lock the orphaned inode while a newcomer locks a fresh one.
        if let Some((file, path)) = self.lock.take() {
            drop(file);
            tracing::debug!("Unlocked {}", path.display());
        }

        claims().remove(&self.start);
        tracing::debug!("{} released {:#x}+{:#x}", self.owner, self.start, self.len);
    }

    /// Whether the claim is still held
    #[must_use]
    pub const fn is_held(&self) -> bool {
        self.held
    }

    /// First address of the range
    #[must_use]
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// Length of the range in bytes
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.len
    }

    /// Name the range was claimed under
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.release();
    }
}

fn resource_end(resource: &PlatformResource) -> Result<u64> {
    if resource.len == 0 {
        return Err(BallError::mapping_failed(format!(
            "{}: empty address range at {:#x}",
            resource.name, resource.start
        )));
    }
    resource.start.checked_add(resource.len).ok_or_else(|| {
        BallError::mapping_failed(format!(
            "{}: range {:#x}+{:#x} wraps the address space",
            resource.name, resource.start, resource.len
        ))
    })
}

fn acquire_lock_file(resource: &PlatformResource, lock_dir: &Path) -> Result<(File, PathBuf)> {
    if resource.name.is_empty() || resource.name.contains(['/', '\\', '\0']) {
        return Err(BallError::config(format!(
            "resource name {:?} cannot be used as a lock file name",
            resource.name
        )));
    }

    let path = lock_dir.join(format!("{}-{:x}.lock", resource.name, resource.start));

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)?;

    match flock(&file, FlockOperation::NonBlockingLockExclusive) {
        Ok(()) => {
            tracing::debug!("Locked {}", path.display());
            Ok((file, path))
        }
        Err(rustix::io::Errno::WOULDBLOCK) => Err(BallError::resource_unavailable(
            resource.start,
            resource.len,
            format!("another process ({})", path.display()),
        )),
        Err(e) => Err(std::io::Error::from(e).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own address window; the claim table is process-wide.
    fn resource(name: &str, start: u64, len: u64) -> PlatformResource {
        PlatformResource::new(name, start, len)
    }

    #[test]
    fn overlapping_claim_is_refused() {
        let _first = Reservation::claim(&resource("first", 0x1000_0000, 8)).unwrap();

        let err = Reservation::claim(&resource("second", 0x1000_0004, 8)).unwrap_err();
        match err {
            BallError::ResourceUnavailable { owner, .. } => assert_eq!(owner, "first"),
            other => panic!("unexpected error: {other}"),
        }

        let err = Reservation::claim(&resource("third", 0x0FFF_FFFC, 8)).unwrap_err();
        assert!(matches!(err, BallError::ResourceUnavailable { .. }));
    }

    #[test]
    fn adjacent_ranges_do_not_conflict() {
        let _a = Reservation::claim(&resource("a", 0x1100_0000, 8)).unwrap();
        let _b = Reservation::claim(&resource("b", 0x1100_0008, 8)).unwrap();
    }

    #[test]
    fn release_is_idempotent_and_frees_the_range() {
        let r = resource("once", 0x1200_0000, 8);
        let mut held = Reservation::claim(&r).unwrap();
        held.release();
        held.release();
        assert!(!held.is_held());

        let again = Reservation::claim(&r).unwrap();
        drop(again);
        let _third = Reservation::claim(&r).unwrap();
    }

    #[test]
    fn empty_or_wrapping_ranges_are_rejected() {
        assert!(matches!(
            Reservation::claim(&resource("empty", 0x1300_0000, 0)),
            Err(BallError::MappingFailed { .. })
        ));
        assert!(matches!(
            Reservation::claim(&resource("wrap", u64::MAX - 2, 8)),
            Err(BallError::MappingFailed { .. })
        ));
    }

    #[test]
    fn lock_file_excludes_second_holder() {
        let dir = tempfile::tempdir().unwrap();
        let r = resource("locked", 0x1400_0000, 8);

        let (_file, path) = acquire_lock_file(&r, dir.path()).unwrap();
        assert!(path.exists());

        let err = acquire_lock_file(&r, dir.path()).unwrap_err();
        assert!(matches!(err, BallError::ResourceUnavailable { .. }), "{err}");
    }

    #[test]
    fn lock_stays_exclusive_across_release() {
        let dir = tempfile::tempdir().unwrap();
        let r = resource("handover", 0x1500_0000, 8);
        let path = dir.path().join("handover-15000000.lock");

        let first = Reservation::claim_with_lock_dir(&r, dir.path()).unwrap();

        // A waiter opens the same lock file while the first holder is live
        let waiter = File::open(&path).unwrap();
        assert!(flock(&waiter, FlockOperation::NonBlockingLockExclusive).is_err());

        drop(first);
        assert!(path.exists());

        // The waiter takes over, and a newcomer must still be shut out
        flock(&waiter, FlockOperation::NonBlockingLockExclusive).unwrap();
        let err = acquire_lock_file(&r, dir.path()).unwrap_err();
        assert!(matches!(err, BallError::ResourceUnavailable { .. }), "{err}");

        drop(waiter);
        let _again = Reservation::claim_with_lock_dir(&r, dir.path()).unwrap();
    }

    #[test]
    fn lock_file_name_cannot_leave_lock_dir() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["../escape", "a/b", ""] {
            let err = acquire_lock_file(&resource(name, 0x1600_0000, 8), dir.path()).unwrap_err();
            assert!(matches!(err, BallError::Config { .. }), "{name}: {err}");
        }
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
