use std::{
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::Path,
};

use tracing::{debug, error, info, warn};

use crate::{copy_exact, inspect_file, Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackupOutcome {
    /// The destination already held an image with the same fingerprint.
    Unchanged,
    /// `size` bytes were copied to the destination.
    Copied { size: u64 },
}

/// Copy the boot image at `source` to `dest`, unless `dest` already is a
/// valid boot image with the same [`Fingerprint`](crate::Fingerprint).
///
/// Only [`Header::total_size`](crate::Header::total_size) bytes are copied,
/// so any trailing data after the image in `source` is dropped. If the copy
/// fails, the partially written `dest` is removed.
pub fn backup(source: &Path, dest: &Path) -> Result<BackupOutcome> {
    let src = inspect_file(source)?;

    match inspect_file(dest) {
        Ok(existing) if existing.fingerprint == src.fingerprint => {
            info!(?dest, fingerprint = %src.fingerprint, "Destination is up to date");
            return Ok(BackupOutcome::Unchanged);
        }
        Ok(existing) => {
            debug!(?dest, fingerprint = %existing.fingerprint, "Destination holds a different image");
        }
        Err(e) => {
            debug!(?dest, "Destination is not a usable boot image: {e}");
        }
    }

    let reader = File::open(source).map_err(Error::SourceUnreadable)?;
    let writer = File::create(dest).map_err(Error::CopyWrite)?;

    info!(?source, ?dest, size = src.total_size, "Copying boot image");

    let result = copy_exact(BufReader::new(reader), BufWriter::new(writer), src.total_size);

    if let Err(e) = result {
        error!(?dest, "Failed to copy boot image: {e}");

        if let Err(remove_err) = fs::remove_file(dest) {
            warn!(?dest, "Failed to remove partial copy: {remove_err}");
        }

        return Err(e);
    }

    Ok(BackupOutcome::Copied {
        size: src.total_size,
    })
}
