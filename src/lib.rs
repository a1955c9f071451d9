//! Inspection of legacy Android boot images.
//!
//! Only the original (pre-`header_version`) header layout is understood. An
//! image is a header followed by the kernel, the ramdisk and an optional
//! second stage bootloader. Header, kernel and ramdisk are each padded to a
//! multiple of the page size.

use std::{
    fmt,
    fs::File,
    io::{self, BufReader, Cursor, Read},
    path::Path,
};

use binrw::{binrw, BinRead, BinWrite};
use thiserror::Error;
use tracing::debug;

pub use backup::{backup, BackupOutcome};
pub use copy::{copy_exact, COPY_CHUNK_SIZE};
pub use fingerprint::Fingerprint;

mod backup;
mod copy;
mod fingerprint;
pub mod padding;

pub const BOOT_MAGIC: [u8; 8] = *b"ANDROID!";
pub const BOOT_NAME_SIZE: usize = 16;
pub const BOOT_ARGS_SIZE: usize = 512;

/// Size of the on-disk [`Header`] record.
pub const HEADER_SIZE: usize = 608;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read boot image")]
    SourceUnreadable(#[source] io::Error),
    #[error("Boot image header is truncated: {actual} < {} bytes", HEADER_SIZE)]
    ShortRead { actual: usize },
    #[error("Not a boot image: {0}")]
    NotABootImage(Rejection),
    #[error("Page size is unusable for alignment: {0}")]
    BadAlignmentConfig(u32),
    #[error("Copy integrity failure at offset {offset}: expected {expected} bytes, read {read}, wrote {written}")]
    CopyIntegrityFailure {
        offset: u64,
        expected: usize,
        read: usize,
        written: usize,
    },
    #[error("Failed to read image data for copy")]
    CopyRead(#[source] io::Error),
    #[error("Failed to write image data for copy")]
    CopyWrite(#[source] io::Error),
    #[error("Failed to decode boot image header")]
    Decode(#[source] binrw::Error),
    #[error("Failed to encode boot image header")]
    Encode(#[source] binrw::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why a header does not describe a bootable image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rejection {
    BadMagic([u8; 8]),
    EmptyKernel,
    EmptyRamdisk,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadMagic(magic) => write!(f, "unknown magic {magic:02x?}"),
            Self::EmptyKernel => f.write_str("kernel size is zero"),
            Self::EmptyRamdisk => f.write_str("ramdisk size is zero"),
        }
    }
}

/// Android boot image header, legacy layout
///
/// All fields are little-endian. See [`HEADER_SIZE`] for the record size.
#[binrw]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[brw(little)]
pub struct Header {
    /// Magic value. This should be equal to [`BOOT_MAGIC`].
    pub magic: [u8; 8],
    /// Kernel size
    pub kernel_size: u32,
    /// Kernel physical load addr
    pub kernel_addr: u32,
    /// Ramdisk size
    pub ramdisk_size: u32,
    /// Ramdisk physical load addr
    pub ramdisk_addr: u32,
    /// Second bootloader size, may be zero
    pub second_size: u32,
    /// Second bootloader physical load addr
    pub second_addr: u32,
    pub tags_addr: u32,
    pub page_size: u32,
    /// Never interpreted
    pub reserved: [u32; 2],
    /// Product name, NUL-padded
    pub name: [u8; BOOT_NAME_SIZE],
    /// Kernel command line, NUL-padded
    pub cmdline: Box<[u8; BOOT_ARGS_SIZE]>,
    /// Opaque identifier words. Only the first five take part in the
    /// [`Fingerprint`].
    pub id: [u32; 8],
}

impl Header {
    /// Decode a header from the start of `data`. Bytes past [`HEADER_SIZE`]
    /// are ignored.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::ShortRead { actual: data.len() });
        }

        Self::read(&mut Cursor::new(&data[..HEADER_SIZE])).map_err(Error::Decode)
    }

    /// Read exactly [`HEADER_SIZE`] bytes from `reader` and decode them.
    pub fn read_from(mut reader: impl Read) -> Result<Self> {
        let mut buf = [0u8; HEADER_SIZE];
        let mut filled = 0;

        while filled < buf.len() {
            match reader.read(&mut buf[filled..]) {
                Ok(0) => return Err(Error::ShortRead { actual: filled }),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::SourceUnreadable(e)),
            }
        }

        Self::decode(&buf)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut writer = Cursor::new(Vec::with_capacity(HEADER_SIZE));
        self.write(&mut writer).map_err(Error::Encode)?;

        Ok(writer.into_inner())
    }

    /// Check that the header describes a bootable image. Only the magic and
    /// the kernel and ramdisk sizes are checked.
    pub fn validate(&self) -> Result<()> {
        if self.magic != BOOT_MAGIC {
            return Err(Error::NotABootImage(Rejection::BadMagic(self.magic)));
        }
        if self.kernel_size < 1 {
            return Err(Error::NotABootImage(Rejection::EmptyKernel));
        }
        if self.ramdisk_size < 1 {
            return Err(Error::NotABootImage(Rejection::EmptyRamdisk));
        }

        Ok(())
    }

    fn align(&self, size: u64) -> Result<u64> {
        padding::align_up(size, self.page_size.into())
            .ok_or(Error::BadAlignmentConfig(self.page_size))
    }

    /// Total number of bytes occupied by the image, starting from the
    /// header.
    ///
    /// The second stage bootloader is counted with its raw size, without
    /// page padding. An image whose second stage is padded on disk is
    /// therefore under-counted by up to one page.
    pub fn total_size(&self) -> Result<u64> {
        let header = self.align(HEADER_SIZE as u64)?;
        let kernel = self.align(self.kernel_size.into())?;
        let ramdisk = self.align(self.ramdisk_size.into())?;

        Ok(header + kernel + ramdisk + u64::from(self.second_size))
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::from_id(&self.id)
    }
}

/// Result of inspecting a valid boot image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inspection {
    pub header: Header,
    pub total_size: u64,
    pub fingerprint: Fingerprint,
}

/// Decode and validate the header at the current position of `reader` and
/// compute the image size and fingerprint.
pub fn inspect(reader: impl Read) -> Result<Inspection> {
    let header = Header::read_from(reader)?;
    header.validate()?;

    let total_size = header.total_size()?;
    let fingerprint = header.fingerprint();

    debug!(
        kernel_size = header.kernel_size,
        ramdisk_size = header.ramdisk_size,
        second_size = header.second_size,
        page_size = header.page_size,
        total_size,
        %fingerprint,
        "Inspected boot image header",
    );

    Ok(Inspection {
        header,
        total_size,
        fingerprint,
    })
}

/// Like [`inspect`], reading from the start of the file at `path`.
pub fn inspect_file(path: &Path) -> Result<Inspection> {
    let file = File::open(path).map_err(Error::SourceUnreadable)?;

    inspect(BufReader::new(file))
}
