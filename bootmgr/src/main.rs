use std::{
    io::{self, stdout, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use abootimg_inspect::{backup, inspect_file, BackupOutcome, Header, Inspection};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, error, Level};

/// Inspect, fingerprint and back up Android boot images
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Lowest severity of log messages to print
    #[arg(value_enum, long, global = true, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print all header fields
    Dump(DumpCli),
    /// Print only the image fingerprint
    Checksum(ChecksumCli),
    /// Copy the image to a destination unless it already holds the same image
    Backup(BackupCli),
}

#[derive(Parser, Debug)]
struct DumpCli {
    /// Path to the boot or recovery image
    image: PathBuf,

    /// Text output format
    #[arg(value_enum, long, default_value_t = TextOutputFormat::Info)]
    format: TextOutputFormat,

    /// Output null-terminated argument strings
    #[arg(short = '0', long)]
    null: bool,
}

#[derive(Parser, Debug)]
struct ChecksumCli {
    /// Path to the boot or recovery image
    image: PathBuf,
}

#[derive(Parser, Debug)]
struct BackupCli {
    /// Path to the boot or recovery image
    image: PathBuf,

    /// Path to write the copy to
    dest: PathBuf,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum TextOutputFormat {
    /// Pretty-printed info-rich text format suitable for human inspection
    Info,
    /// Output shell-escaped (quoted) argument strings that can be used to
    /// reconstruct the header with `mkbootimg`
    Mkbootimg,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}

fn init_logging(level: LogLevel) {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::from(level))
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.log_level);

    let result = match &cli.command {
        Command::Dump(c) => dump_subcommand(c),
        Command::Checksum(c) => checksum_subcommand(c),
        Command::Backup(c) => backup_subcommand(c),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:?}");
            ExitCode::FAILURE
        }
    }
}

fn inspect_image(path: &Path) -> Result<Inspection> {
    inspect_file(path).with_context(|| format!("{path:?} is not a correct image"))
}

fn dump_subcommand(cli: &DumpCli) -> Result<()> {
    let inspection = inspect_image(&cli.image)?;
    let mut out = stdout().lock();

    match cli.format {
        TextOutputFormat::Info => print_info(&mut out, &inspection)?,
        TextOutputFormat::Mkbootimg => print_mkbootimg_args(&mut out, &inspection.header, cli.null)?,
    }

    out.flush()?;

    Ok(())
}

fn checksum_subcommand(cli: &ChecksumCli) -> Result<()> {
    let inspection = inspect_image(&cli.image)?;

    writeln!(stdout(), "{}", inspection.fingerprint)?;

    Ok(())
}

fn backup_subcommand(cli: &BackupCli) -> Result<()> {
    let outcome = backup(&cli.image, &cli.dest)
        .with_context(|| format!("Failed to back up {:?} to {:?}", cli.image, cli.dest))?;

    match outcome {
        BackupOutcome::Unchanged => {}
        BackupOutcome::Copied { size } => {
            debug!("Wrote {size} bytes to {:?}", cli.dest);
        }
    }

    Ok(())
}

fn print_info(out: &mut impl Write, inspection: &Inspection) -> io::Result<()> {
    let hdr = &inspection.header;

    writeln!(out, "boot magic: {}", String::from_utf8_lossy(&hdr.magic))?;
    writeln!(out, "id: {}", inspection.fingerprint)?;
    writeln!(out, "kernel size: 0x{:x} ({})", hdr.kernel_size, hdr.kernel_size)?;
    writeln!(out, "kernel load address: 0x{:08x}", hdr.kernel_addr)?;
    writeln!(out, "ramdisk size: 0x{:x} ({})", hdr.ramdisk_size, hdr.ramdisk_size)?;
    writeln!(out, "ramdisk load address: 0x{:08x}", hdr.ramdisk_addr)?;
    writeln!(
        out,
        "second bootloader size: 0x{:x} ({})",
        hdr.second_size, hdr.second_size
    )?;
    writeln!(out, "second bootloader load address: 0x{:08x}", hdr.second_addr)?;
    writeln!(out, "kernel tags load address: 0x{:08x}", hdr.tags_addr)?;
    writeln!(out, "page size: 0x{:x} ({})", hdr.page_size, hdr.page_size)?;
    write!(out, "product name: ")?;
    out.write_all(take_until_null(&hdr.name))?;
    write!(out, "\ncommand line args: ")?;
    out.write_all(take_until_null(&*hdr.cmdline))?;
    writeln!(out)?;
    writeln!(out, "image size: {}", inspection.total_size)?;

    Ok(())
}

fn print_mkbootimg_args(out: &mut impl Write, hdr: &Header, null: bool) -> io::Result<()> {
    let sep = if null { '\0' } else { ' ' };

    write!(out, "--pagesize{sep}0x{:08x}", hdr.page_size)?;
    write!(out, "{sep}--base{sep}0x{:08x}", 0)?;
    write!(out, "{sep}--kernel_offset{sep}0x{:08x}", hdr.kernel_addr)?;
    write!(out, "{sep}--ramdisk_offset{sep}0x{:08x}", hdr.ramdisk_addr)?;
    write!(out, "{sep}--second_offset{sep}0x{:08x}", hdr.second_addr)?;
    write!(out, "{sep}--tags_offset{sep}0x{:08x}", hdr.tags_addr)?;

    write!(out, "{sep}--board{sep}")?;
    write_bytestring(out, &hdr.name, null)?;
    write!(out, "{sep}--cmdline{sep}")?;
    write_bytestring(out, &*hdr.cmdline, null)?;

    if null {
        write!(out, "\0")
    } else {
        writeln!(out)
    }
}

fn take_until_null(input: &[u8]) -> &[u8] {
    match input.iter().position(|x| *x == 0) {
        Some(null_idx) => &input[..null_idx],
        None => input,
    }
}

/// Write a NUL-padded field, shell-quoted unless `null` separation is used.
fn write_bytestring(out: &mut impl Write, input: &[u8], null: bool) -> io::Result<()> {
    let value = take_until_null(input);

    if null {
        return out.write_all(value);
    }

    let quoted = shlex::bytes::Quoter::new()
        .quote(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    out.write_all(&quoted)
}
