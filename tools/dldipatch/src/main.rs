use boot_abi::Cpu;
use boot_abi::header::{HeaderError, NdsHeader};
use boot_console::{ByteSink, ConsoleLogger};
use boot_dldi::{DldiError, DriverDescriptor, PatchOutcome};
use log::{LevelFilter, warn};
use miniboot::image::validate_region;
use std::io::Write;
use std::process::ExitCode;
use std::{env, fs, io};

static LOGGER: ConsoleLogger = ConsoleLogger::new();

struct Stderr;

impl ByteSink for Stderr {
    fn put_byte(&mut self, byte: u8) {
        let _ = io::stderr().write_all(&[byte]);
    }
}

#[derive(Debug, thiserror::Error)]
enum ToolError {
    #[error("Could not read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("Could not write {path}: {source}")]
    Write { path: String, source: io::Error },
    #[error("Invalid driver: {0}")]
    Driver(DldiError),
    #[error("Invalid executable header: {0}")]
    Header(#[from] HeaderError),
    #[error("ARM9 binary ({size:#x} bytes at {offset:#x}) is outside the {len:#x} byte file")]
    Arm9OutsideFile { offset: u32, size: u32, len: usize },
    #[error("Failed to apply DLDI patch: {0}")]
    Patch(DldiError),
}

fn main() -> ExitCode {
    // args: <driver.dldi> <image.nds>
    let mut args = env::args().skip(1);
    let (Some(driver), Some(image)) = (args.next(), args.next()) else {
        eprintln!("usage: dldipatch <driver.dldi> <image.nds>");
        return ExitCode::from(2);
    };

    if LOGGER.init(Box::leak(Box::new(Stderr)), LevelFilter::Warn).is_err() {
        eprintln!("logger already installed");
    }

    match run(&driver, &image) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(driver_path: &str, image_path: &str) -> Result<(), ToolError> {
    let read = |path: &str| {
        fs::read(path).map_err(|source| ToolError::Read {
            path: path.to_owned(),
            source,
        })
    };
    let driver = read(driver_path)?;
    let mut file = read(image_path)?;

    let descriptor = DriverDescriptor::parse(&driver).map_err(ToolError::Driver)?;
    let header = NdsHeader::parse(&file)?;
    let arm9 = header.arm9;

    let start = arm9.file_offset as usize;
    let end = start
        .checked_add(arm9.size as usize)
        .filter(|&end| end <= file.len())
        .ok_or(ToolError::Arm9OutsideFile {
            offset: arm9.file_offset,
            size: arm9.size,
            len: file.len(),
        })?;
    if let Err(e) = validate_region(Cpu::Arm9, &arm9) {
        warn!("ARM9 binary would not load: {e}");
    }

    let outcome = boot_dldi::patch(&mut file[start..end], arm9.load_address, &driver).map_err(ToolError::Patch)?;
    match outcome {
        PatchOutcome::NotPresent => {
            println!("{image_path} has no DLDI section, left unchanged");
        }
        PatchOutcome::Patched {
            offset,
            relocated_to,
        } => {
            fs::write(image_path, &file).map_err(|source| ToolError::Write {
                path: image_path.to_owned(),
                source,
            })?;
            println!(
                "patched {image_path} with {} at ARM9+{offset:#x}, relocated to {relocated_to:#010x}",
                descriptor.name_str().unwrap_or("unnamed driver")
            );
        }
    }
    Ok(())
}
