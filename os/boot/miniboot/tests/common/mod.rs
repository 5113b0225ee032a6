#![allow(dead_code)]

use boot_abi::header::{NdsHeader, RegionHeader};
use boot_abi::memory::HEADER_ADDRESS;
use boot_dldi::{DriverDescriptor, EntryPoints, Features, FixFlags, Section, Sections};
use boot_registers::{ExMemCnt, KeyInput, PowCnt, VramLayout};
use miniboot::{FsError, MemoryError, Platform, PhysicalMemory, Span, Storage};
use std::collections::{HashMap, VecDeque};
use std::ops::Range;
use std::sync::{Arc, Mutex};

const MAIN_START: u32 = 0x0200_0000;
const MAIN_MIRROR_END: u32 = 0x0300_0000;
const MAIN_MASK: u32 = 0x003F_FFFF;
const WRAM_START: u32 = 0x037F_8000;
const WRAM_END: u32 = 0x0381_0000;
const VRAM_START: u32 = 0x0680_0000;
const VRAM_END: u32 = 0x0684_0000;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Bank {
    Main,
    Wram,
    Vram,
}

struct Banks {
    main: Vec<u8>,
    wram: Vec<u8>,
    vram: Vec<u8>,
}

impl Banks {
    fn bank(&mut self, bank: Bank) -> &mut Vec<u8> {
        match bank {
            Bank::Main => &mut self.main,
            Bank::Wram => &mut self.wram,
            Bank::Vram => &mut self.vram,
        }
    }
}

/// Memory of the whole machine, shared by both processors' views.
///
/// Main RAM is 4 MiB, mirrored up to `0x0300_0000`.
#[derive(Clone)]
pub struct SharedRam(Arc<Mutex<Banks>>);

impl SharedRam {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(Banks {
            main: vec![0; (MAIN_MASK + 1) as usize],
            wram: vec![0; (WRAM_END - WRAM_START) as usize],
            vram: vec![0; (VRAM_END - VRAM_START) as usize],
        })))
    }

    /// What the ARM9 sees: no ARM7 WRAM.
    pub fn arm9(&self) -> RamView {
        RamView {
            ram: self.clone(),
            wram: false,
        }
    }

    pub fn arm7(&self) -> RamView {
        RamView {
            ram: self.clone(),
            wram: true,
        }
    }

    pub fn bytes(&self, addr: u32, len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        self.arm7().read(addr, &mut out).unwrap();
        out
    }

    pub fn word(&self, addr: u32) -> u32 {
        self.arm7().read_u32(addr).unwrap()
    }

    pub fn put(&self, addr: u32, bytes: &[u8]) {
        self.arm7().write(addr, bytes).unwrap();
    }
}

/// One processor's window onto [`SharedRam`].
pub struct RamView {
    ram: SharedRam,
    wram: bool,
}

impl RamView {
    fn resolve(&self, span: Span) -> Result<(Bank, Range<usize>), MemoryError> {
        let unmapped = MemoryError::Unmapped(span);
        let (bank, offset, limit) = match span.addr {
            MAIN_START..MAIN_MIRROR_END => (Bank::Main, span.addr & MAIN_MASK, MAIN_MASK + 1),
            WRAM_START..WRAM_END if self.wram => (Bank::Wram, span.addr - WRAM_START, WRAM_END - WRAM_START),
            VRAM_START..VRAM_END => (Bank::Vram, span.addr - VRAM_START, VRAM_END - VRAM_START),
            _ => return Err(unmapped),
        };
        let end = u64::from(offset) + u64::from(span.len);
        if end > u64::from(limit) {
            return Err(unmapped);
        }
        Ok((bank, offset as usize..end as usize))
    }
}

impl PhysicalMemory for RamView {
    fn with_region<R>(&mut self, span: Span, f: impl FnOnce(&mut [u8]) -> R) -> Result<R, MemoryError> {
        let (bank, range) = self.resolve(span)?;
        let mut banks = self.ram.0.lock().unwrap();
        Ok(f(&mut banks.bank(bank)[range]))
    }

    fn with_regions<R>(
        &mut self,
        dst: Span,
        src: Span,
        f: impl FnOnce(&mut [u8], &[u8]) -> R,
    ) -> Result<R, MemoryError> {
        let (db, dr) = self.resolve(dst)?;
        let (sb, sr) = self.resolve(src)?;
        if db == sb && dr.start < sr.end && sr.start < dr.end {
            return Err(MemoryError::Overlap(dst, src));
        }
        let mut banks = self.ram.0.lock().unwrap();
        let source = banks.bank(sb)[sr].to_vec();
        Ok(f(&mut banks.bank(db)[dr], &source))
    }
}

/// A FAT volume holding whole files in memory.
#[derive(Default)]
pub struct MemStorage {
    files: HashMap<String, Arc<Vec<u8>>>,
    mounted: bool,
    pub mount_error: Option<FsError>,
    pub read_error: Option<FsError>,
}

pub struct MemFile {
    data: Arc<Vec<u8>>,
    pos: usize,
}

impl MemStorage {
    pub fn with_file(path: &str, data: Vec<u8>) -> Self {
        let mut storage = Self::default();
        storage.files.insert(path.to_owned(), Arc::new(data));
        storage
    }
}

impl Storage for MemStorage {
    type File = MemFile;

    fn mount(&mut self) -> Result<(), FsError> {
        if let Some(e) = self.mount_error {
            return Err(e);
        }
        self.mounted = true;
        Ok(())
    }

    fn open(&mut self, path: &str) -> Result<MemFile, FsError> {
        if !self.mounted {
            return Err(FsError::NotReady);
        }
        let data = self.files.get(path).ok_or(FsError::NotFound)?;
        Ok(MemFile {
            data: Arc::clone(data),
            pos: 0,
        })
    }

    fn seek(&mut self, file: &mut MemFile, offset: u32) -> Result<(), FsError> {
        file.pos = offset as usize;
        Ok(())
    }

    fn read(&mut self, file: &mut MemFile, buf: &mut [u8]) -> Result<usize, FsError> {
        if let Some(e) = self.read_error {
            return Err(e);
        }
        let rest = file.data.get(file.pos..).unwrap_or(&[]);
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        file.pos += n;
        Ok(n)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Event {
    VramBanks(VramLayout),
    Power(PowCnt),
    ExternalMemory(ExMemCnt),
    ResetDisplay,
}

/// Records register writes and plays back a script of button states.
///
/// Once the script runs out, no button is held.
#[derive(Clone, Default)]
pub struct FakePlatform {
    keys: Arc<Mutex<VecDeque<KeyInput>>>,
    events: Arc<Mutex<Vec<Event>>>,
}

impl FakePlatform {
    pub fn holding_start(polls: usize) -> Self {
        let platform = Self::default();
        let held = KeyInput::RELEASED.with_start(false);
        platform.keys.lock().unwrap().extend(std::iter::repeat_n(held, polls));
        platform
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn remaining_polls(&self) -> usize {
        self.keys.lock().unwrap().len()
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Platform for FakePlatform {
    fn key_input(&self) -> KeyInput {
        self.keys.lock().unwrap().pop_front().unwrap_or(KeyInput::RELEASED)
    }

    fn set_vram_banks(&mut self, layout: VramLayout) {
        self.record(Event::VramBanks(layout));
    }

    fn set_power(&mut self, power: PowCnt) {
        self.record(Event::Power(power));
    }

    fn set_external_memory(&mut self, control: ExMemCnt) {
        self.record(Event::ExternalMemory(control));
    }

    fn reset_display(&mut self) {
        self.record(Event::ResetDisplay);
    }

    fn soft_reset(&mut self) -> ! {
        panic!("soft reset");
    }
}

/// Address drivers are linked for.
pub const LINKED_AT: u32 = 0xBF80_0000;

/// A driver descriptor linked at `start`.
pub fn descriptor(start: u32, driver_log2: u8, allocated_log2: u8, fix_flags: FixFlags) -> DriverDescriptor {
    let mut name = [0u8; 48];
    name[..9].copy_from_slice(b"Test card");
    DriverDescriptor {
        magic: 0xBF8D_A5ED,
        signature: *b" Chishm\0",
        version: 1,
        driver_log2,
        fix_flags,
        allocated_log2,
        name,
        sections: Sections {
            driver: Section::new(start, start + 0x800),
            interwork: Section::new(start + 0x700, start + 0x720),
            got: Section::new(start + 0x720, start + 0x760),
            bss: Section::new(start + 0x800, start + 0x900),
        },
        io_type: u32::from_le_bytes(*b"TEST"),
        features: Features::CAN_READ | Features::SLOT_NDS,
        entry_points: EntryPoints {
            startup: start + 0x100,
            is_inserted: start + 0x180,
            read_sectors: start + 0x200,
            write_sectors: start + 0x280,
            clear_status: start + 0x300,
            shutdown: start + 0x380,
        },
    }
}

/// The loader's own 16 KiB card driver, with one pointer into its code.
pub fn card_driver() -> Vec<u8> {
    let mut driver = vec![0u8; 0x4000];
    descriptor(LINKED_AT, 12, 14, FixFlags::ALL | FixFlags::BSS)
        .write_to(&mut driver)
        .unwrap();
    driver[0x400..0x404].copy_from_slice(&(LINKED_AT + 0x44).to_le_bytes());
    driver
}

pub fn region(file_offset: u32, load_address: u32, size: u32, entry: u32) -> RegionHeader {
    RegionHeader {
        file_offset,
        entry,
        load_address,
        size,
    }
}

/// A `.nds` file: header, then the ARM9 region filled with `0x99`, then the
/// ARM7 region filled with `0x77`.
///
/// `dldi_at` places a placeholder driver allocation of 2^`allocated_log2`
/// bytes at that offset into the ARM9 region.
pub fn image(arm9: RegionHeader, arm7: RegionHeader, dldi_at: Option<(u32, u8)>) -> Vec<u8> {
    let arm9_end = (arm9.file_offset + arm9.size) as usize;
    let arm7_end = (arm7.file_offset + arm7.size) as usize;
    let mut file = vec![0u8; arm9_end.max(arm7_end).max(0x200)];

    let mut header = NdsHeader {
        arm9,
        arm7,
        ..NdsHeader::default()
    };
    header.title[..8].copy_from_slice(b"HOMEBREW");
    header.game_code = *b"TEST";
    header.write_to(&mut file).unwrap();

    file[arm9.file_offset as usize..arm9_end].fill(0x99);
    file[arm7.file_offset as usize..arm7_end].fill(0x77);

    if let Some((at, allocated_log2)) = dldi_at {
        let start = arm9.file_offset as usize + at as usize;
        descriptor(arm9.load_address + at, 10, allocated_log2, FixFlags::empty())
            .write_to(&mut file[start..])
            .unwrap();
    }
    file
}

/// Seed `ram` with what is left behind when the loader itself was started:
/// its header, its two images and its card driver.
pub fn seed_loader(ram: &SharedRam, driver_at: u32) {
    let own = NdsHeader {
        arm9: region(0x200, 0x0230_0000, 0x4000, 0x0230_0000),
        arm7: region(0x4200, 0x0239_0000, 0x1000, 0x0239_0000),
        ..NdsHeader::default()
    };
    let mut raw = vec![0u8; 0x200];
    own.write_to(&mut raw).unwrap();
    ram.put(HEADER_ADDRESS, &raw[..0x170]);
    ram.put(0x0230_0000, &[0x39; 0x4000]);
    ram.put(0x0239_0000, &[0x37; 0x1000]);
    ram.put(driver_at, &card_driver());
}
