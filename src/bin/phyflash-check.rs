use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use phyflash_rs::{
    analyze, read_device_info, Analysis, ChecksumStatus, DeviceInfo, FlashLayout, FlashReader,
    MemoryMapEntry, Scan, ValidationResult,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Check and repair the consistency tables of a PHY62xx/ST17H66 flash capture"
)]
struct Opts {
    /// Raw flash capture, first byte at the flash base address
    #[arg(value_name = "BINFILE")]
    input: PathBuf,
    /// Load device-model layout constants from a JSON file
    #[arg(long, value_name = "FILE")]
    layout: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write a corrected copy when checksum mismatches are found
    #[arg(long)]
    fix: bool,
    /// Skip the confirmation prompt before writing
    #[arg(short = 'y', long)]
    yes: bool,
    /// Path for the corrected copy (default: <BINFILE>.patched)
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(serde::Serialize)]
struct Report<'a> {
    device_info: Option<&'a DeviceInfo>,
    #[serde(flatten)]
    analysis: &'a Analysis,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let layout = match &opts.layout {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading layout {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing layout {}", path.display()))?
        }
        None => FlashLayout::default(),
    };

    let image = std::fs::read(&opts.input)
        .with_context(|| format!("reading capture {}", opts.input.display()))?;

    let mut reader = FlashReader::new(&image, layout.flash_base);
    let info = match read_device_info(&mut reader, &layout) {
        Ok(info) => Some(info),
        Err(e) => {
            eprintln!("warning: device info unreadable: {e}");
            None
        }
    };
    let report = analyze(&image, &layout);

    match opts.format {
        OutputFormat::Text => print_text(info.as_ref(), &report, &layout),
        OutputFormat::Json => {
            let out = Report {
                device_info: info.as_ref(),
                analysis: &report,
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }

    if report.patches.is_empty() {
        return Ok(());
    }
    if !opts.fix {
        eprintln!(
            "{} checksum mismatch(es) found; rerun with --fix to write a corrected copy",
            report.patches.len()
        );
        return Ok(());
    }
    if !opts.yes && !confirm(report.patches.len())? {
        return Ok(());
    }

    let patched = report.patches.apply(&image, &layout)?;
    let out_path = opts
        .out
        .unwrap_or_else(|| sibling_patched(&opts.input));
    std::fs::write(&out_path, patched)
        .with_context(|| format!("writing {}", out_path.display()))?;
    println!("Fixed flash was written to {}", out_path.display());
    Ok(())
}

fn sibling_patched(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(".patched");
    PathBuf::from(name)
}

fn confirm(count: usize) -> Result<bool> {
    print!("Fix {count} checksum table record(s)? [y/n] ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("y"))
}

fn print_text(info: Option<&DeviceInfo>, report: &Analysis, layout: &FlashLayout) {
    if let Some(info) = info {
        println!(
            "{:#010x} => ADC calibration value: {:#x}",
            layout.adc_calibration_addr, info.adc_calibration
        );
        println!(
            "{:#010x} => MAC address: {}",
            layout.mac_addr,
            info.mac_string()
        );
        for n in &info.ble_ad_names {
            println!("{:#010x} => BLE AD name: \"{}\"", n.address, n.name);
        }
    }

    println!();
    println!("Memory mapping table");
    print_memory_map(&report.memory_map);

    println!();
    println!("Checksum table");
    print_validation(&report.validation);
    if let Some(e) = &report.checksum_table.error {
        eprintln!("warning: checksum table scan stopped: {e}");
    }
    if let Some(e) = &report.validation.error {
        eprintln!("warning: validation stopped: {e}");
    }
    println!();
}

fn print_memory_map(scan: &Scan<MemoryMapEntry>) {
    for m in &scan.entries {
        let crc = match m.crc {
            Some(v) => format!("{v:#x}"),
            None => "None".to_string(),
        };
        println!(
            "{:#010x} => Src: {:#x}, Dst: {:#x}, Length: {:#x}, CRC: {}",
            m.record_addr, m.src, m.dst, m.length, crc
        );
    }
    if let Some(e) = &scan.error {
        eprintln!("warning: memory map scan stopped: {e}");
    }
}

fn print_validation(scan: &Scan<ValidationResult>) {
    for r in &scan.entries {
        let e = &r.entry;
        let verdict = match (r.status, r.computed) {
            (ChecksumStatus::Matched, _) => "flash CRC valid".to_string(),
            (ChecksumStatus::Mismatched, Some(c)) => {
                format!("flash CRC mismatch, real CRC: {c:#x}")
            }
            (ChecksumStatus::Mismatched, None) => "flash CRC mismatch".to_string(),
            (ChecksumStatus::OutOfRange, _) => "outside flash window, not checked".to_string(),
        };
        println!(
            "{:#010x} => Offset: {:#x}, Mapped offset: {:#x}, Length: {:#x}, CRC: {:#x}; {}",
            e.record_addr, e.offset, e.mapped_offset, e.length, e.stored_checksum, verdict
        );
    }
}
