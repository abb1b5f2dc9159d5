use phyflash_rs::tables::{parse_checksum_table, parse_memory_map};
use phyflash_rs::{FlashError, FlashLayout, FlashReader};
use pretty_assertions::assert_eq;

fn blank_image() -> Vec<u8> {
    vec![0u8; 0x2_0000]
}

fn put_u32(img: &mut [u8], layout: &FlashLayout, addr: u32, val: u32) {
    let off = (addr - layout.flash_base) as usize;
    img[off..off + 4].copy_from_slice(&val.to_le_bytes());
}

#[test]
fn memory_map_records_parse_in_order_with_crc_sentinel() {
    let layout = FlashLayout::default();
    let mut img = blank_image();
    put_u32(&mut img, &layout, layout.memmap_count_addr, 2);
    let t = layout.memmap_table_addr;
    put_u32(&mut img, &layout, t, 0x1100_4000);
    put_u32(&mut img, &layout, t + 4, 0x200);
    put_u32(&mut img, &layout, t + 8, 0x1FFF_1000);
    put_u32(&mut img, &layout, t + 12, 0x1234);
    put_u32(&mut img, &layout, t + 0x10, 0x1100_8000);
    put_u32(&mut img, &layout, t + 0x14, 0x80);
    put_u32(&mut img, &layout, t + 0x18, 0x1FFF_2000);
    put_u32(&mut img, &layout, t + 0x1C, 0xFFFF_FFFF);

    let mut r = FlashReader::new(&img, layout.flash_base);
    let scan = parse_memory_map(&mut r, &layout);
    assert!(scan.is_clean());
    assert_eq!(scan.entries.len(), 2);

    assert_eq!(scan.entries[0].record_addr, t);
    assert_eq!(scan.entries[0].src, 0x1100_4000);
    assert_eq!(scan.entries[0].length, 0x200);
    assert_eq!(scan.entries[0].dst, 0x1FFF_1000);
    assert_eq!(scan.entries[0].crc, Some(0x1234));

    assert_eq!(scan.entries[1].record_addr, t + 0x10);
    assert_eq!(scan.entries[1].crc, None);
}

#[test]
fn checksum_records_truncate_the_stored_dword() {
    let layout = FlashLayout::default();
    let mut img = blank_image();
    put_u32(&mut img, &layout, layout.checksum_count_addr, 1);
    let t = layout.checksum_table_addr;
    put_u32(&mut img, &layout, t, 0x100);
    put_u32(&mut img, &layout, t + 4, 0x1100_5000);
    put_u32(&mut img, &layout, t + 8, 0x40);
    put_u32(&mut img, &layout, t + 12, 0x0001_4B37);

    let mut r = FlashReader::new(&img, layout.flash_base);
    let scan = parse_checksum_table(&mut r, &layout);
    assert!(scan.is_clean());
    assert_eq!(scan.entries.len(), 1);
    let e = scan.entries[0];
    assert_eq!(e.record_addr, t);
    assert_eq!(e.offset, 0x100);
    assert_eq!(e.mapped_offset, 0x1100_5000);
    assert_eq!(e.length, 0x40);
    assert_eq!(e.stored_checksum, 0x4B37);
}

#[test]
fn absurd_count_keeps_partial_entries_and_surfaces_the_error() {
    let layout = FlashLayout::default();
    let mut img = blank_image();
    // Claims far more records than the capture holds.
    put_u32(&mut img, &layout, layout.memmap_count_addr, 0x10_0000);

    let mut r = FlashReader::new(&img, layout.flash_base);
    let scan = parse_memory_map(&mut r, &layout);
    // The first record past the capture end stops the scan with a hard
    // error instead of silently truncating the listing.
    assert!(matches!(
        scan.error,
        Some(FlashError::OutOfBounds { .. } | FlashError::TruncatedRead { .. })
    ));
    // Records that did fit in the capture are still reported.
    let fitting = (img.len() as u32 - (layout.memmap_table_addr - layout.flash_base))
        / layout.record_stride;
    assert_eq!(scan.entries.len(), fitting as usize);
}

#[test]
fn unreadable_count_yields_an_empty_errored_scan() {
    let layout = FlashLayout::default();
    let img = vec![0u8; 0x100]; // ends long before the count address
    let mut r = FlashReader::new(&img, layout.flash_base);
    let scan = parse_checksum_table(&mut r, &layout);
    assert!(scan.entries.is_empty());
    assert!(scan.error.is_some());
}

#[test]
fn parsing_is_deterministic() {
    let layout = FlashLayout::default();
    let mut img = blank_image();
    put_u32(&mut img, &layout, layout.memmap_count_addr, 1);
    put_u32(&mut img, &layout, layout.memmap_table_addr, 0xABCD);

    let mut r1 = FlashReader::new(&img, layout.flash_base);
    let mut r2 = FlashReader::new(&img, layout.flash_base);
    assert_eq!(
        parse_memory_map(&mut r1, &layout).entries,
        parse_memory_map(&mut r2, &layout).entries
    );
}
