use aok::{OK, Void};
use log::info;
use pagemem_alloc::{ALIGNMENT, AlignedBuf, PageBuf, mem, wrap_pointer};
use proptest::prelude::*;

#[static_init::constructor(0)]
extern "C" fn _log_init() {
  log_init::init();
}

// ============================================================================
// AlignedBuf
// ============================================================================

#[test]
fn test_zeroed() -> Void {
  let buf = AlignedBuf::zeroed(3 * 4120)?;
  info!("zeroed {} B at {:p}", buf.len(), buf.as_ptr());
  assert_eq!(buf.len(), 3 * 4120);
  assert!(!buf.is_empty());
  assert_eq!(buf.as_ptr() as usize % ALIGNMENT, 0);
  assert!(buf.iter().all(|&b| b == 0));
  OK
}

#[test]
fn test_view_shares_memory() -> Void {
  let buf = AlignedBuf::zeroed(8192)?;
  let mut v = unsafe { buf.view(4096, 64) };
  v.put_u32(0, 0xDEAD_BEEF);
  assert_eq!(&buf[4096..4100], &0xDEAD_BEEFu32.to_le_bytes());
  OK
}

#[test]
#[should_panic(expected = "view out of bounds")]
fn test_view_out_of_bounds() {
  let buf = AlignedBuf::zeroed(4096).unwrap();
  let _ = unsafe { buf.view(4000, 200) };
}

// ============================================================================
// Raw accessors
// ============================================================================

#[test]
fn test_raw_accessors_little_endian() -> Void {
  let mut raw = [0u8; 32];
  let p = raw.as_mut_ptr();
  unsafe {
    mem::put_u8(p, 0, 0xAB);
    mem::put_u16(p, 1, 0x0102);
    mem::put_u32(p, 3, 0x0A0B_0C0D);
    mem::put_u64(p, 7, 0x1122_3344_5566_7788);
  }
  assert_eq!(raw[0], 0xAB);
  assert_eq!(&raw[1..3], &[0x02, 0x01]);
  assert_eq!(&raw[3..7], &[0x0D, 0x0C, 0x0B, 0x0A]);
  assert_eq!(raw[7], 0x88);
  assert_eq!(raw[14], 0x11);

  let p = raw.as_ptr();
  unsafe {
    assert_eq!(mem::get_u8(p, 0), 0xAB);
    assert_eq!(mem::get_u16(p, 1), 0x0102);
    assert_eq!(mem::get_u32(p, 3), 0x0A0B_0C0D);
    assert_eq!(mem::get_u64(p, 7), 0x1122_3344_5566_7788);
  }
  OK
}

#[test]
fn test_copy_memory_overlap_left() -> Void {
  let mut raw: Vec<u8> = (0..16).collect();
  let p = raw.as_mut_ptr();
  unsafe { mem::copy_memory(p, p, 4, 2, 8) };
  assert_eq!(&raw[..12], &[0, 1, 4, 5, 6, 7, 8, 9, 10, 11, 10, 11]);
  OK
}

#[test]
fn test_copy_memory_overlap_right() -> Void {
  let mut raw: Vec<u8> = (0..16).collect();
  let p = raw.as_mut_ptr();
  unsafe { mem::copy_memory(p, p, 2, 4, 8) };
  assert_eq!(&raw[..12], &[0, 1, 2, 3, 2, 3, 4, 5, 6, 7, 8, 9]);
  OK
}

// ============================================================================
// PageBuf / ReadBuf
// ============================================================================

#[test]
fn test_page_buf_roundtrip() -> Void {
  let mut raw = vec![0u8; 64];
  let mut buf = PageBuf::from_slice(&mut raw);
  assert_eq!(buf.len(), 64);
  buf.put_u8(0, 7);
  buf.put_u16(1, 0xBEEF);
  buf.put_u32(3, 42);
  buf.put_u64(56, u64::MAX - 1);
  assert_eq!(buf.get_u8(0), 7);
  assert_eq!(buf.get_u16(1), 0xBEEF);
  assert_eq!(buf.get_u32(3), 42);
  assert_eq!(buf.get_u64(56), u64::MAX - 1);

  let r = buf.into_read();
  assert_eq!(r.get_u64(56), u64::MAX - 1);
  assert_eq!(r.as_slice().len(), 64);
  OK
}

#[test]
fn test_page_buf_copy_within_and_fill() -> Void {
  let mut raw: Vec<u8> = (0..32).collect();
  let mut buf = PageBuf::from_slice(&mut raw);
  buf.copy_within(8, 0, 16);
  assert_eq!(buf.get_u8(0), 8);
  assert_eq!(buf.get_u8(15), 23);
  buf.fill(16, 16, 0);
  assert!(buf.as_slice()[16..].iter().all(|&b| b == 0));
  OK
}

#[test]
fn test_page_buf_reborrow() -> Void {
  let mut raw = vec![0u8; 64];
  let mut buf = PageBuf::from_slice(&mut raw);
  {
    let mut short = buf.reborrow();
    assert_eq!(short.len(), 64);
    short.put_u32(8, 0xABCD);
  }
  assert_eq!(buf.get_u32(8), 0xABCD);
  let base = buf.as_ptr();
  assert_eq!(buf.reborrow().as_ptr(), base);
  OK
}

#[test]
#[should_panic(expected = "page access out of bounds")]
fn test_page_buf_bounds() {
  let mut raw = vec![0u8; 16];
  let buf = PageBuf::from_slice(&mut raw);
  buf.get_u64(9);
}

#[test]
fn test_wrap_pointer_zero_copy() -> Void {
  let region = AlignedBuf::zeroed(4096)?;
  let mut a = unsafe { wrap_pointer(region.base(), 4096) };
  let b = unsafe { wrap_pointer(region.base(), 4096) };
  a.put_u64(100, 0x55AA);
  assert_eq!(b.get_u64(100), 0x55AA);
  assert_eq!(a.as_ptr(), region.as_ptr());
  OK
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(100))]

  #[test]
  fn prop_copy_within_matches_slice(src in 0usize..48, dst in 0usize..48, len in 0usize..16) {
    let mut raw: Vec<u8> = (0..64).collect();
    let mut expect = raw.clone();
    expect.copy_within(src..src + len, dst);
    let mut buf = PageBuf::from_slice(&mut raw);
    buf.copy_within(src, dst, len);
    prop_assert_eq!(buf.as_slice(), expect.as_slice());
  }
}
