use std::collections::HashSet;

use aok::{OK, Void};
use log::info;
use pagemem_id::{
  FLAG_DATA, FLAG_IDX, FullPageId, MAX_PAGE_INDEX, PageId, TAG_LOCK_ALWAYS, effective_page_id,
  flag, page_id, page_index, partition, rotate_page_id, tag,
};
use proptest::prelude::*;

#[static_init::constructor(0)]
extern "C" fn _log_init() {
  log_init::init();
}

#[test]
fn test_pack_unpack() -> Void {
  let id = page_id(7, FLAG_IDX, 1234);
  assert_eq!(partition(id), 7);
  assert_eq!(flag(id), FLAG_IDX);
  assert_eq!(page_index(id), 1234);
  assert_eq!(tag(id), 0);
  OK
}

#[test]
fn test_literal_id() -> Void {
  let id = PageId(0x0001_0000_0000_0001);
  assert_eq!(id.tag(), 1);
  assert_eq!(id.partition(), 0);
  assert_eq!(id.flag(), 0);
  assert_eq!(id.page_index(), 1);
  OK
}

#[test]
fn test_with_tag_keeps_rest() -> Void {
  let id = PageId::new(0xBEEF, FLAG_DATA, MAX_PAGE_INDEX).with_tag(0x1234);
  assert_eq!(id.tag(), 0x1234);
  assert_eq!(id.partition(), 0xBEEF);
  assert_eq!(id.flag(), FLAG_DATA);
  assert_eq!(id.page_index(), MAX_PAGE_INDEX);
  assert_eq!(id.effective(), PageId::new(0xBEEF, FLAG_DATA, MAX_PAGE_INDEX));
  OK
}

#[test]
fn test_rotate() -> Void {
  let id = PageId::new(3, FLAG_DATA, 42).with_tag(1);
  let r = id.rotate();
  assert_eq!(r.tag(), 2);
  assert_eq!(r.effective(), id.effective());
  OK
}

#[test]
fn test_rotate_wraps_to_one() -> Void {
  let id = PageId::new(1, FLAG_DATA, 9).with_tag(0xFFFF);
  let r = id.rotate();
  assert_eq!(r.tag(), 1);
  assert_ne!(r.tag(), TAG_LOCK_ALWAYS);

  // Rotating an effective id leaves the reserved tag
  let r = PageId::new(1, FLAG_DATA, 9).rotate();
  assert_eq!(r.tag(), 1);
  OK
}

#[test]
fn test_full_cycle_never_hits_zero() -> Void {
  let mut id = PageId::new(0, 0, 1).with_tag(1);
  let mut seen = HashSet::new();
  for _ in 0..0xFFFF {
    assert!(seen.insert(id.tag()));
    assert_ne!(id.tag(), 0);
    id = id.rotate();
  }
  assert_eq!(id.tag(), 1);
  info!("{} distinct tags", seen.len());
  OK
}

#[test]
fn test_full_page_id() -> Void {
  let a = FullPageId::new(1, PageId(0x10));
  let b = FullPageId::new(2, PageId(0x10));
  assert_ne!(a, b);
  assert_eq!(a, FullPageId::new(1, PageId(0x10)));
  assert_eq!(
    a.to_string(),
    "FullPageId [pageId=0x0000000000000010, cacheId=1]"
  );
  OK
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(200))]

  #[test]
  fn prop_roundtrip(part in any::<u16>(), fl in any::<u8>(), idx in 0..=MAX_PAGE_INDEX, t in any::<u16>()) {
    let id = PageId::new(part, fl, idx).with_tag(t);
    prop_assert_eq!(id.partition(), part);
    prop_assert_eq!(id.flag(), fl);
    prop_assert_eq!(id.page_index(), idx);
    prop_assert_eq!(id.tag(), t);
    prop_assert_eq!(effective_page_id(id.raw()), page_id(part, fl, idx));
  }

  #[test]
  fn prop_rotate_changes_only_tag(raw in any::<u64>()) {
    let r = rotate_page_id(raw);
    prop_assert_eq!(effective_page_id(r), effective_page_id(raw));
    prop_assert_ne!(tag(r), 0);
    prop_assert_ne!(tag(r), tag(raw));
  }
}
