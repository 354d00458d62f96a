//! Pages-list meta page: bucket → tail page id records
//! 页列表元数据页：桶 → 尾页 ID 记录
//!
//! ```text
//! 24  u16 count
//! 26  u64 nextMetaPageId
//! 34  {u16 bucket, u64 tailId} × count
//! ```

use std::collections::HashMap;

use pagemem_alloc::PageBuf;
use pagemem_id::PageId;

use crate::{COMMON_HEADER_END, IoVersions, PageIo, page_type::T_PAGE_LIST_META};

pub const CNT_OFF: usize = COMMON_HEADER_END;
pub const NEXT_META_PAGE_OFF: usize = CNT_OFF + 2;
pub const ITEMS_OFF: usize = NEXT_META_PAGE_OFF + 8;
pub const ITEM_SIZE: usize = 10;

const V1: PagesListMetaIo = PagesListMetaIo { ver: 1 };

pub static VERSIONS: IoVersions<PagesListMetaIo> = IoVersions::new(T_PAGE_LIST_META, &[V1]);

pub struct PagesListMetaIo {
  ver: u16,
}

impl PageIo for PagesListMetaIo {
  fn typ(&self) -> u16 {
    T_PAGE_LIST_META
  }

  fn ver(&self) -> u16 {
    self.ver
  }

  fn init_new_page(&self, buf: &mut PageBuf<'_>, page_id: PageId) {
    self.init_header(buf, page_id);
    self.set_count(buf, 0);
    self.set_next_meta_page_id(buf, PageId::ZERO);
  }
}

impl PagesListMetaIo {
  #[inline]
  pub const fn capacity(page_size: usize) -> usize {
    (page_size - ITEMS_OFF) / ITEM_SIZE
  }

  #[inline]
  const fn offset(idx: usize) -> usize {
    ITEMS_OFF + ITEM_SIZE * idx
  }

  #[inline]
  pub fn count(&self, buf: &PageBuf<'_>) -> usize {
    buf.get_u16(CNT_OFF) as usize
  }

  fn set_count(&self, buf: &mut PageBuf<'_>, cnt: usize) {
    assert!(cnt <= i16::MAX as usize, "meta count out of range: {cnt}");
    buf.put_u16(CNT_OFF, cnt as u16);
  }

  #[inline]
  pub fn reset_count(&self, buf: &mut PageBuf<'_>) {
    self.set_count(buf, 0);
  }

  #[inline]
  pub fn next_meta_page_id(&self, buf: &PageBuf<'_>) -> PageId {
    PageId(buf.get_u64(NEXT_META_PAGE_OFF))
  }

  #[inline]
  pub fn set_next_meta_page_id(&self, buf: &mut PageBuf<'_>, id: PageId) {
    buf.put_u64(NEXT_META_PAGE_OFF, id.0);
  }

  /// Write `tails[tails_off..]` under `bucket` until the page is full,
  /// returns the number written (0 when already full)
  /// 将 `tails[tails_off..]` 写入 `bucket`，直到页满；返回写入数（已满为 0）
  pub fn add_tails(
    &self,
    buf: &mut PageBuf<'_>,
    bucket: u16,
    tails: &[PageId],
    tails_off: usize,
  ) -> usize {
    assert!(bucket <= i16::MAX as u16, "bucket out of range: {bucket}");

    let cnt = self.count(buf);
    let cap = Self::capacity(buf.len());
    if cnt == cap {
      return 0;
    }

    let write = (cap - cnt).min(tails.len().saturating_sub(tails_off));
    let mut off = Self::offset(cnt);
    for tail in &tails[tails_off..tails_off + write] {
      buf.put_u16(off, bucket);
      buf.put_u64(off + 2, tail.0);
      off += ITEM_SIZE;
    }

    self.set_count(buf, cnt + write);
    write
  }

  /// Collect stored tails per bucket / 按桶收集尾页 ID
  pub fn buckets_data(&self, buf: &PageBuf<'_>, res: &mut HashMap<u16, Vec<PageId>>) {
    let mut off = Self::offset(0);
    for _ in 0..self.count(buf) {
      let bucket = buf.get_u16(off);
      let tail = PageId(buf.get_u64(off + 2));
      assert!(!tail.is_zero(), "zero tail id in bucket {bucket}");
      res.entry(bucket).or_default().push(tail);
      off += ITEM_SIZE;
    }
  }
}
