//! Pages-list node: doubly linked slab of page ids
//! 页列表节点：双向链接的页 ID 槽
//!
//! ```text
//! 24  u64 prevPageId
//! 32  u64 nextPageId
//! 40  u16 count
//! 42  u64 × count
//! ```
//!
//! Ids are appended at the tail and taken from the tail (LIFO).
//! 尾部追加、尾部取出（后进先出）。

use pagemem_alloc::PageBuf;
use pagemem_id::PageId;

use crate::{COMMON_HEADER_END, IoVersions, PageIo, page_type::T_PAGE_LIST_NODE};

pub const PREV_PAGE_ID_OFF: usize = COMMON_HEADER_END;
pub const NEXT_PAGE_ID_OFF: usize = PREV_PAGE_ID_OFF + 8;
pub const CNT_OFF: usize = NEXT_PAGE_ID_OFF + 8;
pub const PAGE_IDS_OFF: usize = CNT_OFF + 2;

const V1: PagesListNodeIo = PagesListNodeIo { ver: 1 };

pub static VERSIONS: IoVersions<PagesListNodeIo> = IoVersions::new(T_PAGE_LIST_NODE, &[V1]);

pub struct PagesListNodeIo {
  ver: u16,
}

impl PageIo for PagesListNodeIo {
  fn typ(&self) -> u16 {
    T_PAGE_LIST_NODE
  }

  fn ver(&self) -> u16 {
    self.ver
  }

  fn init_new_page(&self, buf: &mut PageBuf<'_>, page_id: PageId) {
    self.init_header(buf, page_id);
    self.set_count(buf, 0);
    self.set_prev_id(buf, PageId::ZERO);
    self.set_next_id(buf, PageId::ZERO);
  }
}

impl PagesListNodeIo {
  /// Max ids a page of `page_size` holds / 指定页大小可容纳的最大 ID 数
  #[inline]
  pub const fn capacity(page_size: usize) -> usize {
    (page_size - PAGE_IDS_OFF) >> 3
  }

  #[inline]
  const fn offset(idx: usize) -> usize {
    PAGE_IDS_OFF + 8 * idx
  }

  #[inline]
  pub fn prev_id(&self, buf: &PageBuf<'_>) -> PageId {
    PageId(buf.get_u64(PREV_PAGE_ID_OFF))
  }

  #[inline]
  pub fn set_prev_id(&self, buf: &mut PageBuf<'_>, id: PageId) {
    buf.put_u64(PREV_PAGE_ID_OFF, id.0);
  }

  #[inline]
  pub fn next_id(&self, buf: &PageBuf<'_>) -> PageId {
    PageId(buf.get_u64(NEXT_PAGE_ID_OFF))
  }

  #[inline]
  pub fn set_next_id(&self, buf: &mut PageBuf<'_>, id: PageId) {
    buf.put_u64(NEXT_PAGE_ID_OFF, id.0);
  }

  /// Stored id count / 已存 ID 数
  #[inline]
  pub fn count(&self, buf: &PageBuf<'_>) -> usize {
    buf.get_u16(CNT_OFF) as usize
  }

  fn set_count(&self, buf: &mut PageBuf<'_>, cnt: usize) {
    assert!(
      cnt <= i16::MAX as usize && cnt <= Self::capacity(buf.len()),
      "node count out of range: {cnt}"
    );
    buf.put_u16(CNT_OFF, cnt as u16);
  }

  #[inline]
  pub fn is_empty(&self, buf: &PageBuf<'_>) -> bool {
    self.count(buf) == 0
  }

  #[inline]
  fn at(&self, buf: &PageBuf<'_>, idx: usize) -> PageId {
    PageId(buf.get_u64(Self::offset(idx)))
  }

  /// Stored ids, oldest first / 已存 ID，按追加顺序
  pub fn page_ids<'b>(&self, buf: &'b PageBuf<'_>) -> impl Iterator<Item = PageId> + 'b {
    (0..self.count(buf)).map(move |i| PageId(buf.get_u64(Self::offset(i))))
  }

  /// Append id, returns its index or `None` when full
  /// 追加 ID，返回插入位置；已满返回 `None`
  pub fn add_page(&self, buf: &mut PageBuf<'_>, id: PageId) -> Option<usize> {
    debug_assert!(!id.is_zero());
    let cnt = self.count(buf);
    if cnt == Self::capacity(buf.len()) {
      return None;
    }
    buf.put_u64(Self::offset(cnt), id.0);
    self.set_count(buf, cnt + 1);
    Some(cnt)
  }

  /// Pop the last id, `None` when empty / 弹出末尾 ID，空则 `None`
  pub fn take_any_page(&self, buf: &mut PageBuf<'_>) -> Option<PageId> {
    let cnt = self.count(buf).checked_sub(1)?;
    self.set_count(buf, cnt);
    Some(self.at(buf, cnt))
  }

  /// Remove `id` keeping order of the rest; linear scan
  /// 删除 `id` 并保持其余顺序；线性扫描
  pub fn remove_page(&self, buf: &mut PageBuf<'_>, id: PageId) -> bool {
    assert!(!id.is_zero(), "remove of zero page id");
    let cnt = self.count(buf);
    let Some(i) = (0..cnt).find(|&i| self.at(buf, i) == id) else {
      return false;
    };
    if i != cnt - 1 {
      buf.copy_within(Self::offset(i + 1), Self::offset(i), 8 * (cnt - i - 1));
    }
    self.set_count(buf, cnt - 1);
    true
  }
}
