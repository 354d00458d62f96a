//! B+Tree meta page: first page id of every level
//! B+ 树元数据页：每层首页 ID
//!
//! ```text
//! 24  u8  levelsCount
//! 25  u64 × levelsCount
//! ```

use pagemem_alloc::PageBuf;
use pagemem_id::PageId;

use crate::{COMMON_HEADER_END, IoVersions, PageIo, page_type::T_BPLUS_META};

pub const LVLS_OFF: usize = COMMON_HEADER_END;
pub const REFS_OFF: usize = LVLS_OFF + 1;

const V1: BPlusMetaIo = BPlusMetaIo { ver: 1 };

pub static VERSIONS: IoVersions<BPlusMetaIo> = IoVersions::new(T_BPLUS_META, &[V1]);

pub struct BPlusMetaIo {
  ver: u16,
}

impl PageIo for BPlusMetaIo {
  fn typ(&self) -> u16 {
    T_BPLUS_META
  }

  fn ver(&self) -> u16 {
    self.ver
  }

  fn init_new_page(&self, buf: &mut PageBuf<'_>, page_id: PageId) {
    self.init_header(buf, page_id);
    buf.put_u8(LVLS_OFF, 0);
  }
}

impl BPlusMetaIo {
  /// Max levels for `page_size`; the count is one byte
  /// 指定页大小下的最大层数；层数占一个字节
  #[inline]
  pub const fn max_levels(page_size: usize) -> usize {
    let n = (page_size - REFS_OFF) / 8;
    if n > u8::MAX as usize { u8::MAX as usize } else { n }
  }

  #[inline]
  const fn offset(lvl: usize) -> usize {
    REFS_OFF + lvl * 8
  }

  /// Single-level tree rooted at `root` / 以 `root` 为根的单层树
  pub fn init_root(&self, buf: &mut PageBuf<'_>, root: PageId) {
    self.set_levels_count(buf, 1);
    self.set_first_page_id(buf, 0, root);
  }

  #[inline]
  pub fn levels_count(&self, buf: &PageBuf<'_>) -> usize {
    buf.get_u8(LVLS_OFF) as usize
  }

  pub fn set_levels_count(&self, buf: &mut PageBuf<'_>, lvls: usize) {
    assert!(
      lvls <= Self::max_levels(buf.len()),
      "levels count out of range: {lvls}"
    );
    buf.put_u8(LVLS_OFF, lvls as u8);
  }

  pub fn first_page_id(&self, buf: &PageBuf<'_>, lvl: usize) -> PageId {
    assert!(lvl < self.levels_count(buf), "level {lvl} out of range");
    PageId(buf.get_u64(Self::offset(lvl)))
  }

  pub fn set_first_page_id(&self, buf: &mut PageBuf<'_>, lvl: usize, id: PageId) {
    assert!(lvl < self.levels_count(buf), "level {lvl} out of range");
    assert!(!id.is_zero(), "zero first page id at level {lvl}");
    buf.put_u64(Self::offset(lvl), id.0);
  }

  /// Highest level holds the root / 最高层为根
  #[inline]
  pub fn root_level(&self, buf: &PageBuf<'_>) -> usize {
    let lvls = self.levels_count(buf);
    assert!(lvls > 0, "empty tree has no root");
    lvls - 1
  }

  /// Grow tree height by one on root split / 根分裂时树高加一
  pub fn add_root(&self, buf: &mut PageBuf<'_>, root: PageId) {
    let lvl = self.levels_count(buf);
    self.set_levels_count(buf, lvl + 1);
    self.set_first_page_id(buf, lvl, root);
  }

  /// Drop the root level on merge-down / 合并降层时去掉根层
  pub fn cut_root(&self, buf: &mut PageBuf<'_>) {
    let lvl = self.root_level(buf);
    self.set_levels_count(buf, lvl);
  }
}
