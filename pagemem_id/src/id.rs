//! 64-bit page id / 64 位页 ID
//!
//! Layout, least significant first 布局（低位在前）:
//!
//! ```text
//! [0..24)  page index 页索引
//! [24..32) flag       标志
//! [32..48) partition  分区
//! [48..64) tag        轮转标签
//! ```

use std::fmt;

const IDX_BITS: u32 = 24;
const FLAG_SHIFT: u32 = 24;
const PART_SHIFT: u32 = 32;
const TAG_SHIFT: u32 = 48;

const IDX_MASK: u64 = (1 << IDX_BITS) - 1;
const FLAG_MASK: u64 = 0xFF;
const PART_MASK: u64 = 0xFFFF;
const TAG_MASK: u64 = 0xFFFF;

/// Largest addressable page index / 最大页索引
pub const MAX_PAGE_INDEX: u32 = IDX_MASK as u32;

/// Tag accepted by lock acquisition as "any tag" / 加锁时表示"不校验标签"
pub const TAG_LOCK_ALWAYS: u16 = 0;

/// Data page flag / 数据页标志
pub const FLAG_DATA: u8 = 1;

/// Index page flag / 索引页标志
pub const FLAG_IDX: u8 = 2;

/// Page id with rotation tag / 带轮转标签的页 ID
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct PageId(pub u64);

impl PageId {
  pub const ZERO: Self = Self(0);

  /// Build id with tag 0 / 构造标签为 0 的 ID
  #[inline]
  pub const fn new(part: u16, flag: u8, idx: u32) -> Self {
    Self(page_id(part, flag, idx))
  }

  #[inline]
  pub const fn raw(self) -> u64 {
    self.0
  }

  #[inline]
  pub const fn is_zero(self) -> bool {
    self.0 == 0
  }

  #[inline]
  pub const fn tag(self) -> u16 {
    tag(self.0)
  }

  #[inline]
  pub const fn partition(self) -> u16 {
    partition(self.0)
  }

  #[inline]
  pub const fn flag(self) -> u8 {
    flag(self.0)
  }

  #[inline]
  pub const fn page_index(self) -> u32 {
    page_index(self.0)
  }

  /// Same page with the tag replaced / 替换标签
  #[inline]
  pub const fn with_tag(self, tag: u16) -> Self {
    Self((self.0 & !(TAG_MASK << TAG_SHIFT)) | ((tag as u64) << TAG_SHIFT))
  }

  /// Id without tag / 去掉标签的 ID
  #[inline]
  pub const fn effective(self) -> Self {
    Self(effective_page_id(self.0))
  }

  /// Next incarnation of this page / 该页的下一代 ID
  #[inline]
  pub const fn rotate(self) -> Self {
    Self(rotate_page_id(self.0))
  }
}

impl From<u64> for PageId {
  #[inline]
  fn from(id: u64) -> Self {
    Self(id)
  }
}

impl From<PageId> for u64 {
  #[inline]
  fn from(id: PageId) -> Self {
    id.0
  }
}

impl fmt::Debug for PageId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "PageId(0x{:016x} tag={} part={} flag={} idx={})",
      self.0,
      self.tag(),
      self.partition(),
      self.flag(),
      self.page_index()
    )
  }
}

impl fmt::Display for PageId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "0x{:016x}", self.0)
  }
}

/// Pack partition, flag and index, tag 0 / 打包分区、标志、索引（标签为 0）
#[inline]
pub const fn page_id(part: u16, flag: u8, idx: u32) -> u64 {
  debug_assert!(idx <= MAX_PAGE_INDEX);
  ((part as u64) << PART_SHIFT) | ((flag as u64) << FLAG_SHIFT) | (idx as u64 & IDX_MASK)
}

#[inline]
pub const fn partition(id: u64) -> u16 {
  ((id >> PART_SHIFT) & PART_MASK) as u16
}

#[inline]
pub const fn flag(id: u64) -> u8 {
  ((id >> FLAG_SHIFT) & FLAG_MASK) as u8
}

#[inline]
pub const fn tag(id: u64) -> u16 {
  ((id >> TAG_SHIFT) & TAG_MASK) as u16
}

#[inline]
pub const fn page_index(id: u64) -> u32 {
  (id & IDX_MASK) as u32
}

#[inline]
pub const fn effective_page_id(id: u64) -> u64 {
  id & !(TAG_MASK << TAG_SHIFT)
}

/// Increment tag, `0xFFFF` wraps to 1 (0 is reserved)
/// 标签加一，`0xFFFF` 回绕到 1（0 保留）
#[inline]
pub const fn rotate_page_id(id: u64) -> u64 {
  let next = match tag(id) {
    0xFFFF => 1,
    t => t + 1,
  };
  effective_page_id(id) | ((next as u64) << TAG_SHIFT)
}
