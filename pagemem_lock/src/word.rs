//! Lock word bit layout / 锁字位布局
//!
//! ```text
//! [0..16)  readers        读者数
//! 16       writer held    写锁已持有
//! 17       writer waiting 写者等待
//! [18..32) reserved       保留
//! [32..48) tag            标签
//! [48..64) unused         未使用
//! ```

use pagemem_id::TAG_LOCK_ALWAYS;

pub(crate) const READERS_MASK: u64 = 0xFFFF;
pub(crate) const WRITER: u64 = 1 << 16;
pub(crate) const WAITING: u64 = 1 << 17;
pub(crate) const TAG_SHIFT: u32 = 32;
pub(crate) const TAG_MASK: u64 = 0xFFFF << TAG_SHIFT;

#[inline(always)]
pub(crate) const fn readers(s: u64) -> u64 {
  s & READERS_MASK
}

#[inline(always)]
pub(crate) const fn tag(s: u64) -> u16 {
  ((s & TAG_MASK) >> TAG_SHIFT) as u16
}

#[inline(always)]
pub(crate) const fn with_tag(s: u64, tag: u16) -> u64 {
  (s & !TAG_MASK) | ((tag as u64) << TAG_SHIFT)
}

#[inline(always)]
pub(crate) const fn tag_ok(s: u64, expected: u16) -> bool {
  expected == TAG_LOCK_ALWAYS || tag(s) == expected
}

/// Free for a writer: no readers, no writer
/// 写者可获取：无读者、无写者
#[inline(always)]
pub(crate) const fn write_free(s: u64) -> bool {
  s & WRITER == 0 && readers(s) == 0
}

/// Free for a reader: no writer holding or waiting
/// 读者可获取：无写者持有或等待
#[inline(always)]
pub(crate) const fn read_free(s: u64) -> bool {
  s & (WRITER | WAITING) == 0
}
