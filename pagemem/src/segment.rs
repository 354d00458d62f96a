//! Segments and page slots 段与页槽位
//!
//! A segment is one aligned region cut into fixed-size slots. Slot indexes are
//! global: `segment = idx / slots_per_segment`.
//! 段是一块对齐内存，切分为定长槽位。槽位索引全局编号。

use std::{
  ptr::NonNull,
  sync::atomic::{AtomicU32, AtomicU64, Ordering::Relaxed},
};

use log::debug;
use pagemem_alloc::{AlignedBuf, PageBuf, wrap_pointer};
use parking_lot::Mutex;

use crate::{
  Result,
  consts::{CACHE_ID_OFF, LOCK_OFF, PAGE_ID_OFF, PAGE_OVERHEAD, STATE_OFF},
};

pub(crate) struct Segment {
  buf: AlignedBuf,
  /// Recycled slot indexes 回收的槽位索引
  free: Mutex<Vec<u32>>,
  /// Never-used slots start here 此后为未使用槽位
  next: AtomicU32,
  base: u32,
  slots: u32,
  slot_size: usize,
}

impl Segment {
  pub fn new(idx: usize, slots: usize, slot_size: usize) -> Result<Self> {
    let buf = AlignedBuf::zeroed(slots * slot_size)?;
    debug!("segment {idx}: {slots} slots at {:p}", buf.as_ptr());
    Ok(Self {
      buf,
      free: Mutex::new(Vec::new()),
      next: AtomicU32::new(0),
      base: (idx * slots) as u32,
      slots: slots as u32,
      slot_size,
    })
  }

  /// Pop a recycled slot / 弹出回收槽位
  #[inline]
  pub fn pop_free(&self) -> Option<u32> {
    self.free.lock().pop()
  }

  #[inline]
  pub fn push_free(&self, idx: u32) {
    self.free.lock().push(idx);
  }

  #[inline]
  pub fn free_len(&self) -> usize {
    self.free.lock().len()
  }

  /// Claim the next never-used slot / 领取下一个未使用槽位
  #[inline]
  pub fn bump(&self) -> Option<u32> {
    self
      .next
      .fetch_update(Relaxed, Relaxed, |n| (n < self.slots).then_some(n + 1))
      .ok()
      .map(|n| self.base + n)
  }

  /// Slot of global index `idx`, which must belong here
  /// 全局索引 `idx` 对应槽位，须属于本段
  #[inline]
  pub fn slot(&self, idx: u32) -> Slot<'_> {
    let local = (idx - self.base) as usize;
    debug_assert!(local < self.slots as usize);
    // SAFETY: local < slots, so the slot lies inside buf
    let ptr = unsafe { self.buf.base().add(local * self.slot_size) };
    Slot {
      ptr,
      page_size: self.slot_size - PAGE_OVERHEAD,
      _seg: self,
    }
  }
}

/// One slot: system header followed by the page body
/// 单个槽位：系统页头 + 页体
#[derive(Clone, Copy)]
pub(crate) struct Slot<'a> {
  ptr: NonNull<u8>,
  page_size: usize,
  _seg: &'a Segment,
}

// SAFETY: header fields are atomics, the body is guarded by the page lock
unsafe impl Send for Slot<'_> {}
unsafe impl Sync for Slot<'_> {}

impl<'a> Slot<'a> {
  // Slot sizes are multiples of 8 and segments are page aligned, so every
  // header field is naturally aligned for its atomic.
  #[inline(always)]
  fn u64_at(&self, off: usize) -> &'a AtomicU64 {
    unsafe { AtomicU64::from_ptr(self.ptr.as_ptr().add(off).cast()) }
  }

  #[inline(always)]
  fn u32_at(&self, off: usize) -> &'a AtomicU32 {
    unsafe { AtomicU32::from_ptr(self.ptr.as_ptr().add(off).cast()) }
  }

  #[inline]
  pub fn lock(&self) -> &'a AtomicU64 {
    self.u64_at(LOCK_OFF)
  }

  /// Current page id of the slot / 槽位当前页 ID
  #[inline]
  pub fn page_id(&self) -> &'a AtomicU64 {
    self.u64_at(PAGE_ID_OFF)
  }

  /// Pin count and flags / 固定计数与标志
  #[inline]
  pub fn state(&self) -> &'a AtomicU32 {
    self.u32_at(STATE_OFF)
  }

  #[inline]
  pub fn cache_id(&self) -> &'a AtomicU32 {
    self.u32_at(CACHE_ID_OFF)
  }

  /// Start of the system header / 系统页头起始地址
  #[inline]
  pub fn abs_ptr(&self) -> NonNull<u8> {
    self.ptr
  }

  /// Start of the page body / 页体起始地址
  #[inline]
  pub fn body_ptr(&self) -> NonNull<u8> {
    unsafe { self.ptr.add(PAGE_OVERHEAD) }
  }

  /// View over the page body / 页体视图
  ///
  /// # Safety
  /// Caller must hold the page lock matching the access.
  #[inline]
  pub unsafe fn body(&self) -> PageBuf<'a> {
    unsafe { wrap_pointer(self.body_ptr(), self.page_size) }
  }
}
