#![cfg_attr(docsrs, feature(doc_cfg))]

//! Aligned off-heap allocator & bounded page views
//! 对齐堆外内存分配器与有界页视图

mod buf;
mod error;
pub mod mem;

use std::{
  alloc::{Layout, alloc_zeroed, dealloc},
  fmt::{Debug, Formatter, Result as FmtResult},
  ops::{Deref, DerefMut},
  ptr::NonNull,
  slice::{from_raw_parts, from_raw_parts_mut},
};

pub use buf::{PageBuf, ReadBuf, wrap_pointer};
pub use error::{Error, Result};

/// Region alignment (must be power of 2) / 区域对齐（必须是 2 的幂）
pub const ALIGNMENT: usize = 4096;

#[inline(always)]
fn layout(size: usize) -> Result<Layout> {
  Ok(Layout::from_size_align(size, ALIGNMENT)?)
}

/// Zero-initialized aligned region (owns memory, never moves)
/// 零初始化的对齐内存区域（拥有所有权，地址不变）
pub struct AlignedBuf {
  ptr: NonNull<u8>,
  len: usize,
}

unsafe impl Send for AlignedBuf {}
unsafe impl Sync for AlignedBuf {}

impl AlignedBuf {
  /// Allocate zeroed region (OS optimized zero pages)
  /// 分配零初始化区域（OS 优化零页）
  #[inline]
  pub fn zeroed(size: usize) -> Result<Self> {
    let len = size.max(1);
    let lo = layout(len)?;
    let ptr = unsafe { alloc_zeroed(lo) };
    let ptr = NonNull::new(ptr).ok_or(Error::AllocFailed(len))?;
    Ok(Self { ptr, len })
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.len
  }

  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Base pointer, valid for writes while `self` lives
  /// 基址指针，`self` 存活期间可写
  ///
  /// Writes through it must be synchronized by the caller.
  #[inline(always)]
  pub fn base(&self) -> NonNull<u8> {
    self.ptr
  }

  #[inline(always)]
  pub fn as_ptr(&self) -> *const u8 {
    self.ptr.as_ptr()
  }

  /// View over `[off, off + len)` / 区间视图
  ///
  /// # Safety
  /// Caller must ensure synchronization via latches/locks
  #[inline]
  pub unsafe fn view(&self, off: usize, len: usize) -> PageBuf<'_> {
    assert!(off + len <= self.len, "view out of bounds");
    unsafe { wrap_pointer(self.ptr.add(off), len) }
  }
}

impl Drop for AlignedBuf {
  fn drop(&mut self) {
    // SAFETY: len was validated by layout() at allocation
    unsafe {
      dealloc(
        self.ptr.as_ptr(),
        Layout::from_size_align_unchecked(self.len, ALIGNMENT),
      )
    }
  }
}

impl Deref for AlignedBuf {
  type Target = [u8];

  #[inline]
  fn deref(&self) -> &[u8] {
    unsafe { from_raw_parts(self.ptr.as_ptr(), self.len) }
  }
}

impl DerefMut for AlignedBuf {
  #[inline]
  fn deref_mut(&mut self) -> &mut [u8] {
    unsafe { from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
  }
}

impl Debug for AlignedBuf {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("AlignedBuf")
      .field("ptr", &self.ptr)
      .field("len", &self.len)
      .finish()
  }
}
