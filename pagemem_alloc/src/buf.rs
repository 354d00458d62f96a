//! Bounded views over off-heap memory (non-owning)
//! 堆外内存的有界视图（不持有所有权）

use std::{
  fmt::{Debug, Formatter, Result as FmtResult},
  marker::PhantomData,
  ops::Deref,
  ptr::NonNull,
  slice::{from_raw_parts, from_raw_parts_mut},
};

use crate::mem;

/// Mutable page view, little-endian typed access with bounds checks
/// 可写页视图，带边界检查的小端类型化读写
pub struct PageBuf<'a> {
  ptr: NonNull<u8>,
  len: usize,
  _life: PhantomData<&'a mut [u8]>,
}

// SAFETY: access is arbitrated by the page lock the holder acquired
// 由持有者获取的页锁保证同步
unsafe impl Send for PageBuf<'_> {}
unsafe impl Sync for PageBuf<'_> {}

/// Wrap raw memory as a view (zero-copy, native/little-endian order)
/// 将裸内存包装为视图（零拷贝，小端序）
///
/// # Safety
/// `ptr..ptr+len` must stay valid for `'a` and callers must synchronize writers.
#[inline(always)]
pub unsafe fn wrap_pointer<'a>(ptr: NonNull<u8>, len: usize) -> PageBuf<'a> {
  PageBuf {
    ptr,
    len,
    _life: PhantomData,
  }
}

impl<'a> PageBuf<'a> {
  /// View over a slice / 从切片创建视图
  #[inline]
  pub fn from_slice(slice: &'a mut [u8]) -> Self {
    Self {
      ptr: NonNull::from(&mut *slice).cast(),
      len: slice.len(),
      _life: PhantomData,
    }
  }

  /// Same bytes, lifetime cut to this borrow / 同一字节，生命周期缩短至本次借用
  #[inline]
  pub fn reborrow(&mut self) -> PageBuf<'_> {
    PageBuf {
      ptr: self.ptr,
      len: self.len,
      _life: PhantomData,
    }
  }

  /// Downgrade to read-only view / 降级为只读视图
  #[inline]
  pub fn into_read(self) -> ReadBuf<'a> {
    ReadBuf(self)
  }

  #[inline(always)]
  pub const fn len(&self) -> usize {
    self.len
  }

  #[inline(always)]
  pub const fn is_empty(&self) -> bool {
    self.len == 0
  }

  #[inline(always)]
  pub const fn as_ptr(&self) -> *const u8 {
    self.ptr.as_ptr()
  }

  #[inline(always)]
  pub fn as_mut_ptr(&mut self) -> *mut u8 {
    self.ptr.as_ptr()
  }

  #[inline(always)]
  pub fn as_slice(&self) -> &[u8] {
    unsafe { from_raw_parts(self.ptr.as_ptr(), self.len) }
  }

  #[inline(always)]
  pub fn as_mut_slice(&mut self) -> &mut [u8] {
    unsafe { from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
  }

  #[inline(always)]
  fn check(&self, off: usize, n: usize) {
    assert!(
      off.checked_add(n).is_some_and(|end| end <= self.len),
      "page access out of bounds: {off}+{n} > {}",
      self.len
    );
  }

  #[inline]
  pub fn get_u8(&self, off: usize) -> u8 {
    self.check(off, 1);
    unsafe { mem::get_u8(self.as_ptr(), off) }
  }

  #[inline]
  pub fn get_u16(&self, off: usize) -> u16 {
    self.check(off, 2);
    unsafe { mem::get_u16(self.as_ptr(), off) }
  }

  #[inline]
  pub fn get_u32(&self, off: usize) -> u32 {
    self.check(off, 4);
    unsafe { mem::get_u32(self.as_ptr(), off) }
  }

  #[inline]
  pub fn get_u64(&self, off: usize) -> u64 {
    self.check(off, 8);
    unsafe { mem::get_u64(self.as_ptr(), off) }
  }

  #[inline]
  pub fn put_u8(&mut self, off: usize, v: u8) {
    self.check(off, 1);
    unsafe { mem::put_u8(self.as_mut_ptr(), off, v) }
  }

  #[inline]
  pub fn put_u16(&mut self, off: usize, v: u16) {
    self.check(off, 2);
    unsafe { mem::put_u16(self.as_mut_ptr(), off, v) }
  }

  #[inline]
  pub fn put_u32(&mut self, off: usize, v: u32) {
    self.check(off, 4);
    unsafe { mem::put_u32(self.as_mut_ptr(), off, v) }
  }

  #[inline]
  pub fn put_u64(&mut self, off: usize, v: u64) {
    self.check(off, 8);
    unsafe { mem::put_u64(self.as_mut_ptr(), off, v) }
  }

  /// Move bytes inside the view, ranges may overlap
  /// 视图内移动字节，区间可重叠
  #[inline]
  pub fn copy_within(&mut self, src_off: usize, dst_off: usize, len: usize) {
    self.check(src_off, len);
    self.check(dst_off, len);
    let p = self.as_mut_ptr();
    unsafe { mem::copy_memory(p, p, src_off, dst_off, len) }
  }

  #[inline]
  pub fn fill(&mut self, off: usize, len: usize, v: u8) {
    self.check(off, len);
    unsafe { mem::set_memory(self.as_mut_ptr(), off, len, v) }
  }
}

impl Debug for PageBuf<'_> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("PageBuf")
      .field("ptr", &self.ptr)
      .field("len", &self.len)
      .finish()
  }
}

/// Read-only page view / 只读页视图
pub struct ReadBuf<'a>(PageBuf<'a>);

impl<'a> Deref for ReadBuf<'a> {
  type Target = PageBuf<'a>;

  #[inline(always)]
  fn deref(&self) -> &PageBuf<'a> {
    &self.0
  }
}

impl Debug for ReadBuf<'_> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_tuple("ReadBuf").field(&self.0).finish()
  }
}
