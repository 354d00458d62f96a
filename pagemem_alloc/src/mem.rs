//! Typed accessors over raw off-heap memory
//! 堆外内存的类型化读写
//!
//! All multi-byte values are little-endian and may be unaligned.
//! 多字节值均为小端序，允许非对齐访问。
//!
//! # Safety
//! `ptr + off .. ptr + off + size_of::<T>()` must be valid for the access.

use std::ptr;

macro_rules! accessors {
  ($($get:ident, $put:ident, $t:ty;)*) => {
    $(
      #[inline(always)]
      pub unsafe fn $get(ptr: *const u8, off: usize) -> $t {
        <$t>::from_le(unsafe { ptr.add(off).cast::<$t>().read_unaligned() })
      }

      #[inline(always)]
      pub unsafe fn $put(ptr: *mut u8, off: usize, v: $t) {
        unsafe { ptr.add(off).cast::<$t>().write_unaligned(v.to_le()) }
      }
    )*
  };
}

accessors! {
  get_u16, put_u16, u16;
  get_u32, put_u32, u32;
  get_u64, put_u64, u64;
}

#[inline(always)]
pub unsafe fn get_u8(ptr: *const u8, off: usize) -> u8 {
  unsafe { *ptr.add(off) }
}

#[inline(always)]
pub unsafe fn put_u8(ptr: *mut u8, off: usize, v: u8) {
  unsafe { *ptr.add(off) = v }
}

/// Copy `len` bytes, regions may overlap (memmove)
/// 复制 `len` 字节，源与目标允许重叠
///
/// # Safety
/// Both ranges must be valid for the access.
#[inline]
pub unsafe fn copy_memory(src: *const u8, dst: *mut u8, src_off: usize, dst_off: usize, len: usize) {
  unsafe { ptr::copy(src.add(src_off), dst.add(dst_off), len) }
}

/// Fill `len` bytes with `v` / 以 `v` 填充 `len` 字节
///
/// # Safety
/// The range must be valid for writes.
#[inline]
pub unsafe fn set_memory(dst: *mut u8, off: usize, len: usize, v: u8) {
  unsafe { ptr::write_bytes(dst.add(off), v, len) }
}
