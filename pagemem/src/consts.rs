//! 常量定义 Constants

/// 系统页头大小 System header size in front of every page body
pub const PAGE_OVERHEAD: usize = 24;

/// 允许的页大小 Supported page sizes
pub const PAGE_SIZES: [usize; 5] = [1024, 2048, 4096, 8192, 16384];

/// 段数上限 Segment count limit
pub const MAX_SEGMENTS: usize = 256;

// 系统页头布局 System header layout
// [0..8)   lock word
// [8..16)  current page id
// [16..20) state word
// [20..24) cache id
pub(crate) const LOCK_OFF: usize = 0;
pub(crate) const PAGE_ID_OFF: usize = 8;
pub(crate) const STATE_OFF: usize = 16;
pub(crate) const CACHE_ID_OFF: usize = 20;

// 状态位掩码 State bit masks
// [0..24]: Pin Count
// [24]: Allocated Bit
// [25]: Rotated Bit (recycle on last unpin)
pub const PIN_MASK: u32 = 0xFF_FFFF;
pub const ALLOCATED_BIT: u32 = 1 << 24;
pub const ROTATED_BIT: u32 = 1 << 25;

/// 新槽位的首个标签 Tag of a never-used slot
pub(crate) const FIRST_TAG: u16 = 1;
