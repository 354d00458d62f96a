//! Page memory configuration 页内存配置

use pagemem_id::MAX_PAGE_INDEX;
use pagemem_lock::DEFAULT_STRIPES;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  consts::{MAX_SEGMENTS, PAGE_OVERHEAD, PAGE_SIZES},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Page body size in bytes 页体大小（字节）
  pub page_size: usize,
  /// Segment size in bytes, a multiple of the slot size 段大小（字节），须为槽大小的整数倍
  pub segment_size: usize,
  /// Segment count limit 段数上限
  pub max_segments: usize,
  /// Lock parking stripes (power of 2) 锁挂起分段数（2 的幂）
  pub lock_stripes: usize,
}

impl Default for Config {
  fn default() -> Self {
    Self::with_pages_per_segment(4096, 1024, 16)
  }
}

impl Config {
  /// Config holding `n` pages per segment / 每段容纳 `n` 页的配置
  pub const fn with_pages_per_segment(page_size: usize, n: usize, max_segments: usize) -> Self {
    Self {
      page_size,
      segment_size: (page_size + PAGE_OVERHEAD) * n,
      max_segments,
      lock_stripes: DEFAULT_STRIPES,
    }
  }

  /// System header + body 系统页头 + 页体
  #[inline]
  pub const fn slot_size(&self) -> usize {
    self.page_size + PAGE_OVERHEAD
  }

  #[inline]
  pub const fn slots_per_segment(&self) -> usize {
    self.segment_size / self.slot_size()
  }

  pub fn validate(&self) -> Result<()> {
    let bad = |field, value| Err(Error::InvalidConfig { field, value });

    if !PAGE_SIZES.contains(&self.page_size) {
      return bad("page_size", self.page_size);
    }
    if self.segment_size == 0 || self.segment_size % self.slot_size() != 0 {
      return bad("segment_size", self.segment_size);
    }
    if self.max_segments == 0 || self.max_segments > MAX_SEGMENTS {
      return bad("max_segments", self.max_segments);
    }
    // Every slot index must fit the page id
    let total = self.slots_per_segment().saturating_mul(self.max_segments);
    if total > MAX_PAGE_INDEX as usize + 1 {
      return bad("segment_size", self.segment_size);
    }
    if !self.lock_stripes.is_power_of_two() {
      return bad("lock_stripes", self.lock_stripes);
    }
    Ok(())
  }
}
