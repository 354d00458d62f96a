//! Full page id: cache id + page id / 完整页 ID：缓存 ID + 页 ID

use std::fmt;

use crate::PageId;

/// Pages with equal page ids in different caches are distinct
/// 不同缓存中页 ID 相同的页互不相同
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FullPageId {
  pub cache_id: u32,
  pub page_id: PageId,
}

impl FullPageId {
  #[inline]
  pub const fn new(cache_id: u32, page_id: PageId) -> Self {
    Self { cache_id, page_id }
  }
}

impl fmt::Debug for FullPageId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(self, f)
  }
}

impl fmt::Display for FullPageId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "FullPageId [pageId={}, cacheId={}]",
      self.page_id, self.cache_id
    )
  }
}
