//! 错误定义 Error definitions

use pagemem_id::PageId;
use thiserror::Error;

/// 结果类型 Result type
pub type Result<T> = std::result::Result<T, Error>;

/// 错误类型 Error type
#[derive(Error, Debug)]
pub enum Error {
  #[error("Allocation error: {0}")]
  Alloc(#[from] pagemem_alloc::Error),

  #[error("Page io error: {0}")]
  Io(#[from] pagemem_io::Error),

  #[error("invalid config: {field} = {value}")]
  InvalidConfig { field: &'static str, value: usize },

  #[error("out of memory: {segments} of {max} segments in use")]
  OutOfMemory { segments: usize, max: usize },

  #[error("page not found: {0}")]
  PageNotFound(PageId),

  #[error("page not allocated: {0}")]
  PageNotAllocated(PageId),

  #[error("cache mismatch for {page_id}: expected {expected}, got {actual}")]
  CacheMismatch {
    page_id: PageId,
    expected: u32,
    actual: u32,
  },
}
