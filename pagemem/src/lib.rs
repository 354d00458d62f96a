#![cfg_attr(docsrs, feature(doc_cfg))]

//! # pagemem - Paged off-heap memory 分页堆外内存
//!
//! Fixed-size pages carved from append-only segments. Each slot carries a
//! tagged reader/writer lock word; freeing a page rotates its tag so stale
//! handles fail to lock instead of touching the reused slot.
//! 从只追加的段中切分定长页。每个槽位带标签读写锁字；释放页会轮转标签，
//! 旧句柄加锁失败而不会访问被复用的槽位。

mod config;
pub mod consts;
mod error;
mod memory;
mod page;
mod segment;

pub use config::Config;
pub use consts::PAGE_OVERHEAD;
pub use error::{Error, Result};
pub use memory::PageMemory;
pub use page::{Page, ReadGuard, WriteGuard};
pub use pagemem_id::{FullPageId, PageId, TAG_LOCK_ALWAYS};
