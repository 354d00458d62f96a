#![cfg_attr(docsrs, feature(doc_cfg))]

//! Page identifier codec / 页 ID 编解码
//!
//! A page id packs `(tag, partition, flag, index)` into 64 bits.
//! The 16-bit tag is a rotation counter: rotating a page invalidates every
//! handle minted against the previous id while the physical slot is reused.
//! 页 ID 将 (标签, 分区, 标志, 索引) 打包为 64 位。
//! 16 位标签为轮转计数器：轮转后旧 ID 的句柄全部失效，物理槽位被复用。

mod full;
mod id;

pub use full::FullPageId;
pub use id::{
  FLAG_DATA, FLAG_IDX, MAX_PAGE_INDEX, PageId, TAG_LOCK_ALWAYS, effective_page_id, flag,
  page_id, page_index, partition, rotate_page_id, tag,
};
