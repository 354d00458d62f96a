#![cfg_attr(docsrs, feature(doc_cfg))]

//! Versioned on-page layouts / 版本化页内布局
//!
//! Every page body starts with a common header; the stored (type, version)
//! picks the layout that interprets the rest.
//! 每个页体以公共头开始，存储的 (类型, 版本) 决定其余部分的解释方式。

mod any;
pub mod bplus_meta;
mod error;
mod io;
pub mod list_meta;
pub mod node;

pub use any::{AnyIo, io_for, resolve};
pub use bplus_meta::BPlusMetaIo;
pub use error::{Error, Result};
pub use io::{
  COMMON_HEADER_END, CRC_OFF, IoVersions, PAGE_ID_OFF, PageIo, TYPE_OFF, VER_OFF, get_crc,
  get_page_id, get_type, get_version, set_crc, set_page_id,
};
pub use list_meta::PagesListMetaIo;
pub use node::PagesListNodeIo;

/// Page type codes 页类型码
pub mod page_type {
  pub const T_BPLUS_META: u16 = 2;
  pub const T_PAGE_LIST_META: u16 = 9;
  pub const T_PAGE_LIST_NODE: u16 = 10;
}
