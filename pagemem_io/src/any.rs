//! Dispatch by stored (type, version) / 按存储的 (类型, 版本) 分派

use pagemem_alloc::PageBuf;

use crate::{
  BPlusMetaIo, Error, PageIo, PagesListMetaIo, PagesListNodeIo, Result, bplus_meta, get_type,
  get_version, list_meta, node,
  page_type::{T_BPLUS_META, T_PAGE_LIST_META, T_PAGE_LIST_NODE},
};

/// Any known layout / 任一已知布局
#[derive(Clone, Copy)]
pub enum AnyIo {
  BPlusMeta(&'static BPlusMetaIo),
  PagesListMeta(&'static PagesListMetaIo),
  PagesListNode(&'static PagesListNodeIo),
}

impl AnyIo {
  #[inline]
  pub fn as_dyn(self) -> &'static dyn PageIo {
    match self {
      Self::BPlusMeta(io) => io,
      Self::PagesListMeta(io) => io,
      Self::PagesListNode(io) => io,
    }
  }

  #[inline]
  pub fn typ(self) -> u16 {
    self.as_dyn().typ()
  }

  #[inline]
  pub fn ver(self) -> u16 {
    self.as_dyn().ver()
  }
}

impl std::fmt::Debug for AnyIo {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      Self::BPlusMeta(_) => "BPlusMeta",
      Self::PagesListMeta(_) => "PagesListMeta",
      Self::PagesListNode(_) => "PagesListNode",
    };
    write!(f, "{name}(ver {})", self.ver())
  }
}

/// Resolve a layout, unknown pairs are errors
/// 查找布局，未知组合返回错误
pub fn io_for(typ: u16, ver: u16) -> Result<AnyIo> {
  let unknown = Error::UnknownVersion { typ, ver };
  match typ {
    T_BPLUS_META => bplus_meta::VERSIONS
      .for_version(ver)
      .map(AnyIo::BPlusMeta)
      .ok_or(unknown),
    T_PAGE_LIST_META => list_meta::VERSIONS
      .for_version(ver)
      .map(AnyIo::PagesListMeta)
      .ok_or(unknown),
    T_PAGE_LIST_NODE => node::VERSIONS
      .for_version(ver)
      .map(AnyIo::PagesListNode)
      .ok_or(unknown),
    _ => Err(Error::UnknownPageType { typ, ver }),
  }
}

/// Layout of a stored page / 已存页的布局
#[inline]
pub fn resolve(buf: &PageBuf<'_>) -> Result<AnyIo> {
  io_for(get_type(buf), get_version(buf))
}
