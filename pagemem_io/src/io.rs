//! Common page header & version registry
//! 公共页头与版本注册表
//!
//! ```text
//! 0   u16 type     页类型
//! 2   u16 version  格式版本
//! 4   u64 pageId   所属页 ID
//! 12  u32 crc      校验和槽（由外部计算）
//! 16  reserved     保留
//! 24  COMMON_HEADER_END
//! ```

use log::error;
use pagemem_alloc::PageBuf;
use pagemem_id::PageId;

pub const TYPE_OFF: usize = 0;
pub const VER_OFF: usize = 2;
pub const PAGE_ID_OFF: usize = 4;
pub const CRC_OFF: usize = 12;
pub const COMMON_HEADER_END: usize = 24;

#[inline]
pub fn get_type(buf: &PageBuf<'_>) -> u16 {
  buf.get_u16(TYPE_OFF)
}

#[inline]
pub fn get_version(buf: &PageBuf<'_>) -> u16 {
  buf.get_u16(VER_OFF)
}

#[inline]
pub fn get_page_id(buf: &PageBuf<'_>) -> PageId {
  PageId(buf.get_u64(PAGE_ID_OFF))
}

#[inline]
pub fn set_page_id(buf: &mut PageBuf<'_>, id: PageId) {
  buf.put_u64(PAGE_ID_OFF, id.0);
}

#[inline]
pub fn get_crc(buf: &PageBuf<'_>) -> u32 {
  buf.get_u32(CRC_OFF)
}

#[inline]
pub fn set_crc(buf: &mut PageBuf<'_>, crc: u32) {
  buf.put_u32(CRC_OFF, crc);
}

/// Versioned on-page layout / 版本化页内布局
pub trait PageIo: Sync + 'static {
  /// Page type code / 页类型码
  fn typ(&self) -> u16;

  /// Format version / 格式版本
  fn ver(&self) -> u16;

  /// Write common header: type, version, page id echo, zero crc
  /// 写入公共头：类型、版本、页 ID、清零校验和
  fn init_header(&self, buf: &mut PageBuf<'_>, page_id: PageId) {
    buf.fill(0, COMMON_HEADER_END, 0);
    buf.put_u16(TYPE_OFF, self.typ());
    buf.put_u16(VER_OFF, self.ver());
    set_page_id(buf, page_id);
    set_crc(buf, 0);
  }

  /// Initialize a fresh page; layouts override to zero their own fields
  /// 初始化新页；具体布局覆盖以清零自身字段
  fn init_new_page(&self, buf: &mut PageBuf<'_>, page_id: PageId) {
    self.init_header(buf, page_id);
  }

  /// Fatal when the stored header is not this layout
  /// 存储的页头与本布局不符时致命错误
  fn assert_page(&self, buf: &PageBuf<'_>) {
    let (typ, ver) = (get_type(buf), get_version(buf));
    if typ != self.typ() || ver != self.ver() {
      error!(
        "page io mismatch: stored {typ}/{ver}, expected {}/{}",
        self.typ(),
        self.ver()
      );
      panic!(
        "page io mismatch: stored {typ}/{ver}, expected {}/{}",
        self.typ(),
        self.ver()
      );
    }
  }
}

/// All versions of one page type, oldest first
/// 同一页类型的全部版本，按版本升序
pub struct IoVersions<T: 'static> {
  typ: u16,
  vers: &'static [T],
}

impl<T: PageIo> IoVersions<T> {
  /// `vers[i]` must be version `i + 1` / `vers[i]` 必须为第 `i + 1` 版
  pub const fn new(typ: u16, vers: &'static [T]) -> Self {
    assert!(!vers.is_empty());
    Self { typ, vers }
  }

  #[inline]
  pub fn typ(&self) -> u16 {
    self.typ
  }

  /// Version used for new pages / 新页使用的版本
  #[inline]
  pub fn latest(&self) -> &'static T {
    &self.vers[self.vers.len() - 1]
  }

  #[inline]
  pub fn for_version(&self, ver: u16) -> Option<&'static T> {
    let io = self.vers.get((ver as usize).checked_sub(1)?)?;
    debug_assert_eq!(io.ver(), ver);
    Some(io)
  }

  /// Layout of a stored page, fatal on foreign type or unknown version
  /// 读取已存页的布局，类型不符或版本未知时致命错误
  pub fn for_page(&self, buf: &PageBuf<'_>) -> &'static T {
    let (typ, ver) = (get_type(buf), get_version(buf));
    match self.for_version(ver) {
      Some(io) if typ == self.typ => io,
      _ => {
        error!("page {typ}/{ver} is not of type {}", self.typ);
        panic!("page {typ}/{ver} is not of type {}", self.typ);
      }
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = &'static T> {
    self.vers.iter()
  }
}
