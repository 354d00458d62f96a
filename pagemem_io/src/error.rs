//! 错误定义 Error definitions

use thiserror::Error;

/// 结果类型 Result type
pub type Result<T> = std::result::Result<T, Error>;

/// 错误类型 Error type
#[derive(Error, Debug)]
pub enum Error {
  #[error("unknown page type: {typ} (ver {ver})")]
  UnknownPageType { typ: u16, ver: u16 },

  #[error("unknown version {ver} of page type {typ}")]
  UnknownVersion { typ: u16, ver: u16 },
}
