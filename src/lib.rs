// 该文件是 Lookout （瞭望） 项目的一部分。
// src/lib.rs - 库主文件
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::PathBuf;

#[cfg(feature = "image")]
pub mod detector;
#[cfg(feature = "image")]
pub mod frame;
pub mod input;
pub mod label;
pub mod model;
#[cfg(feature = "image")]
pub mod output;
pub mod postprocess;
#[cfg(feature = "image")]
pub mod preprocess;
#[cfg(feature = "image")]
pub mod task;

pub trait FromUrl {
  type Error;
  fn from_url(url: &url::Url) -> Result<Self, Self::Error>
  where
    Self: Sized;
}

pub trait FromUrlWithScheme: FromUrl {
  const SCHEME: &'static str;
}

/// 将 URL 路径解码为本地文件路径（处理 `%20` 等转义字符）
pub fn url_to_path(url: &url::Url) -> PathBuf {
  let raw = url.path();
  match urlencoding::decode(raw) {
    Ok(decoded) => PathBuf::from(decoded.into_owned()),
    Err(_) => PathBuf::from(raw),
  }
}

/// 解析 `a,b,c` 形式的数字列表，用于 URL 查询参数
pub(crate) fn parse_usize_list(value: &str) -> Option<Vec<usize>> {
  value
    .split(',')
    .map(|v| v.trim().parse::<usize>().ok())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn url_path_is_percent_decoded() {
    let url = url::Url::parse("replay:///tmp/my%20dump.bin").unwrap();
    assert_eq!(url_to_path(&url), PathBuf::from("/tmp/my dump.bin"));
  }

  #[test]
  fn usize_list_parsing() {
    assert_eq!(parse_usize_list("1, 25200,85"), Some(vec![1, 25200, 85]));
    assert_eq!(parse_usize_list("1,x"), None);
  }
}
