// 该文件是 Lookout （瞭望） 项目的一部分。
// src/label.rs - 类别标签表
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

use std::{
  borrow::Cow,
  fs::File,
  io::{BufRead, BufReader},
  path::Path,
};

use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, url_to_path};

#[derive(Error, Debug)]
pub enum LabelError {
  #[error("标签文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("标签表为空")]
  Empty,
  #[error("标签文件第 {0} 行为空")]
  BlankLine(usize),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

/// 类别索引到名称的只读映射。一次性加载，之后不再修改。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
  names: Box<[String]>,
}

impl LabelTable {
  /// 每行一个类别名，行号即类别索引
  pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, LabelError> {
    let mut names = Vec::new();
    for line in reader.lines() {
      let line = line?;
      names.push(line.strip_suffix('\r').unwrap_or(&line).to_string());
    }
    Self::from_names(names)
  }

  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LabelError> {
    let path = path.as_ref();
    info!("加载标签文件: {}", path.display());
    let table = Self::from_reader(BufReader::new(File::open(path)?))?;
    info!("标签加载完成，共 {} 个类别", table.len());
    Ok(table)
  }

  /// 按顺序给出的类别名；空表或空白名称都是错误
  pub fn from_names<I, S>(names: I) -> Result<Self, LabelError>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let names: Vec<String> = names.into_iter().map(Into::into).collect();
    if let Some(index) = names.iter().position(|name| name.trim().is_empty()) {
      error!("标签第 {} 行为空", index + 1);
      return Err(LabelError::BlankLine(index + 1));
    }
    if names.is_empty() {
      return Err(LabelError::Empty);
    }

    debug!("已加载类别: {:?}", names);
    Ok(Self {
      names: names.into_boxed_slice(),
    })
  }

  pub fn get(&self, index: usize) -> Option<&str> {
    self.names.get(index).map(String::as_str)
  }

  /// 找不到名称时退回到数字索引
  pub fn name_or_index(&self, index: usize) -> Cow<'_, str> {
    match self.get(index) {
      Some(name) => Cow::Borrowed(name),
      None => Cow::Owned(index.to_string()),
    }
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.names.iter().map(String::as_str)
  }
}

impl FromUrlWithScheme for LabelTable {
  const SCHEME: &'static str = "labels";
}

impl FromUrl for LabelTable {
  type Error = LabelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(LabelError::SchemeMismatch);
    }
    Self::from_path(url_to_path(url))
  }
}

#[cfg(test)]
mod tests {
  use std::io::{Cursor, Write};

  use super::*;

  #[test]
  fn line_order_defines_index() {
    let table = LabelTable::from_reader(Cursor::new("person\nbicycle\r\ncar\n")).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.get(0), Some("person"));
    assert_eq!(table.get(1), Some("bicycle"));
    assert_eq!(table.get(2), Some("car"));
    assert_eq!(table.get(3), None);
    assert_eq!(table.name_or_index(3), "3");
  }

  #[test]
  fn rejects_empty_and_blank_lines() {
    assert!(matches!(
      LabelTable::from_reader(Cursor::new("")),
      Err(LabelError::Empty)
    ));
    assert!(matches!(
      LabelTable::from_reader(Cursor::new("person\n\ncar\n")),
      Err(LabelError::BlankLine(2))
    ));
  }

  #[test]
  fn names_are_validated_like_files() {
    let table = LabelTable::from_names(["cat", "dog"]).unwrap();
    assert_eq!(table.name_or_index(1), "dog");
    assert!(matches!(
      LabelTable::from_names(Vec::<String>::new()),
      Err(LabelError::Empty)
    ));
    assert!(matches!(
      LabelTable::from_names(["cat", " "]),
      Err(LabelError::BlankLine(2))
    ));
  }

  #[test]
  fn loads_from_url() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "cat").unwrap();
    writeln!(file, "dog").unwrap();
    file.flush().unwrap();

    let url = Url::parse(&format!("labels://{}", file.path().display())).unwrap();
    let table = LabelTable::from_url(&url).unwrap();
    assert_eq!(table.iter().collect::<Vec<_>>(), vec!["cat", "dog"]);

    let wrong = Url::parse("image:///tmp/classes.txt").unwrap();
    assert!(matches!(
      LabelTable::from_url(&wrong),
      Err(LabelError::SchemeMismatch)
    ));
  }
}
