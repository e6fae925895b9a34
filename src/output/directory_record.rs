// 该文件是 Lookout （瞭望） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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
  path::{Path, PathBuf},
  sync::atomic::{AtomicU16, Ordering},
};

use chrono::{Datelike, Utc};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::{
  frame::Frame,
  label::LabelTable,
  model::DetectResult,
  output::{Render, draw::Draw},
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

/// 旁路记录中类别的写法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
  Name,
  Id,
}

impl RecordKind {
  /// `record=id` 记录索引，其余取值记录名称
  pub fn from_query(value: &str) -> Self {
    if value == "id" {
      RecordKind::Id
    } else {
      RecordKind::Name
    }
  }
}

/// 按日期分目录保存叠加图，可选地写入同名 JSON 检测记录
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  draw: Draw,
  record: Option<RecordKind>,
  always: bool,
  frame_counter: AtomicU16,
}

impl DirectoryRecordOutput {
  pub const SCHEME: &'static str = "folder";

  pub fn new(directory: impl Into<PathBuf>, draw: Draw) -> Self {
    Self {
      directory: directory.into(),
      draw,
      record: None,
      always: false,
      frame_counter: AtomicU16::new(0),
    }
  }

  pub fn with_record(mut self, record: Option<RecordKind>) -> Self {
    self.record = record;
    self
  }

  /// 没有检测结果的帧也保存
  pub fn with_always(mut self, always: bool) -> Self {
    self.always = always;
    self
  }

  fn frame_id(&self) -> u16 {
    self.frame_counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
  }

  fn frame_path(&self) -> Result<PathBuf, DirectoryRecordOutputError> {
    let now = Utc::now();
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    std::fs::create_dir_all(&directory)?;

    Ok(directory.join(format!(
      "{}-{:04X}.png",
      now.format("%H-%M-%S"),
      self.frame_id()
    )))
  }

  fn record(
    &self,
    kind: RecordKind,
    result: &DetectResult,
    path: &Path,
  ) -> Result<(), DirectoryRecordOutputError> {
    let labels = self.draw.labels();
    let items: Vec<_> = result
      .items
      .iter()
      .map(|item| {
        json!({
          "class": record_class(kind, labels, item.class_index),
          "score": item.score,
          "rect": item.rect.as_array(),
        })
      })
      .collect();
    let path = path.with_extension("json");
    std::fs::write(&path, serde_json::to_string_pretty(&items)?)?;
    debug!("写入检测记录: {}", path.display());
    Ok(())
  }
}

fn record_class(kind: RecordKind, labels: &LabelTable, class_index: usize) -> serde_json::Value {
  match kind {
    RecordKind::Name => json!(labels.name_or_index(class_index)),
    RecordKind::Id => json!(class_index),
  }
}

impl Render for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, frame: &Frame, result: &DetectResult) -> Result<(), Self::Error> {
    if !self.always && result.is_empty() {
      return Ok(());
    }

    let path = self.frame_path()?;
    self.draw.draw_frame(frame, result).save(&path)?;
    if let Some(kind) = self.record {
      self.record(kind, result, &path)?;
    }
    Ok(())
  }
}
