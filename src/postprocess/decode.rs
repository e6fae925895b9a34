// 该文件是 Lookout （瞭望） 项目的一部分。
// src/postprocess/decode.rs - 原始输出解码与置信度过滤
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

use std::slice::ChunksExact;

use tracing::{debug, error};

use crate::{model::RawOutputTensor, postprocess::PostProcessError};

/// 每行前 5 个元素: cx, cy, w, h, objectness
pub const BOX_FIELDS: usize = 5;

/// 模型输入坐标系下的候选框
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
  pub center_x: f32,
  pub center_y: f32,
  pub width: f32,
  pub height: f32,
  pub class_index: usize,
  /// objectness * 最大类别概率
  pub score: f32,
}

/// 单次遍历的候选框迭代器，按锚点顺序产出
#[derive(Debug)]
pub struct Decoder<'a> {
  rows: ChunksExact<'a, f32>,
  threshold: f32,
}

impl Iterator for Decoder<'_> {
  type Item = Candidate;

  fn next(&mut self) -> Option<Self::Item> {
    for row in self.rows.by_ref() {
      if let Some(candidate) = decode_row(row, self.threshold) {
        return Some(candidate);
      }
    }
    None
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    (0, Some(self.rows.len()))
  }
}

/// 校验张量布局并返回候选框迭代器。
///
/// 布局错误在产出任何候选框之前报告；空张量不产出候选框。
pub fn decode_and_filter(
  tensor: &RawOutputTensor,
  num_classes: usize,
  confidence_threshold: f32,
) -> Result<Decoder<'_>, PostProcessError> {
  if num_classes == 0 {
    error!("类别数量不能为 0");
    return Err(PostProcessError::NoClasses);
  }

  let row_width = BOX_FIELDS + num_classes;
  if let Some(declared) = tensor.declared_row_width()
    && declared != row_width
  {
    error!(
      "输出行宽不匹配: 期望 {} (5 + {}), 实际 {}",
      row_width, num_classes, declared
    );
    return Err(PostProcessError::RowWidthMismatch {
      expected: row_width,
      actual: declared,
    });
  }

  if tensor.len() % row_width != 0 {
    error!(
      "输出长度 {} 不是行宽 {} 的整数倍",
      tensor.len(),
      row_width
    );
    return Err(PostProcessError::TruncatedTensor {
      len: tensor.len(),
      row_width,
    });
  }

  debug!(
    "解码输出张量: {} 个锚点, 每行 {} 个元素",
    tensor.len() / row_width,
    row_width
  );

  Ok(Decoder {
    rows: tensor.as_slice().chunks_exact(row_width),
    threshold: confidence_threshold,
  })
}

fn decode_row(row: &[f32], threshold: f32) -> Option<Candidate> {
  let objectness = row[4];
  let (class_index, max_prob) = argmax(&row[BOX_FIELDS..])?;
  let score = objectness * max_prob;

  // 等于阈值的候选框同样丢弃，NaN 也在此被过滤
  if !(score > threshold) {
    return None;
  }

  Some(Candidate {
    center_x: row[0],
    center_y: row[1],
    width: row[2],
    height: row[3],
    class_index,
    score,
  })
}

/// 并列时取第一个最大值
fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
  let (&first, rest) = scores.split_first()?;
  let mut best = (0, first);
  for (i, &value) in rest.iter().enumerate() {
    if value > best.1 {
      best = (i + 1, value);
    }
  }
  Some(best)
}
