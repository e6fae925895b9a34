// 该文件是 Lookout （瞭望） 项目的一部分。
// src/postprocess.rs - 检测后处理流水线
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

//! 原始输出张量 → 解码过滤 → 坐标映射 → 按类别 NMS → 检测结果。
//!
//! 整条流水线是纯函数，没有 I/O，也不持有跨帧状态。

use thiserror::Error;
use tracing::debug;

use crate::model::{DetectResult, RawOutputTensor};

mod decode;
mod geometry;
mod mapping;
mod nms;

pub use self::decode::{BOX_FIELDS, Candidate, Decoder, decode_and_filter};
pub use self::geometry::Rect;
pub use self::mapping::{ScaleParams, map_to_display_space};
pub use self::nms::{DEFAULT_IOU_THRESHOLD, suppress};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.30;
pub const COCO_CLASS_NUM: usize = 80;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PostProcessError {
  #[error("类别数量不能为 0")]
  NoClasses,
  #[error("输出行宽不匹配: 期望 {expected}, 实际 {actual}")]
  RowWidthMismatch { expected: usize, actual: usize },
  #[error("输出长度 {len} 不是行宽 {row_width} 的整数倍")]
  TruncatedTensor { len: usize, row_width: usize },
}

/// 后处理参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostProcessConfig {
  pub num_classes: usize,
  pub confidence_threshold: f32,
  pub iou_threshold: f32,
  pub max_detections: Option<usize>,
}

impl Default for PostProcessConfig {
  fn default() -> Self {
    Self {
      num_classes: COCO_CLASS_NUM,
      confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
      iou_threshold: DEFAULT_IOU_THRESHOLD,
      max_detections: None,
    }
  }
}

impl PostProcessConfig {
  pub fn with_num_classes(mut self, num_classes: usize) -> Self {
    self.num_classes = num_classes;
    self
  }

  pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
    self.confidence_threshold = threshold;
    self
  }

  pub fn with_iou_threshold(mut self, threshold: f32) -> Self {
    self.iou_threshold = threshold;
    self
  }

  pub fn with_max_detections(mut self, max_detections: Option<usize>) -> Self {
    self.max_detections = max_detections;
    self
  }
}

#[derive(Debug, Clone, Default)]
pub struct PostProcessor {
  config: PostProcessConfig,
}

impl PostProcessor {
  pub fn new(config: PostProcessConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &PostProcessConfig {
    &self.config
  }

  pub fn process(
    &self,
    tensor: &RawOutputTensor,
    scale: &ScaleParams,
  ) -> Result<DetectResult, PostProcessError> {
    let mapped = decode_and_filter(
      tensor,
      self.config.num_classes,
      self.config.confidence_threshold,
    )?
    .map(|candidate| map_to_display_space(&candidate, scale))
    .collect::<Vec<_>>();
    debug!("置信度过滤后剩余 {} 个候选框", mapped.len());

    let kept = suppress(
      mapped,
      self.config.iou_threshold,
      self.config.max_detections,
    );
    debug!("NMS 后保留 {} 个检测结果", kept.len());

    Ok(DetectResult::from(kept))
  }
}

/// 不带配置对象的组合入口，不限制检测数量
pub fn process(
  tensor: &RawOutputTensor,
  num_classes: usize,
  confidence_threshold: f32,
  scale: &ScaleParams,
  iou_threshold: f32,
) -> Result<DetectResult, PostProcessError> {
  PostProcessor::new(
    PostProcessConfig::default()
      .with_num_classes(num_classes)
      .with_confidence_threshold(confidence_threshold)
      .with_iou_threshold(iou_threshold),
  )
  .process(tensor, scale)
}
