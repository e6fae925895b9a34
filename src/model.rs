// 该文件是 Lookout （瞭望） 项目的一部分。
// src/model.rs - 模型接口与张量定义
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

use crate::{label::LabelTable, postprocess::Rect};

/// 推理引擎。模型本身是黑盒：输入归一化后的张量，输出固定布局的原始张量。
pub trait Model {
  type Error;

  fn infer(&self, input: &InputTensor) -> Result<RawOutputTensor, Self::Error>;
}

/// 模型输入张量，NCHW 布局，数值已归一化到 [0, 1]
#[derive(Debug, Clone)]
pub struct InputTensor {
  data: Box<[f32]>,
  width: usize,
  height: usize,
}

pub const INPUT_CHANNELS: usize = 3;

impl InputTensor {
  /// 数据长度必须等于 3 * width * height，否则返回 None
  pub fn new(data: Vec<f32>, width: usize, height: usize) -> Option<Self> {
    if data.len() != INPUT_CHANNELS * width * height {
      return None;
    }
    Some(Self {
      data: data.into_boxed_slice(),
      width,
      height,
    })
  }

  /// 长度由调用方保证
  pub(crate) fn from_image_planes(data: Vec<f32>, width: usize, height: usize) -> Self {
    debug_assert_eq!(data.len(), INPUT_CHANNELS * width * height);
    Self {
      data: data.into_boxed_slice(),
      width,
      height,
    }
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn as_slice(&self) -> &[f32] {
    &self.data
  }
}

/// 模型原始输出：逻辑形状为 `[anchors][5 + classes]` 的扁平浮点序列
#[derive(Debug, Clone, PartialEq)]
pub struct RawOutputTensor {
  data: Box<[f32]>,
  shape: Option<Box<[usize]>>,
}

impl RawOutputTensor {
  pub fn new(data: Vec<f32>) -> Self {
    Self {
      data: data.into_boxed_slice(),
      shape: None,
    }
  }

  /// 带有推理引擎声明形状的输出，最后一维即行宽。
  /// 形状各维之积必须等于数据长度，否则返回 None
  pub fn with_shape(data: Vec<f32>, shape: &[usize]) -> Option<Self> {
    if shape.is_empty() || shape.iter().product::<usize>() != data.len() {
      return None;
    }
    Some(Self {
      data: data.into_boxed_slice(),
      shape: Some(shape.into()),
    })
  }

  pub fn as_slice(&self) -> &[f32] {
    &self.data
  }

  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  pub fn shape(&self) -> Option<&[usize]> {
    self.shape.as_deref()
  }

  pub fn declared_row_width(&self) -> Option<usize> {
    self.shape.as_ref().and_then(|s| s.last().copied())
  }
}

/// 单个检测结果，`rect` 位于显示坐标系
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
  pub rect: Rect,
  pub class_index: usize,
  pub score: f32,
}

/// 一帧的检测结果，每帧完全替换上一帧
#[derive(Debug, Clone, Default)]
pub struct DetectResult {
  pub items: Box<[Detection]>,
}

impl DetectResult {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  /// 文本摘要，每行一个 `名称: 分数`
  pub fn describe(&self, labels: &LabelTable) -> String {
    self
      .items
      .iter()
      .map(|item| {
        format!(
          "{}: {:.2}\n",
          labels.name_or_index(item.class_index),
          item.score
        )
      })
      .collect()
  }
}

impl From<Vec<Detection>> for DetectResult {
  fn from(items: Vec<Detection>) -> Self {
    Self {
      items: items.into_boxed_slice(),
    }
  }
}

mod replay;
pub use self::replay::{ReplayError, ReplayModel, ReplayModelBuilder};
