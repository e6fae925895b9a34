// 该文件是 Lookout （瞭望） 项目的一部分。
// src/detector.rs - 检测器：预处理、推理与后处理的组合
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

use thiserror::Error;
use tracing::debug;

use crate::{
  frame::Frame,
  model::{DetectResult, Model},
  postprocess::{PostProcessError, PostProcessor},
  preprocess::{PreprocessError, Preprocessor},
};

#[derive(Error, Debug)]
pub enum DetectorError<E> {
  #[error("预处理错误: {0}")]
  Preprocess(#[from] PreprocessError),
  #[error("推理错误: {0}")]
  Model(E),
  #[error("后处理错误: {0}")]
  PostProcess(#[from] PostProcessError),
}

/// 单帧检测接口，供任务循环调用
pub trait Detect {
  type Error;

  fn detect(&self, frame: &Frame) -> Result<DetectResult, Self::Error>;
}

pub struct Detector<M> {
  model: M,
  preprocessor: Preprocessor,
  postprocessor: PostProcessor,
  view_size: Option<(u32, u32)>,
}

impl<M: Model> Detector<M> {
  pub fn new(model: M, preprocessor: Preprocessor, postprocessor: PostProcessor) -> Self {
    Self {
      model,
      preprocessor,
      postprocessor,
      view_size: None,
    }
  }

  /// 显示区域尺寸；未设置时显示坐标即原图坐标
  pub fn with_view_size(mut self, view_size: Option<(u32, u32)>) -> Self {
    self.view_size = view_size;
    self
  }

  pub fn view_size(&self) -> Option<(u32, u32)> {
    self.view_size
  }
}

impl<M> Detect for Detector<M>
where
  M: Model,
  M::Error: std::error::Error,
{
  type Error = DetectorError<M::Error>;

  fn detect(&self, frame: &Frame) -> Result<DetectResult, Self::Error> {
    let image = frame.upright();
    let (image_w, image_h) = image.dimensions();

    let (input, mut scale) = self.preprocessor.run(&image)?;
    if let Some((view_w, view_h)) = self.view_size {
      scale = scale.with_view_scale(
        view_w as f32 / image_w as f32,
        view_h as f32 / image_h as f32,
      );
    }

    let output = self.model.infer(&input).map_err(DetectorError::Model)?;
    debug!("第 {} 帧推理完成, 输出 {} 个元素", frame.index, output.len());

    Ok(self.postprocessor.process(&output, &scale)?)
  }
}

#[cfg(test)]
mod tests {
  use image::RgbImage;

  use super::*;
  use crate::{
    model::{RawOutputTensor, ReplayModel},
    postprocess::{PostProcessConfig, Rect},
  };

  fn replay_one_box() -> ReplayModel {
    // 类别 1，中心 (320, 320)，64x64
    let output = vec![320.0, 320.0, 64.0, 64.0, 0.9, 0.1, 0.8];
    ReplayModel::from_tensor(RawOutputTensor::with_shape(output, &[1, 1, 7]).unwrap(), 640, 640)
  }

  fn postprocessor() -> PostProcessor {
    PostProcessor::new(PostProcessConfig::default().with_num_classes(2))
  }

  #[test]
  fn maps_boxes_to_original_image() {
    let detector = Detector::new(replay_one_box(), Preprocessor::default(), postprocessor());
    let frame = Frame::new(RgbImage::new(1280, 960), 0);

    let result = detector.detect(&frame).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.items[0].class_index, 1);
    assert_eq!(result.items[0].rect, Rect::new(576.0, 432.0, 704.0, 528.0));
  }

  #[test]
  fn view_size_scales_into_display_space() {
    let detector = Detector::new(replay_one_box(), Preprocessor::default(), postprocessor())
      .with_view_size(Some((640, 480)));
    let frame = Frame::new(RgbImage::new(1280, 960), 0);

    let result = detector.detect(&frame).unwrap();
    assert_eq!(result.items[0].rect, Rect::new(288.0, 216.0, 352.0, 264.0));
  }

  #[test]
  fn model_input_mismatch_is_reported() {
    let detector = Detector::new(
      replay_one_box(),
      Preprocessor::new(320, 320),
      postprocessor(),
    );
    let frame = Frame::new(RgbImage::new(64, 64), 0);
    assert!(matches!(
      detector.detect(&frame),
      Err(DetectorError::Model(_))
    ));
  }
}
