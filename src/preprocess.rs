// 该文件是 Lookout （瞭望） 项目的一部分。
// src/preprocess.rs - 模型输入预处理
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

use image::{Rgb, RgbImage, imageops};
use thiserror::Error;
use tracing::debug;

use crate::{
  model::{INPUT_CHANNELS, InputTensor},
  postprocess::ScaleParams,
};

pub const DEFAULT_INPUT_WIDTH: u32 = 640;
pub const DEFAULT_INPUT_HEIGHT: u32 = 640;
const LETTERBOX_FILL: u8 = 114;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreprocessError {
  #[error("图像尺寸为空: {0}x{1}")]
  EmptyImage(u32, u32),
  #[error("模型输入尺寸为空: {0}x{1}")]
  EmptyInput(u32, u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeMode {
  /// 直接拉伸到模型输入尺寸
  #[default]
  Stretch,
  /// 保持宽高比缩放并居中填充
  Letterbox,
}

#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
  input_width: u32,
  input_height: u32,
  resize: ResizeMode,
}

impl Default for Preprocessor {
  fn default() -> Self {
    Self::new(DEFAULT_INPUT_WIDTH, DEFAULT_INPUT_HEIGHT)
  }
}

impl Preprocessor {
  pub fn new(input_width: u32, input_height: u32) -> Self {
    Self {
      input_width,
      input_height,
      resize: ResizeMode::default(),
    }
  }

  pub fn with_resize(mut self, resize: ResizeMode) -> Self {
    self.resize = resize;
    self
  }

  pub fn input_size(&self) -> (u32, u32) {
    (self.input_width, self.input_height)
  }

  /// 返回 NCHW 张量，以及模型输入 → 原图的缩放参数（显示缩放为 1）
  pub fn run(&self, image: &RgbImage) -> Result<(InputTensor, ScaleParams), PreprocessError> {
    if self.input_width == 0 || self.input_height == 0 {
      return Err(PreprocessError::EmptyInput(
        self.input_width,
        self.input_height,
      ));
    }
    let (orig_w, orig_h) = image.dimensions();
    if orig_w == 0 || orig_h == 0 {
      return Err(PreprocessError::EmptyImage(orig_w, orig_h));
    }

    let (canvas, scale) = match self.resize {
      ResizeMode::Stretch => {
        let resized = imageops::resize(
          image,
          self.input_width,
          self.input_height,
          imageops::FilterType::Triangle,
        );
        let scale = ScaleParams::new(
          orig_w as f32 / self.input_width as f32,
          orig_h as f32 / self.input_height as f32,
          1.0,
          1.0,
        );
        (resized, scale)
      }
      ResizeMode::Letterbox => self.letterbox(image),
    };

    debug!(
      "预处理 {}x{} -> {}x{}, 缩放参数 {:?}",
      orig_w, orig_h, self.input_width, self.input_height, scale
    );
    Ok((to_nchw_tensor(&canvas), scale))
  }

  fn letterbox(&self, image: &RgbImage) -> (RgbImage, ScaleParams) {
    let (orig_w, orig_h) = image.dimensions();
    let ratio =
      (self.input_width as f32 / orig_w as f32).min(self.input_height as f32 / orig_h as f32);
    let new_w = ((orig_w as f32 * ratio).round() as u32).clamp(1, self.input_width);
    let new_h = ((orig_h as f32 * ratio).round() as u32).clamp(1, self.input_height);
    let pad_x = (self.input_width - new_w) / 2;
    let pad_y = (self.input_height - new_h) / 2;

    let resized = imageops::resize(image, new_w, new_h, imageops::FilterType::Triangle);
    let mut canvas = RgbImage::from_pixel(
      self.input_width,
      self.input_height,
      Rgb([LETTERBOX_FILL; 3]),
    );
    imageops::replace(&mut canvas, &resized, pad_x as i64, pad_y as i64);

    let scale = ScaleParams::new(
      orig_w as f32 / new_w as f32,
      orig_h as f32 / new_h as f32,
      1.0,
      1.0,
    )
    .with_padding(pad_x as f32, pad_y as f32);
    (canvas, scale)
  }
}

/// HWC u8 → CHW f32，除以 255，不减均值
fn to_nchw_tensor(image: &RgbImage) -> InputTensor {
  let (width, height) = image.dimensions();
  let (width, height) = (width as usize, height as usize);
  let plane = width * height;
  let mut data = vec![0f32; INPUT_CHANNELS * plane];

  for (x, y, pixel) in image.enumerate_pixels() {
    let idx = y as usize * width + x as usize;
    for c in 0..INPUT_CHANNELS {
      data[c * plane + idx] = pixel[c] as f32 / 255.0;
    }
  }

  InputTensor::from_image_planes(data, width, height)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn stretch_scales_back_to_original() {
    let image = RgbImage::from_pixel(1280, 960, Rgb([255, 0, 51]));
    let (tensor, scale) = Preprocessor::new(640, 640).run(&image).unwrap();

    assert_eq!((tensor.width(), tensor.height()), (640, 640));
    assert_eq!(scale.image_scale_x, 2.0);
    assert_eq!(scale.image_scale_y, 1.5);
    assert_eq!((scale.padding_x, scale.padding_y), (0.0, 0.0));

    let plane = 640 * 640;
    let data = tensor.as_slice();
    // 纯色图缩放后颜色不变
    assert!((data[0] - 1.0).abs() < 1e-2);
    assert!(data[plane].abs() < 1e-2);
    assert!((data[2 * plane] - 0.2).abs() < 1e-2);
  }

  #[test]
  fn letterbox_reports_padding() {
    let image = RgbImage::from_pixel(1280, 640, Rgb([0, 0, 0]));
    let (tensor, scale) = Preprocessor::new(640, 640)
      .with_resize(ResizeMode::Letterbox)
      .run(&image)
      .unwrap();

    assert_eq!((tensor.width(), tensor.height()), (640, 640));
    assert_eq!((scale.padding_x, scale.padding_y), (0.0, 160.0));
    assert_eq!((scale.image_scale_x, scale.image_scale_y), (2.0, 2.0));

    // 填充区域为 114/255，图像区域为 0
    let data = tensor.as_slice();
    assert!((data[0] - 114.0 / 255.0).abs() < 1e-6);
    assert_eq!(data[320 * 640 + 320], 0.0);
  }

  #[test]
  fn empty_image_is_rejected() {
    let image = RgbImage::new(0, 10);
    assert_eq!(
      Preprocessor::default().run(&image).unwrap_err(),
      PreprocessError::EmptyImage(0, 10)
    );
  }

  #[test]
  fn zero_input_size_is_rejected() {
    let image = RgbImage::new(64, 48);
    for resize in [ResizeMode::Stretch, ResizeMode::Letterbox] {
      assert_eq!(
        Preprocessor::new(0, 640)
          .with_resize(resize)
          .run(&image)
          .unwrap_err(),
        PreprocessError::EmptyInput(0, 640)
      );
    }
    assert_eq!(
      Preprocessor::new(640, 0).run(&image).unwrap_err(),
      PreprocessError::EmptyInput(640, 0)
    );
  }
}
