// 该文件是 Lookout （瞭望） 项目的一部分。
// src/frame.rs - 相机帧定义
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

use std::borrow::Cow;

use image::{RgbImage, imageops};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("不支持的旋转角度: {0}")]
pub struct RotationError(pub i32);

/// 传感器方向到显示方向需要的顺时针旋转角度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
  #[default]
  Deg0,
  Deg90,
  Deg180,
  Deg270,
}

impl TryFrom<i32> for Rotation {
  type Error = RotationError;

  fn try_from(degrees: i32) -> Result<Self, Self::Error> {
    match degrees.rem_euclid(360) {
      0 => Ok(Rotation::Deg0),
      90 => Ok(Rotation::Deg90),
      180 => Ok(Rotation::Deg180),
      270 => Ok(Rotation::Deg270),
      _ => Err(RotationError(degrees)),
    }
  }
}

impl Rotation {
  pub fn degrees(&self) -> i32 {
    match self {
      Rotation::Deg0 => 0,
      Rotation::Deg90 => 90,
      Rotation::Deg180 => 180,
      Rotation::Deg270 => 270,
    }
  }
}

/// 一帧 RGB 图像，附带旋转角度与帧序号
#[derive(Debug, Clone)]
pub struct Frame {
  pub image: RgbImage,
  pub rotation: Rotation,
  pub index: usize,
}

impl Frame {
  pub fn new(image: RgbImage, index: usize) -> Self {
    Self {
      image,
      rotation: Rotation::Deg0,
      index,
    }
  }

  pub fn with_rotation(mut self, rotation: Rotation) -> Self {
    self.rotation = rotation;
    self
  }

  /// 按旋转角度转正后的图像，0 度时不复制
  pub fn upright(&self) -> Cow<'_, RgbImage> {
    match self.rotation {
      Rotation::Deg0 => Cow::Borrowed(&self.image),
      Rotation::Deg90 => Cow::Owned(imageops::rotate90(&self.image)),
      Rotation::Deg180 => Cow::Owned(imageops::rotate180(&self.image)),
      Rotation::Deg270 => Cow::Owned(imageops::rotate270(&self.image)),
    }
  }

  /// 转正后的尺寸 (宽, 高)
  pub fn upright_dimensions(&self) -> (u32, u32) {
    let (w, h) = self.image.dimensions();
    match self.rotation {
      Rotation::Deg90 | Rotation::Deg270 => (h, w),
      _ => (w, h),
    }
  }
}

#[cfg(test)]
mod tests {
  use image::Rgb;

  use super::*;

  #[test]
  fn rotation_from_degrees() {
    assert_eq!(Rotation::try_from(0), Ok(Rotation::Deg0));
    assert_eq!(Rotation::try_from(90), Ok(Rotation::Deg90));
    assert_eq!(Rotation::try_from(-90), Ok(Rotation::Deg270));
    assert_eq!(Rotation::try_from(450), Ok(Rotation::Deg90));
    assert_eq!(Rotation::try_from(45), Err(RotationError(45)));
  }

  #[test]
  fn upright_rotates_clockwise() {
    let mut image = RgbImage::new(4, 2);
    image.put_pixel(0, 0, Rgb([255, 0, 0]));
    let frame = Frame::new(image, 0).with_rotation(Rotation::Deg90);

    assert_eq!(frame.upright_dimensions(), (2, 4));
    let upright = frame.upright();
    assert_eq!(upright.dimensions(), (2, 4));
    // 左上角顺时针旋转 90 度后位于右上角
    assert_eq!(upright.get_pixel(1, 0), &Rgb([255, 0, 0]));
  }

  #[test]
  fn zero_rotation_borrows() {
    let frame = Frame::new(RgbImage::new(3, 3), 1);
    assert!(matches!(frame.upright(), Cow::Borrowed(_)));
  }
}
