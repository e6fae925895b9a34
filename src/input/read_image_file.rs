// 该文件是 Lookout （瞭望） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use std::path::Path;

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{Frame, Rotation, RotationError},
  url_to_path,
};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Image loading error: {0}")]
  ImageLoadError(#[from] image::ImageError),
  #[error("Invalid rotation: {0}")]
  InvalidRotation(String),
}

impl From<RotationError> for ImageFileInputError {
  fn from(err: RotationError) -> Self {
    ImageFileInputError::InvalidRotation(err.to_string())
  }
}

pub(crate) fn load_rgb_image(path: &Path) -> Result<RgbImage, ImageFileInputError> {
  let image = ImageReader::open(path)?.decode()?;
  Ok(image.into_rgb8())
}

/// 从 URL 查询参数 `rotation=90` 读取旋转角度
pub(crate) fn rotation_from_url(url: &Url) -> Result<Rotation, ImageFileInputError> {
  for (k, v) in url.query_pairs() {
    if k == "rotation" {
      let degrees = v
        .parse::<i32>()
        .map_err(|_| ImageFileInputError::InvalidRotation(v.to_string()))?;
      return Ok(Rotation::try_from(degrees)?);
    }
  }
  Ok(Rotation::Deg0)
}

/// 单张图片，只产出一帧
pub struct ImageFileInput {
  image: Option<RgbImage>,
  rotation: Rotation,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let rotation = rotation_from_url(url)?;
    let image = load_rgb_image(&url_to_path(url))?;

    Ok(ImageFileInput {
      image: Some(image),
      rotation,
    })
  }
}

impl ImageFileInput {
  pub fn from_image(image: RgbImage) -> Self {
    Self {
      image: Some(image),
      rotation: Rotation::Deg0,
    }
  }
}

impl Iterator for ImageFileInput {
  type Item = Frame;

  fn next(&mut self) -> Option<Self::Item> {
    let rotation = self.rotation;
    self
      .image
      .take()
      .map(|image| Frame::new(image, 0).with_rotation(rotation))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn yields_single_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.png");
    RgbImage::new(8, 4).save(&path).unwrap();

    let url = Url::parse(&format!("image://{}?rotation=270", path.display())).unwrap();
    let mut input = ImageFileInput::from_url(&url).unwrap();
    let frame = input.next().unwrap();
    assert_eq!(frame.image.dimensions(), (8, 4));
    assert_eq!(frame.rotation, Rotation::Deg270);
    assert!(input.next().is_none());
  }

  #[test]
  fn rejects_bad_rotation_and_scheme() {
    let url = Url::parse("image:///tmp/x.png?rotation=30").unwrap();
    assert!(matches!(
      rotation_from_url(&url),
      Err(ImageFileInputError::InvalidRotation(_))
    ));

    let url = Url::parse("folder:///tmp").unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(ImageFileInputError::SchemaMismatch)
    ));
  }
}
