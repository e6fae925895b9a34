// 该文件是 Lookout （瞭望） 项目的一部分。
// src/input/read_image_folder.rs - 图像目录输入
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

use std::{collections::VecDeque, path::PathBuf};

use tracing::{debug, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{Frame, Rotation},
  input::read_image_file::{ImageFileInputError, load_rgb_image, rotation_from_url},
  url_to_path,
};

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

/// 按文件名顺序逐帧读取目录中的图片，模拟连续到达的相机帧。
/// 解码失败的文件记录警告后跳过。
pub struct ImageFolderInput {
  files: VecDeque<PathBuf>,
  rotation: Rotation,
  index: usize,
}

impl FromUrlWithScheme for ImageFolderInput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for ImageFolderInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let directory = url_to_path(url);
    let mut files = std::fs::read_dir(&directory)?
      .filter_map(|entry| entry.ok().map(|e| e.path()))
      .filter(|path| {
        path
          .extension()
          .and_then(|ext| ext.to_str())
          .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
          .unwrap_or(false)
      })
      .collect::<Vec<_>>();
    files.sort();
    info!("目录 {} 中共有 {} 张图片", directory.display(), files.len());

    Ok(ImageFolderInput {
      files: files.into(),
      rotation: rotation_from_url(url)?,
      index: 0,
    })
  }
}

impl ImageFolderInput {
  pub fn remaining(&self) -> usize {
    self.files.len()
  }
}

impl Iterator for ImageFolderInput {
  type Item = Frame;

  fn next(&mut self) -> Option<Self::Item> {
    while let Some(path) = self.files.pop_front() {
      match load_rgb_image(&path) {
        Ok(image) => {
          debug!("读取图片: {}", path.display());
          let frame = Frame::new(image, self.index).with_rotation(self.rotation);
          self.index += 1;
          return Some(frame);
        }
        Err(e) => warn!("跳过无法解码的图片 {}: {}", path.display(), e),
      }
    }
    None
  }
}
