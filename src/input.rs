// 该文件是 Lookout （瞭望） 项目的一部分。
// src/input.rs - 帧输入
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

mod gate;
pub use self::gate::{DEFAULT_MIN_INTERVAL, FrameGate};

#[cfg(feature = "read_image_file")]
mod read_image_file;
#[cfg(feature = "read_image_file")]
pub use self::read_image_file::{ImageFileInput, ImageFileInputError};

#[cfg(feature = "read_image_file")]
mod read_image_folder;
#[cfg(feature = "read_image_file")]
pub use self::read_image_folder::ImageFolderInput;

#[cfg(feature = "read_image_file")]
mod wrapper {
  use thiserror::Error;

  use super::{ImageFileInput, ImageFileInputError, ImageFolderInput};
  use crate::{FromUrl, FromUrlWithScheme, frame::Frame};

  #[derive(Error, Debug)]
  pub enum InputError {
    #[error("Image file input error: {0}")]
    ImageFileInputError(#[from] ImageFileInputError),
    #[error("URI scheme mismatch")]
    SchemeMismatch,
  }

  pub enum InputWrapper {
    ImageFile(ImageFileInput),
    ImageFolder(ImageFolderInput),
  }

  impl FromUrl for InputWrapper {
    type Error = InputError;

    fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
      match url.scheme() {
        ImageFileInput::SCHEME => Ok(InputWrapper::ImageFile(ImageFileInput::from_url(url)?)),
        ImageFolderInput::SCHEME => Ok(InputWrapper::ImageFolder(ImageFolderInput::from_url(
          url,
        )?)),
        _ => Err(InputError::SchemeMismatch),
      }
    }
  }

  impl Iterator for InputWrapper {
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
      match self {
        InputWrapper::ImageFile(input) => input.next(),
        InputWrapper::ImageFolder(input) => input.next(),
      }
    }
  }
}

#[cfg(feature = "read_image_file")]
pub use self::wrapper::{InputError, InputWrapper};
