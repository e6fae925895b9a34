// 该文件是 Lookout （瞭望） 项目的一部分。
// src/output.rs - 输出定义
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

use crate::{frame::Frame, model::DetectResult};

/// 渲染一帧的检测结果。每次调用的结果完全替换上一帧。
pub trait Render {
  type Error;
  fn render_result(&self, frame: &Frame, result: &DetectResult) -> Result<(), Self::Error>;
}

#[cfg(feature = "save_image_file")]
pub mod draw;

#[cfg(feature = "save_image_file")]
mod save_image_file;
#[cfg(feature = "save_image_file")]
pub use self::save_image_file::{SaveImageFileError, SaveImageFileOutput};

#[cfg(feature = "directory_record")]
mod directory_record;
#[cfg(feature = "directory_record")]
pub use self::directory_record::{DirectoryRecordOutput, DirectoryRecordOutputError, RecordKind};

#[cfg(feature = "save_image_file")]
mod wrapper {
  use std::sync::Arc;

  use thiserror::Error;
  use url::Url;

  #[cfg(feature = "directory_record")]
  use super::{DirectoryRecordOutput, DirectoryRecordOutputError, RecordKind};
  use super::{Render, SaveImageFileError, SaveImageFileOutput, draw::{Draw, DrawError}};
  use crate::{frame::Frame, label::LabelTable, model::DetectResult, url_to_path};

  #[derive(Error, Debug)]
  pub enum OutputError {
    #[error("保存图像文件错误: {0}")]
    SaveImageFileError(#[from] SaveImageFileError),
    #[cfg(feature = "directory_record")]
    #[error("目录记录输出错误: {0}")]
    DirectoryRecordOutputError(#[from] DirectoryRecordOutputError),
    #[error("绘制配置错误: {0}")]
    DrawError(#[from] DrawError),
    #[error("URI 方案不匹配")]
    SchemeMismatch,
  }

  pub enum OutputWrapper {
    SaveImageFileOutput(SaveImageFileOutput),
    #[cfg(feature = "directory_record")]
    DirectoryRecordOutput(DirectoryRecordOutput),
  }

  impl OutputWrapper {
    /// 查询参数: `font=<ttf 路径>`；目录输出另有 `record=name|id` 与 `always`
    pub fn from_url(
      url: &Url,
      labels: Arc<LabelTable>,
      view_size: Option<(u32, u32)>,
    ) -> Result<Self, OutputError> {
      let mut draw = Draw::new(labels).with_view_size(view_size);
      if let Some((_, font)) = url.query_pairs().find(|(k, _)| k == "font") {
        draw = draw.with_font_file(&*font)?;
      }

      match url.scheme() {
        SaveImageFileOutput::SCHEME => Ok(OutputWrapper::SaveImageFileOutput(
          SaveImageFileOutput::new(url_to_path(url), draw),
        )),
        #[cfg(feature = "directory_record")]
        DirectoryRecordOutput::SCHEME => {
          let record = url
            .query_pairs()
            .find(|(k, _)| k == "record")
            .map(|(_, v)| RecordKind::from_query(&v));
          let always = url.query_pairs().any(|(k, _)| k == "always");
          Ok(OutputWrapper::DirectoryRecordOutput(
            DirectoryRecordOutput::new(url_to_path(url), draw)
              .with_record(record)
              .with_always(always),
          ))
        }
        _ => Err(OutputError::SchemeMismatch),
      }
    }
  }

  impl Render for OutputWrapper {
    type Error = OutputError;

    fn render_result(&self, frame: &Frame, result: &DetectResult) -> Result<(), Self::Error> {
      match self {
        OutputWrapper::SaveImageFileOutput(output) => output
          .render_result(frame, result)
          .map_err(OutputError::from),
        #[cfg(feature = "directory_record")]
        OutputWrapper::DirectoryRecordOutput(output) => output
          .render_result(frame, result)
          .map_err(OutputError::from),
      }
    }
  }

}

#[cfg(feature = "save_image_file")]
pub use self::wrapper::{OutputError, OutputWrapper};
