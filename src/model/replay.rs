// 该文件是 Lookout （瞭望） 项目的一部分。
// src/model/replay.rs - 回放推理引擎
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

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, parse_usize_list,
  model::{InputTensor, Model, RawOutputTensor},
  url_to_path,
};

const REPLAY_DEFAULT_SHAPE: [usize; 3] = [1, 25200, 85];
const REPLAY_DEFAULT_INPUT: (usize, usize) = (640, 640);
const F32_BYTES: usize = std::mem::size_of::<f32>();

#[derive(Error, Debug)]
pub enum ReplayError {
  #[error("张量文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("URI 方案不匹配: 期望 '{expected}', 实际 '{actual}'")]
  SchemeMismatch {
    expected: &'static str,
    actual: String,
  },
  #[error("查询参数 '{0}' 无效: {1}")]
  InvalidQuery(String, String),
  #[error("张量文件长度 {0} 字节不是 4 的整数倍")]
  UnalignedData(usize),
  #[error("张量元素数量 {actual} 与声明形状 {shape:?} 不符")]
  ShapeMismatch { shape: Vec<usize>, actual: usize },
  #[error("模型输入尺寸不能为 0: {0}x{1}")]
  EmptyInput(usize, usize),
  #[error("输入尺寸不匹配: 期望 {expected_w}x{expected_h}, 实际 {actual_w}x{actual_h}")]
  InputMismatch {
    expected_w: usize,
    expected_h: usize,
    actual_w: usize,
    actual_h: usize,
  },
}

/// 回放模型：对每一帧返回同一份事先录制的输出张量（小端 f32）
#[derive(Debug, Clone)]
pub struct ReplayModel {
  output: RawOutputTensor,
  input_width: usize,
  input_height: usize,
}

pub struct ReplayModelBuilder {
  path: PathBuf,
  shape: Vec<usize>,
  input: (usize, usize),
}

impl FromUrlWithScheme for ReplayModelBuilder {
  const SCHEME: &'static str = "replay";
}

impl FromUrl for ReplayModelBuilder {
  type Error = ReplayError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ReplayError::SchemeMismatch {
        expected: Self::SCHEME,
        actual: url.scheme().to_string(),
      });
    }

    let mut builder = ReplayModelBuilder::new(url_to_path(url));
    for (key, value) in url.query_pairs() {
      match key.as_ref() {
        "shape" => {
          let shape = parse_usize_list(&value)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ReplayError::InvalidQuery(key.to_string(), value.to_string()))?;
          builder = builder.shape(&shape);
        }
        "input" => match parse_usize_list(&value).as_deref() {
          Some(&[w, h]) if w > 0 && h > 0 => builder = builder.input_size(w, h),
          _ => return Err(ReplayError::InvalidQuery(key.to_string(), value.to_string())),
        },
        _ => debug!("忽略未知查询参数: {}={}", key, value),
      }
    }
    Ok(builder)
  }
}

impl ReplayModelBuilder {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      shape: REPLAY_DEFAULT_SHAPE.to_vec(),
      input: REPLAY_DEFAULT_INPUT,
    }
  }

  pub fn shape(mut self, shape: &[usize]) -> Self {
    self.shape = shape.to_vec();
    self
  }

  pub fn input_size(mut self, width: usize, height: usize) -> Self {
    self.input = (width, height);
    self
  }

  pub fn build(self) -> Result<ReplayModel, ReplayError> {
    let (input_width, input_height) = self.input;
    if input_width == 0 || input_height == 0 {
      error!("模型输入尺寸不能为 0: {}x{}", input_width, input_height);
      return Err(ReplayError::EmptyInput(input_width, input_height));
    }

    info!("加载张量文件: {}", self.path.display());
    let bytes = std::fs::read(&self.path)?;
    debug!(
      "张量文件大小: {:.2} MB",
      bytes.len() as f64 / (1024.0 * 1024.0)
    );

    let data = decode_f32_le(&bytes)?;
    let actual = data.len();
    let Some(output) = RawOutputTensor::with_shape(data, &self.shape) else {
      error!("张量元素数量 {} 与声明形状 {:?} 不符", actual, self.shape);
      return Err(ReplayError::ShapeMismatch {
        shape: self.shape,
        actual,
      });
    };

    info!("张量加载完成，形状 {:?}", self.shape);
    Ok(ReplayModel {
      output,
      input_width,
      input_height,
    })
  }
}

fn decode_f32_le(bytes: &[u8]) -> Result<Vec<f32>, ReplayError> {
  if bytes.len() % F32_BYTES != 0 {
    return Err(ReplayError::UnalignedData(bytes.len()));
  }
  Ok(
    bytes
      .chunks_exact(F32_BYTES)
      .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
      .collect(),
  )
}

impl ReplayModel {
  pub fn from_tensor(output: RawOutputTensor, input_width: usize, input_height: usize) -> Self {
    Self {
      output,
      input_width,
      input_height,
    }
  }

  pub fn input_width(&self) -> usize {
    self.input_width
  }

  pub fn input_height(&self) -> usize {
    self.input_height
  }

  pub fn output(&self) -> &RawOutputTensor {
    &self.output
  }
}

impl Model for ReplayModel {
  type Error = ReplayError;

  fn infer(&self, input: &InputTensor) -> Result<RawOutputTensor, Self::Error> {
    if input.width() != self.input_width || input.height() != self.input_height {
      return Err(ReplayError::InputMismatch {
        expected_w: self.input_width,
        expected_h: self.input_height,
        actual_w: input.width(),
        actual_h: input.height(),
      });
    }
    debug!("回放模型输出，共 {} 个元素", self.output.len());
    Ok(self.output.clone())
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;

  fn write_dump(values: &[f32]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for v in values {
      file.write_all(&v.to_le_bytes()).unwrap();
    }
    file.flush().unwrap();
    file
  }

  #[test]
  fn builds_from_url_with_shape() {
    let values: Vec<f32> = (0..14).map(|v| v as f32).collect();
    let dump = write_dump(&values);
    let url = Url::parse(&format!(
      "replay://{}?shape=1,2,7&input=32,16",
      dump.path().display()
    ))
    .unwrap();

    let model = ReplayModelBuilder::from_url(&url).unwrap().build().unwrap();
    assert_eq!(model.output().shape(), Some(&[1usize, 2, 7][..]));
    assert_eq!(model.output().as_slice(), values.as_slice());
    assert_eq!((model.input_width(), model.input_height()), (32, 16));

    let input = InputTensor::new(vec![0.0; 3 * 32 * 16], 32, 16).unwrap();
    assert_eq!(model.infer(&input).unwrap().as_slice(), values.as_slice());
  }

  #[test]
  fn rejects_shape_mismatch() {
    let dump = write_dump(&[0.0; 10]);
    let err = ReplayModelBuilder::new(dump.path())
      .shape(&[1, 2, 7])
      .build()
      .unwrap_err();
    assert!(matches!(err, ReplayError::ShapeMismatch { actual: 10, .. }));
  }

  #[test]
  fn rejects_wrong_scheme_and_bad_query() {
    let url = Url::parse("image:///tmp/x.bin").unwrap();
    assert!(matches!(
      ReplayModelBuilder::from_url(&url),
      Err(ReplayError::SchemeMismatch { .. })
    ));

    let url = Url::parse("replay:///tmp/x.bin?input=640").unwrap();
    assert!(matches!(
      ReplayModelBuilder::from_url(&url),
      Err(ReplayError::InvalidQuery(..))
    ));
  }

  #[test]
  fn rejects_zero_input_size() {
    let url = Url::parse("replay:///tmp/x.bin?input=0,640").unwrap();
    assert!(matches!(
      ReplayModelBuilder::from_url(&url),
      Err(ReplayError::InvalidQuery(..))
    ));

    let dump = write_dump(&[0.0; 7]);
    let err = ReplayModelBuilder::new(dump.path())
      .shape(&[1, 1, 7])
      .input_size(640, 0)
      .build()
      .unwrap_err();
    assert!(matches!(err, ReplayError::EmptyInput(640, 0)));
  }

  #[test]
  fn rejects_unaligned_bytes() {
    assert!(matches!(
      decode_f32_le(&[0u8; 7]),
      Err(ReplayError::UnalignedData(7))
    ));
  }

  #[test]
  fn infer_checks_input_size() {
    let model = ReplayModel::from_tensor(RawOutputTensor::new(vec![]), 640, 640);
    let input = InputTensor::new(vec![0.0; 3 * 320 * 320], 320, 320).unwrap();
    assert!(matches!(
      model.infer(&input),
      Err(ReplayError::InputMismatch { actual_w: 320, .. })
    ));
  }
}
