// 该文件是 Lookout （瞭望） 项目的一部分。
// src/output/draw.rs - 检测结果叠加绘制
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

use std::{path::Path, sync::Arc};

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage, imageops};
use imageproc::{
  drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut},
  rect::Rect as PixelRect,
};
use thiserror::Error;
use tracing::info;

use crate::{
  frame::Frame,
  label::LabelTable,
  model::{DetectResult, Detection},
  postprocess::Rect,
};

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 20.0;
const LABEL_TEXT_HEIGHT: i32 = 24;
const LABEL_CHAR_WIDTH: f32 = 11.0; // 每字符平均宽度（粗略估计）
const LABEL_TEXT_VERTICAL_PADDING: i32 = 2;
const BOX_THICKNESS: i32 = 2;
const PALETTE_SIZE: usize = 80;

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("字体文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体文件无效: {0}")]
  InvalidFont(String),
}

/// 在显示尺寸的画布上绘制检测框。
///
/// 标签文字（`名称 分数`，底色为类别颜色）需要字体，见 [`Draw::with_font_file`]；
/// 未配置字体时只绘制边框，类别仅以颜色区分。
pub struct Draw {
  font: Option<FontArc>,
  font_scale: PxScale,
  labels: Arc<LabelTable>,
  colors: Vec<Rgb<u8>>,
  view_size: Option<(u32, u32)>,
}

impl Draw {
  pub fn new(labels: Arc<LabelTable>) -> Self {
    // 每个类别一种颜色
    let colors = (0..PALETTE_SIZE)
      .map(|i| {
        let hue = (i as f32 / PALETTE_SIZE as f32) * 360.0;
        hsv_to_rgb(hue, 0.8, 0.9)
      })
      .collect();

    Self {
      font: None,
      font_scale: PxScale::from(LABEL_FONT_SIZE),
      labels,
      colors,
      view_size: None,
    }
  }

  /// 加载 TrueType/OpenType 字体，之后每个框上方绘制标签
  pub fn with_font_file(mut self, path: impl AsRef<Path>) -> Result<Self, DrawError> {
    let path = path.as_ref();
    info!("加载字体文件: {}", path.display());
    let data = std::fs::read(path)?;
    let font = FontArc::try_from_vec(data).map_err(|e| DrawError::InvalidFont(e.to_string()))?;
    self.font = Some(font);
    Ok(self)
  }

  pub fn with_view_size(mut self, view_size: Option<(u32, u32)>) -> Self {
    self.view_size = view_size;
    self
  }

  pub fn labels(&self) -> &LabelTable {
    &self.labels
  }

  fn color_of(&self, class_index: usize) -> Rgb<u8> {
    self.colors[class_index % self.colors.len()]
  }

  /// 帧转正并缩放到显示尺寸后绘制
  pub fn draw_frame(&self, frame: &Frame, result: &DetectResult) -> RgbImage {
    let upright = frame.upright();
    let mut canvas = match self.view_size {
      Some((w, h)) if (w, h) != upright.dimensions() => {
        imageops::resize(&*upright, w, h, imageops::FilterType::Triangle)
      }
      _ => upright.into_owned(),
    };
    self.draw_detections(&mut canvas, result);
    canvas
  }

  pub fn draw_detections(&self, image: &mut RgbImage, result: &DetectResult) {
    for detection in result.items.iter() {
      self.draw_detection(image, detection);
    }
  }

  fn draw_detection(&self, image: &mut RgbImage, detection: &Detection) {
    let Some(rect) = clamp_to_image(&detection.rect, image.width(), image.height()) else {
      return;
    };
    let color = self.color_of(detection.class_index);

    // 绘制边框（加粗）
    for t in 0..BOX_THICKNESS {
      let w = rect.width().saturating_sub(2 * t as u32);
      let h = rect.height().saturating_sub(2 * t as u32);
      if w == 0 || h == 0 {
        break;
      }
      draw_hollow_rect_mut(
        image,
        PixelRect::at(rect.left() + t, rect.top() + t).of_size(w, h),
        color,
      );
    }

    let Some(font) = &self.font else {
      return;
    };

    let label = format!(
      "{} {:.2}",
      self.labels.name_or_index(detection.class_index),
      detection.score
    );

    // 标签背景位于边框上方，超出图像时贴边
    let text_width = (label.chars().count() as f32 * LABEL_CHAR_WIDTH) as i32;
    let label_x = rect.left();
    let label_y = (rect.top() - LABEL_TEXT_HEIGHT).max(0);
    let max_width = (image.width() as i32 - label_x).max(0);
    let label_width = text_width.min(max_width) as u32;

    if label_width > 0 {
      draw_filled_rect_mut(
        image,
        PixelRect::at(label_x, label_y).of_size(label_width, LABEL_TEXT_HEIGHT as u32),
        color,
      );
      draw_text_mut(
        image,
        Rgb([255u8, 255u8, 255u8]),
        label_x,
        label_y + LABEL_TEXT_VERTICAL_PADDING,
        self.font_scale,
        font,
        &label,
      );
    }
  }
}

/// 显示坐标 → 图像内的像素矩形；完全在图像外或退化时返回 None
fn clamp_to_image(rect: &Rect, width: u32, height: u32) -> Option<PixelRect> {
  if width == 0 || height == 0 {
    return None;
  }
  let max_x = width as f32 - 1.0;
  let max_y = height as f32 - 1.0;

  let x_min = rect.left.floor().clamp(0.0, max_x) as i32;
  let y_min = rect.top.floor().clamp(0.0, max_y) as i32;
  let x_max = rect.right.ceil().clamp(0.0, max_x) as i32;
  let y_max = rect.bottom.ceil().clamp(0.0, max_y) as i32;

  if x_min >= x_max || y_min >= y_max {
    return None;
  }
  Some(PixelRect::at(x_min, y_min).of_size((x_max - x_min + 1) as u32, (y_max - y_min + 1) as u32))
}

/// HSV 转 RGB
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb<u8> {
  let c = v * s;
  let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
  let m = v - c;

  let (r, g, b) = if h < 60.0 {
    (c, x, 0.0)
  } else if h < 120.0 {
    (x, c, 0.0)
  } else if h < 180.0 {
    (0.0, c, x)
  } else if h < 240.0 {
    (0.0, x, c)
  } else if h < 300.0 {
    (x, 0.0, c)
  } else {
    (c, 0.0, x)
  };

  Rgb([
    ((r + m) * 255.0) as u8,
    ((g + m) * 255.0) as u8,
    ((b + m) * 255.0) as u8,
  ])
}
