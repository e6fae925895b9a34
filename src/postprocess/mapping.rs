// 该文件是 Lookout （瞭望） 项目的一部分。
// src/postprocess/mapping.rs - 坐标映射
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

use crate::{
  model::Detection,
  postprocess::{Candidate, Rect},
};

/// 模型输入 → 原图 → 显示 的缩放参数
///
/// 缩放因子不做校验，零或负值会得到退化但确定的矩形。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleParams {
  pub image_scale_x: f32,
  pub image_scale_y: f32,
  pub view_scale_x: f32,
  pub view_scale_y: f32,
  /// 信箱填充偏移，位于模型输入坐标系
  pub padding_x: f32,
  pub padding_y: f32,
}

impl Default for ScaleParams {
  fn default() -> Self {
    Self::identity()
  }
}

impl ScaleParams {
  pub fn identity() -> Self {
    Self::new(1.0, 1.0, 1.0, 1.0)
  }

  pub fn new(image_scale_x: f32, image_scale_y: f32, view_scale_x: f32, view_scale_y: f32) -> Self {
    Self {
      image_scale_x,
      image_scale_y,
      view_scale_x,
      view_scale_y,
      padding_x: 0.0,
      padding_y: 0.0,
    }
  }

  pub fn with_padding(mut self, padding_x: f32, padding_y: f32) -> Self {
    self.padding_x = padding_x;
    self.padding_y = padding_y;
    self
  }

  pub fn with_view_scale(mut self, view_scale_x: f32, view_scale_y: f32) -> Self {
    self.view_scale_x = view_scale_x;
    self.view_scale_y = view_scale_y;
    self
  }

  /// 单个坐标从模型输入空间到显示空间
  fn map_x(&self, x: f32) -> f32 {
    (x - self.padding_x) * self.image_scale_x * self.view_scale_x
  }

  fn map_y(&self, y: f32) -> f32 {
    (y - self.padding_y) * self.image_scale_y * self.view_scale_y
  }
}

pub fn map_to_display_space(candidate: &Candidate, scale: &ScaleParams) -> Detection {
  let Rect {
    left,
    top,
    right,
    bottom,
  } = Rect::from_center(
    candidate.center_x,
    candidate.center_y,
    candidate.width,
    candidate.height,
  );

  Detection {
    rect: Rect::new(
      scale.map_x(left),
      scale.map_y(top),
      scale.map_x(right),
      scale.map_y(bottom),
    ),
    class_index: candidate.class_index,
    score: candidate.score,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn candidate(cx: f32, cy: f32, w: f32, h: f32) -> Candidate {
    Candidate {
      center_x: cx,
      center_y: cy,
      width: w,
      height: h,
      class_index: 3,
      score: 0.7,
    }
  }

  #[test]
  fn unit_scales_are_identity_to_corner_form() {
    let d = map_to_display_space(&candidate(100.0, 80.0, 40.0, 20.0), &ScaleParams::identity());
    assert_eq!(d.rect, Rect::new(80.0, 70.0, 120.0, 90.0));
    assert_eq!(d.class_index, 3);
    assert_eq!(d.score, 0.7);
  }

  #[test]
  fn scales_compose_per_axis() {
    // 640x640 输入, 1280x960 原图, 显示为原图一半
    let scale = ScaleParams::new(2.0, 1.5, 0.5, 0.5);
    let d = map_to_display_space(&candidate(320.0, 320.0, 64.0, 64.0), &scale);
    assert_eq!(d.rect, Rect::new(288.0, 216.0, 352.0, 264.0));
  }

  #[test]
  fn padding_is_removed_before_scaling() {
    let scale = ScaleParams::new(2.0, 2.0, 1.0, 1.0).with_padding(0.0, 80.0);
    let d = map_to_display_space(&candidate(100.0, 180.0, 20.0, 20.0), &scale);
    assert_eq!(d.rect, Rect::new(180.0, 180.0, 220.0, 220.0));
  }

  #[test]
  fn degenerate_scale_is_not_rejected() {
    let scale = ScaleParams::new(0.0, -1.0, 1.0, 1.0);
    let d = map_to_display_space(&candidate(10.0, 10.0, 4.0, 4.0), &scale);
    assert_eq!(d.rect.width(), 0.0);
    assert_eq!(d.rect.height(), -4.0);
  }
}
