// 该文件是 Lookout （瞭望） 项目的一部分。
// src/postprocess/geometry.rs - 边界框几何运算
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

/// 轴对齐矩形，角点形式 (left, top, right, bottom)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
  pub left: f32,
  pub top: f32,
  pub right: f32,
  pub bottom: f32,
}

impl Rect {
  pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
    Self {
      left,
      top,
      right,
      bottom,
    }
  }

  /// 由中心点与宽高构造
  pub fn from_center(center_x: f32, center_y: f32, width: f32, height: f32) -> Self {
    let half_w = width / 2.0;
    let half_h = height / 2.0;
    Self {
      left: center_x - half_w,
      top: center_y - half_h,
      right: center_x + half_w,
      bottom: center_y + half_h,
    }
  }

  pub fn width(&self) -> f32 {
    self.right - self.left
  }

  pub fn height(&self) -> f32 {
    self.bottom - self.top
  }

  /// 面积，退化（反向）矩形的面积为 0
  pub fn area(&self) -> f32 {
    self.width().max(0.0) * self.height().max(0.0)
  }

  pub fn intersection_area(&self, other: &Rect) -> f32 {
    let left = self.left.max(other.left);
    let top = self.top.max(other.top);
    let right = self.right.min(other.right);
    let bottom = self.bottom.min(other.bottom);
    (right - left).max(0.0) * (bottom - top).max(0.0)
  }

  /// 交并比。并集面积为 0 时返回 0。
  pub fn iou(&self, other: &Rect) -> f32 {
    let inter = self.intersection_area(other);
    let union = self.area() + other.area() - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
  }

  pub fn as_array(&self) -> [f32; 4] {
    [self.left, self.top, self.right, self.bottom]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn iou_with_itself_is_one() {
    let a = Rect::new(10.0, 20.0, 110.0, 70.0);
    assert_eq!(a.iou(&a), 1.0);
  }

  #[test]
  fn disjoint_boxes_have_zero_iou() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    let b = Rect::new(20.0, 20.0, 30.0, 30.0);
    assert_eq!(a.iou(&b), 0.0);

    // 只共享一条边
    let c = Rect::new(10.0, 0.0, 20.0, 10.0);
    assert_eq!(a.iou(&c), 0.0);
  }

  #[test]
  fn iou_is_symmetric() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    let b = Rect::new(5.0, 3.0, 17.0, 12.0);
    assert_eq!(a.iou(&b), b.iou(&a));
    // 交集 5*7=35，并集 100+108-35=173
    assert!((a.iou(&b) - 35.0 / 173.0).abs() < 1e-6);
  }

  #[test]
  fn degenerate_boxes_do_not_divide_by_zero() {
    let point = Rect::new(5.0, 5.0, 5.0, 5.0);
    assert_eq!(point.area(), 0.0);
    assert_eq!(point.iou(&point), 0.0);

    let inverted = Rect::new(10.0, 10.0, 0.0, 0.0);
    assert_eq!(inverted.area(), 0.0);
    assert_eq!(inverted.iou(&Rect::new(0.0, 0.0, 10.0, 10.0)), 0.0);
  }

  #[test]
  fn from_center_produces_corners() {
    let r = Rect::from_center(50.0, 40.0, 20.0, 10.0);
    assert_eq!(r, Rect::new(40.0, 35.0, 60.0, 45.0));
    assert_eq!(r.width(), 20.0);
    assert_eq!(r.height(), 10.0);
  }
}
