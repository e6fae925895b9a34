// 该文件是 Lookout （瞭望） 项目的一部分。
// src/postprocess/nms.rs - 按类别的贪心非极大值抑制
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

use std::collections::BTreeMap;

use tracing::debug;

use crate::model::Detection;

pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;

/// 按类别分组做贪心 NMS。
///
/// 输出按类别索引升序排列，同一类别内按选中顺序（分数降序）排列。
/// 设置 `max_detections` 时，在所有类别保留的结果中按分数取前若干个，
/// 被保留结果之间的相对顺序不变。
pub fn suppress(
  detections: impl IntoIterator<Item = Detection>,
  iou_threshold: f32,
  max_detections: Option<usize>,
) -> Vec<Detection> {
  let mut partitions: BTreeMap<usize, Vec<Detection>> = BTreeMap::new();
  for detection in detections {
    partitions
      .entry(detection.class_index)
      .or_default()
      .push(detection);
  }

  let mut kept = Vec::new();
  for (class_index, pool) in partitions {
    let before = pool.len();
    let mut survivors = suppress_class(pool, iou_threshold);
    debug!(
      "类别 {}: NMS 前 {} 个, NMS 后 {} 个",
      class_index,
      before,
      survivors.len()
    );
    kept.append(&mut survivors);
  }

  if let Some(limit) = max_detections
    && kept.len() > limit
  {
    debug!("检测数量 {} 超过上限 {}, 截断", kept.len(), limit);
    kept = keep_top(kept, limit);
  }

  kept
}

/// 单个类别内的贪心 NMS，返回按选中顺序排列的保留框
fn suppress_class(mut pool: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
  // 稳定排序，同分保持解码顺序
  pool.sort_by(|a, b| b.score.total_cmp(&a.score));

  let mut suppressed = vec![false; pool.len()];
  let mut kept = Vec::new();
  for i in 0..pool.len() {
    if suppressed[i] {
      continue;
    }
    let best = pool[i];
    kept.push(best);

    for (j, other) in pool.iter().enumerate().skip(i + 1) {
      if !suppressed[j] && best.rect.iou(&other.rect) > iou_threshold {
        suppressed[j] = true;
      }
    }
  }
  kept
}

fn keep_top(kept: Vec<Detection>, limit: usize) -> Vec<Detection> {
  let mut ranked: Vec<usize> = (0..kept.len()).collect();
  ranked.sort_by(|&a, &b| kept[b].score.total_cmp(&kept[a].score));
  ranked.truncate(limit);
  ranked.sort_unstable();

  ranked.into_iter().map(|i| kept[i]).collect()
}
