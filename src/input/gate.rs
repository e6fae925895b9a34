// 该文件是 Lookout （瞭望） 项目的一部分。
// src/input/gate.rs - 帧节流
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

use std::time::{Duration, Instant};

pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(500);

/// 帧源一侧的节流策略：距离上一次产出结果不足 `min_interval` 的帧直接丢弃。
/// 没有产出结果的帧不会重置计时。
#[derive(Debug, Clone)]
pub struct FrameGate {
  min_interval: Duration,
  last_completed: Option<Instant>,
}

impl Default for FrameGate {
  fn default() -> Self {
    Self::new(DEFAULT_MIN_INTERVAL)
  }
}

impl FrameGate {
  pub fn new(min_interval: Duration) -> Self {
    Self {
      min_interval,
      last_completed: None,
    }
  }

  pub fn min_interval(&self) -> Duration {
    self.min_interval
  }

  pub fn admit(&self, now: Instant) -> bool {
    match self.last_completed {
      Some(last) => now.saturating_duration_since(last) >= self.min_interval,
      None => true,
    }
  }

  pub fn mark_completed(&mut self, now: Instant) {
    self.last_completed = Some(now);
  }
}
