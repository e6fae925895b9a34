// 该文件是 Lookout （瞭望） 项目的一部分。
// src/task.rs - 任务循环
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

use std::{
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  time::{Duration, Instant},
};

use tracing::{debug, info, warn};

use crate::{
  detector::Detect,
  frame::Frame,
  input::FrameGate,
  label::LabelTable,
  model::DetectResult,
  output::Render,
};

pub trait Task<I, D, O>: Sized {
  type Error;
  fn run_task(self, input: I, detector: D, output: O) -> Result<TaskSummary, Self::Error>;
}

/// 任务结束时的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSummary {
  pub frames_seen: usize,
  pub frames_processed: usize,
  pub frames_failed: usize,
  pub detections: usize,
}

fn log_result(frame: &Frame, result: &DetectResult, labels: Option<&LabelTable>) {
  info!("第 {} 帧: 检测到 {} 个对象", frame.index, result.len());
  if let Some(labels) = labels
    && !result.is_empty()
  {
    debug!("检测结果:\n{}", result.describe(labels));
  }
}

#[derive(Default)]
pub struct OneShotTask {
  labels: Option<Arc<LabelTable>>,
}

impl OneShotTask {
  pub fn with_labels(mut self, labels: Arc<LabelTable>) -> Self {
    self.labels = Some(labels);
    self
  }
}

impl<I, D, O, DE, RE> Task<I, D, O> for OneShotTask
where
  I: Iterator<Item = Frame>,
  D: Detect<Error = DE>,
  O: Render<Error = RE>,
  DE: std::error::Error + Send + Sync + 'static,
  RE: std::error::Error + Send + Sync + 'static,
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, detector: D, output: O) -> Result<TaskSummary, Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始检测...");
    let now = Instant::now();
    let result = detector.detect(&frame)?;
    info!("检测完成，耗时: {:.2?}", now.elapsed());
    log_result(&frame, &result, self.labels.as_deref());

    output.render_result(&frame, &result)?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(TaskSummary {
      frames_seen: 1,
      frames_processed: 1,
      frames_failed: 0,
      detections: result.len(),
    })
  }
}

/// 连续处理帧。节流、帧数上限与 Ctrl-C 都在帧之间检查，不打断正在处理的帧。
#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
  gate: Option<FrameGate>,
  handle_interrupt: bool,
  labels: Option<Arc<LabelTable>>,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
    self.gate = Some(FrameGate::new(min_interval));
    self
  }

  /// 安装 Ctrl-C 处理器（整个进程只能安装一次）
  pub fn with_interrupt(mut self, handle_interrupt: bool) -> Self {
    self.handle_interrupt = handle_interrupt;
    self
  }

  pub fn with_labels(mut self, labels: Arc<LabelTable>) -> Self {
    self.labels = Some(labels);
    self
  }

  fn install_interrupt(&self) -> Result<Arc<AtomicBool>, ctrlc::Error> {
    let stop = Arc::new(AtomicBool::new(false));
    if self.handle_interrupt {
      let flag = stop.clone();
      ctrlc::set_handler(move || {
        info!("收到中断信号，准备退出...");
        flag.store(true, Ordering::SeqCst);
      })?;
    }
    Ok(stop)
  }
}

impl<I, D, O, DE, RE> Task<I, D, O> for ContinuousTask
where
  I: Iterator<Item = Frame>,
  D: Detect<Error = DE>,
  O: Render<Error = RE>,
  DE: std::error::Error + Send + Sync + 'static,
  RE: std::error::Error + Send + Sync + 'static,
{
  type Error = anyhow::Error;

  fn run_task(mut self, input: I, detector: D, output: O) -> Result<TaskSummary, Self::Error> {
    info!("开始任务...");
    let stop = self.install_interrupt()?;
    let mut summary = TaskSummary::default();

    for frame in input {
      summary.frames_seen += 1;

      if let Some(gate) = &self.gate
        && !gate.admit(Instant::now())
      {
        debug!("第 {} 帧距上次结果过近，丢弃", frame.index);
        continue;
      }

      let now = Instant::now();
      match detector.detect(&frame) {
        Ok(result) => {
          let elapsed_a = now.elapsed();
          log_result(&frame, &result, self.labels.as_deref());
          output.render_result(&frame, &result)?;
          info!(
            "处理完成，耗时: {:.2?} / {:.2?}",
            elapsed_a,
            now.elapsed()
          );
          if let Some(gate) = self.gate.as_mut() {
            gate.mark_completed(Instant::now());
          }
          summary.frames_processed += 1;
          summary.detections += result.len();
        }
        Err(e) => {
          // 单帧失败视为该帧无检测结果，继续等待下一帧
          warn!("第 {} 帧检测失败: {}", frame.index, e);
          summary.frames_failed += 1;
        }
      }

      if self
        .frame_number
        .map(|n| summary.frames_processed >= n)
        .unwrap_or(false)
      {
        info!("达到指定帧数 {}, 退出任务循环", summary.frames_processed);
        break;
      }
      if stop.load(Ordering::SeqCst) {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    info!(
      "任务完成，共 {} 帧，处理 {} 帧，检测 {} 个对象",
      summary.frames_seen, summary.frames_processed, summary.detections
    );
    Ok(summary)
  }
}
