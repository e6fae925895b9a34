// 该文件是 Lookout （瞭望） 项目的一部分。
// src/bin/simple_continueshot.rs - 连续检测
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

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use clap::Parser;
use url::Url;

use lookout::{
  FromUrl,
  detector::Detector,
  input::{DEFAULT_MIN_INTERVAL, InputWrapper},
  label::LabelTable,
  model::ReplayModelBuilder,
  output::OutputWrapper,
  postprocess::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_IOU_THRESHOLD, PostProcessConfig, PostProcessor,
  },
  preprocess::{Preprocessor, ResizeMode},
  task::{ContinuousTask, Task},
};
use tracing::info;

/// Lookout 连续检测参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型（回放张量）路径
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 类别名称文件
  #[arg(long, value_name = "LABELS")]
  pub labels: Url,
  /// 输入来源，image:// 或 folder://
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径，image:// 或 folder://
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,

  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<usize>,
  /// 两次结果之间的最短间隔（毫秒）
  #[arg(long, default_value_t = DEFAULT_MIN_INTERVAL.as_millis() as u64)]
  pub min_interval_ms: u64,

  #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
  pub confidence: f32,
  #[arg(long, default_value_t = DEFAULT_IOU_THRESHOLD)]
  pub iou: f32,
  #[arg(long, value_name = "N")]
  pub max_detections: Option<usize>,
  #[arg(long)]
  pub letterbox: bool,

  #[arg(long, requires = "view_height")]
  pub view_width: Option<u32>,
  #[arg(long, requires = "view_width")]
  pub view_height: Option<u32>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("类别文件路径: {}", args.labels);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  // 类别表只加载一次，之后各帧共享
  let labels = Arc::new(LabelTable::from_url(&args.labels)?);
  let view_size = args.view_width.zip(args.view_height);

  let input = InputWrapper::from_url(&args.input)?;
  let model = ReplayModelBuilder::from_url(&args.model)?.build()?;
  let preprocessor = Preprocessor::new(model.input_width() as u32, model.input_height() as u32)
    .with_resize(if args.letterbox {
      ResizeMode::Letterbox
    } else {
      ResizeMode::Stretch
    });
  let detector = Detector::new(
    model,
    preprocessor,
    PostProcessor::new(
      PostProcessConfig::default()
        .with_num_classes(labels.len())
        .with_confidence_threshold(args.confidence)
        .with_iou_threshold(args.iou)
        .with_max_detections(args.max_detections),
    ),
  )
  .with_view_size(view_size);
  let output = OutputWrapper::from_url(&args.output, labels.clone(), view_size)?;

  let summary = ContinuousTask::default()
    .with_frame_number(args.frame_number)
    .with_min_interval(Duration::from_millis(args.min_interval_ms))
    .with_interrupt(true)
    .with_labels(labels)
    .run_task(input, detector, output)?;
  info!("{:?}", summary);

  Ok(())
}
