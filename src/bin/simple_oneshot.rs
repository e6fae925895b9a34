// 该文件是 Lookout （瞭望） 项目的一部分。
// src/bin/simple_oneshot.rs - 单帧检测
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

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use url::Url;

use lookout::{
  FromUrl,
  detector::Detector,
  input::ImageFileInput,
  label::LabelTable,
  model::ReplayModelBuilder,
  output::OutputWrapper,
  postprocess::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_IOU_THRESHOLD, PostProcessConfig, PostProcessor,
  },
  preprocess::{Preprocessor, ResizeMode},
  task::{OneShotTask, Task},
};
use tracing::info;

/// Lookout 单帧检测参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型（回放张量）路径，例如 replay:///tmp/out.bin?shape=1,25200,85
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 类别名称文件，例如 labels:///tmp/classes.txt
  #[arg(long, value_name = "LABELS")]
  pub labels: Url,
  /// 输入图像
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,

  #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
  pub confidence: f32,
  #[arg(long, default_value_t = DEFAULT_IOU_THRESHOLD)]
  pub iou: f32,
  #[arg(long, value_name = "N")]
  pub max_detections: Option<usize>,

  /// 保持宽高比缩放
  #[arg(long)]
  pub letterbox: bool,

  /// 显示区域尺寸
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

  let labels = Arc::new(LabelTable::from_url(&args.labels)?);
  info!("加载 {} 个类别", labels.len());
  let view_size = args.view_width.zip(args.view_height);

  let input_image = ImageFileInput::from_url(&args.input)?;
  let model = ReplayModelBuilder::from_url(&args.model)?.build()?;
  let resize = if args.letterbox {
    ResizeMode::Letterbox
  } else {
    ResizeMode::Stretch
  };
  // 预处理尺寸跟随模型输入
  let preprocessor =
    Preprocessor::new(model.input_width() as u32, model.input_height() as u32).with_resize(resize);
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

  let summary = OneShotTask::default()
    .with_labels(labels)
    .run_task(input_image, detector, output)?;
  info!("检测到 {} 个对象", summary.detections);

  Ok(())
}
