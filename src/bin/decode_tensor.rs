// 该文件是 Lookout （瞭望） 项目的一部分。
// src/bin/decode_tensor.rs - 解码离线保存的模型输出
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

use anyhow::{Result, bail};
use clap::Parser;
use serde_json::json;
use url::Url;

use lookout::{
  FromUrl,
  label::LabelTable,
  model::ReplayModelBuilder,
  postprocess::{
    COCO_CLASS_NUM, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_IOU_THRESHOLD, PostProcessConfig,
    PostProcessor, ScaleParams,
  },
};
use tracing::info;

/// 对保存的原始输出张量执行后处理，并以 JSON 打印检测结果
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 张量文件，例如 replay:///tmp/out.bin?shape=1,25200,85&input=640,640
  #[arg(long, value_name = "TENSOR")]
  pub tensor: Url,
  /// 类别名称文件；提供时类别数量取其条目数
  #[arg(long, value_name = "LABELS")]
  pub labels: Option<Url>,
  #[arg(long, value_name = "N", conflicts_with = "labels")]
  pub num_classes: Option<usize>,

  #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
  pub confidence: f32,
  #[arg(long, default_value_t = DEFAULT_IOU_THRESHOLD)]
  pub iou: f32,
  #[arg(long, value_name = "N")]
  pub max_detections: Option<usize>,

  /// 原图尺寸，未提供时坐标保持在模型输入空间
  #[arg(long, requires = "image_height")]
  pub image_width: Option<u32>,
  #[arg(long, requires = "image_width")]
  pub image_height: Option<u32>,
  /// 显示区域尺寸，仅在提供原图尺寸时生效
  #[arg(long, requires = "view_height")]
  pub view_width: Option<u32>,
  #[arg(long, requires = "view_width")]
  pub view_height: Option<u32>,
  /// 模型输入空间中的填充偏移
  #[arg(long, default_value_t = 0.0)]
  pub pad_x: f32,
  #[arg(long, default_value_t = 0.0)]
  pub pad_y: f32,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  info!("张量文件路径: {}", args.tensor);

  let labels = args.labels.as_ref().map(LabelTable::from_url).transpose()?;
  let num_classes = match (&labels, args.num_classes) {
    (Some(labels), _) => labels.len(),
    (None, Some(n)) => n,
    (None, None) => COCO_CLASS_NUM,
  };

  let model = ReplayModelBuilder::from_url(&args.tensor)?.build()?;
  let (input_w, input_h) = (model.input_width() as f32, model.input_height() as f32);

  let mut scale = ScaleParams::identity().with_padding(args.pad_x, args.pad_y);
  if let Some((image_w, image_h)) = args.image_width.zip(args.image_height) {
    if image_w == 0 || image_h == 0 {
      bail!("原图尺寸不能为 0");
    }
    let (image_w, image_h) = (image_w as f32, image_h as f32);
    scale = ScaleParams::new(image_w / input_w, image_h / input_h, 1.0, 1.0)
      .with_padding(args.pad_x, args.pad_y);
    if let Some((view_w, view_h)) = args.view_width.zip(args.view_height) {
      scale = scale.with_view_scale(view_w as f32 / image_w, view_h as f32 / image_h);
    }
  }

  let postprocessor = PostProcessor::new(
    PostProcessConfig::default()
      .with_num_classes(num_classes)
      .with_confidence_threshold(args.confidence)
      .with_iou_threshold(args.iou)
      .with_max_detections(args.max_detections),
  );
  let result = postprocessor.process(model.output(), &scale)?;
  info!("检测到 {} 个对象", result.len());

  let items: Vec<_> = result
    .items
    .iter()
    .map(|item| {
      let class = match &labels {
        Some(labels) => json!(labels.name_or_index(item.class_index)),
        None => json!(item.class_index),
      };
      json!({
        "class": class,
        "class_index": item.class_index,
        "score": item.score,
        "rect": item.rect.as_array(),
      })
    })
    .collect();
  println!("{}", serde_json::to_string_pretty(&items)?);

  Ok(())
}
