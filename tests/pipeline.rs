// 该文件是 Lookout （瞭望） 项目的一部分。
// tests/pipeline.rs - 端到端检测流程测试
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

use std::path::Path;

use lookout::{
  FromUrl,
  model::ReplayModelBuilder,
  postprocess::{PostProcessConfig, PostProcessor, Rect, ScaleParams},
};
use url::Url;

/// 三类模型，每行 [cx, cy, w, h, obj, c0, c1, c2]
fn write_dump(path: &Path, rows: &[[f32; 8]]) {
  let bytes: Vec<u8> = rows
    .iter()
    .flatten()
    .flat_map(|v| v.to_le_bytes())
    .collect();
  std::fs::write(path, bytes).unwrap();
}

fn rows() -> Vec<[f32; 8]> {
  vec![
    // 类别 2 的两个高度重叠框
    [320.0, 320.0, 64.0, 64.0, 0.9, 0.0, 0.1, 1.0],
    [322.0, 320.0, 64.0, 64.0, 0.8, 0.0, 0.1, 1.0],
    // 类别 0，与上面的框位置相同但类别不同
    [320.0, 320.0, 64.0, 64.0, 0.6, 1.0, 0.0, 0.0],
    // 低于阈值
    [100.0, 100.0, 10.0, 10.0, 0.5, 0.2, 0.0, 0.0],
  ]
}

fn replay_url(path: &Path, anchors: usize) -> Url {
  let mut url = Url::from_file_path(path).unwrap();
  url.set_query(Some(&format!("shape=1,{},8&input=640,640", anchors)));
  let url = url.as_str().replacen("file://", "replay://", 1);
  Url::parse(&url).unwrap()
}

#[test]
fn replayed_tensor_through_letterbox_mapping() {
  let dir = tempfile::tempdir().unwrap();
  let dump = dir.path().join("output.bin");
  write_dump(&dump, &rows());

  let model = ReplayModelBuilder::from_url(&replay_url(&dump, 4))
    .unwrap()
    .build()
    .unwrap();

  // 1280x720 以 0.5 倍缩放后上下各填充 140 像素
  let scale = ScaleParams::new(2.0, 2.0, 1.0, 1.0).with_padding(0.0, 140.0);
  let processor = PostProcessor::new(PostProcessConfig::default().with_num_classes(3));
  let result = processor.process(model.output(), &scale).unwrap();

  assert_eq!(result.len(), 2);
  assert_eq!(result.items[0].class_index, 0);
  assert_eq!(result.items[0].score, 0.6);
  assert_eq!(result.items[1].class_index, 2);
  assert_eq!(result.items[1].score, 0.9);
  assert_eq!(result.items[1].rect, Rect::new(576.0, 296.0, 704.0, 424.0));
}

#[test]
fn mismatched_class_count_fails_fast() {
  let dir = tempfile::tempdir().unwrap();
  let dump = dir.path().join("output.bin");
  write_dump(&dump, &rows());

  let model = ReplayModelBuilder::from_url(&replay_url(&dump, 4))
    .unwrap()
    .build()
    .unwrap();
  let processor = PostProcessor::new(PostProcessConfig::default());
  assert!(processor.process(model.output(), &ScaleParams::identity()).is_err());
}

#[cfg(all(feature = "read_image_file", feature = "save_image_file"))]
mod with_images {
  use std::sync::Arc;

  use image::{Rgb, RgbImage};
  use lookout::{
    detector::Detector,
    input::ImageFileInput,
    label::LabelTable,
    output::OutputWrapper,
    postprocess::{PostProcessConfig, PostProcessor},
    preprocess::{Preprocessor, ResizeMode},
    task::{OneShotTask, Task},
  };

  use super::*;

  #[test]
  fn oneshot_task_writes_overlay() {
    let dir = tempfile::tempdir().unwrap();
    let dump = dir.path().join("output.bin");
    write_dump(&dump, &rows());
    let target = dir.path().join("out/overlay.png");

    let model = ReplayModelBuilder::from_url(&replay_url(&dump, 4))
      .unwrap()
      .build()
      .unwrap();
    let labels = Arc::new(LabelTable::from_names(["person", "bicycle", "car"]).unwrap());
    let detector = Detector::new(
      model,
      Preprocessor::new(640, 640).with_resize(ResizeMode::Letterbox),
      PostProcessor::new(PostProcessConfig::default().with_num_classes(labels.len())),
    );
    let input = ImageFileInput::from_image(RgbImage::from_pixel(1280, 720, Rgb([0, 0, 0])));
    let output_url = Url::from_file_path(&target).unwrap();
    let output_url = Url::parse(&output_url.as_str().replacen("file://", "image://", 1)).unwrap();
    let output = OutputWrapper::from_url(&output_url, labels.clone(), None).unwrap();

    let summary = OneShotTask::default()
      .with_labels(labels)
      .run_task(input, detector, output)
      .unwrap();
    assert_eq!(summary.detections, 2);

    let saved = image::open(&target).unwrap().to_rgb8();
    assert_eq!(saved.dimensions(), (1280, 720));
    // 类别 2 的框左上角 (576, 296) 被描边
    assert_ne!(saved.get_pixel(576, 296), &Rgb([0, 0, 0]));
    assert_eq!(saved.get_pixel(640, 360), &Rgb([0, 0, 0]));
  }
}
