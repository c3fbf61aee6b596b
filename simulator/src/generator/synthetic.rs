use crate::generator::scenario::ScenarioConfig;
use anyhow::Context;
use base64::Engine;
use image::{Rgb, RgbImage};
use overlaycore::backend_interface::WireDetection;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::BTreeMap;
use std::io::Cursor;

struct Track {
    class: String,
    track_id: u64,
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    width: f32,
    height: f32,
}

/// Builds wire-format detection frames with boxes drifting across the
/// frame, so consecutive samples look like a continuous recording.
pub fn build_result_frames(config: &ScenarioConfig) -> Vec<Vec<WireDetection>> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let width = config.detector_width as f32;
    let height = config.detector_height as f32;
    let classes = class_list(config);

    let mut tracks: Vec<Track> = (0..config.tracks.max(1))
        .map(|index| {
            let class = classes[index % classes.len()].clone();
            Track {
                class,
                track_id: index as u64 + 1,
                x: rng.gen_range(0.0..width * 0.6),
                y: rng.gen_range(0.0..height * 0.6),
                vx: rng.gen_range(-8.0..8.0),
                vy: rng.gen_range(-4.0..4.0),
                width: rng.gen_range(width * 0.05..width * 0.2),
                height: rng.gen_range(height * 0.08..height * 0.3),
            }
        })
        .collect();

    (0..config.normalized_frames())
        .map(|_| {
            tracks
                .iter_mut()
                .map(|track| {
                    track.x = (track.x + track.vx).clamp(0.0, width - track.width);
                    track.y = (track.y + track.vy).clamp(0.0, height - track.height);
                    WireDetection {
                        class_name: track.class.clone(),
                        confidence: rng.gen_range(0.6..0.98),
                        coords: vec![
                            track.x,
                            track.y,
                            track.x + track.width,
                            track.y + track.height,
                        ],
                        track_id: Some(track.track_id),
                    }
                })
                .collect()
        })
        .collect()
}

/// Unique-object counts per class, one count per track.
pub fn object_frequency(config: &ScenarioConfig) -> BTreeMap<String, u64> {
    let classes = class_list(config);
    let mut frequency = BTreeMap::new();
    for index in 0..config.tracks.max(1) {
        let class = &classes[index % classes.len()];
        *frequency.entry(class.clone()).or_insert(0) += 1;
    }
    frequency
}

fn class_list(config: &ScenarioConfig) -> Vec<String> {
    if config.classes.is_empty() {
        vec!["object".to_string()]
    } else {
        config.classes.clone()
    }
}

/// Small base64 JPEG overlays standing in for the real heatmap compositor.
/// One image per sample frame, intensity sweeping with the frame index.
pub fn build_heatmap_frames(config: &ScenarioConfig) -> anyhow::Result<Vec<String>> {
    let width = (config.detector_width / 10).max(16);
    let height = (config.detector_height / 10).max(16);
    let frames = config.normalized_frames();

    (0..frames)
        .map(|index| {
            let heat = (index as f32 + 1.0) / frames as f32;
            let img = RgbImage::from_fn(width, height, |x, y| {
                let gradient = x as f32 / width as f32;
                let red = (255.0 * heat * gradient) as u8;
                let blue = (255.0 * (1.0 - heat) * (y as f32 / height as f32)) as u8;
                Rgb([red, 32, blue])
            });
            let mut buffer = Vec::new();
            image::DynamicImage::ImageRgb8(img)
                .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Jpeg)
                .context("encoding synthetic heatmap frame")?;
            Ok(base64::engine::general_purpose::STANDARD.encode(buffer))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_match_the_configured_sample_count() {
        let config = ScenarioConfig::default();
        let frames = build_result_frames(&config);
        assert_eq!(frames.len(), 10);
        assert!(frames.iter().all(|frame| frame.len() == 3));
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let config = ScenarioConfig::default();
        let a = build_result_frames(&config);
        let b = build_result_frames(&config);
        assert_eq!(a[0][0].coords, b[0][0].coords);
    }

    #[test]
    fn boxes_stay_inside_detector_bounds() {
        let config = ScenarioConfig::default();
        for frame in build_result_frames(&config) {
            for detection in frame {
                assert!(detection.coords[0] >= 0.0);
                assert!(detection.coords[2] <= config.detector_width as f32);
                assert!(detection.coords[3] <= config.detector_height as f32);
            }
        }
    }

    #[test]
    fn frequency_counts_tracks_per_class() {
        let config = ScenarioConfig::default();
        let frequency = object_frequency(&config);
        assert_eq!(frequency.values().sum::<u64>(), config.tracks as u64);
    }

    #[test]
    fn heatmap_frames_are_valid_base64_jpegs() {
        let config = ScenarioConfig {
            sample_frames: 2,
            ..Default::default()
        };
        let frames = build_heatmap_frames(&config).unwrap();
        assert_eq!(frames.len(), 2);
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&frames[0])
            .unwrap();
        assert!(image::load_from_memory(&bytes).is_ok());
    }
}
