use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for one synthetic processing scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub classes: Vec<String>,
    pub sample_frames: usize,
    pub detector_width: u32,
    pub detector_height: u32,
    pub tracks: usize,
    pub seed: u64,
    /// Percent points a job advances per status poll.
    pub percent_step: u8,
    pub use_heatmap: bool,
    pub description: Option<String>,
    pub scenario: Option<String>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            classes: vec!["person".into(), "car".into(), "truck".into()],
            sample_frames: 10,
            detector_width: 640,
            detector_height: 480,
            tracks: 3,
            seed: 7,
            percent_step: 20,
            use_heatmap: false,
            description: None,
            scenario: None,
        }
    }
}

impl ScenarioConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading scenario config {}", path_ref.display()))?;
        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing scenario config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn normalized_frames(&self) -> usize {
        self.sample_frames.max(1)
    }

    pub fn normalized_step(&self) -> u8 {
        self.percent_step.clamp(1, 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_is_usable() {
        let cfg = ScenarioConfig::default();
        assert_eq!(cfg.normalized_frames(), 10);
        assert_eq!(cfg.normalized_step(), 20);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"sample_frames: 25\npercent_step: 10\nclasses: [person, boat]\n")
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = ScenarioConfig::load(&path).unwrap();
        assert_eq!(cfg.sample_frames, 25);
        assert_eq!(cfg.classes, vec!["person", "boat"]);
        assert_eq!(cfg.detector_width, 640);
    }

    #[test]
    fn percent_step_is_clamped_away_from_zero() {
        let cfg = ScenarioConfig {
            percent_step: 0,
            ..Default::default()
        };
        assert_eq!(cfg.normalized_step(), 1);
    }
}
