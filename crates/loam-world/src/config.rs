use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Deserialize)]
pub struct WorldConfig {
    #[serde(default = "default_min_y")]
    pub min_y: i32,
    #[serde(default = "default_height")]
    pub height: i32,
    #[serde(default)]
    pub seed: i64,
}

fn default_min_y() -> i32 {
    -64
}

fn default_height() -> i32 {
    384
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            min_y: default_min_y(),
            height: default_height(),
            seed: 0,
        }
    }
}

impl WorldConfig {
    pub fn load_from_path(path: &Path) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(path)?;
        let cfg: WorldConfig = toml::from_str(&text)?;
        Ok(cfg)
    }
}
