use serde::Deserialize;

/// One `[[blocks]]` table in a blocks TOML file.
#[derive(Clone, Debug, Deserialize)]
pub struct BlockDef {
    pub name: String,
    /// Pins the state id; unset means "next free slot in list order".
    pub id: Option<u16>,
    pub solid: Option<bool>,
    pub blocks_skylight: Option<bool>,
    pub light_emission: Option<u8>,
}

impl BlockDef {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: None,
            solid: None,
            blocks_skylight: None,
            light_emission: None,
        }
    }

    pub fn solid(mut self, solid: bool) -> Self {
        self.solid = Some(solid);
        self
    }

    pub fn emitting(mut self, level: u8) -> Self {
        self.light_emission = Some(level);
        self
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BlocksConfig {
    pub blocks: Vec<BlockDef>,
}

impl BlocksConfig {
    /// Built-in catalog used by tests and the demo orchestrator when no
    /// blocks file is supplied.
    pub fn builtin() -> Self {
        Self {
            blocks: vec![
                BlockDef::named("air").solid(false),
                BlockDef::named("stone").solid(true),
                BlockDef::named("dirt").solid(true),
                BlockDef::named("grass").solid(true),
                BlockDef {
                    name: "water".into(),
                    id: None,
                    solid: Some(false),
                    blocks_skylight: Some(false),
                    light_emission: None,
                },
                BlockDef::named("bedrock").solid(true),
                BlockDef::named("glowstone").solid(true).emitting(15),
            ],
        }
    }
}
