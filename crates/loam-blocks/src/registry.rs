use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use crate::config::{BlockDef, BlocksConfig};
use crate::types::BlockState;

/// Fully resolved entry in the registry's id space.
#[derive(Clone, Debug)]
pub struct BlockType {
    pub name: String,
    pub solid: bool,
    pub blocks_skylight: bool,
    pub light_emission: u8,
}

/// Process-wide, immutable ordering of block states. Built once at startup
/// and shared behind an `Arc`; palettes resolve global ids through it.
#[derive(Clone, Debug, Default)]
pub struct BlockRegistry {
    blocks: Vec<BlockType>,
    by_name: HashMap<String, u16>,
}

impl BlockRegistry {
    pub fn from_config(cfg: BlocksConfig) -> Result<Self, Box<dyn Error>> {
        let mut slots: Vec<Option<BlockType>> = Vec::new();
        let mut pending: Vec<BlockDef> = Vec::new();

        for def in cfg.blocks {
            match def.id {
                Some(id) => {
                    let idx = id as usize;
                    if slots.len() <= idx {
                        slots.resize(idx + 1, None);
                    }
                    if slots[idx].is_some() {
                        return Err(format!("duplicate block id {id} ({})", def.name).into());
                    }
                    slots[idx] = Some(resolve(def));
                }
                None => pending.push(def),
            }
        }
        for def in pending {
            match slots.iter().position(|s| s.is_none()) {
                Some(idx) => slots[idx] = Some(resolve(def)),
                None => slots.push(Some(resolve(def))),
            }
        }

        let mut blocks = Vec::with_capacity(slots.len());
        for (idx, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(ty) => blocks.push(ty),
                None => return Err(format!("gap in block id space at {idx}").into()),
            }
        }
        if blocks.first().map(|b| b.name.as_str()) != Some("air") {
            return Err("block state 0 must be \"air\"".into());
        }

        let mut by_name = HashMap::with_capacity(blocks.len());
        for (idx, ty) in blocks.iter().enumerate() {
            if by_name.insert(ty.name.clone(), idx as u16).is_some() {
                return Err(format!("duplicate block name {}", ty.name).into());
            }
        }
        Ok(Self { blocks, by_name })
    }

    pub fn load_from_path(path: &Path) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(path)?;
        let cfg: BlocksConfig = toml::from_str(&text)?;
        Self::from_config(cfg)
    }

    pub fn builtin() -> Self {
        Self::from_config(BlocksConfig::builtin()).expect("builtin block catalog is valid")
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    #[inline]
    pub fn contains(&self, state: BlockState) -> bool {
        (state.0 as usize) < self.blocks.len()
    }

    #[inline]
    pub fn get(&self, state: BlockState) -> Option<&BlockType> {
        self.blocks.get(state.0 as usize)
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockState> {
        self.by_name.get(name).copied().map(BlockState)
    }

    /// Name for serialization; unknown states fall back to air with a
    /// warning, matching decode behavior for stale persisted data.
    pub fn name_of(&self, state: BlockState) -> &str {
        match self.get(state) {
            Some(ty) => &ty.name,
            None => {
                log::warn!("unregistered block state {} treated as air", state.0);
                "air"
            }
        }
    }

    #[inline]
    pub fn is_solid(&self, state: BlockState) -> bool {
        self.get(state).map(|ty| ty.solid).unwrap_or(false)
    }

    #[inline]
    pub fn blocks_skylight(&self, state: BlockState) -> bool {
        self.get(state).map(|ty| ty.blocks_skylight).unwrap_or(false)
    }

    #[inline]
    pub fn light_emission(&self, state: BlockState) -> u8 {
        self.get(state).map(|ty| ty.light_emission).unwrap_or(0)
    }
}

fn resolve(def: BlockDef) -> BlockType {
    let solid = def.solid.unwrap_or(def.name != "air");
    BlockType {
        blocks_skylight: def.blocks_skylight.unwrap_or(solid),
        light_emission: def.light_emission.unwrap_or(0),
        solid,
        name: def.name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_pins_air_at_zero() {
        let reg = BlockRegistry::builtin();
        assert_eq!(reg.id_by_name("air"), Some(BlockState::AIR));
        assert!(!reg.is_solid(BlockState::AIR));
        assert!(reg.is_solid(reg.id_by_name("stone").unwrap()));
    }

    #[test]
    fn pinned_ids_are_respected() {
        let cfg: BlocksConfig = toml::from_str(
            r#"
            [[blocks]]
            name = "slate"
            id = 2

            [[blocks]]
            name = "air"
            solid = false

            [[blocks]]
            name = "moss"
            "#,
        )
        .unwrap();
        let reg = BlockRegistry::from_config(cfg).unwrap();
        assert_eq!(reg.id_by_name("slate"), Some(BlockState(2)));
        assert_eq!(reg.id_by_name("air"), Some(BlockState(0)));
        assert_eq!(reg.id_by_name("moss"), Some(BlockState(1)));
    }

    #[test]
    fn rejects_catalog_without_air_first() {
        let cfg = BlocksConfig {
            blocks: vec![BlockDef::named("stone")],
        };
        assert!(BlockRegistry::from_config(cfg).is_err());
    }

    #[test]
    fn unknown_state_serializes_as_air() {
        let reg = BlockRegistry::builtin();
        assert_eq!(reg.name_of(BlockState(999)), "air");
    }
}
