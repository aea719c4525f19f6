use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Rect;

pub const DEFAULT_SHEET: Rect = Rect { w: 1220, h: 2440 };
pub const DEFAULT_KERF: u32 = 4;
pub const DEFAULT_MIN_OFFCUT: Rect = Rect { w: 100, h: 100 };

/// Grain direction of a sheet material. Reported, not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grain {
    #[default]
    None,
    Length,
    Width,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialPolicy {
    #[serde(default = "default_true")]
    pub rotate: bool,
    #[serde(default)]
    pub grain: Grain,
}

impl Default for MaterialPolicy {
    fn default() -> Self {
        Self {
            rotate: true,
            grain: Grain::None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Cutting configuration shared by every material of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuttingConfig {
    #[serde(default = "default_sheet_mm", with = "dims")]
    pub default_sheet_mm: Rect,
    #[serde(default = "default_kerf")]
    pub saw_kerf_mm: u32,
    #[serde(default = "default_min_offcut_mm", with = "dims")]
    pub min_offcut_mm: Rect,
    #[serde(default)]
    pub materials: BTreeMap<String, MaterialPolicy>,
}

fn default_sheet_mm() -> Rect {
    DEFAULT_SHEET
}

fn default_kerf() -> u32 {
    DEFAULT_KERF
}

fn default_min_offcut_mm() -> Rect {
    DEFAULT_MIN_OFFCUT
}

impl Default for CuttingConfig {
    fn default() -> Self {
        Self {
            default_sheet_mm: DEFAULT_SHEET,
            saw_kerf_mm: DEFAULT_KERF,
            min_offcut_mm: DEFAULT_MIN_OFFCUT,
            materials: BTreeMap::new(),
        }
    }
}

impl CuttingConfig {
    pub fn policy(&self, material_id: &str) -> MaterialPolicy {
        self.materials.get(material_id).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(default, with = "opt_dims")]
    pub sheet_mm: Option<Rect>,
}

/// Material catalog; only the sheet size of each item matters here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetCatalog {
    #[serde(default)]
    pub items: BTreeMap<String, CatalogItem>,
}

impl SheetCatalog {
    /// Catalog size for `material_id`, falling back to the configured default.
    pub fn sheet_for(&self, material_id: &str, config: &CuttingConfig) -> Rect {
        self.items
            .get(material_id)
            .and_then(|item| item.sheet_mm)
            .unwrap_or(config.default_sheet_mm)
    }
}

/// `[w, h]` arrays on the wire.
pub mod dims {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::types::Rect;

    pub fn serialize<S: Serializer>(rect: &Rect, s: S) -> Result<S::Ok, S::Error> {
        [rect.w, rect.h].serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Rect, D::Error> {
        let [w, h] = <[u32; 2]>::deserialize(d)?;
        Ok(Rect::new(w, h))
    }
}

mod opt_dims {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::types::Rect;

    pub fn serialize<S: Serializer>(rect: &Option<Rect>, s: S) -> Result<S::Ok, S::Error> {
        rect.map(|r| [r.w, r.h]).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Rect>, D::Error> {
        let raw = Option::<[u32; 2]>::deserialize(d)?;
        Ok(raw.map(|[w, h]| Rect::new(w, h)))
    }
}
