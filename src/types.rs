use serde::{Deserialize, Deserializer, Serialize};

/// Width/height pair in millimetres. Width runs along the sheet's x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    pub fn rotated(&self) -> Self {
        Self {
            w: self.h,
            h: self.w,
        }
    }

    pub fn fits_in(&self, other: &Rect) -> bool {
        self.w <= other.w && self.h <= other.h
    }

    pub fn max_side(&self) -> u32 {
        self.w.max(self.h)
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// One row of the piece list, before quantity expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceRequirement {
    #[serde(default)]
    pub piece_id: String,
    pub material_id: String,
    #[serde(deserialize_with = "deserialize_u32_or_one")]
    pub width_mm: u32,
    #[serde(deserialize_with = "deserialize_u32_or_one")]
    pub height_mm: u32,
    #[serde(default = "default_quantity", deserialize_with = "deserialize_u32_or_one")]
    pub quantity: u32,
    #[serde(default)]
    pub rotatable: bool,
    #[serde(default)]
    pub banding: String,
    #[serde(default)]
    pub note: String,
}

fn default_quantity() -> u32 {
    1
}

/// Leading run of ASCII digits, ignoring surrounding whitespace:
/// `"600.5"` and `"600mm"` give 600. `None` when there are no digits or
/// the run is 0.
pub fn leading_u32(raw: &str) -> Option<u32> {
    let digits: String = raw.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let value = digits.parse::<u64>().map_or(u32::MAX, |v| v.min(u32::MAX as u64) as u32);
    (value > 0).then_some(value)
}

/// Accepts integers, floats and numeric strings; anything unusable is 1.
pub fn deserialize_u32_or_one<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match &value {
        serde_json::Value::Number(n) => match (n.as_u64(), n.as_f64()) {
            (Some(v), _) => Some(v.min(u32::MAX as u64) as u32),
            (None, Some(f)) if f >= 1.0 => Some(f.min(u32::MAX as f64) as u32),
            _ => None,
        },
        serde_json::Value::String(s) => leading_u32(s),
        _ => None,
    };
    Ok(parsed.filter(|&v| v > 0).unwrap_or_else(|| {
        tracing::warn!(%value, "unusable number, using 1");
        1
    }))
}

/// A single unit to be cut. `can_rotate` already folds in the material policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceInstance {
    pub id: String,
    pub material_id: String,
    pub rect: Rect,
    pub can_rotate: bool,
    pub banding: String,
    pub note: String,
}

impl PieceInstance {
    /// Candidate footprints in trial order: identity, then the swap if allowed.
    pub fn orientations(&self) -> Vec<(Rect, bool)> {
        let mut out = vec![(self.rect, false)];
        if self.can_rotate && self.rect.w != self.rect.h {
            out.push((self.rect.rotated(), true));
        }
        out
    }
}

/// A piece fixed on a sheet. `w`/`h` are the requirement's own size; the
/// area it covers is `footprint()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub piece_id: String,
    pub material_id: String,
    pub sheet_index: u32,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub rotated: bool,
    pub banding: String,
}

impl Placement {
    pub fn footprint(&self) -> Rect {
        let rect = Rect::new(self.w, self.h);
        if self.rotated { rect.rotated() } else { rect }
    }

    pub fn x_end(&self) -> u32 {
        self.x + self.footprint().w
    }

    pub fn y_end(&self) -> u32 {
        self.y + self.footprint().h
    }

    pub fn overlaps(&self, other: &Placement) -> bool {
        self.x < other.x_end()
            && other.x < self.x_end()
            && self.y < other.y_end()
            && other.y < self.y_end()
    }
}

/// Leftover strip large enough to keep for reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offcut {
    pub sheet_index: u32,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Offcut {
    pub fn overlaps(&self, p: &Placement) -> bool {
        self.x < p.x_end() && p.x < self.x + self.w && self.y < p.y_end() && p.y < self.y + self.h
    }
}
