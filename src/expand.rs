use crate::config::CuttingConfig;
use crate::types::{PieceInstance, PieceRequirement, Rect};

/// Expands each requirement into `quantity` unit instances, keeping row order.
/// Every unit keeps the requirement's id.
///
/// Never rejects a row: a zero quantity or dimension is raised to 1, a blank
/// id becomes `P{row}` and a blank banding code becomes `-`.
pub fn expand_pieces(requirements: &[PieceRequirement], config: &CuttingConfig) -> Vec<PieceInstance> {
    let mut instances = Vec::new();

    for (row, req) in requirements.iter().enumerate() {
        let qty = at_least_one(req.quantity, "quantity", row);
        let rect = Rect::new(
            at_least_one(req.width_mm, "width_mm", row),
            at_least_one(req.height_mm, "height_mm", row),
        );
        let id = if req.piece_id.trim().is_empty() {
            format!("P{}", row + 1)
        } else {
            req.piece_id.trim().to_string()
        };
        let banding = if req.banding.trim().is_empty() {
            "-".to_string()
        } else {
            req.banding.clone()
        };
        let can_rotate = req.rotatable && config.policy(&req.material_id).rotate;

        for _ in 0..qty {
            instances.push(PieceInstance {
                id: id.clone(),
                material_id: req.material_id.clone(),
                rect,
                can_rotate,
                banding: banding.clone(),
                note: req.note.clone(),
            });
        }
    }

    instances
}

fn at_least_one(value: u32, field: &str, row: usize) -> u32 {
    if value == 0 {
        tracing::warn!(row = row + 1, field, "non-positive value, using 1");
        1
    } else {
        value
    }
}
