use crate::types::PieceInstance;

/// All instances of one material, in expansion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialGroup {
    pub material_id: String,
    pub pieces: Vec<PieceInstance>,
}

/// Partitions instances by material. Groups appear in order of first
/// occurrence; order inside a group is preserved.
pub fn group_by_material(instances: Vec<PieceInstance>) -> Vec<MaterialGroup> {
    let mut groups: Vec<MaterialGroup> = Vec::new();
    for piece in instances {
        match groups.iter_mut().find(|g| g.material_id == piece.material_id) {
            Some(group) => group.pieces.push(piece),
            None => groups.push(MaterialGroup {
                material_id: piece.material_id.clone(),
                pieces: vec![piece],
            }),
        }
    }
    groups
}
