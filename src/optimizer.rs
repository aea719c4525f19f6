use crate::config::{CuttingConfig, Grain, SheetCatalog};
use crate::error::OptimizeError;
use crate::expand::expand_pieces;
use crate::group::group_by_material;
use crate::offcut::annotate_offcuts;
use crate::report::{CutListRow, CuttingReport, MaterialMetrics, MaterialSheetsReport};
use crate::shelf::{Sheet, pack_material};
use crate::types::{PieceRequirement, Rect};

/// Packed sheets and metrics for one material.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialPlan {
    pub material_id: String,
    pub stock: Rect,
    pub kerf: u32,
    pub grain: Grain,
    pub sheets: Vec<Sheet>,
    pub metrics: MaterialMetrics,
}

/// Result of a complete run, materials in first-appearance order.
#[derive(Debug, Clone, PartialEq)]
pub struct CuttingPlan {
    pub project_id: Option<String>,
    pub materials: Vec<MaterialPlan>,
}

impl CuttingPlan {
    pub fn report(&self) -> CuttingReport {
        CuttingReport {
            project_id: self.project_id.clone(),
            material_sheets: self
                .materials
                .iter()
                .map(|m| {
                    (
                        m.material_id.clone(),
                        MaterialSheetsReport::new(m.stock, m.kerf, m.grain, &m.metrics, &m.sheets),
                    )
                })
                .collect(),
        }
    }

    /// Materials in processing order, then sheets, then placement order.
    pub fn cut_list(&self) -> Vec<CutListRow> {
        self.materials
            .iter()
            .flat_map(|m| &m.sheets)
            .flat_map(|s| &s.placements)
            .map(CutListRow::from)
            .collect()
    }

    pub fn sheet_count(&self) -> usize {
        self.materials.iter().map(|m| m.sheets.len()).sum()
    }
}

pub struct Optimizer {
    config: CuttingConfig,
    catalog: SheetCatalog,
}

impl Optimizer {
    pub fn new(config: CuttingConfig, catalog: SheetCatalog) -> Self {
        Self { config, catalog }
    }

    /// Runs expansion, grouping, packing, offcut detection and metrics.
    /// A piece that fits no sheet aborts the run for every material.
    pub fn optimize(
        &self,
        project_id: Option<String>,
        requirements: &[PieceRequirement],
    ) -> Result<CuttingPlan, OptimizeError> {
        let instances = expand_pieces(requirements, &self.config);
        let groups = group_by_material(instances);
        let kerf = self.config.saw_kerf_mm;

        let mut materials = Vec::with_capacity(groups.len());
        for group in groups {
            let stock = self.catalog.sheet_for(&group.material_id, &self.config);
            let grain = self.config.policy(&group.material_id).grain;

            let mut sheets = pack_material(stock, kerf, group.pieces.clone())?;
            annotate_offcuts(&mut sheets, stock, self.config.min_offcut_mm);
            let metrics = MaterialMetrics::compute(stock, sheets.len(), &group.pieces);

            tracing::info!(
                material = %group.material_id,
                sheet = %stock,
                pieces = group.pieces.len(),
                sheets_used = metrics.sheets_used,
                "{} sheets used | waste {:.1}% | material {}",
                metrics.sheets_used,
                metrics.waste_pct * 100.0,
                group.material_id,
            );

            materials.push(MaterialPlan {
                material_id: group.material_id,
                stock,
                kerf,
                grain,
                sheets,
                metrics,
            });
        }

        Ok(CuttingPlan {
            project_id,
            materials,
        })
    }
}
