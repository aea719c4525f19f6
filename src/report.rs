use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{Grain, dims};
use crate::shelf::Sheet;
use crate::types::{Offcut, PieceInstance, Placement, Rect};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialMetrics {
    pub sheets_used: usize,
    pub sheet_area_m2: f64,
    pub pieces_area_m2: f64,
    pub waste_area_m2: f64,
    pub waste_pct: f64,
}

impl MaterialMetrics {
    // Offcuts are not deducted from waste.
    pub fn compute(stock: Rect, sheets_used: usize, pieces: &[PieceInstance]) -> Self {
        let sheet_area_m2 = stock.area() as f64 / 1e6;
        let pieces_mm2: u64 = pieces.iter().map(|p| p.rect.area()).sum();
        let pieces_area_m2 = pieces_mm2 as f64 / 1e6;
        let total_m2 = sheets_used as f64 * sheet_area_m2;
        let waste_area_m2 = total_m2 - pieces_area_m2;
        let waste_pct = if total_m2 > 0.0 {
            waste_area_m2 / total_m2
        } else {
            0.0
        };
        Self {
            sheets_used,
            sheet_area_m2,
            pieces_area_m2,
            waste_area_m2,
            waste_pct,
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSheetsReport {
    #[serde(with = "dims")]
    pub sheet_mm: Rect,
    pub kerf_mm: u32,
    pub grain: Grain,
    pub sheets_used: usize,
    pub sheet_area_m2: f64,
    pub pieces_area_m2: f64,
    pub waste_area_m2: f64,
    pub waste_pct: f64,
    pub placements: Vec<Placement>,
    pub offcuts: Vec<Offcut>,
}

impl MaterialSheetsReport {
    pub fn new(stock: Rect, kerf: u32, grain: Grain, metrics: &MaterialMetrics, sheets: &[Sheet]) -> Self {
        Self {
            sheet_mm: stock,
            kerf_mm: kerf,
            grain,
            sheets_used: metrics.sheets_used,
            sheet_area_m2: round_to(metrics.sheet_area_m2, 4),
            pieces_area_m2: round_to(metrics.pieces_area_m2, 4),
            waste_area_m2: round_to(metrics.waste_area_m2, 4),
            waste_pct: round_to(metrics.waste_pct, 3),
            placements: sheets.iter().flat_map(|s| s.placements.iter().cloned()).collect(),
            offcuts: sheets.iter().flat_map(|s| s.offcuts.iter().copied()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuttingReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub material_sheets: BTreeMap<String, MaterialSheetsReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutListRow {
    pub piece_id: String,
    pub material_id: String,
    pub sheet_index: u32,
    pub x_mm: u32,
    pub y_mm: u32,
    pub w_mm: u32,
    pub h_mm: u32,
    pub rotated: bool,
    pub banding: String,
}

impl From<&Placement> for CutListRow {
    fn from(p: &Placement) -> Self {
        Self {
            piece_id: p.piece_id.clone(),
            material_id: p.material_id.clone(),
            sheet_index: p.sheet_index,
            x_mm: p.x,
            y_mm: p.y,
            w_mm: p.w,
            h_mm: p.h,
            rotated: p.rotated,
            banding: p.banding.clone(),
        }
    }
}

pub const CUT_LIST_HEADER: &str = "piece_id,material_id,sheet_index,x_mm,y_mm,w_mm,h_mm,rotated,banding";

pub fn cut_list_csv(rows: &[CutListRow]) -> String {
    let mut out = String::from(CUT_LIST_HEADER);
    out.push('\n');
    for r in rows {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{}\n",
            csv_field(&r.piece_id),
            csv_field(&r.material_id),
            r.sheet_index,
            r.x_mm,
            r.y_mm,
            r.w_mm,
            r.h_mm,
            r.rotated,
            csv_field(&r.banding),
        ));
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shelf::pack_material;
    use crate::shelf::tests::pieces;
    use approx::assert_relative_eq;

    #[test]
    fn test_metrics_sixteen_pieces() {
        let list = pieces(16, 300, 200, true);
        let stock = Rect::new(1220, 2440);
        let sheets = pack_material(stock, 4, list.clone()).unwrap();
        let m = MaterialMetrics::compute(stock, sheets.len(), &list);
        assert_eq!(m.sheets_used, 1);
        assert_relative_eq!(m.sheet_area_m2, 2.9768);
        assert_relative_eq!(m.pieces_area_m2, 0.96);
        assert_relative_eq!(m.waste_area_m2, 2.9768 - 16.0 * 0.06, epsilon = 1e-12);
        assert_relative_eq!(m.waste_pct, (2.9768 - 16.0 * 0.06) / 2.9768, epsilon = 1e-12);
    }

    #[test]
    fn test_waste_not_reduced_by_offcuts() {
        let stock = Rect::new(1000, 1000);
        let list = pieces(1, 500, 500, false);
        let m = MaterialMetrics::compute(stock, 1, &list);
        assert_relative_eq!(m.waste_area_m2, 0.75);
        assert_relative_eq!(m.waste_pct, 0.75);
    }

    #[test]
    fn test_waste_pct_in_unit_range() {
        let stock = Rect::new(1220, 2440);
        for n in [1, 5, 17, 40] {
            let list = pieces(n, 610, 433, true);
            let sheets = pack_material(stock, 4, list.clone()).unwrap();
            let m = MaterialMetrics::compute(stock, sheets.len(), &list);
            assert!((0.0..1.0).contains(&m.waste_pct), "waste_pct {} for {n} pieces", m.waste_pct);
        }
    }

    #[test]
    fn test_report_rounding() {
        let stock = Rect::new(1220, 2440);
        let list = pieces(16, 300, 200, true);
        let sheets = pack_material(stock, 4, list.clone()).unwrap();
        let m = MaterialMetrics::compute(stock, sheets.len(), &list);
        let r = MaterialSheetsReport::new(stock, 4, Grain::None, &m, &sheets);
        assert_eq!(r.sheet_area_m2, 2.9768);
        assert_eq!(r.pieces_area_m2, 0.96);
        assert_eq!(r.waste_area_m2, 2.0168);
        assert_eq!(r.waste_pct, 0.678);
        assert_eq!(r.placements.len(), 16);

        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["sheet_mm"], serde_json::json!([1220, 2440]));
        assert_eq!(json["placements"][1]["x"], serde_json::json!(304));
    }

    #[test]
    fn test_cut_list_csv() {
        let rows = vec![
            CutListRow {
                piece_id: "door".into(),
                material_id: "mel.white.18".into(),
                sheet_index: 1,
                x_mm: 0,
                y_mm: 0,
                w_mm: 396,
                h_mm: 716,
                rotated: false,
                banding: "L1,C1".into(),
            },
            CutListRow {
                piece_id: "shelf".into(),
                material_id: "mel.white.18".into(),
                sheet_index: 2,
                x_mm: 400,
                y_mm: 0,
                w_mm: 560,
                h_mm: 300,
                rotated: true,
                banding: "-".into(),
            },
        ];
        let csv = cut_list_csv(&rows);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CUT_LIST_HEADER);
        assert_eq!(lines[1], "door,mel.white.18,1,0,0,396,716,false,\"L1,C1\"");
        assert_eq!(lines[2], "shelf,mel.white.18,2,400,0,560,300,true,-");
    }
}
