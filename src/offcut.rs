use crate::shelf::Sheet;
use crate::types::{Offcut, Rect};

// Gaps between shelves are not reported.
pub fn find_offcuts(sheet: &Sheet, stock: Rect, min_offcut: Rect) -> Vec<Offcut> {
    let max_x = sheet.placements.iter().map(|p| p.x_end()).max().unwrap_or(0);
    let max_y = sheet.placements.iter().map(|p| p.y_end()).max().unwrap_or(0);

    let right = Offcut {
        sheet_index: sheet.index,
        x: max_x,
        y: 0,
        w: stock.w.saturating_sub(max_x),
        h: stock.h,
    };
    let bottom = Offcut {
        sheet_index: sheet.index,
        x: 0,
        y: max_y,
        w: max_x,
        h: stock.h.saturating_sub(max_y),
    };

    [right, bottom]
        .into_iter()
        .filter(|o| o.w >= min_offcut.w && o.h >= min_offcut.h)
        .collect()
}

pub fn annotate_offcuts(sheets: &mut [Sheet], stock: Rect, min_offcut: Rect) {
    for sheet in sheets.iter_mut() {
        sheet.offcuts = find_offcuts(sheet, stock, min_offcut);
    }
}
