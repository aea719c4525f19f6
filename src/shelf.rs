use std::cmp::Reverse;

use crate::error::OptimizeError;
use crate::types::{Offcut, PieceInstance, Placement, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shelf {
    pub y: u32,
    pub height: u32,
    pub cursor_x: u32,
    pub remaining_width: u32,
}

impl Shelf {
    fn accepts(&self, piece: Rect, kerf: u32) -> bool {
        self.height >= piece.h && self.remaining_width >= piece.w.saturating_add(kerf)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub index: u32,
    pub shelves: Vec<Shelf>,
    pub cursor_y: u32,
    pub placements: Vec<Placement>,
    pub offcuts: Vec<Offcut>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Shelf(usize),
    NewShelf,
}

impl Sheet {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            shelves: Vec::new(),
            cursor_y: 0,
            placements: Vec::new(),
            offcuts: Vec::new(),
        }
    }

    pub fn used_area(&self) -> u64 {
        self.placements.iter().map(|p| p.w as u64 * p.h as u64).sum()
    }

    pub fn find_slot(&self, piece: Rect, kerf: u32, sheet_height: u32) -> Option<Slot> {
        if let Some(idx) = self.shelves.iter().position(|s| s.accepts(piece, kerf)) {
            return Some(Slot::Shelf(idx));
        }
        if sheet_height.saturating_sub(self.cursor_y) >= piece.h.saturating_add(kerf) {
            return Some(Slot::NewShelf);
        }
        None
    }

    fn place(
        &mut self,
        slot: Slot,
        piece: &PieceInstance,
        footprint: Rect,
        rotated: bool,
        sheet_width: u32,
        kerf: u32,
    ) -> Placement {
        let shelf_idx = match slot {
            Slot::Shelf(idx) => idx,
            Slot::NewShelf => {
                tracing::debug!(
                    sheet = self.index,
                    y = self.cursor_y,
                    height = footprint.h,
                    "opening shelf"
                );
                self.shelves.push(Shelf {
                    y: self.cursor_y,
                    height: footprint.h,
                    cursor_x: 0,
                    remaining_width: sheet_width,
                });
                self.cursor_y = self.cursor_y.saturating_add(footprint.h.saturating_add(kerf));
                self.shelves.len() - 1
            }
        };

        let shelf = &mut self.shelves[shelf_idx];
        let placement = Placement {
            piece_id: piece.id.clone(),
            material_id: piece.material_id.clone(),
            sheet_index: self.index,
            x: shelf.cursor_x,
            y: shelf.y,
            w: piece.rect.w,
            h: piece.rect.h,
            rotated,
            banding: piece.banding.clone(),
        };
        let advance = footprint.w.saturating_add(kerf);
        shelf.cursor_x = shelf.cursor_x.saturating_add(advance);
        shelf.remaining_width = shelf.remaining_width.saturating_sub(advance);

        self.placements.push(placement.clone());
        placement
    }
}

#[derive(Debug, Clone)]
pub struct ShelfPacker {
    stock: Rect,
    kerf: u32,
    sheets: Vec<Sheet>,
}

impl ShelfPacker {
    pub fn new(stock: Rect, kerf: u32) -> Self {
        Self {
            stock,
            kerf,
            sheets: Vec::new(),
        }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn into_sheets(self) -> Vec<Sheet> {
        self.sheets
    }

    // Orientation-major: every sheet is tried with the identity footprint
    // before the rotated one is tried anywhere.
    pub fn pack(&mut self, piece: &PieceInstance) -> Result<Placement, OptimizeError> {
        let candidates: Vec<(Rect, bool)> = piece
            .orientations()
            .into_iter()
            .filter(|(footprint, _)| footprint.fits_in(&self.stock))
            .collect();

        let Some(&(first_fit, first_rotated)) = candidates.first() else {
            tracing::error!(
                piece = %piece.id,
                material = %piece.material_id,
                size = %piece.rect,
                sheet = %self.stock,
                "piece exceeds sheet in every orientation"
            );
            return Err(OptimizeError::PieceTooLarge {
                material_id: piece.material_id.clone(),
                piece_id: piece.id.clone(),
                size: piece.rect,
                sheet: self.stock,
            });
        };

        for &(footprint, rotated) in &candidates {
            for sheet in self.sheets.iter_mut() {
                if let Some(slot) = sheet.find_slot(footprint, self.kerf, self.stock.h) {
                    return Ok(sheet.place(slot, piece, footprint, rotated, self.stock.w, self.kerf));
                }
            }
        }

        let mut sheet = Sheet::new(self.sheets.len() as u32 + 1);
        tracing::debug!(material = %piece.material_id, sheet = sheet.index, "opening sheet");
        let placement = sheet.place(
            Slot::NewShelf,
            piece,
            first_fit,
            first_rotated,
            self.stock.w,
            self.kerf,
        );
        self.sheets.push(sheet);
        Ok(placement)
    }
}

/// Largest side first; equal keys keep their input order.
pub fn sort_for_packing(pieces: &mut [PieceInstance]) {
    pieces.sort_by_key(|p| Reverse(p.rect.max_side()));
}

pub fn pack_material(
    stock: Rect,
    kerf: u32,
    mut pieces: Vec<PieceInstance>,
) -> Result<Vec<Sheet>, OptimizeError> {
    sort_for_packing(&mut pieces);
    let mut packer = ShelfPacker::new(stock, kerf);
    for piece in &pieces {
        packer.pack(piece)?;
    }
    Ok(packer.into_sheets())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn piece(id: &str, w: u32, h: u32, can_rotate: bool) -> PieceInstance {
        PieceInstance {
            id: id.into(),
            material_id: "mdf18".into(),
            rect: Rect::new(w, h),
            can_rotate,
            banding: "-".into(),
            note: String::new(),
        }
    }

    pub(crate) fn pieces(n: usize, w: u32, h: u32, can_rotate: bool) -> Vec<PieceInstance> {
        (1..=n).map(|i| piece(&format!("P{i}"), w, h, can_rotate)).collect()
    }

    /// Every placement inside the stock, no pair on a sheet overlapping.
    pub(crate) fn assert_sheets_valid(stock: Rect, sheets: &[Sheet], expected_pieces: usize) {
        let total: usize = sheets.iter().map(|s| s.placements.len()).sum();
        assert_eq!(total, expected_pieces, "expected {expected_pieces} placements, got {total}");

        for (si, sheet) in sheets.iter().enumerate() {
            assert_eq!(sheet.index as usize, si + 1);
            for p in &sheet.placements {
                assert_eq!(p.sheet_index, sheet.index);
                assert!(
                    p.x_end() <= stock.w && p.y_end() <= stock.h,
                    "sheet {}: {} ({}x{} @ {},{}) exceeds stock {}",
                    sheet.index, p.piece_id, p.w, p.h, p.x, p.y, stock
                );
            }
            for i in 0..sheet.placements.len() {
                for j in (i + 1)..sheet.placements.len() {
                    let (a, b) = (&sheet.placements[i], &sheet.placements[j]);
                    assert!(
                        !a.overlaps(b),
                        "sheet {}: {} @ ({},{}) overlaps {} @ ({},{})",
                        sheet.index, a.piece_id, a.x, a.y, b.piece_id, b.x, b.y
                    );
                }
            }
        }
    }

    #[test]
    fn test_single_piece_at_origin() {
        let mut packer = ShelfPacker::new(Rect::new(1220, 2440), 4);
        let p = packer.pack(&piece("A", 600, 400, true)).unwrap();
        assert_eq!((p.x, p.y, p.w, p.h, p.rotated), (0, 0, 600, 400, false));
        assert_eq!(p.sheet_index, 1);

        let sheet = &packer.sheets()[0];
        assert_eq!(sheet.cursor_y, 404);
        assert_eq!(
            sheet.shelves[0],
            Shelf {
                y: 0,
                height: 400,
                cursor_x: 604,
                remaining_width: 616,
            }
        );
    }

    #[test]
    fn test_kerf_spacing_within_shelf() {
        let mut packer = ShelfPacker::new(Rect::new(1000, 1000), 5);
        packer.pack(&piece("A", 300, 200, false)).unwrap();
        let b = packer.pack(&piece("B", 300, 200, false)).unwrap();
        assert_eq!((b.x, b.y), (305, 0));
    }

    #[test]
    fn test_new_shelf_stacks_below_with_kerf() {
        let mut packer = ShelfPacker::new(Rect::new(1000, 1000), 4);
        packer.pack(&piece("A", 1000, 300, false)).unwrap();
        let b = packer.pack(&piece("B", 400, 200, false)).unwrap();
        assert_eq!((b.x, b.y), (0, 304));
        assert_eq!(packer.sheets()[0].shelves.len(), 2);
        assert_eq!(packer.sheets()[0].cursor_y, 508);
    }

    #[test]
    fn test_shorter_piece_reuses_taller_shelf() {
        let mut packer = ShelfPacker::new(Rect::new(1000, 1000), 0);
        packer.pack(&piece("A", 400, 300, false)).unwrap();
        let b = packer.pack(&piece("B", 200, 100, false)).unwrap();
        assert_eq!((b.x, b.y), (400, 0));
        assert_eq!(packer.sheets()[0].shelves.len(), 1);
    }

    #[test]
    fn test_trailing_kerf_required_on_shelf() {
        // 2 x 500 + kerf 0 fills the width; with kerf 1 the second piece
        // needs 501 but only 499 remain.
        let mut packer = ShelfPacker::new(Rect::new(1000, 1000), 1);
        packer.pack(&piece("A", 500, 100, false)).unwrap();
        let b = packer.pack(&piece("B", 500, 100, false)).unwrap();
        assert_eq!((b.x, b.y), (0, 101));
    }

    #[test]
    fn test_rotation_before_new_sheet() {
        let stock = Rect::new(1000, 1000);
        let mut packer = ShelfPacker::new(stock, 0);
        packer.pack(&piece("A", 1000, 600, false)).unwrap();
        packer.pack(&piece("B", 1000, 600, false)).unwrap();
        // Identity 300x450 has no room anywhere; rotated 450x300 fits under A.
        let c = packer.pack(&piece("C", 300, 450, true)).unwrap();
        assert!(c.rotated);
        assert_eq!((c.sheet_index, c.x, c.y), (1, 0, 600));
        assert_eq!((c.w, c.h), (300, 450));
        assert_eq!(c.footprint(), Rect::new(450, 300));
        assert_eq!(packer.sheets().len(), 2);
    }

    #[test]
    fn test_identity_on_later_sheet_beats_rotation_on_earlier() {
        let mut packer = ShelfPacker::new(Rect::new(1000, 1000), 0);
        packer.pack(&piece("A", 1000, 700, false)).unwrap();
        packer.pack(&piece("B", 1000, 500, false)).unwrap();
        let c = packer.pack(&piece("C", 300, 400, true)).unwrap();
        assert!(!c.rotated);
        assert_eq!((c.sheet_index, c.x, c.y), (2, 0, 500));
    }

    #[test]
    fn test_locked_piece_never_rotated() {
        let stock = Rect::new(1000, 1000);
        let mut packer = ShelfPacker::new(stock, 0);
        packer.pack(&piece("A", 1000, 600, false)).unwrap();
        let c = packer.pack(&piece("C", 300, 450, false)).unwrap();
        assert!(!c.rotated);
        assert_eq!(c.sheet_index, 2);
    }

    #[test]
    fn test_earliest_sheet_reused() {
        let mut packer = ShelfPacker::new(Rect::new(1000, 1000), 0);
        packer.pack(&piece("A", 1000, 800, false)).unwrap();
        packer.pack(&piece("B", 1000, 800, false)).unwrap();
        let c = packer.pack(&piece("C", 100, 100, false)).unwrap();
        assert_eq!((c.sheet_index, c.y), (1, 800));
    }

    #[test]
    fn test_piece_too_large_non_rotatable() {
        let mut packer = ShelfPacker::new(Rect::new(1220, 2440), 4);
        let err = packer.pack(&piece("X", 1300, 500, false)).unwrap_err();
        assert_eq!(
            err,
            OptimizeError::PieceTooLarge {
                material_id: "mdf18".into(),
                piece_id: "X".into(),
                size: Rect::new(1300, 500),
                sheet: Rect::new(1220, 2440),
            }
        );
        assert!(packer.sheets().is_empty());
    }

    #[test]
    fn test_oversized_piece_fits_when_rotated() {
        let mut packer = ShelfPacker::new(Rect::new(1220, 2440), 4);
        let p = packer.pack(&piece("X", 1300, 500, true)).unwrap();
        assert!(p.rotated);
        assert_eq!((p.w, p.h), (1300, 500));
        assert_eq!(p.footprint(), Rect::new(500, 1300));
        assert_eq!(packer.sheets()[0].shelves[0].height, 1300);
    }

    #[test]
    fn test_full_sheet_piece_with_kerf() {
        let stock = Rect::new(1220, 2440);
        let sheets = pack_material(stock, 4, pieces(2, 1220, 2440, false)).unwrap();
        assert_eq!(sheets.len(), 2);
        assert_sheets_valid(stock, &sheets, 2);
    }

    #[test]
    fn test_sixteen_pieces_one_sheet() {
        let stock = Rect::new(1220, 2440);
        let sheets = pack_material(stock, 4, pieces(16, 300, 200, true)).unwrap();
        assert_eq!(sheets.len(), 1);
        assert_sheets_valid(stock, &sheets, 16);
        // Four per 1220 mm shelf: 4 x (300 + 4) = 1216.
        assert_eq!(sheets[0].shelves.len(), 4);
        assert!(sheets[0].placements.iter().all(|p| !p.rotated));
    }

    #[test]
    fn test_sort_largest_side_first_stable() {
        let mut list = vec![
            piece("small", 100, 100, true),
            piece("tall", 200, 900, true),
            piece("wide", 900, 200, true),
            piece("mid", 500, 500, true),
        ];
        sort_for_packing(&mut list);
        let ids: Vec<&str> = list.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["tall", "wide", "mid", "small"]);
    }

    #[test]
    fn test_mixed_sizes_valid() {
        let stock = Rect::new(1220, 2440);
        let mut list = Vec::new();
        let sizes = [(800, 600, true), (400, 300, true), (600, 400, false), (1200, 600, true), (300, 200, true), (500, 500, false)];
        for (i, &(w, h, rot)) in sizes.iter().enumerate() {
            for k in 0..5 {
                list.push(piece(&format!("S{i}-{k}"), w, h, rot));
            }
        }
        let sheets = pack_material(stock, 3, list).unwrap();
        assert_sheets_valid(stock, &sheets, 30);
        let area: u64 = sheets.iter().map(|s| s.used_area()).sum();
        assert!(sheets.len() as u64 >= area.div_ceil(stock.area()));
    }

    #[test]
    fn test_monotonic_sheet_count() {
        let stock = Rect::new(1000, 1000);
        let mut previous = 0;
        for n in 1..40 {
            let used = pack_material(stock, 4, pieces(n, 330, 210, true)).unwrap().len();
            assert!(used >= previous, "{n} pieces used {used} sheets, fewer than {previous}");
            previous = used;
        }
    }

    #[test]
    fn test_huge_kerf_does_not_overflow() {
        let stock = Rect::new(1220, 2440);
        let mut packer = ShelfPacker::new(stock, u32::MAX);
        let a = packer.pack(&piece("A", 600, 400, false)).unwrap();
        let b = packer.pack(&piece("B", 600, 400, false)).unwrap();
        assert_eq!((a.sheet_index, b.sheet_index), (1, 2));
        assert_eq!(packer.sheets()[0].cursor_y, u32::MAX);
    }

    #[test]
    fn test_deterministic() {
        let stock = Rect::new(1220, 2440);
        let mut list = pieces(7, 700, 350, true);
        list.extend(pieces(9, 420, 380, false));
        let a = pack_material(stock, 4, list.clone()).unwrap();
        let b = pack_material(stock, 4, list).unwrap();
        assert_eq!(a, b);
    }
}
