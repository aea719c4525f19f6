use crate::shelf::Sheet;
use crate::types::Rect;

const MAX_WIDTH: f64 = 80.0;
const MAX_HEIGHT: f64 = 40.0;

/// Scaled ASCII drawing of one sheet. Offcuts are shaded with `.`, pieces
/// are outlined and labelled with their id.
pub fn render_sheet(stock: Rect, sheet: &Sheet) -> String {
    let scale = f64::min(MAX_WIDTH / stock.w as f64, MAX_HEIGHT / stock.h as f64);
    let grid_w = (stock.w as f64 * scale).round() as usize;
    let grid_h = (stock.h as f64 * scale).round() as usize;

    if grid_w == 0 || grid_h == 0 {
        return String::new();
    }

    let mut grid = vec![vec![' '; grid_w + 1]; grid_h + 1];
    let to_grid = |v: u32| (v as f64 * scale).round() as usize;

    for o in &sheet.offcuts {
        let (sx, sy) = (to_grid(o.x), to_grid(o.y));
        let (ex, ey) = (to_grid(o.x + o.w).min(grid_w), to_grid(o.y + o.h).min(grid_h));
        for row in grid.iter_mut().take(ey).skip(sy + 1) {
            for cell in row.iter_mut().take(ex).skip(sx + 1) {
                *cell = '.';
            }
        }
    }

    draw_rect(&mut grid, 0, 0, grid_w, grid_h);

    for p in &sheet.placements {
        let (sx, sy) = (to_grid(p.x), to_grid(p.y));
        let footprint = p.footprint();
        let (sw, sh) = (to_grid(footprint.w), to_grid(footprint.h));
        if sw == 0 || sh == 0 {
            continue;
        }

        draw_rect(&mut grid, sx, sy, sw, sh);

        let label: Vec<char> = p.piece_id.chars().collect();
        if sw > 2 && sh > 1 {
            let cy = sy + sh / 2;
            let start_x = (sx + sw / 2).saturating_sub(label.len() / 2);
            for (i, &ch) in label.iter().enumerate() {
                let x = start_x + i;
                if x > sx && x < sx + sw && cy < grid.len() && x < grid[cy].len() {
                    grid[cy][x] = ch;
                }
            }
        }
    }

    let mut result = String::new();
    for row in &grid {
        let line: String = row.iter().collect();
        result.push_str(line.trim_end());
        result.push('\n');
    }
    result
}

fn mark(cell: &mut char, edge: char) {
    *cell = match (*cell, edge) {
        ('+', _) => '+',
        ('|', '-') | ('-', '|') => '+',
        _ => edge,
    };
}

fn draw_rect(grid: &mut [Vec<char>], x: usize, y: usize, w: usize, h: usize) {
    let rows = grid.len();
    let Some(cols) = grid.first().map(|r| r.len()) else {
        return;
    };

    for i in x..=(x + w).min(cols - 1) {
        for j in [y, y + h] {
            if j < rows {
                mark(&mut grid[j][i], '-');
            }
        }
    }
    for j in y..=(y + h).min(rows - 1) {
        for i in [x, x + w] {
            if i < cols {
                mark(&mut grid[j][i], '|');
            }
        }
    }
    for cx in [x, x + w] {
        for cy in [y, y + h] {
            if cy < rows && cx < cols {
                grid[cy][cx] = '+';
            }
        }
    }
}
