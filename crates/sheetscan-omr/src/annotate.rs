//! Annotated canonical preview for auditing.

use sheetscan_core::RgbImage;

use crate::classify::DetectionMatrix;
use crate::config::VisualizationConfig;
use crate::decode::{Answer, DecodedAnswer};
use crate::grid::SheetGrid;

fn draw_filled_disk(img: &mut RgbImage, cx: i32, cy: i32, r: i32, color: [u8; 3]) {
    let (w, h) = (img.width as i32, img.height as i32);
    let y0 = (cy - r).max(0);
    let y1 = (cy + r + 1).min(h);
    let x0 = (cx - r).max(0);
    let x1 = (cx + r + 1).min(w);
    for y in y0..y1 {
        for x in x0..x1 {
            let (dx, dy) = (x - cx, y - cy);
            if dx * dx + dy * dy <= r * r {
                img.put_pixel(x as usize, y as usize, color);
            }
        }
    }
}

/// Paint every retained mark on a copy of the canonical color frame.
///
/// Marks are colored by density band so a reviewer can spot borderline
/// fills at a glance; ambiguous questions get every filled candidate painted
/// in the error color.
pub fn annotate(
    canonical: &RgbImage,
    grid: &SheetGrid,
    matrix: &DetectionMatrix,
    decoded: &[DecodedAnswer],
    vis: &VisualizationConfig,
) -> RgbImage {
    let mut img = canonical.clone();
    let r = grid.radius - 2;

    for q in decoded {
        match q.answer {
            Answer::A | Answer::B | Answer::C | Answer::D => {
                let Some(col) = q.retained else { continue };
                let density = matrix.get(q.row, col).density;
                let color = if density >= vis.threshold_high_density {
                    vis.color_high
                } else if density >= vis.threshold_medium_density {
                    vis.color_medium
                } else {
                    vis.color_low
                };
                draw_filled_disk(&mut img, grid.columns[col], grid.rows[q.row], r, color);
            }
            Answer::Ambiguous => {
                for &col in &q.filled {
                    draw_filled_disk(
                        &mut img,
                        grid.columns[col],
                        grid.rows[q.row],
                        r,
                        vis.color_error,
                    );
                }
            }
            Answer::Blank => {}
        }
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::BubbleReading;

    fn tiny_grid() -> SheetGrid {
        let mut columns = [0i32; 32];
        for (i, c) in columns.iter_mut().enumerate() {
            *c = 20 + 30 * i as i32;
        }
        let mut rows = [0i32; 25];
        for (i, r) in rows.iter_mut().enumerate() {
            *r = 20 + 30 * i as i32;
        }
        SheetGrid {
            columns,
            rows,
            radius: 10,
        }
    }

    #[test]
    fn retained_mark_is_painted_in_band_color() {
        let grid = tiny_grid();
        let canonical = RgbImage::new(1000, 800);
        let mut cells = vec![
            BubbleReading {
                filled: false,
                density: 0.0
            };
            25 * 32
        ];
        cells[0] = BubbleReading {
            filled: true,
            density: 0.9,
        };
        let matrix = DetectionMatrix::from_cells(25, 32, cells);
        let decoded = crate::decode::decode(&matrix).expect("decode");

        let vis = VisualizationConfig::default();
        let out = annotate(&canonical, &grid, &matrix, &decoded, &vis);
        assert_eq!(out.pixel(20, 20), vis.color_high);
        // An unmarked bubble stays untouched.
        assert_eq!(out.pixel(50, 20), [0, 0, 0]);
    }
}
