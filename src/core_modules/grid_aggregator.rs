// THEORY:
// The `GridAggregator` is the spatial-statistics layer. It owns the N x N grid of
// `GridCell`s for a single detection and turns the per-pixel verdicts of the
// `ColorClassifier` into per-cell evidence.
//
// Key principles:
// 1.  **Two coordinate spaces**: Statistics are gathered in WORKING resolution,
//     where each cell spans width/N x height/N pixels (real-valued, so the last
//     row and column absorb any remainder through the clamp). Emitted regions are
//     expressed in the ORIGINAL image space with an integer cell size of
//     floor(W/N) x floor(H/N).
// 2.  **Independent thresholds**: A cell becomes a fire region when its fire ratio
//     is strictly above the fire threshold, and a smoke region when its smoke ratio
//     is strictly above the smoke threshold. A cell may be both.
// 3.  **Single pass**: Global fire/smoke pixel totals are accumulated in the same
//     sweep, since the decision layer needs image-wide percentages as well as
//     regions.
// 4.  **Stateless**: Nothing survives between calls; the grid is scratch space.

use crate::config::GridConfig;
use crate::core_modules::color_classifier::classify;
use crate::core_modules::grid_cell::grid_cell::GridCell;
use crate::core_modules::pixel_sampler::WorkingImage;
use crate::core_modules::region::{Rect, Region};
use log::debug;

/// Everything a single sweep of the grid produces.
#[derive(Debug, Clone, PartialEq)]
pub struct GridAnalysis {
    /// Cells per side.
    pub grid_size: u32,
    /// Row-major cell tallies, `grid_size * grid_size` long.
    pub cells: Vec<GridCell>,
    /// Fire-like pixels across the whole working image.
    pub fire_pixels: u64,
    /// Smoke-like pixels across the whole working image.
    pub smoke_pixels: u64,
    /// Pixels sampled in the working image.
    pub total_pixels: u64,
    /// Flagged fire cells in full-resolution coordinates, row-major.
    pub fire_regions: Vec<Region>,
    /// Flagged smoke cells in full-resolution coordinates, row-major.
    pub smoke_regions: Vec<Region>,
}

impl GridAnalysis {
    pub fn cell(&self, grid_x: u32, grid_y: u32) -> Option<&GridCell> {
        if grid_x >= self.grid_size || grid_y >= self.grid_size {
            return None;
        }
        self.cells.get((grid_y * self.grid_size + grid_x) as usize)
    }
}

/// Partitions a working image into a square grid and flags concentrated cells.
#[derive(Debug, Clone)]
pub struct GridAggregator {
    grid_size: u32,
    fire_cell_ratio: f64,
    smoke_cell_ratio: f64,
}

impl GridAggregator {
    pub fn new(grid_size: u32, fire_cell_ratio: f64, smoke_cell_ratio: f64) -> Self {
        Self {
            grid_size: grid_size.max(1),
            fire_cell_ratio,
            smoke_cell_ratio,
        }
    }

    pub fn from_config(config: &GridConfig) -> Self {
        Self::new(
            config.grid_size,
            config.fire_cell_ratio,
            config.smoke_cell_ratio,
        )
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// Maps a working-space pixel to its cell, clamping to the last row/column.
    pub fn cell_of(&self, x: u32, y: u32, width: u32, height: u32) -> (u32, u32) {
        let cell_width = width as f64 / self.grid_size as f64;
        let cell_height = height as f64 / self.grid_size as f64;
        let last = self.grid_size - 1;
        let grid_x = ((x as f64 / cell_width).floor() as u32).min(last);
        let grid_y = ((y as f64 / cell_height).floor() as u32).min(last);
        (grid_x, grid_y)
    }

    /// Full-resolution cell size: floor(W / N) x floor(H / N).
    pub fn source_cell_size(&self, source_width: u32, source_height: u32) -> (u32, u32) {
        (source_width / self.grid_size, source_height / self.grid_size)
    }

    pub fn is_fire_cell(&self, cell: &GridCell) -> bool {
        cell.fire_ratio().is_some_and(|ratio| ratio > self.fire_cell_ratio)
    }

    pub fn is_smoke_cell(&self, cell: &GridCell) -> bool {
        cell.smoke_ratio().is_some_and(|ratio| ratio > self.smoke_cell_ratio)
    }

    /// Sweeps every pixel once, then extracts fire and smoke regions.
    pub fn analyze(&self, image: &WorkingImage) -> GridAnalysis {
        let n = self.grid_size;
        let mut cells: Vec<GridCell> = (0..n * n).map(|i| GridCell::new(i % n, i / n)).collect();
        let mut fire_pixels = 0u64;
        let mut smoke_pixels = 0u64;
        let mut total_pixels = 0u64;

        for (x, y, pixel) in image.pixels() {
            let (grid_x, grid_y) = self.cell_of(x, y, image.width, image.height);
            let class = classify(&pixel);
            cells[(grid_y * n + grid_x) as usize].record(class);

            total_pixels += 1;
            if class.is_fire {
                fire_pixels += 1;
            }
            if class.is_smoke {
                smoke_pixels += 1;
            }
        }

        let (fire_regions, smoke_regions) =
            self.flag_regions(&cells, image.source_width, image.source_height);

        debug!(
            "Grid sweep: {fire_pixels} fire / {smoke_pixels} smoke of {total_pixels} pixels, \
             {} fire cells, {} smoke cells",
            fire_regions.len(),
            smoke_regions.len()
        );

        GridAnalysis {
            grid_size: n,
            cells,
            fire_pixels,
            smoke_pixels,
            total_pixels,
            fire_regions,
            smoke_regions,
        }
    }

    /// Converts flagged cells into full-resolution regions, row-major.
    pub fn flag_regions(
        &self,
        cells: &[GridCell],
        source_width: u32,
        source_height: u32,
    ) -> (Vec<Region>, Vec<Region>) {
        let (cell_width, cell_height) = self.source_cell_size(source_width, source_height);
        let to_region = |cell: &GridCell| Region {
            grid_x: cell.grid_x,
            grid_y: cell.grid_y,
            rect: Rect::new(
                cell.grid_x * cell_width,
                cell.grid_y * cell_height,
                cell_width,
                cell_height,
            ),
        };

        let mut fire_regions = Vec::new();
        let mut smoke_regions = Vec::new();
        for cell in cells.iter().filter(|cell| !cell.is_empty()) {
            if self.is_fire_cell(cell) {
                fire_regions.push(to_region(cell));
            }
            if self.is_smoke_cell(cell) {
                smoke_regions.push(to_region(cell));
            }
        }
        (fire_regions, smoke_regions)
    }
}

impl Default for GridAggregator {
    fn default() -> Self {
        Self::from_config(&GridConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel_sampler::PixelSampler;

    const FIRE: [u8; 4] = [230, 150, 50, 255];
    const SMOKE: [u8; 4] = [150, 150, 150, 255];
    const DARK: [u8; 4] = [20, 20, 20, 255];

    fn image_from(width: u32, height: u32, paint: impl Fn(u32, u32) -> [u8; 4]) -> WorkingImage {
        let mut buffer = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                buffer.extend_from_slice(&paint(x, y));
            }
        }
        PixelSampler::default()
            .sample_rgba(width, height, buffer)
            .expect("Error building test image.")
    }

    #[test]
    fn maps_pixels_to_cells_with_clamping() {
        let grid = GridAggregator::default();
        assert_eq!(grid.cell_of(0, 0, 100, 100), (0, 0));
        assert_eq!(grid.cell_of(9, 9, 100, 100), (0, 0));
        assert_eq!(grid.cell_of(10, 25, 100, 100), (1, 2));
        assert_eq!(grid.cell_of(99, 99, 100, 100), (9, 9));
        // 105 / 10 = 10.5 wide cells; the last pixels stay inside the grid.
        assert_eq!(grid.cell_of(104, 104, 105, 105), (9, 9));
        // Images narrower than the grid still map inside it.
        assert_eq!(grid.cell_of(4, 0, 5, 5), (8, 0));
    }

    #[test]
    fn every_pixel_is_counted_once() {
        let grid = GridAggregator::default();
        let analysis = grid.analyze(&image_from(37, 23, |_, _| DARK));
        let total: u32 = analysis.cells.iter().map(|c| c.total_count).sum();
        assert_eq!(total, 37 * 23);
        assert_eq!(analysis.total_pixels, 37 * 23);
        assert!(analysis.cells.iter().all(|c| c.total_count >= c.fire_count));
        assert!(analysis.cells.iter().all(|c| c.total_count > 0));
    }

    #[test]
    fn flags_fire_and_smoke_cells_independently() {
        let grid = GridAggregator::default();
        // Left half of cell (0,0) is fire, right half smoke; everything else dark.
        let analysis = grid.analyze(&image_from(100, 100, |x, y| match (x, y) {
            (0..=4, 0..=9) => FIRE,
            (5..=9, 0..=9) => SMOKE,
            _ => DARK,
        }));

        assert_eq!(analysis.fire_pixels, 50);
        assert_eq!(analysis.smoke_pixels, 50);
        assert_eq!(analysis.fire_regions.len(), 1);
        assert_eq!(analysis.smoke_regions.len(), 1);
        assert_eq!(analysis.fire_regions[0].rect, Rect::new(0, 0, 10, 10));
        assert_eq!(analysis.smoke_regions[0].rect, Rect::new(0, 0, 10, 10));
        let cell = analysis.cell(0, 0).unwrap();
        assert_eq!((cell.fire_count, cell.smoke_count, cell.total_count), (50, 50, 100));
    }

    #[test]
    fn thresholds_are_strictly_greater() {
        let grid = GridAggregator::default();
        let mut cell = GridCell::new(0, 0);
        cell.total_count = 100;
        cell.fire_count = 15;
        cell.smoke_count = 20;
        assert!(!grid.is_fire_cell(&cell));
        assert!(!grid.is_smoke_cell(&cell));
        cell.fire_count = 16;
        cell.smoke_count = 21;
        assert!(grid.is_fire_cell(&cell));
        assert!(grid.is_smoke_cell(&cell));
    }

    #[test]
    fn raising_fire_count_never_unflags_a_cell() {
        let grid = GridAggregator::default();
        let mut cell = GridCell::new(0, 0);
        cell.total_count = 200;
        let mut was_flagged = false;
        for fire in 0..=200 {
            cell.fire_count = fire;
            let flagged = grid.is_fire_cell(&cell);
            assert!(flagged || !was_flagged, "unflagged at fire count {fire}");
            was_flagged = flagged;
        }
        assert!(was_flagged);
    }

    #[test]
    fn regions_use_source_resolution_cell_size() {
        let grid = GridAggregator::default();
        let mut cell = GridCell::new(3, 7);
        cell.total_count = 10;
        cell.fire_count = 10;
        let (fire, smoke) = grid.flag_regions(&[cell], 1234, 987);
        assert!(smoke.is_empty());
        assert_eq!(
            fire,
            vec![Region {
                grid_x: 3,
                grid_y: 7,
                rect: Rect::new(3 * 123, 7 * 98, 123, 98),
            }]
        );
    }

    #[test]
    fn downscaled_images_emit_full_resolution_regions() {
        let grid = GridAggregator::default();
        let mut buffer = Vec::with_capacity(1200 * 800 * 4);
        for y in 0..800u32 {
            for x in 0..1200u32 {
                let color = if x >= 1080 && y >= 720 { FIRE } else { DARK };
                buffer.extend_from_slice(&color);
            }
        }
        let working = PixelSampler::new(600).sample_rgba(1200, 800, buffer).unwrap();
        let analysis = grid.analyze(&working);
        assert_eq!(analysis.total_pixels, 600 * 400);
        assert!(
            analysis
                .fire_regions
                .iter()
                .any(|r| r.rect == Rect::new(1080, 720, 120, 80))
        );
    }
}
