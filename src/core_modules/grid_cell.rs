// THEORY:
// A `GridCell` is the unit of regional analysis. Instead of reasoning about
// hundreds of thousands of individual pixels, the detector pools them into a
// fixed N x N grid and keeps three counters per cell. Pooling filters out
// isolated warm or gray pixels: a cell only becomes a region when a meaningful
// share of its pixels agree.
//
// Like `Pixel`, a `GridCell` is a "dumb" container. It knows how to count and how
// to express its counts as ratios, but not which ratio makes it interesting.
// That decision belongs to the `GridAggregator`.

pub mod grid_cell {
    use crate::core_modules::color_classifier::PixelClass;

    pub type Count = u32;
    pub type Ratio = f64;

    /// Per-cell tallies for one detection pass.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct GridCell {
        /// Column index of this cell in the grid.
        pub grid_x: u32,
        /// Row index of this cell in the grid.
        pub grid_y: u32,
        /// Pixels classified as fire-like.
        pub fire_count: Count,
        /// Pixels classified as smoke-like.
        pub smoke_count: Count,
        /// Pixels sampled in this cell. Never smaller than either class count.
        pub total_count: Count,
    }

    impl GridCell {
        pub fn new(grid_x: u32, grid_y: u32) -> Self {
            Self {
                grid_x,
                grid_y,
                ..Default::default()
            }
        }

        pub fn record(&mut self, class: PixelClass) {
            self.total_count += 1;
            if class.is_fire {
                self.fire_count += 1;
            }
            if class.is_smoke {
                self.smoke_count += 1;
            }
        }

        pub fn is_empty(&self) -> bool {
            self.total_count == 0
        }

        /// Share of fire-like pixels, or `None` for a cell no pixel fell into.
        pub fn fire_ratio(&self) -> Option<Ratio> {
            self.ratio(self.fire_count)
        }

        /// Share of smoke-like pixels, or `None` for a cell no pixel fell into.
        pub fn smoke_ratio(&self) -> Option<Ratio> {
            self.ratio(self.smoke_count)
        }

        fn ratio(&self, count: Count) -> Option<Ratio> {
            (!self.is_empty()).then(|| count as Ratio / self.total_count as Ratio)
        }
    }
}
