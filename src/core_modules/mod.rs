pub mod auxiliary;
pub mod color_classifier;
pub mod detection_decider;
pub mod grid_aggregator;
pub mod grid_cell;
pub mod pixel;
pub mod pixel_sampler;
pub mod region;
pub mod region_merger;
pub mod utils;
