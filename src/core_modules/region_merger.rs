// THEORY:
// The `RegionMerger` reduces the flagged cells of one class into rectangles.
//
// Two policies are available:
// 1.  **Envelope** (default): a single axis-aligned rectangle spanning every
//     flagged region, min/max over all edges. This is deliberately coarse: two
//     fires in opposite corners come back as one box covering the whole frame.
// 2.  **Connected components**: a breadth-first flood fill over 4-neighbour grid
//     adjacency, emitting one envelope per cluster. Clusters are ordered by their
//     first cell in row-major order so the output is stable.
//
// Both are stateless and take regions for a single class only.

use crate::config::MergePolicy;
use crate::core_modules::region::{Rect, Region};
use std::collections::{HashMap, HashSet, VecDeque};

pub fn merge_regions(regions: &[Region], policy: MergePolicy) -> Vec<Rect> {
    match policy {
        MergePolicy::Envelope => envelope(regions.iter().map(|r| r.rect)).into_iter().collect(),
        MergePolicy::ConnectedComponents => connected_components(regions),
    }
}

/// The min/max envelope of all rectangles, or `None` when there are none.
pub fn envelope(rects: impl IntoIterator<Item = Rect>) -> Option<Rect> {
    rects
        .into_iter()
        .map(|r| (r.x, r.y, r.right(), r.bottom()))
        .reduce(|(ax0, ay0, ax1, ay1), (bx0, by0, bx1, by1)| {
            (ax0.min(bx0), ay0.min(by0), ax1.max(bx1), ay1.max(by1))
        })
        .map(|(x0, y0, x1, y1)| Rect::new(x0, y0, x1 - x0, y1 - y0))
}

/// One envelope per 4-connected cluster of flagged cells.
pub fn connected_components(regions: &[Region]) -> Vec<Rect> {
    let mut ordered: Vec<&Region> = regions.iter().collect();
    ordered.sort_by_key(|r| (r.grid_y, r.grid_x));

    let by_cell: HashMap<(u32, u32), &Region> =
        ordered.iter().map(|r| ((r.grid_x, r.grid_y), *r)).collect();
    let mut visited: HashSet<(u32, u32)> = HashSet::with_capacity(by_cell.len());
    let mut clusters = Vec::new();

    for seed in ordered {
        let start = (seed.grid_x, seed.grid_y);
        if !visited.insert(start) {
            continue;
        }

        let mut members = Vec::new();
        let mut queue = VecDeque::from([start]);
        while let Some((x, y)) = queue.pop_front() {
            members.push(by_cell[&(x, y)].rect);

            let neighbours = [
                x.checked_sub(1).map(|nx| (nx, y)),
                Some((x + 1, y)),
                y.checked_sub(1).map(|ny| (x, ny)),
                Some((x, y + 1)),
            ];
            for cell in neighbours.into_iter().flatten() {
                if by_cell.contains_key(&cell) && visited.insert(cell) {
                    queue.push_back(cell);
                }
            }
        }

        clusters.extend(envelope(members));
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(grid_x: u32, grid_y: u32) -> Region {
        Region {
            grid_x,
            grid_y,
            rect: Rect::new(grid_x * 50, grid_y * 40, 50, 40),
        }
    }

    #[test]
    fn empty_input_produces_no_boxes() {
        assert!(merge_regions(&[], MergePolicy::Envelope).is_empty());
        assert!(merge_regions(&[], MergePolicy::ConnectedComponents).is_empty());
    }

    #[test]
    fn envelope_spans_every_region() {
        let merged = merge_regions(&[cell(2, 3), cell(7, 1), cell(4, 8)], MergePolicy::Envelope);
        assert_eq!(merged, vec![Rect::new(100, 40, 300, 320)]);
    }

    #[test]
    fn envelope_of_single_region_is_the_region() {
        let merged = merge_regions(&[cell(5, 5)], MergePolicy::Envelope);
        assert_eq!(merged, vec![cell(5, 5).rect]);
    }

    #[test]
    fn envelope_is_idempotent() {
        let once = merge_regions(&[cell(0, 0), cell(9, 9)], MergePolicy::Envelope);
        let twice = envelope(once.iter().copied().chain(once.iter().copied()));
        assert_eq!(twice, Some(once[0]));
    }

    #[test]
    fn components_split_disjoint_clusters() {
        let regions = [cell(8, 8), cell(0, 0), cell(1, 0), cell(9, 8), cell(0, 1)];
        let merged = merge_regions(&regions, MergePolicy::ConnectedComponents);
        assert_eq!(
            merged,
            vec![Rect::new(0, 0, 100, 80), Rect::new(400, 320, 100, 40)]
        );
    }

    #[test]
    fn diagonal_neighbours_are_separate_components() {
        let merged = merge_regions(&[cell(0, 0), cell(1, 1)], MergePolicy::ConnectedComponents);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn single_cluster_matches_envelope() {
        let regions = [cell(3, 3), cell(4, 3), cell(4, 4), cell(5, 4)];
        assert_eq!(
            merge_regions(&regions, MergePolicy::ConnectedComponents),
            merge_regions(&regions, MergePolicy::Envelope)
        );
    }
}
