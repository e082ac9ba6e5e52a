//! Finding interacting members instead of producing geometry.

use std::collections::BTreeSet;

use crate::evaluator::{Evaluator, Windings};

/// Which pairs an [`InteractionDetector`] reports.
///
/// In the `Inside` and `Outside` modes, members with ids up to and including
/// `background` form the background; the others are probed against it and
/// pairs come out as `(background member, probed member)`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum InteractionMode {
    /// Members whose closed areas share at least a point.
    Touching,
    /// Members sharing some positive area.
    Overlapping,
    /// Members overlapping a background member and lying completely inside the background.
    Inside {
        /// The largest background id.
        background: u32,
    },
    /// Members touching a background member but not lying completely inside the background.
    Outside {
        /// The largest background id.
        background: u32,
    },
}

/// An evaluator collecting pairs of interacting members (tags).
#[derive(Clone, Debug)]
pub struct InteractionDetector {
    mode: InteractionMode,
    pairs: BTreeSet<(u32, u32)>,
    candidates: BTreeSet<(u32, u32)>,
    // Probed members with some area outside of the background.
    outside: BTreeSet<u32>,
}

impl InteractionDetector {
    /// Creates a detector.
    pub fn new(mode: InteractionMode) -> Self {
        InteractionDetector {
            mode,
            pairs: BTreeSet::new(),
            candidates: BTreeSet::new(),
            outside: BTreeSet::new(),
        }
    }

    /// The mode this detector was created with.
    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    /// The pairs found by the last pass, sorted.
    pub fn pairs(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.pairs.iter().copied()
    }

    /// Takes the pairs found by the last pass, sorted.
    pub fn into_pairs(self) -> Vec<(u32, u32)> {
        self.pairs.into_iter().collect()
    }

    fn all_pairs(&mut self, tags: &[u32]) {
        for (i, &a) in tags.iter().enumerate() {
            for &b in &tags[i + 1..] {
                self.pairs.insert((a.min(b), a.max(b)));
            }
        }
    }

    fn background_pairs(&mut self, tags: &[u32], background: u32) {
        for &b in tags.iter().filter(|&&t| t <= background) {
            for &p in tags.iter().filter(|&&t| t > background) {
                self.candidates.insert((b, p));
            }
        }
    }
}

impl Evaluator for InteractionDetector {
    fn reset(&mut self) {
        self.pairs.clear();
        self.candidates.clear();
        self.outside.clear();
    }

    fn is_inside(&self, _windings: &Windings) -> bool {
        false
    }

    fn emits_region(&self) -> bool {
        false
    }

    fn wants_contacts(&self) -> bool {
        true
    }

    fn contact(&mut self, tags: &[u32]) {
        match self.mode {
            InteractionMode::Touching => self.all_pairs(tags),
            InteractionMode::Outside { background } => self.background_pairs(tags, background),
            InteractionMode::Overlapping | InteractionMode::Inside { .. } => {}
        }
    }

    fn area(&mut self, windings: &Windings) {
        let tags: Vec<u32> = windings.covered().collect();
        match self.mode {
            InteractionMode::Touching | InteractionMode::Overlapping => self.all_pairs(&tags),
            InteractionMode::Inside { background } | InteractionMode::Outside { background } => {
                self.background_pairs(&tags, background);
                if tags.iter().all(|&t| t > background) {
                    self.outside.extend(tags);
                }
            }
        }
    }

    fn finish(&mut self) {
        let keep_outside = match self.mode {
            InteractionMode::Inside { .. } => false,
            InteractionMode::Outside { .. } => true,
            InteractionMode::Touching | InteractionMode::Overlapping => return,
        };
        let outside = &self.outside;
        self.pairs = std::mem::take(&mut self.candidates)
            .into_iter()
            .filter(|(_, p)| outside.contains(p) == keep_outside)
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EdgeProcessor, Polygon, Rect};

    fn boxes(rects: &[(i32, i32, i32, i32)]) -> Vec<Polygon> {
        rects
            .iter()
            .map(|&(l, b, r, t)| Polygon::from_rect(Rect::new(l, b, r, t)))
            .collect()
    }

    #[test]
    fn touching_and_overlapping() {
        let polys = boxes(&[(0, 0, 10, 10), (10, 0, 20, 10), (30, 0, 40, 10), (5, 5, 15, 15)]);
        let mut ep = EdgeProcessor::new();
        assert_eq!(
            ep.interactions(&polys, InteractionMode::Touching),
            vec![(0, 1), (0, 3), (1, 3)]
        );
        assert_eq!(
            ep.interactions(&polys, InteractionMode::Overlapping),
            vec![(0, 3), (1, 3)]
        );
    }

    #[test]
    fn corners_touch() {
        let polys = boxes(&[(0, 0, 10, 10), (10, 10, 20, 20), (21, 0, 30, 9)]);
        let mut ep = EdgeProcessor::new();
        assert_eq!(ep.interactions(&polys, InteractionMode::Touching), vec![(0, 1)]);
        assert!(ep.interactions(&polys, InteractionMode::Overlapping).is_empty());
    }

    #[test]
    fn background() {
        let polys = boxes(&[
            (0, 0, 100, 100),
            (10, 10, 20, 20),
            (90, 90, 110, 110),
            (200, 200, 210, 210),
            (100, 0, 120, 10),
        ]);
        let mut ep = EdgeProcessor::new();
        assert_eq!(
            ep.interactions(&polys, InteractionMode::Inside { background: 0 }),
            vec![(0, 1)]
        );
        // The last box only touches the background, which is enough here.
        assert_eq!(
            ep.interactions(&polys, InteractionMode::Outside { background: 0 }),
            vec![(0, 2), (0, 4)]
        );
    }

    #[test]
    fn several_background_members() {
        // Two background halves; the probe straddles their common edge.
        let polys = boxes(&[(0, 0, 50, 100), (50, 0, 100, 100), (40, 40, 60, 60)]);
        let mut ep = EdgeProcessor::new();
        assert_eq!(
            ep.interactions(&polys, InteractionMode::Inside { background: 1 }),
            vec![(0, 2), (1, 2)]
        );
        assert!(ep
            .interactions(&polys, InteractionMode::Outside { background: 1 })
            .is_empty());
    }
}
