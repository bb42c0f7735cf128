#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodSpec {
    pub level: u32,
    pub visible_distance: f32,
}

/// Distance buckets ordered by `visible_distance`. The last bucket is the
/// catch-all and its distance bounds streaming.
#[derive(Clone, Debug, PartialEq)]
pub struct LodTable {
    specs: Vec<LodSpec>,
}

impl Default for LodTable {
    fn default() -> Self {
        Self::new(vec![
            LodSpec {
                level: 0,
                visible_distance: 200.0,
            },
            LodSpec {
                level: 1,
                visible_distance: 400.0,
            },
            LodSpec {
                level: 4,
                visible_distance: 600.0,
            },
        ])
    }
}

impl LodTable {
    /// Sorts by distance; non-finite distances are dropped.
    pub fn new(mut specs: Vec<LodSpec>) -> Self {
        specs.retain(|s| s.visible_distance.is_finite());
        specs.sort_by(|a, b| a.visible_distance.total_cmp(&b.visible_distance));
        Self { specs }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    #[inline]
    pub fn specs(&self) -> &[LodSpec] {
        &self.specs
    }

    pub fn max_view_distance(&self) -> f32 {
        self.specs.last().map(|s| s.visible_distance).unwrap_or(0.0)
    }

    /// Level of the first bucket whose distance exceeds `d`, else the last bucket.
    pub fn lod_for_distance(&self, d: f32) -> u32 {
        self.specs
            .iter()
            .find(|s| s.visible_distance > d)
            .or(self.specs.last())
            .map(|s| s.level)
            .unwrap_or(0)
    }
}
