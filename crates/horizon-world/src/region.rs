use horizon_noise::HeightField;

pub type Rgba = [u8; 4];

#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub name: String,
    pub height: f32,
    pub color: Rgba,
}

/// Ordered height bands. Callers supply thresholds in ascending order;
/// a descending table yields unspecified (but non-fatal) band picks.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionTable {
    regions: Vec<Region>,
    fallback: Rgba,
}

impl RegionTable {
    pub fn new(regions: Vec<Region>, fallback: Rgba) -> Self {
        Self { regions, fallback }
    }

    #[inline]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Color used for samples below every threshold.
    #[inline]
    pub fn fallback(&self) -> Rgba {
        self.fallback
    }

    pub fn is_ascending(&self) -> bool {
        self.regions.windows(2).all(|w| w[0].height <= w[1].height)
    }

    /// Index of the last band whose threshold is `<= h`, scanning in order and
    /// stopping at the first band above `h`.
    pub fn classify(&self, h: f32) -> Option<usize> {
        let mut pick = None;
        for (i, r) in self.regions.iter().enumerate() {
            if h >= r.height {
                pick = Some(i);
            } else {
                break;
            }
        }
        pick
    }

    #[inline]
    pub fn color_of(&self, band: Option<usize>) -> Rgba {
        band.map(|i| self.regions[i].color).unwrap_or(self.fallback)
    }

    pub fn name_of(&self, band: Option<usize>) -> Option<&str> {
        band.map(|i| self.regions[i].name.as_str())
    }
}

/// Per-sample band assignment for the renderable (non-border) area of a chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorField {
    size: usize,
    bands: Vec<Option<usize>>,
    colors: Vec<Rgba>,
}

impl ColorField {
    /// Classifies the interior of a bordered height field, dropping `border` samples on each side.
    pub fn classify(heights: &HeightField, border: usize, table: &RegionTable) -> Self {
        let size = heights.width().saturating_sub(2 * border);
        let mut bands = Vec::with_capacity(size * size);
        let mut colors = Vec::with_capacity(size * size);
        for y in 0..size {
            for x in 0..size {
                let band = table.classify(heights.get(x + border, y + border));
                bands.push(band);
                colors.push(table.color_of(band));
            }
        }
        Self {
            size,
            bands,
            colors,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn band(&self, x: usize, y: usize) -> Option<usize> {
        self.bands[y * self.size + x]
    }

    #[inline]
    pub fn color(&self, x: usize, y: usize) -> Rgba {
        self.colors[y * self.size + x]
    }

    #[inline]
    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }
}
