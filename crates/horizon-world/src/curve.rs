/// Piecewise-linear remap from normalized height to mesh height factor.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeightCurve {
    keys: Vec<(f32, f32)>,
}

impl HeightCurve {
    /// Identity curve.
    pub fn linear() -> Self {
        Self {
            keys: vec![(0.0, 0.0), (1.0, 1.0)],
        }
    }

    /// Keys are sorted by input; non-finite keys are dropped.
    pub fn from_keys(keys: impl IntoIterator<Item = (f32, f32)>) -> Self {
        let mut keys: Vec<(f32, f32)> = keys
            .into_iter()
            .filter(|(t, v)| t.is_finite() && v.is_finite())
            .collect();
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    pub fn keys(&self) -> &[(f32, f32)] {
        &self.keys
    }

    /// Evaluates the curve, holding the end values outside the key range.
    /// A curve without keys passes values through unchanged.
    pub fn evaluate(&self, t: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(f), Some(l)) => (*f, *l),
            _ => return t,
        };
        if t <= first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }
        for w in self.keys.windows(2) {
            let (a, b) = (w[0], w[1]);
            if t <= b.0 {
                let span = b.0 - a.0;
                if span <= 0.0 {
                    return b.1;
                }
                return a.1 + (b.1 - a.1) * ((t - a.0) / span);
            }
        }
        last.1
    }
}
