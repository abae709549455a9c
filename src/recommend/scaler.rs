use super::features::{FEATURE_COUNT, FeatureRow};

/// Per-column min-max scaling fitted on a reference set of rows
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    min: FeatureRow,
    max: FeatureRow,
}

impl MinMaxScaler {
    /// Fit column minima and maxima. Returns `None` for an empty set.
    pub fn fit(rows: &[FeatureRow]) -> Option<Self> {
        let first = rows.first()?;
        let mut min = *first;
        let mut max = *first;

        for row in &rows[1..] {
            for c in 0..FEATURE_COUNT {
                min[c] = min[c].min(row[c]);
                max[c] = max[c].max(row[c]);
            }
        }

        Some(Self { min, max })
    }

    /// Scale a row with the fitted parameters.
    ///
    /// Values outside the fitted range extrapolate beyond [0, 1]. A column
    /// whose fitted min equals its max always scales to 0.
    pub fn transform(&self, row: &FeatureRow) -> FeatureRow {
        let mut scaled = [0.0; FEATURE_COUNT];
        for c in 0..FEATURE_COUNT {
            let range = self.max[c] - self.min[c];
            scaled[c] = if range == 0.0 {
                0.0
            } else {
                (row[c] - self.min[c]) / range
            };
        }
        scaled
    }

    pub fn min(&self) -> &FeatureRow {
        &self.min
    }

    pub fn max(&self) -> &FeatureRow {
        &self.max
    }
}
