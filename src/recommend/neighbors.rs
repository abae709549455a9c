use super::features::FeatureRow;

/// Closest stored point for a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f64,
}

/// Brute-force 1-nearest-neighbor index under Euclidean distance
#[derive(Debug, Clone)]
pub struct NearestNeighbors {
    points: Vec<FeatureRow>,
}

impl NearestNeighbors {
    pub fn new(points: Vec<FeatureRow>) -> Self {
        Self { points }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Nearest stored point; ties resolve to the lowest index
    pub fn nearest(&self, query: &FeatureRow) -> Option<Neighbor> {
        let mut best: Option<Neighbor> = None;
        for (index, point) in self.points.iter().enumerate() {
            let distance = euclidean(point, query);
            if best.is_none_or(|b| is_closer(distance, b.distance)) {
                best = Some(Neighbor { index, distance });
            }
        }
        best
    }
}

/// Strictly smaller distance. NaN is never closer than anything, and any
/// number is closer than NaN.
pub fn is_closer(distance: f64, than: f64) -> bool {
    !distance.is_nan() && (than.is_nan() || distance < than)
}

pub fn euclidean(a: &FeatureRow, b: &FeatureRow) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_euclidean_distance() {
        let mut a = [0.0; 9];
        let mut b = [0.0; 9];
        a[0] = 3.0;
        b[1] = 4.0;
        assert_relative_eq!(euclidean(&a, &b), 5.0);
        assert_relative_eq!(euclidean(&a, &a), 0.0);
    }

    #[test]
    fn test_nearest_picks_closest_point() {
        let index = NearestNeighbors::new(vec![[0.0; 9], [1.0; 9], [0.4; 9]]);
        let hit = index.nearest(&[0.9; 9]).unwrap();

        assert_eq!(hit.index, 1);
        assert_relative_eq!(hit.distance, (9.0_f64 * 0.01).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_ties_resolve_to_first_point() {
        let index = NearestNeighbors::new(vec![[1.0; 9], [1.0; 9]]);
        assert_eq!(index.nearest(&[1.0; 9]).unwrap().index, 0);
    }

    #[test]
    fn test_nan_point_never_wins() {
        let mut broken = [0.5; 9];
        broken[0] = f64::NAN;
        let index = NearestNeighbors::new(vec![broken, [0.9; 9], [0.5; 9]]);

        let hit = index.nearest(&[0.5; 9]).unwrap();
        assert_eq!(hit.index, 2);
        assert_relative_eq!(hit.distance, 0.0);
    }

    #[test]
    fn test_is_closer_orders_nan_last() {
        assert!(is_closer(1.0, 2.0));
        assert!(!is_closer(2.0, 2.0));
        assert!(is_closer(5.0, f64::NAN));
        assert!(!is_closer(f64::NAN, 5.0));
        assert!(!is_closer(f64::NAN, f64::NAN));
    }

    #[test]
    fn test_empty_index_has_no_neighbor() {
        assert!(NearestNeighbors::new(Vec::new()).nearest(&[0.0; 9]).is_none());
    }
}
