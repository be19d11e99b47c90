/// Evenly spaced samples over a closed interval, endpoints included.
///
/// Values are computed as `start + step * i` (the way `numpy.linspace` does), so
/// the same `(min, max, n)` always yields bit-identical grids.
#[derive(Clone, Debug)]
pub struct Linspace {
    start: f64,
    end: f64,
    step: f64,
    index: usize,
    len: usize,
}

impl Linspace {
    pub fn new(min: f64, max: f64, n: usize) -> Self {
        let step = if n > 1 {
            let num_steps = (n - 1) as f64;
            (max - min) / num_steps
        } else {
            0.
        };
        Linspace {
            start: min,
            end: max,
            step,
            index: 0,
            len: n,
        }
    }
}

impl Iterator for Linspace {
    type Item = f64;

    #[inline]
    fn next(&mut self) -> Option<f64> {
        if self.index >= self.len {
            None
        } else {
            let i = self.index;
            self.index += 1;
            // Pin the last sample so the grid closes exactly on the upper bound
            if i + 1 == self.len && self.len > 1 {
                Some(self.end)
            } else {
                Some(self.start + self.step * i as f64)
            }
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.len - self.index;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Linspace {}

#[test]
fn test_linspace_endpoints() {
    let grid: Vec<_> = Linspace::new(0., 1., 5).collect();

    assert_eq!(grid, vec![0., 0.25, 0.5, 0.75, 1.]);
    assert_eq!(Linspace::new(2., 3., 1).collect::<Vec<_>>(), vec![2.]);
    assert_eq!(Linspace::new(2., 3., 0).count(), 0);
}

#[test]
fn test_linspace_closes_on_upper_bound() {
    let last = Linspace::new(0.1, 0.7, 7).last();

    assert_eq!(last, Some(0.7));
}
