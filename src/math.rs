use num::Float;

/// Similar to numpy.interp, for a single abscissa.
///
/// `coords` must be sorted by x. Outside the covered range the first/last
/// ordinate is held. Zero-width segments are skipped, so a step takes the
/// value approached from the left.
pub(crate) fn interp_one<F: Float>(x: F, coords: &[(F, F)]) -> F {
    let Some(&(x_first, y_first)) = coords.first() else {
        return F::zero();
    };

    if x < x_first {
        return y_first;
    }

    for window in coords.windows(2) {
        let (x1, y1) = window[0];
        let (x2, y2) = window[1];

        if x2 == x1 {
            continue;
        }

        if x1 <= x && x <= x2 {
            return y1 + (x - x1) * (y2 - y1) / (x2 - x1);
        }
    }

    coords[coords.len() - 1].1
}

/// Similar to numpy.interp
pub(crate) fn interp<F: Float>(x_input: &[F], coords: &[(F, F)]) -> Vec<F> {
    x_input.iter().map(|&x| interp_one(x, coords)).collect()
}

#[test]
fn test_interp() {
    let x = [0., 1., 1.5, 2.72, 3.24];
    let coords = [(1., 3.), (2., 2.), (3., 0.)];

    assert_eq!(interp(&x, &coords), vec![3., 3., 2.5, 0.5599999999999996, 0.]);

    let x = [2.5, -1., 7.5];
    let coords = [(0., 0.), (1., 2.), (2., 5.), (3., 3.), (4.5, 2.)];

    assert_eq!(interp(&x, &coords), vec![4., 0., 2.]);
}

#[test]
fn test_interp_step() {
    let coords = [(0., 0.), (1., 0.), (1., 1.), (2., 1.)];

    assert_eq!(interp(&[0.5, 1., 1.5], &coords), vec![0., 0., 1.]);
    assert_eq!(interp_one(3., &[] as &[(f64, f64)]), 0.);
}
