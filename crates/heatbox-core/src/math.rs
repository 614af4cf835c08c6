//! Shared math utilities.

/// L2-normalize a vector in place so its magnitude is 1.
///
/// Vectors whose norm is at or below `f32::EPSILON` become the zero vector.
pub fn l2_normalize_in_place(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    } else {
        v.fill(0.0);
    }
}

/// L2-normalize every row of a matrix in place.
pub fn l2_normalize_rows(m: &mut ndarray::Array2<f32>) {
    for mut row in m.rows_mut() {
        if let Some(slice) = row.as_slice_mut() {
            l2_normalize_in_place(slice);
        } else {
            let mut owned = row.to_vec();
            l2_normalize_in_place(&mut owned);
            row.assign(&ndarray::ArrayView1::from(&owned));
        }
    }
}
