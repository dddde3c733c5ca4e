use crate::types::AggregatedPoint;

/// Thin a series to at most `target_points` to keep charts readable and fast.
///
/// Each chunk of consecutive points is represented by its last point. The
/// values are already rolling sums, so they are picked rather than added up.
pub fn downsample(data: &[AggregatedPoint], target_points: usize) -> Vec<AggregatedPoint> {
    if target_points == 0 || data.len() <= target_points {
        return data.to_vec();
    }

    let window_size = (data.len() as f64 / target_points as f64).ceil() as usize;
    data.chunks(window_size)
        .filter_map(|chunk| chunk.last().cloned())
        .collect()
}
