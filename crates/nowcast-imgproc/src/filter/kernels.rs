/// Create a gaussian blur kernel.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel.
/// * `sigma` - The sigma of the gaussian kernel.
///
/// # Returns
///
/// A normalized vector of the kernel.
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f32) -> Vec<f32> {
    let mut kernel = Vec::with_capacity(kernel_size);

    let mean = (kernel_size - 1) as f32 / 2.0;
    let sigma_sq = sigma * sigma;

    // compute the kernel
    for i in 0..kernel_size {
        let x = i as f32 - mean;
        kernel.push((-(x * x) / (2.0 * sigma_sq)).exp());
    }

    // normalize the kernel
    let norm = kernel.iter().sum::<f32>();
    kernel.iter_mut().for_each(|k| *k /= norm);
    kernel
}

/// Kernel size covering `truncate` standard deviations on each side.
///
/// The radius is `round(truncate * sigma)`, clipped to `max_radius`. The size is
/// always odd and at least one.
pub fn gaussian_kernel_size(sigma: f32, truncate: f32, max_radius: usize) -> usize {
    let radius = (truncate * sigma + 0.5).floor().max(0.0);
    let radius = if radius < max_radius as f32 {
        radius as usize
    } else {
        max_radius
    };
    2 * radius + 1
}

/// The 5-tap binomial kernel `[1, 4, 6, 4, 1] / 16` used between pyramid levels.
pub fn pyramid_kernel_1d() -> Vec<f32> {
    [1.0, 4.0, 6.0, 4.0, 1.0]
        .iter()
        .map(|&x| x / 16.0)
        .collect()
}

/// Central difference kernel `[-0.5, 0, 0.5]` and its identity counterpart.
pub fn central_difference_kernel_1d() -> (Vec<f32>, Vec<f32>) {
    (vec![-0.5, 0.0, 0.5], vec![0.0, 1.0, 0.0])
}
