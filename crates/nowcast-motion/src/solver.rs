use log::debug;

use nowcast_image::{Image, ImageError};
use nowcast_imgproc::{filter::spatial_gradient, interpolation::bilinear_interpolation, parallel};

use crate::config::ProesmansConfig;
use crate::field::MotionField;
use crate::preprocess::ImagePair;

/// Smallest total diffusion weight for which the neighbourhood average is used.
pub const EPSILON: f32 = 1e-6;

/// 4-neighbourhood offsets, in the channel order of the edge weight image.
const NEIGHBOURS: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

fn neighbour(
    x: usize,
    y: usize,
    offset: (isize, isize),
    cols: usize,
    rows: usize,
) -> Option<usize> {
    let nx = x.checked_add_signed(offset.0).filter(|&nx| nx < cols)?;
    let ny = y.checked_add_signed(offset.1).filter(|&ny| ny < rows)?;
    Some(ny * cols + nx)
}

/// Central difference gradient of a frame as interleaved `(Ix, Iy)` pixels.
fn gradient_image(src: &Image<f32, 1>) -> Result<Image<f32, 2>, ImageError> {
    let mut dx = Image::from_size_val(src.size(), 0.0)?;
    let mut dy = Image::from_size_val(src.size(), 0.0)?;
    spatial_gradient(src, &mut dx, &mut dy)?;

    let mut grad = Image::from_size_val(src.size(), 0.0)?;
    let cols = src.cols();
    let (dx, dy) = (dx.as_slice(), dy.as_slice());
    parallel::par_iter_rows_indexed(&mut grad, |x, y, g| {
        g[0] = dx[y * cols + x];
        g[1] = dy[y * cols + x];
    });

    Ok(grad)
}

/// Conductivity towards each of the four neighbours, zero outside the image.
///
/// Diffusion is damped across intensity edges: `e = 1 / (1 + (dI / kappa)^2)`.
fn edge_weights(src: &Image<f32, 1>, kappa: f32) -> Result<Image<f32, 4>, ImageError> {
    let mut weights = Image::from_size_val(src.size(), 0.0)?;
    let (cols, rows) = (src.cols(), src.rows());
    let data = src.as_slice();

    parallel::par_iter_rows_indexed(&mut weights, |x, y, w| {
        let center = data[y * cols + x];
        for (k, &offset) in NEIGHBOURS.iter().enumerate() {
            w[k] = match neighbour(x, y, offset, cols, rows) {
                Some(q) => {
                    let diff = (data[q] - center) / kappa;
                    1.0 / (1.0 + diff * diff)
                }
                None => 0.0,
            };
        }
    });

    Ok(weights)
}

/// Agreement between `field` and `other` sampled at the displaced position.
///
/// A pixel whose displacement is undone by the opposite field maps to 1; the value
/// decays as `1 / (1 + gamma * |V(p) + W(p + V(p))|^2)`.
pub fn consistency_map(
    field: &MotionField,
    other: &MotionField,
    gamma: f32,
) -> Result<Image<f32, 1>, ImageError> {
    if field.size() != other.size() {
        return Err(ImageError::InvalidImageSize(
            field.size().width,
            field.size().height,
            other.size().width,
            other.size().height,
        ));
    }

    let mut consistency = Image::from_size_val(field.size(), 0.0)?;
    let cols = field.size().width;
    let data = field.as_image().as_slice();

    parallel::par_iter_rows_indexed(&mut consistency, |x, y, c| {
        let base = (y * cols + x) * 2;
        let (u, v) = (data[base], data[base + 1]);
        let [ou, ov] = other.sample(x as f32 + u, y as f32 + v);
        let (eu, ev) = (u + ou, v + ov);
        c[0] = 1.0 / (1.0 + gamma * (eu * eu + ev * ev));
    });

    Ok(consistency)
}

/// Discontinuity indicator of a field: low where the flow changes quickly or
/// disagrees with the opposite field.
fn discontinuity_indicator(
    field: &MotionField,
    other: &MotionField,
    gamma: f32,
    kappa_flow: f32,
) -> Result<Image<f32, 1>, ImageError> {
    let mut indicator = consistency_map(field, other, gamma)?;
    let size = field.size();
    let (cols, rows) = (size.width, size.height);
    let data = field.as_image().as_slice();
    let kappa_sq = kappa_flow * kappa_flow;

    parallel::par_iter_rows_indexed(&mut indicator, |x, y, d| {
        let (xl, xr) = (x.saturating_sub(1), (x + 1).min(cols - 1));
        let (yt, yb) = (y.saturating_sub(1), (y + 1).min(rows - 1));

        let mut grad_sq = 0.0;
        for ch in 0..2 {
            let gx = 0.5 * (data[(y * cols + xr) * 2 + ch] - data[(y * cols + xl) * 2 + ch]);
            let gy = 0.5 * (data[(yb * cols + x) * 2 + ch] - data[(yt * cols + x) * 2 + ch]);
            grad_sq += gx * gx + gy * gy;
        }

        d[0] /= 1.0 + grad_sq / kappa_sq;
    });

    Ok(indicator)
}

/// Frame data of one estimation direction, fixed for the whole level.
struct Direction<'a> {
    src: &'a Image<f32, 1>,
    dst: &'a Image<f32, 1>,
    src_grad: Image<f32, 2>,
    dst_grad: Image<f32, 2>,
    edges: Image<f32, 4>,
}

/// Iterative anisotropic diffusion of a pair of motion fields on one pyramid level.
///
/// The forward field maps the first frame onto the second and the backward field
/// the second onto the first. Every iteration smooths each field with weights that
/// vanish across intensity edges, motion boundaries and inconsistent regions, then
/// corrects it towards brightness constancy.
pub struct DiffusionSolver<'a> {
    config: &'a ProesmansConfig,
}

impl<'a> DiffusionSolver<'a> {
    /// Create a solver with the parameters of `config`.
    pub fn new(config: &'a ProesmansConfig) -> Self {
        Self { config }
    }

    /// Run exactly `num_iter` iterations on `pair`, starting from `fields`.
    ///
    /// `fields` holds the forward and backward field, in that order, and must have
    /// the size of `pair`.
    pub fn solve(
        &self,
        pair: &ImagePair,
        fields: [MotionField; 2],
    ) -> Result<[MotionField; 2], ImageError> {
        let size = pair.size();
        for field in &fields {
            if field.size() != size {
                return Err(ImageError::InvalidImageSize(
                    size.width,
                    size.height,
                    field.size().width,
                    field.size().height,
                ));
            }
        }

        debug!(
            "solving {} level, {} iterations",
            size, self.config.num_iter
        );

        let first_grad = gradient_image(&pair.first)?;
        let second_grad = gradient_image(&pair.second)?;
        let directions = [
            Direction {
                src: &pair.first,
                dst: &pair.second,
                src_grad: first_grad.clone(),
                dst_grad: second_grad.clone(),
                edges: edge_weights(&pair.first, self.config.kappa_image)?,
            },
            Direction {
                src: &pair.second,
                dst: &pair.first,
                src_grad: second_grad,
                dst_grad: first_grad,
                edges: edge_weights(&pair.second, self.config.kappa_image)?,
            },
        ];

        let mut current = fields;
        let mut next = current.clone();

        for _ in 0..self.config.num_iter {
            for j in 0..2 {
                let indicator = discontinuity_indicator(
                    &current[j],
                    &current[1 - j],
                    self.config.gamma,
                    self.config.kappa_flow,
                )?;
                self.relax(&directions[j], &current[j], &indicator, &mut next[j]);
            }
            std::mem::swap(&mut current, &mut next);
        }

        Ok(current)
    }

    /// One Jacobi update of `field` into `out`.
    fn relax(
        &self,
        direction: &Direction,
        field: &MotionField,
        indicator: &Image<f32, 1>,
        out: &mut MotionField,
    ) {
        let lam = self.config.lam;
        let (cols, rows) = (field.size().width, field.size().height);
        let flow = field.as_image().as_slice();
        let edges = direction.edges.as_slice();
        let indicator = indicator.as_slice();
        let src = direction.src.as_slice();
        let src_grad = direction.src_grad.as_slice();

        parallel::par_iter_rows_indexed(out.as_image_mut(), |x, y, out_px| {
            let p = y * cols + x;
            let (u, v) = (flow[p * 2], flow[p * 2 + 1]);

            let mut sum = [0.0f32; 2];
            let mut weight = 0.0f32;
            for (k, &offset) in NEIGHBOURS.iter().enumerate() {
                let Some(q) = neighbour(x, y, offset, cols, rows) else {
                    continue;
                };
                let w = edges[p * 4 + k] * indicator[q];
                sum[0] += w * flow[q * 2];
                sum[1] += w * flow[q * 2 + 1];
                weight += w;
            }

            let (u_avg, v_avg) = if weight > EPSILON {
                (sum[0] / weight, sum[1] / weight)
            } else {
                (u, v)
            };

            let (xw, yw) = (x as f32 + u, y as f32 + v);
            let [warped] = bilinear_interpolation(direction.dst, xw, yw);
            let [dst_gx, dst_gy] = bilinear_interpolation(&direction.dst_grad, xw, yw);
            let gx = 0.5 * (src_grad[p * 2] + dst_gx);
            let gy = 0.5 * (src_grad[p * 2 + 1] + dst_gy);

            let residual = gx * (u_avg - u) + gy * (v_avg - v) + warped - src[p];
            let step = lam * residual / (1.0 + lam * (gx * gx + gy * gy));

            out_px[0] = u_avg - step * gx;
            out_px[1] = v_avg - step * gy;
        });
    }
}
