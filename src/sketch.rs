//! The stroke engine: repeatedly stamps randomly colored, randomly placed
//! regular polygons onto a canvas, shrinking the stroke size and raising the
//! opacity after every stamp.

use image::{GenericImageView, Pixel, Rgba, RgbaImage};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut, Blend, Canvas};
use imageproc::point::Point;
use num::cast::ToPrimitive;
use num::Bounded;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};
use thiserror::Error;

/// Parameters for a sketch run, fixed at construction.
///
/// `Default` matches the tuning the program ships with: a 2000x2000 canvas,
/// broad triangles and quads that shrink by 0.2% per stroke, and an opacity
/// ramp that starts near-invisible and climbs by 0.06 per stroke.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserParams {
    /// Output canvas width in pixels.
    pub dest_width: u32,
    /// Output canvas height in pixels.
    pub dest_height: u32,
    /// Initial stroke circumradius as a fraction of `dest_width`.
    pub stroke_ratio: f64,
    /// Fraction of the current stroke size removed after each stroke.
    pub stroke_reduction: f64,
    /// Once the stroke size falls to this fraction of its initial value,
    /// every stroke also gets a high-contrast outline.
    pub stroke_inversion_threshold: f64,
    /// Maximum absolute offset, per axis, added to a stroke's mapped
    /// position. Drawn uniformly from `[-stroke_jitter, +stroke_jitter]`.
    pub stroke_jitter: f64,
    /// Starting per-stroke opacity, in 8-bit alpha units.
    pub initial_alpha: f64,
    /// Amount added to the running opacity after each stroke.
    pub alpha_increase: f64,
    /// Minimum polygon edge count, inclusive. At least 3.
    pub min_edge_count: u32,
    /// Maximum polygon edge count, inclusive.
    pub max_edge_count: u32,
}

impl Default for UserParams {
    fn default() -> Self {
        Self {
            dest_width: 2000,
            dest_height: 2000,
            stroke_ratio: 0.75,
            stroke_reduction: 0.002,
            stroke_inversion_threshold: 0.05,
            stroke_jitter: 200.0,
            initial_alpha: 0.1,
            alpha_increase: 0.06,
            min_edge_count: 3,
            max_edge_count: 4,
        }
    }
}

impl UserParams {
    fn validate(&self) -> Result<(), SketchError> {
        if self.dest_width == 0 || self.dest_height == 0 {
            return Err(SketchError::BadCanvasSize {
                width: self.dest_width,
                height: self.dest_height,
            });
        }
        if !(self.stroke_ratio > 0.0) {
            return Err(SketchError::BadStrokeRatio(self.stroke_ratio));
        }
        if !(0.0..=1.0).contains(&self.stroke_reduction) {
            return Err(SketchError::BadStrokeReduction(self.stroke_reduction));
        }
        if !(self.stroke_jitter >= 0.0) {
            return Err(SketchError::NegativeJitter(self.stroke_jitter));
        }
        if self.min_edge_count < 3 || self.min_edge_count > self.max_edge_count {
            return Err(SketchError::BadEdgeCounts {
                min: self.min_edge_count,
                max: self.max_edge_count,
            });
        }
        Ok(())
    }
}

/// Rejected configuration or source image.
#[derive(Debug, Error)]
pub enum SketchError {
    #[error("canvas dimensions must be positive, got {width}x{height}")]
    BadCanvasSize { width: u32, height: u32 },
    #[error("source image has no pixels")]
    EmptySource,
    #[error("stroke ratio must be positive, got {0}")]
    BadStrokeRatio(f64),
    #[error("stroke reduction must lie in [0, 1], got {0}")]
    BadStrokeReduction(f64),
    #[error("stroke jitter must be non-negative, got {0}")]
    NegativeJitter(f64),
    #[error("edge counts must satisfy 3 <= min <= max, got {min}..={max}")]
    BadEdgeCounts { min: u32, max: u32 },
}

/// Stroke engine. Owns the output canvas and the state that evolves from
/// stroke to stroke; borrows the source image it samples colors from.
pub struct Sketch<'a, I> {
    params: UserParams,
    source: &'a I,
    source_width: u32,
    source_height: u32,
    canvas: Blend<RgbaImage>,
    stroke_size: f64,
    initial_stroke_size: f64,
    alpha: f64,
}

impl<'a, I: GenericImageView> Sketch<'a, I>
where
    <<I as GenericImageView>::Pixel as Pixel>::Subpixel: 'static,
{
    /// Validate `params`, record the source dimensions, and allocate an
    /// opaque black canvas. Consumes no randomness.
    pub fn new(source: &'a I, params: UserParams) -> Result<Self, SketchError> {
        params.validate()?;
        let (source_width, source_height) = source.dimensions();
        if source_width == 0 || source_height == 0 {
            return Err(SketchError::EmptySource);
        }

        let initial_stroke_size = params.stroke_ratio * params.dest_width as f64;
        let canvas = RgbaImage::from_pixel(
            params.dest_width,
            params.dest_height,
            Rgba([0, 0, 0, 255]),
        );

        Ok(Self {
            alpha: params.initial_alpha,
            stroke_size: initial_stroke_size,
            initial_stroke_size,
            source,
            source_width,
            source_height,
            canvas: Blend(canvas),
            params,
        })
    }

    /// Draw one stroke and advance the engine state.
    ///
    /// The rotation drawn for the polygon is a raw value in `[0, 1)` used
    /// directly as radians, with the vertex ring phase-shifted so a vertex
    /// starts pointing up.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        // Sample a source pixel; its color becomes the stroke color.
        let sx = rng.gen::<f64>() * self.source_width as f64;
        let sy = rng.gen::<f64>() * self.source_height as f64;
        let (r, g, b) = rgb255(self.source.get_pixel(sx as u32, sy as u32));

        // Map the sample point into canvas space and jitter it.
        let jitter = self.params.stroke_jitter;
        let dest_x = sx * self.params.dest_width as f64 / self.source_width as f64
            + rng.gen_range(-jitter..=jitter);
        let dest_y = sy * self.params.dest_height as f64 / self.source_height as f64
            + rng.gen_range(-jitter..=jitter);

        // A fixed edge count consumes no randomness.
        let edges = if self.params.min_edge_count == self.params.max_edge_count {
            self.params.min_edge_count
        } else {
            rng.gen_range(self.params.min_edge_count..=self.params.max_edge_count)
        };
        let rotation = rng.gen::<f64>();
        let vertices = dedup_ring(regular_polygon(
            edges,
            dest_x,
            dest_y,
            self.stroke_size,
            rotation,
        ));

        let fill = Rgba([r, g, b, alpha255(self.alpha)]);
        self.fill_stroke(&vertices, fill);

        // Small strokes get a contrasting outline to sharpen detail.
        if self.stroke_size <= self.params.stroke_inversion_threshold * self.initial_stroke_size {
            let edge_alpha = alpha255(self.alpha * 2.0);
            let outline = if (r as u32 + g as u32 + b as u32) / 3 < 128 {
                Rgba([255, 255, 255, edge_alpha])
            } else {
                Rgba([0, 0, 0, edge_alpha])
            };
            self.outline_stroke(&vertices, outline);
        }

        self.stroke_size -= self.params.stroke_reduction * self.stroke_size;
        self.alpha += self.params.alpha_increase;
    }

    /// The canvas contents so far. Idempotent; callable mid-run.
    pub fn output(&self) -> &RgbaImage {
        &self.canvas.0
    }

    /// Consume the engine and return the canvas.
    pub fn into_image(self) -> RgbaImage {
        self.canvas.0
    }

    /// Current stroke circumradius.
    pub fn stroke_size(&self) -> f64 {
        self.stroke_size
    }

    /// Stroke circumradius at construction.
    pub fn initial_stroke_size(&self) -> f64 {
        self.initial_stroke_size
    }

    /// Current unclamped opacity accumulator.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    fn fill_stroke(&mut self, vertices: &[Point<i32>], color: Rgba<u8>) {
        match *vertices {
            [] => {}
            [p] => self.stamp_pixel(p, color),
            [a, b] => draw_line_segment_mut(
                &mut self.canvas,
                (a.x as f32, a.y as f32),
                (b.x as f32, b.y as f32),
                color,
            ),
            _ => draw_polygon_mut(&mut self.canvas, vertices, color),
        }
    }

    fn outline_stroke(&mut self, vertices: &[Point<i32>], color: Rgba<u8>) {
        match *vertices {
            [] => {}
            [p] => self.stamp_pixel(p, color),
            [a, b] => draw_line_segment_mut(
                &mut self.canvas,
                (a.x as f32, a.y as f32),
                (b.x as f32, b.y as f32),
                color,
            ),
            _ => {
                for i in 0..vertices.len() {
                    let a = vertices[i];
                    let b = vertices[(i + 1) % vertices.len()];
                    draw_line_segment_mut(
                        &mut self.canvas,
                        (a.x as f32, a.y as f32),
                        (b.x as f32, b.y as f32),
                        color,
                    );
                }
            }
        }
    }

    fn stamp_pixel(&mut self, p: Point<i32>, color: Rgba<u8>) {
        let (width, height) = self.canvas.dimensions();
        if p.x >= 0 && p.y >= 0 && (p.x as u32) < width && (p.y as u32) < height {
            self.canvas.draw_pixel(p.x as u32, p.y as u32, color);
        }
    }
}

// Reduces a pixel of any channel depth to 8-bit RGB.
fn rgb255<P: Pixel>(pixel: P) -> (u8, u8, u8) where <P as Pixel>::Subpixel: 'static {
    let rgb = pixel.to_rgb();
    let channels = rgb.channels();
    let max = <P::Subpixel as Bounded>::max_value().to_f64().unwrap();
    let quantize = |c: P::Subpixel| (c.to_f64().unwrap() / max * 255.0).round() as u8;
    (
        quantize(channels[0]),
        quantize(channels[1]),
        quantize(channels[2]),
    )
}

// Quantizes the unbounded opacity accumulator to an 8-bit channel. The
// accumulator itself is never clamped.
fn alpha255(alpha: f64) -> u8 {
    alpha.clamp(0.0, 255.0) as u8
}

// Vertices of a regular polygon, rounded to pixel coordinates. With
// `rotation` zero the first vertex points straight up from the center.
fn regular_polygon(edges: u32, cx: f64, cy: f64, radius: f64, rotation: f64) -> Vec<Point<i32>> {
    let step = TAU / edges as f64;
    let phase = rotation - FRAC_PI_2;
    (0..edges)
        .map(|i| {
            let theta = phase + step * i as f64;
            Point::new(
                (cx + radius * theta.cos()).round() as i32,
                (cy + radius * theta.sin()).round() as i32,
            )
        })
        .collect()
}

// Collapses consecutive duplicate vertices, including across the wrap-around.
// Sub-pixel polygons reduce to a line or a single point but are still drawn.
fn dedup_ring(mut vertices: Vec<Point<i32>>) -> Vec<Point<i32>> {
    vertices.dedup();
    while vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    vertices
}
