//! Painterly renditions of raster images.
//!
//! A [`Sketch`] stamps randomly colored, randomly placed regular polygons
//! onto a black canvas, sampling each stroke's color from a source image.
//! Stroke size shrinks and opacity rises over the run, so early strokes lay
//! broad color blocks and later strokes add fine, increasingly opaque
//! detail. Once strokes are small enough, each also gets a high-contrast
//! outline that sharpens edges.
//!
//! The caller owns the random generator and the iteration loop:
//!
//! ```no_run
//! use painterly::{Sketch, UserParams};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let source = image::open("input.jpg").unwrap().into_rgba8();
//! let mut rng = StdRng::seed_from_u64(1);
//! let mut sketch = Sketch::new(&source, UserParams::default()).unwrap();
//! for _ in 0..5000 {
//!     sketch.step(&mut rng);
//! }
//! sketch.into_image().save("output.png").unwrap();
//! ```

pub mod sketch;

pub use crate::sketch::{Sketch, SketchError, UserParams};
