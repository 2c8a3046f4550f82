/*!
`spriteops` compiles a declarative, text-based pixel sprite script into
raster images: per-frame bitmaps, a sprite sheet, an optional animated
image, and a metadata descriptor.

The core — op schema, static validator, frame-inheritance resolver, and
the layered palette-indexed rasteriser — is deterministic: the same
document renders to bit-identical buffers across runs, platforms, and
implementations. Encoding those buffers into PNG/GIF containers and the
command-line front-end are thin collaborators built on top of the core;
see [`imaging`] and the `spriteops` binary.
*/

#![warn(missing_debug_implementations)]

pub mod color;
pub mod document;
pub mod error;
pub mod imaging;
pub mod interp;
pub mod layers;
pub mod ops;
pub mod raster;
pub mod resolve;
pub mod validate;

pub use color::{hex_to_rgba, Rgba8};
pub use document::Document;
pub use error::{DecodeError, RenderError};
pub use interp::render_frame;
pub use resolve::resolve;
pub use validate::{validate, Diagnostic};
