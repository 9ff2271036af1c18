//! Render MathML and LaTeX math to standalone SVG.
//!
//! Glyphs are drawn as paths lifted from an OpenType font with a `MATH`
//! table, so the output needs no fonts, TeX engine or rasterizer on the
//! consumer's side.
//!
//! ```no_run
//! # fn main() -> Result<(), mathrender::Error> {
//! use mathrender::Math;
//!
//! let svg = Math::new("<math><msup><mi>x</mi><mn>2</mn></msup></math>")?.svg()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod font;
pub mod layout;
pub mod length;
pub mod mathml;
pub mod operators;
pub mod render;
pub mod style;
pub mod svg;
#[cfg(feature = "latex")]
pub mod tex;
#[cfg(feature = "latex")]
pub mod text;
pub mod variant;

pub use config::{next_equation_number, reset_numbering, Config};
pub use error::{Error, Result};
pub use font::{MathFont, TextFont};
pub use operators::declare_operator;
pub use render::{mathml_to_svg, Math};
#[cfg(feature = "latex")]
pub use render::latex_to_svg;
pub use svg::{HAlign, VAlign};
#[cfg(feature = "latex")]
pub use text::TextBlock;
