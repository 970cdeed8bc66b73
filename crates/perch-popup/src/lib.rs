//! # Popup placement and the companion layer
//!
//! Turning "show this below that button" into something a platform
//! positioner understands, and keeping a shadow/arrow overlay glued to the
//! popup once it is up.
//!
//! - [`placement`]: placement modes, anchor/gravity edge flags and
//!   [`resolve_placement`].
//! - [`visual`]: a small visual tree that maps a target's bounds into host
//!   space, through adorner layers when needed.
//! - [`arrow`]: where the arrow goes for a placement.
//! - [`shadow`]: shadow layers and the padding they need.
//! - [`surface`]: the traits a windowing backend implements.
//! - [`companion`] and [`motion`]: the overlay itself and its open/close
//!   motions.
//! - [`headless`]: in-memory backend for tests and tools.
//!
//! ```rust
//! use perch_core::{FlowDirection, Rect, Vec2};
//! use perch_popup::*;
//!
//! let r = resolve_placement(
//!     PlacementMode::Bottom,
//!     Rect::new(100.0, 100.0, 50.0, 20.0),
//!     Vec2::ZERO,
//!     None,
//!     FlowDirection::LeftToRight,
//! )?;
//! assert_eq!(r.direction, Some(Direction::Bottom));
//! assert_eq!(r.arrow_position(), Some(ArrowPosition::Top));
//! # Ok::<(), PopupError>(())
//! ```

pub mod arrow;
pub mod companion;
pub mod error;
pub mod headless;
pub mod motion;
pub mod placement;
pub mod shadow;
pub mod surface;
pub mod visual;

pub use arrow::*;
pub use companion::*;
pub use error::{PopupError, Result};
pub use headless::*;
pub use motion::*;
pub use placement::*;
pub use shadow::*;
pub use surface::*;
pub use visual::*;
