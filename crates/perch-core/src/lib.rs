//! # Signals, Scopes, and the Dispatcher
//!
//! Perch places popups and paints their companion overlays. This crate holds
//! the single-threaded runtime the engine is built on. There are four main
//! pieces:
//!
//! - `Signal<T>`: observable value; subscribers run synchronously on `set`.
//! - `Dispose` / `Scope`: run-once cleanups, grouped so a whole binding can
//!   be torn down in one call.
//! - `Dispatcher`: one-shot timers and per-frame callbacks, driven by an
//!   injected `Clock`.
//! - Locals and tokens: the flow direction, density and theme a popup is
//!   resolved under, and the design-token table styling is read from.
//!
//! ## Signals
//!
//! ```rust
//! use perch_core::*;
//!
//! let size = signal(Size::new(120.0, 40.0));
//! let seen = std::rc::Rc::new(std::cell::Cell::new(0.0));
//! let guard = {
//!     let seen = seen.clone();
//!     size.watch(move |s| seen.set(s.width))
//! };
//! size.set(Size::new(200.0, 40.0));
//! assert_eq!(seen.get(), 200.0);
//!
//! guard.run();
//! size.set(Size::new(10.0, 10.0));
//! assert_eq!(seen.get(), 200.0);
//! ```
//!
//! ## Scopes
//!
//! Handlers registered while a scope is current are cleaned up with it:
//!
//! ```rust
//! use perch_core::*;
//!
//! let position = signal(Vec2::ZERO);
//! let scope = Scope::new();
//! scope.run(|| {
//!     let p = position.clone();
//!     effect(move || p.watch(|v| log::debug!("moved to {v:?}")));
//! });
//! assert_eq!(position.subscriber_count(), 1);
//! scope.dispose();
//! assert_eq!(position.subscriber_count(), 0);
//! ```
//!
//! ## Time
//!
//! Nothing in Perch reads the wall clock directly. Tests and headless hosts
//! hand the dispatcher a `ManualClock` and step it:
//!
//! ```rust
//! use std::rc::Rc;
//! use perch_core::*;
//! use web_time::Duration;
//!
//! let clock = Rc::new(ManualClock::new());
//! let dispatcher = Dispatcher::new(clock.clone());
//! let fired = Rc::new(std::cell::Cell::new(false));
//! let _t = {
//!     let fired = fired.clone();
//!     dispatcher.run_once(Duration::from_millis(240), move || fired.set(true))
//! };
//! clock.advance(Duration::from_millis(239));
//! dispatcher.pump();
//! assert!(!fired.get());
//! clock.advance(Duration::from_millis(1));
//! dispatcher.pump();
//! assert!(fired.get());
//! ```

pub mod animation;
pub mod color;
pub mod effects;
pub mod geometry;
pub mod locals;
pub mod prelude;
pub mod runtime;
pub mod scope;
pub mod shadow;
pub mod signal;
pub mod tests;
pub mod tokens;
pub mod view;

pub use animation::*;
pub use color::*;
pub use effects::*;
pub use geometry::*;
pub use locals::*;
pub use runtime::*;
pub use scope::*;
pub use shadow::*;
pub use signal::*;
pub use tokens::*;
pub use view::*;
