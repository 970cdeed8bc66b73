//! # Composition locals
//!
//! Perch uses thread‑local “composition locals” for the ambient parameters a
//! popup is resolved under:
//!
//! - `FlowDirection`: left‑to‑right or right‑to‑left layout.
//! - `Density`: logical→physical pixel scale of the desktop.
//! - `ThemeVariant`: which token table (light/dark) lookups go to.
//!
//! Override them for a block of code with `with_flow_direction`,
//! `with_density` and `with_theme_variant`:
//!
//! ```rust
//! use perch_core::*;
//!
//! with_flow_direction(FlowDirection::RightToLeft, || {
//!     assert_eq!(flow_direction(), FlowDirection::RightToLeft);
//! });
//! assert_eq!(flow_direction(), FlowDirection::LeftToRight);
//! ```
//!
//! Everything here is read on the UI thread; nothing is shared across
//! threads.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FlowDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ThemeVariant {
    #[default]
    Light,
    Dark,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Density {
    pub scale: f32, // logical→physical multiplier
}
impl Default for Density {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

thread_local! {
    static LOCALS_STACK: RefCell<Vec<HashMap<TypeId, Box<dyn Any>>>> = RefCell::new(Vec::new());
}

fn with_locals_frame<R>(f: impl FnOnce() -> R) -> R {
    // Non-panicking frame guard (ensures pop on unwind)
    struct Guard;
    impl Drop for Guard {
        fn drop(&mut self) {
            LOCALS_STACK.with(|st| {
                st.borrow_mut().pop();
            });
        }
    }
    LOCALS_STACK.with(|st| st.borrow_mut().push(HashMap::new()));
    let _guard = Guard;
    f()
}

fn set_local_boxed(t: TypeId, v: Box<dyn Any>) {
    LOCALS_STACK.with(|st| {
        if let Some(top) = st.borrow_mut().last_mut() {
            top.insert(t, v);
        }
    });
}

fn local<T: Copy + Default + 'static>() -> T {
    LOCALS_STACK.with(|st| {
        for frame in st.borrow().iter().rev() {
            if let Some(v) = frame.get(&TypeId::of::<T>())
                && let Some(t) = v.downcast_ref::<T>()
            {
                return *t;
            }
        }
        T::default()
    })
}

fn with_local<T: 'static, R>(value: T, f: impl FnOnce() -> R) -> R {
    with_locals_frame(|| {
        set_local_boxed(TypeId::of::<T>(), Box::new(value));
        f()
    })
}

pub fn with_flow_direction<R>(dir: FlowDirection, f: impl FnOnce() -> R) -> R {
    with_local(dir, f)
}

pub fn with_density<R>(density: Density, f: impl FnOnce() -> R) -> R {
    with_local(density, f)
}

pub fn with_theme_variant<R>(variant: ThemeVariant, f: impl FnOnce() -> R) -> R {
    with_local(variant, f)
}

// Getters with defaults if not set

pub fn flow_direction() -> FlowDirection {
    local::<FlowDirection>()
}

pub fn density() -> Density {
    local::<Density>()
}

pub fn theme_variant() -> ThemeVariant {
    local::<ThemeVariant>()
}
