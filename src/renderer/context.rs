//! Context identity and resource lifecycle.
//!
//! GL object names are only meaningful inside the context that created
//! them. A demo captures the current [`ContextId`] at init and checks it
//! before every frame and before teardown.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::errors::{DemoError, Result};
use crate::gl::GlDriver;

pub use crate::gl::ContextId;

/// Lifecycle of a demo's GPU resources.
///
/// `Uninitialized -> Initializing -> Ready -> Destroyed`, with `Error`
/// reached from `Initializing` when setup fails and is rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    Error,
    Destroyed,
}

/// Remembers the context resources were created against.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextGuard {
    captured: Option<ContextId>,
}

impl ContextGuard {
    /// Records the context current on this thread.
    pub fn capture<G: GlDriver + ?Sized>(&mut self, gl: &G) -> Result<ContextId> {
        let current = gl.current_context().ok_or(DemoError::NoContext)?;
        self.captured = Some(current);
        Ok(current)
    }

    /// Fails with `ForeignContext` when the current context is not the
    /// captured one, and with `NotInitialized` when nothing was captured.
    pub fn check<G: GlDriver + ?Sized>(&self, gl: &G) -> Result<()> {
        let captured = self.captured.ok_or(DemoError::NotInitialized)?;
        if gl.current_context() == Some(captured) {
            Ok(())
        } else {
            Err(DemoError::ForeignContext)
        }
    }

    #[must_use]
    pub fn captured(&self) -> Option<ContextId> {
        self.captured
    }

    pub fn release(&mut self) {
        self.captured = None;
    }
}

type IsCurrentFn = Box<dyn Fn() -> bool>;

/// Live view of whether a context owned elsewhere is current.
///
/// The tracker holds only a weak reference to the owner, so once the owner
/// drops or hands the context back (to make it not current) the tracker
/// reports no context.
#[derive(Default)]
pub struct ContextTracker {
    attached: RefCell<Option<(ContextId, IsCurrentFn)>>,
}

impl ContextTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks `owner` under `id`; `is_current` asks the platform whether the
    /// owned context is current on this thread.
    pub fn attach<T: 'static>(&self, id: ContextId, owner: &Rc<T>, is_current: impl Fn(&T) -> bool + 'static) {
        let owner: Weak<T> = Rc::downgrade(owner);
        let is_current_now: IsCurrentFn = Box::new(move || owner.upgrade().is_some_and(|owner| is_current(&owner)));
        *self.attached.borrow_mut() = Some((id, is_current_now));
    }

    pub fn detach(&self) {
        self.attached.borrow_mut().take();
    }

    /// The attached identity while its context is current.
    #[must_use]
    pub fn current(&self) -> Option<ContextId> {
        let attached = self.attached.borrow();
        let (id, is_current) = attached.as_ref()?;
        is_current().then_some(*id)
    }
}

impl fmt::Debug for ContextTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attached = self.attached.borrow().as_ref().map(|(id, _)| *id);
        f.debug_struct("ContextTracker").field("attached", &attached).finish()
    }
}
