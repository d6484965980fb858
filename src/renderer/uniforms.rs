//! Uniform location tables keyed by a closed set of semantics.
//!
//! A demo declares an enum of the uniforms it writes and implements
//! [`UniformSemantic`] for it. After linking, [`UniformTable::resolve`]
//! looks every name up once; a `None` entry means the program does not use
//! that uniform and the per-frame write is skipped.

use std::marker::PhantomData;

use smallvec::SmallVec;

use crate::gl::{GlDriver, ProgramHandle, UniformLocation};

/// A closed set of uniforms addressed by a dense index.
pub trait UniformSemantic: Copy + 'static {
    /// Every semantic, ordered by [`index`](Self::index).
    const ALL: &'static [Self];

    fn index(self) -> usize;

    /// GLSL name of the uniform.
    fn name(self) -> &'static str;
}

#[derive(Debug, Clone)]
pub struct UniformTable<S: UniformSemantic> {
    locations: SmallVec<[Option<UniformLocation>; 8]>,
    _semantic: PhantomData<S>,
}

impl<S: UniformSemantic> Default for UniformTable<S> {
    fn default() -> Self {
        Self {
            locations: SmallVec::from_elem(None, S::ALL.len()),
            _semantic: PhantomData,
        }
    }
}

impl<S: UniformSemantic> UniformTable<S> {
    /// An empty table, every entry unresolved.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves every semantic against a linked `program`.
    pub fn resolve<G: GlDriver + ?Sized>(gl: &G, program: ProgramHandle) -> Self {
        let mut table = Self::new();
        for &semantic in S::ALL {
            let location = gl.get_uniform_location(program, semantic.name());
            log::debug!("uniform {}: {location:?}", semantic.name());
            table.locations[semantic.index()] = location;
        }
        table
    }

    #[must_use]
    pub fn get(&self, semantic: S) -> Option<UniformLocation> {
        self.locations.get(semantic.index()).copied().flatten()
    }

    /// Number of semantics the program actually uses.
    #[must_use]
    pub fn resolved(&self) -> usize {
        self.locations.iter().filter(|location| location.is_some()).count()
    }

    pub fn clear(&mut self) {
        self.locations.iter_mut().for_each(|location| *location = None);
    }
}
