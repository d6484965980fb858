//! Error Types
//!
//! This module defines the error type shared by the shader, mesh, buffer and
//! lifecycle layers.
//!
//! # Overview
//!
//! [`DemoError`] covers every failure mode of resource setup:
//! - File and texture loading failures
//! - Shader compilation and program linking diagnostics
//! - GL object validation and driver error codes
//! - Graphics context identity mismatches
//! - Mesh generation preconditions
//!
//! # Usage
//!
//! All fallible APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, DemoError>`.
//!
//! ```rust,ignore
//! use glesdemo::errors::{DemoError, Result};
//!
//! fn setup() -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::renderer::attributes::AttributeSemantic;
use crate::renderer::shader::ShaderKind;

/// The error type for every demo and resource operation.
#[derive(Error, Debug)]
pub enum DemoError {
    // ========================================================================
    // I/O & Asset Errors
    // ========================================================================
    /// A file could not be opened or was read short.
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        /// The file being read
        path: PathBuf,
        /// The underlying failure
        #[source]
        source: std::io::Error,
    },

    /// Texture data does not match the requested dimensions or format.
    #[error("Invalid texture '{}': {reason}", .path.display())]
    InvalidTexture {
        /// The texture source file
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    // ========================================================================
    // Shader & Program Errors
    // ========================================================================
    /// The driver accepts only precompiled shader binaries.
    #[error("No shader compiler present (binary only)")]
    NoCompiler,

    /// Shader compilation failed; `log` holds the driver diagnostics.
    #[error("Failed to compile {kind} shader:\n{log}")]
    Compile {
        /// The shader stage that failed
        kind: ShaderKind,
        /// Driver info log, truncated to its reported length
        log: String,
    },

    /// Program linking failed; `log` holds the driver diagnostics.
    #[error("Failed to link shader program:\n{log}")]
    Link {
        /// Driver info log, truncated to its reported length
        log: String,
    },

    /// A raw name does not refer to a live GL object of the expected kind.
    #[error("Argument is not a valid {kind} object (name {raw})")]
    InvalidHandle {
        /// Expected object kind
        kind: &'static str,
        /// The offending raw name
        raw: u32,
    },

    /// The driver refused to allocate an object.
    #[error("Failed to create {kind} object: {message}")]
    ObjectAllocation {
        /// Object kind being created
        kind: &'static str,
        /// Driver message
        message: String,
    },

    // ========================================================================
    // Mesh & Buffer Errors
    // ========================================================================
    /// The grid needs at least 3 rows and 4 columns.
    #[error("Degenerate sphere grid: {rows} rows x {cols} columns (need rows >= 3, cols >= 4)")]
    InvalidMeshDimensions {
        /// Requested latitude rings
        rows: u32,
        /// Requested longitude samples
        cols: u32,
    },

    /// The vertex count does not fit a 16-bit index buffer.
    #[error("Sphere grid {rows}x{cols} needs {vertex_count} vertices, over the 16-bit index limit of {limit}")]
    MeshCapacity {
        /// Requested latitude rings
        rows: u32,
        /// Requested longitude samples
        cols: u32,
        /// Vertex count the grid would produce
        vertex_count: usize,
        /// Maximum addressable vertex count
        limit: usize,
    },

    /// The vertex layout has no slot for an attribute the program consumes.
    #[error("Vertex layout has no {0:?} attribute")]
    UnsupportedAttribute(AttributeSemantic),

    /// A GL call raised a driver error.
    #[error("GL error 0x{code:04X} after {operation}")]
    GlOperation {
        /// Description of the failed call sequence
        operation: String,
        /// The value reported by `glGetError`
        code: u32,
    },

    // ========================================================================
    // Context & Lifecycle Errors
    // ========================================================================
    /// No graphics context is current on this thread.
    #[error("No current graphics context")]
    NoContext,

    /// The current context is not the one resources were created against.
    #[error("Encountered foreign display/context")]
    ForeignContext,

    /// A frame was requested before resources were initialized.
    #[error("Resources are not initialized")]
    NotInitialized,

    // ========================================================================
    // Application Errors
    // ========================================================================
    /// Command line could not be parsed; holds the usage text.
    #[error("{0}")]
    Cli(String),

    /// Window, display or context creation failed.
    #[error("Window system error: {0}")]
    Window(String),
}

impl From<winit::error::EventLoopError> for DemoError {
    fn from(err: winit::error::EventLoopError) -> Self {
        DemoError::Window(err.to_string())
    }
}

impl From<winit::error::OsError> for DemoError {
    fn from(err: winit::error::OsError) -> Self {
        DemoError::Window(err.to_string())
    }
}

impl From<glutin::error::Error> for DemoError {
    fn from(err: glutin::error::Error) -> Self {
        DemoError::Window(err.to_string())
    }
}

impl From<raw_window_handle::HandleError> for DemoError {
    fn from(err: raw_window_handle::HandleError) -> Self {
        DemoError::Window(err.to_string())
    }
}

/// Alias for `Result<T, DemoError>`.
pub type Result<T> = std::result::Result<T, DemoError>;
