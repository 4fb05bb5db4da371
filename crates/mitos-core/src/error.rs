// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Defines the hierarchy of error types for the strand engine.
//!
//! Cache misses are never errors; they are an expected branch of the render
//! path. The types here cover caller contract violations (degenerate curve
//! input) and graphics backend failures, which are surfaced to the `draw`
//! caller and retried on the next frame by construction (the failed entry is
//! never cached).

use std::fmt;

/// An error produced by curve or frame evaluation on invalid input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// Curve evaluation needs at least two control points.
    TooFewControlPoints {
        /// The number of control points actually supplied.
        got: usize,
    },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::TooFewControlPoints { got } => {
                write!(f, "Curve evaluation requires at least 2 control points, got {got}")
            }
        }
    }
}

impl std::error::Error for GeometryError {}

/// An error related to the creation or use of a GPU resource.
#[derive(Debug)]
pub enum ResourceError {
    /// A resource could not be found for the given handle.
    NotFound,
    /// The handle or ID used to reference a resource is invalid.
    InvalidHandle,
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
    /// An attempt was made to access a resource out of its bounds.
    OutOfBounds,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NotFound => write!(f, "Resource not found with ID."),
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle or ID."),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
            ResourceError::OutOfBounds => write!(f, "Resource access out of bounds."),
        }
    }
}

impl std::error::Error for ResourceError {}

/// A high-level error that can occur while dispatching a frame.
#[derive(Debug)]
pub enum RenderError {
    /// A failure occurred during the initialization of the graphics backend.
    InitializationFailed(String),
    /// A rendering operation failed inside the graphics backend.
    RenderingFailed(String),
    /// An error occurred while managing a GPU resource.
    ResourceError(ResourceError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::InitializationFailed(msg) => {
                write!(f, "Failed to initialize graphics backend: {msg}")
            }
            RenderError::RenderingFailed(msg) => {
                write!(f, "A rendering operation failed: {msg}")
            }
            RenderError::ResourceError(err) => {
                write!(f, "Graphics resource operation failed: {err}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::ResourceError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::ResourceError(err)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn geometry_error_display() {
        let err = GeometryError::TooFewControlPoints { got: 1 };
        assert_eq!(
            format!("{err}"),
            "Curve evaluation requires at least 2 control points, got 1"
        );
    }

    #[test]
    fn resource_error_display() {
        let err = ResourceError::BackendError("buffer allocation refused".to_string());
        assert_eq!(
            format!("{err}"),
            "Backend-specific resource error: buffer allocation refused"
        );
    }

    #[test]
    fn render_error_wraps_resource_error_as_source() {
        let err: RenderError = ResourceError::NotFound.into();
        assert_eq!(
            format!("{err}"),
            "Graphics resource operation failed: Resource not found with ID."
        );
        assert!(err.source().is_some());
        let plain = RenderError::RenderingFailed("pass failed".to_string());
        assert!(plain.source().is_none());
    }
}
