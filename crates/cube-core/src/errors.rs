// ABOUTME: Error type for model construction and member reference parsing
// ABOUTME: Converted into the server's AppError at the gateway boundary
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

use thiserror::Error;

/// Errors produced by model parsing and validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Member reference is not of the form `Cube.member`
    #[error("Invalid member reference '{0}': expected 'Cube.member'")]
    InvalidMemberReference(String),

    /// Identifier contains characters outside `[A-Za-z_][A-Za-z0-9_]*`
    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),
}
