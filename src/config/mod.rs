// ABOUTME: Configuration module organization
// ABOUTME: Environment-only configuration validated once at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

/// Server configuration loaded from environment variables
pub mod environment;
