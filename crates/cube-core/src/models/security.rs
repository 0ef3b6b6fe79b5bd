// ABOUTME: Security context types scoping every query to a single tenant
// ABOUTME: Organisation and user identifiers resolved fresh for each inbound request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tenant (organisation) identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganisationId(i64);

impl OrganisationId {
    /// Wrap a raw organisation id
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw value, used as the tenant bind parameter
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for OrganisationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User identifier within an organisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw user id
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw value
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity scoping a single request's query execution.
///
/// Built by a security context resolver once per request and dropped with the
/// request. There is intentionally no `Default` impl: a context must always come
/// from a resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityContext {
    organisation_id: OrganisationId,
    user_id: UserId,
}

impl SecurityContext {
    /// Create a context for the given tenant and user
    #[must_use]
    pub const fn new(organisation_id: OrganisationId, user_id: UserId) -> Self {
        Self {
            organisation_id,
            user_id,
        }
    }

    /// Tenant every query in this request is restricted to
    #[must_use]
    pub const fn organisation_id(&self) -> OrganisationId {
        self.organisation_id
    }

    /// User issuing the request
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }
}
