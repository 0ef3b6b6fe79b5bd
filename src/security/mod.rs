// ABOUTME: Per-request security context resolution scoping queries to one tenant
// ABOUTME: Defines the resolver trait plus a demo stub and a closure adapter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

//! # Security Context Resolution
//!
//! The gateway calls [`SecurityContextResolver::resolve`] exactly once per
//! request, before validating or executing anything, and scopes every query of
//! that request with the result. Contexts are never cached or shared between
//! requests.
//!
//! How identity is established (sessions, bearer tokens, mTLS, ...) is up to
//! the integrator: implement the trait, or wrap an async closure with
//! [`FnSecurityContextResolver`].

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use cube_core::models::{OrganisationId, SecurityContext, UserId};
use http::request::Parts;
use tracing::warn;

use crate::errors::AppResult;

/// Request data available to resolvers (method, URI, headers, extensions)
pub type InboundRequest = Parts;

/// Produces the security context for one inbound request.
///
/// Implementations may suspend (session lookups, token introspection). A
/// dropped request drops the resolve future with it.
#[async_trait]
pub trait SecurityContextResolver: Send + Sync {
    /// Resolve the tenant/user identity of `request`.
    ///
    /// # Errors
    ///
    /// Returns an authentication error (`AUTH_REQUIRED`, `AUTH_INVALID` or
    /// `PERMISSION_DENIED`) when identity material is missing or invalid.
    async fn resolve(&self, request: &InboundRequest) -> AppResult<SecurityContext>;
}

/// Unauthenticated resolver returning one fixed tenant for every request.
///
/// Only suitable for local demos: it performs no verification at all and every
/// caller sees the same organisation's data.
#[derive(Debug, Clone)]
pub struct StaticSecurityContextResolver {
    organisation_id: OrganisationId,
    user_id: UserId,
}

impl StaticSecurityContextResolver {
    /// Resolver that always yields `organisation_id` / `user_id`
    #[must_use]
    pub fn new(organisation_id: OrganisationId, user_id: UserId) -> Self {
        warn!(
            organisation_id = %organisation_id,
            user_id = %user_id,
            "Using static security context resolver: requests are NOT authenticated"
        );
        Self {
            organisation_id,
            user_id,
        }
    }

    /// Demo tenant: organisation 1, user 1
    #[must_use]
    pub fn demo() -> Self {
        Self::new(OrganisationId::new(1), UserId::new(1))
    }
}

#[async_trait]
impl SecurityContextResolver for StaticSecurityContextResolver {
    async fn resolve(&self, _request: &InboundRequest) -> AppResult<SecurityContext> {
        Ok(SecurityContext::new(self.organisation_id, self.user_id))
    }
}

/// Adapter turning a function returning a future into a resolver.
///
/// The function receives an owned copy of the request's method, URI and
/// headers (extensions are not cloneable and are left out).
pub struct FnSecurityContextResolver<F, Fut> {
    resolve_fn: F,
    _future: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnSecurityContextResolver<F, Fut>
where
    F: Fn(InboundRequest) -> Fut + Send + Sync,
    Fut: Future<Output = AppResult<SecurityContext>> + Send,
{
    /// Wrap `resolve_fn`
    pub const fn new(resolve_fn: F) -> Self {
        Self {
            resolve_fn,
            _future: PhantomData,
        }
    }
}

impl<F, Fut> fmt::Debug for FnSecurityContextResolver<F, Fut> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSecurityContextResolver").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> SecurityContextResolver for FnSecurityContextResolver<F, Fut>
where
    F: Fn(InboundRequest) -> Fut + Send + Sync,
    Fut: Future<Output = AppResult<SecurityContext>> + Send,
{
    async fn resolve(&self, request: &InboundRequest) -> AppResult<SecurityContext> {
        (self.resolve_fn)(clone_parts(request)).await
    }
}

fn clone_parts(request: &InboundRequest) -> InboundRequest {
    let mut builder = http::Request::builder()
        .method(request.method.clone())
        .uri(request.uri.clone())
        .version(request.version);
    if let Some(headers) = builder.headers_mut() {
        headers.clone_from(&request.headers);
    }
    // Parts taken from a live request always rebuild
    let (parts, ()) = builder
        .body(())
        .unwrap_or_else(|_| http::Request::new(()))
        .into_parts();
    parts
}
