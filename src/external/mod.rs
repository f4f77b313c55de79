// ABOUTME: External identity provider clients
// ABOUTME: Membership lookups and OAuth code exchange over HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

//! External provider integration
//!
//! Every provider round trip is timeout-bound and isolated per request;
//! no lock is held across a network call.

/// Guild membership lookups
pub mod membership;
/// OAuth code exchange and identity fetch
pub mod oauth;

pub use membership::{HttpMembershipClient, MembershipError, MembershipProvider};
pub use oauth::OAuthCodeClient;
