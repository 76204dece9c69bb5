// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Identity resolution and the organization membership gate.

use orgvote_domain::{MemberRole, Membership, Organization, User, normalize_email};
use orgvote_persistence::SqlitePersistence;
use tracing::{debug, warn};

use crate::error::{ApiError, AuthError, translate_persistence_error};

/// An identity already verified by the authentication layer.
///
/// The API never checks credentials itself. It trusts the `{id, email}`
/// pair handed over by whatever sits in front of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// The user's storage identifier.
    pub user_id: i64,
    /// The user's normalized email address.
    pub email: String,
}

impl VerifiedIdentity {
    /// Creates a verified identity, normalizing the email.
    #[must_use]
    pub fn new(user_id: i64, email: &str) -> Self {
        Self {
            user_id,
            email: normalize_email(email),
        }
    }
}

/// Turns forwarded identity values into a `VerifiedIdentity`.
pub struct AuthenticationService;

impl AuthenticationService {
    /// Builds an identity from the forwarded user id and email values.
    ///
    /// # Arguments
    ///
    /// * `user_id` - The forwarded user id, if present
    /// * `email` - The forwarded email, if present
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AuthenticationFailed` if either value is missing
    /// or the user id is not an integer.
    pub fn resolve_identity(
        user_id: Option<&str>,
        email: Option<&str>,
    ) -> Result<VerifiedIdentity, AuthError> {
        let raw_id: &str = user_id
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Missing user id"),
            })?;

        let user_id: i64 = raw_id
            .parse()
            .map_err(|_| AuthError::AuthenticationFailed {
                reason: format!("Malformed user id '{raw_id}'"),
            })?;

        let email: &str = email
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Missing user email"),
            })?;

        Ok(VerifiedIdentity::new(user_id, email))
    }

    /// Loads the registered user behind an identity.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::AuthenticationFailed` if no such user exists or
    /// the stored email differs from the identity's.
    pub fn load_user(
        persistence: &mut SqlitePersistence,
        identity: &VerifiedIdentity,
    ) -> Result<User, ApiError> {
        let user: User = persistence
            .get_user(identity.user_id)
            .map_err(translate_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: format!("Unknown user {}", identity.user_id),
            })?;

        if user.email != identity.email {
            warn!(user_id = identity.user_id, "Identity email does not match user");
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Identity does not match a registered user"),
            }
            .into());
        }

        Ok(user)
    }
}

/// Membership checks for organization-scoped operations.
///
/// Every check fails closed: a missing membership row is `Unauthorized`,
/// never a default allow. An organization's creator always counts as an
/// administrator.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Requires any membership in the organization.
    ///
    /// # Arguments
    ///
    /// * `persistence` - The persistence layer
    /// * `identity` - The verified identity
    /// * `organization_id` - The organization being accessed
    /// * `action` - The action name reported on failure
    ///
    /// # Returns
    ///
    /// The identity's role in the organization.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ResourceNotFound` if the organization does not
    /// exist, or `ApiError::Unauthorized` if the identity is not a member.
    pub fn authorize_member(
        persistence: &mut SqlitePersistence,
        identity: &VerifiedIdentity,
        organization_id: i64,
        action: &str,
    ) -> Result<MemberRole, ApiError> {
        let organization: Organization = load_organization(persistence, organization_id)?;

        if organization.creator_id == identity.user_id {
            return Ok(MemberRole::Admin);
        }

        let membership: Option<Membership> = persistence
            .get_membership(organization_id, identity.user_id)
            .map_err(translate_persistence_error)?;

        match membership {
            Some(membership) => {
                debug!(
                    organization_id,
                    user_id = identity.user_id,
                    role = membership.role.as_str(),
                    "Membership verified"
                );
                Ok(membership.role)
            }
            None => {
                warn!(
                    organization_id,
                    user_id = identity.user_id,
                    action,
                    "Rejected non-member"
                );
                Err(AuthError::Unauthorized {
                    action: action.to_string(),
                    required_role: String::from("MEMBER"),
                }
                .into())
            }
        }
    }

    /// Requires the ADMIN role in the organization.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ResourceNotFound` if the organization does not
    /// exist, or `ApiError::Unauthorized` unless the identity is an admin.
    pub fn authorize_admin(
        persistence: &mut SqlitePersistence,
        identity: &VerifiedIdentity,
        organization_id: i64,
        action: &str,
    ) -> Result<(), ApiError> {
        match Self::authorize_member(persistence, identity, organization_id, action) {
            Ok(MemberRole::Admin) => Ok(()),
            Ok(MemberRole::Member) | Err(ApiError::Unauthorized { .. }) => {
                warn!(
                    organization_id,
                    user_id = identity.user_id,
                    action,
                    "Rejected non-admin"
                );
                Err(AuthError::Unauthorized {
                    action: action.to_string(),
                    required_role: String::from("ADMIN"),
                }
                .into())
            }
            Err(err) => Err(err),
        }
    }

    /// Requires the identity to be the organization's creator.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthorized` for anyone else.
    pub fn authorize_creator(
        identity: &VerifiedIdentity,
        organization: &Organization,
        action: &str,
    ) -> Result<(), AuthError> {
        if organization.creator_id == identity.user_id {
            Ok(())
        } else {
            Err(AuthError::Unauthorized {
                action: action.to_string(),
                required_role: String::from("creator"),
            })
        }
    }
}

/// Loads an organization or reports it as not found.
pub(crate) fn load_organization(
    persistence: &mut SqlitePersistence,
    organization_id: i64,
) -> Result<Organization, ApiError> {
    persistence
        .get_organization(organization_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| {
            ApiError::not_found(
                "Organization",
                format!("Organization {organization_id} does not exist"),
            )
        })
}
