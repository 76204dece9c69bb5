// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Invitation links and the delivery boundary.
//!
//! Building an invitation is pure. Delivering it is delegated to an
//! `InvitationSender`, which the server chooses at startup.

use thiserror::Error;
use tracing::info;
use url::Url;

/// Invitation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvitationError {
    /// The application URL cannot carry a path.
    #[error("Application URL '{0}' cannot be used as a link base")]
    InvalidBaseUrl(String),

    /// The sender could not deliver the invitation.
    #[error("Failed to deliver invitation to {email}: {reason}")]
    DeliveryFailed { email: String, reason: String },
}

/// Where an invitation link sends its recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTarget {
    /// The recipient is already registered.
    SignIn,
    /// The recipient still has to register.
    SignUp,
}

impl RedirectTarget {
    /// Picks the target for a recipient.
    #[must_use]
    pub const fn for_registered(is_registered: bool) -> Self {
        if is_registered {
            Self::SignIn
        } else {
            Self::SignUp
        }
    }

    /// Returns the link path segment.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::SignIn => "sign-in",
            Self::SignUp => "sign-up",
        }
    }
}

/// A ready-to-deliver invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    /// Recipient address.
    pub email: String,
    /// Recipient display name.
    pub name: String,
    /// Where the link leads.
    pub target: RedirectTarget,
    /// The full link.
    pub link: Url,
    /// Message subject.
    pub subject: String,
    /// Plain-text message body.
    pub body: String,
}

/// Context shared by every invitation in one request.
#[derive(Debug, Clone, Copy)]
pub struct InvitationContext<'a> {
    /// Base URL of the client application.
    pub app_url: &'a Url,
    /// The inviting organization.
    pub organization_id: i64,
    /// The organization's display name.
    pub organization_name: &'a str,
    /// Optional department the recipient joins.
    pub department: Option<(i64, &'a str)>,
}

/// Delivers invitations.
pub trait InvitationSender: Send + Sync {
    /// Delivers one invitation.
    ///
    /// # Errors
    ///
    /// Returns `InvitationError::DeliveryFailed` if delivery fails.
    fn send(&self, invitation: &Invitation) -> Result<(), InvitationError>;
}

/// A sender that records invitations in the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogInvitationSender;

impl InvitationSender for LogInvitationSender {
    fn send(&self, invitation: &Invitation) -> Result<(), InvitationError> {
        info!(
            email = %invitation.email,
            target = invitation.target.path(),
            link = %invitation.link,
            "Invitation issued"
        );
        Ok(())
    }
}

/// Builds the link for one recipient.
///
/// The link is `{app_url}/{target}?email=..&name=..&organizationId=..`
/// with `departmentId` appended when a department is given.
///
/// # Errors
///
/// Returns `InvitationError::InvalidBaseUrl` if `app_url` cannot be a base.
pub fn invitation_link(
    app_url: &Url,
    target: RedirectTarget,
    email: &str,
    name: &str,
    organization_id: i64,
    department_id: Option<i64>,
) -> Result<Url, InvitationError> {
    let mut link: Url = app_url.clone();
    link.set_query(None);
    link.set_fragment(None);

    link.path_segments_mut()
        .map_err(|()| InvitationError::InvalidBaseUrl(app_url.to_string()))?
        .pop_if_empty()
        .push(target.path());

    {
        let mut query = link.query_pairs_mut();
        query
            .append_pair("email", email)
            .append_pair("name", name)
            .append_pair("organizationId", &organization_id.to_string());
        if let Some(department_id) = department_id {
            query.append_pair("departmentId", &department_id.to_string());
        }
    }

    Ok(link)
}

/// Builds the invitation for one recipient.
///
/// # Errors
///
/// Returns `InvitationError::InvalidBaseUrl` if the link cannot be built.
pub fn build_invitation(
    context: &InvitationContext<'_>,
    email: &str,
    name: &str,
    is_registered: bool,
) -> Result<Invitation, InvitationError> {
    let target: RedirectTarget = RedirectTarget::for_registered(is_registered);
    let link: Url = invitation_link(
        context.app_url,
        target,
        email,
        name,
        context.organization_id,
        context.department.map(|(id, _)| id),
    )?;

    let destination: String = match context.department {
        Some((_, department_name)) => format!(
            "{} in the {department_name} department",
            context.organization_name
        ),
        None => context.organization_name.to_string(),
    };

    let (subject, body): (String, String) = match target {
        RedirectTarget::SignIn => (
            format!("Sign in to join {}", context.organization_name),
            format!("Sign in to join {destination}: {link}"),
        ),
        RedirectTarget::SignUp => (
            String::from("Complete your registration"),
            format!("Accept the invitation to join {destination}! {link}"),
        ),
    };

    Ok(Invitation {
        email: email.to_string(),
        name: name.to_string(),
        target,
        link,
        subject,
        body,
    })
}
