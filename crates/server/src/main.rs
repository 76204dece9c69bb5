// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod identity;
mod live;

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use clap::Parser;
use orgvote_api::{
    ApiError, BallotResponse, CreateDepartmentRequest, CreateOrganizationRequest,
    CreateVoteRequest, DeleteDepartmentRequest, DeleteDepartmentResponse, DepartmentInfo,
    InvitationSender, ListDepartmentsResponse, ListMembershipsResponse,
    ListOrganizationsResponse, ListVotersResponse, ListVotesResponse, LogInvitationSender,
    OrganizationInfo, RegisterMemberRequest, RegisterMemberResponse, SendInvitationsRequest,
    SendInvitationsResponse, SetSloganRequest, SetSloganResponse, SubmitBallotRequest,
    UpdateDepartmentRequest, UpdateVoteRequest, UpdateVoterRequest, ValidateEmailRequest,
    ValidateEmailResponse, VoteInfo, VoteResultsResponse, VoterInfo,
};
use orgvote_persistence::SqlitePersistence;
use serde::{Deserialize, Serialize};
use std::{net::IpAddr, sync::Arc};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{info, warn};
use url::Url;

use crate::identity::Identity;
use crate::live::{LiveEvent, LiveEventBroadcaster, live_events_handler};

/// Organization voting server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Address to bind the server to
    #[arg(short, long, default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Base URL of the client application, used in invitation links
    #[arg(long, default_value = "http://localhost:3000")]
    app_url: Url,
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    /// Serializes access to the single database connection.
    persistence: Arc<Mutex<SqlitePersistence>>,
    live: LiveEventBroadcaster,
    app_url: Url,
    sender: Arc<dyn InvitationSender>,
}

#[derive(Debug, Deserialize)]
struct OrganizationQuery {
    organization_id: i64,
}

/// Response for writes that return no resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WriteResponse {
    success: bool,
    message: String,
}

impl WriteResponse {
    fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
        })
    }
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Stable machine-readable error kind.
    kind: String,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            kind: self.kind.to_string(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match err {
            ApiError::InvalidInput { .. }
            | ApiError::VoteClosed { .. }
            | ApiError::InvalidCandidate { .. } => StatusCode::BAD_REQUEST,
            ApiError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } | ApiError::AlreadyVoted { .. } => StatusCode::CONFLICT,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(error = %err, "Request failed");
        }
        Self {
            status,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

// ============================================================================
// Members
// ============================================================================

/// Handler for POST `/register`.
async fn handle_register(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<RegisterMemberRequest>,
) -> Result<Json<RegisterMemberResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: RegisterMemberResponse =
        orgvote_api::register_member(&mut persistence, &req, now())?;
    drop(persistence);

    if let Some(organization_id) = response.organization_id {
        app_state
            .live
            .broadcast(LiveEvent::MembershipChanged { organization_id });
    }
    Ok(Json(response))
}

/// Handler for POST `/validate-email`.
async fn handle_validate_email(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<ValidateEmailRequest>,
) -> Result<Json<ValidateEmailResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(orgvote_api::validate_email(&mut persistence, &req)?))
}

async fn handle_list_voters(
    AxumState(app_state): AxumState<AppState>,
    Identity(identity): Identity,
    Path(organization_id): Path<i64>,
) -> Result<Json<ListVotersResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(orgvote_api::list_voters(
        &mut persistence,
        &identity,
        organization_id,
    )?))
}

async fn handle_update_voter(
    AxumState(app_state): AxumState<AppState>,
    Identity(identity): Identity,
    Path((organization_id, user_id)): Path<(i64, i64)>,
    Json(req): Json<UpdateVoterRequest>,
) -> Result<Json<VoterInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let voter: VoterInfo =
        orgvote_api::update_voter(&mut persistence, &identity, organization_id, user_id, req)?;
    drop(persistence);

    app_state
        .live
        .broadcast(LiveEvent::MembershipChanged { organization_id });
    Ok(Json(voter))
}

async fn handle_remove_voter(
    AxumState(app_state): AxumState<AppState>,
    Identity(identity): Identity,
    Path((organization_id, user_id)): Path<(i64, i64)>,
) -> Result<Json<WriteResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    orgvote_api::remove_voter(&mut persistence, &identity, organization_id, user_id)?;
    drop(persistence);

    app_state
        .live
        .broadcast(LiveEvent::MembershipChanged { organization_id });
    Ok(WriteResponse::ok(format!(
        "Removed user {user_id} from organization {organization_id}"
    )))
}

/// Handler for POST `/organizations/{id}/invitations`.
async fn handle_send_invitations(
    AxumState(app_state): AxumState<AppState>,
    Identity(identity): Identity,
    Path(organization_id): Path<i64>,
    Json(req): Json<SendInvitationsRequest>,
) -> Result<Json<SendInvitationsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: SendInvitationsResponse = orgvote_api::send_invitations(
        &mut persistence,
        &identity,
        organization_id,
        &req,
        &app_state.app_url,
        app_state.sender.as_ref(),
    )?;
    drop(persistence);

    if req.department_id.is_some() {
        app_state
            .live
            .broadcast(LiveEvent::MembershipChanged { organization_id });
    }
    Ok(Json(response))
}

// ============================================================================
// Organizations
// ============================================================================

async fn handle_create_organization(
    AxumState(app_state): AxumState<AppState>,
    Identity(identity): Identity,
    Json(req): Json<CreateOrganizationRequest>,
) -> Result<Json<OrganizationInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(orgvote_api::create_organization(
        &mut persistence,
        &identity,
        &req,
        now(),
    )?))
}

async fn handle_list_organizations(
    AxumState(app_state): AxumState<AppState>,
    Identity(identity): Identity,
) -> Result<Json<ListOrganizationsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(orgvote_api::list_created_organizations(
        &mut persistence,
        &identity,
    )?))
}

async fn handle_delete_organization(
    AxumState(app_state): AxumState<AppState>,
    Identity(identity): Identity,
    Path(organization_id): Path<i64>,
) -> Result<Json<WriteResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    orgvote_api::delete_organization(&mut persistence, &identity, organization_id)?;
    Ok(WriteResponse::ok(format!(
        "Deleted organization {organization_id}"
    )))
}

async fn handle_list_memberships(
    AxumState(app_state): AxumState<AppState>,
    Identity(identity): Identity,
) -> Result<Json<ListMembershipsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(orgvote_api::list_memberships(
        &mut persistence,
        &identity,
    )?))
}

// ============================================================================
// Departments
// ============================================================================

async fn handle_create_department(
    AxumState(app_state): AxumState<AppState>,
    Identity(identity): Identity,
    Json(req): Json<CreateDepartmentRequest>,
) -> Result<Json<DepartmentInfo>, HttpError> {
    let organization_id: i64 = req.organization_id;
    let mut persistence = app_state.persistence.lock().await;
    let department: DepartmentInfo =
        orgvote_api::create_department(&mut persistence, &identity, req, now())?;
    drop(persistence);

    app_state
        .live
        .broadcast(LiveEvent::DepartmentsChanged { organization_id });
    Ok(Json(department))
}

async fn handle_list_departments(
    AxumState(app_state): AxumState<AppState>,
    Identity(identity): Identity,
    Query(query): Query<OrganizationQuery>,
) -> Result<Json<ListDepartmentsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(orgvote_api::list_departments(
        &mut persistence,
        &identity,
        query.organization_id,
    )?))
}

async fn handle_update_department(
    AxumState(app_state): AxumState<AppState>,
    Identity(identity): Identity,
    Path(department_id): Path<i64>,
    Json(req): Json<UpdateDepartmentRequest>,
) -> Result<Json<DepartmentInfo>, HttpError> {
    let organization_id: i64 = req.organization_id;
    let mut persistence = app_state.persistence.lock().await;
    let department: DepartmentInfo =
        orgvote_api::update_department(&mut persistence, &identity, department_id, req, now())?;
    drop(persistence);

    app_state
        .live
        .broadcast(LiveEvent::DepartmentsChanged { organization_id });
    Ok(Json(department))
}

/// Handler for DELETE `/departments/{id}`.
///
/// Deletes the department with its descendants and any votes scoped to them.
async fn handle_delete_department(
    AxumState(app_state): AxumState<AppState>,
    Identity(identity): Identity,
    Path(department_id): Path<i64>,
    Json(req): Json<DeleteDepartmentRequest>,
) -> Result<Json<DeleteDepartmentResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: DeleteDepartmentResponse =
        orgvote_api::delete_department(&mut persistence, &identity, department_id, &req, now())?;
    drop(persistence);

    info!(
        department_id,
        deleted = response.deleted_ids.len(),
        "Deleted department subtree"
    );
    app_state.live.broadcast(LiveEvent::DepartmentsChanged {
        organization_id: req.organization_id,
    });
    Ok(Json(response))
}

// ============================================================================
// Votes
// ============================================================================

async fn handle_create_vote(
    AxumState(app_state): AxumState<AppState>,
    Identity(identity): Identity,
    Json(req): Json<CreateVoteRequest>,
) -> Result<Json<VoteInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let vote: VoteInfo = orgvote_api::create_vote(&mut persistence, &identity, req, now())?;
    drop(persistence);

    app_state.live.broadcast(LiveEvent::VoteCreated {
        organization_id: vote.organization_id,
        vote_id: vote.vote_id,
    });
    Ok(Json(vote))
}

async fn handle_list_votes(
    AxumState(app_state): AxumState<AppState>,
    Identity(identity): Identity,
    Query(query): Query<OrganizationQuery>,
) -> Result<Json<ListVotesResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(orgvote_api::list_votes(
        &mut persistence,
        &identity,
        query.organization_id,
        now(),
    )?))
}

async fn handle_get_vote(
    AxumState(app_state): AxumState<AppState>,
    Identity(identity): Identity,
    Path(vote_id): Path<i64>,
) -> Result<Json<VoteInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(orgvote_api::get_vote(
        &mut persistence,
        &identity,
        vote_id,
        now(),
    )?))
}

async fn handle_update_vote(
    AxumState(app_state): AxumState<AppState>,
    Identity(identity): Identity,
    Path(vote_id): Path<i64>,
    Json(req): Json<UpdateVoteRequest>,
) -> Result<Json<VoteInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let vote: VoteInfo = orgvote_api::update_vote(&mut persistence, &identity, vote_id, req, now())?;
    drop(persistence);

    app_state.live.broadcast(LiveEvent::VoteUpdated {
        organization_id: vote.organization_id,
        vote_id,
    });
    Ok(Json(vote))
}

async fn handle_delete_vote(
    AxumState(app_state): AxumState<AppState>,
    Identity(identity): Identity,
    Path(vote_id): Path<i64>,
    Query(query): Query<OrganizationQuery>,
) -> Result<Json<WriteResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    orgvote_api::delete_vote(&mut persistence, &identity, vote_id, query.organization_id)?;
    drop(persistence);

    app_state.live.broadcast(LiveEvent::VoteDeleted {
        organization_id: query.organization_id,
        vote_id,
    });
    Ok(WriteResponse::ok(format!("Deleted vote {vote_id}")))
}

/// Handler for POST `/votes/{id}/ballots`.
async fn handle_submit_ballot(
    AxumState(app_state): AxumState<AppState>,
    Identity(identity): Identity,
    Path(vote_id): Path<i64>,
    Json(req): Json<SubmitBallotRequest>,
) -> Result<Json<BallotResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let ballot: BallotResponse =
        orgvote_api::submit_ballot(&mut persistence, &identity, vote_id, req, now())?;
    let organization_id: Option<i64> = persistence
        .get_vote(vote_id)
        .ok()
        .flatten()
        .map(|vote| vote.organization_id);
    drop(persistence);

    if let Some(organization_id) = organization_id {
        app_state.live.broadcast(LiveEvent::BallotCast {
            organization_id,
            vote_id,
            total_votes: ballot.total_votes,
        });
    }
    Ok(Json(ballot))
}

async fn handle_get_results(
    AxumState(app_state): AxumState<AppState>,
    Identity(identity): Identity,
    Path(vote_id): Path<i64>,
) -> Result<Json<VoteResultsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(orgvote_api::get_results(
        &mut persistence,
        &identity,
        vote_id,
        now(),
    )?))
}

async fn handle_set_slogan(
    AxumState(app_state): AxumState<AppState>,
    Identity(identity): Identity,
    Path(vote_id): Path<i64>,
    Json(req): Json<SetSloganRequest>,
) -> Result<Json<SetSloganResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(orgvote_api::set_slogan(
        &mut persistence,
        &identity,
        vote_id,
        &req,
    )?))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/register", post(handle_register))
        .route("/validate-email", post(handle_validate_email))
        .route(
            "/organizations",
            post(handle_create_organization).get(handle_list_organizations),
        )
        .route(
            "/organizations/{id}",
            axum::routing::delete(handle_delete_organization),
        )
        .route("/organizations/{id}/voters", get(handle_list_voters))
        .route(
            "/organizations/{id}/voters/{user_id}",
            put(handle_update_voter).delete(handle_remove_voter),
        )
        .route(
            "/organizations/{id}/invitations",
            post(handle_send_invitations),
        )
        .route("/memberships", get(handle_list_memberships))
        .route(
            "/departments",
            post(handle_create_department).get(handle_list_departments),
        )
        .route(
            "/departments/{id}",
            put(handle_update_department).delete(handle_delete_department),
        )
        .route("/votes", post(handle_create_vote).get(handle_list_votes))
        .route(
            "/votes/{id}",
            get(handle_get_vote)
                .put(handle_update_vote)
                .delete(handle_delete_vote),
        )
        .route("/votes/{id}/ballots", post(handle_submit_ballot))
        .route("/votes/{id}/results", get(handle_get_results))
        .route("/votes/{id}/slogan", put(handle_set_slogan))
        .route("/live", get(live_events_handler))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing organization voting server");

    let persistence: SqlitePersistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        SqlitePersistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        SqlitePersistence::new_in_memory()?
    };

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        live: LiveEventBroadcaster::new(),
        app_url: args.app_url,
        sender: Arc::new(LogInvitationSender),
    };

    let app: Router = build_router(app_state);

    let addr: std::net::SocketAddr = std::net::SocketAddr::new(args.bind, args.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests;
