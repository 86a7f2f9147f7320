//! # API Endpoint Handlers
//!
//! HTTP endpoint handlers. Each handler validates at the boundary, takes
//! the desk lock, delegates to the core, and maps `CreditoError` onto an
//! HTTP status with a JSON `{ success, error }` body.

use super::{
    AppState,
    auth::UserContext,
    types::{
        CompaniesResponse, CompanyResponse, EnquadramentoRequest, EnquadramentoResponse,
        HealthResponse, KpisResponse, LoginRequest, LoginResponse, MoveStageRequest, OpResponse,
        PddRequest, PddResponse, PendenciaUpdateRequest, PendenciasResponse, ProgressResponse,
        RegisterRequest, TransitionResponse, UpdateRequest,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use credito_core::{
    Company, CreditoError, WorkflowStage, build_pivot, build_report, parse_optional_date,
};
use serde::Deserialize;
use std::collections::BTreeSet;

/// Map a core error onto an HTTP status.
fn error_status(err: &CreditoError) -> StatusCode {
    match err {
        CreditoError::CompanyNotFound(_) | CreditoError::DocumentNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        CreditoError::CompanyExists(_) => StatusCode::CONFLICT,
        CreditoError::InvalidDate(_)
        | CreditoError::InvalidStage(_)
        | CreditoError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        CreditoError::SerializationError(_) | CreditoError::IoError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Agent filter query for list endpoints. Comercial callers are always
/// restricted to their own agent regardless of this parameter.
#[derive(Debug, Deserialize)]
pub struct AgentQuery {
    pub agente: Option<String>,
}

/// Effective agent scope for a caller: their own for comercial, the query
/// filter (if any) for analysts.
fn effective_scope<'a>(context: &'a UserContext, query: &'a AgentQuery) -> Option<&'a str> {
    context.agent_scope().or(query.agente.as_deref())
}

/// Whether the caller may see this company. Comercial users are limited to
/// their own portfolio; a company outside it reads as absent, never as
/// forbidden, so names cannot be probed.
fn visible_to(context: &UserContext, company: &Company) -> bool {
    match context.agent_scope() {
        Some(scope) => company.agente == scope,
        None => true,
    }
}

fn not_found(empresa: String) -> CreditoError {
    CreditoError::CompanyNotFound(empresa)
}

// =============================================================================
// HEALTH / AUTH HANDLERS
// =============================================================================

/// Health check endpoint (unauthenticated).
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Login endpoint.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> impl IntoResponse {
    match state.auth.login(&request.username, &request.password) {
        Some((token, context)) => {
            let role = match context.role {
                crate::config::UserRole::Comercial => "comercial",
                crate::config::UserRole::Analista => "analista",
            };
            (
                StatusCode::OK,
                Json(LoginResponse::success(token, role, context.agente)),
            )
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(LoginResponse::error("Usuário ou senha inválidos")),
        ),
    }
}

/// Logout endpoint: drops the caller's bearer token.
pub async fn logout_handler(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> impl IntoResponse {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v));
    if let Some(token) = token {
        state.auth.logout(token);
    }
    (StatusCode::OK, Json(OpResponse::success()))
}

// =============================================================================
// KPI HANDLER
// =============================================================================

/// Desk KPIs, scoped to the caller's agent for comercial users.
pub async fn kpis_handler(
    State(state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Query(query): Query<AgentQuery>,
) -> impl IntoResponse {
    let desk = state.desk.read().await;
    match desk.kpis(effective_scope(&context, &query)) {
        Ok(kpis) => (StatusCode::OK, Json(KpisResponse::success(kpis))),
        Err(e) => (error_status(&e), Json(KpisResponse::error(e.to_string()))),
    }
}

// =============================================================================
// COMPANY HANDLERS
// =============================================================================

/// List companies visible to the caller.
pub async fn list_companies_handler(
    State(state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Query(query): Query<AgentQuery>,
) -> impl IntoResponse {
    let desk = state.desk.read().await;
    match desk.companies(effective_scope(&context, &query)) {
        Ok(companies) => (StatusCode::OK, Json(CompaniesResponse::success(companies))),
        Err(e) => (
            error_status(&e),
            Json(CompaniesResponse::error(e.to_string())),
        ),
    }
}

/// Fetch one company visible to the caller.
pub async fn get_company_handler(
    State(state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Path(empresa): Path<String>,
) -> impl IntoResponse {
    let desk = state.desk.read().await;
    match desk.company(&empresa) {
        Ok(company) if visible_to(&context, &company) => {
            (StatusCode::OK, Json(CompanyResponse::success(company)))
        }
        Ok(_) => (
            StatusCode::NOT_FOUND,
            Json(CompanyResponse::error(not_found(empresa).to_string())),
        ),
        Err(e) => (error_status(&e), Json(CompanyResponse::error(e.to_string()))),
    }
}

/// Register a company. Comercial callers always register under their own
/// agent name; analysts must name the agent.
pub async fn register_company_handler(
    State(state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Json(request): Json<RegisterRequest>,
) -> impl IntoResponse {
    let agente = match context.agent_scope() {
        Some(own) => own.to_string(),
        None => match request.agente.as_deref().map(str::trim) {
            Some(a) if !a.is_empty() => a.to_string(),
            _ => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(CompanyResponse::error("Informe o agente responsável.")),
                );
            }
        },
    };

    let entrada = match parse_optional_date(&request.entrada) {
        Ok(Some(date)) => date,
        Ok(None) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(CompanyResponse::error("Informe a data de entrada.")),
            );
        }
        Err(e) => return (error_status(&e), Json(CompanyResponse::error(e.to_string()))),
    };

    let mut desk = state.desk.write().await;
    match desk.register_company(&request.empresa, &agente, entrada, Utc::now()) {
        Ok(company) => {
            tracing::info!(empresa = %company.empresa, agente = %company.agente, "Company registered");
            (StatusCode::CREATED, Json(CompanyResponse::success(company)))
        }
        Err(e) => (error_status(&e), Json(CompanyResponse::error(e.to_string()))),
    }
}

/// Apply a partial update to a company (analyst only).
pub async fn update_company_handler(
    State(state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Path(empresa): Path<String>,
    Json(request): Json<UpdateRequest>,
) -> impl IntoResponse {
    if !context.role.is_analista() {
        return (
            StatusCode::FORBIDDEN,
            Json(CompanyResponse::error("Apenas analistas podem editar.")),
        );
    }

    let update = match request.to_update() {
        Ok(u) => u,
        Err(e) => return (error_status(&e), Json(CompanyResponse::error(e.to_string()))),
    };

    let mut desk = state.desk.write().await;
    match desk.update_company(&empresa, &update) {
        Ok(company) => (StatusCode::OK, Json(CompanyResponse::success(company))),
        Err(e) => (error_status(&e), Json(CompanyResponse::error(e.to_string()))),
    }
}

/// Delete a company and everything attached to it (analyst only).
pub async fn delete_company_handler(
    State(state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Path(empresa): Path<String>,
) -> impl IntoResponse {
    if !context.role.is_analista() {
        return (
            StatusCode::FORBIDDEN,
            Json(OpResponse::error("Apenas analistas podem excluir.")),
        );
    }

    let mut desk = state.desk.write().await;
    match desk.delete_company(&empresa) {
        Ok(()) => {
            tracing::info!(empresa = %empresa, "Company deleted");
            (StatusCode::OK, Json(OpResponse::success()))
        }
        Err(e) => (error_status(&e), Json(OpResponse::error(e.to_string()))),
    }
}

// =============================================================================
// PENDENCIA HANDLERS
// =============================================================================

/// Pendência filter query.
#[derive(Debug, Deserialize)]
pub struct PendenciaQuery {
    /// Restrict to still-pending rows. Forced on for comercial callers.
    #[serde(default)]
    pub pendentes: bool,
}

/// List a company's pendência rows, seeding gaps against the directory.
pub async fn list_pendencias_handler(
    State(state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Path(empresa): Path<String>,
    Query(query): Query<PendenciaQuery>,
) -> impl IntoResponse {
    let only_pending = query.pendentes || !context.role.is_analista();

    let mut desk = state.desk.write().await;
    match desk.company(&empresa) {
        Ok(company) if visible_to(&context, &company) => {}
        Ok(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(PendenciasResponse::error(not_found(empresa).to_string())),
            );
        }
        Err(e) => {
            return (
                error_status(&e),
                Json(PendenciasResponse::error(e.to_string())),
            );
        }
    }
    match desk.pendencias(&empresa, only_pending, Utc::now()) {
        Ok(docs) => (StatusCode::OK, Json(PendenciasResponse::success(docs))),
        Err(e) => (
            error_status(&e),
            Json(PendenciasResponse::error(e.to_string())),
        ),
    }
}

/// Batch pendência status update (analyst only).
pub async fn update_pendencias_handler(
    State(state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Path(empresa): Path<String>,
    Json(request): Json<PendenciaUpdateRequest>,
) -> impl IntoResponse {
    if !context.role.is_analista() {
        return (
            StatusCode::FORBIDDEN,
            Json(OpResponse::error(
                "Apenas analistas podem atualizar pendências.",
            )),
        );
    }

    let updates = request.to_updates();
    let mut desk = state.desk.write().await;
    match desk.set_pendencia_status(&empresa, &updates, Utc::now()) {
        Ok(changed) => (StatusCode::OK, Json(OpResponse::changed(changed))),
        Err(e) => (error_status(&e), Json(OpResponse::error(e.to_string()))),
    }
}

// =============================================================================
// WORKFLOW HANDLERS
// =============================================================================

/// Move a company to a workflow stage (analyst only).
pub async fn move_stage_handler(
    State(state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Path(empresa): Path<String>,
    Json(request): Json<MoveStageRequest>,
) -> impl IntoResponse {
    if !context.role.is_analista() {
        return (
            StatusCode::FORBIDDEN,
            Json(TransitionResponse::error(
                "Apenas analistas podem mover etapas.",
            )),
        );
    }

    let etapa = match WorkflowStage::parse(&request.etapa) {
        Ok(e) => e,
        Err(e) => {
            return (
                error_status(&e),
                Json(TransitionResponse::error(e.to_string())),
            );
        }
    };

    let mut desk = state.desk.write().await;
    match desk.move_stage(
        &empresa,
        etapa,
        &request.responsavel,
        request.deadline_days(),
        Utc::now(),
    ) {
        Ok(entry) => {
            tracing::info!(empresa = %empresa, etapa = %etapa, "Stage moved");
            (StatusCode::OK, Json(TransitionResponse::success(entry)))
        }
        Err(e) => (
            error_status(&e),
            Json(TransitionResponse::error(e.to_string())),
        ),
    }
}

/// Deadline-progress report for a company visible to the caller.
pub async fn progress_handler(
    State(state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Path(empresa): Path<String>,
) -> impl IntoResponse {
    let desk = state.desk.read().await;
    match desk.company(&empresa) {
        Ok(company) if visible_to(&context, &company) => {}
        Ok(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ProgressResponse::error(not_found(empresa).to_string())),
            );
        }
        Err(e) => {
            return (
                error_status(&e),
                Json(ProgressResponse::error(e.to_string())),
            );
        }
    }
    match desk.stage_report(&empresa, Utc::now()) {
        Ok(report) => (StatusCode::OK, Json(ProgressResponse::success(report))),
        Err(e) => (
            error_status(&e),
            Json(ProgressResponse::error(e.to_string())),
        ),
    }
}

// =============================================================================
// REPORT HANDLERS
// =============================================================================

/// Enquadramento report for a fund over the posted positions.
pub async fn enquadramento_handler(
    State(state): State<AppState>,
    Json(request): Json<EnquadramentoRequest>,
) -> impl IntoResponse {
    let Some(limits) = state.funds.get(&request.fundo.trim().to_lowercase()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(EnquadramentoResponse::error(format!(
                "Fundo desconhecido: {}",
                request.fundo
            ))),
        );
    };

    let (positions, pl) = request.to_positions();
    let reassigned: BTreeSet<String> = credito_core::DEFAULT_REASSIGNED_CEDENTES
        .iter()
        .map(|s| (*s).to_string())
        .collect();

    match build_report(&positions, pl, limits, &reassigned) {
        Ok(report) => (StatusCode::OK, Json(EnquadramentoResponse::success(report))),
        Err(e) => (
            error_status(&e),
            Json(EnquadramentoResponse::error(e.to_string())),
        ),
    }
}

/// PDD pivot over the posted entries.
pub async fn pdd_handler(Json(request): Json<PddRequest>) -> impl IntoResponse {
    match request.to_entries() {
        Ok(entries) => (StatusCode::OK, Json(PddResponse::success(build_pivot(&entries)))),
        Err(e) => (error_status(&e), Json(PddResponse::error(e.to_string()))),
    }
}
