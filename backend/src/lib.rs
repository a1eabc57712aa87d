//! # Budget Backend
//!
//! REST backend for a personal budget: months, expenses, incomes, labels and
//! summaries persisted in SQLite, with user accounts and database backups.
//!
//! ## Architecture
//!
//! ```text
//! Clients (web, TUI)
//!     ↓
//! IO Layer (axum handlers, auth, DTO mappers)
//!     ↓
//! Domain Layer (services, business rules)
//!     ↓
//! Storage Layer (SQLite repositories)
//! ```

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::FromRef,
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{ApiSettings, Config, Environment};
use crate::domain::models::label::LabelKind;
use crate::domain::{
    BackupService, ExpenseService, IncomeService, LabelService, MonthService, SeedService,
    SummaryService, TokenService, UserService,
};
use crate::io::rest::{
    self, auth_apis, backup_apis, expense_apis, health_apis, income_apis, label_apis, month_apis,
    summary_apis,
};
use crate::storage::DbConnection;

/// Services and settings shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub month_service: MonthService<DbConnection>,
    pub expense_service: ExpenseService<DbConnection>,
    pub income_service: IncomeService<DbConnection>,
    pub category_service: LabelService<DbConnection>,
    pub period_service: LabelService<DbConnection>,
    pub income_type_service: LabelService<DbConnection>,
    pub summary_service: SummaryService<DbConnection>,
    pub seed_service: SeedService<DbConnection>,
    pub user_service: UserService<DbConnection>,
    pub backup_service: BackupService<DbConnection>,
    pub token_service: TokenService,
    pub settings: Arc<ApiSettings>,
}

impl AppState {
    /// Wire every service onto one database connection
    pub fn new(db_conn: DbConnection, settings: ApiSettings) -> Self {
        let connection = Arc::new(db_conn);
        let month_service = MonthService::new(connection.clone());

        Self {
            expense_service: ExpenseService::new(connection.clone(), month_service.clone()),
            income_service: IncomeService::new(connection.clone(), month_service.clone()),
            category_service: LabelService::new(connection.clone(), LabelKind::Category),
            period_service: LabelService::new(connection.clone(), LabelKind::Period),
            income_type_service: LabelService::new(connection.clone(), LabelKind::IncomeType),
            summary_service: SummaryService::new(connection.clone()),
            seed_service: SeedService::new(connection.clone(), month_service.clone()),
            user_service: UserService::new(connection.clone()),
            backup_service: BackupService::new(connection, settings.backup_dir.clone()),
            token_service: TokenService::new(&settings.jwt_secret),
            month_service,
            settings: Arc::new(settings),
        }
    }

    /// The label service for `kind`
    pub fn labels(&self, kind: LabelKind) -> &LabelService<DbConnection> {
        match kind {
            LabelKind::Category => &self.category_service,
            LabelKind::Period => &self.period_service,
            LabelKind::IncomeType => &self.income_type_service,
        }
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.token_service.clone()
    }
}

/// Open the database, optionally seed it, and build the application state
pub async fn initialize_backend(config: &Config) -> Result<AppState> {
    info!("Setting up database at {}", config.database_url);
    let db_conn = DbConnection::new(&config.database_url).await?;

    info!("Setting up application state");
    let app_state = AppState::new(db_conn, ApiSettings::from(config));

    if config.api_key.is_none() {
        warn!("No API key configured; authenticated routes will answer 500");
    }

    if config.seed {
        let report = app_state.seed_service.seed_all().await?;
        info!("Seeding finished: {:?}", report);
    }

    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        let admin = app_state.user_service.ensure_admin(email, password).await?;
        info!("Administrator account {} ready (ID {})", admin.email, admin.id);
    }

    Ok(app_state)
}

fn cors_layer(environment: Environment) -> CorsLayer {
    let origins = match environment {
        Environment::Development => {
            AllowOrigin::list(Config::DEV_ORIGINS.into_iter().map(HeaderValue::from_static))
        }
        Environment::Production => AllowOrigin::from(Any),
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}

/// Create the axum router with every route configured
pub fn create_router(app_state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/months", get(month_apis::list_months).post(month_apis::create_month))
        .route("/months/current", get(month_apis::get_current_month))
        .route(
            "/months/year/:year/month/:month",
            get(month_apis::get_month_by_year_month),
        )
        .route(
            "/months/:id",
            get(month_apis::get_month)
                .put(month_apis::update_month)
                .delete(month_apis::delete_month),
        )
        .route("/months/:id/close", post(month_apis::close_month))
        .route("/months/:id/open", post(month_apis::open_month))
        .route(
            "/expenses",
            get(expense_apis::list_expenses).post(expense_apis::create_expense),
        )
        .route("/expenses/reorder", post(expense_apis::reorder_expenses))
        .route(
            "/expenses/clone-to-next-month/:month_id",
            post(expense_apis::clone_to_next_month),
        )
        .route(
            "/expenses/:id",
            get(expense_apis::get_expense)
                .put(expense_apis::update_expense)
                .delete(expense_apis::delete_expense),
        )
        .route("/expenses/:id/pay", post(expense_apis::pay_expense))
        .route(
            "/incomes",
            get(income_apis::list_incomes).post(income_apis::create_income),
        )
        .route(
            "/incomes/:id",
            get(income_apis::get_income)
                .put(income_apis::update_income)
                .delete(income_apis::delete_income),
        )
        .nest(
            "/categories",
            label_apis::label_routes(LabelKind::Category)
                .route("/summary", get(summary_apis::get_category_summary)),
        )
        .nest("/periods", label_apis::label_routes(LabelKind::Period))
        .nest(
            "/income-types",
            label_apis::label_routes(LabelKind::IncomeType)
                .route("/summary", get(summary_apis::get_income_type_summary)),
        )
        .route("/summary/totals", get(summary_apis::get_totals))
        .route("/summary/by-period", get(summary_apis::get_by_period))
        .route("/summary/monthly-trends", get(summary_apis::get_monthly_trends))
        .route("/auth/register", post(auth_apis::register))
        .route("/auth/login", post(auth_apis::login))
        .route("/auth/forgot-password", post(auth_apis::forgot_password))
        .route("/auth/reset-password", post(auth_apis::reset_password))
        .route("/auth/me", get(auth_apis::me))
        .route("/auth/change-password", post(auth_apis::change_password))
        .route(
            "/auth/users",
            get(auth_apis::list_users).post(auth_apis::create_user),
        )
        .route(
            "/auth/users/:id",
            get(auth_apis::get_user)
                .put(auth_apis::update_user)
                .delete(auth_apis::delete_user),
        )
        .route(
            "/auth/users/:id/generate-reset-link",
            post(auth_apis::generate_reset_link),
        )
        .route("/auth/password-resets", get(auth_apis::list_password_resets))
        .route("/backups", get(backup_apis::list_backups))
        .route("/backups/create", post(backup_apis::create_backup))
        .route(
            "/backups/:filename/download-url",
            get(backup_apis::get_download_url),
        )
        .route("/backups/:filename", delete(backup_apis::delete_backup))
        .route_layer(middleware::from_fn_with_state(
            app_state.settings.clone(),
            rest::require_api_key,
        ));

    // Signed download links carry their own authorization
    let api_routes = Router::new()
        .route("/health", get(health_apis::health))
        .route(
            "/backups/:filename/download",
            get(backup_apis::download_backup),
        )
        .merge(protected_routes);

    Router::new()
        .route("/", get(health_apis::root))
        .nest("/api/v1", api_routes)
        .fallback(health_apis::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(app_state.settings.environment))
        .with_state(app_state)
}
