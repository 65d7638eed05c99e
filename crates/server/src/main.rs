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
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod session;

use axum::{
    Json, Router,
    extract::State as AxumState,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use localmarket_api::{
    ApiConfig, ApiError, AuthenticatedUser, Integrations, PasswordPolicy, all_services_info,
    create_command, create_commerce, create_panier, create_product, create_products, create_user,
    get_command, get_commerce, get_commerce_command, get_panier, get_product, get_user,
    list_cc_commands, list_commands, list_commerce_commands, list_commerces, list_paniers,
    list_panier_commands, list_products, list_users, login, logout, payment_methods,
    run_banking_transfers, run_billing, service_info, update_commerce, update_commerce_command,
    update_panier, update_product, update_products, update_user,
};
use localmarket_domain::{ServiceCatalog, ServiceInfo};
use localmarket_persistence::Persistence;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;
use time::{Date, Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::session::SessionCaller;

/// Local marketplace server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Address to bind the server to
    #[arg(short, long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Days a login session stays valid
    #[arg(long, default_value_t = 30)]
    session_days: i64,

    /// bcrypt cost used when hashing passwords
    #[arg(long, default_value_t = 12)]
    password_cost: u32,

    /// Monthly price of click-and-collect, in cents
    #[arg(long, default_value_t = 2_000)]
    click_and_collect_month_price: i64,

    /// Per-order price of consumption click-and-collect, in cents
    #[arg(long, default_value_t = 50)]
    click_and_collect_consumption_price: i64,

    /// Monthly price of the panier service, in cents
    #[arg(long, default_value_t = 1_500)]
    panier_month_price: i64,

    /// Per-order price of the consumption panier service, in cents
    #[arg(long, default_value_t = 30)]
    panier_consumption_price: i64,
}

impl Args {
    /// Builds the service settings from the command line.
    fn api_config(&self) -> ApiConfig {
        let services: Vec<ServiceInfo> = ServiceCatalog::default()
            .services()
            .iter()
            .cloned()
            .map(|mut info| {
                let (month_price, consumption_price): (i64, i64) = match info.name.as_str() {
                    "CLICKANDCOLLECT" => (
                        self.click_and_collect_month_price,
                        self.click_and_collect_consumption_price,
                    ),
                    "PANIER" => (self.panier_month_price, self.panier_consumption_price),
                    _ => (info.month_price, info.consumption_price),
                };
                info.month_price = month_price;
                info.consumption_price = consumption_price;
                info
            })
            .collect();

        ApiConfig {
            session_lifetime: Duration::days(self.session_days),
            catalog: ServiceCatalog::new(services),
            password_policy: PasswordPolicy::default(),
        }
    }
}

/// Application state shared across handlers.
///
/// The persistence layer holds a single connection behind a Mutex; every
/// operation runs while holding it.
#[derive(Clone)]
struct AppState {
    /// The persistence layer.
    persistence: Arc<Mutex<Persistence>>,
    /// External providers.
    integrations: Integrations,
    /// Service settings.
    config: Arc<ApiConfig>,
}

/// Body of `POST /graphql`.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct GraphqlRequest {
    /// Operation name, e.g. `CreateUser`.
    operation: String,
    /// Operation arguments.
    #[serde(default)]
    variables: Value,
}

/// One entry of the response error list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorEntry {
    /// Human-readable message.
    pub message: String,
    /// Stable error kind, e.g. `NotFound`.
    pub kind: String,
}

/// Response envelope of every operation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphqlResponse {
    /// Operation result; `null` on error.
    pub data: Option<Value>,
    /// Errors; omitted on success.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorEntry>,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error entry.
    entry: ErrorEntry,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<GraphqlResponse> = Json(GraphqlResponse {
            data: None,
            errors: vec![self.entry],
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match &err {
            ApiError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::AlreadyExists { .. } => StatusCode::CONFLICT,
            ApiError::InvalidInput { .. } | ApiError::PasswordPolicyViolation { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::ExternalServiceFailure { .. } => StatusCode::BAD_GATEWAY,
            ApiError::NotImplemented { .. } => StatusCode::NOT_IMPLEMENTED,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            entry: ErrorEntry {
                message: err.to_string(),
                kind: err.kind().to_string(),
            },
        }
    }
}

/// Deserializes operation arguments; `null` stands for no arguments.
fn arguments<T: DeserializeOwned>(variables: Value) -> Result<T, ApiError> {
    let variables: Value = if variables.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        variables
    };
    serde_json::from_value(variables).map_err(|e| ApiError::InvalidInput {
        field: String::from("variables"),
        message: e.to_string(),
    })
}

fn to_data<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| {
        error!(error = %e, "Failed to serialize response");
        ApiError::Internal {
            message: String::from("Failed to serialize response"),
        }
    })
}

/// Everything one operation runs with.
struct OperationContext<'a> {
    persistence: &'a mut Persistence,
    integrations: &'a Integrations,
    config: &'a ApiConfig,
    caller: Option<&'a AuthenticatedUser>,
    token: Option<&'a str>,
    today: Date,
}

/// Runs one named operation.
#[allow(clippy::too_many_lines)]
fn dispatch(
    ctx: OperationContext<'_>,
    operation: &str,
    variables: Value,
) -> Result<Value, ApiError> {
    let OperationContext {
        persistence,
        integrations,
        config,
        caller,
        token,
        today,
    } = ctx;

    match operation {
        // Users
        "CreateUser" => to_data(&create_user(
            persistence,
            integrations,
            config,
            caller,
            arguments(variables)?,
        )?),
        "Login" => to_data(&login(persistence, config, &arguments(variables)?)?),
        "Logout" => {
            let token: &str = token.ok_or_else(|| ApiError::AuthenticationFailed {
                reason: String::from("Logout requires a session"),
            })?;
            to_data(&logout(persistence, token)?)
        }
        "UpdateUser" => to_data(&update_user(
            persistence,
            config,
            caller,
            &arguments(variables)?,
        )?),
        "User" => to_data(&get_user(persistence, caller, &arguments(variables)?)?),
        "Users" => to_data(&list_users(persistence, caller, &arguments(variables)?)?),

        // Commerces
        "CreateCommerce" => to_data(&create_commerce(
            persistence,
            config,
            caller,
            arguments(variables)?,
            today,
        )?),
        "UpdateCommerce" => to_data(&update_commerce(
            persistence,
            config,
            caller,
            &arguments(variables)?,
            today,
        )?),
        "Commerce" => to_data(&get_commerce(persistence, caller, &arguments(variables)?)?),
        "Commerces" => to_data(&list_commerces(persistence, caller, &arguments(variables)?)?),

        // Products and paniers
        "CreateProduct" => to_data(&create_product(persistence, caller, arguments(variables)?)?),
        "CreateProducts" => {
            to_data(&create_products(persistence, caller, arguments(variables)?)?)
        }
        "UpdateProduct" => to_data(&update_product(persistence, caller, &arguments(variables)?)?),
        "UpdateProducts" => {
            to_data(&update_products(persistence, caller, &arguments(variables)?)?)
        }
        "Product" => to_data(&get_product(persistence, &arguments(variables)?)?),
        "Products" => to_data(&list_products(persistence, &arguments(variables)?)?),
        "CreatePanier" => to_data(&create_panier(persistence, caller, arguments(variables)?)?),
        "UpdatePanier" => to_data(&update_panier(persistence, caller, &arguments(variables)?)?),
        "Panier" => to_data(&get_panier(persistence, &arguments(variables)?)?),
        "Paniers" => to_data(&list_paniers(persistence, &arguments(variables)?)?),

        // Orders
        "CreateCommand" => to_data(&create_command(
            persistence,
            integrations,
            caller,
            &arguments(variables)?,
        )?),
        "Command" => to_data(&get_command(persistence, caller, &arguments(variables)?)?),
        "Commands" => to_data(&list_commands(persistence, caller, &arguments(variables)?)?),
        "CommerceCommand" => to_data(&get_commerce_command(
            persistence,
            caller,
            &arguments(variables)?,
        )?),
        "CommerceCommands" => to_data(&list_commerce_commands(
            persistence,
            caller,
            &arguments(variables)?,
        )?),
        "UpdateCommerceCommand" => to_data(&update_commerce_command(
            persistence,
            integrations,
            caller,
            &arguments(variables)?,
        )?),
        "CcCommands" => to_data(&list_cc_commands(persistence, caller, &arguments(variables)?)?),
        "PanierCommands" => to_data(&list_panier_commands(
            persistence,
            caller,
            &arguments(variables)?,
        )?),

        // Services
        "AllServicesInfo" => to_data(&all_services_info(config)),
        "ServiceInfo" => to_data(&service_info(config, &arguments(variables)?)?),
        "PaymentMethods" => to_data(&payment_methods(persistence, integrations, caller)?),

        // Routines
        "RunBilling" => to_data(&run_billing(
            persistence,
            integrations,
            config,
            caller,
            today,
        )?),
        "RunBankingTransfers" => to_data(&run_banking_transfers(
            persistence,
            integrations,
            caller,
        )?),

        other => Err(ApiError::InvalidInput {
            field: String::from("operation"),
            message: format!("Unknown operation '{other}'"),
        }),
    }
}

/// Handler for POST `/graphql`.
///
/// Runs one named operation with the caller's session.
async fn handle_graphql(
    AxumState(app_state): AxumState<AppState>,
    caller: SessionCaller,
    Json(request): Json<GraphqlRequest>,
) -> Result<Json<GraphqlResponse>, HttpError> {
    debug!(
        operation = %request.operation,
        authenticated = caller.user.is_some(),
        "Handling operation"
    );

    let mut persistence = app_state.persistence.lock().await;
    let ctx: OperationContext<'_> = OperationContext {
        persistence: &mut persistence,
        integrations: &app_state.integrations,
        config: &app_state.config,
        caller: caller.user(),
        token: caller.token.as_deref(),
        today: OffsetDateTime::now_utc().date(),
    };

    let data: Value = dispatch(ctx, &request.operation, request.variables).map_err(|e| {
        debug!(operation = %request.operation, kind = e.kind(), error = %e, "Operation failed");
        HttpError::from(e)
    })?;

    Ok(Json(GraphqlResponse {
        data: Some(data),
        errors: Vec::new(),
    }))
}

/// Handler for GET `/health`.
#[allow(clippy::unused_async)]
async fn handle_health() -> &'static str {
    "ok"
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/graphql", post(handle_graphql))
        .route("/health", get(handle_health))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing local marketplace server");

    // Initialize persistence (in-memory or file-based based on CLI argument)
    let persistence: Persistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Persistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()?
    }
    .with_password_cost(args.password_cost);

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        integrations: Integrations::offline(),
        config: Arc::new(args.api_config()),
    };

    // Build router
    let app: Router = build_router(app_state);

    // Bind to address
    let addr: std::net::SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode as HttpStatusCode},
    };
    use serde_json::json;
    use tower::ServiceExt;

    /// Helper to create test app state with in-memory persistence.
    fn create_test_app_state() -> AppState {
        let persistence: Persistence = Persistence::new_in_memory()
            .expect("Failed to create in-memory persistence")
            .with_password_cost(4);
        AppState {
            persistence: Arc::new(Mutex::new(persistence)),
            integrations: Integrations::offline(),
            config: Arc::new(ApiConfig::default()),
        }
    }

    /// Sends one operation, optionally with a bearer token.
    async fn send_operation(
        app: &Router,
        token: Option<&str>,
        operation: &str,
        variables: Value,
    ) -> (HttpStatusCode, GraphqlResponse) {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/graphql")
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let body: Value = json!({ "operation": operation, "variables": variables });

        let response = app
            .clone()
            .oneshot(
                builder
                    .body(Body::from(serde_json::to_string(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status: HttpStatusCode = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let envelope: GraphqlResponse = serde_json::from_slice(&body_bytes).unwrap();
        (status, envelope)
    }

    /// Registers a plain user and returns its session token.
    async fn create_test_session(app: &Router, email: &str) -> String {
        let (status, _) = send_operation(
            app,
            None,
            "CreateUser",
            json!({
                "email": email,
                "password": "Correct-Horse-42",
                "firstName": "Camille",
                "lastName": "Martin",
            }),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);

        let (status, envelope) = send_operation(
            app,
            None,
            "Login",
            json!({ "email": email, "password": "Correct-Horse-42" }),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        envelope.data.unwrap()["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app: Router = build_router(create_test_app_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), HttpStatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_user_then_read_self() {
        let app: Router = build_router(create_test_app_state());
        let token: String = create_test_session(&app, "camille@example.com").await;

        let (status, envelope) = send_operation(&app, Some(&token), "User", Value::Null).await;

        assert_eq!(status, HttpStatusCode::OK);
        assert!(envelope.errors.is_empty());
        let data: Value = envelope.data.unwrap();
        assert_eq!(data["email"], "camille@example.com");
        assert_eq!(data["role"], "USER");
        assert!(data.get("password").is_none());
    }

    #[tokio::test]
    async fn test_invalid_bearer_token_is_rejected() {
        let app: Router = build_router(create_test_app_state());

        let (status, envelope) =
            send_operation(&app, Some("not-a-session"), "AllServicesInfo", Value::Null).await;

        assert_eq!(status, HttpStatusCode::UNAUTHORIZED);
        assert!(envelope.data.is_none());
        assert_eq!(envelope.errors[0].kind, "AuthenticationFailed");
    }

    #[tokio::test]
    async fn test_unknown_operation_is_invalid_input() {
        let app: Router = build_router(create_test_app_state());

        let (status, envelope) = send_operation(&app, None, "DropTables", Value::Null).await;

        assert_eq!(status, HttpStatusCode::BAD_REQUEST);
        assert_eq!(envelope.errors[0].kind, "InvalidInput");
    }

    #[tokio::test]
    async fn test_malformed_variables_are_invalid_input() {
        let app: Router = build_router(create_test_app_state());

        let (status, envelope) =
            send_operation(&app, None, "Login", json!({ "email": 42 })).await;

        assert_eq!(status, HttpStatusCode::BAD_REQUEST);
        assert_eq!(envelope.errors[0].kind, "InvalidInput");
    }

    #[tokio::test]
    async fn test_listing_users_requires_admin() {
        let app: Router = build_router(create_test_app_state());

        let (status, envelope) = send_operation(&app, None, "Users", Value::Null).await;
        assert_eq!(status, HttpStatusCode::UNAUTHORIZED);
        assert_eq!(envelope.errors[0].kind, "AuthenticationFailed");

        let token: String = create_test_session(&app, "camille@example.com").await;
        let (status, envelope) = send_operation(&app, Some(&token), "Users", Value::Null).await;
        assert_eq!(status, HttpStatusCode::FORBIDDEN);
        assert_eq!(envelope.errors[0].kind, "AccessDenied");
    }

    #[tokio::test]
    async fn test_logout_ends_the_session() {
        let app: Router = build_router(create_test_app_state());
        let token: String = create_test_session(&app, "camille@example.com").await;

        let (status, _) = send_operation(&app, Some(&token), "Logout", Value::Null).await;
        assert_eq!(status, HttpStatusCode::OK);

        let (status, _) = send_operation(&app, Some(&token), "User", Value::Null).await;
        assert_eq!(status, HttpStatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_public_queries_run_anonymously() {
        let app: Router = build_router(create_test_app_state());

        let (status, envelope) = send_operation(&app, None, "AllServicesInfo", Value::Null).await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(envelope.data.unwrap().as_array().map(Vec::len), Some(2));

        let (status, envelope) = send_operation(&app, None, "Commerces", json!({})).await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(envelope.data.unwrap()["totalCount"], 0);
    }

    #[test]
    fn test_price_overrides_reach_the_catalog() {
        let args: Args = Args::parse_from([
            "localmarket-server",
            "--panier-month-price",
            "1800",
        ]);

        let config: ApiConfig = args.api_config();

        let panier = config.catalog.find("panier").unwrap();
        assert_eq!(panier.month_price, 1_800);
        assert_eq!(panier.consumption_price, 30);
        let click = config.catalog.find("CLICKANDCOLLECT").unwrap();
        assert_eq!(click.month_price, 2_000);
    }
}
