use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use tower::ServiceExt;

use reclaim_core::{
    CallerIdentity, ProviderCredentials, RemediationResult, ScanOutput, Technique,
};
use reclaim_gateway::{
    CredentialError, CredentialStore, CredentialSupplier, MemoryCredentialStore, Sweeper,
};
use reclaim_optimizer::{
    DynOptimizer, IdentityVerifier, Optimizer, OptimizerBase, OptimizerError, OptimizerRegistry,
    remediate_in_order,
};
use reclaim_server::api::AppState;

// -- Mock optimizers --------------------------------------------------------

struct MockVolumes {
    base: OptimizerBase,
}

impl Optimizer for MockVolumes {
    fn technique(&self) -> Technique {
        Technique::Ebs
    }

    fn base(&self) -> &OptimizerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OptimizerBase {
        &mut self.base
    }

    async fn analyze(&mut self) -> Result<ScanOutput, OptimizerError> {
        let region = self.base.region().to_owned();
        self.base.add_finding(
            "vol-1",
            "EBS Volume",
            serde_json::json!({"size_gb": 1, "region": region}),
            0.10,
        );
        self.base
            .add_finding("vol-2", "EBS Volume", serde_json::json!({"size_gb": 1}), 0.10);
        self.base
            .add_finding("vol-3", "EBS Volume", serde_json::json!({"size_gb": 1}), 0.05);
        self.base.skip("vol-4", "AccessDenied");
        Ok(self.base.take_output())
    }

    async fn optimize(
        &self,
        resource_ids: &[String],
    ) -> Result<Vec<RemediationResult>, OptimizerError> {
        let dry_run = self.base.dry_run();
        Ok(remediate_in_order(resource_ids, 2, |id| async move {
            if id.starts_with("vol-") {
                if dry_run {
                    RemediationResult::success(id.clone(), format!("Dry run validated: would delete {id}"))
                } else {
                    RemediationResult::success(id.clone(), format!("Deleted {id}"))
                }
            } else {
                RemediationResult::failed(id.clone(), format!("Volume {id} not found"))
            }
        })
        .await)
    }
}

struct FailingImages {
    base: OptimizerBase,
}

impl Optimizer for FailingImages {
    fn technique(&self) -> Technique {
        Technique::Amis
    }

    fn base(&self) -> &OptimizerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OptimizerBase {
        &mut self.base
    }

    async fn analyze(&mut self) -> Result<ScanOutput, OptimizerError> {
        Err(OptimizerError::Provider("InternalError: service unavailable".into()))
    }

    async fn optimize(&self, _: &[String]) -> Result<Vec<RemediationResult>, OptimizerError> {
        Err(OptimizerError::Provider("InternalError: service unavailable".into()))
    }
}

// -- Mock credential store and verifier -------------------------------------

/// Memory store that counts loads so tests can assert no credential access.
#[derive(Default)]
struct CountingStore {
    inner: MemoryCredentialStore,
    loads: AtomicUsize,
}

impl CountingStore {
    fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialSupplier for CountingStore {
    async fn load(&self) -> Result<Option<ProviderCredentials>, CredentialError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load().await
    }
}

#[async_trait]
impl CredentialStore for CountingStore {
    async fn save(&self, credentials: &ProviderCredentials) -> Result<(), CredentialError> {
        self.inner.save(credentials).await
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        self.inner.clear().await
    }
}

/// Accepts only the access key `AKIAGOOD`.
struct MockVerifier;

#[async_trait]
impl IdentityVerifier for MockVerifier {
    async fn verify(
        &self,
        credentials: &ProviderCredentials,
    ) -> Result<CallerIdentity, OptimizerError> {
        if credentials.access_key == "AKIAGOOD" {
            Ok(CallerIdentity::from_arn(
                "123456789012",
                "arn:aws:iam::123456789012:user/ops",
            ))
        } else {
            Err(OptimizerError::Authentication("Invalid access key ID".into()))
        }
    }
}

// -- Helpers ----------------------------------------------------------------

fn registry() -> OptimizerRegistry {
    let mut registry = OptimizerRegistry::new();
    registry.register(Technique::Ebs, |base| -> Box<dyn DynOptimizer> {
        Box::new(MockVolumes { base })
    });
    registry.register(Technique::Amis, |base| -> Box<dyn DynOptimizer> {
        Box::new(FailingImages { base })
    });
    registry
}

fn build_app(store: Arc<CountingStore>) -> axum::Router {
    let sweeper = Sweeper::builder()
        .registry(registry())
        .credentials(store.clone())
        .build()
        .expect("sweeper should build");
    reclaim_server::api::router(AppState {
        sweeper: Arc::new(sweeper),
        credentials: store,
        verifier: Arc::new(MockVerifier),
    })
}

async fn store_with_credentials() -> Arc<CountingStore> {
    let store = Arc::new(CountingStore::default());
    store
        .inner
        .save(&ProviderCredentials::new("AKIAGOOD", "secret", "us-east-1"))
        .await
        .unwrap();
    store
}

fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(http::Method::POST)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

// -- Tests ------------------------------------------------------------------

#[tokio::test]
async fn health_returns_ok() {
    let app = build_app(Arc::new(CountingStore::default()));
    let (status, body) = send(app, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({"status": "ok"}));
}

#[tokio::test]
async fn techniques_lists_registered_catalog_entries() {
    let app = build_app(Arc::new(CountingStore::default()));
    let (status, body) = send(app, get("/api/techniques")).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["id"], "ebs");
    assert!(entries[0]["name"].is_string());
    assert!(entries[0]["description"].is_string());
    assert!(entries[0]["icon"].is_string());
}

#[tokio::test]
async fn analyze_unknown_technique_is_400_without_credential_access() {
    let store = store_with_credentials().await;
    let app = build_app(Arc::clone(&store));
    let (status, body) = send(app, post("/api/analyze/foo", serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, serde_json::json!({"error": "Unknown technique: foo"}));
    assert_eq!(store.loads(), 0);
}

#[tokio::test]
async fn analyze_without_credentials_is_401() {
    let app = build_app(Arc::new(CountingStore::default()));
    let (status, body) = send(app, post("/api/analyze/ebs", serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "No credentials saved");
}

#[tokio::test]
async fn analyze_returns_findings_and_rounded_total() {
    let app = build_app(store_with_credentials().await);
    let (status, body) = send(
        app,
        post("/api/analyze/ebs", serde_json::json!({"region": "eu-west-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["technique"], "ebs");
    assert_eq!(body["count"], 3);
    assert_eq!(body["total_monthly_savings"], 0.25);
    assert_eq!(body["findings"][0]["resource_id"], "vol-1");
    assert_eq!(body["findings"][0]["details"]["region"], "eu-west-1");
    assert!(body["findings"][0]["timestamp"].is_string());
    assert_eq!(body["skipped_count"], 1);
    assert_eq!(body["skipped"][0]["resource_id"], "vol-4");
}

#[tokio::test]
async fn analyze_accepts_empty_body() {
    let app = build_app(store_with_credentials().await);
    let request = Request::builder()
        .method(http::Method::POST)
        .uri("/api/analyze/ebs")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["findings"][0]["details"]["region"], "us-east-1");
}

#[tokio::test]
async fn analyze_provider_failure_is_500() {
    let app = build_app(store_with_credentials().await);
    let (status, body) = send(app, post("/api/analyze/amis", serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("InternalError"));
    assert!(body.get("findings").is_none());
}

#[tokio::test]
async fn optimize_defaults_to_dry_run() {
    let app = build_app(store_with_credentials().await);
    let (status, body) = send(
        app,
        post("/api/optimize/ebs", serde_json::json!({"resource_ids": ["vol-123"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dry_run"], true);
    assert_eq!(body["results"][0]["status"], "success");
    assert_eq!(
        body["results"][0]["message"],
        "Dry run validated: would delete vol-123"
    );
    assert_eq!(
        body["summary"],
        serde_json::json!({"total": 1, "success": 1, "failed": 0})
    );
}

#[tokio::test]
async fn optimize_reports_every_id_in_order() {
    let app = build_app(store_with_credentials().await);
    let (status, body) = send(
        app,
        post(
            "/api/optimize/ebs",
            serde_json::json!({"resource_ids": ["vol-1", "bogus", "vol-1"], "dry_run": false}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dry_run"], false);
    let ids: Vec<_> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["resource_id"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(ids, ["vol-1", "bogus", "vol-1"]);
    assert_eq!(body["results"][0]["message"], "Deleted vol-1");
    assert_eq!(body["results"][1]["status"], "failed");
    assert_eq!(body["results"][1]["error"], "Volume bogus not found");
    assert_eq!(
        body["summary"],
        serde_json::json!({"total": 3, "success": 2, "failed": 1})
    );
}

#[tokio::test]
async fn optimize_empty_list() {
    let app = build_app(store_with_credentials().await);
    let (status, body) = send(app, post("/api/optimize/ebs", serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], serde_json::json!([]));
    assert_eq!(
        body["summary"],
        serde_json::json!({"total": 0, "success": 0, "failed": 0})
    );
}

#[tokio::test]
async fn optimize_unknown_technique_is_400() {
    let store = store_with_credentials().await;
    let app = build_app(Arc::clone(&store));
    let (status, _) = send(
        app,
        post("/api/optimize/nope", serde_json::json!({"resource_ids": ["x"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.loads(), 0);
}

#[tokio::test]
async fn malformed_body_is_400() {
    let app = build_app(store_with_credentials().await);
    let request = Request::builder()
        .method(http::Method::POST)
        .uri("/api/optimize/ebs")
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"resource_ids\": 5}"))
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("invalid request body"));
}

#[tokio::test]
async fn validate_missing_fields_is_400() {
    let app = build_app(Arc::new(CountingStore::default()));
    let (status, body) = send(
        app,
        post("/api/credentials/validate", serde_json::json!({"access_key": "AKIAGOOD"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing credentials");
}

#[tokio::test]
async fn validate_rejected_credentials_is_401_and_not_saved() {
    let store = Arc::new(CountingStore::default());
    let app = build_app(Arc::clone(&store));
    let (status, body) = send(
        app,
        post(
            "/api/credentials/validate",
            serde_json::json!({"access_key": "AKIABAD", "secret_key": "x"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["valid"], false);
    assert_eq!(body["error"], "Invalid access key ID");
    assert!(store.inner.load().await.unwrap().is_none());
}

#[tokio::test]
async fn validate_saves_and_check_reverifies() {
    let store = Arc::new(CountingStore::default());
    let (status, body) = send(
        build_app(Arc::clone(&store)),
        post(
            "/api/credentials/validate",
            serde_json::json!({"access_key": "AKIAGOOD", "secret_key": "s", "region": "eu-central-1"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["account_id"], "123456789012");
    assert_eq!(body["user"], "ops");

    let saved = store.inner.load().await.unwrap().unwrap();
    assert_eq!(saved.region, "eu-central-1");

    let (status, body) = send(build_app(Arc::clone(&store)), get("/api/credentials/check")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["arn"], "arn:aws:iam::123456789012:user/ops");
}

#[tokio::test]
async fn check_without_credentials_is_404() {
    let app = build_app(Arc::new(CountingStore::default()));
    let (status, body) = send(app, get("/api/credentials/check")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        serde_json::json!({"valid": false, "error": "No credentials saved"})
    );
}

#[tokio::test]
async fn clear_then_analyze_is_401() {
    let store = store_with_credentials().await;
    let (status, body) = send(
        build_app(Arc::clone(&store)),
        post("/api/credentials/clear", serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({"status": "success", "message": "Credentials cleared"})
    );

    let (status, _) = send(
        build_app(store),
        post("/api/analyze/ebs", serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = build_app(Arc::new(CountingStore::default()));
    let (status, body) = send(app, get("/api-doc/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/analyze/{technique}"].is_object());
}
