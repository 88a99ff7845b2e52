use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::mongo::Mongo;

use recommendo::auth::verifier::{TokenVerifier, VerifiedIdentity};
use recommendo::db::queries::{MongoQueryRepository, QueryRepository};
use recommendo::db::recommendations::{MongoRecommendationRepository, RecommendationRepository};
use recommendo::error::AppError;
use recommendo::router::api_router;
use recommendo::state::AppState;

pub const ALICE_TOKEN: &str = "tok-alice";
pub const ALICE_EMAIL: &str = "a@x.com";
pub const BOB_TOKEN: &str = "tok-bob";
pub const BOB_EMAIL: &str = "b@x.com";

/// Token verifier backed by a fixed token table, standing in for the
/// Firebase-backed verifier in integration tests.
struct StaticTokenVerifier {
    identities: HashMap<&'static str, VerifiedIdentity>,
}

impl StaticTokenVerifier {
    fn with_test_users() -> Self {
        let mut identities = HashMap::new();
        identities.insert(
            ALICE_TOKEN,
            VerifiedIdentity {
                uid: "u-alice".to_string(),
                email: ALICE_EMAIL.to_string(),
            },
        );
        identities.insert(
            BOB_TOKEN,
            VerifiedIdentity {
                uid: "u-bob".to_string(),
                email: BOB_EMAIL.to_string(),
            },
        );
        Self { identities }
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AppError> {
        self.identities
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::Auth("invalid or expired credential".to_string()))
    }
}

/// Holds the running MongoDB container and provides the Axum router for
/// integration tests.
///
/// The container is kept alive for as long as this struct lives; every
/// TestEnv gets its own container, so tests are fully isolated.
pub struct TestEnv {
    _mongo: ContainerAsync<Mongo>,
    pub router: Router,
    pub queries: Arc<dyn QueryRepository>,
    pub recommendations: Arc<dyn RecommendationRepository>,
}

impl TestEnv {
    pub async fn start() -> Self {
        let mongo_container = Mongo::default()
            .start()
            .await
            .expect("Failed to start MongoDB container");

        let mongo_port = mongo_container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");
        let mongo_uri = format!("mongodb://127.0.0.1:{}", mongo_port);
        let mongo_client = mongodb::Client::with_uri_str(&mongo_uri)
            .await
            .expect("Failed to connect to MongoDB");
        let mongo_db = mongo_client.database("recommendo_test");

        let queries: Arc<dyn QueryRepository> = Arc::new(MongoQueryRepository::new(&mongo_db));
        let recommendations: Arc<dyn RecommendationRepository> =
            Arc::new(MongoRecommendationRepository::new(&mongo_db));

        let app_state = AppState {
            queries: queries.clone(),
            recommendations: recommendations.clone(),
            verifier: Arc::new(StaticTokenVerifier::with_test_users()),
        };

        Self {
            _mongo: mongo_container,
            router: api_router(app_state),
            queries,
            recommendations,
        }
    }

    /// Build an `axum_test::TestServer` from this environment's router.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .expect_success_by_default()
            .build(self.router.clone())
    }

    /// Build a `TestServer` that does NOT expect success by default (for error tests).
    pub fn server_permissive(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .build(self.router.clone())
    }

    /// Helper: create a query via the API and return its inserted id.
    pub async fn add_query(
        &self,
        server: &axum_test::TestServer,
        token: &str,
        owner: &str,
        title: &str,
    ) -> String {
        let response = server
            .post("/api/add-query")
            .authorization_bearer(token)
            .json(&serde_json::json!({
                "queryData": {
                    "userEmail": owner,
                    "queryTitle": title,
                    "productName": "Laptop",
                    "productBrand": "Acme"
                }
            }))
            .await;

        response.json::<serde_json::Value>()["insertedId"]
            .as_str()
            .expect("add-query response should carry insertedId")
            .to_string()
    }

    /// Helper: create a recommendation via the API and return its inserted id.
    pub async fn add_recommendation(
        &self,
        server: &axum_test::TestServer,
        query_id: &str,
        recommender: &str,
    ) -> String {
        let response = server
            .post("/api/add-recommendation")
            .json(&serde_json::json!({
                "recommendationData": {
                    "queryId": query_id,
                    "recommenderEmail": recommender,
                    "recommendationTitle": "Try this one"
                }
            }))
            .await;

        response.json::<serde_json::Value>()["insertedId"]
            .as_str()
            .expect("add-recommendation response should carry insertedId")
            .to_string()
    }

    /// Helper: fetch a query's cached recommendationCount via the API.
    pub async fn recommendation_count(
        &self,
        server: &axum_test::TestServer,
        query_id: &str,
    ) -> i64 {
        let response = server.get(&format!("/api/query/{query_id}")).await;
        response.json::<serde_json::Value>()["recommendationCount"]
            .as_i64()
            .unwrap_or(0)
    }
}
