use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use recommendo::auth::verifier::FirebaseTokenVerifier;
use recommendo::db::queries::MongoQueryRepository;
use recommendo::db::recommendations::MongoRecommendationRepository;
use recommendo::router::api_router;
use recommendo::state::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recommendo=info,tower_http=info".into()),
        )
        .init();

    tracing::info!("Starting recommendo server...");

    // Connect to MongoDB
    let mongo_uri =
        std::env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let mongo_db_name =
        std::env::var("MONGODB_DATABASE").unwrap_or_else(|_| "recommendo".to_string());

    let mongo_client = mongodb::Client::with_uri_str(&mongo_uri)
        .await
        .expect("Failed to connect to MongoDB");

    // Ping the deployment so a bad URI surfaces at startup rather than on
    // the first request.
    match mongo_client
        .database("admin")
        .run_command(bson::doc! { "ping": 1 })
        .await
    {
        Ok(_) => tracing::info!("Connected to MongoDB at {}", mongo_uri),
        Err(e) => tracing::warn!("MongoDB ping failed: {e}"),
    }

    let mongo_db = mongo_client.database(&mongo_db_name);

    // Firebase project for bearer token verification
    let firebase_project =
        std::env::var("FIREBASE_PROJECT_ID").expect("FIREBASE_PROJECT_ID not set");

    // Build application state
    let app_state = AppState {
        queries: Arc::new(MongoQueryRepository::new(&mongo_db)),
        recommendations: Arc::new(MongoRecommendationRepository::new(&mongo_db)),
        verifier: Arc::new(FirebaseTokenVerifier::new(firebase_project)),
    };

    // Build the Axum router. The API is consumed by a browser frontend on
    // another origin, so CORS stays permissive.
    let app = api_router(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    // Start the server
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(3000);
    let addr = format!("0.0.0.0:{port}");
    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app.into_make_service())
        .await
        .unwrap();
}
