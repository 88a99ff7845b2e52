mod common;

use axum::http::StatusCode;

use common::{TestEnv, ALICE_EMAIL, ALICE_TOKEN, BOB_EMAIL};

#[tokio::test]
async fn add_recommendation_increments_counter_by_one() {
    let env = TestEnv::start().await;
    let server = env.server();

    let query_id = env
        .add_query(&server, ALICE_TOKEN, ALICE_EMAIL, "Budget laptop")
        .await;
    assert_eq!(env.recommendation_count(&server, &query_id).await, 0);

    let response = server
        .post("/api/add-recommendation")
        .json(&serde_json::json!({
            "recommendationData": {
                "queryId": query_id,
                "recommenderEmail": BOB_EMAIL,
                "recommendationTitle": "Try this one"
            }
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    assert_eq!(env.recommendation_count(&server, &query_id).await, 1);
}

#[tokio::test]
async fn create_then_delete_restores_counter() {
    let env = TestEnv::start().await;
    let server = env.server();

    let query_id = env
        .add_query(&server, ALICE_TOKEN, ALICE_EMAIL, "Budget laptop")
        .await;
    let rec_id = env.add_recommendation(&server, &query_id, BOB_EMAIL).await;
    assert_eq!(env.recommendation_count(&server, &query_id).await, 1);

    let response = server
        .delete(&format!("/api/delete-rec/{rec_id}/{query_id}"))
        .await;
    assert_eq!(
        response.json::<serde_json::Value>()["message"],
        "Recommendation deleted successfully"
    );

    assert_eq!(env.recommendation_count(&server, &query_id).await, 0);
    assert_eq!(
        env.recommendations.count_for_query(&query_id).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn delete_unknown_recommendation_is_not_found_without_side_effects() {
    let env = TestEnv::start().await;
    let server = env.server_permissive();

    let query_id = env
        .add_query(&server, ALICE_TOKEN, ALICE_EMAIL, "Budget laptop")
        .await;

    let response = server
        .delete(&format!(
            "/api/delete-rec/65f000000000000000000001/{query_id}"
        ))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    assert_eq!(env.recommendation_count(&server, &query_id).await, 0);
}

#[tokio::test]
async fn add_recommendation_payload_errors() {
    let env = TestEnv::start().await;
    let server = env.server_permissive();

    let response = server
        .post("/api/add-recommendation")
        .json(&serde_json::json!({ "recommendationData": {} }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/add-recommendation")
        .json(&serde_json::json!({
            "recommendationData": { "recommenderEmail": BOB_EMAIL }
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn recommendations_listed_by_query_and_by_recommender() {
    let env = TestEnv::start().await;
    let server = env.server();

    let first = env
        .add_query(&server, ALICE_TOKEN, ALICE_EMAIL, "Budget laptop")
        .await;
    let second = env
        .add_query(&server, ALICE_TOKEN, ALICE_EMAIL, "Quiet keyboard")
        .await;
    env.add_recommendation(&server, &first, BOB_EMAIL).await;
    env.add_recommendation(&server, &first, "c@x.com").await;
    env.add_recommendation(&server, &second, BOB_EMAIL).await;

    let by_query = server.get(&format!("/api/recommendations/{first}")).await;
    let by_query = by_query.json::<serde_json::Value>();
    assert_eq!(by_query.as_array().unwrap().len(), 2);
    assert!(by_query
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["queryId"] == first));

    let by_recommender = server
        .get(&format!("/api/my-recommendations/{BOB_EMAIL}"))
        .await;
    let by_recommender = by_recommender.json::<serde_json::Value>();
    assert_eq!(by_recommender.as_array().unwrap().len(), 2);
    assert!(by_recommender
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["recommenderEmail"] == BOB_EMAIL));
}

#[tokio::test]
async fn recommended_view_end_to_end() {
    let env = TestEnv::start().await;
    let server = env.server();

    // Alice asks, Bob answers.
    let query_id = env.add_query(&server, ALICE_TOKEN, ALICE_EMAIL, "T").await;
    env.add_recommendation(&server, &query_id, BOB_EMAIL).await;
    assert_eq!(env.recommendation_count(&server, &query_id).await, 1);

    let response = server
        .get("/api/recommended")
        .add_query_param("userEmail", ALICE_EMAIL)
        .await;
    let entries = response.json::<serde_json::Value>();
    let entries = entries.as_array().unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["queryTitle"], "T");
    assert_eq!(entries[0]["queryId"], query_id);
    let recs = entries[0]["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0]["recommenderEmail"], BOB_EMAIL);
}

#[tokio::test]
async fn recommended_view_keeps_query_order() {
    let env = TestEnv::start().await;
    let server = env.server();

    let first = env
        .add_query(&server, ALICE_TOKEN, ALICE_EMAIL, "First")
        .await;
    let second = env
        .add_query(&server, ALICE_TOKEN, ALICE_EMAIL, "Second")
        .await;
    env.add_recommendation(&server, &second, BOB_EMAIL).await;

    let response = server
        .get("/api/recommended")
        .add_query_param("userEmail", ALICE_EMAIL)
        .await;
    let entries = response.json::<serde_json::Value>();
    let entries = entries.as_array().unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["queryId"], first);
    assert!(entries[0]["recommendations"].as_array().unwrap().is_empty());
    assert_eq!(entries[1]["queryId"], second);
    assert_eq!(entries[1]["recommendations"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn recommended_view_requires_user_email() {
    let env = TestEnv::start().await;
    let server = env.server_permissive();

    let response = server.get("/api/recommended").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
