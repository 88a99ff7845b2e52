use bson::oid::ObjectId;
use bson::Document;
use serde::{Deserialize, Serialize, Serializer};

/// Serialize an optional ObjectId as its 24-char hex form.
///
/// MongoDB hands back a native ObjectId; clients only ever see the hex
/// string, which is also the representation used for `queryId` references.
fn oid_as_hex<S>(oid: &Option<ObjectId>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match oid {
        Some(oid) => serializer.serialize_str(&oid.to_hex()),
        None => serializer.serialize_none(),
    }
}

/// A recommendation request posted by a user.
///
/// Stored in the `queries` collection. `recommendation_count` is a
/// denormalized cache of the number of live recommendations referencing
/// this query; the authoritative value is always re-derivable by counting
/// matching documents in the `recommendations` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "oid_as_hex"
    )]
    pub id: Option<ObjectId>,
    /// Owner identity. Set at creation, never rewritten by the service.
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub query_title: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub product_brand: String,
    #[serde(default)]
    pub recommendation_count: i64,
    /// Descriptive fields passed through verbatim.
    #[serde(flatten)]
    pub extra: Document,
}

impl Query {
    /// Hex form of the store-assigned id, empty if the document was never
    /// persisted.
    pub fn hex_id(&self) -> String {
        self.id.as_ref().map(|id| id.to_hex()).unwrap_or_default()
    }
}

/// A response to a query, posted by any user.
///
/// Stored in the `recommendations` collection. `query_id` is the hex form
/// of the owning query's id, stored and compared as a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "oid_as_hex"
    )]
    pub id: Option<ObjectId>,
    #[serde(default)]
    pub query_id: String,
    #[serde(default)]
    pub recommender_email: String,
    #[serde(flatten)]
    pub extra: Document,
}

/// Request payload for `POST /api/add-query`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddQueryRequest {
    #[serde(default)]
    pub query_data: Document,
}

/// Request payload for `POST /api/add-recommendation`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRecommendationRequest {
    #[serde(default)]
    pub recommendation_data: Document,
}

/// Request payload for `PUT /api/update/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQueryRequest {
    #[serde(default)]
    pub updated_query: Document,
}

/// Response for successful document creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertedResponse {
    pub message: String,
    pub inserted_id: String,
}

/// Response for successful update/delete operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// One entry of the aggregate `GET /api/recommended` view: a query's
/// descriptive fields paired with its nested recommendation list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedEntry {
    pub query_title: String,
    pub product_name: String,
    pub product_brand: String,
    pub query_id: String,
    pub recommendations: Vec<Recommendation>,
}
