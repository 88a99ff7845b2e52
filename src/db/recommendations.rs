use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::Document;

use crate::db::models::Recommendation;
use crate::error::AppError;

#[cfg(test)]
use mockall::automock;

/// Repository trait for recommendation documents.
///
/// `query_id` is the hex string form of the referenced query's id; it is
/// stored and compared as a string, never as a native ObjectId.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RecommendationRepository: Send + Sync {
    /// Insert a new recommendation document and return its assigned id.
    async fn insert(&self, data: Document) -> Result<String, AppError>;

    /// List all recommendations referencing the given query id.
    async fn list_by_query(&self, query_id: &str) -> Result<Vec<Recommendation>, AppError>;

    /// List all recommendations posted by the given email.
    async fn list_by_recommender(&self, email: &str) -> Result<Vec<Recommendation>, AppError>;

    /// Delete a recommendation by id. Returns whether a document was removed.
    async fn delete(&self, id: &str) -> Result<bool, AppError>;

    /// Authoritative count of live recommendations for a query. The cached
    /// counter on the query document is reconciled against this.
    async fn count_for_query(&self, query_id: &str) -> Result<u64, AppError>;
}

/// MongoDB implementation of the RecommendationRepository.
pub struct MongoRecommendationRepository {
    collection: mongodb::Collection<Document>,
}

impl MongoRecommendationRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("recommendations"),
        }
    }

    async fn find_typed(&self, filter: Document) -> Result<Vec<Recommendation>, AppError> {
        use futures::TryStreamExt;

        let mut cursor = self
            .collection
            .find(filter)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut recommendations = Vec::new();
        while let Some(doc) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            let rec = bson::from_document(doc).map_err(|e| AppError::Database(e.to_string()))?;
            recommendations.push(rec);
        }

        Ok(recommendations)
    }
}

#[async_trait]
impl RecommendationRepository for MongoRecommendationRepository {
    async fn insert(&self, data: Document) -> Result<String, AppError> {
        let result = self
            .collection
            .insert_one(data)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        result
            .inserted_id
            .as_object_id()
            .map(|oid| oid.to_hex())
            .ok_or_else(|| AppError::Database("insert did not return an ObjectId".to_string()))
    }

    async fn list_by_query(&self, query_id: &str) -> Result<Vec<Recommendation>, AppError> {
        use bson::doc;

        self.find_typed(doc! { "queryId": query_id }).await
    }

    async fn list_by_recommender(&self, email: &str) -> Result<Vec<Recommendation>, AppError> {
        use bson::doc;

        self.find_typed(doc! { "recommenderEmail": email }).await
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        use bson::doc;

        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(false);
        };

        let result = self
            .collection
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.deleted_count > 0)
    }

    async fn count_for_query(&self, query_id: &str) -> Result<u64, AppError> {
        use bson::doc;

        self.collection
            .count_documents(doc! { "queryId": query_id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
