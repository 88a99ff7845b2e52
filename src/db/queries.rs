use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::Document;

use crate::db::models::Query;
use crate::error::AppError;

#[cfg(test)]
use mockall::automock;

/// Repository trait for query documents.
///
/// Ids cross this boundary as 24-char hex strings; the MongoDB
/// implementation converts to native ObjectIds internally. An id that does
/// not parse is indistinguishable from one that matches nothing.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QueryRepository: Send + Sync {
    /// Insert a new query document and return its assigned id.
    async fn insert(&self, data: Document) -> Result<String, AppError>;

    /// List every query document, unfiltered.
    async fn list_all(&self) -> Result<Vec<Query>, AppError>;

    /// List all queries owned by the given email.
    async fn list_by_owner(&self, email: &str) -> Result<Vec<Query>, AppError>;

    /// Find a single query by id.
    async fn find_by_id(&self, id: &str) -> Result<Option<Query>, AppError>;

    /// Merge the given fields into a query document. Returns whether a
    /// document matched the id, regardless of whether any value changed.
    async fn update_fields(&self, id: &str, fields: Document) -> Result<bool, AppError>;

    /// Delete a query by id. Returns whether a document was removed.
    /// Dependent recommendation documents are left in place.
    async fn delete(&self, id: &str) -> Result<bool, AppError>;

    /// Adjust the cached recommendationCount by a signed delta.
    ///
    /// The `$inc` itself is atomic at the store level; callers sequencing
    /// this after an insert or delete get no cross-document atomicity. The
    /// counter is not clamped and a miss on the id is a silent no-op.
    async fn adjust_recommendation_count(&self, id: &str, delta: i64) -> Result<(), AppError>;
}

fn parse_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

/// MongoDB implementation of the QueryRepository.
pub struct MongoQueryRepository {
    collection: mongodb::Collection<Document>,
}

impl MongoQueryRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("queries"),
        }
    }

    async fn find_typed(&self, filter: Document) -> Result<Vec<Query>, AppError> {
        use futures::TryStreamExt;

        let mut cursor = self
            .collection
            .find(filter)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut queries = Vec::new();
        while let Some(doc) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            let query = bson::from_document(doc).map_err(|e| AppError::Database(e.to_string()))?;
            queries.push(query);
        }

        Ok(queries)
    }
}

#[async_trait]
impl QueryRepository for MongoQueryRepository {
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

    async fn list_all(&self) -> Result<Vec<Query>, AppError> {
        self.find_typed(Document::new()).await
    }

    async fn list_by_owner(&self, email: &str) -> Result<Vec<Query>, AppError> {
        use bson::doc;

        self.find_typed(doc! { "userEmail": email }).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Query>, AppError> {
        use bson::doc;

        let Some(oid) = parse_id(id) else {
            return Ok(None);
        };

        let doc = self
            .collection
            .find_one(doc! { "_id": oid })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        doc.map(|d| bson::from_document(d).map_err(|e| AppError::Database(e.to_string())))
            .transpose()
    }

    async fn update_fields(&self, id: &str, mut fields: Document) -> Result<bool, AppError> {
        use bson::doc;

        let Some(oid) = parse_id(id) else {
            return Ok(false);
        };

        // _id is immutable in MongoDB; merging it back would fail the update.
        fields.remove("_id");

        let result = self
            .collection
            .update_one(doc! { "_id": oid }, doc! { "$set": fields })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.matched_count > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        use bson::doc;

        let Some(oid) = parse_id(id) else {
            return Ok(false);
        };

        let result = self
            .collection
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.deleted_count > 0)
    }

    async fn adjust_recommendation_count(&self, id: &str, delta: i64) -> Result<(), AppError> {
        use bson::doc;

        let Some(oid) = parse_id(id) else {
            return Ok(());
        };

        self.collection
            .update_one(
                doc! { "_id": oid },
                doc! { "$inc": { "recommendationCount": delta } },
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
