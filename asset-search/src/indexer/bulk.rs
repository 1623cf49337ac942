//! Accumulation of bulk operations.

use std::mem;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, instrument};

use asset_search_repository::{BulkBatchConfig, RequestDriver, SearchIndexError};

use crate::error_handling::ErrorHandlingService;

/// One operation of a bulk request: an action line and its payload lines,
/// serialized when added.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkRequestPart {
    lines: Vec<Option<String>>,
    size: usize,
}

impl BulkRequestPart {
    /// Serialize every entry on its own. An entry that cannot be serialized is kept
    /// as a `None` placeholder and drops the whole part at flush time.
    pub fn new<T: Serialize>(entries: &[T]) -> Self {
        let lines: Vec<Option<String>> = entries
            .iter()
            .map(|entry| serde_json::to_string(entry).ok())
            .collect();
        let size = lines.iter().flatten().map(String::len).sum();
        Self { lines, size }
    }

    /// Number of serialized bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn lines(&self) -> &[Option<String>] {
        &self.lines
    }

    fn is_complete(&self) -> bool {
        self.lines.iter().all(Option::is_some)
    }
}

/// Buffers bulk operations and submits them in batches.
///
/// A batch is submitted as soon as it holds `max_elements` operations or
/// `max_octets` serialized bytes, and on every explicit [`flush`](Self::flush).
pub struct BulkRequestAccumulator {
    request_driver: Arc<dyn RequestDriver>,
    error_handler: Arc<ErrorHandlingService>,
    config: BulkBatchConfig,
    index_name: String,
    parts: Vec<BulkRequestPart>,
}

impl BulkRequestAccumulator {
    pub fn new(
        request_driver: Arc<dyn RequestDriver>,
        error_handler: Arc<ErrorHandlingService>,
        config: BulkBatchConfig,
        index_name: impl Into<String>,
    ) -> Self {
        Self {
            request_driver,
            error_handler,
            config,
            index_name: index_name.into(),
            parts: Vec::new(),
        }
    }

    /// Target index of subsequent flushes.
    pub fn set_index_name(&mut self, index_name: impl Into<String>) {
        self.index_name = index_name.into();
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Number of pending operations.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Serialized size of all pending operations in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.parts.iter().map(BulkRequestPart::size).sum()
    }

    /// Queue one operation and flush if a threshold is reached.
    ///
    /// # Errors
    ///
    /// Only fails if an automatic flush cannot be submitted.
    pub async fn add<T: Serialize + Sync>(&mut self, entries: &[T]) -> Result<(), SearchIndexError> {
        if entries.is_empty() {
            return Ok(());
        }
        self.parts.push(BulkRequestPart::new(entries));

        if self.config.is_exceeded(self.len(), self.size_in_bytes()) {
            self.flush().await?;
        }
        Ok(())
    }

    /// Submit all pending operations as one bulk request.
    ///
    /// Items the engine rejects are reported to the error handler; they do not fail
    /// the flush. The batch is cleared in every case, including a transport failure,
    /// which is returned to the caller.
    #[instrument(skip(self), fields(index = %self.index_name))]
    pub async fn flush(&mut self) -> Result<(), SearchIndexError> {
        if self.parts.is_empty() {
            return Ok(());
        }

        debug!(
            elements = self.len(),
            max_elements = self.config.max_elements,
            octets = self.size_in_bytes(),
            max_octets = self.config.max_octets,
            "Flush bulk request"
        );

        let parts = mem::take(&mut self.parts);
        let mut payload = Vec::new();
        for part in parts {
            if !part.is_complete() {
                error!("Indexing error: a bulk request item could not be encoded as JSON");
                continue;
            }
            payload.extend(part.lines.into_iter().flatten());
        }

        if payload.is_empty() {
            return Ok(());
        }

        let response = self.request_driver.bulk(&self.index_name, &payload).await?;
        self.report_item_errors(&response);
        Ok(())
    }

    fn report_item_errors(&self, response: &Value) {
        let has_errors = response
            .get("errors")
            .is_some_and(|errors| errors != &Value::Bool(false));
        if !has_errors {
            return;
        }

        let items = response.get("items").and_then(Value::as_array);
        for item in items.into_iter().flatten() {
            let status = item
                .as_object()
                .and_then(|operation| operation.values().next())
                .and_then(|result| result.get("status"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            if status > 299 {
                self.error_handler.log("index error", item);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::Serializer;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingDriver {
        requests: Mutex<Vec<(String, Vec<String>)>>,
        response: Option<Value>,
    }

    #[async_trait]
    impl RequestDriver for RecordingDriver {
        async fn bulk(&self, index_name: &str, lines: &[String]) -> Result<Value, SearchIndexError> {
            self.requests
                .lock()
                .unwrap()
                .push((index_name.to_string(), lines.to_vec()));
            Ok(self
                .response
                .clone()
                .unwrap_or_else(|| json!({ "errors": false, "items": [] })))
        }
    }

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(<S::Error as serde::ser::Error>::custom("not encodable"))
        }
    }

    fn accumulator(
        driver: Arc<RecordingDriver>,
        config: BulkBatchConfig,
    ) -> (BulkRequestAccumulator, Arc<ErrorHandlingService>) {
        let errors = Arc::new(ErrorHandlingService::new());
        (
            BulkRequestAccumulator::new(driver, errors.clone(), config, "assets-1"),
            errors,
        )
    }

    #[tokio::test]
    async fn test_flushes_when_element_threshold_is_reached() {
        let driver = Arc::new(RecordingDriver::default());
        let (mut bulk, _) = accumulator(driver.clone(), BulkBatchConfig::new(3, usize::MAX));

        bulk.add(&[json!({"delete": {"_id": "a"}})]).await.unwrap();
        bulk.add(&[json!({"delete": {"_id": "b"}})]).await.unwrap();
        assert_eq!(driver.requests.lock().unwrap().len(), 0);
        assert_eq!(bulk.len(), 2);

        bulk.add(&[json!({"delete": {"_id": "c"}})]).await.unwrap();
        assert_eq!(driver.requests.lock().unwrap().len(), 1);
        assert!(bulk.is_empty());
    }

    #[tokio::test]
    async fn test_flushes_when_octet_threshold_is_reached() {
        let line = json!({"delete": {"_id": "a"}});
        let line_size = serde_json::to_string(&line).unwrap().len();
        let driver = Arc::new(RecordingDriver::default());
        let (mut bulk, _) =
            accumulator(driver.clone(), BulkBatchConfig::new(usize::MAX, line_size * 2));

        bulk.add(&[line.clone()]).await.unwrap();
        assert_eq!(bulk.size_in_bytes(), line_size);
        assert_eq!(driver.requests.lock().unwrap().len(), 0);

        bulk.add(&[line]).await.unwrap();
        assert_eq!(driver.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_flush_of_empty_batch_is_a_no_op() {
        let driver = Arc::new(RecordingDriver::default());
        let (mut bulk, _) = accumulator(driver.clone(), BulkBatchConfig::default());

        bulk.flush().await.unwrap();
        bulk.flush().await.unwrap();

        assert!(driver.requests.lock().unwrap().is_empty());
        assert!(bulk.is_empty());
    }

    #[tokio::test]
    async fn test_flush_sends_lines_in_order_to_index() {
        let driver = Arc::new(RecordingDriver::default());
        let (mut bulk, _) = accumulator(driver.clone(), BulkBatchConfig::unlimited());

        bulk.add(&[json!({"update": {"_id": "a"}}), json!({"doc": {"x": 1}})])
            .await
            .unwrap();
        bulk.add(&[json!({"delete": {"_id": "b"}})]).await.unwrap();
        bulk.flush().await.unwrap();

        let requests = driver.requests.lock().unwrap();
        assert_eq!(requests[0].0, "assets-1");
        assert_eq!(
            requests[0].1,
            vec![
                r#"{"update":{"_id":"a"}}"#.to_string(),
                r#"{"doc":{"x":1}}"#.to_string(),
                r#"{"delete":{"_id":"b"}}"#.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_unencodable_part_is_dropped() {
        let driver = Arc::new(RecordingDriver::default());
        let (mut bulk, _) = accumulator(driver.clone(), BulkBatchConfig::unlimited());

        bulk.add(&[Unencodable]).await.unwrap();
        bulk.flush().await.unwrap();
        assert!(driver.requests.lock().unwrap().is_empty());
        assert!(bulk.is_empty());

        bulk.add(&[Unencodable]).await.unwrap();
        bulk.add(&[json!({"delete": {"_id": "b"}})]).await.unwrap();
        bulk.flush().await.unwrap();
        assert_eq!(driver.requests.lock().unwrap()[0].1.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_items_are_counted() {
        let driver = Arc::new(RecordingDriver {
            response: Some(json!({
                "errors": true,
                "items": [
                    {"update": {"_id": "a", "status": 200}},
                    {"update": {"_id": "b", "status": 400, "error": {"type": "mapper_parsing_exception"}}},
                    {"delete": {"_id": "c", "status": 404}}
                ]
            })),
            ..Default::default()
        });
        let (mut bulk, errors) = accumulator(driver, BulkBatchConfig::unlimited());

        bulk.add(&[json!({"delete": {"_id": "a"}})]).await.unwrap();
        bulk.flush().await.unwrap();

        assert_eq!(errors.error_count(), 2);
        assert!(bulk.is_empty());
    }
}
