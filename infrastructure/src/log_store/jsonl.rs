use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;
use vocab_application::{ExecutionLogStore, LogStoreError, RecallFilter};
use vocab_domain::alias::entities::Layer;
use vocab_domain::execution::entities::{ExecutionLog, NewExecutionLog};

use crate::embedding::cosine_similarity;

/// One line of the log file: the audit record plus the request embedding
/// kept alongside it for semantic recall.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    #[serde(flatten)]
    log: ExecutionLog,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_embedding: Option<Vec<f32>>,
}

/// Append-only execution log store backed by a JSONL file.
///
/// Each record is one line, flushed on write. Searches re-read the file,
/// so records appended by other handles on the same path are visible.
pub struct JsonlExecutionLogStore {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonlExecutionLogStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, LogStoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| LogStoreError::Append(e.to_string()))?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| LogStoreError::Append(e.to_string()))?;
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_records(&self) -> Result<Vec<StoredRecord>, LogStoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LogStoreError::Search(e.to_string())),
        };
        let reader = BufReader::new(file);
        let mut records = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| LogStoreError::Search(e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<StoredRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    // Tolerate corrupt lines rather than failing the search
                    warn!(line = line_no + 1, error = %e, "Skipping malformed log line");
                }
            }
        }
        Ok(records)
    }
}

fn passes_filter(record: &StoredRecord, layer: &Layer, filter: &RecallFilter) -> bool {
    if !record.log.layer.visible_from(layer) {
        return false;
    }
    if let Some(entity) = &filter.entity {
        if !record.log.entities.iter().any(|e| e == entity) {
            return false;
        }
    }
    true
}

fn matches_keywords(record: &StoredRecord, terms: &[String]) -> bool {
    if terms.is_empty() {
        return true;
    }
    let haystack = format!(
        "{} {} {} {}",
        record.log.input_request,
        record.log.result_summary,
        record.log.alias_pattern,
        record.log.entities.join(" ")
    )
    .to_lowercase();
    terms.iter().all(|term| haystack.contains(term.as_str()))
}

#[async_trait]
impl ExecutionLogStore for JsonlExecutionLogStore {
    async fn append(&self, log: NewExecutionLog) -> Result<ExecutionLog, LogStoreError> {
        let request_embedding = log.request_embedding.clone();
        let record = StoredRecord {
            log: log.into_log(Uuid::new_v4().to_string(), Utc::now()),
            request_embedding,
        };
        let line = serde_json::to_string(&record)
            .map_err(|e| LogStoreError::Append(e.to_string()))?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| LogStoreError::Append("log writer lock poisoned".to_string()))?;
        writeln!(writer, "{}", line).map_err(|e| LogStoreError::Append(e.to_string()))?;
        writer
            .flush()
            .map_err(|e| LogStoreError::Append(e.to_string()))?;
        debug!(log_id = %record.log.id, "Appended execution log");
        Ok(record.log)
    }

    async fn search(
        &self,
        query: &str,
        layer: &Layer,
        filter: &RecallFilter,
    ) -> Result<Vec<ExecutionLog>, LogStoreError> {
        let terms: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let mut hits: Vec<ExecutionLog> = self
            .read_records()?
            .into_iter()
            .filter(|r| passes_filter(r, layer, filter))
            .filter(|r| matches_keywords(r, &terms))
            .map(|r| r.log)
            .collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        hits.truncate(filter.limit);
        Ok(hits)
    }

    async fn search_semantic(
        &self,
        embedding: &[f32],
        layer: &Layer,
        filter: &RecallFilter,
    ) -> Result<Vec<ExecutionLog>, LogStoreError> {
        let mut scored: Vec<(f64, ExecutionLog)> = self
            .read_records()?
            .into_iter()
            .filter(|r| passes_filter(r, layer, filter))
            .filter_map(|r| {
                let score = cosine_similarity(embedding, r.request_embedding.as_deref()?);
                (score > 0.0).then_some((score, r.log))
            })
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(filter.limit);
        Ok(scored.into_iter().map(|(_, log)| log).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn new_log(request: &str, entities: Vec<&str>) -> NewExecutionLog {
        NewExecutionLog {
            alias_id: Uuid::new_v4(),
            alias_pattern: "tie a string to {person}".to_string(),
            input_request: request.to_string(),
            extracted_vars: HashMap::new(),
            steps: vec![],
            result_summary: format!("Handled: {}", request),
            success: true,
            error_message: None,
            entities: entities.into_iter().map(str::to_string).collect(),
            layer: Layer::Public,
            user_id: None,
            duration_ms: 12,
            request_embedding: None,
        }
    }

    #[tokio::test]
    async fn append_assigns_identity_and_persists() {
        let dir = tempdir().unwrap();
        let store = JsonlExecutionLogStore::new(dir.path().join("logs.jsonl")).unwrap();

        let log = store.append(new_log("tie a string to Alice", vec!["alice"])).await.unwrap();
        assert!(!log.id.is_empty());
        assert!(!log.is_ephemeral());

        let contents = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("tie a string to Alice"));
    }

    // Appends timestamp with Utc::now(); spacing them out keeps the
    // newest-first assertions valid on coarse clocks
    async fn append_spaced(store: &JsonlExecutionLogStore, log: NewExecutionLog) {
        store.append(log).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    #[tokio::test]
    async fn keyword_search_newest_first() {
        let dir = tempdir().unwrap();
        let store = JsonlExecutionLogStore::new(dir.path().join("logs.jsonl")).unwrap();
        append_spaced(&store, new_log("tie a string to Alice", vec!["alice"])).await;
        append_spaced(&store, new_log("tie a string to Bob", vec!["bob"])).await;
        append_spaced(&store, new_log("water the plants", vec![])).await;

        let hits = store
            .search("string tie", &Layer::Public, &RecallFilter::default())
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].input_request, "tie a string to Bob");
        assert_eq!(hits[1].input_request, "tie a string to Alice");
    }

    #[tokio::test]
    async fn empty_query_returns_everything_within_limit() {
        let dir = tempdir().unwrap();
        let store = JsonlExecutionLogStore::new(dir.path().join("logs.jsonl")).unwrap();
        for i in 0..5 {
            append_spaced(&store, new_log(&format!("request {}", i), vec![])).await;
        }

        let filter = RecallFilter {
            entity: None,
            limit: 3,
        };
        let hits = store.search("", &Layer::Public, &filter).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].input_request, "request 4");
    }

    #[tokio::test]
    async fn entity_filter_restricts_results() {
        let dir = tempdir().unwrap();
        let store = JsonlExecutionLogStore::new(dir.path().join("logs.jsonl")).unwrap();
        store.append(new_log("tie a string to Alice", vec!["alice"])).await.unwrap();
        store.append(new_log("tie a string to Bob", vec!["bob"])).await.unwrap();

        let filter = RecallFilter {
            entity: Some("alice".to_string()),
            limit: 10,
        };
        let hits = store.search("", &Layer::Public, &filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].input_request, "tie a string to Alice");
    }

    #[tokio::test]
    async fn scoped_logs_hidden_from_other_layers() {
        let dir = tempdir().unwrap();
        let store = JsonlExecutionLogStore::new(dir.path().join("logs.jsonl")).unwrap();
        let mut scoped = new_log("private note", vec![]);
        scoped.layer = Layer::Scoped("tenant-a".to_string());
        store.append(scoped).await.unwrap();
        store.append(new_log("public note", vec![])).await.unwrap();

        let public = store
            .search("note", &Layer::Public, &RecallFilter::default())
            .await
            .unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].input_request, "public note");

        let tenant = store
            .search(
                "note",
                &Layer::Scoped("tenant-a".to_string()),
                &RecallFilter::default(),
            )
            .await
            .unwrap();
        assert_eq!(tenant.len(), 2);
    }

    #[tokio::test]
    async fn semantic_search_ranks_by_similarity() {
        let dir = tempdir().unwrap();
        let store = JsonlExecutionLogStore::new(dir.path().join("logs.jsonl")).unwrap();
        let mut near = new_log("tie a string to Alice", vec![]);
        near.request_embedding = Some(vec![1.0, 0.0]);
        store.append(near).await.unwrap();
        let mut far = new_log("water the plants", vec![]);
        far.request_embedding = Some(vec![0.2, 0.98]);
        store.append(far).await.unwrap();
        store.append(new_log("no embedding", vec![])).await.unwrap();

        let hits = store
            .search_semantic(&[0.9, 0.1], &Layer::Public, &RecallFilter::default())
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].input_request, "tie a string to Alice");
    }

    #[tokio::test]
    async fn malformed_lines_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs.jsonl");
        let store = JsonlExecutionLogStore::new(&path).unwrap();
        store.append(new_log("good record", vec![])).await.unwrap();
        {
            use std::io::Write as _;
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(file, "{{not json").unwrap();
        }

        let hits = store
            .search("", &Layer::Public, &RecallFilter::default())
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }
}
