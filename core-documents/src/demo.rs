//! In-memory demo data set
//!
//! Used when the dashboard runs without a backend (`demo_mode`) and as the
//! fallback the controller shows when the very first fetch fails. Filtering
//! and pagination follow the server contract so the two are interchangeable.

use async_trait::async_trait;
use bridge_traits::time::{Clock, SystemClock};
use chrono::{DateTime, Duration, TimeZone, Utc};
use core_runtime::logging::strip_path;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use crate::api::{DocumentsApi, ProgressSink, UploadFile};
use crate::error::Result;
use crate::models::{Document, DocumentListResponse, DocumentStatus, ListQuery, PaginationInfo};

/// Owner id of every demo document.
pub const DEMO_USER_ID: i64 = 1;

const SAMPLES: &[(&str, &str, u64, DocumentStatus)] = &[
    (
        "nfe_35240112345678000190550010000012341.xml",
        "application/xml",
        8_412,
        DocumentStatus::Processed,
    ),
    ("nota_fiscal_servico_janeiro.pdf", "application/pdf", 182_344, DocumentStatus::Processed),
    ("recibo_aluguel_fevereiro.pdf", "application/pdf", 96_120, DocumentStatus::Processed),
    ("cupom_fiscal_mercado.jpg", "image/jpeg", 1_204_880, DocumentStatus::Processing),
    ("boleto_energia_marco.pdf", "application/pdf", 74_002, DocumentStatus::Pending),
    (
        "contrato_prestacao_servicos.docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        48_990,
        DocumentStatus::Processed,
    ),
    ("darf_irpj_trimestre1.pdf", "application/pdf", 55_310, DocumentStatus::Error),
    ("nfe_35240298765432000110550010000056781.xml", "text/xml", 9_876, DocumentStatus::Processed),
    ("comprovante_pagamento_fornecedor.png", "image/png", 642_118, DocumentStatus::Processed),
    ("guia_das_simples_nacional.pdf", "application/pdf", 61_204, DocumentStatus::Pending),
    ("extrato_bancario_abril.pdf", "application/pdf", 233_091, DocumentStatus::Processing),
    ("declaracao_faturamento.doc", "application/msword", 38_400, DocumentStatus::Processed),
    ("nota_fiscal_consumidor_nfce.xml", "application/xml", 7_020, DocumentStatus::Error),
    ("recibo_honorarios_contabeis.pdf", "application/pdf", 88_777, DocumentStatus::Processed),
    ("nfe_entrada_mercadorias.xml", "application/xml", 11_530, DocumentStatus::Pending),
];

fn demo_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Deterministic fiscal document collection.
#[derive(Debug, Clone)]
pub struct DemoDocuments {
    documents: Vec<Document>,
}

impl Default for DemoDocuments {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoDocuments {
    pub fn new() -> Self {
        let epoch = demo_epoch();
        let documents = SAMPLES
            .iter()
            .enumerate()
            .map(|(index, (name, mime, size, status))| {
                let id = index as i64 + 1;
                let uploaded_at = epoch + Duration::hours(index as i64 * 26);
                let processed = matches!(status, DocumentStatus::Processed | DocumentStatus::Error);
                Document {
                    id,
                    filename: format!("{:04}_{}", id, name),
                    original_filename: name.to_string(),
                    file_size: *size,
                    mime_type: mime.to_string(),
                    status: *status,
                    uploaded_at,
                    processed_at: processed.then(|| uploaded_at + Duration::minutes(3)),
                    user_id: DEMO_USER_ID,
                    processing_result: (*status == DocumentStatus::Processed)
                        .then(|| serde_json::json!({ "pages": 1 + index % 4, "source": "demo" })),
                }
            })
            .collect();

        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn insert(&mut self, document: Document) {
        self.documents.push(document);
    }

    pub fn next_id(&self) -> i64 {
        self.documents.iter().map(|d| d.id).max().unwrap_or(0) + 1
    }

    /// Filter, sort newest first and paginate like the server does.
    pub fn page(&self, query: &ListQuery) -> DocumentListResponse {
        let needle = query
            .filters
            .search
            .as_deref()
            .map(str::to_lowercase);

        let mut matching: Vec<&Document> = self
            .documents
            .iter()
            .filter(|doc| query.filters.status.map_or(true, |s| doc.status == s))
            .filter(|doc| {
                needle.as_deref().map_or(true, |n| {
                    doc.original_filename.to_lowercase().contains(n)
                        || doc.filename.to_lowercase().contains(n)
                })
            })
            .collect();
        matching.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then(b.id.cmp(&a.id)));

        let pagination = PaginationInfo::new(query.page, query.limit, matching.len() as u64);
        let offset = (pagination.current_page as usize - 1) * pagination.limit as usize;
        let documents = matching
            .into_iter()
            .skip(offset)
            .take(pagination.limit as usize)
            .cloned()
            .collect();

        DocumentListResponse {
            documents,
            pagination,
            filters: query.filters.clone(),
        }
    }
}

/// [`DocumentsApi`] served entirely from a [`DemoDocuments`] collection.
///
/// Uploads are accepted and show up as `pending` documents.
pub struct DemoDocumentsApi {
    store: Mutex<DemoDocuments>,
    clock: Arc<dyn Clock>,
}

impl Default for DemoDocumentsApi {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoDocumentsApi {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Mutex::new(DemoDocuments::new()),
            clock,
        }
    }

    pub fn document_count(&self) -> usize {
        self.store.lock().len()
    }
}

#[async_trait]
impl DocumentsApi for DemoDocumentsApi {
    async fn list(&self, query: &ListQuery) -> Result<DocumentListResponse> {
        Ok(self.store.lock().page(query))
    }

    async fn upload(&self, file: &UploadFile, _progress: Option<ProgressSink>) -> Result<Document> {
        let mut store = self.store.lock();
        let id = store.next_id();
        let document = Document {
            id,
            filename: format!("{:04}_{}", id, file.file_name),
            original_filename: file.file_name.clone(),
            file_size: file.size(),
            mime_type: file.content_type.clone(),
            status: DocumentStatus::Pending,
            uploaded_at: self.clock.now(),
            processed_at: None,
            user_id: DEMO_USER_ID,
            processing_result: None,
        };
        store.insert(document.clone());
        debug!(id, file = %strip_path(&file.file_name), "Demo upload stored");
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::time::FixedClock;
    use bytes::Bytes;

    #[test]
    fn test_first_page() {
        let demo = DemoDocuments::new();
        let page = demo.page(&ListQuery::new(1, 10));

        assert_eq!(page.documents.len(), 10);
        assert_eq!(page.pagination.total_documents, 15);
        assert_eq!(page.pagination.total_pages, 2);
        assert!(page.pagination.has_next);
        // newest first
        assert!(page.documents[0].uploaded_at > page.documents[9].uploaded_at);
    }

    #[test]
    fn test_last_page_and_out_of_range() {
        let demo = DemoDocuments::new();
        assert_eq!(demo.page(&ListQuery::new(2, 10)).documents.len(), 5);
        assert!(demo.page(&ListQuery::new(9, 10)).documents.is_empty());
    }

    #[test]
    fn test_filters() {
        let demo = DemoDocuments::new();

        let pending = demo.page(&ListQuery::new(1, 50).with_status(Some(DocumentStatus::Pending)));
        assert_eq!(pending.documents.len(), 3);
        assert!(pending
            .documents
            .iter()
            .all(|d| d.status == DocumentStatus::Pending));

        let nfe = demo.page(&ListQuery::new(1, 50).with_search("NFE"));
        assert_eq!(nfe.documents.len(), 3);
        assert_eq!(nfe.filters.search.as_deref(), Some("NFE"));

        let none = demo.page(&ListQuery::new(1, 10).with_search("does-not-exist"));
        assert!(none.documents.is_empty());
        assert_eq!(none.pagination.total_pages, 0);
    }

    #[tokio::test]
    async fn test_demo_upload_appears_as_pending() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let api = DemoDocumentsApi::with_clock(Arc::new(FixedClock(now)));

        let file = UploadFile::new(
            "recibo.pdf",
            "application/pdf",
            Bytes::from_static(b"%PDF-1.4"),
        );
        let created = api.upload(&file, None).await.unwrap();

        assert_eq!(created.id, 16);
        assert_eq!(created.status, DocumentStatus::Pending);
        assert_eq!(created.file_size, 8);
        assert_eq!(api.document_count(), 16);

        let first = api.list(&ListQuery::new(1, 10)).await.unwrap();
        assert_eq!(first.documents[0].id, 16);
    }
}
