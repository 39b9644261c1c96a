//! Drives the dashboard core against the in-memory demo documents.
//!
//! ```text
//! cargo run -p core-service --example dashboard_demo
//! RUST_LOG=core_documents=debug cargo run -p core-service --example dashboard_demo
//! ```

use bytes::Bytes;
use core_runtime::events::EventSeverity;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_service::{
    CoreEvent, DashboardConfig, DashboardCore, DocumentListSnapshot, DocumentStatus, ListQuery,
    UploadFile,
};
use std::error::Error;
use tokio::sync::watch;

/// Wait until a fetch has been committed and nothing is loading.
async fn settled(
    updates: &mut watch::Receiver<DocumentListSnapshot>,
) -> Result<DocumentListSnapshot, Box<dyn Error>> {
    loop {
        updates.changed().await?;
        let snapshot = updates.borrow_and_update().clone();
        if !snapshot.is_loading {
            return Ok(snapshot);
        }
    }
}

fn print_page(title: &str, snapshot: &DocumentListSnapshot) {
    println!(
        "\n{} [{}] page {}/{} ({} documents)",
        title,
        snapshot.ui_state,
        snapshot.pagination.current_page,
        snapshot.pagination.total_pages,
        snapshot.pagination.total_documents
    );
    for doc in &snapshot.documents {
        println!(
            "  #{:<3} {:<11} {:>9} B  {}",
            doc.id, doc.status, doc.file_size, doc.original_filename
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging(LoggingConfig::default().with_format(LogFormat::Compact))?;

    let config = DashboardConfig::builder()
        .api_base_url("http://localhost:8000/api")
        .demo_mode(true)
        .build()?;
    let core = DashboardCore::bootstrap(config)?;

    let mut events = core.events().stream().filter(|e| {
        matches!(e, CoreEvent::Upload(_)) || e.severity() >= EventSeverity::Info
    });
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("  event: {:?} {}", event.severity(), event.description());
        }
    });

    let mut updates = core.documents().subscribe();

    core.documents().request_load(ListQuery::new(1, 5));
    print_page("All documents", &settled(&mut updates).await?);

    // rapid typing collapses into one request for the final term
    for term in ["n", "nf", "nfe"] {
        core.documents()
            .request_load(ListQuery::new(1, 5).with_search(term));
    }
    print_page("Search 'nfe'", &settled(&mut updates).await?);

    core.documents().request_load(
        ListQuery::new(1, 5).with_status(Some(DocumentStatus::Pending)),
    );
    print_page("Pending", &settled(&mut updates).await?);

    let report = core
        .uploads()
        .add_files(vec![
            UploadFile::new(
                "nota_fiscal_maio.pdf",
                "application/pdf",
                Bytes::from_static(b"%PDF-1.7 demo"),
            ),
            UploadFile::new("lista_compras.txt", "text/plain", Bytes::from_static(b"cafe")),
        ])
        .await;
    println!(
        "\nUploads: {} succeeded, {} failed, {} rejected",
        report.succeeded.len(),
        report.failed.len(),
        report.rejected.len()
    );
    for entry in core.uploads().entries() {
        println!("  {} {} {}%", entry.file_name(), entry.status, entry.progress);
    }

    print_page("Pending after upload", &settled(&mut updates).await?);

    core.shutdown();
    Ok(())
}
