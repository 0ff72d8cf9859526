use clap::Parser;
use coursepay::application::workflow::PurchaseWorkflow;
use coursepay::domain::account::{Account, AccountId};
use coursepay::domain::course::Course;
use coursepay::domain::ports::{
    AccountStore, AccountStoreRef, CatalogStoreRef, NotificationSenderRef, PaymentProviderRef,
    ProgressStoreRef,
};
use coursepay::domain::purchase::{OrderId, PaymentConfirmation, PaymentId};
use coursepay::infrastructure::in_memory::{
    InMemoryAccountStore, InMemoryCatalog, InMemoryProgressStore,
};
use coursepay::infrastructure::notify::LogNotifier;
use coursepay::infrastructure::provider::SandboxProvider;
#[cfg(feature = "storage-rocksdb")]
use coursepay::infrastructure::rocksdb::RocksDbStore;
use coursepay::interfaces::csv::catalog_reader::CatalogReader;
use coursepay::interfaces::csv::command_reader::{CommandOp, CommandReader, CommandRecord};
use coursepay::interfaces::csv::outcome_writer::OutcomeWriter;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::error;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input purchase-command CSV file
    input: PathBuf,

    /// Catalog seed CSV file
    #[arg(long)]
    catalog: PathBuf,

    /// Shared secret for payment-confirmation signatures
    #[arg(long, default_value = "whsec_demo")]
    secret: String,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let courses = load_catalog(&cli.catalog)?;
    let (catalog, accounts, progress) = open_stores(&cli, courses).await?;

    let provider: PaymentProviderRef = Arc::new(SandboxProvider::new());
    let notifier: NotificationSenderRef = Arc::new(LogNotifier::new());
    let workflow = PurchaseWorkflow::new(
        catalog,
        Arc::clone(&accounts),
        progress,
        provider,
        notifier,
        cli.secret.as_bytes(),
    );

    // Process commands
    let file = File::open(&cli.input).into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = OutcomeWriter::new(stdout.lock());
    for command in CommandReader::new(file).commands() {
        match command {
            Ok(command) => run_command(&workflow, &accounts, command, &mut writer).await?,
            Err(err) => error!(%err, "skipping malformed command row"),
        }
    }
    writer.flush().into_diagnostic()?;

    Ok(())
}

fn load_catalog(path: &Path) -> Result<Vec<Course>> {
    let file = File::open(path).into_diagnostic()?;
    CatalogReader::new(file)
        .courses()
        .collect::<coursepay::error::Result<Vec<_>>>()
        .into_diagnostic()
}

async fn in_memory_stores(
    courses: Vec<Course>,
) -> (CatalogStoreRef, AccountStoreRef, ProgressStoreRef) {
    let catalog = InMemoryCatalog::new();
    for course in courses {
        catalog.insert_course(course).await;
    }
    (
        Arc::new(catalog),
        Arc::new(InMemoryAccountStore::new()),
        Arc::new(InMemoryProgressStore::new()),
    )
}

#[cfg(feature = "storage-rocksdb")]
async fn open_stores(
    cli: &Cli,
    courses: Vec<Course>,
) -> Result<(CatalogStoreRef, AccountStoreRef, ProgressStoreRef)> {
    if let Some(db_path) = &cli.db_path {
        // Use persistent storage (RocksDB); one store backs all three ports.
        let store = RocksDbStore::open(db_path).into_diagnostic()?;
        for course in &courses {
            store.seed_course(course).into_diagnostic()?;
        }
        return Ok((
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
        ));
    }
    Ok(in_memory_stores(courses).await)
}

#[cfg(not(feature = "storage-rocksdb"))]
async fn open_stores(
    _cli: &Cli,
    courses: Vec<Course>,
) -> Result<(CatalogStoreRef, AccountStoreRef, ProgressStoreRef)> {
    Ok(in_memory_stores(courses).await)
}

/// Account provisioning belongs to the out-of-scope user service; the driver
/// stubs an account per purchaser before running its command.
async fn run_command<W: io::Write>(
    workflow: &PurchaseWorkflow,
    accounts: &AccountStoreRef,
    command: CommandRecord,
    writer: &mut OutcomeWriter<W>,
) -> Result<()> {
    let purchaser = AccountId::new(command.purchaser.clone());
    accounts
        .register(Account::new(
            purchaser.clone(),
            format!("{purchaser}@students.example.com"),
            command.purchaser.clone(),
        ))
        .await
        .into_diagnostic()?;

    match command.op {
        CommandOp::Begin => {
            let result = workflow
                .begin_purchase(&purchaser, &command.course_ids())
                .await;
            writer
                .write_begin(&command.purchaser, &result)
                .into_diagnostic()?;
        }
        CommandOp::Confirm => {
            let confirmation = PaymentConfirmation {
                purchaser,
                order: OrderId::new(command.order.clone()),
                payment: PaymentId::new(command.payment.clone()),
                signature: command.signature.clone(),
                courses: command.course_ids(),
            };
            let result = workflow.confirm_purchase(&confirmation).await;
            writer
                .write_confirm(&command.purchaser, &result)
                .into_diagnostic()?;
        }
    }
    Ok(())
}
