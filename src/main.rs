use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fts_console::config::GatewayArgs;
use fts_console::notification::relay_session_feedback;
use fts_console::{
    Document, GatewayConfig, GatewayError, HttpGateway, IndexConfig, Notification,
    NotificationChannel, Outcome, OverviewTracker, PreprocessorConfig, SearchModel, SearchQuery,
    SearchSession, SessionManager, Severity, UploadFile,
};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Administration console for a document search engine", long_about = None)]
struct Args {
    #[command(flatten)]
    gateway: GatewayArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all indices
    Indices,

    /// Create an index, optionally seeded from a JSON file of documents
    CreateIndex {
        name: String,
        #[arg(long, default_value = "en")]
        lang: String,
        /// Keep letter case
        #[arg(long)]
        keep_case: bool,
        /// Keep stopwords in the index
        #[arg(long)]
        keep_stopwords: bool,
        /// Disable stemming
        #[arg(long)]
        no_stemmer: bool,
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Delete an index
    DeleteIndex { name: String },

    /// Search an index
    Search {
        index: String,
        query: String,
        #[arg(short, long, default_value = "tfidf")]
        model: String,
        /// Number of results; all matches when omitted
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Write the result set as JSON to this file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Show one document
    Get { index: String, id: String },

    /// Create or modify a document from a JSON file
    Save {
        index: String,
        file: PathBuf,
        /// Document id; overrides the id in the file
        #[arg(long)]
        id: Option<String>,
    },

    /// Upload a JSON file of documents into an index
    Upload { index: String, file: PathBuf },

    /// Delete a document, optionally showing how it affects a search
    Delete {
        index: String,
        id: String,
        #[arg(short, long)]
        query: Option<String>,
        #[arg(short, long, default_value = "tfidf")]
        model: String,
    },
}

// Print and acknowledge the pending notification
fn flush_notifications(channel: &NotificationChannel) {
    if let Some(notification) = channel.consume() {
        eprintln!("[{}] {}", notification.severity, notification.message);
    }
}

fn report(channel: &NotificationChannel, err: GatewayError) -> ExitCode {
    tracing::debug!("request failed: {}", err);
    channel.show(Notification::new(err.user_message(), Severity::Error));
    flush_notifications(channel);
    ExitCode::FAILURE
}

fn report_message(channel: &NotificationChannel, message: Option<String>, fallback: &str) {
    let message = message.unwrap_or_else(|| fallback.to_string());
    channel.show(Notification::new(message, Severity::Success).with_autohide(5));
    flush_notifications(channel);
}

fn print_documents(documents: &[Document]) {
    for doc in documents {
        let score = doc
            .score
            .map(|s| format!("{:.3}", s))
            .unwrap_or_else(|| "-".to_string());
        let label = doc.title.as_deref().unwrap_or(&doc.text);
        println!("{}\t{}\t{}", doc.id, score, label);
    }
}

// Run the session's current query and render it the way the search view does
async fn run_search(
    session: &SearchSession,
    tracker: &mut OverviewTracker,
    channel: &NotificationChannel,
) -> Outcome {
    let outcome = session.search().await;
    let state = session.state();

    let overview = tracker.update(&state);
    flush_notifications(channel);
    relay_session_feedback(session, channel);
    flush_notifications(channel);

    if outcome == Outcome::Applied {
        print!("{}", overview);
        println!();
        print_documents(state.documents.as_deref().unwrap_or_default());
    }
    outcome
}

fn load_document(path: &Path, id: Option<String>) -> Result<Document> {
    let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    let mut value: serde_json::Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let object = value
        .as_object_mut()
        .context("A document must be a JSON object")?;
    match id {
        Some(id) => {
            object.remove("docId");
            object.insert("id".to_string(), id.into());
        }
        // An empty id lets the backend assign one
        None if !object.contains_key("docId") => {
            object.entry("id").or_insert_with(|| "".into());
        }
        None => {}
    }

    serde_json::from_value(value).context("File does not describe a document")
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = GatewayConfig::try_from(&args.gateway)?;
    let gateway = Arc::new(HttpGateway::new(&config).context("Failed to build HTTP client")?);
    let channel = NotificationChannel::new();
    tracing::debug!("using backend at {}", gateway.base_url());

    let code = match args.command {
        Command::Indices => match gateway.list_indices().await {
            Ok(indices) => {
                println!("Found {} indices", indices.len());
                for index in indices {
                    println!(
                        "{}\t{} documents\t{} terms\t{}",
                        index.name,
                        index.n_docs,
                        index.n_terms,
                        index.models.join(",")
                    );
                }
                ExitCode::SUCCESS
            }
            Err(err) => report(&channel, err),
        },

        Command::CreateIndex {
            name,
            lang,
            keep_case,
            keep_stopwords,
            no_stemmer,
            file,
        } => {
            let preprocessor = PreprocessorConfig {
                lowercase: !keep_case,
                remove_stopwords: !keep_stopwords,
                use_stemmer: !no_stemmer,
                lang,
                ..PreprocessorConfig::default()
            };
            let config = IndexConfig::new(name).with_preprocessor(preprocessor);
            let seed = match file {
                Some(path) => Some(
                    UploadFile::from_path(&path)
                        .await
                        .with_context(|| format!("Cannot read {}", path.display()))?,
                ),
                None => None,
            };

            match gateway.create_index(&config, seed).await {
                Ok(message) => {
                    report_message(&channel, message, "Index was created");
                    ExitCode::SUCCESS
                }
                Err(err) => report(&channel, err),
            }
        }

        Command::DeleteIndex { name } => match gateway.delete_index(&name).await {
            Ok(()) => {
                report_message(&channel, None, &format!("Index {} was deleted", name));
                ExitCode::SUCCESS
            }
            Err(err) => report(&channel, err),
        },

        Command::Search {
            index,
            query,
            model,
            top_k,
            export,
        } => {
            let manager = SessionManager::new(gateway.clone());
            let mut tracker = OverviewTracker::new(channel.clone());
            let session = manager.open(index);

            let mut query = SearchQuery::new(query, SearchModel::from(model));
            if let Some(k) = top_k {
                query = query.with_top_k(k);
            }
            session.clear_search_result();
            session.set_query(query);

            let outcome = run_search(&session, &mut tracker, &channel).await;
            if let (Outcome::Applied, Some(path)) = (outcome, export) {
                let json = session.export_documents_json()?;
                let mut file = File::create(&path)
                    .with_context(|| format!("Cannot create {}", path.display()))?;
                file.write_all(json.as_bytes())?;
                println!("Saved results to {}", path.display());
            }
            manager.close(session);

            match outcome {
                Outcome::Failed => ExitCode::FAILURE,
                _ => ExitCode::SUCCESS,
            }
        }

        Command::Get { index, id } => match gateway.get_document(&index, &id).await {
            Ok(document) => {
                println!("{}", serde_json::to_string_pretty(&document)?);
                ExitCode::SUCCESS
            }
            Err(err) => report(&channel, err),
        },

        Command::Save { index, file, id } => {
            let document = load_document(&file, id)?;
            match gateway.save_document(&index, &document).await {
                Ok(message) => {
                    report_message(&channel, message, "Document was saved");
                    ExitCode::SUCCESS
                }
                Err(err) => report(&channel, err),
            }
        }

        Command::Upload { index, file } => {
            let upload = UploadFile::from_path(&file)
                .await
                .with_context(|| format!("Cannot read {}", file.display()))?;
            match gateway.upload_documents(&index, upload).await {
                Ok(message) => {
                    report_message(&channel, message, "Files were successfully added");
                    ExitCode::SUCCESS
                }
                Err(err) => report(&channel, err),
            }
        }

        Command::Delete {
            index,
            id,
            query,
            model,
        } => {
            let manager = SessionManager::new(gateway.clone());
            let mut tracker = OverviewTracker::new(channel.clone());
            let session = manager.open(index);

            if let Some(text) = query {
                session.clear_search_result();
                session.set_query(SearchQuery::new(text, SearchModel::from(model)));
                run_search(&session, &mut tracker, &channel).await;
            }

            let outcome = session.delete_document(&Document::new(id, "")).await;
            relay_session_feedback(&session, &channel);
            flush_notifications(&channel);

            let state = session.state();
            if outcome == Outcome::Applied && state.documents.is_some() {
                println!();
                print!("{}", tracker.update(&state));
                flush_notifications(&channel);
            }
            manager.close(session);

            match outcome {
                Outcome::Failed => ExitCode::FAILURE,
                _ => ExitCode::SUCCESS,
            }
        }
    };

    Ok(code)
}
