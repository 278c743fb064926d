//! Core language server implementation

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, info};

use crate::completion;
use crate::config::Settings;
use crate::diagnostics;
use crate::hover;

/// Last known contents of an open document.
#[derive(Debug, Clone)]
struct DocumentState {
    text: String,
    version: i32,
}

/// The main Backend struct for the Compose Language Server
pub struct Backend {
    /// LSP client to communicate with the editor
    client: Client,
    settings: Arc<RwLock<Settings>>,
    /// Open documents managed by the server
    documents: Arc<RwLock<HashMap<Url, DocumentState>>>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            settings: Arc::new(RwLock::new(Settings::default())),
            documents: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn document_text(&self, uri: &Url) -> Option<String> {
        let documents = self.documents.read().await;
        documents.get(uri).map(|state| state.text.clone())
    }

    /// Validate a document and publish diagnostics
    async fn validate_document(&self, uri: Url) {
        let Some(state) = self.documents.read().await.get(&uri).cloned() else {
            debug!("Document not found for validation: {}", uri);
            return;
        };
        let settings = self.settings.read().await.clone();

        let diagnostics = diagnostics::validate_document(&state.text, &settings);
        debug!(%uri, version = state.version, count = diagnostics.len(), "publishing diagnostics");

        self.client
            .publish_diagnostics(uri, diagnostics, Some(state.version))
            .await;
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("Initializing Compose Language Server");
        *self.settings.write().await = Settings::from_init_options(params.initialization_options);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: Some(vec![":".to_string(), " ".to_string(), "-".to_string()]),
                    work_done_progress_options: Default::default(),
                    all_commit_characters: None,
                    completion_item: Default::default(),
                }),
                text_document_sync: Some(TextDocumentSyncCapability::Options(TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(TextDocumentSyncKind::FULL),
                    will_save: None,
                    will_save_wait_until: None,
                    save: Some(SaveOptions::default().into()),
                })),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: "compose-ls".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("Compose Language Server initialized");
        self.client
            .log_message(MessageType::INFO, "Compose Language Server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Shutting down Compose Language Server");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        info!("Document opened: {}", uri);

        {
            let mut documents = self.documents.write().await;
            documents.insert(
                uri.clone(),
                DocumentState {
                    text: params.text_document.text,
                    version: params.text_document.version,
                },
            );
        }

        self.validate_document(uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        debug!("Document changed: {}", uri);

        // Full sync: the last change carries the whole text.
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        {
            let mut documents = self.documents.write().await;
            documents.insert(
                uri.clone(),
                DocumentState {
                    text: change.text,
                    version: params.text_document.version,
                },
            );
        }

        self.validate_document(uri).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        info!("Document saved: {}", uri);

        if let Some(text) = params.text {
            if let Some(state) = self.documents.write().await.get_mut(&uri) {
                state.text = text;
            }
        }
        self.validate_document(uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        info!("Document closed: {}", uri);

        self.documents.write().await.remove(&uri);

        // Clear diagnostics for the closed document
        self.client.publish_diagnostics(uri, vec![], None).await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let position = params.text_document_position.position;
        let uri = params.text_document_position.text_document.uri;
        let Some(text) = self.document_text(&uri).await else {
            debug!("Completion requested for unknown document: {}", uri);
            return Ok(None);
        };
        let limit = self.settings.read().await.max_suggestions;

        let items: Vec<CompletionItem> = completion::suggest_with_limit(
            &text,
            position.line as usize,
            position.character as usize,
            limit,
        )
        .iter()
        .enumerate()
        .map(|(rank, suggestion)| completion::to_completion_item(rank, suggestion))
        .collect();

        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let position = params.text_document_position_params.position;
        let uri = params.text_document_position_params.text_document.uri;
        let Some(text) = self.document_text(&uri).await else {
            return Ok(None);
        };
        Ok(hover::provide_hover(&text, position))
    }
}
