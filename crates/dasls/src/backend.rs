//
// backend.rs
//
// tower-lsp server wiring document sync, configuration and file watching to
// the symbol handlers
//

use std::sync::Arc;

use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::Client;
use tower_lsp::LanguageServer;
use tower_lsp::LspService;
use tower_lsp::Server;

use crate::config::parse_config;
use crate::handlers;
use crate::state::WorldState;

const WATCHED_FILES_REGISTRATION_ID: &str = "dasls-watched-files";

pub struct Backend {
    client: Client,
    state: Arc<RwLock<WorldState>>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            state: Arc::new(RwLock::new(WorldState::default())),
        }
    }

    async fn publish_diagnostics(&self, uri: &Url) {
        let (diagnostics, version) = {
            let mut state = self.state.write().await;
            let version = state.get_document(uri).and_then(|d| d.version);
            (handlers::diagnostics(&mut state, uri), version)
        };
        log::trace!(
            "Publishing {} diagnostics for {}",
            diagnostics.len(),
            uri
        );
        self.client
            .publish_diagnostics(uri.clone(), diagnostics, version)
            .await;
    }

    async fn publish_diagnostics_all(&self, uris: &[Url]) {
        for uri in uris {
            self.publish_diagnostics(uri).await;
        }
    }

    async fn register_file_watcher(&self) {
        let extension = self.state.read().await.config.file_extension.clone();
        let options = DidChangeWatchedFilesRegistrationOptions {
            watchers: vec![FileSystemWatcher {
                glob_pattern: GlobPattern::String(format!("**/*.{}", extension)),
                kind: None,
            }],
        };
        let register_options = match serde_json::to_value(options) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Failed to encode file watcher options: {}", e);
                return;
            }
        };
        let registration = Registration {
            id: WATCHED_FILES_REGISTRATION_ID.to_string(),
            method: "workspace/didChangeWatchedFiles".to_string(),
            register_options: Some(register_options),
        };
        if let Err(e) = self.client.register_capability(vec![registration]).await {
            log::info!("Client declined file watcher registration: {}", e);
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        log::info!("Initializing dasls");

        let mut state = self.state.write().await;

        if let Some(folders) = params.workspace_folders {
            for folder in folders {
                log::info!("Adding workspace folder: {}", folder.uri);
                state.workspace_folders.push(folder.uri);
            }
        } else if let Some(root_uri) = params.root_uri {
            log::info!("Adding root URI as workspace folder: {}", root_uri);
            state.workspace_folders.push(root_uri);
        }

        if let Some(config) = params
            .initialization_options
            .as_ref()
            .and_then(parse_config)
        {
            state.set_config(config);
        }

        drop(state);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![String::from(".")]),
                    ..Default::default()
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                signature_help_provider: Some(SignatureHelpOptions {
                    trigger_characters: Some(vec![String::from("("), String::from(",")]),
                    ..Default::default()
                }),
                definition_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: String::from("dasls"),
                version: Some(String::from(env!("CARGO_PKG_VERSION"))),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        log::info!("dasls initialized");
        self.register_file_watcher().await;
    }

    async fn shutdown(&self) -> Result<()> {
        log::info!("dasls shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let stale = {
            let mut state = self.state.write().await;
            state.open_document(
                uri.clone(),
                &params.text_document.text,
                Some(params.text_document.version),
            );
            // The buffer may differ from what was cached from disk
            state
                .refresh(&uri)
                .map(|(_, stale)| stale)
                .unwrap_or_default()
        };
        self.publish_diagnostics(&uri).await;
        self.publish_diagnostics_all(&stale).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let stale = {
            let mut state = self.state.write().await;
            let Some(doc) = state.documents.get_mut(&uri) else {
                log::warn!("Change for unknown document {}", uri);
                return;
            };
            doc.version = Some(params.text_document.version);
            for change in params.content_changes {
                doc.apply_change(change);
            }
            state
                .refresh(&uri)
                .map(|(_, stale)| stale)
                .unwrap_or_default()
        };
        self.publish_diagnostics(&uri).await;
        self.publish_diagnostics_all(&stale).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        let stale = {
            let mut state = self.state.write().await;
            state
                .refresh(&uri)
                .map(|(_, stale)| stale)
                .unwrap_or_default()
        };
        self.publish_diagnostics(&uri).await;
        self.publish_diagnostics_all(&stale).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.state.write().await.close_document(&uri);
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        log::trace!("Configuration changed");
        let Some(config) = parse_config(&params.settings) else {
            log::warn!("No usable settings in configuration change, keeping current configuration");
            return;
        };
        let open_uris: Vec<Url> = {
            let mut state = self.state.write().await;
            state.set_config(config);
            state.documents.keys().cloned().collect()
        };
        self.publish_diagnostics_all(&open_uris).await;
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        log::trace!(
            "Received watched files change: {} changes",
            params.changes.len()
        );
        let affected: Vec<Url> = {
            let mut state = self.state.write().await;
            let mut affected = Vec::new();
            for change in &params.changes {
                // Open documents are authoritative over disk
                if state.documents.contains_key(&change.uri) {
                    continue;
                }
                let Ok(path) = change.uri.to_file_path() else {
                    continue;
                };
                if !state.config.is_source_file(&path) {
                    continue;
                }
                for uri in state.file_changed_on_disk(&path) {
                    if !affected.contains(&uri) {
                        affected.push(uri);
                    }
                }
            }
            affected
        };
        self.publish_diagnostics_all(&affected).await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let mut state = self.state.write().await;
        Ok(handlers::completion(
            &mut state,
            &params.text_document_position.text_document.uri,
            params.text_document_position.position,
        ))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let mut state = self.state.write().await;
        Ok(handlers::hover(
            &mut state,
            &params.text_document_position_params.text_document.uri,
            params.text_document_position_params.position,
        ))
    }

    async fn signature_help(&self, params: SignatureHelpParams) -> Result<Option<SignatureHelp>> {
        let mut state = self.state.write().await;
        Ok(handlers::signature_help(
            &mut state,
            &params.text_document_position_params.text_document.uri,
            params.text_document_position_params.position,
        ))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let mut state = self.state.write().await;
        Ok(handlers::goto_definition(
            &mut state,
            &params.text_document_position_params.text_document.uri,
            params.text_document_position_params.position,
        ))
    }
}

pub async fn start_lsp() -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}
