//! Entry point for the Language Server Protocol implementation.

use qml_i18n_language_server::Backend;
use tower_lsp::{
    LspService,
    Server,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // stdout は LSP のチャネルなので、ログはファイルまたは stderr へ
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _guard = if let Ok(log_dir) = std::env::var("QML_I18N_LOG_DIR") {
        let appender = tracing_appender::rolling::daily(log_dir, "qml-i18n-language-server.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
        guard
    } else {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
        guard
    };

    let (stdin, stdout) = (tokio::io::stdin(), tokio::io::stdout());
    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
