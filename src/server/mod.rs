//! MCP server on stdio, built on rmcp
//!
//! stdout carries protocol messages only; logging goes to stderr.

pub mod handler;
pub mod tools;

pub use handler::McpServer;

use rmcp::ServiceExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::info;

use crate::{HooksMcpError, Result};

/// Run one MCP session over `reader` and `writer` until the client goes away
pub async fn serve<R, W>(server: McpServer, reader: R, writer: W) -> Result<()>
where
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Send + Unpin + 'static,
{
    let actions = server.config().actions.len();
    let prompts = server.config().prompts.len();

    let service = server
        .serve((reader, writer))
        .await
        .map_err(|e| HooksMcpError::Server(format!("MCP initialization failed: {e}")))?;
    info!(
        "Client initialized, serving {} actions and {} prompts",
        actions, prompts
    );

    let reason = service
        .waiting()
        .await
        .map_err(|e| HooksMcpError::Server(e.to_string()))?;
    info!("Session ended: {:?}", reason);
    Ok(())
}

/// Serve on the process's stdin and stdout
pub async fn serve_stdio(server: McpServer) -> Result<()> {
    info!(
        "Starting MCP server '{}' on stdio",
        server.config().server_name
    );
    serve(server, tokio::io::stdin(), tokio::io::stdout()).await
}
