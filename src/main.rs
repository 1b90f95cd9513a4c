use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    earth2_mcp_gateway::cli::run().await
}
