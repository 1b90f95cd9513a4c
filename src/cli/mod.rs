use clap::{Parser, Subcommand};
use serde_json::{json, Value as J};
use std::process::ExitCode;
use std::time::Duration;

use crate::infra::config::Config;

#[derive(Parser)]
#[command(name = "earth2-mcp-gateway")]
#[command(about = "Earth-2 MCP gateway - server and admin CLI")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the gateway (default)
    Serve,
    /// Health check a running gateway
    Health {
        /// Gateway URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
    /// Validate configuration
    Config {
        /// Validate config without starting the gateway
        #[arg(long)]
        validate: bool,
    },
    /// Show gateway status and the configured downstream
    Status {
        /// Gateway URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
    /// Call one tool through a running gateway
    Call {
        /// Gateway URL
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
        /// Tool name, e.g. generate_weather_forecast
        #[arg(short, long)]
        tool: String,
        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    run_commands(cli.command.unwrap_or(Commands::Serve)).await
}

pub async fn run_commands(command: Commands) -> ExitCode {
    match command {
        Commands::Serve => match serve().await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("gateway failed: {e:#}");
                ExitCode::FAILURE
            }
        },
        Commands::Health { url } => match health_check(&url).await {
            Ok(()) => {
                println!("gateway is healthy");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("health check failed: {e:#}");
                ExitCode::FAILURE
            }
        },
        Commands::Config { validate: _ } => match validate_config() {
            Ok(cfg) => {
                println!("configuration is valid (port {}, downstream {})", cfg.port, cfg.earth2.base_url);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("configuration validation failed: {e:#}");
                ExitCode::FAILURE
            }
        },
        Commands::Status { url } => match show_status(&url).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("status check failed: {e:#}");
                ExitCode::FAILURE
            }
        },
        Commands::Call { url, tool, args } => match call_tool(&url, &tool, &args).await {
            Ok(envelope) => {
                println!("{envelope:#}");
                if envelope.get("error").is_some() {
                    ExitCode::FAILURE
                } else {
                    ExitCode::SUCCESS
                }
            }
            Err(e) => {
                eprintln!("call failed: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

async fn serve() -> anyhow::Result<()> {
    let cfg = Config::from_env_and_toml()?;
    crate::infra::boot::run_server(cfg).await
}

async fn health_check(url: &str) -> anyhow::Result<()> {
    let response = reqwest::Client::new()
        .get(format!("{}/healthz", url.trim_end_matches('/')))
        .timeout(Duration::from_millis(500))
        .send()
        .await?;

    if response.status().is_success() {
        Ok(())
    } else {
        anyhow::bail!("HTTP {}", response.status())
    }
}

fn validate_config() -> anyhow::Result<Config> {
    let cfg = Config::from_env_and_toml()?;
    cfg.validate()?;
    Ok(cfg)
}

async fn rpc(url: &str, method: &str, params: J, timeout: Duration) -> anyhow::Result<J> {
    let envelope = reqwest::Client::new()
        .post(format!("{}/rpc", url.trim_end_matches('/')))
        .json(&json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": params }))
        .timeout(timeout)
        .send()
        .await?
        .json::<J>()
        .await?;
    Ok(envelope)
}

async fn show_status(url: &str) -> anyhow::Result<()> {
    health_check(url).await?;
    println!("Health: ok");

    match rpc(url, "tools/list", json!({}), Duration::from_secs(2)).await {
        Ok(v) => {
            let names: Vec<&str> = v["result"]["tools"]
                .as_array()
                .map(|tools| tools.iter().filter_map(|t| t["name"].as_str()).collect())
                .unwrap_or_default();
            println!("Tools: {}", if names.is_empty() { "none".to_owned() } else { names.join(", ") });
        }
        Err(e) => println!("Tools: unavailable ({e})"),
    }

    let cfg = Config::from_env();
    println!("\nConfiguration:");
    println!("  Port: {}", cfg.port);
    println!("  Downstream: {}", cfg.earth2.base_url);
    println!("  Bearer token: {}", if cfg.earth2.api_token.is_empty() { "not set" } else { "set" });
    println!(
        "  Log Level: {}",
        std::env::var("RUST_LOG").unwrap_or(cfg.log_level)
    );
    Ok(())
}

async fn call_tool(url: &str, tool: &str, args: &str) -> anyhow::Result<J> {
    let arguments: J = serde_json::from_str(args)?;
    if !arguments.is_object() {
        anyhow::bail!("--args must be a JSON object");
    }
    rpc(
        url,
        "tools/call",
        json!({ "name": tool, "arguments": arguments }),
        Duration::from_secs(90),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serial_test::serial;
    use std::env;

    #[tokio::test]
    async fn health_check_fails_without_service() {
        assert!(health_check("http://localhost:9").await.is_err());
    }

    #[tokio::test]
    async fn health_check_ok_and_error_paths() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/healthz");
            then.status(200).body("ok");
        });
        assert!(health_check(&server.base_url()).await.is_ok());

        let bad = MockServer::start();
        bad.mock(|when, then| {
            when.method(GET).path("/healthz");
            then.status(500);
        });
        assert!(health_check(&bad.base_url()).await.is_err());
    }

    #[test]
    #[serial]
    fn validate_config_valid() {
        env::set_var("PORT", "8080");
        let result = validate_config();
        env::remove_var("PORT");
        assert!(result.is_ok());
    }

    #[test]
    #[serial]
    fn validate_config_invalid_port() {
        env::set_var("PORT", "0");
        let result = validate_config();
        env::remove_var("PORT");
        assert!(result.unwrap_err().to_string().contains("PORT cannot be 0"));
    }

    #[test]
    #[serial]
    fn validate_config_bad_downstream_url() {
        env::set_var("EARTH2_BASE_URL", "earth2:8000");
        let result = validate_config();
        env::remove_var("EARTH2_BASE_URL");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn status_ok_path_lists_tools() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/healthz");
            then.status(200).body("ok");
        });
        let rpc_mock = server.mock(|when, then| {
            when.method(POST).path("/rpc").json_body_partial(r#"{"method":"tools/list"}"#);
            then.status(200).json_body(json!({
                "jsonrpc": "2.0", "id": 1,
                "result": {"tools": [{"name": "generate_weather_forecast"}]}
            }));
        });
        assert!(show_status(&server.base_url()).await.is_ok());
        rpc_mock.assert();
    }

    #[tokio::test]
    async fn status_fails_when_unhealthy() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/healthz");
            then.status(500).body("boom");
        });
        assert!(show_status(&server.base_url()).await.is_err());
    }

    #[tokio::test]
    async fn call_posts_tools_call_envelope() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST).path("/rpc").json_body_partial(
                r#"{"method":"tools/call","params":{"name":"stream_forecast_data","arguments":{"location":"oslo"}}}"#,
            );
            then.status(200).json_body(json!({"jsonrpc": "2.0", "id": 1, "result": {"content": {}}}));
        });
        let out = call_tool(&server.base_url(), "stream_forecast_data", r#"{"location":"oslo"}"#)
            .await
            .unwrap();
        m.assert();
        assert!(out.get("result").is_some());
    }

    #[tokio::test]
    async fn call_rejects_non_object_args() {
        let err = call_tool("http://localhost:9", "t", "[1]").await.unwrap_err();
        assert!(err.to_string().contains("JSON object"));
    }

    #[tokio::test]
    async fn run_commands_maps_results_to_exit_codes() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/healthz");
            then.status(200).body("ok");
        });
        let ok = run_commands(Commands::Health { url: server.base_url() }).await;
        assert_eq!(ok, ExitCode::SUCCESS);

        let down = run_commands(Commands::Health { url: "http://localhost:9".into() }).await;
        assert_eq!(down, ExitCode::FAILURE);
    }

    #[tokio::test]
    async fn run_commands_call_error_envelope_is_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/rpc");
            then.status(400).json_body(json!({
                "jsonrpc": "2.0", "id": 1,
                "error": {"code": -32601, "message": "Tool not found: nope", "data": {}}
            }));
        });
        let code = run_commands(Commands::Call {
            url: server.base_url(),
            tool: "nope".into(),
            args: "{}".into(),
        })
        .await;
        assert_eq!(code, ExitCode::FAILURE);
    }
}
