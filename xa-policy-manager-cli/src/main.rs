use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use xa_policy_manager_core::{
    execution_role_name, management_role_arn, AccessorRegistry, ManagerConfig, ManagerEvent,
    ManagerKind, PolicyManagerService,
};

#[derive(Parser, Debug)]
#[command(
    name = "xa-policy-manager",
    version,
    about = "Keep CloudFront access statements in cross-account KMS key and S3 bucket policies in sync"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sync the CloudFront statements in a KMS key policy
    Kms {
        /// Key whose `default` policy is managed
        #[arg(long, env = "KEY_ID")]
        key_id: String,

        #[command(flatten)]
        sync: SyncArgs,
    },
    /// Sync the CloudFront statements in an S3 bucket policy
    S3 {
        /// Bucket whose policy is managed
        #[arg(long, env = "BUCKET_NAME")]
        bucket_name: String,

        #[command(flatten)]
        sync: SyncArgs,
    },
    /// Build an invocation payload from accessor registrations
    Payload(PayloadArgs),
}

#[derive(Args, Debug)]
struct SyncArgs {
    /// Management role to assume in the target account
    #[arg(long, env = "XA_MGMT_ROLE_ARN")]
    role_arn: String,

    /// Account the CloudFront distributions belong to
    #[arg(long, env = "ACCESSOR_AWS_ID")]
    accessor_aws_id: String,

    /// Stack that owns the generated statements
    #[arg(long, env = "ACCESSOR_STACK_NAME")]
    accessor_stack_name: String,

    /// Send every call to LocalStack (only `LOCAL=true` enables it from the environment)
    #[arg(long, env = "LOCAL", value_parser = parse_local_flag)]
    local: bool,

    /// Invocation event as inline JSON
    #[arg(long, conflicts_with = "event_file")]
    event: Option<String>,

    /// Path to a file holding the invocation event JSON
    #[arg(long)]
    event_file: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum KindArg {
    Kms,
    S3,
}

impl From<KindArg> for ManagerKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Kms => ManagerKind::Kms,
            KindArg::S3 => ManagerKind::S3,
        }
    }
}

#[derive(Args, Debug)]
struct PayloadArgs {
    /// Kind of cross-account target
    #[arg(value_enum)]
    kind: KindArg,

    /// Key id or bucket name the accessors need
    #[arg(long)]
    target: String,

    /// Distribution to grant, optionally with its actions: `E123` or `E123=s3:GetObject,s3:ListBucket`
    #[arg(long = "allow", value_name = "DISTRIBUTION_ID[=ACTIONS]")]
    allow: Vec<String>,

    /// Lifecycle operation to put in the payload
    #[arg(long, default_value = "create")]
    operation: String,

    /// Account owning the target; logs the management role to provision
    #[arg(long)]
    xa_aws_id: Option<String>,
}

impl SyncArgs {
    fn into_config(self, resource_id: String) -> (ManagerConfig, EventSource) {
        let config = ManagerConfig {
            role_arn: self.role_arn,
            resource_id,
            accessor_aws_id: self.accessor_aws_id,
            accessor_stack_name: self.accessor_stack_name,
            local: self.local,
        };
        let source = match (self.event, self.event_file) {
            (Some(raw), _) => EventSource::Inline(raw),
            (None, Some(path)) => EventSource::File(path),
            (None, None) => EventSource::Stdin,
        };
        (config, source)
    }
}

enum EventSource {
    Inline(String),
    File(PathBuf),
    Stdin,
}

impl EventSource {
    fn read(self) -> Result<ManagerEvent> {
        let raw = match self {
            Self::Inline(raw) => raw,
            Self::File(path) => std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read event file {}", path.display()))?,
            Self::Stdin => {
                if atty::is(atty::Stream::Stdin) {
                    bail!("No invocation event given: pass --event, --event-file, or pipe JSON on stdin");
                }
                let mut raw = String::new();
                std::io::stdin()
                    .read_to_string(&mut raw)
                    .context("Failed to read event from stdin")?;
                raw
            }
        };
        ManagerEvent::from_json(&raw).context("Failed to parse invocation event")
    }
}

/// Anything other than the literal `true` means "not local".
fn parse_local_flag(raw: &str) -> Result<bool, String> {
    Ok(raw == "true")
}

/// Split `E123=a,b` into the distribution id and its explicit actions.
fn parse_allow(spec: &str) -> Result<(String, Option<Vec<String>>)> {
    let (id, actions) = match spec.split_once('=') {
        Some((id, actions)) => {
            let actions: Vec<String> = actions
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(ToString::to_string)
                .collect();
            (id.trim(), Some(actions))
        }
        None => (spec.trim(), None),
    };
    if id.is_empty() {
        bail!("Invalid --allow value '{spec}': missing distribution id");
    }
    Ok((id.to_string(), actions))
}

async fn run_sync(kind: ManagerKind, resource_id: String, args: SyncArgs) -> Result<()> {
    let (config, source) = args.into_config(resource_id);
    let event = source.read()?;

    let service = PolicyManagerService::new(config)
        .await
        .context("Failed to initialize AWS clients")?;
    let outcome = match kind {
        ManagerKind::Kms => service.sync_kms_key_policy(&event).await,
        ManagerKind::S3 => service.sync_s3_bucket_policy(&event).await,
    }
    .with_context(|| format!("Failed to sync {kind} policy"))?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn run_payload(args: PayloadArgs) -> Result<()> {
    let kind = ManagerKind::from(args.kind);
    let mut registry = AccessorRegistry::new();
    for spec in &args.allow {
        let (distribution_id, actions) = parse_allow(spec)?;
        registry.register(kind, &args.target, &distribution_id, actions)?;
    }
    let accessors = registry.consume(kind, &args.target)?;

    if let Some(xa_aws_id) = &args.xa_aws_id {
        info!(
            "management role: {}",
            management_role_arn(xa_aws_id, &args.target)
        );
        info!("execution role: {}", execution_role_name(&args.target));
    }

    let event = ManagerEvent::new(args.operation, accessors);
    println!("{}", serde_json::to_string_pretty(&event)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Kms { key_id, sync } => run_sync(ManagerKind::Kms, key_id, sync).await,
        Commands::S3 { bucket_name, sync } => run_sync(ManagerKind::S3, bucket_name, sync).await,
        Commands::Payload(args) => run_payload(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_allow_plain_id() {
        let (id, actions) = parse_allow("E1ABC").expect("parse");
        assert_eq!(id, "E1ABC");
        assert!(actions.is_none());
    }

    #[test]
    fn test_parse_allow_with_actions() {
        let (id, actions) = parse_allow("E1ABC=s3:GetObject, s3:ListBucket").expect("parse");
        assert_eq!(id, "E1ABC");
        assert_eq!(
            actions,
            Some(vec!["s3:GetObject".to_string(), "s3:ListBucket".to_string()])
        );
    }

    #[test]
    fn test_parse_allow_rejects_missing_id() {
        assert!(parse_allow("=s3:GetObject").is_err());
    }

    #[test]
    fn test_local_flag_only_accepts_literal_true() {
        assert_eq!(parse_local_flag("true"), Ok(true));
        for raw in ["false", "1", "TRUE", "yes", ""] {
            assert_eq!(parse_local_flag(raw), Ok(false), "value {raw:?}");
        }
    }

    #[test]
    fn test_local_flag_on_command_line() {
        let cli = Cli::try_parse_from([
            "xa-policy-manager",
            "kms",
            "--key-id",
            "test-xakms",
            "--role-arn",
            "arn:aws:iam::098765432109:role/test-xakms-xa-mgmt",
            "--accessor-aws-id",
            "111122223333",
            "--accessor-stack-name",
            "web",
            "--local",
        ])
        .expect("parse");
        match cli.command {
            Commands::Kms { sync, .. } => assert!(sync.local),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
