use crate::output::print_bays;
use anyhow::{Context, Result};
use bayline_core::config::Config;
use bayline_core::{Bay, Customer, MembershipTier, StaticIdentity};
use bayline_server::BayFeed;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on (overrides server.port; 0 = OS-assigned)
    #[arg(long)]
    pub port: Option<u16>,

    /// Address to bind (overrides server.bind)
    #[arg(long)]
    pub bind: Option<String>,

    /// YAML or JSON file with the initial bay list
    #[arg(long, env = "BAYLINE_BAYS")]
    pub bays: Option<PathBuf>,

    /// Signed-in customer id (omit to run as a guest)
    #[arg(long, requires = "customer_name")]
    pub customer_id: Option<String>,

    /// Signed-in customer first name
    #[arg(long, requires = "customer_id")]
    pub customer_name: Option<String>,

    /// Membership tier: standard, premium, or vip
    #[arg(long, requires = "customer_id")]
    pub tier: Option<String>,
}

pub fn run(config_path: &Path, args: ServeArgs) -> Result<()> {
    let mut config = Config::load(config_path).context("failed to load config")?;
    config.ensure_valid()?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(bind) = args.bind.clone() {
        config.server.bind = bind;
    }

    let identity = identity_from(&args)?;
    let bays = match &args.bays {
        Some(path) => load_bays(path)?,
        None => Vec::new(),
    };
    if !bays.is_empty() {
        print_bays(&bays);
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let addr = format!("{}:{}", config.server.bind, config.server.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        println!("bayline → http://{}", listener.local_addr()?);

        tokio::select! {
            res = bayline_server::serve_on(config, Arc::new(identity), BayFeed::new(bays), listener) => res,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, shutting down");
                Ok(())
            }
        }
    })
}

fn identity_from(args: &ServeArgs) -> Result<StaticIdentity> {
    let (Some(id), Some(name)) = (&args.customer_id, &args.customer_name) else {
        return Ok(StaticIdentity::anonymous());
    };
    let membership_tier = args
        .tier
        .as_deref()
        .map(str::parse::<MembershipTier>)
        .transpose()?;
    Ok(StaticIdentity::signed_in(Customer {
        id: id.clone(),
        first_name: name.clone(),
        membership_tier,
    }))
}

/// YAML is a superset of JSON, so one parser covers both.
pub fn load_bays(path: &Path) -> Result<Vec<Bay>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let bays: Vec<Bay> = serde_yaml::from_str(&data)
        .with_context(|| format!("failed to parse bay list in {}", path.display()))?;
    Ok(bays)
}
