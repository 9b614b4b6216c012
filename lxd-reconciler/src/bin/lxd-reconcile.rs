// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Runs one convergence pass of LXD cluster membership and storage pools
//! against a configuration file.

use anyhow::{bail, Context, Result};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use lxd_reconciler::config::Config;
use lxd_reconciler::converge;
use lxd_reconciler::LxdApi;
use lxd_utils::certificate::PeerCertificate;
use lxd_utils::host::HostExecutor;
use lxd_utils::lxc::Lxc;
use slog::{info, o};

#[derive(Parser, Debug)]
#[command(about = "Converge LXD cluster membership and storage pools")]
struct Args {
    #[clap(long, action)]
    config_file: Utf8PathBuf,

    #[command(subcommand)]
    cmd: Cmds,
}

#[derive(Subcommand, Debug)]
enum Cmds {
    /// Make one pass over every configured resource
    Converge,
    /// Print every storage pool LXD knows about, as JSON
    ListStoragePools,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_file(&args.config_file)
        .with_context(|| format!("load config file {:?}", args.config_file))?;
    let log = config
        .log
        .to_logger("lxd-reconcile")
        .context("failed to create logger")?;

    let executor =
        HostExecutor::new(log.new(o!("component" => "HostExecutor")))
            .as_executor();
    let lxc = Lxc::new(executor).with_binary(config.lxc.binary.clone());
    let api = LxdApi::new(lxc, &log);

    match args.cmd {
        Cmds::Converge => {
            info!(log, "starting convergence pass";
                "cluster_member" => config.cluster_member.is_some(),
                "storage_pools" => config.storage_pool.len(),
            );
            let certificates = PeerCertificate::new(&log);
            let results = converge::converge_all(
                &api,
                &certificates,
                config.cluster_member.as_ref(),
                &config.storage_pool,
            );
            let failed = results.iter().filter(|r| r.result.is_err()).count();
            if failed > 0 {
                bail!(
                    "{} of {} resources failed to converge",
                    failed,
                    results.len()
                );
            }
            Ok(())
        }
        Cmds::ListStoragePools => {
            let pools = api
                .list_storage_pools()
                .context("failed to list storage pools")?;
            let json = serde_json::to_string_pretty(&pools)
                .context("failed to serialize storage pools")?;
            println!("{json}");
            Ok(())
        }
    }
}
