// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A simulated LXD cluster, reached through one [FakeExecutor] per server.
//!
//! Only the requests the reconcilers make are understood. The simulation
//! enforces the rules of LXD's clustered storage API that matter here:
//! member-scoped pool requests take only node-specific config, cluster-wide
//! ones take none, and a pool is committed only once every member defined it.

use lxd_reconciler::LxdApi;
use lxd_types::cluster::MemberStatus;
use lxd_types::path;
use lxd_types::storage::{
    is_node_specific, PoolConfig, PoolStatus, StorageDriver,
};
use lxd_utils::host::{FakeExecutor, Input, Output, OutputExt};
use lxd_utils::lxc::Lxc;
use serde_json::{json, Value};
use slog::Logger;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub const PASSWORD: &str = "sekret";
pub const CERTIFICATE: &str = "CERT";

#[derive(Clone, Debug)]
pub struct FakePool {
    pub driver: StorageDriver,
    pub description: String,
    pub config: PoolConfig,
    pub member_config: BTreeMap<String, PoolConfig>,
    pub status: PoolStatus,
    pub locations: Vec<String>,
}

/// One request as received by the simulation, accepted or not.
#[derive(Clone, Debug)]
pub struct Request {
    pub server: String,
    pub method: String,
    pub path: String,
    pub target: Option<String>,
    pub body: Option<Value>,
}

impl Request {
    /// Keys of `config` in the request body, if any.
    pub fn config_keys(&self) -> Vec<String> {
        self.body
            .as_ref()
            .and_then(|body| body.get("config"))
            .and_then(Value::as_object)
            .map(|config| config.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[derive(Default)]
struct State {
    members: BTreeMap<String, MemberStatus>,
    pools: BTreeMap<String, FakePool>,
    requests: Vec<Request>,
}

pub struct FakeLxd {
    state: Mutex<State>,
}

type Response = Result<String, String>;

impl FakeLxd {
    /// Servers that are not clustered yet.
    pub fn new() -> Arc<Self> {
        Arc::new(Self { state: Mutex::new(State::default()) })
    }

    /// An established cluster of `members`, all online.
    pub fn clustered(members: &[&str]) -> Arc<Self> {
        let lxd = Self::new();
        {
            let mut state = lxd.state.lock().unwrap();
            for member in members {
                state.members.insert(member.to_string(), MemberStatus::Online);
            }
        }
        lxd
    }

    /// An [LxdApi] as seen from `server`.
    pub fn api(self: &Arc<Self>, server: &str, log: &Logger) -> LxdApi {
        let log = log.new(slog::o!("server" => server.to_string()));
        let executor = FakeExecutor::new(log.clone());
        let lxd = Arc::clone(self);
        let server = server.to_string();
        executor.set_wait_handler(Box::new(move |input: &Input| {
            lxd.handle(&server, input)
        }));
        LxdApi::new(Lxc::new(executor.as_executor()), &log)
    }

    pub fn pool(&self, name: &str) -> Option<FakePool> {
        self.state.lock().unwrap().pools.get(name).cloned()
    }

    pub fn members(&self) -> BTreeMap<String, MemberStatus> {
        self.state.lock().unwrap().members.clone()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state.lock().unwrap().requests.clone()
    }

    fn handle(&self, server: &str, input: &Input) -> Output {
        let request = parse_request(server, input);
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());
        match state.route(&request) {
            Ok(stdout) => Output::success().set_stdout(stdout),
            Err(message) => {
                Output::failure().set_stderr(format!("Error: {message}"))
            }
        }
    }
}

fn parse_request(server: &str, input: &Input) -> Request {
    assert_eq!(input.program, "lxc");
    let args: Vec<&str> = input.args.iter().map(String::as_str).collect();
    let (method, rest) = match args.as_slice() {
        ["query", "--wait", "-X", method, rest @ ..] => (*method, rest),
        _ => panic!("unexpected command: {input}"),
    };
    let (body, uri) = match rest {
        ["--data", body, uri] => (
            Some(serde_json::from_str(body).expect("request body is JSON")),
            *uri,
        ),
        [uri] => (None, *uri),
        _ => panic!("unexpected command: {input}"),
    };
    let (path, target) = match uri.split_once("?target=") {
        Some((path, target)) => (path, Some(target.to_string())),
        None => (uri, None),
    };
    Request {
        server: server.to_string(),
        method: method.to_string(),
        path: path.to_string(),
        target,
        body,
    }
}

fn success() -> Response {
    Ok(json!({
        "class": "task",
        "status": "Success",
        "status_code": 200,
        "err": "",
    })
    .to_string())
}

fn failure(err: &str) -> Response {
    Ok(json!({"status": "Failure", "status_code": 400, "err": err}).to_string())
}

fn config_of(body: &Value) -> PoolConfig {
    body.get("config")
        .cloned()
        .map(|config| serde_json::from_value(config).expect("config is a map"))
        .unwrap_or_default()
}

/// Writes targeted at one member may only carry node-specific keys.
fn check_member_specific(config: &PoolConfig) -> Result<(), String> {
    match config.keys().find(|k| !is_node_specific(k)) {
        Some(key) => Err(format!(
            "Config key {key:?} may not be used as member-specific key"
        )),
        None => Ok(()),
    }
}

/// Cluster-wide writes may carry no node-specific keys.
fn check_cluster_wide(config: &PoolConfig) -> Result<(), String> {
    match config.keys().find(|k| is_node_specific(k)) {
        Some(key) => Err(format!("Config key {key:?} is member-specific")),
        None => Ok(()),
    }
}

fn str_of<'a>(body: &'a Value, key: &str) -> &'a str {
    body.get(key).and_then(Value::as_str).unwrap_or_default()
}

impl State {
    fn clustered(&self, server: &str) -> bool {
        self.members.contains_key(server)
    }

    fn route(&mut self, request: &Request) -> Response {
        let server = request.server.as_str();
        let pools = path::storage_pools(None);
        let pool_prefix = format!("{pools}/");
        let member_prefix = format!("{}/", path::cluster_members());
        let body = request.body.clone().unwrap_or(Value::Null);

        match (request.method.as_str(), request.path.as_str()) {
            ("GET", p) if p == path::cluster() => {
                let clustered = self.clustered(server);
                Ok(json!({
                    "enabled": clustered,
                    "server_name": if clustered { server } else { "" },
                })
                .to_string())
            }
            ("PUT", p) if p == path::cluster() => {
                self.enable_clustering(server, &body)
            }
            ("GET", p) if p == path::cluster_members() => {
                let urls: Vec<String> = self
                    .members
                    .keys()
                    .map(|m| path::cluster_member(m))
                    .collect();
                Ok(json!(urls).to_string())
            }
            ("GET", p) if p.starts_with(&member_prefix) => {
                let name = &p[member_prefix.len()..];
                let status = self
                    .members
                    .get(name)
                    .ok_or_else(|| "Cluster member not found".to_string())?;
                Ok(json!({
                    "server_name": name,
                    "status": status.to_string(),
                    "roles": [],
                })
                .to_string())
            }
            ("POST", p)
                if p.starts_with(&member_prefix) && p.ends_with("/state") =>
            {
                let name = &p[member_prefix.len()..p.len() - "/state".len()];
                let status = self
                    .members
                    .get_mut(name)
                    .ok_or_else(|| "Cluster member not found".to_string())?;
                match str_of(&body, "action") {
                    "evacuate" => *status = MemberStatus::Evacuated,
                    "restore" => *status = MemberStatus::Online,
                    other => {
                        return failure(&format!("Unknown action {other:?}"))
                    }
                }
                success()
            }
            ("DELETE", p) if p.starts_with(&member_prefix) => {
                let name = &p[member_prefix.len()..];
                if self.members.len() <= 1 {
                    return Err(
                        "Cannot remove the last cluster member".to_string()
                    );
                }
                self.members
                    .remove(name)
                    .ok_or_else(|| "Cluster member not found".to_string())?;
                Ok(String::new())
            }
            ("GET", p) if p == pools => {
                let urls: Vec<String> = self
                    .pools
                    .keys()
                    .map(|n| path::storage_pool(n, None))
                    .collect();
                Ok(json!(urls).to_string())
            }
            ("POST", p) if p == pools => self.create_pool(request, &body),
            ("GET", p) if p.starts_with(&pool_prefix) => {
                let name = &p[pool_prefix.len()..];
                let pool = self
                    .pools
                    .get(name)
                    .ok_or_else(|| "Storage pool not found".to_string())?;
                let member = request.target.as_deref().unwrap_or(server);
                let mut config = pool.config.clone();
                if let Some(member_config) = pool.member_config.get(member) {
                    config.extend(member_config.clone());
                }
                config.insert(
                    "volatile.initial_source".to_string(),
                    "/dev/sdz".to_string(),
                );
                Ok(json!({
                    "name": name,
                    "driver": pool.driver,
                    "description": pool.description,
                    "config": config,
                    "status": pool.status,
                    "locations": pool.locations,
                })
                .to_string())
            }
            ("PATCH", p) if p.starts_with(&pool_prefix) => {
                let name = p[pool_prefix.len()..].to_string();
                self.update_pool(request, &name, &body)
            }
            ("DELETE", p) if p.starts_with(&pool_prefix) => {
                let name = &p[pool_prefix.len()..];
                self.pools
                    .remove(name)
                    .ok_or_else(|| "Storage pool not found".to_string())?;
                Ok(String::new())
            }
            (method, p) => Err(format!("{method} {p}: not found")),
        }
    }

    fn enable_clustering(&mut self, server: &str, body: &Value) -> Response {
        if self.clustered(server) {
            return failure("This server is already clustered");
        }
        let name = str_of(body, "server_name").to_string();
        if body.get("cluster_address").is_none() {
            if !self.members.is_empty() {
                return failure("A cluster already exists");
            }
            self.members.insert(name, MemberStatus::Online);
            return success();
        }
        if self.members.is_empty() {
            return failure("No cluster to join");
        }
        if str_of(body, "cluster_certificate") != CERTIFICATE {
            return failure("Certificate mismatch");
        }
        if str_of(body, "cluster_password") != PASSWORD {
            return failure("Invalid cluster password");
        }
        self.members.insert(name, MemberStatus::Online);
        success()
    }

    fn create_pool(&mut self, request: &Request, body: &Value) -> Response {
        let name = str_of(body, "name").to_string();
        let config = config_of(body);
        let driver: StorageDriver = str_of(body, "driver")
            .parse()
            .map_err(|err: lxd_types::storage::UnknownDriver| err.to_string())?;
        let description = str_of(body, "description").to_string();
        let clustered = self.clustered(&request.server);
        let member_count = self.members.len();

        match request.target.clone() {
            Some(_) if !clustered => {
                Err("Target only valid in a cluster".to_string())
            }
            Some(target) => {
                check_member_specific(&config)?;
                match self.pools.get_mut(&name) {
                    Some(pool) => {
                        if pool.status != PoolStatus::Pending {
                            return Err("Pool is not pending".to_string());
                        }
                        if pool.locations.contains(&target) {
                            return Err(
                                "Pool already defined on member".to_string()
                            );
                        }
                        pool.locations.push(target.clone());
                        pool.member_config.insert(target, config);
                    }
                    None => {
                        let pool = FakePool {
                            driver,
                            description,
                            config: PoolConfig::new(),
                            member_config: BTreeMap::from([(
                                target.clone(),
                                config,
                            )]),
                            status: PoolStatus::Pending,
                            locations: vec![target],
                        };
                        self.pools.insert(name, pool);
                    }
                }
                Ok("{}".to_string())
            }
            None if !clustered => {
                if self.pools.contains_key(&name) {
                    return Err("Storage pool already exists".to_string());
                }
                let pool = FakePool {
                    driver,
                    description,
                    config,
                    member_config: BTreeMap::new(),
                    status: PoolStatus::Created,
                    locations: Vec::new(),
                };
                self.pools.insert(name, pool);
                Ok("{}".to_string())
            }
            None => {
                check_cluster_wide(&config)?;
                let pool = self.pools.get_mut(&name).ok_or_else(|| {
                    "Pool not pending on any member".to_string()
                })?;
                if pool.status != PoolStatus::Pending {
                    return Err("Pool is not pending".to_string());
                }
                if pool.locations.len() != member_count {
                    return Err("Pool not defined on all members".to_string());
                }
                pool.config = config;
                pool.status = PoolStatus::Created;
                Ok("{}".to_string())
            }
        }
    }

    fn update_pool(
        &mut self,
        request: &Request,
        name: &str,
        body: &Value,
    ) -> Response {
        let clustered = self.clustered(&request.server);
        let pool = self
            .pools
            .get_mut(name)
            .ok_or_else(|| "Storage pool not found".to_string())?;
        let config = config_of(body);
        match &request.target {
            Some(target) => {
                check_member_specific(&config)?;
                pool.member_config
                    .entry(target.clone())
                    .or_default()
                    .extend(config);
            }
            None => {
                if clustered {
                    check_cluster_wide(&config)?;
                }
                pool.config.extend(config);
            }
        }
        if let Some(description) =
            body.get("description").and_then(Value::as_str)
        {
            pool.description = description.to_string();
        }
        Ok("{}".to_string())
    }
}
