//! In-memory remote used by the engine tests: a node tree behind a mutex,
//! an operation log for asserting call patterns, and switches for injecting
//! failures and stat blind spots.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, UNIX_EPOCH};

use async_trait::async_trait;

use crate::error::{Result, SyncError};
use crate::remote::{RemoteEntry, RemoteFs};
use crate::utils::{remote_name, remote_parent, remote_prefixes};

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File { data: Vec<u8>, mtime: u64 },
}

#[derive(Debug, Default)]
struct State {
    nodes:           BTreeMap<String, Node>,
    ops:             Vec<String>,
    clock:           u64,
    hidden:          HashSet<String>,
    failing_removes: HashSet<String>,
    failing_puts:    HashSet<String>,
}

pub struct MemRemote {
    state: Mutex<State>,
}

impl MemRemote {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                clock: 1,
                ..State::default()
            }),
        }
    }

    /// Seed a directory, creating missing ancestors as directories.
    pub fn add_dir(&self, path: &str) {
        let mut st = self.state.lock().unwrap();
        for prefix in remote_prefixes(path) {
            st.nodes.entry(prefix).or_insert(Node::Dir);
        }
    }

    /// Seed a file with a fixed mtime, creating missing ancestors.
    pub fn add_file(&self, path: &str, mtime: u64, data: &[u8]) {
        let mut st = self.state.lock().unwrap();
        if let Some(parent) = remote_parent(path) {
            for prefix in remote_prefixes(parent) {
                st.nodes.entry(prefix).or_insert(Node::Dir);
            }
        }
        st.nodes.insert(
            path.to_string(),
            Node::File {
                data: data.to_vec(),
                mtime,
            },
        );
    }

    pub fn exists(&self, path: &str) -> bool {
        self.state.lock().unwrap().nodes.contains_key(path)
    }

    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        match self.state.lock().unwrap().nodes.get(path) {
            Some(Node::File { data, .. }) => Some(data.clone()),
            _ => None,
        }
    }

    /// Every trait call so far, in order, as `"<op> <path>"` strings.
    pub fn ops(&self) -> Vec<String> {
        self.state.lock().unwrap().ops.clone()
    }

    /// Upload attempts so far.
    pub fn puts(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .ops
            .iter()
            .filter(|op| op.starts_with("put "))
            .count()
    }

    /// Mtime the next upload will be stamped with; increments per upload.
    pub fn set_clock(&self, secs: u64) {
        self.state.lock().unwrap().clock = secs;
    }

    /// Make `stat` miss this path while every other call still sees it.
    pub fn hide_from_stat(&self, path: &str) {
        self.state.lock().unwrap().hidden.insert(path.to_string());
    }

    pub fn fail_remove(&self, path: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_removes
            .insert(path.to_string());
    }

    pub fn fail_put(&self, path: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_puts
            .insert(path.to_string());
    }
}

fn entry_for(path: &str, node: &Node) -> RemoteEntry {
    let (is_dir, size, mtime) = match node {
        Node::Dir => (true, 0, 0),
        Node::File { data, mtime } => (false, data.len() as u64, *mtime),
    };
    RemoteEntry {
        name: remote_name(path).to_string(),
        path: path.to_string(),
        is_dir,
        size,
        modified: UNIX_EPOCH + Duration::from_secs(mtime),
    }
}

#[async_trait]
impl RemoteFs for MemRemote {
    async fn stat(&self, path: &str) -> Result<RemoteEntry> {
        let mut st = self.state.lock().unwrap();
        st.ops.push(format!("stat {path}"));
        if st.hidden.contains(path) {
            return Err(SyncError::NotFound(path.to_string()));
        }
        match st.nodes.get(path) {
            Some(node) => Ok(entry_for(path, node)),
            None => Err(SyncError::NotFound(path.to_string())),
        }
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        let mut st = self.state.lock().unwrap();
        st.ops.push(format!("mkdir {path}"));
        match st.nodes.get(path) {
            Some(Node::Dir) => return Err(SyncError::AlreadyExists(path.to_string())),
            Some(Node::File { .. }) => return Err(SyncError::NotADirectory(path.to_string())),
            None => {}
        }
        if let Some(parent) = remote_parent(path) {
            if parent != "/" && !matches!(st.nodes.get(parent), Some(Node::Dir)) {
                return Err(SyncError::NotFound(parent.to_string()));
            }
        }
        st.nodes.insert(path.to_string(), Node::Dir);
        Ok(())
    }

    async fn list(&self, dir: &str) -> Result<Vec<RemoteEntry>> {
        let mut st = self.state.lock().unwrap();
        st.ops.push(format!("list {dir}"));
        match st.nodes.get(dir) {
            Some(Node::Dir) => {}
            Some(Node::File { .. }) => return Err(SyncError::NotADirectory(dir.to_string())),
            None => return Err(SyncError::NotFound(dir.to_string())),
        }
        Ok(st
            .nodes
            .iter()
            .filter(|(path, _)| remote_parent(path) == Some(dir))
            .map(|(path, node)| entry_for(path, node))
            .collect())
    }

    async fn put(&self, local: &Path, remote: &str) -> Result<()> {
        let data = std::fs::read(local)?;
        let mut st = self.state.lock().unwrap();
        st.ops.push(format!("put {remote}"));
        if st.failing_puts.contains(remote) {
            return Err(SyncError::Protocol(format!("injected put failure: {remote}")));
        }
        if matches!(st.nodes.get(remote), Some(Node::Dir)) {
            return Err(SyncError::Protocol(format!("is a directory: {remote}")));
        }
        if let Some(parent) = remote_parent(remote) {
            if parent != "/" && !matches!(st.nodes.get(parent), Some(Node::Dir)) {
                return Err(SyncError::NotFound(parent.to_string()));
            }
        }
        let mtime = st.clock;
        st.clock += 1;
        st.nodes
            .insert(remote.to_string(), Node::File { data, mtime });
        Ok(())
    }

    async fn get(&self, remote: &str, local: &Path) -> Result<()> {
        let data = {
            let mut st = self.state.lock().unwrap();
            st.ops.push(format!("get {remote}"));
            match st.nodes.get(remote) {
                Some(Node::File { data, .. }) => data.clone(),
                Some(Node::Dir) => {
                    return Err(SyncError::Protocol(format!("is a directory: {remote}")))
                }
                None => return Err(SyncError::NotFound(remote.to_string())),
            }
        };
        std::fs::write(local, data)?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let mut st = self.state.lock().unwrap();
        st.ops.push(format!("remove {path}"));
        if st.failing_removes.contains(path) {
            return Err(SyncError::Protocol(format!(
                "injected remove failure: {path}"
            )));
        }
        match st.nodes.get(path) {
            Some(Node::File { .. }) => {
                st.nodes.remove(path);
                Ok(())
            }
            Some(Node::Dir) => Err(SyncError::Protocol(format!("is a directory: {path}"))),
            None => Err(SyncError::NotFound(path.to_string())),
        }
    }

    async fn rmdir(&self, dir: &str) -> Result<()> {
        let mut st = self.state.lock().unwrap();
        st.ops.push(format!("rmdir {dir}"));
        match st.nodes.get(dir) {
            Some(Node::Dir) => {}
            Some(Node::File { .. }) => return Err(SyncError::NotADirectory(dir.to_string())),
            None => return Err(SyncError::NotFound(dir.to_string())),
        }
        if st.nodes.keys().any(|path| remote_parent(path) == Some(dir)) {
            return Err(SyncError::NotEmpty(dir.to_string()));
        }
        st.nodes.remove(dir);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.state.lock().unwrap().ops.push("close".to_string());
        Ok(())
    }
}
