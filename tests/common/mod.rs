//! Common test utilities for reconciler and Pact integration tests
//!
//! Provides rustls setup, an in-memory record store and a stateful fake of
//! the remote admin API.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use kube::{Resource, ResourceExt};
use search_security_operator::client::{AdminApi, ApiError, ApiMethod, ApiResponse};
use search_security_operator::config::ApiPaths;
use search_security_operator::controller::reconciler::{
    status_patch, ManagedRecord, RecordRef, RecordStore, Reconciler, StoreError,
};
use search_security_operator::crd::{
    Alert, AlertSpec, IndexPermissions, InputSearch, MonitorInput, MonitorSchedule, Role,
    RoleMapping, RoleMappingSpec, RoleMappings, RoleSpec, SchedulePeriod, SyncStatus, User,
    UserSpec,
};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

pub const NAMESPACE: &str = "default";

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` to ensure it's only called once across all tests. Call it
/// before starting a Pact mock server, which installs a provider of its own.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        if rustls::crypto::CryptoProvider::get_default().is_none() {
            rustls::crypto::ring::default_provider()
                .install_default()
                .expect("Failed to install rustls crypto provider");
        }
    });
}

// ---------------------------------------------------------------------------
// Record store
// ---------------------------------------------------------------------------

/// Record store keeping records in memory, mimicking the API server
///
/// Releasing the last finalizer of a record that is being deleted purges it.
pub struct MemoryStore<K> {
    records: Mutex<HashMap<String, K>>,
    status_writes: AtomicUsize,
    failing: AtomicBool,
}

impl<K: ManagedRecord> MemoryStore<K> {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            status_writes: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    pub fn with(record: K) -> Self {
        let store = Self::new();
        store.insert(record);
        store
    }

    pub fn insert(&self, record: K) {
        self.records
            .lock()
            .unwrap()
            .insert(record.name_any(), record);
    }

    pub fn get(&self, name: &str) -> Option<K> {
        self.records.lock().unwrap().get(name).cloned()
    }

    pub fn status(&self, name: &str) -> Option<SyncStatus> {
        self.get(name)
            .and_then(|record| record.sync_status().cloned())
    }

    pub fn finalizers(&self, name: &str) -> Vec<String> {
        self.get(name)
            .map(|record| record.finalizers().to_vec())
            .unwrap_or_default()
    }

    pub fn status_writes(&self) -> usize {
        self.status_writes.load(Ordering::SeqCst)
    }

    /// Make every later finalizer and status write fail
    pub fn fail_writes(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Apply a spec edit and bump the generation
    pub fn edit(&self, name: &str, change: impl FnOnce(&mut K)) {
        let mut records = self.records.lock().unwrap();
        let record = records.get_mut(name).expect("record to edit");
        change(record);
        let meta = record.meta_mut();
        meta.generation = Some(meta.generation.unwrap_or(0) + 1);
    }

    /// Request deletion, as `kubectl delete` would
    pub fn request_deletion(&self, name: &str) {
        let mut records = self.records.lock().unwrap();
        let record = records.get_mut(name).expect("record to delete");
        record.meta_mut().deletion_timestamp =
            Some(serde_json::from_value(json!("2024-01-01T00:00:00Z")).unwrap());
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Backend("injected store failure".to_string()))
        } else {
            Ok(())
        }
    }
}

/// JSON merge patch (RFC 7386), as the API server applies it
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let target = target.as_object_mut().unwrap();
    for (key, value) in patch {
        if value.is_null() {
            target.remove(key);
        } else {
            merge_patch(target.entry(key.clone()).or_insert(Value::Null), value);
        }
    }
}

/// Apply the status patch the Kubernetes store would send
fn with_status<K: ManagedRecord>(record: &K, status: &SyncStatus) -> K {
    let mut value = serde_json::to_value(record).unwrap();
    merge_patch(&mut value, &status_patch(status));
    serde_json::from_value(value).unwrap()
}

#[async_trait]
impl<K: ManagedRecord> RecordStore<K> for MemoryStore<K> {
    async fn load(&self, record: &RecordRef) -> Result<Option<K>, StoreError> {
        Ok(self.get(&record.name))
    }

    async fn set_finalizers(&self, record: &K, finalizers: Vec<String>) -> Result<(), StoreError> {
        self.check_writable()?;
        let name = record.name_any();
        let mut records = self.records.lock().unwrap();
        let Some(stored) = records.get_mut(&name) else {
            return Ok(());
        };
        let purge = finalizers.is_empty() && stored.meta().deletion_timestamp.is_some();
        stored.meta_mut().finalizers = Some(finalizers);
        if purge {
            records.remove(&name);
        }
        Ok(())
    }

    async fn write_status(&self, record: &K, status: &SyncStatus) -> Result<(), StoreError> {
        self.check_writable()?;
        let name = record.name_any();
        let mut records = self.records.lock().unwrap();
        if let Some(stored) = records.get_mut(&name) {
            *stored = with_status(stored, status);
            self.status_writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Remote admin API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: ApiMethod,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct FakeState {
    /// Remote objects keyed by full object path
    objects: HashMap<String, Value>,
    calls: Vec<RecordedCall>,
    next_id: u32,
    scripted: HashMap<(ApiMethod, String), VecDeque<(u16, String)>>,
    unavailable: bool,
}

/// In-memory admin API
///
/// - `GET {base}/{name}` answers `{"<name>": {...object, "reserved": false}}`,
///   or 404 when the object does not exist
/// - `POST {base}` stores the object under a fresh `monitor-N` id and answers
///   `{"_id": ...}` with 201
/// - `PUT {base}/{id}` stores the object, 201 when new and 200 otherwise
/// - `DELETE {base}/{id}` removes the object, 404 when it does not exist
///
/// Scripted responses for a method and path take precedence.
#[derive(Default)]
pub struct FakeAdminApi {
    state: Mutex<FakeState>,
}

impl FakeAdminApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a one-shot response for `method path`
    pub fn respond(&self, method: ApiMethod, path: &str, status: u16, body: &str) {
        self.state
            .lock()
            .unwrap()
            .scripted
            .entry((method, path.to_string()))
            .or_default()
            .push_back((status, body.to_string()));
    }

    /// Fail every request at the transport level while `down` is set
    pub fn set_unavailable(&self, down: bool) {
        self.state.lock().unwrap().unavailable = down;
    }

    pub fn seed(&self, path: &str, object: Value) {
        self.state
            .lock()
            .unwrap()
            .objects
            .insert(path.to_string(), object);
    }

    pub fn object(&self, path: &str) -> Option<Value> {
        self.state.lock().unwrap().objects.get(path).cloned()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Every non-GET call
    pub fn writes(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.method != ApiMethod::Get)
            .collect()
    }

    pub fn count(&self, method: ApiMethod, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.method == method && call.path == path)
            .count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[async_trait]
impl AdminApi for FakeAdminApi {
    async fn execute(
        &self,
        method: ApiMethod,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<ApiResponse, ApiError> {
        let mut state = self.state.lock().unwrap();
        let body: Option<Value> = body.map(|bytes| serde_json::from_slice(&bytes).unwrap());
        state.calls.push(RecordedCall {
            method,
            path: path.to_string(),
            body: body.clone(),
        });

        if state.unavailable {
            return Err(ApiError::Unavailable {
                method,
                path: path.to_string(),
                message: "connection refused".to_string(),
            });
        }

        if let Some((status, scripted)) = state
            .scripted
            .get_mut(&(method, path.to_string()))
            .and_then(VecDeque::pop_front)
        {
            return Ok(ApiResponse::new(status, scripted));
        }

        let response = match method {
            ApiMethod::Get => match state.objects.get(path) {
                Some(object) => {
                    let mut entry = object.clone();
                    entry["reserved"] = json!(false);
                    entry["hidden"] = json!(false);
                    let mut wrapped = serde_json::Map::new();
                    wrapped.insert(last_segment(path).to_string(), entry);
                    ApiResponse::new(200, Value::Object(wrapped).to_string())
                }
                None => ApiResponse::new(404, json!({"status": "NOT_FOUND"}).to_string()),
            },
            ApiMethod::Post => {
                state.next_id += 1;
                let id = format!("monitor-{}", state.next_id);
                state
                    .objects
                    .insert(format!("{path}/{id}"), body.unwrap_or(Value::Null));
                ApiResponse::new(201, json!({"_id": id, "_version": 1}).to_string())
            }
            ApiMethod::Put => {
                let existed = state
                    .objects
                    .insert(path.to_string(), body.unwrap_or(Value::Null))
                    .is_some();
                if existed {
                    ApiResponse::new(
                        200,
                        json!({"_id": last_segment(path), "status": "OK"}).to_string(),
                    )
                } else {
                    ApiResponse::new(201, json!({"status": "CREATED"}).to_string())
                }
            }
            ApiMethod::Delete => match state.objects.remove(path) {
                Some(_) => ApiResponse::new(200, json!({"status": "OK"}).to_string()),
                None => ApiResponse::new(404, json!({"status": "NOT_FOUND"}).to_string()),
            },
        };
        Ok(response)
    }
}

// ---------------------------------------------------------------------------
// Reconciler and record builders
// ---------------------------------------------------------------------------

pub type TestReconciler<K> = Reconciler<Arc<FakeAdminApi>, MemoryStore<K>>;

pub fn reconciler<K: ManagedRecord>(api: &Arc<FakeAdminApi>, record: K) -> TestReconciler<K> {
    Reconciler::new(Arc::clone(api), MemoryStore::with(record), ApiPaths::default())
}

pub fn record_ref(name: &str) -> RecordRef {
    RecordRef::new(NAMESPACE, name)
}

fn stamp<K: Resource>(mut record: K) -> K {
    let meta = record.meta_mut();
    meta.namespace = Some(NAMESPACE.to_string());
    meta.generation = Some(1);
    meta.resource_version = Some("1".to_string());
    record
}

pub fn alert(name: &str) -> Alert {
    stamp(Alert::new(
        name,
        AlertSpec {
            name: name.to_string(),
            monitor_type: "monitor".to_string(),
            enabled: true,
            schedule: MonitorSchedule {
                period: SchedulePeriod {
                    interval: 5,
                    unit: "MINUTES".to_string(),
                },
            },
            inputs: vec![MonitorInput {
                search: InputSearch {
                    indices: vec!["logs-*".to_string()],
                    query: r#""{\"match\": {\"f\": \"v\"}}""#.to_string(),
                },
            }],
            triggers: vec![],
        },
    ))
}

pub fn role(name: &str, backend_roles: &[&str]) -> Role {
    stamp(Role::new(
        name,
        RoleSpec {
            description: None,
            cluster_permissions: vec!["cluster_monitor".to_string()],
            index_permissions: vec![IndexPermissions {
                index_patterns: vec!["logs-*".to_string()],
                dls: None,
                fls: None,
                masked_fields: None,
                allowed_actions: vec!["read".to_string()],
            }],
            tenant_permissions: None,
            role_mappings: RoleMappings {
                backend_roles: backend_roles.iter().map(ToString::to_string).collect(),
                users: None,
                hosts: None,
            },
        },
    ))
}

pub fn user(name: &str) -> User {
    stamp(User::new(
        name,
        UserSpec {
            password: Some("correct-horse".to_string()),
            hash: None,
            backend_roles: Some(vec!["readers".to_string()]),
            opendistro_security_roles: None,
            attributes: None,
            description: Some("test user".to_string()),
        },
    ))
}

pub fn role_mapping(name: &str, backend_roles: &[&str]) -> RoleMapping {
    stamp(RoleMapping::new(
        name,
        RoleMappingSpec {
            backend_roles: Some(backend_roles.iter().map(ToString::to_string).collect()),
            ..RoleMappingSpec::default()
        },
    ))
}
