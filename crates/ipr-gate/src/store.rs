use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

use crate::types::{address_set_hash, ApprovalRequest, ApprovalState, GateError};

/// Injectable persistence for approval requests.
///
/// Every method is atomic with respect to the others: concurrent submits
/// for the same address set observe at most one PENDING request, and an
/// APPROVED request can be claimed for execution exactly once.
pub trait ApprovalStore: Send + Sync {
    /// Find-or-create: returns the existing PENDING request for this
    /// canonical address set, or inserts a fresh one.
    fn submit_or_existing(&self, canonical: Vec<String>) -> Result<ApprovalRequest, GateError>;

    fn get(&self, token: Uuid) -> Result<Option<ApprovalRequest>, GateError>;

    /// PENDING -> APPROVED / REJECTED. Any other state: no-op returning the
    /// current request.
    fn decide(&self, token: Uuid, approved: bool) -> Result<ApprovalRequest, GateError>;

    /// Abandon: PENDING or APPROVED -> REJECTED. Terminal states: no-op.
    fn cancel(&self, token: Uuid) -> Result<ApprovalRequest, GateError>;

    /// Claim an APPROVED request for execution. Fails with `NotApproved`
    /// for any other state and `AlreadyRunning` if a claim is outstanding.
    fn begin_execute(&self, token: Uuid) -> Result<ApprovalRequest, GateError>;

    /// Release the claim and write the terminal state: EXECUTED iff every
    /// item succeeded, FAILED otherwise.
    fn finish_execute(&self, token: Uuid, all_succeeded: bool)
        -> Result<ApprovalRequest, GateError>;
}

// ---------------------------------------------------------------------------
// Shared transition logic (both store impls apply these under their lock)
// ---------------------------------------------------------------------------

type RequestMap = BTreeMap<Uuid, ApprovalRequest>;

fn apply_submit(map: &mut RequestMap, canonical: Vec<String>) -> ApprovalRequest {
    let hash = address_set_hash(&canonical);
    if let Some(existing) = map
        .values()
        .find(|r| r.state == ApprovalState::Pending && address_set_hash(&r.addresses) == hash)
    {
        return existing.clone();
    }

    let request = ApprovalRequest {
        token: Uuid::new_v4(),
        addresses: canonical,
        state: ApprovalState::Pending,
        created_at: Utc::now(),
        decided_at: None,
    };
    map.insert(request.token, request.clone());
    request
}

fn apply_decide(map: &mut RequestMap, token: Uuid, approved: bool) -> Result<ApprovalRequest, GateError> {
    let request = map
        .get_mut(&token)
        .ok_or(GateError::UnknownToken { token })?;

    if request.state == ApprovalState::Pending {
        request.state = if approved {
            ApprovalState::Approved
        } else {
            ApprovalState::Rejected
        };
        request.decided_at = Some(Utc::now());
    }
    Ok(request.clone())
}

fn apply_cancel(map: &mut RequestMap, token: Uuid) -> Result<ApprovalRequest, GateError> {
    let request = map
        .get_mut(&token)
        .ok_or(GateError::UnknownToken { token })?;

    if matches!(request.state, ApprovalState::Pending | ApprovalState::Approved) {
        request.state = ApprovalState::Rejected;
        request.decided_at = Some(Utc::now());
    }
    Ok(request.clone())
}

fn apply_begin(
    map: &RequestMap,
    in_flight: &mut BTreeSet<Uuid>,
    token: Uuid,
) -> Result<ApprovalRequest, GateError> {
    let request = map.get(&token).ok_or(GateError::UnknownToken { token })?;

    if request.state != ApprovalState::Approved {
        return Err(GateError::NotApproved {
            token,
            state: request.state,
        });
    }
    if !in_flight.insert(token) {
        return Err(GateError::AlreadyRunning { token });
    }
    Ok(request.clone())
}

fn apply_finish(
    map: &mut RequestMap,
    in_flight: &mut BTreeSet<Uuid>,
    token: Uuid,
    all_succeeded: bool,
) -> Result<ApprovalRequest, GateError> {
    in_flight.remove(&token);

    let request = map
        .get_mut(&token)
        .ok_or(GateError::UnknownToken { token })?;
    request.state = if all_succeeded {
        ApprovalState::Executed
    } else {
        ApprovalState::Failed
    };
    Ok(request.clone())
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryInner {
    by_token: RequestMap,
    in_flight: BTreeSet<Uuid>,
}

/// Single-process store. Sufficient for an embedded service or tests; the
/// JSON-file store covers CLI deployments where each command is a process.
#[derive(Default)]
pub struct InMemoryApprovalStore {
    inner: Mutex<MemoryInner>,
}

impl InMemoryApprovalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryInner>, GateError> {
        self.inner.lock().map_err(|_| GateError::Store {
            detail: "approval store lock poisoned".to_string(),
        })
    }
}

impl ApprovalStore for InMemoryApprovalStore {
    fn submit_or_existing(&self, canonical: Vec<String>) -> Result<ApprovalRequest, GateError> {
        let mut inner = self.lock()?;
        Ok(apply_submit(&mut inner.by_token, canonical))
    }

    fn get(&self, token: Uuid) -> Result<Option<ApprovalRequest>, GateError> {
        let inner = self.lock()?;
        Ok(inner.by_token.get(&token).cloned())
    }

    fn decide(&self, token: Uuid, approved: bool) -> Result<ApprovalRequest, GateError> {
        let mut inner = self.lock()?;
        apply_decide(&mut inner.by_token, token, approved)
    }

    fn cancel(&self, token: Uuid) -> Result<ApprovalRequest, GateError> {
        let mut inner = self.lock()?;
        apply_cancel(&mut inner.by_token, token)
    }

    fn begin_execute(&self, token: Uuid) -> Result<ApprovalRequest, GateError> {
        let mut guard = self.lock()?;
        let inner = &mut *guard;
        apply_begin(&inner.by_token, &mut inner.in_flight, token)
    }

    fn finish_execute(
        &self,
        token: Uuid,
        all_succeeded: bool,
    ) -> Result<ApprovalRequest, GateError> {
        let mut guard = self.lock()?;
        let inner = &mut *guard;
        apply_finish(&mut inner.by_token, &mut inner.in_flight, token, all_succeeded)
    }
}

// ---------------------------------------------------------------------------
// JSON-file store
// ---------------------------------------------------------------------------

/// File-backed store for single-operator CLI deployments: each gate command
/// runs in its own process, so requests must outlive the process.
///
/// The whole request map lives in one JSON file, rewritten atomically
/// (temp file + rename) under a process-local lock. Multi-writer
/// deployments need a real database behind [`ApprovalStore`] instead.
pub struct JsonFileApprovalStore {
    path: PathBuf,
    lock: Mutex<BTreeSet<Uuid>>,
}

impl JsonFileApprovalStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GateError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| GateError::Store {
                detail: format!("create state dir {}: {e}", parent.display()),
            })?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(BTreeSet::new()),
        })
    }

    fn load(&self) -> Result<RequestMap, GateError> {
        if !self.path.exists() {
            return Ok(RequestMap::new());
        }
        let raw = fs::read_to_string(&self.path).map_err(|e| GateError::Store {
            detail: format!("read {}: {e}", self.path.display()),
        })?;
        if raw.trim().is_empty() {
            return Ok(RequestMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| GateError::Store {
            detail: format!("parse {}: {e}", self.path.display()),
        })
    }

    fn save(&self, map: &RequestMap) -> Result<(), GateError> {
        let raw = serde_json::to_string_pretty(map).map_err(|e| GateError::Store {
            detail: format!("serialize approval requests: {e}"),
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw).map_err(|e| GateError::Store {
            detail: format!("write {}: {e}", tmp.display()),
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| GateError::Store {
            detail: format!("rename into {}: {e}", self.path.display()),
        })
    }

    fn locked<T>(
        &self,
        f: impl FnOnce(&mut RequestMap, &mut BTreeSet<Uuid>) -> Result<T, GateError>,
        dirty: bool,
    ) -> Result<T, GateError> {
        let mut in_flight = self.lock.lock().map_err(|_| GateError::Store {
            detail: "approval store lock poisoned".to_string(),
        })?;
        let mut map = self.load()?;
        let out = f(&mut map, &mut in_flight)?;
        if dirty {
            self.save(&map)?;
        }
        Ok(out)
    }
}

impl ApprovalStore for JsonFileApprovalStore {
    fn submit_or_existing(&self, canonical: Vec<String>) -> Result<ApprovalRequest, GateError> {
        self.locked(|map, _| Ok(apply_submit(map, canonical)), true)
    }

    fn get(&self, token: Uuid) -> Result<Option<ApprovalRequest>, GateError> {
        self.locked(|map, _| Ok(map.get(&token).cloned()), false)
    }

    fn decide(&self, token: Uuid, approved: bool) -> Result<ApprovalRequest, GateError> {
        self.locked(|map, _| apply_decide(map, token, approved), true)
    }

    fn cancel(&self, token: Uuid) -> Result<ApprovalRequest, GateError> {
        self.locked(|map, _| apply_cancel(map, token), true)
    }

    fn begin_execute(&self, token: Uuid) -> Result<ApprovalRequest, GateError> {
        self.locked(|map, in_flight| apply_begin(map, in_flight, token), false)
    }

    fn finish_execute(
        &self,
        token: Uuid,
        all_succeeded: bool,
    ) -> Result<ApprovalRequest, GateError> {
        self.locked(
            |map, in_flight| apply_finish(map, in_flight, token, all_succeeded),
            true,
        )
    }
}
