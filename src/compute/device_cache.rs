use std::{
    collections::HashMap,
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use tracing::{debug, info, warn};

use crate::{
    compute::{
        backend::{Backend, BackendFactory, ConfigurationOptions},
        cpu_backend::{CPU_TARGET, CpuBackendFactory},
    },
    tensor::Tensor,
    tensor_graph::{TensorGraph, TensorId},
    utils::error::HarnessError,
};

type SharedBackend = Arc<Mutex<Box<dyn Backend>>>;
type HandleKey = (String, ConfigurationOptions);

/// Explicit replacement for a process-wide plugin cache.
///
/// Created at suite start and torn down at suite end. With `reuse` enabled one backend
/// per (target, options) is kept alive between leases; otherwise each lease gets a fresh
/// backend that is released when the lease drops.
pub struct DeviceCache {
    factories: HashMap<String, Box<dyn BackendFactory>>,
    handles: Mutex<HashMap<HandleKey, SharedBackend>>,
    reuse: bool,
    active_leases: AtomicUsize,
    created: AtomicUsize,
}

impl Debug for DeviceCache {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut targets: Vec<&String> = self.factories.keys().collect();
        targets.sort();
        f.debug_struct("DeviceCache")
            .field("targets", &targets)
            .field("reuse", &self.reuse)
            .field("active_leases", &self.active_leases())
            .finish()
    }
}

impl DeviceCache {
    pub fn new(reuse: bool) -> Self {
        Self {
            factories: HashMap::new(),
            handles: Mutex::new(HashMap::new()),
            reuse,
            active_leases: AtomicUsize::new(0),
            created: AtomicUsize::new(0),
        }
    }

    /// A cache with the built-in CPU backend registered.
    pub fn with_cpu(reuse: bool) -> Self {
        let mut cache = Self::new(reuse);
        cache.register(CPU_TARGET, CpuBackendFactory);
        cache
    }

    pub fn register(&mut self, target: impl Into<String>, factory: impl BackendFactory + 'static) {
        self.factories.insert(target.into(), Box::new(factory));
    }

    pub fn targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = self.factories.keys().cloned().collect();
        targets.sort();
        targets
    }

    pub fn active_leases(&self) -> usize {
        self.active_leases.load(Ordering::SeqCst)
    }

    /// Number of backends the factories have created so far.
    pub fn backends_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn acquire(
        &self,
        target: &str,
        options: &ConfigurationOptions,
    ) -> Result<BackendLease<'_>, HarnessError> {
        let factory = self
            .factories
            .get(target)
            .ok_or_else(|| HarnessError::BackendAcquisition {
                target: target.to_string(),
                message: format!("no backend registered, known targets {:?}", self.targets()),
            })?;

        let handle = if self.reuse {
            let mut handles = self.lock_handles().map_err(|message| {
                HarnessError::BackendAcquisition {
                    target: target.to_string(),
                    message,
                }
            })?;
            let key = (target.to_string(), options.clone());
            match handles.get(&key) {
                Some(handle) => {
                    debug!(target, "reusing cached backend");
                    Arc::clone(handle)
                }
                None => {
                    let handle = self.create(factory.as_ref(), target, options)?;
                    handles.insert(key, Arc::clone(&handle));
                    handle
                }
            }
        } else {
            self.create(factory.as_ref(), target, options)?
        };

        self.active_leases.fetch_add(1, Ordering::SeqCst);
        Ok(BackendLease {
            cache: self,
            target: target.to_string(),
            handle,
            owned: !self.reuse,
        })
    }

    fn create(
        &self,
        factory: &dyn BackendFactory,
        target: &str,
        options: &ConfigurationOptions,
    ) -> Result<SharedBackend, HarnessError> {
        let backend = factory.create(target, options)?;
        self.created.fetch_add(1, Ordering::SeqCst);
        debug!(target, ?options, "backend created");
        Ok(Arc::new(Mutex::new(backend)))
    }

    fn lock_handles(&self) -> Result<MutexGuard<'_, HashMap<HandleKey, SharedBackend>>, String> {
        self.handles
            .lock()
            .map_err(|_| "device cache lock poisoned".to_string())
    }

    fn release_cached(&self) -> usize {
        let drained: Vec<SharedBackend> = {
            let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
            handles.drain().map(|(_, handle)| handle).collect()
        };

        let count = drained.len();
        for handle in drained {
            handle
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .release();
        }
        count
    }

    /// Release every cached backend. Outstanding leases cannot exist here, they borrow
    /// the cache.
    pub fn teardown(self) {
        let released = self.release_cached();
        info!(
            released,
            created = self.backends_created(),
            "device cache torn down"
        );
    }
}

impl Drop for DeviceCache {
    fn drop(&mut self) {
        let released = self.release_cached();
        if released > 0 {
            warn!(released, "device cache dropped without teardown");
        }
    }
}

/// Scoped access to one backend. Dropping it releases the backend, or hands it back to
/// the cache when backends are reused.
pub struct BackendLease<'a> {
    cache: &'a DeviceCache,
    target: String,
    handle: SharedBackend,
    owned: bool,
}

impl Debug for BackendLease<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("BackendLease")
            .field("target", &self.target)
            .field("owned", &self.owned)
            .finish()
    }
}

impl BackendLease<'_> {
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Executions on one backend are serialised through its mutex.
    pub fn execute(
        &self,
        graph: &TensorGraph,
        inputs: &HashMap<TensorId, Tensor>,
    ) -> Result<HashMap<TensorId, Tensor>, HarnessError> {
        let mut backend = self.handle.lock().map_err(|_| {
            HarnessError::Execution(format!(
                "backend '{}' is poisoned by an earlier panic",
                self.target
            ))
        })?;
        backend.execute(graph, inputs)
    }
}

impl Drop for BackendLease<'_> {
    fn drop(&mut self) {
        if self.owned {
            self.handle
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .release();
            debug!(target = %self.target, "backend released");
        }
        self.cache.active_leases.fetch_sub(1, Ordering::SeqCst);
    }
}
