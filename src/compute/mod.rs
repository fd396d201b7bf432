pub mod backend;
pub mod cpu_backend;
pub mod device_cache;
pub mod reference;
pub mod store;

pub use backend::{Backend, BackendFactory, ConfigurationOptions};
pub use cpu_backend::{CPU_TARGET, CpuBackend, CpuBackendFactory};
pub use device_cache::{BackendLease, DeviceCache};
pub use reference::{HostTensor, ReferenceEvaluator};
