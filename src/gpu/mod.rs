//! GPU path: context lifecycle, device seams and the resize operation.

pub mod backend;
pub mod context;
pub mod resize;

#[cfg(feature = "wgpu-backend")]
mod device;
#[cfg(feature = "wgpu-backend")]
mod pipeline;

pub use backend::{
    AdapterSummary, DeviceError, DeviceProvider, GpuAdapter, NoGpuProvider, RenderDevice,
    SurfaceConfig, SurfaceFormat, TextureId,
};
pub use context::{ContextProvider, GraphicsContext, OutputSurface, SurfaceLease};
#[cfg(feature = "wgpu-backend")]
pub use device::WgpuProvider;
pub use resize::{StageTimings, render_resized, resize_gpu};

use std::sync::Arc;

/// The provider used when none is injected: wgpu when compiled in, otherwise
/// one that never finds an adapter.
pub fn default_provider() -> Arc<dyn DeviceProvider> {
    #[cfg(feature = "wgpu-backend")]
    {
        Arc::new(WgpuProvider)
    }
    #[cfg(not(feature = "wgpu-backend"))]
    {
        Arc::new(NoGpuProvider)
    }
}
