//! Graphics context lifecycle.
//!
//! A [`ContextProvider`] owns at most one [`GraphicsContext`]. The first
//! [`acquire`](ContextProvider::acquire) asks the provider hook for an adapter
//! and a device, allocates the off-screen output surface and caches the result.
//! Later calls return the cache without touching the hook. A failed
//! acquisition caches nothing, so the next call tries again.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::backend::{
    AdapterSummary, DeviceError, DeviceProvider, RenderDevice, SurfaceConfig, SurfaceFormat,
};
use crate::config::PowerPreference;

/// The adapter, device and output surface of one live GPU session.
pub struct GraphicsContext {
    adapter: AdapterSummary,
    device: Arc<dyn RenderDevice>,
    surface: OutputSurface,
}

impl GraphicsContext {
    pub fn adapter(&self) -> &AdapterSummary {
        &self.adapter
    }

    pub fn device(&self) -> &dyn RenderDevice {
        self.device.as_ref()
    }

    pub fn surface(&self) -> &OutputSurface {
        &self.surface
    }
}

impl std::fmt::Debug for GraphicsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsContext")
            .field("adapter", &self.adapter)
            .field("format", &self.surface.format)
            .finish()
    }
}

/// Off-screen render target shared by every operation on a context.
///
/// The configuration lock doubles as the device lock: an operation holds
/// the [`SurfaceLease`] from configuration to readback.
pub struct OutputSurface {
    format: SurfaceFormat,
    config: Mutex<SurfaceConfig>,
}

impl OutputSurface {
    pub fn format(&self) -> SurfaceFormat {
        self.format
    }

    /// Wait for exclusive use of the surface.
    pub async fn lease(&self) -> SurfaceLease<'_> {
        SurfaceLease {
            config: self.config.lock().await,
        }
    }

    pub async fn current(&self) -> SurfaceConfig {
        *self.config.lock().await
    }
}

/// Exclusive access to the output surface for one operation.
pub struct SurfaceLease<'a> {
    config: MutexGuard<'a, SurfaceConfig>,
}

impl SurfaceLease<'_> {
    pub fn config(&self) -> SurfaceConfig {
        *self.config
    }

    /// Resize the surface, keeping its format.
    pub async fn configure(
        &mut self,
        device: &dyn RenderDevice,
        width: u32,
        height: u32,
    ) -> Result<SurfaceConfig, DeviceError> {
        let max = device.max_texture_dimension();
        if width > max || height > max {
            return Err(DeviceError::TextureTooLarge { width, height, max });
        }
        let next = SurfaceConfig {
            format: self.config.format,
            width,
            height,
        };
        device.configure_surface(next).await?;
        *self.config = next;
        Ok(next)
    }
}

/// Lazily initialised, explicitly released owner of the graphics context.
pub struct ContextProvider {
    hook: Arc<dyn DeviceProvider>,
    power_preference: PowerPreference,
    init_gate: Mutex<()>,
    cached: RwLock<Option<Arc<GraphicsContext>>>,
}

impl ContextProvider {
    pub fn new(hook: Arc<dyn DeviceProvider>, power_preference: PowerPreference) -> Self {
        Self {
            hook,
            power_preference,
            init_gate: Mutex::new(()),
            cached: RwLock::new(None),
        }
    }

    /// Return the cached context, initialising it on first use.
    ///
    /// `None` means no adapter or device could be obtained.
    pub async fn acquire(&self) -> Option<Arc<GraphicsContext>> {
        if let Some(context) = self.cached() {
            return Some(context);
        }

        let _gate = self.init_gate.lock().await;
        // Another caller may have finished initialising while we waited.
        if let Some(context) = self.cached() {
            return Some(context);
        }

        let context = Arc::new(self.initialize().await?);
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = Some(context.clone());
        Some(context)
    }

    /// True only while a context is cached.
    pub fn is_available(&self) -> bool {
        self.cached().is_some()
    }

    /// Destroy the device and forget the context.
    ///
    /// New callers stop seeing the context immediately. The device is
    /// destroyed once an operation holding the surface lease has finished.
    pub async fn release(&self) {
        let _gate = self.init_gate.lock().await;
        let released = self
            .cached
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(context) = released {
            let _lease = context.surface.lease().await;
            context.device.destroy();
            info!(adapter = %context.adapter, "graphics context released");
        }
    }

    fn cached(&self) -> Option<Arc<GraphicsContext>> {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn initialize(&self) -> Option<GraphicsContext> {
        let Some(adapter) = self.hook.request_adapter(self.power_preference).await else {
            debug!(preference = ?self.power_preference, "no GPU adapter available");
            return None;
        };
        let summary = adapter.summary();

        let device = match adapter.request_device().await {
            Ok(device) => device,
            Err(e) => {
                warn!(adapter = %summary, error = %e, "GPU device request failed");
                return None;
            }
        };

        let format = device.preferred_format();
        let surface = OutputSurface {
            format,
            config: Mutex::new(SurfaceConfig {
                format,
                width: 1,
                height: 1,
            }),
        };
        if let Err(e) = surface.lease().await.configure(device.as_ref(), 1, 1).await {
            warn!(adapter = %summary, error = %e, "output surface configuration failed");
            device.destroy();
            return None;
        }

        info!(
            adapter = %summary,
            %format,
            timestamp_query = device.supports_timestamp_query(),
            "graphics context ready"
        );
        Some(GraphicsContext {
            adapter: summary,
            device,
            surface,
        })
    }
}

impl std::fmt::Debug for ContextProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextProvider")
            .field("power_preference", &self.power_preference)
            .field("available", &self.is_available())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::NoGpuProvider;

    #[tokio::test]
    async fn unavailable_provider_never_caches() {
        let contexts = ContextProvider::new(Arc::new(NoGpuProvider), PowerPreference::HighPerformance);
        assert!(!contexts.is_available());
        assert!(contexts.acquire().await.is_none());
        assert!(!contexts.is_available());
        contexts.release().await;
        assert!(!contexts.is_available());
    }
}
