//! GPU context management.

use std::sync::Arc;
use tracing::{debug, info};
use viewfinder_core::{Result, ViewfinderError};

/// GPU context holding device and queue.
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
}

impl GpuContext {
    /// Backends tried for this platform.
    pub fn default_backends() -> wgpu::Backends {
        // Prefer Metal on macOS, Vulkan on others
        #[cfg(target_os = "macos")]
        let backends = wgpu::Backends::METAL;
        #[cfg(not(target_os = "macos"))]
        let backends = wgpu::Backends::VULKAN | wgpu::Backends::DX12 | wgpu::Backends::GL;
        backends
    }

    /// Create an instance for the platform's default backends.
    pub fn create_instance() -> wgpu::Instance {
        wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: Self::default_backends(),
            ..Default::default()
        })
    }

    /// Create a headless GPU context.
    pub async fn new() -> Result<Self> {
        Self::from_instance(Self::create_instance(), None).await
    }

    /// Create a context from an existing instance, optionally requiring an
    /// adapter that can present to `compatible_surface`.
    pub async fn from_instance(
        instance: wgpu::Instance,
        compatible_surface: Option<&wgpu::Surface<'_>>,
    ) -> Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| ViewfinderError::Gpu("No suitable GPU adapter found".to_string()))?;

        info!("Using GPU adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Viewfinder Device"),
                    required_features: wgpu::Features::empty(),
                    // Full-resolution sensor frames need the adapter's texture limits
                    required_limits: wgpu::Limits::downlevel_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .map_err(|e| ViewfinderError::Gpu(format!("Failed to create device: {}", e)))?;

        device.on_uncaptured_error(Box::new(|e| {
            tracing::error!(error = %e, "Uncaptured GPU error");
        }));

        Ok(Self {
            instance,
            adapter,
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }

    /// Create a headless GPU context (blocking version).
    pub fn new_blocking() -> Result<Self> {
        pollster::block_on(Self::new())
    }

    /// Process completed GPU work without blocking; runs map callbacks.
    pub fn poll(&self) {
        let _ = self.device.poll(wgpu::Maintain::Poll);
    }

    /// Block until all submitted work has completed.
    pub fn wait_idle(&self) {
        debug!("Waiting for GPU idle");
        let _ = self.device.poll(wgpu::Maintain::Wait);
    }
}
