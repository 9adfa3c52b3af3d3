use candle_core::Device;
use tracing::{debug, warn};

/// Picks the inference device: Metal or CUDA when compiled in and present, else CPU.
pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => {
                debug!("embedding on Metal device");
                return device;
            }
            Err(e) => warn!(error = %e, "Metal device unavailable"),
        }
    }

    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(0) {
            Ok(device) => {
                debug!("embedding on CUDA device");
                return device;
            }
            Err(e) => warn!(error = %e, "CUDA device unavailable"),
        }
    }

    if cfg!(any(feature = "metal", feature = "cuda")) {
        warn!("GPU backend unavailable, embedding on CPU");
    } else {
        debug!("embedding on CPU");
    }
    Device::Cpu
}
