use std::fmt;

/// Where the policy runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    Cpu,

    /// A CUDA device, by index.
    Cuda(usize),
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => f.write_str("cpu"),
            Self::Cuda(index) => write!(f, "cuda:{index}"),
        }
    }
}

/// The device the user asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeviceChoice {
    /// The first CUDA device if there is one, else the CPU.
    #[default]
    Auto,
    Cpu,
    Cuda,
}

impl DeviceChoice {
    /// `None` if CUDA was asked for explicitly but isn't available.
    pub fn resolve(self, cuda_available: bool) -> Option<Device> {
        match (self, cuda_available) {
            (Self::Auto | Self::Cuda, true) => Some(Device::Cuda(0)),
            (Self::Auto, false) | (Self::Cpu, _) => Some(Device::Cpu),
            (Self::Cuda, false) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        assert_eq!(DeviceChoice::Auto.resolve(true), Some(Device::Cuda(0)));
        assert_eq!(DeviceChoice::Auto.resolve(false), Some(Device::Cpu));
        assert_eq!(DeviceChoice::Cpu.resolve(true), Some(Device::Cpu));
        assert_eq!(DeviceChoice::Cuda.resolve(false), None);
        assert_eq!(Device::Cuda(1).to_string(), "cuda:1");
    }
}
