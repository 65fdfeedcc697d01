use cast_device::Capability;

/// UPnP services a renderer exposes for control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// AVTransport service - Controls playback (load, play, pause, stop, seek)
    AVTransport,

    /// RenderingControl service - Controls output (volume, mute, brightness)
    RenderingControl,
}

impl Service {
    pub fn name(&self) -> &'static str {
        match self {
            Service::AVTransport => "AVTransport",
            Service::RenderingControl => "RenderingControl",
        }
    }

    /// The capability group a device must declare for this service's actions
    pub fn capability(&self) -> Capability {
        match self {
            Service::AVTransport => Capability::AvControl,
            Service::RenderingControl => Capability::RendererControl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_capabilities() {
        assert_eq!(Service::AVTransport.capability(), Capability::AvControl);
        assert_eq!(Service::RenderingControl.capability(), Capability::RendererControl);
    }
}
