//! Engine runtime bundle selection.

use log::debug;

/// How the engine executes jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineBundle {
    /// Dedicated background worker thread; callers block on a reply channel.
    Worker,
    /// Jobs run on the calling thread under a mutex.
    Inline,
}

impl EngineBundle {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "worker" => Some(Self::Worker),
            "inline" => Some(Self::Inline),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Worker => "worker",
            Self::Inline => "inline",
        }
    }
}

/// Facts about the host used to pick a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    pub parallelism: usize,
}

impl HostCapabilities {
    pub fn detect() -> Self {
        let parallelism = std::thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(1);
        Self { parallelism }
    }
}

/// Picks the worker bundle when the host can run it next to the caller.
pub fn select_bundle(host: HostCapabilities) -> EngineBundle {
    let bundle = if host.parallelism >= 2 {
        EngineBundle::Worker
    } else {
        EngineBundle::Inline
    };
    debug!(
        "event=engine_bundle_select module=engine parallelism={} bundle={}",
        host.parallelism,
        bundle.as_str()
    );
    bundle
}

#[cfg(test)]
mod tests {
    use super::{select_bundle, EngineBundle, HostCapabilities};

    #[test]
    fn single_core_hosts_run_inline() {
        assert_eq!(
            select_bundle(HostCapabilities { parallelism: 1 }),
            EngineBundle::Inline
        );
    }

    #[test]
    fn multi_core_hosts_use_worker() {
        assert_eq!(
            select_bundle(HostCapabilities { parallelism: 8 }),
            EngineBundle::Worker
        );
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(EngineBundle::parse(" Worker"), Some(EngineBundle::Worker));
        assert_eq!(EngineBundle::parse("mvp"), None);
    }
}
