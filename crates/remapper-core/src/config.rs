//! Engine configuration.

/// Knobs consumed by propagation, rewriting and the worker pool.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemapperConfig {
    /// Treat private methods as propagation-eligible (default: false).
    ///
    /// Private methods never override anything, so they are normally left out
    /// of closures. Enable this when the mapping source deliberately gives
    /// private members the same name as a same-named public counterpart.
    pub propagate_private: bool,

    /// Drop `StackMapTable` attributes instead of carrying them over
    /// (default: false).
    ///
    /// The consuming loader then has to recompute frames.
    pub remove_frames: bool,

    /// Worker pool size. `None` uses the available parallelism.
    pub threads: Option<usize>,
}

impl RemapperConfig {
    pub fn with_propagate_private(mut self, enabled: bool) -> Self {
        self.propagate_private = enabled;
        self
    }

    pub fn with_remove_frames(mut self, enabled: bool) -> Self {
        self.remove_frames = enabled;
        self
    }

    /// Zero is treated like `None`.
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads.filter(|&n| n > 0);
        self
    }

    /// Number of worker threads the pool will be built with.
    pub fn thread_count(&self) -> usize {
        self.threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_builders() {
        let config = RemapperConfig::default();
        assert!(!config.propagate_private);
        assert!(!config.remove_frames);
        assert!(config.thread_count() >= 1);

        let config = config
            .with_propagate_private(true)
            .with_remove_frames(true)
            .with_threads(Some(3));
        assert!(config.propagate_private && config.remove_frames);
        assert_eq!(config.thread_count(), 3);
        assert_eq!(config.with_threads(Some(0)).threads, None);
    }
}
