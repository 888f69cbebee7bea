use std::sync::Arc;

// -----------------------------------------------------------------------------
// Backend

/// The realization an accessor is built with.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// A chain of resolved nodes that re-resolves on receiver changes.
    Interpreted,
    /// A fixed plan of pre-bound steps.
    #[default]
    Compiled,
}

// -----------------------------------------------------------------------------
// AccessConfig

/// Settings of an [`AccessorFactory`](crate::AccessorFactory).
///
/// # Examples
///
/// ```
/// use vp_access::{AccessConfig, Backend};
///
/// let config = AccessConfig::default()
///     .with_self_token("self")
///     .with_backend(Backend::Interpreted)
///     .with_static_access(false);
///
/// assert_eq!(config.self_token(), "self");
/// assert_eq!(config.backend(), Backend::Interpreted);
/// assert!(!config.static_access());
/// ```
#[derive(Debug, Clone)]
pub struct AccessConfig {
    self_token: Arc<str>,
    static_access: bool,
    backend: Backend,
    member_cache_capacity: usize,
    accessor_cache_capacity: usize,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            self_token: Arc::from("this"),
            static_access: true,
            backend: Backend::default(),
            member_cache_capacity: 4096,
            accessor_cache_capacity: 1024,
        }
    }
}

impl AccessConfig {
    /// The first-segment name that evaluates to the `this` value.
    pub fn with_self_token(mut self, token: &str) -> Self {
        self.self_token = Arc::from(token);
        self
    }

    /// Whether a leading class name, such as `demo.Point.ORIGIN`, may be
    /// resolved as a static reference.
    pub fn with_static_access(mut self, enabled: bool) -> Self {
        self.static_access = enabled;
        self
    }

    /// The backend used by [`get_value`](crate::AccessorFactory::get_value).
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Bounds each member cache. `0` means unbounded.
    pub fn with_member_cache_capacity(mut self, capacity: usize) -> Self {
        self.member_cache_capacity = capacity;
        self
    }

    /// Bounds the accessor and segment caches. `0` means unbounded.
    pub fn with_accessor_cache_capacity(mut self, capacity: usize) -> Self {
        self.accessor_cache_capacity = capacity;
        self
    }

    #[inline]
    pub fn self_token(&self) -> &str {
        &self.self_token
    }

    #[inline]
    pub fn static_access(&self) -> bool {
        self.static_access
    }

    #[inline]
    pub fn backend(&self) -> Backend {
        self.backend
    }

    #[inline]
    pub fn member_cache_capacity(&self) -> usize {
        self.member_cache_capacity
    }

    #[inline]
    pub fn accessor_cache_capacity(&self) -> usize {
        self.accessor_cache_capacity
    }
}
