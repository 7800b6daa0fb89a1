use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use crate::backend::{fast, general, noop};
use crate::combine::op::Operator;
use crate::combine::reference::{self, CombineFn};
use crate::dispatch::fast_path::{self, CompositeFn, FastPath, PathKey};
use crate::foundation::error::{PixmixError, PixmixResult};

/// Environment variable listing backends to leave out of the detected chain.
pub const DISABLE_ENV: &str = "PIXMIX_DISABLE";

/// One layer of the implementation chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Fetch, combine, store. Handles every composite.
    General,
    /// Portable packed-lane kernels.
    Fast,
    /// x86 SSE2 kernels.
    Sse2,
    /// x86 AVX2 kernels, when the CPU has them.
    Avx2,
    /// Composites that leave the destination untouched.
    Noop,
}

impl BackendKind {
    /// Every backend from generic to specialized.
    pub const ALL: [BackendKind; 5] = [
        BackendKind::General,
        BackendKind::Fast,
        BackendKind::Sse2,
        BackendKind::Avx2,
        BackendKind::Noop,
    ];

    /// Name used in logs and in [`DISABLE_ENV`].
    pub const fn name(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Fast => "fast",
            Self::Sse2 => "sse2",
            Self::Avx2 => "avx2",
            Self::Noop => "noop",
        }
    }

    /// Whether this machine can run the backend.
    pub fn is_available(self) -> bool {
        match self {
            Self::General | Self::Fast | Self::Noop => true,
            Self::Sse2 | Self::Avx2 => x86_has(self),
        }
    }

    fn tables(self) -> (&'static [FastPath], &'static [(Operator, CombineFn)]) {
        match self {
            Self::General => (general::FAST_PATHS, &[]),
            Self::Fast => (fast::FAST_PATHS, &[]),
            Self::Noop => (noop::FAST_PATHS, &[]),
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            Self::Sse2 => (crate::backend::sse2::FAST_PATHS, crate::backend::sse2::COMBINERS),
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            Self::Avx2 => (crate::backend::avx2::FAST_PATHS, crate::backend::avx2::COMBINERS),
            #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
            Self::Sse2 | Self::Avx2 => (&[], &[]),
        }
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn x86_has(kind: BackendKind) -> bool {
    match kind {
        BackendKind::Sse2 => std::arch::is_x86_feature_detected!("sse2"),
        BackendKind::Avx2 => std::arch::is_x86_feature_detected!("avx2"),
        _ => false,
    }
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn x86_has(_kind: BackendKind) -> bool {
    false
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = PixmixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PixmixError::validation(format!("unknown backend \"{s}\"")))
    }
}

/// A fast-path table and combiner overrides, with the implementation to try next.
///
/// Immutable once built; share it behind an [`Arc`].
#[derive(Debug)]
pub struct Implementation {
    kind: BackendKind,
    fast_paths: &'static [FastPath],
    combiners: &'static [(Operator, CombineFn)],
    fallback: Option<Arc<Implementation>>,
}

impl Implementation {
    /// Which backend this layer is.
    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// The next, more general layer. `None` only for the general implementation.
    pub fn fallback(&self) -> Option<&Arc<Implementation>> {
        self.fallback.as_ref()
    }

    /// This implementation followed by its fallbacks.
    pub fn chain(&self) -> impl Iterator<Item = &Implementation> {
        std::iter::successors(Some(self), |imp| imp.fallback.as_deref())
    }

    /// The routine and owning backend for `key`. Never fails: the end of every chain handles
    /// everything.
    pub(crate) fn resolve(&self, key: &PathKey) -> (BackendKind, CompositeFn) {
        self.chain()
            .find_map(|imp| fast_path::find(imp.fast_paths, key).map(|func| (imp.kind, func)))
            .unwrap_or((BackendKind::General, general::general_composite))
    }

    /// Which backend would run a composite described by `key`.
    pub fn resolve_backend(&self, key: &PathKey) -> BackendKind {
        self.resolve(key).0
    }

    /// The scanline combiner for `op`: the first override along the chain, else the
    /// reference combiner.
    pub(crate) fn lookup_combiner(&self, op: Operator) -> CombineFn {
        self.chain()
            .find_map(|imp| {
                imp.combiners
                    .iter()
                    .find(|(o, _)| *o == op)
                    .map(|&(_, combine)| combine)
            })
            .unwrap_or(reference::combine)
    }
}

/// The tail of every chain.
pub fn create_general_implementation() -> Arc<Implementation> {
    let (fast_paths, combiners) = BackendKind::General.tables();
    Arc::new(Implementation {
        kind: BackendKind::General,
        fast_paths,
        combiners,
        fallback: None,
    })
}

/// Build one backend over `fallback`.
pub fn create_implementation(
    kind: BackendKind,
    fallback: Arc<Implementation>,
) -> PixmixResult<Arc<Implementation>> {
    if kind == BackendKind::General {
        return Err(PixmixError::validation(
            "the general implementation is the chain tail and takes no fallback",
        ));
    }
    if !kind.is_available() {
        return Err(PixmixError::unsupported(format!(
            "{kind} is not supported on this CPU"
        )));
    }
    let (fast_paths, combiners) = kind.tables();
    Ok(Arc::new(Implementation {
        kind,
        fast_paths,
        combiners,
        fallback: Some(fallback),
    }))
}

/// Which backends a chain leaves out.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChainConfig {
    /// Backends to skip when composing the chain.
    #[serde(default)]
    pub disabled: Vec<BackendKind>,
}

impl ChainConfig {
    /// Read [`DISABLE_ENV`]: backend names separated by commas or spaces.
    pub fn from_env() -> Self {
        std::env::var(DISABLE_ENV)
            .map(|v| Self::parse_list(&v))
            .unwrap_or_default()
    }

    /// Parse a disable list. Unknown names and `general` are logged and ignored.
    pub fn parse_list(list: &str) -> Self {
        let mut disabled = Vec::new();
        for name in list.split([',', ' ']).filter(|s| !s.is_empty()) {
            match name.parse::<BackendKind>() {
                Ok(BackendKind::General) => {
                    tracing::warn!("{DISABLE_ENV}: the general backend cannot be disabled");
                }
                Ok(kind) if !disabled.contains(&kind) => disabled.push(kind),
                Ok(_) => {}
                Err(_) => tracing::warn!(name, "{DISABLE_ENV}: ignoring unknown backend"),
            }
        }
        Self { disabled }
    }

    /// Whether `kind` is in the disable list.
    pub fn is_disabled(&self, kind: BackendKind) -> bool {
        self.disabled.contains(&kind)
    }
}

/// A built implementation chain.
#[derive(Clone, Debug)]
pub struct ImplementationChain {
    head: Arc<Implementation>,
}

impl ImplementationChain {
    /// Compose every available, enabled backend, most specialized at the head.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn new(config: &ChainConfig) -> Self {
        let mut head = create_general_implementation();
        for kind in [
            BackendKind::Fast,
            BackendKind::Sse2,
            BackendKind::Avx2,
            BackendKind::Noop,
        ] {
            if config.is_disabled(kind) {
                tracing::debug!(backend = kind.name(), "backend disabled");
                continue;
            }
            match create_implementation(kind, Arc::clone(&head)) {
                Ok(imp) => head = imp,
                Err(err) => tracing::debug!(backend = kind.name(), %err, "backend skipped"),
            }
        }
        let chain = Self { head };
        tracing::debug!(backends = ?chain.backends(), "implementation chain ready");
        chain
    }

    /// The chain for this machine and [`DISABLE_ENV`].
    pub fn detect() -> Self {
        Self::new(&ChainConfig::from_env())
    }

    /// Only the general implementation: every composite goes through fetch, combine, store.
    pub fn reference() -> Self {
        Self {
            head: create_general_implementation(),
        }
    }

    /// Wrap an implementation built by hand with [`create_implementation`].
    pub fn from_head(head: Arc<Implementation>) -> Self {
        Self { head }
    }

    /// The most specialized layer, where resolution starts.
    pub fn head(&self) -> &Implementation {
        &self.head
    }

    /// Backend kinds from head to tail.
    pub fn backends(&self) -> Vec<BackendKind> {
        self.head.chain().map(Implementation::kind).collect()
    }
}

static DEFAULT_CHAIN: OnceLock<ImplementationChain> = OnceLock::new();

/// The process-wide chain, detected on first use.
pub fn default_chain() -> &'static ImplementationChain {
    DEFAULT_CHAIN.get_or_init(ImplementationChain::detect)
}

#[cfg(test)]
#[path = "../../tests/unit/dispatch/implementation.rs"]
mod tests;
