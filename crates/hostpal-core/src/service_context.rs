//! # Service Context
//!
//! Lazy, once-only access to the host's service directory.
//!
//! A component on Fuchsia finds the protocols it may use in the `/svc` entry
//! of its namespace. The runtime needs a single handle to that directory for
//! the whole process: it is opened on first use and kept until exit.
//!
//! ## Pieces
//!
//! - [`ServiceDirectoryConnector`]: how the directory is opened. The default
//!   [`NamespaceConnector`] opens a path from the process namespace; tests
//!   supply their own.
//! - [`ServiceContextProvider`]: owns a connector and a one-time cell. Code
//!   that can thread a provider through should do so.
//! - `service_context()`: the process-wide accessor, only built for Fuchsia,
//!   for call sites that cannot.
//!
//! ## Example
//!
//! ```rust,no_run
//! use hostpal_core::service_context::{NamespaceConnector, ServiceContextProvider};
//!
//! let provider = ServiceContextProvider::new(NamespaceConnector::new("/svc"));
//! let context = provider.get()?;
//! let protocol = context.open_protocol("fuchsia.logger.LogSink")?;
//! # Ok::<(), hostpal_core::error::PlatformError>(())
//! ```

use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::{PlatformError, PlatformResult};

/// Default location of the service directory in a component namespace
pub const DEFAULT_SERVICE_DIRECTORY: &str = "/svc";

/// Environment variable overriding [`DEFAULT_SERVICE_DIRECTORY`]
pub const SERVICE_DIRECTORY_ENV: &str = "HOSTPAL_SVC_DIR";

/// Handle to the host's service directory
///
/// Owned by a [`ServiceContextProvider`]; callers only ever borrow it.
#[derive(Debug)]
pub struct ServiceContext
{
    path: PathBuf,
    directory: File,
}

impl ServiceContext
{
    /// Wrap an already opened directory
    #[must_use]
    pub fn new(path: PathBuf, directory: File) -> Self
    {
        Self { path, directory }
    }

    /// Path the directory was opened from
    #[must_use]
    pub fn path(&self) -> &Path
    {
        &self.path
    }

    /// The open directory
    #[must_use]
    pub fn directory(&self) -> &File
    {
        &self.directory
    }

    /// Open the protocol entry `name` inside the service directory
    ///
    /// `name` is a single path component such as `fuchsia.logger.LogSink`.
    ///
    /// ## Errors
    ///
    /// - `InvalidProtocolName`: `name` is empty, `.`/`..`, or contains a separator
    /// - `Io`: the entry could not be opened
    pub fn open_protocol(&self, name: &str) -> PlatformResult<File>
    {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\0']) {
            return Err(PlatformError::InvalidProtocolName(name.to_string()));
        }
        let path = self.path.join(name);
        debug!(protocol = name, path = %path.display(), "opening protocol");
        Ok(File::open(path)?)
    }
}

/// Opens the service directory
///
/// Implementations are called at most once successfully per provider.
pub trait ServiceDirectoryConnector: Send + Sync
{
    /// Open the directory and wrap it in a [`ServiceContext`]
    ///
    /// ## Errors
    ///
    /// Any failure to reach the directory.
    fn connect(&self) -> PlatformResult<ServiceContext>;
}

/// Opens the service directory from the process namespace
#[derive(Debug, Clone)]
pub struct NamespaceConnector
{
    path: PathBuf,
}

impl NamespaceConnector
{
    /// Connector for an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self
    {
        Self { path: path.into() }
    }

    /// Connector for `HOSTPAL_SVC_DIR`, falling back to `/svc`
    #[must_use]
    pub fn from_env() -> Self
    {
        let path = env::var_os(SERVICE_DIRECTORY_ENV)
            .filter(|value| !value.is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_SERVICE_DIRECTORY), PathBuf::from);
        Self { path }
    }

    /// Path this connector opens
    #[must_use]
    pub fn path(&self) -> &Path
    {
        &self.path
    }
}

impl Default for NamespaceConnector
{
    fn default() -> Self
    {
        Self::from_env()
    }
}

impl ServiceDirectoryConnector for NamespaceConnector
{
    fn connect(&self) -> PlatformResult<ServiceContext>
    {
        let wrap = |source: std::io::Error| PlatformError::ServiceDirectory {
            path: self.path.clone(),
            source,
        };

        let directory = File::open(&self.path).map_err(wrap)?;
        if !directory.metadata().map_err(wrap)?.is_dir() {
            return Err(wrap(std::io::Error::other("not a directory")));
        }

        Ok(ServiceContext::new(self.path.clone(), directory))
    }
}

/// Lazily acquires a single [`ServiceContext`]
///
/// The first successful [`get`](Self::get) opens the directory; every later
/// call returns the same handle. Concurrent first callers wait for the one
/// acquisition in progress. A failed acquisition is not remembered, so the
/// next call tries again.
#[derive(Debug)]
pub struct ServiceContextProvider<C = NamespaceConnector>
{
    connector: C,
    context: OnceCell<ServiceContext>,
}

impl<C: ServiceDirectoryConnector> ServiceContextProvider<C>
{
    /// Provider that will acquire through `connector`
    pub fn new(connector: C) -> Self
    {
        Self {
            connector,
            context: OnceCell::new(),
        }
    }

    /// The service context, acquiring it on first call
    ///
    /// ## Errors
    ///
    /// Whatever the connector reports when acquisition fails.
    pub fn get(&self) -> PlatformResult<&ServiceContext>
    {
        self.context.get_or_try_init(|| {
            let context = self.connector.connect();
            match &context {
                Ok(context) => debug!(path = %context.path().display(), "acquired service context"),
                Err(err) => warn!(error = %err, "service context acquisition failed"),
            }
            context
        })
    }

    /// The service context if it has already been acquired
    pub fn peek(&self) -> Option<&ServiceContext>
    {
        self.context.get()
    }

    /// Whether acquisition has happened
    pub fn is_initialized(&self) -> bool
    {
        self.context.get().is_some()
    }

    /// The connector
    pub fn connector(&self) -> &C
    {
        &self.connector
    }
}

impl Default for ServiceContextProvider<NamespaceConnector>
{
    fn default() -> Self
    {
        Self::new(NamespaceConnector::from_env())
    }
}

#[cfg(target_os = "fuchsia")]
static PROCESS_PROVIDER: once_cell::sync::Lazy<ServiceContextProvider> =
    once_cell::sync::Lazy::new(ServiceContextProvider::default);

/// The process-wide service context, acquired on first call
///
/// The handle lives until the process exits. Acquisition failure is fatal;
/// use [`try_service_context`] to handle it instead.
#[cfg(target_os = "fuchsia")]
#[track_caller]
pub fn service_context() -> &'static ServiceContext
{
    match PROCESS_PROVIDER.get() {
        Ok(context) => context,
        Err(err) => crate::fatal!("Failed to acquire the service context: {err}"),
    }
}

/// The process-wide service context, or the acquisition error
///
/// ## Errors
///
/// Whatever the namespace connector reports; the next call retries.
#[cfg(target_os = "fuchsia")]
pub fn try_service_context() -> PlatformResult<&'static ServiceContext>
{
    PROCESS_PROVIDER.get()
}
