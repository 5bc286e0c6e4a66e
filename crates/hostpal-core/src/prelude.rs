//! Common module for library exports

pub use crate::error::{PlatformError, PlatformResult};
pub use crate::fatal::{set_fatal_handler, FatalReport};
pub use crate::format::{format_to_vec, vsnprint, FormatArg};
pub use crate::service_context::{NamespaceConnector, ServiceContext, ServiceContextProvider, ServiceDirectoryConnector};
pub use crate::strings::{strndup, strnlen};
pub use crate::{fatal, snprint};
