//! Resolve which process or application owns a local TCP port.
//!
//! The kernel's connection tables (`/proc/net/tcp6`, then `/proc/net/tcp`) are
//! scanned for the requested port and the owning credential is handed to an
//! [`IdentityLookup`] to turn it into an [`ApplicationDescriptor`].
//!
//! ```no_run
//! use port_owner::identity::SystemAccounts;
//! use port_owner::PortResolver;
//!
//! let resolver = PortResolver::new(SystemAccounts);
//! if let Some(owner) = resolver.resolve_owner(8080) {
//!     println!("{} {}", owner.package_identifier(), owner.version_label());
//! }
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod model;
pub mod netif;
pub mod port;
pub mod resolver;
pub mod table;

pub use identity::IdentityLookup;
pub use model::{ApplicationDescriptor, ConnectionRecord, TableVariant};
pub use resolver::{PortResolver, Resolution};
