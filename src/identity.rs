//! Owner credential to application identity lookup.
//!
//! The resolver only needs the `IdentityLookup` capability. This module ships
//! a static map (filled from the settings file or in code), a lookup backed
//! by the system account database, and a chain combining several of them.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, IdentityError};
use crate::model::ApplicationDescriptor;

/// Resolves an owner credential to the application that holds it.
pub trait IdentityLookup {
    /// `Ok(None)` means the credential is unknown to this service.
    fn resolve(&self, credential: u32) -> Result<Option<ApplicationDescriptor>, IdentityError>;
}

impl<T: IdentityLookup + ?Sized> IdentityLookup for &T {
    fn resolve(&self, credential: u32) -> Result<Option<ApplicationDescriptor>, IdentityError> {
        (**self).resolve(credential)
    }
}

impl<T: IdentityLookup + ?Sized> IdentityLookup for Box<T> {
    fn resolve(&self, credential: u32) -> Result<Option<ApplicationDescriptor>, IdentityError> {
        (**self).resolve(credential)
    }
}

/// An application registered for one credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityEntry {
    pub package: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_url: Option<String>,
}

impl IdentityEntry {
    pub fn new(package: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            version: version.into(),
            origin_url: None,
        }
    }

    fn to_descriptor(&self) -> Result<ApplicationDescriptor, IdentityError> {
        let mut descriptor = ApplicationDescriptor::new(&self.package, &self.version);
        if let Some(url) = &self.origin_url {
            descriptor
                .set_origin_url(url.clone())
                .map_err(|e| IdentityError::Lookup(e.to_string()))?;
        }
        Ok(descriptor)
    }
}

/// In-memory credential map.
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    entries: HashMap<u32, IdentityEntry>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from the `[identities]` table of the settings file,
    /// whose keys are credentials written as strings.
    pub fn from_table(table: &BTreeMap<String, IdentityEntry>) -> Result<Self, ConfigError> {
        let mut map = Self::new();
        for (key, entry) in table {
            let credential = key
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidCredential(key.clone()))?;
            map.insert(credential, entry.clone());
        }
        Ok(map)
    }

    pub fn insert(&mut self, credential: u32, entry: IdentityEntry) {
        self.entries.insert(credential, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IdentityLookup for IdentityMap {
    fn resolve(&self, credential: u32) -> Result<Option<ApplicationDescriptor>, IdentityError> {
        self.entries
            .get(&credential)
            .map(IdentityEntry::to_descriptor)
            .transpose()
    }
}

/// Treats the credential as a uid and reports the account that owns it.
///
/// The descriptor's package identifier is the login name and its version
/// label is `uid <n>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAccounts;

impl IdentityLookup for SystemAccounts {
    fn resolve(&self, credential: u32) -> Result<Option<ApplicationDescriptor>, IdentityError> {
        Ok(account_name(credential)?
            .map(|name| ApplicationDescriptor::new(name, format!("uid {credential}"))))
    }
}

#[cfg(unix)]
fn account_name(uid: u32) -> Result<Option<String>, IdentityError> {
    use std::ffi::CStr;
    use std::{io, mem, ptr};

    const MAX_BUFFER: usize = 1 << 20;

    let mut buffer_len = match unsafe { libc::sysconf(libc::_SC_GETPW_R_SIZE_MAX) } {
        n if n > 0 => n as usize,
        _ => 1024,
    };

    loop {
        let mut buffer: Vec<libc::c_char> = vec![0; buffer_len];
        let mut passwd: libc::passwd = unsafe { mem::zeroed() };
        let mut result: *mut libc::passwd = ptr::null_mut();

        let rc = unsafe {
            libc::getpwuid_r(
                uid as libc::uid_t,
                &mut passwd,
                buffer.as_mut_ptr(),
                buffer.len(),
                &mut result,
            )
        };

        match rc {
            0 if result.is_null() => return Ok(None),
            0 => {
                let name = unsafe { CStr::from_ptr(passwd.pw_name) };
                return Ok(Some(name.to_string_lossy().into_owned()));
            }
            libc::ERANGE if buffer_len < MAX_BUFFER => buffer_len *= 2,
            // Several libcs report "no such user" through these.
            libc::ENOENT | libc::ESRCH | libc::EBADF | libc::EPERM => return Ok(None),
            errno => {
                return Err(IdentityError::Lookup(format!(
                    "getpwuid_r({uid}) failed: {}",
                    io::Error::from_raw_os_error(errno)
                )))
            }
        }
    }
}

#[cfg(not(unix))]
fn account_name(_uid: u32) -> Result<Option<String>, IdentityError> {
    Err(IdentityError::Lookup(
        "system accounts are not supported on this platform".to_string(),
    ))
}

/// Tries each lookup in order; the first known credential wins.
#[derive(Default)]
pub struct LookupChain {
    links: Vec<Box<dyn IdentityLookup>>,
}

impl LookupChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, lookup: impl IdentityLookup + 'static) {
        self.links.push(Box::new(lookup));
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl IdentityLookup for LookupChain {
    /// A failing link does not stop the chain; its error is reported only
    /// when no later link knows the credential.
    fn resolve(&self, credential: u32) -> Result<Option<ApplicationDescriptor>, IdentityError> {
        let mut failure = None;
        for link in &self.links {
            match link.resolve(credential) {
                Ok(Some(descriptor)) => return Ok(Some(descriptor)),
                Ok(None) => {}
                Err(e) => failure = failure.or(Some(e)),
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}
