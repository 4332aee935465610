use std::{
    collections::{BTreeMap, HashMap},
    fs,
    io::ErrorKind,
    path::PathBuf,
    sync::{Mutex, PoisonError, RwLock},
};

use alloy_primitives::Address;
use eyre::WrapErr;
use tracing::debug;

/// Per-identity list of loan contracts, in registration order.
pub trait AddressRegistry {
    fn addresses(&self, identity: Address) -> eyre::Result<Vec<Address>>;

    /// Returns `false` when the contract was already registered for `identity`.
    fn append(&self, identity: Address, contract: Address) -> eyre::Result<bool>;
}

impl<T: AddressRegistry + ?Sized> AddressRegistry for &T {
    fn addresses(&self, identity: Address) -> eyre::Result<Vec<Address>> {
        (**self).addresses(identity)
    }

    fn append(&self, identity: Address, contract: Address) -> eyre::Result<bool> {
        (**self).append(identity, contract)
    }
}

#[derive(Debug, Default)]
pub struct MemoryRegistry {
    loans: RwLock<HashMap<Address, Vec<Address>>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AddressRegistry for MemoryRegistry {
    fn addresses(&self, identity: Address) -> eyre::Result<Vec<Address>> {
        let loans = self.loans.read().unwrap_or_else(PoisonError::into_inner);
        Ok(loans.get(&identity).cloned().unwrap_or_default())
    }

    fn append(&self, identity: Address, contract: Address) -> eyre::Result<bool> {
        let mut loans = self.loans.write().unwrap_or_else(PoisonError::into_inner);
        let list = loans.entry(identity).or_default();
        if list.contains(&contract) {
            return Ok(false);
        }
        list.push(contract);
        Ok(true)
    }
}

/// Registry persisted as a JSON object of lowercase identity to contract list.
#[derive(Debug)]
pub struct JsonFileRegistry {
    path: PathBuf,
    write_lock: Mutex<()>,
}

type RegistryFile = BTreeMap<String, Vec<Address>>;

impl JsonFileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn _staging_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn _load(&self) -> eyre::Result<RegistryFile> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(RegistryFile::new()),
            Ok(text) => serde_json::from_str(&text)
                .wrap_err_with(|| format!("malformed registry {}", self.path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(RegistryFile::new()),
            Err(e) => Err(e).wrap_err_with(|| format!("reading {}", self.path.display())),
        }
    }
}

fn _key(identity: Address) -> String {
    identity.to_string().to_lowercase()
}

impl AddressRegistry for JsonFileRegistry {
    fn addresses(&self, identity: Address) -> eyre::Result<Vec<Address>> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self._load()?.remove(&_key(identity)).unwrap_or_default())
    }

    fn append(&self, identity: Address, contract: Address) -> eyre::Result<bool> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self._load()?;
        let list = file.entry(_key(identity)).or_default();
        if list.contains(&contract) {
            return Ok(false);
        }
        list.push(contract);

        let text = serde_json::to_string_pretty(&file)?;
        // the registry is only ever replaced whole, never truncated in place
        let staging = self._staging_path();
        fs::write(&staging, text)
            .wrap_err_with(|| format!("writing {}", staging.display()))?;
        fs::rename(&staging, &self.path)
            .wrap_err_with(|| format!("replacing {}", self.path.display()))?;
        debug!(%identity, %contract, "registered loan contract");
        Ok(true)
    }
}
