//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`] for the boiler controller.
//!
//! The configuration is stored as a single blob: one layout-version byte
//! followed by the `postcard` encoding of [`BurnConfig`].
//!
//! - Save validates before writing, so storage never holds a config the
//!   core would refuse.
//! - Load repairs out-of-range fields (see [`BurnConfig::repaired`]), so
//!   the core only ever observes validated configuration.
//! - A blob with an unknown layout version is reported as corrupted and
//!   the caller falls back to defaults.
//!
//! On ESP-IDF the blob lives in the default NVS partition; on the host an
//! in-memory cell stands in for flash.

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::BurnConfig;

#[cfg(feature = "espidf")]
use esp_idf_svc::sys::*;

/// Bump whenever the serialized shape of [`BurnConfig`] changes.
pub const LAYOUT_VERSION: u8 = 2;

const CONFIG_NAMESPACE: &[u8] = b"boilerctl\0";
const CONFIG_KEY: &[u8] = b"burncfg\0";
/// Upper bound on the stored blob, version byte included.
pub const MAX_BLOB_SIZE: usize = 128;

pub struct NvsAdapter {
    #[cfg(not(feature = "espidf"))]
    store: std::cell::RefCell<Option<Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// Returns `Err(ConfigError::IoError)` if flash initialisation fails
    /// unrecoverably. On first boot or after a version mismatch the NVS
    /// partition is erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(feature = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(feature = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(feature = "espidf"))]
            store: std::cell::RefCell::new(None),
        })
    }

    /// Host backend pre-loaded with a raw blob (version byte included).
    #[cfg(not(feature = "espidf"))]
    pub fn with_blob(blob: Vec<u8>) -> Self {
        Self {
            store: std::cell::RefCell::new(Some(blob)),
        }
    }

    /// Raw blob currently held by the host backend.
    #[cfg(not(feature = "espidf"))]
    pub fn blob(&self) -> Option<Vec<u8>> {
        self.store.borrow().clone()
    }

    /// Open the config namespace, execute a closure with the handle, then close.
    #[cfg(feature = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(CONFIG_NAMESPACE.as_ptr().cast(), mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(not(feature = "espidf"))]
    fn read_blob(&self, buf: &mut [u8; MAX_BLOB_SIZE]) -> Result<Option<usize>, ConfigError> {
        let store = self.store.borrow();
        let Some(bytes) = store.as_ref() else {
            return Ok(None);
        };
        if bytes.len() > MAX_BLOB_SIZE {
            return Err(ConfigError::Corrupted);
        }
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Some(bytes.len()))
    }

    #[cfg(feature = "espidf")]
    fn read_blob(&self, buf: &mut [u8; MAX_BLOB_SIZE]) -> Result<Option<usize>, ConfigError> {
        let result = Self::with_nvs_handle(false, |handle| {
            let mut size = buf.len();
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    CONFIG_KEY.as_ptr().cast(),
                    buf.as_mut_ptr().cast(),
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(size)
        });
        match result {
            Ok(size) => Ok(Some(size)),
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(None),
            Err(e) if e == ESP_ERR_NVS_INVALID_LENGTH => Err(ConfigError::Corrupted),
            Err(e) => {
                warn!("NvsAdapter: NVS read error {}", e);
                Err(ConfigError::IoError)
            }
        }
    }

    #[cfg(not(feature = "espidf"))]
    fn write_blob(&self, blob: &[u8]) -> Result<(), ConfigError> {
        *self.store.borrow_mut() = Some(blob.to_vec());
        Ok(())
    }

    #[cfg(feature = "espidf")]
    fn write_blob(&self, blob: &[u8]) -> Result<(), ConfigError> {
        let result = Self::with_nvs_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    CONFIG_KEY.as_ptr().cast(),
                    blob.as_ptr().cast(),
                    blob.len(),
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        });
        match result {
            Ok(()) => Ok(()),
            Err(e) if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE => Err(ConfigError::StorageFull),
            Err(e) => {
                warn!("NvsAdapter: NVS write error {}", e);
                Err(ConfigError::IoError)
            }
        }
    }
}

/// Serialize `config` behind the layout-version byte.  Returns the blob length.
pub fn encode(config: &BurnConfig, buf: &mut [u8; MAX_BLOB_SIZE]) -> Result<usize, ConfigError> {
    buf[0] = LAYOUT_VERSION;
    let body = postcard::to_slice(config, &mut buf[1..]).map_err(|_| ConfigError::StorageFull)?;
    Ok(body.len() + 1)
}

/// Parse a stored blob.  No repair is applied here.
pub fn decode(blob: &[u8]) -> Result<BurnConfig, ConfigError> {
    match blob.split_first() {
        Some((&LAYOUT_VERSION, body)) => {
            postcard::from_bytes(body).map_err(|_| ConfigError::Corrupted)
        }
        Some((version, _)) => {
            warn!("NvsAdapter: unknown config layout v{version}");
            Err(ConfigError::Corrupted)
        }
        None => Err(ConfigError::Corrupted),
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<BurnConfig, ConfigError> {
        let mut buf = [0u8; MAX_BLOB_SIZE];
        let Some(len) = self.read_blob(&mut buf)? else {
            info!("NvsAdapter: no stored config, using defaults");
            return Ok(BurnConfig::default());
        };

        let stored = decode(&buf[..len])?;
        let config = stored.clone().repaired();
        if config != stored {
            warn!("NvsAdapter: stored config had out-of-range fields, repaired");
        }
        info!("NvsAdapter: loaded config ({} bytes)", len);
        Ok(config)
    }

    fn save(&self, config: &BurnConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let mut buf = [0u8; MAX_BLOB_SIZE];
        let len = encode(config, &mut buf)?;
        self.write_blob(&buf[..len])?;
        info!("NvsAdapter: config saved ({} bytes)", len);
        Ok(())
    }
}

impl Default for NvsAdapter {
    fn default() -> Self {
        // Last-resort fallback when flash init fails: no persistence.
        Self::new().unwrap_or(Self {
            #[cfg(not(feature = "espidf"))]
            store: std::cell::RefCell::new(None),
        })
    }
}
