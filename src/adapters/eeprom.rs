//! EEPROM-style block store adapter.
//!
//! Implements [`RecordStore`] over a byte image sized for the two control
//! records.  The image starts erased (`0xFF`), like fresh flash.
//!
//! On ESP-IDF the image is mirrored to a single NVS blob and every `store`
//! commits it, so a power loss leaves either the old or the new image.
//! On host/test the image lives in RAM only.

use crate::app::ports::{RecordStore, StorageError};
use crate::persistence::STORAGE_SIZE;
use log::info;

#[cfg(feature = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(feature = "espidf")]
use log::warn;

/// Value of an erased cell.
pub const ERASED: u8 = 0xFF;

#[cfg(feature = "espidf")]
const NVS_NAMESPACE: &[u8] = b"bvm\0";
#[cfg(feature = "espidf")]
const NVS_KEY: &[u8] = b"records\0";

pub struct BlockStore {
    image: [u8; STORAGE_SIZE],
}

impl BlockStore {
    /// An erased in-memory store.
    pub fn new() -> Self {
        Self {
            image: [ERASED; STORAGE_SIZE],
        }
    }

    /// Open the NVS-backed store, reading back the last committed image.
    ///
    /// A missing blob (first boot) leaves the image erased.
    #[cfg(feature = "espidf")]
    pub fn open() -> Result<Self, StorageError> {
        // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
        // single main-task context before any other NVS access.
        let ret = unsafe { nvs_flash_init() };
        if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
            warn!("BlockStore: erasing and re-initialising NVS partition");
            if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                return Err(StorageError::IoError);
            }
        } else if ret != ESP_OK {
            return Err(StorageError::IoError);
        }

        let mut store = Self::new();
        let result = Self::with_nvs_handle(false, |handle| {
            let mut size = store.image.len();
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    NVS_KEY.as_ptr() as *const _,
                    store.image.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(size)
        });
        match result {
            Ok(size) => info!("BlockStore: loaded {} byte image from NVS", size),
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => info!("BlockStore: no image in NVS, starting erased"),
            Err(e) => {
                warn!("BlockStore: NVS read error {}, starting erased", e);
                store.image = [ERASED; STORAGE_SIZE];
            }
        }
        Ok(store)
    }

    /// Raw view of the whole image.
    pub fn as_bytes(&self) -> &[u8] {
        &self.image
    }

    /// Return every cell to the erased state.
    pub fn erase(&mut self) {
        self.image = [ERASED; STORAGE_SIZE];
        info!("BlockStore: erased");
    }

    fn range(offset: usize, len: usize) -> Result<core::ops::Range<usize>, StorageError> {
        let end = offset.checked_add(len).ok_or(StorageError::OutOfBounds)?;
        if end > STORAGE_SIZE {
            return Err(StorageError::OutOfBounds);
        }
        Ok(offset..end)
    }

    /// Open the namespace, run `f` with the handle, then close.
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

        let ret = unsafe { nvs_open(NVS_NAMESPACE.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(feature = "espidf")]
    fn commit(&self) -> Result<(), StorageError> {
        let image = &self.image;
        Self::with_nvs_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    NVS_KEY.as_ptr() as *const _,
                    image.as_ptr() as *const _,
                    image.len(),
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
        })
        .map_err(|e| {
            warn!("BlockStore: NVS write error {}", e);
            StorageError::IoError
        })
    }
}

impl Default for BlockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for BlockStore {
    fn load(&self, offset: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        let range = Self::range(offset, buf.len())?;
        buf.copy_from_slice(&self.image[range]);
        Ok(())
    }

    fn store(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError> {
        let range = Self::range(offset, data.len())?;

        #[cfg(feature = "espidf")]
        {
            let previous = self.image;
            self.image[range].copy_from_slice(data);
            if let Err(e) = self.commit() {
                self.image = previous;
                return Err(e);
            }
        }

        #[cfg(not(feature = "espidf"))]
        self.image[range].copy_from_slice(data);

        Ok(())
    }
}
