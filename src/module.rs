use std::collections::{BTreeMap, HashMap};

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

use crate::codec::TextEncoder;

/// Location the worker loads its compute module from when a request does
/// not name one.
pub const DEFAULT_MODULE_PATH: &str = "https://cdn.dhtmlx.com/libs/json2excel/1.0/lib.wasm";

/// Short alias for the built-in json2excel module.
pub const BUILTIN_MODULE_ALIAS: &str = "builtin:json2excel";

// Pointer 0 is never handed out.
const HEAP_BASE: usize = 8;

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("no allocation of {len} bytes at {ptr}")]
    InvalidPointer { ptr: usize, len: usize },
    #[error("access of {len} bytes at {ptr} is outside module memory")]
    OutOfBounds { ptr: usize, len: usize },
    #[error("conversion failed: {0}")]
    Conversion(String),
    #[error("workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no compute module at '{path}'")]
    NotFound { path: String },
    #[error("failed to load compute module from '{path}': {reason}")]
    Failed { path: String, reason: String },
}

/// Linear memory owned by a compute module
///
/// Allocations are tracked so that a module can reject frees of pointers it
/// never handed out, and so callers can check nothing leaked after a call.
#[derive(Debug, Default)]
pub struct ModuleMemory {
    bytes: Vec<u8>,
    allocations: BTreeMap<usize, usize>,
}

impl ModuleMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// First-fit allocation. Zero-length allocations still reserve one byte
    /// so every live pointer is distinct.
    pub fn malloc(&mut self, len: usize) -> usize {
        let needed = len.max(1);
        let mut ptr = HEAP_BASE;
        for (&start, &size) in &self.allocations {
            if start - ptr >= needed {
                break;
            }
            ptr = start + size.max(1);
        }

        let end = ptr + needed;
        if end > self.bytes.len() {
            self.bytes.resize(end, 0);
        }
        self.allocations.insert(ptr, len);
        ptr
    }

    pub fn free(&mut self, ptr: usize, len: usize) -> Result<(), ModuleError> {
        match self.allocations.get(&ptr) {
            Some(&size) if size == len => {
                self.allocations.remove(&ptr);
                Ok(())
            }
            _ => Err(ModuleError::InvalidPointer { ptr, len }),
        }
    }

    pub fn write(&mut self, ptr: usize, data: &[u8]) -> Result<(), ModuleError> {
        let range = self.range(ptr, data.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }

    pub fn read(&self, ptr: usize, len: usize) -> Result<&[u8], ModuleError> {
        let range = self.range(ptr, len)?;
        Ok(&self.bytes[range])
    }

    /// Bytes held by live allocations.
    pub fn allocated(&self) -> usize {
        self.allocations.values().sum()
    }

    fn range(&self, ptr: usize, len: usize) -> Result<std::ops::Range<usize>, ModuleError> {
        match ptr.checked_add(len) {
            Some(end) if ptr >= HEAP_BASE && end <= self.bytes.len() => Ok(ptr..end),
            _ => Err(ModuleError::OutOfBounds { ptr, len }),
        }
    }
}

/// The exports a compute module offers the worker.
///
/// `import_to_xlsx` takes ownership of the argument buffer. The returned
/// buffer belongs to the caller, who must copy it out and hand it back
/// through `free`.
pub trait ComputeModule: Send {
    fn name(&self) -> &str;

    fn malloc(&mut self, len: usize) -> usize;

    fn write(&mut self, ptr: usize, bytes: &[u8]) -> Result<(), ModuleError>;

    fn read(&self, ptr: usize, len: usize) -> Result<&[u8], ModuleError>;

    fn import_to_xlsx(&mut self, arg_ptr: usize, arg_len: usize) -> Result<(usize, usize), ModuleError>;

    fn free(&mut self, ptr: usize, len: usize) -> Result<(), ModuleError>;

    fn allocated(&self) -> usize;
}

/// Run one conversion through the module
///
/// The payload is serialized to JSON, encoded as UTF-8 and copied into
/// module memory. The result is copied out and freed before returning, so a
/// call leaves no module allocations behind, whether it succeeds or not.
///
/// # Arguments
/// * `module` - The loaded compute module
/// * `encoder` - Codec used to marshal the JSON text
/// * `payload` - Spreadsheet data to convert
///
/// # Returns
/// * `Result<Vec<u8>, ModuleError>` - Workbook bytes or the module's error
pub fn call_import_to_xlsx(
    module: &mut dyn ComputeModule,
    encoder: &TextEncoder,
    payload: &Value,
) -> Result<Vec<u8>, ModuleError> {
    let json = serde_json::to_string(payload)?;
    let arg = encoder.encode(&json);

    let arg_ptr = module.malloc(arg.len());
    if let Err(e) = module.write(arg_ptr, &arg) {
        let _ = module.free(arg_ptr, arg.len());
        return Err(e);
    }

    // The module owns the argument buffer from here on.
    let (ptr, len) = module.import_to_xlsx(arg_ptr, arg.len())?;
    let result = match module.read(ptr, len) {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            let _ = module.free(ptr, len);
            return Err(e);
        }
    };
    module.free(ptr, len)?;

    log::debug!(
        "{} converted {} payload bytes into {} bytes",
        module.name(),
        arg.len(),
        result.len()
    );
    Ok(result)
}

pub trait ModuleLoader: Send + Sync {
    fn load(&self, path: &str) -> BoxFuture<'static, Result<Box<dyn ComputeModule>, LoadError>>;
}

pub type ModuleFactory = fn() -> Box<dyn ComputeModule>;

/// Resolves module locations against a table of native modules.
pub struct BuiltinLoader {
    registry: HashMap<String, ModuleFactory>,
}

impl BuiltinLoader {
    pub fn new() -> Self {
        let mut loader = BuiltinLoader {
            registry: HashMap::new(),
        };
        loader.register(DEFAULT_MODULE_PATH, crate::xlsx::Json2Excel::boxed);
        loader.register(BUILTIN_MODULE_ALIAS, crate::xlsx::Json2Excel::boxed);
        loader
    }

    pub fn register(&mut self, path: &str, factory: ModuleFactory) {
        self.registry.insert(path.to_string(), factory);
    }
}

impl Default for BuiltinLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleLoader for BuiltinLoader {
    fn load(&self, path: &str) -> BoxFuture<'static, Result<Box<dyn ComputeModule>, LoadError>> {
        let factory = self.registry.get(path).copied();
        let path = path.to_string();

        async move {
            match factory {
                Some(factory) => {
                    let module = factory();
                    log::info!("instantiated compute module {} for {}", module.name(), path);
                    Ok(module)
                }
                None => Err(LoadError::NotFound { path }),
            }
        }
        .boxed()
    }
}
