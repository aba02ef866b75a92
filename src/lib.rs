/*!
# Spreadsheet Export

Converts JSON spreadsheet data into Excel workbooks on a background worker.

## Overview

The spreadsheet widget describes its content as a list of cells
(`{ cell: "a1", value: "Country" }`) plus optional style classes. Exporting
that content means handing it to a compute module that produces `.xlsx`
bytes. This crate provides the pieces around that module: a UTF-8 text
codec used to marshal the JSON into module memory, and a message-driven
worker that loads the module once and answers every `convert` request with
a `ready` message carrying the workbook.

## Architecture

### Text Codec
- UTF-8 encoder over UTF-16 code units (surrogate pairs combined, lone
  high surrogates dropped)
- Best-effort decoder that stops at NUL and never fails
- Host scope registration that never replaces native codecs

### Conversion Worker
- Single-task message loop driven by tokio channels
- Compute module loaded lazily through one shared in-flight load
- Per-call marshalling: malloc, write, convert, copy out, free
- Load failures are logged and the request is dropped

### Compute Module
- `json2excel`: native module writing workbooks with rust_xlsxwriter
- Resolved by location through a loader registry

## Modules

- **codec**: TextEncoder / TextDecoder
- **polyfill**: Codec registration into a host scope
- **module**: Compute module ABI, module memory and loaders
- **xlsx**: Native json2excel module
- **worker**: Messages, module state and the conversion worker
- **dataset**: Sample spreadsheet data
- **config**: Worker configuration
- **cli**: File-to-workbook command line front end
- **app**: HTTP front end (`web` feature)

## Messages

- Inbound: `{ "type": "convert", "data": ..., "uid"?: ..., "wasmPath"?: ... }`
- Outbound: `{ "uid": ..., "type": "ready", "blob": { "type": <MIME>, "bytes": [...] } }`
*/

#[cfg(feature = "web")]
pub mod app;
pub mod cli;
pub mod codec;
pub mod config;
pub mod dataset;
pub mod module;
pub mod polyfill;
pub mod worker;
pub mod xlsx;

/// Re-export the types most callers need
pub use codec::{CodecError, TextDecoder, TextEncoder};
pub use config::WorkerConfig;
pub use module::{BuiltinLoader, ComputeModule, LoadError, ModuleError, ModuleLoader};
pub use worker::{
    Blob, ConversionWorker, Converter, CorrelationId, InboundMessage, ModuleState, OutboundMessage,
    WorkerHandle, spawn,
};
