//! Registration of the UTF-8 codec into a host scope.
//!
//! A host that already provides `TextEncoder` and `TextDecoder` keeps its
//! own implementations; the codec from [`crate::codec`] is only installed
//! when one of them is missing.

use std::collections::HashMap;

use crate::codec::{CodecError, DecoderOptions, TextDecoder, TextEncoder};

pub const ENCODER_NAME: &str = "TextEncoder";
pub const DECODER_NAME: &str = "TextDecoder";

/// Where a scope binding came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Constructor {
    /// Provided by the host before any polyfill ran
    Native,
    Encoder,
    Decoder,
}

impl Constructor {
    pub fn is_native(&self) -> bool {
        matches!(self, Constructor::Native)
    }
}

pub trait TextScope {
    fn has(&self, name: &str) -> bool;
    fn define(&mut self, name: &str, constructor: Constructor);
}

/// Install the codec into `scope`
///
/// Returns `false` without touching the scope when both codecs are already
/// present. Otherwise each missing name is bound to the polyfill and `true`
/// is returned; an existing binding is never replaced.
pub fn install<S: TextScope + ?Sized>(scope: &mut S) -> bool {
    if scope.has(ENCODER_NAME) && scope.has(DECODER_NAME) {
        return false;
    }

    if !scope.has(ENCODER_NAME) {
        scope.define(ENCODER_NAME, Constructor::Encoder);
    }
    if !scope.has(DECODER_NAME) {
        scope.define(DECODER_NAME, Constructor::Decoder);
    }
    true
}

#[derive(Clone, Debug, Default)]
pub struct GlobalScope {
    bindings: HashMap<String, Constructor>,
}

impl GlobalScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope whose host already ships both codecs.
    pub fn with_native_codecs() -> Self {
        let mut scope = Self::new();
        scope.define(ENCODER_NAME, Constructor::Native);
        scope.define(DECODER_NAME, Constructor::Native);
        scope
    }

    pub fn get(&self, name: &str) -> Option<Constructor> {
        self.bindings.get(name).copied()
    }

    pub fn text_encoder(&self, label: &str) -> Option<Result<TextEncoder, CodecError>> {
        self.get(ENCODER_NAME).map(|_| TextEncoder::new(label))
    }

    pub fn text_decoder(
        &self,
        label: &str,
        options: DecoderOptions,
    ) -> Option<Result<TextDecoder, CodecError>> {
        self.get(DECODER_NAME).map(|_| TextDecoder::new(label, options))
    }
}

impl TextScope for GlobalScope {
    fn has(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    fn define(&mut self, name: &str, constructor: Constructor) {
        self.bindings.insert(name.to_string(), constructor);
    }
}
