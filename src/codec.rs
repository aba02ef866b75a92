use thiserror::Error;

/// The only encoding label the codec understands.
pub const UTF8_LABEL: &str = "utf-8";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Failed to construct '{codec}': The encoding label provided ('{label}') is invalid.")]
    InvalidEncodingLabel { codec: &'static str, label: String },
    #[error("Failed to {operation}: the '{option}' option is unsupported.")]
    UnsupportedOption {
        operation: &'static str,
        option: &'static str,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    pub stream: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecoderOptions {
    pub fatal: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    pub stream: bool,
}

fn check_label(codec: &'static str, label: &str) -> Result<(), CodecError> {
    if label != UTF8_LABEL {
        return Err(CodecError::InvalidEncodingLabel {
            codec,
            label: label.to_string(),
        });
    }
    Ok(())
}

/// UTF-8 encoder over 16-bit code units
///
/// Strings are modelled as sequences of UTF-16 code units, the same way a
/// host string exposes them. Paired surrogates are combined into a single
/// code point before encoding; an unpaired high surrogate is dropped.
///
/// # Examples
/// ```
/// use spreadsheet_export::codec::TextEncoder;
///
/// let encoder = TextEncoder::new("utf-8").unwrap();
/// assert_eq!(encoder.encode("A€"), vec![0x41, 0xE2, 0x82, 0xAC]);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct TextEncoder;

impl TextEncoder {
    pub fn new(label: &str) -> Result<Self, CodecError> {
        check_label("TextEncoder", label)?;
        Ok(TextEncoder)
    }

    pub fn encoding(&self) -> &'static str {
        UTF8_LABEL
    }

    pub fn encode(&self, text: &str) -> Vec<u8> {
        let units: Vec<u16> = text.encode_utf16().collect();
        self.encode_utf16(&units)
    }

    pub fn encode_with(&self, units: &[u16], options: EncodeOptions) -> Result<Vec<u8>, CodecError> {
        if options.stream {
            return Err(CodecError::UnsupportedOption {
                operation: "encode",
                option: "stream",
            });
        }
        Ok(self.encode_utf16(units))
    }

    /// Encode a sequence of UTF-16 code units into UTF-8 bytes
    ///
    /// The output buffer starts at roughly 1.5x the input length and grows
    /// geometrically, weighted by how much input is left. The returned
    /// vector is truncated to the bytes actually written.
    pub fn encode_utf16(&self, units: &[u16]) -> Vec<u8> {
        let len = units.len();
        let mut pos = 0;
        let mut at = 0;
        let mut target = vec![0u8; initial_capacity(len)];

        while pos < len {
            let mut value = units[pos] as u32;
            pos += 1;

            if (0xD800..=0xDBFF).contains(&value) {
                if pos < len {
                    let extra = units[pos] as u32;
                    if extra & 0xFC00 == 0xDC00 {
                        pos += 1;
                        value = ((value & 0x3FF) << 10) + (extra & 0x3FF) + 0x10000;
                    }
                }
                if (0xD800..=0xDBFF).contains(&value) {
                    // lone high surrogate
                    continue;
                }
            }

            if at + 4 > target.len() {
                let grown = grow_capacity(target.len(), pos, len);
                target.resize(grown, 0);
            }

            at += write_code_point(&mut target[at..], value);
        }

        target.truncate(at);
        target
    }
}

fn initial_capacity(len: usize) -> usize {
    let tlen = usize::max(32, len + (len >> 1) + 7);
    (tlen >> 3) << 3
}

fn grow_capacity(current: usize, pos: usize, len: usize) -> usize {
    let remaining_weight = 1.0 + (pos as f64 / len as f64) * 2.0;
    let tlen = ((current + 8) as f64 * remaining_weight) as usize;
    (tlen >> 3) << 3
}

// Writes one code point and returns the number of bytes used. `out` must
// have room for four bytes.
fn write_code_point(out: &mut [u8], value: u32) -> usize {
    if value & 0xFFFF_FF80 == 0 {
        out[0] = value as u8;
        1
    } else if value & 0xFFFF_F800 == 0 {
        out[0] = (((value >> 6) & 0x1F) | 0xC0) as u8;
        out[1] = ((value & 0x3F) | 0x80) as u8;
        2
    } else if value & 0xFFFF_0000 == 0 {
        out[0] = (((value >> 12) & 0x0F) | 0xE0) as u8;
        out[1] = (((value >> 6) & 0x3F) | 0x80) as u8;
        out[2] = ((value & 0x3F) | 0x80) as u8;
        3
    } else if value & 0xFFE0_0000 == 0 {
        out[0] = (((value >> 18) & 0x07) | 0xF0) as u8;
        out[1] = (((value >> 12) & 0x3F) | 0x80) as u8;
        out[2] = (((value >> 6) & 0x3F) | 0x80) as u8;
        out[3] = ((value & 0x3F) | 0x80) as u8;
        4
    } else {
        0
    }
}

/// Best-effort UTF-8 decoder producing UTF-16 code units
///
/// Decoding never fails: malformed continuation bytes are masked rather than
/// validated, and a NUL byte ends the output.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextDecoder;

impl TextDecoder {
    pub fn new(label: &str, options: DecoderOptions) -> Result<Self, CodecError> {
        check_label("TextDecoder", label)?;
        if options.fatal {
            return Err(CodecError::UnsupportedOption {
                operation: "construct 'TextDecoder'",
                option: "fatal",
            });
        }
        Ok(TextDecoder)
    }

    pub fn encoding(&self) -> &'static str {
        UTF8_LABEL
    }

    pub fn fatal(&self) -> bool {
        false
    }

    pub fn ignore_bom(&self) -> bool {
        false
    }

    pub fn decode_with(&self, bytes: &[u8], options: DecodeOptions) -> Result<Vec<u16>, CodecError> {
        if options.stream {
            return Err(CodecError::UnsupportedOption {
                operation: "decode",
                option: "stream",
            });
        }
        Ok(self.decode(bytes))
    }

    pub fn decode(&self, bytes: &[u8]) -> Vec<u16> {
        let len = bytes.len();
        let mut pos = 0;
        let mut out = Vec::with_capacity(len);

        // Missing trailing bytes read as zero.
        let next = |pos: &mut usize| -> u32 {
            let byte = bytes.get(*pos).copied().unwrap_or(0);
            *pos += 1;
            (byte & 0x3F) as u32
        };

        while pos < len {
            let byte1 = bytes[pos] as u32;
            pos += 1;
            if byte1 == 0 {
                break;
            }

            if byte1 & 0x80 == 0 {
                out.push(byte1 as u16);
            } else if byte1 & 0xE0 == 0xC0 {
                let byte2 = next(&mut pos);
                out.push((((byte1 & 0x1F) << 6) | byte2) as u16);
            } else if byte1 & 0xF0 == 0xE0 {
                let byte2 = next(&mut pos);
                let byte3 = next(&mut pos);
                out.push((((byte1 & 0x1F) << 12) | (byte2 << 6) | byte3) as u16);
            } else if byte1 & 0xF8 == 0xF0 {
                let byte2 = next(&mut pos);
                let byte3 = next(&mut pos);
                let byte4 = next(&mut pos);

                let mut code_point = ((byte1 & 0x07) << 18) | (byte2 << 12) | (byte3 << 6) | byte4;
                if code_point > 0xFFFF {
                    code_point -= 0x10000;
                    out.push((((code_point >> 10) & 0x3FF) | 0xD800) as u16);
                    code_point = 0xDC00 | (code_point & 0x3FF);
                }
                out.push(code_point as u16);
            }
        }

        out
    }

    /// Decode into a Rust `String`. Unpaired surrogates in the decoded
    /// units become U+FFFD.
    pub fn decode_to_string(&self, bytes: &[u8]) -> String {
        String::from_utf16_lossy(&self.decode(bytes))
    }
}
