//! Model-family table: how a prompt becomes a model-specific input payload.
//!
//! Each supported family is a data entry (name pattern, input schema,
//! version pinning). Lookup is a substring match on the requested model
//! name, first match wins, and anything unmatched uses [`GENERIC_FAMILY`].
//! Adding a family means adding a row to [`MODEL_FAMILIES`]; the invoker's
//! retry and normalization code never changes.

use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// InputSchema / VersionPin
// ---------------------------------------------------------------------------

/// Shape of the input object a model family expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputSchema {
    /// `{"tags": prompt, "lyrics": prompt}`.
    TagsAndLyrics,
    /// `{"prompt": prompt}` plus fixed string parameters.
    PromptWithParams(&'static [(&'static str, &'static str)]),
    /// `{"prompt": prompt}`.
    Prompt,
}

/// Which immutable model revision a request is sent to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VersionPin {
    /// Use this reference unless the caller already named a version.
    IfUnversioned(&'static str),
    /// Always use this reference.
    Always(&'static str),
    /// Send the model name unchanged.
    Never,
}

// ---------------------------------------------------------------------------
// ModelFamily
// ---------------------------------------------------------------------------

/// Static description of one model family.
#[derive(Debug)]
pub struct ModelFamily {
    /// Short identifier used in logs.
    pub id: &'static str,
    /// Substring matched against the requested model name.
    pub pattern: &'static str,
    pub schema: InputSchema,
    pub pin: VersionPin,
}

/// A request ready for [`super::GenerationService::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptedRequest {
    /// `owner/name` or `owner/name:version`.
    pub model_ref: String,
    pub input: Value,
}

impl ModelFamily {
    /// Build the payload and model reference for `prompt`.
    pub fn adapt(&self, model: &str, prompt: &str) -> AdaptedRequest {
        let mut input = Map::new();
        match self.schema {
            InputSchema::TagsAndLyrics => {
                input.insert("tags".into(), Value::from(prompt));
                input.insert("lyrics".into(), Value::from(prompt));
            }
            InputSchema::PromptWithParams(params) => {
                input.insert("prompt".into(), Value::from(prompt));
                for (key, value) in params {
                    input.insert((*key).into(), Value::from(*value));
                }
            }
            InputSchema::Prompt => {
                input.insert("prompt".into(), Value::from(prompt));
            }
        }

        let model_ref = match self.pin {
            VersionPin::IfUnversioned(pinned) if !model.contains(':') => pinned.to_string(),
            VersionPin::Always(pinned) => pinned.to_string(),
            _ => model.to_string(),
        };

        AdaptedRequest {
            model_ref,
            input: Value::Object(input),
        }
    }
}

// ---------------------------------------------------------------------------
// Family table
// ---------------------------------------------------------------------------

/// Known model families, in lookup order.
pub const MODEL_FAMILIES: &[ModelFamily] = &[
    ModelFamily {
        id: "ace-step",
        pattern: "lucataco/ace-step",
        schema: InputSchema::TagsAndLyrics,
        pin: VersionPin::IfUnversioned(
            "lucataco/ace-step:280fc4f9ee507577f880a167f639c02622421d8fecf492454320311217b688f1",
        ),
    },
    ModelFamily {
        id: "musicgen",
        pattern: "musicgen",
        schema: InputSchema::PromptWithParams(&[
            ("model_version", "stereo-large"),
            ("output_format", "mp3"),
            ("normalization_strategy", "peak"),
        ]),
        pin: VersionPin::Always(
            "meta/musicgen:671ac645ce5e552cc63a54a2bbff63fcf798043055d2dac5fc9e36a837eedcfb",
        ),
    },
];

/// Fallback for models not in [`MODEL_FAMILIES`].
pub const GENERIC_FAMILY: ModelFamily = ModelFamily {
    id: "generic",
    pattern: "",
    schema: InputSchema::Prompt,
    pin: VersionPin::Never,
};

/// The family handling `model`.
pub fn family_for(model: &str) -> &'static ModelFamily {
    MODEL_FAMILIES
        .iter()
        .find(|family| model.contains(family.pattern))
        .unwrap_or(&GENERIC_FAMILY)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
