/*!
 * Subtitle translation with a chat language model.
 *
 * - `core`: the translator, its pass workflow and token accounting
 * - `formatting`: numbered and XML line formats sent to and read from the model
 * - `prompts`: system and user prompt templates
 */

pub use self::core::{TranslationPasses, TranslationStats, Translator, DEFAULT_CHUNK_SIZE, MAX_TRANSLATION_RETRIES};
pub use self::prompts::{RetryReason, Stage};

pub mod core;
pub mod formatting;
pub mod prompts;
