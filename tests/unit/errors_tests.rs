/*!
 * Tests for error types and conversions
 */

use sonioxsrt::errors::{ProviderError, SubtitleError, TranslationError};

#[test]
fn test_subtitleError_display_shouldDescribeProblem() {
    assert_eq!(SubtitleError::NoTokens.to_string(), "No tokens found in transcript");
    assert_eq!(
        SubtitleError::InvalidTranscript("bad".into()).to_string(),
        "Invalid transcript: bad"
    );
}

#[test]
fn test_providerError_apiError_shouldIncludeStatusAndMessage() {
    let error = ProviderError::ApiError {
        status_code: 404,
        message: "not found".into(),
    };

    assert_eq!(error.to_string(), "API responded with error: 404 - not found");
}

#[test]
fn test_translationError_fromProviderError_shouldWrap() {
    let error: TranslationError = ProviderError::AuthenticationError("no key".into()).into();

    assert!(matches!(error, TranslationError::Provider(ProviderError::AuthenticationError(_))));
    assert_eq!(error.to_string(), "Provider error: Authentication error: no key");
}

#[test]
fn test_translationError_responseMismatch_shouldDescribeIndices() {
    let error = TranslationError::ResponseMismatch("missing indices [3]".into());

    assert_eq!(error.to_string(), "Translation response mismatch: missing indices [3]");
}

#[test]
fn test_subtitleError_intoAnyhow_shouldKeepMessage() {
    let error: anyhow::Error = SubtitleError::NoTokens.into();

    assert_eq!(error.to_string(), "No tokens found in transcript");
}
