/*!
 * Tests for the transcription workflow against a mock provider
 */

use std::path::PathBuf;
use std::time::Duration;

use sonioxsrt::errors::ProviderError;
use sonioxsrt::transcriber::{AudioInput, TranscriptionRequest, Transcriber};

use crate::common;
use crate::common::mock_providers::{FailAt, MockTranscriptionProvider};

fn file_request() -> TranscriptionRequest {
    TranscriptionRequest::new(Some(PathBuf::from("talk.wav")), None, "stt-async-preview").unwrap()
}

#[test]
fn test_requestNew_withNeitherSource_shouldBeInvalid() {
    let result = TranscriptionRequest::new(None, None, "m");

    assert!(matches!(result, Err(ProviderError::InvalidRequest(_))));
}

#[test]
fn test_requestNew_withBothSources_shouldBeInvalid() {
    let result = TranscriptionRequest::new(Some(PathBuf::from("a.wav")), Some("https://x/a.wav".into()), "m");

    assert!(matches!(result, Err(ProviderError::InvalidRequest(_))));
}

#[test]
fn test_requestNew_withUrl_shouldUseUrlInput() {
    let request = TranscriptionRequest::new(None, Some("https://x/a.wav".into()), "m").unwrap();

    assert_eq!(request.audio, AudioInput::Url("https://x/a.wav".into()));
}

#[tokio::test]
async fn test_transcribe_withLocalFile_shouldUploadPollFetchAndCleanUp() {
    common::init_test_logger();
    let provider = MockTranscriptionProvider::new(common::hello_world_transcript(), 2);
    let tracker = provider.tracker();
    let transcriber = Transcriber::new(provider, Duration::from_millis(1), false);

    let transcript = transcriber.transcribe(&file_request()).await.unwrap();

    assert_eq!(transcript, common::hello_world_transcript());
    let tracker = tracker.lock().unwrap();
    assert_eq!(
        tracker.calls,
        vec![
            "upload:talk.wav",
            "create:stt-async-preview",
            "status:tx-1",
            "status:tx-1",
            "status:tx-1",
            "fetch:tx-1",
            "delete_transcription:tx-1",
            "delete_file:file-1",
        ]
    );
    assert_eq!(tracker.sources, vec!["file_id=file-1"]);
}

#[tokio::test]
async fn test_transcribe_withAudioUrl_shouldSkipUploadAndFileCleanup() {
    let provider = MockTranscriptionProvider::new(common::hello_world_transcript(), 0);
    let tracker = provider.tracker();
    let transcriber = Transcriber::new(provider, Duration::from_millis(1), false);
    let request = TranscriptionRequest::new(None, Some("https://x/a.mp3".into()), "m").unwrap();

    transcriber.transcribe(&request).await.unwrap();

    let tracker = tracker.lock().unwrap();
    assert_eq!(tracker.count("upload"), 0);
    assert_eq!(tracker.count("delete_file"), 0);
    assert_eq!(tracker.count("delete_transcription"), 1);
    assert_eq!(tracker.sources, vec!["audio_url=https://x/a.mp3"]);
}

#[tokio::test]
async fn test_transcribe_withJobError_shouldFailAndStillCleanUp() {
    let provider = MockTranscriptionProvider::new(common::hello_world_transcript(), 1).with_job_error("bad audio");
    let tracker = provider.tracker();
    let transcriber = Transcriber::new(provider, Duration::from_millis(1), false);

    let result = transcriber.transcribe(&file_request()).await;

    assert!(matches!(result, Err(ProviderError::TranscriptionFailed(ref m)) if m == "bad audio"));
    let tracker = tracker.lock().unwrap();
    assert_eq!(tracker.count("fetch"), 0);
    assert_eq!(tracker.count("delete_transcription"), 1);
    assert_eq!(tracker.count("delete_file"), 1);
}

#[tokio::test]
async fn test_transcribe_withCreateFailure_shouldDeleteUploadedFileOnly() {
    let provider = MockTranscriptionProvider::new(common::hello_world_transcript(), 0).failing_at(FailAt::Create);
    let tracker = provider.tracker();
    let transcriber = Transcriber::new(provider, Duration::from_millis(1), false);

    let result = transcriber.transcribe(&file_request()).await;

    assert!(matches!(result, Err(ProviderError::ApiError { status_code: 500, .. })));
    let tracker = tracker.lock().unwrap();
    assert_eq!(tracker.count("delete_transcription"), 0);
    assert_eq!(tracker.count("delete_file"), 1);
}

#[tokio::test]
async fn test_transcribe_withCleanupFailure_shouldStillReturnTranscript() {
    let provider = MockTranscriptionProvider::new(common::hello_world_transcript(), 0).failing_at(FailAt::Delete);
    let transcriber = Transcriber::new(provider, Duration::from_millis(1), false);

    let result = transcriber.transcribe(&file_request()).await;

    assert!(result.is_ok());
}

#[test]
fn test_transcribe_withKeepRemote_shouldNotDeleteAnything() {
    let provider = MockTranscriptionProvider::new(common::hello_world_transcript(), 0);
    let tracker = provider.tracker();
    let transcriber = Transcriber::new(provider, Duration::from_millis(1), true);

    let result = tokio_test::block_on(transcriber.transcribe(&file_request()));

    assert!(result.is_ok());
    let tracker = tracker.lock().unwrap();
    assert_eq!(tracker.count("delete"), 0);
    assert_eq!(tracker.count("fetch"), 1);
}
