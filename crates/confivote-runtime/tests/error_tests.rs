//! Integration tests for error handling in confivote-runtime

use confivote_runtime::{ServiceError, VoteError};

#[test]
fn test_invalid_draft_error_message() {
    let error = VoteError::invalid_draft("score must be a whole number");

    let error_msg = error.to_string();
    assert!(error_msg.contains("Invalid vote draft"));
    assert!(error_msg.contains("score must be a whole number"));
}

#[test]
fn test_session_error_messages() {
    assert_eq!(VoteError::WalletNotConnected.to_string(), "Wallet not connected");
    assert_eq!(VoteError::FheNotReady.to_string(), "FHE session not ready");
}

#[test]
fn test_service_error_is_transparent() {
    let error: VoteError = ServiceError::failed("execution reverted").into();
    assert_eq!(error.to_string(), "execution reverted");
}

#[test]
fn test_classify_user_rejected() {
    let err = ServiceError::classify("user rejected transaction (action=\"sendTransaction\")");
    assert!(err.is_user_rejected());

    let err = ServiceError::classify("MetaMask: User denied transaction signature");
    assert!(err.is_user_rejected());
}

#[test]
fn test_classify_already_verified() {
    let err = ServiceError::classify("execution reverted: Data already verified");
    assert!(err.is_already_verified());
    assert!(!err.is_user_rejected());
}

#[test]
fn test_other_error_message() {
    let error = VoteError::other("unexpected error occurred");
    assert_eq!(error.to_string(), "unexpected error occurred");
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: VoteError = io_error.into();

    let error_msg = error.to_string();
    assert!(error_msg.contains("I/O error"));
    assert!(error_msg.contains("file not found"));
}

#[test]
fn test_error_debug_format() {
    let error = VoteError::invalid_draft("test");
    let debug_output = format!("{:?}", error);

    assert!(debug_output.contains("InvalidDraft"));
}

#[test]
fn test_result_type_err() {
    use confivote_runtime::Result;

    let result: Result<i32> = Err(VoteError::other("test error"));
    assert!(result.is_err());
    if let Err(error) = result {
        assert_eq!(error.to_string(), "test error");
    }
}
