//! Tests for fetch error classification and user-facing messages.

use phonebook_protocol::FetchError;

#[test]
fn status_zero_is_unreachable() {
    assert!(matches!(
        FetchError::from_status(0, ""),
        FetchError::Unreachable(_)
    ));
}

#[test]
fn known_statuses_are_classified() {
    assert_eq!(FetchError::from_status(404, "nope"), FetchError::NotFound);
    assert_eq!(FetchError::from_status(500, "boom"), FetchError::ServerError);
}

#[test]
fn other_statuses_keep_the_body() {
    let err = FetchError::from_status(502, "bad gateway");
    assert_eq!(
        err,
        FetchError::Unknown {
            status: Some(502),
            detail: "bad gateway".into()
        }
    );
    assert_eq!(err.user_message(), "Uncaught Error. bad gateway");
}

#[test]
fn user_messages() {
    let cases = [
        (FetchError::Unreachable("refused".into()), "Not connect. Verify Network."),
        (FetchError::NotFound, "Requested page not found (404)."),
        (FetchError::ServerError, "Internal Server Error (500)."),
        (FetchError::Parse("eof".into()), "Requested JSON parse failed."),
        (FetchError::Timeout, "Time out error."),
        (FetchError::Aborted, "Ajax request aborted."),
    ];
    for (err, expected) in cases {
        assert_eq!(err.user_message(), expected);
    }
}

#[test]
fn json_errors_convert_to_parse() {
    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(FetchError::from(json_err), FetchError::Parse(_)));
}
