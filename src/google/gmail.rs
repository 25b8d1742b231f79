//! Gmail API client for listing sent mail and turning each message
//! into a flat `EmailRecord`.

use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use htmd::HtmlToMarkdown;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::BatchReport;

// Gmail pads base64url bodies most of the time but not always
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MessageRef {
    pub id: String,
    #[serde(rename = "threadId")]
    pub thread_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListMessagesResponse {
    pub messages: Option<Vec<MessageRef>>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(rename = "threadId")]
    pub thread_id: Option<String>,
    pub snippet: Option<String>,
    pub payload: Option<MessagePart>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagePartBody {
    #[serde(rename = "attachmentId")]
    pub attachment_id: Option<String>,
    #[serde(default)]
    pub size: u64,
    // Base64url encoded
    pub data: Option<String>,
}

/// One node of the MIME tree. The top level message payload is a part
/// too, it's just the only one with headers most of the time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagePart {
    #[serde(rename = "partId")]
    pub part_id: Option<String>,
    #[serde(rename = "mimeType", default)]
    pub mimetype: String,
    pub headers: Option<Vec<MessageHeader>>,
    pub body: Option<MessagePartBody>,
    pub parts: Option<Vec<MessagePart>>,
}

impl MessagePart {
    fn data(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| b.data.as_deref())
            .filter(|d| !d.is_empty())
    }

    fn children(&self) -> &[MessagePart] {
        self.parts.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageHeader {
    pub name: String,
    pub value: String,
}

/// A sent email reduced to the fields the summarizer needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailRecord {
    pub subject: Option<String>,
    pub to: Option<String>,
    pub from: Option<String>,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to fetch emails: {0}")]
    List(String),
}

/// Decode base64url content, dropping any invalid UTF-8. Bad input
/// yields an empty string rather than an error.
fn decode_base64(data: &str) -> String {
    match URL_SAFE_LENIENT.decode(data.trim()) {
        Ok(bytes) => bytes.utf8_chunks().map(|chunk| chunk.valid()).collect(),
        Err(e) => {
            tracing::warn!("Base64 decode failed: {}", e);
            String::new()
        }
    }
}

/// Reduce an HTML document to its text, one non-blank line per line
/// of the converted markdown.
pub fn strip_html_tags(html: &str) -> String {
    let converter = HtmlToMarkdown::builder()
        .skip_tags(vec!["head", "script", "style", "footer", "img", "svg"])
        .build();
    let markdown = match converter.convert(html) {
        Ok(markdown) => markdown,
        Err(e) => {
            tracing::warn!("Failed to convert HTML body: {}", e);
            return String::new();
        }
    };

    markdown
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn find_text(part: &MessagePart, mimetype: &str) -> Option<String> {
    if part.mimetype == mimetype
        && let Some(data) = part.data()
    {
        let decoded = decode_base64(data);
        let text = if mimetype == "text/html" {
            strip_html_tags(&decoded)
        } else {
            decoded
        };
        if !text.is_empty() {
            return Some(text);
        }
    }

    part.children()
        .iter()
        .find_map(|child| find_text(child, mimetype))
}

/// Extract the body from a message part tree.
///
/// - Walks the tree depth-first, left to right
/// - The first non-empty `text/plain` node wins anywhere in the tree
/// - Otherwise the first non-empty `text/html` node, with the markup
///   stripped
/// - Nodes that fail to decode are treated as empty and the search
///   continues
pub fn extract_body(part: &MessagePart) -> String {
    find_text(part, "text/plain")
        .or_else(|| find_text(part, "text/html"))
        .unwrap_or_default()
}

/// Value of the first header named exactly `name`.
pub fn extract_header(part: &MessagePart, name: &str) -> Option<String> {
    part.headers
        .as_ref()?
        .iter()
        .find(|h| h.name == name)
        .map(|h| h.value.clone())
}

/// Convert a full Gmail message into an `EmailRecord`.
pub fn parse_message(message: &Message) -> Result<EmailRecord, anyhow::Error> {
    let payload = message
        .payload
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Message {} has no payload", message.id))?;

    Ok(EmailRecord {
        subject: extract_header(payload, "Subject"),
        to: extract_header(payload, "To"),
        from: extract_header(payload, "From"),
        body: extract_body(payload).trim().to_string(),
    })
}

/// List the ids of the most recent sent messages.
pub async fn list_sent_messages(
    client: &Client,
    api_base: &str,
    access_token: &str,
    max_results: u32,
) -> Result<Vec<MessageRef>, FetchError> {
    let url = format!(
        "{}/gmail/v1/users/me/messages?labelIds=SENT&maxResults={}",
        api_base.trim_end_matches('/'),
        max_results
    );
    let res = client
        .get(&url)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| FetchError::List(e.to_string()))?;
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(FetchError::List(format!(
            "Sent list failed: {} ({})",
            status, text
        )));
    }
    let msgs: ListMessagesResponse =
        serde_json::from_str(&text).map_err(|e| FetchError::List(e.to_string()))?;
    Ok(msgs.messages.unwrap_or_default())
}

/// Fetch a full message by id
pub async fn fetch_message(
    client: &Client,
    api_base: &str,
    access_token: &str,
    id: &str,
) -> Result<Message, anyhow::Error> {
    let url = format!(
        "{}/gmail/v1/users/me/messages/{}?format=full",
        api_base.trim_end_matches('/'),
        id
    );
    let res = client.get(&url).bearer_auth(access_token).send().await?;
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    if !status.is_success() {
        anyhow::bail!("Message fetch failed: {} ({})", status, text);
    }
    let message: Message = serde_json::from_str(&text)?;
    Ok(message)
}

/// Fetch up to `max_results` sent emails. Only the listing call can
/// fail the batch, a message that can't be fetched or parsed is
/// logged and recorded as a failed item.
pub async fn fetch_sent(
    client: &Client,
    api_base: &str,
    access_token: &str,
    max_results: u32,
) -> Result<BatchReport<EmailRecord>, FetchError> {
    let refs = list_sent_messages(client, api_base, access_token, max_results).await?;
    tracing::debug!("Listed {} sent messages", refs.len());

    let mut report = BatchReport::new();
    for msg in refs {
        let parsed = fetch_message(client, api_base, access_token, &msg.id)
            .await
            .and_then(|m| parse_message(&m));
        match parsed {
            Ok(email) => report.completed(email),
            Err(e) => {
                tracing::error!("Error parsing email {}: {}", msg.id, e);
                report.failed(msg.id, e.to_string());
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};

    fn leaf(mimetype: &str, text: &str) -> MessagePart {
        MessagePart {
            mimetype: mimetype.to_string(),
            body: Some(MessagePartBody {
                attachment_id: None,
                size: text.len() as u64,
                data: Some(URL_SAFE.encode(text)),
            }),
            ..Default::default()
        }
    }

    fn container(mimetype: &str, parts: Vec<MessagePart>) -> MessagePart {
        MessagePart {
            mimetype: mimetype.to_string(),
            parts: Some(parts),
            ..Default::default()
        }
    }

    fn raw_leaf(mimetype: &str, data: &str) -> MessagePart {
        MessagePart {
            mimetype: mimetype.to_string(),
            body: Some(MessagePartBody {
                data: Some(data.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_base64() {
        assert_eq!(decode_base64(&URL_SAFE.encode("Hello World")), "Hello World");
        // Padding is optional
        assert_eq!(
            decode_base64(&URL_SAFE_NO_PAD.encode("Hello World")),
            "Hello World"
        );
        // Url safe alphabet
        assert_eq!(decode_base64(&URL_SAFE.encode("??>>")), "??>>");
        // Invalid input never errors
        assert_eq!(decode_base64("!!!not base64!!!"), "");
        // Invalid UTF-8 bytes are dropped
        assert_eq!(decode_base64(&URL_SAFE.encode(b"ab\xffcd")), "abcd");
    }

    #[test]
    fn test_decode_base64_keeps_replacement_char() {
        assert_eq!(
            decode_base64(&URL_SAFE.encode("keep \u{FFFD} char")),
            "keep \u{FFFD} char"
        );
    }

    #[test]
    fn test_strip_html_tags() {
        let html = "<html><head><title>x</title><style>p {color: red}</style></head>\
                    <body><p>Dear Client,</p><div>Filed the motion today.</div>\
                    <script>alert(1)</script></body></html>";
        assert_eq!(
            strip_html_tags(html),
            "Dear Client,\nFiled the motion today."
        );
        assert_eq!(strip_html_tags("<p>Fees &amp; costs</p>"), "Fees & costs");
        assert_eq!(strip_html_tags("<br/><br/>"), "");
    }

    #[test]
    fn test_strip_html_tags_keeps_angle_brackets_in_text() {
        assert_eq!(
            strip_html_tags("<p>Fee if 3 &lt; 5 and 7 &gt; 2 applies</p>"),
            "Fee if 3 < 5 and 7 > 2 applies"
        );
        assert_eq!(
            strip_html_tags("<p>Fee if 3 < 5 and 7 > 2 applies</p>"),
            "Fee if 3 < 5 and 7 > 2 applies"
        );
    }

    #[test]
    fn test_extract_body_plain_leaf() {
        let part = leaf("text/plain", "Hello World");
        assert_eq!(extract_body(&part), "Hello World");
    }

    #[test]
    fn test_extract_body_prefers_plain_text() {
        let part = container(
            "multipart/alternative",
            vec![
                leaf("text/html", "<p>Html body</p>"),
                leaf("text/plain", "Plain body"),
            ],
        );
        assert_eq!(extract_body(&part), "Plain body");
    }

    #[test]
    fn test_extract_body_nested_depth_first() {
        let part = container(
            "multipart/mixed",
            vec![
                container(
                    "multipart/alternative",
                    vec![leaf("text/plain", "First plain")],
                ),
                leaf("text/plain", "Second plain"),
            ],
        );
        assert_eq!(extract_body(&part), "First plain");
    }

    #[test]
    fn test_extract_body_falls_back_to_html() {
        let part = container(
            "multipart/mixed",
            vec![
                leaf("application/pdf", "%PDF"),
                container(
                    "multipart/related",
                    vec![leaf("text/html", "<div>Call with opposing counsel</div>")],
                ),
            ],
        );
        assert_eq!(extract_body(&part), "Call with opposing counsel");
    }

    #[test]
    fn test_extract_body_skips_malformed_node() {
        let part = container(
            "multipart/alternative",
            vec![
                raw_leaf("text/plain", "%%%%"),
                leaf("text/plain", "Recovered"),
            ],
        );
        assert_eq!(extract_body(&part), "Recovered");
    }

    #[test]
    fn test_extract_body_empty() {
        assert_eq!(extract_body(&MessagePart::default()), "");
        let part = container("multipart/mixed", vec![leaf("image/png", "png")]);
        assert_eq!(extract_body(&part), "");
        // A text node without data is skipped
        let part = container(
            "multipart/alternative",
            vec![MessagePart {
                mimetype: "text/plain".to_string(),
                ..Default::default()
            }],
        );
        assert_eq!(extract_body(&part), "");
    }

    #[test]
    fn test_extract_header() {
        let part = MessagePart {
            headers: Some(vec![
                MessageHeader {
                    name: "subject".to_string(),
                    value: "lowercase".to_string(),
                },
                MessageHeader {
                    name: "Subject".to_string(),
                    value: "First".to_string(),
                },
                MessageHeader {
                    name: "Subject".to_string(),
                    value: "Second".to_string(),
                },
            ]),
            ..Default::default()
        };
        assert_eq!(extract_header(&part, "Subject"), Some("First".to_string()));
        assert_eq!(extract_header(&part, "To"), None);
        assert_eq!(extract_header(&MessagePart::default(), "Subject"), None);
    }

    #[test]
    fn test_parse_message() {
        let message: Message = serde_json::from_str(
            r#"{
                "id": "msg_001",
                "threadId": "thr_001",
                "payload": {
                    "mimeType": "text/plain",
                    "headers": [
                        {"name": "From", "value": "me@firm.com"},
                        {"name": "To", "value": "client@example.com"},
                        {"name": "Subject", "value": "Settlement"}
                    ],
                    "body": {"size": 15, "data": "ICBIZWxsbyBjbGllbnQgIA=="}
                }
            }"#,
        )
        .unwrap();

        let email = parse_message(&message).unwrap();
        assert_eq!(
            email,
            EmailRecord {
                subject: Some("Settlement".to_string()),
                to: Some("client@example.com".to_string()),
                from: Some("me@firm.com".to_string()),
                body: "Hello client".to_string(),
            }
        );

        let message = Message {
            id: "empty".to_string(),
            thread_id: None,
            snippet: None,
            payload: None,
        };
        assert!(parse_message(&message).is_err());
    }

    #[tokio::test]
    async fn test_fetch_sent_skips_bad_messages() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let _list = server
            .mock("GET", "/gmail/v1/users/me/messages")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("labelIds".into(), "SENT".into()),
                mockito::Matcher::UrlEncoded("maxResults".into(), "3".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"messages": [
                    {"id": "m1", "threadId": "t1"},
                    {"id": "m2", "threadId": "t2"},
                    {"id": "m3", "threadId": "t3"}
                ]}"#,
            )
            .create_async()
            .await;
        let _m1 = server
            .mock("GET", "/gmail/v1/users/me/messages/m1?format=full")
            .with_status(200)
            .with_body(
                r#"{"id": "m1", "payload": {"mimeType": "text/plain",
                    "headers": [{"name": "Subject", "value": "One"}],
                    "body": {"size": 3, "data": "b25l"}}}"#,
            )
            .create_async()
            .await;
        let _m2 = server
            .mock("GET", "/gmail/v1/users/me/messages/m2?format=full")
            .with_status(500)
            .with_body("backend error")
            .create_async()
            .await;
        let _m3 = server
            .mock("GET", "/gmail/v1/users/me/messages/m3?format=full")
            .with_status(200)
            .with_body(
                r#"{"id": "m3", "payload": {"mimeType": "text/plain",
                    "headers": [{"name": "Subject", "value": "Three"}],
                    "body": {"size": 5, "data": "dGhyZWU="}}}"#,
            )
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let report = fetch_sent(&client, &url, "test_token", 3).await.unwrap();

        assert_eq!(report.attempted(), 3);
        let subjects: Vec<_> = report
            .succeeded()
            .map(|e| e.subject.clone().unwrap())
            .collect();
        assert_eq!(subjects, vec!["One", "Three"]);
        assert_eq!(report.errors().count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_sent_list_error() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let _mock = server
            .mock("GET", "/gmail/v1/users/me/messages")
            .match_query(mockito::Matcher::Any)
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": {"message": "Unauthorized"}}"#)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let result = fetch_sent(&client, &url, "bad_token", 10).await;
        assert!(matches!(result, Err(FetchError::List(_))));
    }

    #[tokio::test]
    async fn test_fetch_sent_no_messages() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let _mock = server
            .mock("GET", "/gmail/v1/users/me/messages")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"resultSizeEstimate": 0}"#)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let report = fetch_sent(&client, &url, "test_token", 10).await.unwrap();
        assert_eq!(report.attempted(), 0);
    }
}
