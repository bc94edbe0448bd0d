//! # Gateway Client
//!
//! HTTP client for the storage gateway:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | Upload | `PUT {gateway}/file`, multipart field `file`, header `BucketName` |
//! | Download | `GET {gateway}/file/download/{fid}` |
//!
//! Every request carries `Account`, `Message` and `Signature` headers so the
//! gateway can check that the caller owns the space it stores into.

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use probe_core::{ContentIdentifier, Gateway, NamespaceName};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::RpcError;
use crate::keyring::Keyring;

/// Gateway JSON envelope.
#[derive(Debug, Deserialize)]
struct GatewayResponse {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Extract the FID from an upload response body.
///
/// Accepts `{"data": "<fid>"}`, `{"data": {"fid": "<fid>"}}` and a bare
/// FID as plain text.
pub fn parse_upload_response(body: &str) -> Result<ContentIdentifier, RpcError> {
    let body = body.trim();
    if let Ok(envelope) = serde_json::from_str::<GatewayResponse>(body) {
        if let Some(code) = envelope.code {
            if code != 200 {
                return Err(RpcError::Status {
                    status: code,
                    body: envelope.msg.unwrap_or_default(),
                });
            }
        }
        let fid = match envelope.data {
            Some(serde_json::Value::String(fid)) => Some(fid),
            Some(serde_json::Value::Object(map)) => map
                .get("fid")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            _ => None,
        };
        return fid
            .filter(|f| !f.is_empty())
            .map(ContentIdentifier::new)
            .ok_or_else(|| RpcError::Parse(format!("no fid in gateway response: {body}")));
    }
    let bare = body.trim_matches('"');
    if !bare.is_empty() && bare.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Ok(ContentIdentifier::new(bare));
    }
    Err(RpcError::Parse(format!("unrecognised gateway response: {body}")))
}

/// Gateway HTTP client.
#[derive(Debug)]
pub struct GatewayClient {
    http_client: reqwest::Client,
    transfer_timeout: Duration,
}

impl GatewayClient {
    /// Client whose uploads and downloads time out after `transfer_timeout`.
    pub fn new(transfer_timeout: Duration) -> Result<Self, RpcError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http_client,
            transfer_timeout,
        })
    }

    fn signed(
        &self,
        request: reqwest::RequestBuilder,
        keyring: &Keyring,
    ) -> reqwest::RequestBuilder {
        let message = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default()
            .to_string();
        let signature = keyring.sign(message.as_bytes());
        request
            .timeout(self.transfer_timeout)
            .header("Account", keyring.account_id().to_hex())
            .header("Message", message)
            .header("Signature", format!("0x{}", hex::encode(signature)))
    }

    /// Upload the file at `payload` into `namespace`.
    pub async fn upload(
        &self,
        gateway: &Gateway,
        payload: &Path,
        namespace: &NamespaceName,
        keyring: &Keyring,
    ) -> Result<ContentIdentifier, RpcError> {
        let data = tokio::fs::read(payload).await?;
        let file_name = payload
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "payload".to_string());
        let size = data.len();
        let form = Form::new().part("file", Part::bytes(data).file_name(file_name));

        let url = format!("{}/file", gateway.url.trim_end_matches('/'));
        let request = self
            .http_client
            .put(&url)
            .header("BucketName", namespace.as_str())
            .multipart(form);
        let response = self
            .signed(request, keyring)
            .send()
            .await
            .map_err(|e| transport_error(e, &url))?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RpcError::Status {
                status: status.as_u16(),
                body,
            });
        }
        debug!(url = %url, bytes = size, "Gateway accepted upload");
        parse_upload_response(&body)
    }

    /// Download `cid` into `dest`, streaming the body to disk.
    pub async fn download(
        &self,
        gateway: &Gateway,
        cid: &ContentIdentifier,
        dest: &Path,
        keyring: &Keyring,
    ) -> Result<u64, RpcError> {
        let url = format!("{}/file/download/{}", gateway.url.trim_end_matches('/'), cid);
        let request = self.http_client.get(&url);
        let mut response = self
            .signed(request, keyring)
            .send()
            .await
            .map_err(|e| transport_error(e, &url))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RpcError::NotFound(format!("object {cid}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RpcError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        debug!(url = %url, bytes = written, "Gateway download complete");
        Ok(written)
    }
}

fn transport_error(e: reqwest::Error, url: &str) -> RpcError {
    if e.is_connect() {
        RpcError::Connection(format!("Cannot connect to {url}"))
    } else if e.is_timeout() {
        RpcError::Timeout(url.to_string())
    } else {
        RpcError::Http(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::{closed_port_url, serve, serve_bytes};
    use probe_core::ErrorClass;

    fn keyring() -> Keyring {
        Keyring::from_seed_phrase("gateway test phrase").unwrap()
    }

    fn gateway(url: String) -> Gateway {
        Gateway {
            url,
            account: "cXgateway".into(),
        }
    }

    #[test]
    fn test_parse_upload_response_forms() {
        assert_eq!(
            parse_upload_response(r#"{"code":200,"msg":"ok","data":"abc123"}"#).unwrap().as_str(),
            "abc123"
        );
        assert_eq!(
            parse_upload_response(r#"{"data":{"fid":"def456"}}"#).unwrap().as_str(),
            "def456"
        );
        assert_eq!(parse_upload_response("abc123\n").unwrap().as_str(), "abc123");
    }

    #[test]
    fn test_parse_upload_response_errors() {
        let err = parse_upload_response(r#"{"code":503,"msg":"busy"}"#).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Transient);

        assert!(matches!(
            parse_upload_response(r#"{"code":200,"data":""}"#),
            Err(RpcError::Parse(_))
        ));
        assert!(matches!(
            parse_upload_response("<html>oops</html>"),
            Err(RpcError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_sends_bucket_and_signature() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("rand.txt");
        std::fs::write(&file, b"abcdef").unwrap();
        let (url, server) = serve(vec![(200, r#"{"code":200,"data":"abc123"}"#.into())]).await;

        let client = GatewayClient::new(Duration::from_secs(10)).unwrap();
        let cid = client
            .upload(&gateway(url), &file, &NamespaceName::parse("random").unwrap(), &keyring())
            .await
            .unwrap();
        assert_eq!(cid.as_str(), "abc123");

        let request = server.await.unwrap().remove(0).to_ascii_lowercase();
        assert!(request.starts_with("put /file"));
        assert!(request.contains("bucketname: random"));
        assert!(request.contains("signature: 0x"));
        assert!(request.contains("filename=\"rand.txt\""));
    }

    #[tokio::test]
    async fn test_download_writes_body() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("abc123_rand.txt");
        let (url, server) = serve_bytes(vec![(200, b"payload-bytes".to_vec())]).await;

        let client = GatewayClient::new(Duration::from_secs(10)).unwrap();
        let written = client
            .download(&gateway(url), &ContentIdentifier::new("abc123"), &dest, &keyring())
            .await
            .unwrap();

        assert_eq!(written, 13);
        assert_eq!(std::fs::read(&dest).unwrap(), b"payload-bytes");
        let request = server.await.unwrap().remove(0);
        assert!(request.starts_with("GET /file/download/abc123"));
    }

    #[tokio::test]
    async fn test_download_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (url, _server) = serve(vec![(404, "{}".into())]).await;

        let client = GatewayClient::new(Duration::from_secs(10)).unwrap();
        let err = client
            .download(
                &gateway(url),
                &ContentIdentifier::new("abc123"),
                &dir.path().join("out"),
                &keyring(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_transient() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("rand.txt");
        std::fs::write(&file, b"x").unwrap();

        let client = GatewayClient::new(Duration::from_secs(10)).unwrap();
        let err = client
            .upload(
                &gateway(closed_port_url().await),
                &file,
                &NamespaceName::parse("random").unwrap(),
                &keyring(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Transient);
    }
}
