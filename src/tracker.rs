//! Builds the tracker announce URL and parses the compact peer list
//! the tracker hands back.

use percent_encoding::{percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_bytes::ByteBuf;

use crate::error::{Error, Result};
use crate::peer::PeerAddr;
use crate::{PeerId, Sha1Hash};

/// Bytes that must be escaped in a query string component: everything
/// but alphanumerics, matching the conventional "safe" set trackers
/// expect for raw 20-byte `info_hash`/`peer_id` fields.
const QUERY_COMPONENT: &AsciiSet = NON_ALPHANUMERIC;

#[derive(Debug, Serialize, Deserialize)]
struct TrackerResponse {
    /// Seconds the client should wait before re-announcing. This core
    /// never re-announces, so the value is parsed but otherwise unused.
    #[allow(dead_code)]
    interval: i64,
    #[serde(with = "serde_bytes")]
    peers: ByteBuf,
}

/// Announces to the tracker and returns the peers it hands back.
///
/// Fails with `TrackerError` on a non-200 response or a body that
/// doesn't bencode-decode into the expected shape.
pub async fn announce(
    announce_url: &str,
    info_hash: Sha1Hash,
    peer_id: PeerId,
    port: u16,
    left: u64,
) -> Result<Vec<PeerAddr>> {
    // Validate the descriptor's announce URL is absolute before building
    // the query string by hand; a relative or malformed URL should fail
    // fast with a clear error rather than as an opaque reqwest failure.
    url::Url::parse(announce_url)
        .map_err(|e| Error::TrackerError(format!("invalid announce URL: {}", e)))?;

    let url = build_url(announce_url, info_hash, peer_id, port, left);

    let response = reqwest::get(&url)
        .await
        .map_err(|e| Error::TrackerError(e.to_string()))?;
    if !response.status().is_success() {
        return Err(Error::TrackerError(format!(
            "tracker responded with status {}",
            response.status()
        )));
    }
    let body = response
        .bytes()
        .await
        .map_err(|e| Error::TrackerError(e.to_string()))?;

    let parsed: TrackerResponse =
        serde_bencode::from_bytes(&body).map_err(|e| Error::TrackerError(e.to_string()))?;

    PeerAddr::decode_compact_list(parsed.peers.as_ref())
}

fn build_url(announce_url: &str, info_hash: Sha1Hash, peer_id: PeerId, port: u16, left: u64) -> String {
    format!(
        "{}?info_hash={}&peer_id={}&port={}&uploaded=0&downloaded=0&left={}&compact=1",
        announce_url,
        percent_encode(&info_hash, QUERY_COMPONENT),
        percent_encode(&peer_id, QUERY_COMPONENT),
        port,
        left,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_url_percent_encodes_raw_hash_bytes() {
        let info_hash = [0xABu8; 20];
        let peer_id = [0x41u8; 20]; // 'A', alphanumeric, stays literal
        let url = build_url("http://tracker.test/announce", info_hash, peer_id, 6881, 1000);
        assert!(url.starts_with("http://tracker.test/announce?info_hash=%AB%AB"));
        assert!(url.contains("peer_id=AAAAAAAAAAAAAAAAAAAA"));
        assert!(url.contains("port=6881"));
        assert!(url.contains("uploaded=0"));
        assert!(url.contains("downloaded=0"));
        assert!(url.contains("left=1000"));
        assert!(url.contains("compact=1"));
    }

    #[tokio::test]
    async fn announce_decodes_peers_from_a_mocked_response() {
        let mut peers = vec![10, 0, 0, 1, 0x1A, 0xE1];
        peers.extend_from_slice(&[10, 0, 0, 2, 0x1A, 0xE1]);
        let body = serde_bencode::to_bytes(&TrackerResponse {
            interval: 1800,
            peers: ByteBuf::from(peers),
        })
        .unwrap();

        let _m = mockito::mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_body(body)
            .create();

        let result = announce(&mockito::server_url(), [0u8; 20], [1u8; 20], 6881, 40000)
            .await
            .unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].to_string(), "10.0.0.1:6881");
        assert_eq!(result[1].to_string(), "10.0.0.2:6881");
    }

    #[tokio::test]
    async fn announce_fails_on_non_200_status() {
        let _m = mockito::mock("GET", mockito::Matcher::Any)
            .with_status(500)
            .create();

        let result = announce(&mockito::server_url(), [0u8; 20], [1u8; 20], 6881, 40000).await;
        assert!(matches!(result, Err(Error::TrackerError(_))));
    }

    #[tokio::test]
    async fn announce_rejects_a_malformed_url() {
        let result = announce("not a url", [0u8; 20], [1u8; 20], 6881, 40000).await;
        assert!(matches!(result, Err(Error::TrackerError(_))));
    }
}
