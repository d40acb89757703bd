//! Byte sources feeding the frame synchronizer
use std::{collections::VecDeque, future::Future};

use log::{debug, error, info};
use reqwest::{
    header::{HeaderValue, USER_AGENT},
    Client, Response,
};

use crate::error::Error;

/// Any provider of a (possibly unbounded) byte stream
pub trait ByteSource {
    /// Returns the next chunk of bytes. `Ok(None)` marks the
    /// end of stream, which is a clean termination.
    fn next_chunk(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>, Error>> + Send;
}

/// NTRIP v2 client: streaming HTTP GET against a caster mount point.
/// There is no read timeout: the stream is expected to last forever.
#[derive(Debug)]
pub struct NtripClient {
    host: String,
    port: u16,
    mountpoint: String,
    credentials: Option<(String, String)>,
    client: Client,
    response: Option<Response>,
}

impl NtripClient {
    /// Creates a new [NtripClient] for this caster and mount point
    pub fn new(host: &str, port: u16, mountpoint: &str) -> Self {
        Self {
            port,
            host: host.to_string(),
            mountpoint: mountpoint.trim_start_matches('/').to_string(),
            credentials: None,
            client: Client::new(),
            response: None,
        }
    }

    /// Copies and returns [NtripClient] with basic authentication
    pub fn with_credentials(&self, user: &str, password: &str) -> Self {
        Self {
            host: self.host.clone(),
            port: self.port,
            mountpoint: self.mountpoint.clone(),
            credentials: Some((user.to_string(), password.to_string())),
            client: self.client.clone(),
            response: None,
        }
    }

    /// Mount point URL
    pub fn url(&self) -> String {
        format!("http://{}:{}/{}", self.host, self.port, self.mountpoint)
    }

    /// User agent we present to the caster
    pub fn user_agent() -> String {
        format!("NTRIP rtcm-ppp/{}", env!("CARGO_PKG_VERSION"))
    }

    /// True once the stream is open
    pub fn is_connected(&self) -> bool {
        self.response.is_some()
    }

    /// Opens the stream. Fails on transport error or if the
    /// caster answers with anything but a success status.
    pub async fn connect(&mut self) -> Result<(), Error> {
        let url = self.url();
        debug!("ntrip: connecting to {}", url);

        let mut request = self
            .client
            .get(&url)
            .header("Ntrip-Version", HeaderValue::from_static("Ntrip/2.0"))
            .header(USER_AGENT, Self::user_agent());

        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }

        let response = request.send().await.map_err(|e| {
            error!("ntrip: {} - {}", url, e);
            Error::Transport(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!("ntrip: {} - rejected ({})", url, status);
            return Err(Error::HttpStatus(status.as_u16()));
        }

        info!("ntrip: connected to {}", url);
        self.response = Some(response);
        Ok(())
    }
}

impl ByteSource for NtripClient {
    fn next_chunk(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>, Error>> + Send {
        async move {
            if self.response.is_none() {
                self.connect().await?;
            }

            let response = match self.response.as_mut() {
                Some(response) => response,
                None => return Ok(None),
            };

            match response.chunk().await? {
                Some(bytes) => Ok(Some(bytes.to_vec())),
                None => {
                    info!("ntrip: {} - end of stream", self.mountpoint);
                    self.response = None;
                    Ok(None)
                },
            }
        }
    }
}

/// Replays recorded bytes, by chunks of fixed size
#[derive(Debug, Clone, Default)]
pub struct BufferSource {
    chunks: VecDeque<Vec<u8>>,
}

impl BufferSource {
    /// Creates a [BufferSource] delivering these bytes by chunks of this size
    pub fn new(bytes: &[u8], chunk_size: usize) -> Self {
        Self {
            chunks: bytes
                .chunks(chunk_size.max(1))
                .map(|chunk| chunk.to_vec())
                .collect(),
        }
    }

    /// Creates a [BufferSource] delivering these chunks, as is
    pub fn from_chunks(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks: chunks.into(),
        }
    }

    /// Remaining number of chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl ByteSource for BufferSource {
    fn next_chunk(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>, Error>> + Send {
        let chunk = self.chunks.pop_front();
        async move { Ok(chunk) }
    }
}
