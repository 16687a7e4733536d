// HTTP probe implementation
// reason: reqwest client driven on a current-thread runtime owned by the call; both are
// dropped before returning so no connection outlives the probe
use std::io::ErrorKind;
use std::path::Path;

use reqwest::header::CONNECTION;
use reqwest::redirect::Policy;
use reqwest::{Client, Identity, Method};
use tokio::runtime::Builder;
use tracing::{debug, info};

use devhost_core::constants::HTTP_STATUS_OK;
use devhost_core::domain::{ProbeOutcome, ProbeRequest, TlsMaterial, TlsVerification};
use devhost_core::port::http_probe::{find_io_kind, HttpProbe, ProbeError};

/// HTTP probe backed by reqwest (rustls for HTTPS)
///
/// `probe` blocks the calling thread. It must not be called from inside an
/// async runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReqwestHttpProbe;

impl ReqwestHttpProbe {
    pub fn new() -> Self {
        Self
    }

    /// Build a single-use client: no pooling, no redirects, no proxies
    ///
    /// The timeout bounds the connect and each read separately, so a slow but
    /// steady body is not cut off.
    fn build_client(&self, request: &ProbeRequest, url: &str) -> Result<Client, ProbeError> {
        let mut builder = Client::builder()
            .connect_timeout(request.timeout)
            .read_timeout(request.timeout)
            .pool_max_idle_per_host(0)
            .redirect(Policy::none())
            .no_proxy();

        if let Some(tls) = &request.tls {
            builder = builder.identity(load_identity(tls)?);

            if request.verification == TlsVerification::AcceptAny {
                // Development servers present self-signed certificates
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder.build().map_err(|e| ProbeError::Transport {
            url: url.to_string(),
            source: Box::new(e),
        })
    }

    async fn exchange(
        &self,
        request: &ProbeRequest,
        method: Method,
        url: &str,
    ) -> Result<ProbeOutcome, ProbeError> {
        let client = self.build_client(request, url)?;
        let response = match client.request(method, url).header(CONNECTION, "close").send().await {
            Ok(response) => response,
            Err(e) if is_connection_refused(&e) => {
                debug!(url = %url, "Connection refused, service not ready");
                return Ok(ProbeOutcome::Pending);
            }
            Err(e) => return Err(failure(request, url, e)),
        };

        let status = response.status().as_u16();
        if status != HTTP_STATUS_OK {
            debug!(url = %url, status, "Probe got non-OK status");
            return Ok(ProbeOutcome::Unexpected { code: status });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| failure(request, url, e))?;

        debug!(url = %url, body_bytes = body.len(), "Probe ready");
        Ok(ProbeOutcome::Ready {
            body: body.to_vec(),
        })
    }
}

/// Client identity from a PEM key file and a PEM certificate file
fn load_identity(tls: &TlsMaterial) -> Result<Identity, ProbeError> {
    let mut pem = read_pem(&tls.key_file)?;
    pem.push(b'\n');
    pem.extend_from_slice(&read_pem(&tls.cert_file)?);

    Identity::from_pem(&pem).map_err(|e| ProbeError::TlsIdentity(e.to_string()))
}

fn read_pem(path: &Path) -> Result<Vec<u8>, ProbeError> {
    std::fs::read(path).map_err(|source| ProbeError::TlsMaterial {
        path: path.to_path_buf(),
        source,
    })
}

fn is_connection_refused(err: &reqwest::Error) -> bool {
    err.is_connect() && find_io_kind(err) == Some(ErrorKind::ConnectionRefused)
}

fn failure(request: &ProbeRequest, url: &str, err: reqwest::Error) -> ProbeError {
    if err.is_timeout() {
        ProbeError::Timeout {
            url: url.to_string(),
            timeout: request.timeout,
            source: Box::new(err),
        }
    } else {
        ProbeError::Transport {
            url: url.to_string(),
            source: Box::new(err),
        }
    }
}

impl HttpProbe for ReqwestHttpProbe {
    fn probe(&self, request: &ProbeRequest) -> Result<ProbeOutcome, ProbeError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| ProbeError::InvalidRequest(format!("invalid method {:?}", request.method)))?;
        let url = request.url();

        info!(
            url = %url,
            method = %method,
            timeout_ms = request.timeout.as_millis() as u64,
            verification = ?request.verification,
            "Probing"
        );

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ProbeError::Runtime)?;

        runtime.block_on(self.exchange(request, method, &url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::path::PathBuf;
    use std::sync::mpsc;
    use std::thread;
    use std::time::{Duration, Instant};

    /// Serve exactly one request, reporting its method and URL
    fn serve_once(status: u16, body: &'static str) -> (u16, mpsc::Receiver<(String, String)>) {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            if let Ok(request) = server.recv() {
                let _ = tx.send((request.method().as_str().to_string(), request.url().to_string()));
                let response = tiny_http::Response::from_string(body).with_status_code(status);
                let _ = request.respond(response);
            }
        });

        (port, rx)
    }

    fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_ok_returns_body() {
        let (port, _rx) = serve_once(200, "ok");
        let probe = ReqwestHttpProbe::new();

        let outcome = probe.probe(&ProbeRequest::new("127.0.0.1", port)).unwrap();

        assert_eq!(outcome, ProbeOutcome::Ready { body: b"ok".to_vec() });
    }

    #[test]
    fn test_not_found_is_unexpected() {
        let (port, _rx) = serve_once(404, "missing");
        let probe = ReqwestHttpProbe::new();

        let outcome = probe.probe(&ProbeRequest::new("127.0.0.1", port)).unwrap();

        assert_eq!(outcome, ProbeOutcome::Unexpected { code: 404 });
        assert_eq!(outcome.into_body(), None);
    }

    #[test]
    fn test_closed_port_is_pending() {
        let probe = ReqwestHttpProbe::new();

        let outcome = probe
            .probe(&ProbeRequest::new("127.0.0.1", closed_port()))
            .unwrap();

        assert_eq!(outcome, ProbeOutcome::Pending);
    }

    #[test]
    fn test_method_and_path_are_sent() {
        let (port, rx) = serve_once(200, "");
        let probe = ReqwestHttpProbe::new();

        probe
            .probe(&ProbeRequest::new("127.0.0.1", port).method("POST").path("heartbeat"))
            .unwrap();

        let (method, url) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(method, "POST");
        assert_eq!(url, "/heartbeat");
    }

    #[test]
    fn test_silent_server_times_out() {
        // Accepted by the kernel backlog, never answered
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let probe = ReqwestHttpProbe::new();

        let err = probe
            .probe(&ProbeRequest::new("127.0.0.1", port).timeout(Duration::from_millis(200)))
            .unwrap_err();

        assert!(matches!(err, ProbeError::Timeout { .. }), "got {err:?}");
        assert!(std::error::Error::source(&err).is_some());
        drop(listener);
    }

    /// Answer one request with a 200 whose body is written a byte at a time
    fn serve_slowly(body: &'static [u8], gap: Duration) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            read_request_head(&mut stream);

            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.flush().unwrap();

            for byte in body {
                thread::sleep(gap);
                if stream.write_all(&[*byte]).and_then(|_| stream.flush()).is_err() {
                    return;
                }
            }
        });

        port
    }

    fn read_request_head(stream: &mut TcpStream) {
        let mut head = Vec::new();
        let mut buf = [0u8; 512];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => return,
                Ok(n) => head.extend_from_slice(&buf[..n]),
            }
        }
    }

    #[test]
    fn test_timeout_applies_per_read() {
        // Each gap is under the timeout; the whole body takes longer than it
        let port = serve_slowly(b"okok", Duration::from_millis(200));
        let probe = ReqwestHttpProbe::new();
        let started = Instant::now();

        let outcome = probe
            .probe(&ProbeRequest::new("127.0.0.1", port).timeout(Duration::from_millis(500)))
            .unwrap();

        assert_eq!(outcome, ProbeOutcome::Ready { body: b"okok".to_vec() });
        assert!(started.elapsed() > Duration::from_millis(500));
    }

    #[test]
    fn test_stalled_body_times_out() {
        let port = serve_slowly(b"ok", Duration::from_secs(3));
        let probe = ReqwestHttpProbe::new();

        let err = probe
            .probe(&ProbeRequest::new("127.0.0.1", port).timeout(Duration::from_millis(200)))
            .unwrap_err();

        assert!(matches!(err, ProbeError::Timeout { .. }), "got {err:?}");
    }

    #[test]
    fn test_invalid_method() {
        let probe = ReqwestHttpProbe::new();

        let err = probe
            .probe(&ProbeRequest::new("127.0.0.1", 1).method("NOT A METHOD"))
            .unwrap_err();

        assert!(matches!(err, ProbeError::InvalidRequest(_)));
    }

    #[test]
    fn test_missing_tls_material() {
        let dir = tempfile::tempdir().unwrap();
        let probe = ReqwestHttpProbe::new();
        let request = ProbeRequest::new("127.0.0.1", closed_port())
            .tls(dir.path().join("client.key"), dir.path().join("client.crt"));

        let err = probe.probe(&request).unwrap_err();

        assert!(matches!(err, ProbeError::TlsMaterial { ref path, .. } if path.ends_with("client.key")));
        assert_eq!(err.io_kind(), Some(ErrorKind::NotFound));
    }

    #[test]
    fn test_garbage_tls_material() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("client.key");
        let cert = dir.path().join("client.crt");
        std::fs::write(&key, b"not a key").unwrap();
        std::fs::write(&cert, b"not a cert").unwrap();
        let probe = ReqwestHttpProbe::new();

        let err = probe
            .probe(&ProbeRequest::new("127.0.0.1", closed_port()).tls(key, cert))
            .unwrap_err();

        assert!(matches!(err, ProbeError::TlsIdentity(_)), "got {err:?}");
    }

    /// Self-signed key and certificate, written as PEM files
    struct SelfSigned {
        _dir: tempfile::TempDir,
        key_file: PathBuf,
        cert_file: PathBuf,
        key_pem: String,
        cert_pem: String,
    }

    fn self_signed() -> SelfSigned {
        let rcgen::CertifiedKey { cert, key_pair } =
            rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let key_file = dir.path().join("dev.key");
        let cert_file = dir.path().join("dev.crt");
        let key_pem = key_pair.serialize_pem();
        let cert_pem = cert.pem();
        std::fs::write(&key_file, &key_pem).unwrap();
        std::fs::write(&cert_file, &cert_pem).unwrap();

        SelfSigned {
            _dir: dir,
            key_file,
            cert_file,
            key_pem,
            cert_pem,
        }
    }

    /// HTTPS server presenting the self-signed certificate; answers one request
    fn serve_tls_once(material: &SelfSigned, body: &'static str) -> u16 {
        let server = tiny_http::Server::https(
            "127.0.0.1:0",
            tiny_http::SslConfig {
                certificate: material.cert_pem.clone().into_bytes(),
                private_key: material.key_pem.clone().into_bytes(),
            },
        )
        .unwrap();
        let port = server.server_addr().to_ip().unwrap().port();

        thread::spawn(move || {
            if let Ok(Some(request)) = server.recv_timeout(Duration::from_secs(5)) {
                let _ = request.respond(tiny_http::Response::from_string(body));
            }
        });

        port
    }

    #[test]
    fn test_tls_accept_any_trusts_self_signed_server() {
        let material = self_signed();
        let port = serve_tls_once(&material, "secure");
        let probe = ReqwestHttpProbe::new();
        let request = ProbeRequest::new("127.0.0.1", port)
            .tls(material.key_file.clone(), material.cert_file.clone())
            .verification(TlsVerification::AcceptAny);

        assert_eq!(request.url(), format!("https://127.0.0.1:{port}/"));
        let outcome = probe.probe(&request).unwrap();

        assert_eq!(outcome, ProbeOutcome::Ready { body: b"secure".to_vec() });
    }

    #[test]
    fn test_tls_verify_rejects_self_signed_server() {
        let material = self_signed();
        let port = serve_tls_once(&material, "secure");
        let probe = ReqwestHttpProbe::new();
        let request = ProbeRequest::new("127.0.0.1", port)
            .tls(material.key_file.clone(), material.cert_file.clone());

        let err = probe.probe(&request).unwrap_err();

        assert!(matches!(err, ProbeError::Transport { .. }), "got {err:?}");
    }
}
