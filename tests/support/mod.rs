//! Test support utilities for installer integration tests.
//!
//! Provides a loopback HTTP server that answers a fixed number of requests
//! with canned responses, so `HttpMarketplace` can be exercised without
//! external network access.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

/// Gallery path prefix served by [`LoopbackServer`].
pub const GALLERY_PATH: &str = "/_apis/public/gallery";

/// A canned reply for one connection.
pub enum Reply {
    /// Write this raw HTTP response.
    Respond(Vec<u8>),
    /// Close the connection after reading the request.
    Hangup,
}

/// Builds a raw HTTP/1.1 response.
pub fn http_response(status: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut head = format!("HTTP/1.1 {status}\r\n");
    for (name, value) in headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str(&format!("Content-Length: {}\r\n", body.len()));
    head.push_str("Connection: close\r\n\r\n");
    let mut response = head.into_bytes();
    response.extend_from_slice(body);
    response
}

/// A one-thread HTTP server bound to an ephemeral loopback port.
pub struct LoopbackServer {
    base_url: String,
    handle: JoinHandle<Vec<String>>,
}

impl LoopbackServer {
    /// Serves `replies` to successive connections, in order.
    pub fn start(replies: Vec<Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback listener");
        let addr = listener.local_addr().expect("listener address");
        let handle = thread::spawn(move || {
            let mut requests = Vec::new();
            for reply in replies {
                let (mut stream, _) = listener.accept().expect("accept connection");
                requests.push(read_request_head(&stream));
                if let Reply::Respond(bytes) = reply {
                    stream.write_all(&bytes).expect("write response");
                    stream.flush().expect("flush response");
                }
            }
            requests
        });
        Self {
            base_url: format!("http://{addr}{GALLERY_PATH}"),
            handle,
        }
    }

    /// Gallery root URL to hand to the client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Waits for every reply to be served and returns the request heads.
    pub fn finish(self) -> Vec<String> {
        self.handle.join().expect("server thread panicked")
    }
}

/// A loopback URL with nothing listening behind it.
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback listener");
    let addr = listener.local_addr().expect("listener address");
    drop(listener);
    format!("http://{addr}{GALLERY_PATH}")
}

fn read_request_head(stream: &TcpStream) -> String {
    let mut reader = BufReader::new(stream);
    let mut head = String::new();
    loop {
        let mut line = String::new();
        let read = reader.read_line(&mut line).expect("read request line");
        if read == 0 || line == "\r\n" {
            break;
        }
        head.push_str(&line);
    }
    head
}
